// SPDX-License-Identifier: GPL-3.0-only

//! Metric shapes, points and their conversion to Prometheus families.

use std::collections::HashMap;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};

pub const NAMESPACE: &str = "nfs_ganesha";

/// `nfs_ganesha_<name>`
pub fn fq_name(name: &str) -> String {
    format!("{NAMESPACE}_{name}")
}

/// Shape of one gauge family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub fq_name: String,
    pub help: String,
    pub labels: Vec<&'static str>,
}

impl MetricSpec {
    pub fn new(name: &str, help: impl Into<String>, labels: &[&'static str]) -> Self {
        Self {
            fq_name: fq_name(name),
            help: help.into(),
            labels: labels.to_vec(),
        }
    }

    /// Validates name, help and label names.
    pub fn desc(&self) -> prometheus::Result<Desc> {
        Desc::new(
            self.fq_name.clone(),
            self.help.clone(),
            self.labels.iter().map(|label| label.to_string()).collect(),
            HashMap::new(),
        )
    }
}

/// One sample. `labels` follow the order of [`MetricSpec::labels`].
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub name: String,
    pub labels: Vec<String>,
    pub value: f64,
}

impl Point {
    pub fn new(name: impl Into<String>, labels: Vec<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
        }
    }

    pub fn unlabelled(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, Vec::new(), value)
    }
}

/// Builds one gauge family per spec that has points.
///
/// Points whose name has no spec, or whose label count does not match it, are dropped.
/// A spec left without any valid point yields no family.
pub fn build_families<'a>(
    specs: impl IntoIterator<Item = &'a MetricSpec>,
    points: &[Point],
) -> prometheus::Result<Vec<MetricFamily>> {
    let mut by_name: HashMap<&str, Vec<&Point>> = HashMap::new();
    for point in points {
        by_name.entry(point.name.as_str()).or_default().push(point);
    }

    let mut families = Vec::new();
    for spec in specs {
        let Some(points) = by_name.remove(spec.fq_name.as_str()) else {
            continue;
        };

        let gauge = GaugeVec::new(Opts::new(spec.fq_name.clone(), spec.help.clone()), &spec.labels)?;
        for point in points {
            let labels: Vec<&str> = point.labels.iter().map(String::as_str).collect();
            match gauge.get_metric_with_label_values(&labels) {
                Ok(metric) => metric.set(point.value),
                Err(err) => tracing::warn!(metric = %spec.fq_name, %err, "Dropping point"),
            }
        }
        // the text encoder rejects families without samples
        families.extend(
            gauge
                .collect()
                .into_iter()
                .filter(|family| !family.get_metric().is_empty()),
        );
    }

    for name in by_name.keys() {
        tracing::warn!(metric = %name, "Dropping points of undescribed metric");
    }

    Ok(families)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fq_name_uses_namespace() {
        assert_eq!(fq_name("export_count"), "nfs_ganesha_export_count");
        let spec = MetricSpec::new("client_count", "Total number of NFS clients", &[]);
        assert_eq!(spec.fq_name, "nfs_ganesha_client_count");
        assert!(spec.desc().is_ok());
    }

    #[test]
    fn desc_rejects_bad_label_name() {
        let spec = MetricSpec::new("export_ops_nfsv3", "NFSv3 operations", &["export-id"]);
        assert!(spec.desc().is_err());
    }

    #[test]
    fn families_only_for_specs_with_points() {
        let count = MetricSpec::new("export_count", "Total number of NFS exports", &[]);
        let ops = MetricSpec::new("export_ops_nfsv3", "NFSv3 operations", &["exportid", "path"]);
        let unused = MetricSpec::new("export_ops_nfsv40", "NFSv4.0 operations", &["exportid", "path"]);

        let points = vec![
            Point::unlabelled(&count.fq_name, 2.0),
            Point::new(&ops.fq_name, vec!["1".into(), "/a".into()], 10.0),
            Point::new(&ops.fq_name, vec!["2".into(), "/b".into()], 20.0),
        ];
        let families = build_families([&count, &ops, &unused], &points).unwrap();

        assert_eq!(families.len(), 2);
        assert_eq!(families[0].get_name(), "nfs_ganesha_export_count");
        assert_eq!(families[1].get_metric().len(), 2);
    }

    #[test]
    fn mismatched_and_undescribed_points_are_dropped() {
        let ops = MetricSpec::new("export_ops_nfsv3", "NFSv3 operations", &["exportid", "path"]);
        let points = vec![
            Point::new(&ops.fq_name, vec!["1".into()], 1.0),
            Point::unlabelled(fq_name("unknown"), 1.0),
        ];
        let families = build_families([&ops], &points).unwrap();
        assert!(families.is_empty());
    }
}
