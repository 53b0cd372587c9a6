// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use crate::metrics::{MetricSpec, Point};
use crate::registry::StatsCollector;
use crate::scrape::ScrapeError;
use crate::versions::BuildInfo;

/// Reports the exporter's own version; never touches the bus.
pub struct VersionsCollector {
    build: BuildInfo,
    specs: [MetricSpec; 1],
}

impl VersionsCollector {
    pub fn new(build: BuildInfo) -> Self {
        Self {
            build,
            specs: [MetricSpec::new(
                "metrics_status",
                "Current metrics-collector status and versions",
                &["version", "commitid"],
            )],
        }
    }
}

#[async_trait]
impl StatsCollector for VersionsCollector {
    fn name(&self) -> &'static str {
        "versions"
    }

    fn describe(&self) -> &[MetricSpec] {
        &self.specs
    }

    async fn collect(&self) -> Result<Vec<Point>, ScrapeError> {
        let [status] = &self.specs;
        let value = if self.build.is_known() { 1.0 } else { 0.0 };
        Ok(vec![Point::new(
            &status.fq_name,
            vec![self.build.version.clone(), self.build.commit_id.clone()],
            value,
        )])
    }
}
