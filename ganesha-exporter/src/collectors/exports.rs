// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use async_trait::async_trait;
use ganesha_dbus::{BusConnection, BusConnector, ExportsReader, ServiceTarget};
use ganesha_types::{Export, OperationCounters, OperationKind};

use super::{fetch_each, snapshot_time};
use crate::metrics::{MetricSpec, Point, fq_name};
use crate::registry::StatsCollector;
use crate::scrape::{ScrapeError, ScrapePhase, ScrapeSession};

const EXPORT_LABELS: &[&str] = &["exportid", "path"];

fn export_count_name() -> String {
    fq_name("export_count")
}

fn export_ops_name(kind: OperationKind) -> String {
    fq_name(&format!("export_ops_{}", kind.slug()))
}

fn export_specs() -> Vec<MetricSpec> {
    let mut specs = vec![MetricSpec::new("export_count", "Total number of NFS exports", &[])];
    specs.extend(OperationKind::ALL.into_iter().map(|kind| {
        MetricSpec::new(
            &format!("export_ops_{}", kind.slug()),
            format!("{} operations", kind.display_name()),
            EXPORT_LABELS,
        )
    }));
    specs
}

/// Points for one export; only protocols present in the reply are emitted.
pub(crate) fn project_export(export: &Export, ops: &OperationCounters) -> Vec<Point> {
    let export_id = export.export_id.to_string();
    ops.iter()
        .map(|(kind, count)| {
            Point::new(
                export_ops_name(kind),
                vec![export_id.clone(), export.path.clone()],
                count as f64,
            )
        })
        .collect()
}

pub(crate) fn export_count_point(count: usize) -> Point {
    Point::unlabelled(export_count_name(), count as f64)
}

async fn fetch_total_ops(
    connection: &dyn BusConnection,
    export: &Export,
) -> Option<OperationCounters> {
    let Some(export_id) = export.stats_id() else {
        tracing::warn!(
            export_id = export.export_id,
            path = %export.path,
            "Export id does not fit the stats call, skipping"
        );
        return None;
    };

    match ExportsReader::new(connection).total_ops(export_id).await {
        Ok(reply) if reply.is_present() => reply.into_present(),
        Ok(reply) => {
            tracing::debug!(export_id, reason = reply.reason(), "No stats for export");
            None
        }
        Err(err) => {
            tracing::warn!(export_id, path = %export.path, %err, "Failed to fetch export stats");
            None
        }
    }
}

pub struct ExportsCollector {
    connector: Arc<dyn BusConnector>,
    fetch_concurrency: usize,
    specs: Vec<MetricSpec>,
}

impl ExportsCollector {
    pub fn new(connector: Arc<dyn BusConnector>, fetch_concurrency: usize) -> Self {
        Self {
            connector,
            fetch_concurrency,
            specs: export_specs(),
        }
    }

    async fn scrape(&self, session: &mut ScrapeSession) -> Result<Vec<Point>, ScrapeError> {
        session.enter(ScrapePhase::Listing);
        let listing = ExportsReader::new(session.connection())
            .list_exports()
            .await
            .map_err(|err| session.fail(err))?;
        tracing::debug!(
            exports = listing.len(),
            snapshot = %snapshot_time(listing.snapshot),
            "Listed exports"
        );

        session.enter(ScrapePhase::PerEntityFetch);
        let connection = session.connection();
        let fetched = fetch_each(&listing.entities, self.fetch_concurrency, |export| {
            fetch_total_ops(connection, export)
        })
        .await;

        session.enter(ScrapePhase::Projecting);
        let mut points = vec![export_count_point(listing.len())];
        for (export, ops) in &fetched {
            points.extend(project_export(export, ops));
        }
        Ok(points)
    }
}

#[async_trait]
impl StatsCollector for ExportsCollector {
    fn name(&self) -> &'static str {
        ServiceTarget::EXPORTS.name
    }

    fn describe(&self) -> &[MetricSpec] {
        &self.specs
    }

    async fn collect(&self) -> Result<Vec<Point>, ScrapeError> {
        let mut session = ScrapeSession::open(self.connector.as_ref(), ServiceTarget::EXPORTS).await?;
        let result = self.scrape(&mut session).await;
        session.close().await;
        result
    }
}
