// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use async_trait::async_trait;
use ganesha_dbus::{BusConnection, BusConnector, ClientsReader, ServiceTarget};
use ganesha_types::{Client, ClientIoStats, IoCategory, IoCounters, NfsVersion};

use super::{fetch_each, snapshot_time};
use crate::metrics::{MetricSpec, Point, fq_name};
use crate::registry::StatsCollector;
use crate::scrape::{ScrapeError, ScrapePhase, ScrapeSession};

const CLIENT_LABELS: &[&str] = &["ipaddr"];
const IO_FIELDS: [&str; 3] = ["total", "errors", "transferred"];
const NON_LAYOUT: [IoCategory; 3] = [IoCategory::Read, IoCategory::Write, IoCategory::Other];

fn categories(version: NfsVersion) -> &'static [IoCategory] {
    if version.has_layouts() {
        &IoCategory::ALL
    } else {
        &NON_LAYOUT
    }
}

fn field_values(counters: IoCounters) -> [u64; 3] {
    [counters.total, counters.errors, counters.transferred]
}

fn client_io_metric(version: NfsVersion, category: IoCategory, field: &str) -> String {
    format!("client_{}_{}_{field}", version.slug(), category.slug())
}

fn client_specs() -> Vec<MetricSpec> {
    let mut specs = vec![MetricSpec::new("client_count", "Total number of NFS clients", &[])];
    for version in NfsVersion::ALL {
        for &category in categories(version) {
            for field in IO_FIELDS {
                specs.push(MetricSpec::new(
                    &client_io_metric(version, category, field),
                    format!(
                        "{} {} {field}",
                        version.display_name(),
                        category.display_name()
                    ),
                    CLIENT_LABELS,
                ));
            }
        }
    }
    specs
}

/// Points for one client.
///
/// A version is emitted only when the listing advertises it and the reply carried
/// its counters.
pub(crate) fn project_client(client: &Client, io: &ClientIoStats) -> Vec<Point> {
    let mut points = Vec::new();
    for version in NfsVersion::ALL {
        if !client.protocols.supports(version) {
            continue;
        }
        let Some(block) = io.version(version) else {
            continue;
        };
        for &category in categories(version) {
            let values = field_values(block.get(category));
            for (field, value) in IO_FIELDS.into_iter().zip(values) {
                points.push(Point::new(
                    fq_name(&client_io_metric(version, category, field)),
                    vec![client.address.clone()],
                    value as f64,
                ));
            }
        }
    }
    points
}

pub(crate) fn client_count_point(count: usize) -> Point {
    Point::unlabelled(fq_name("client_count"), count as f64)
}

async fn fetch_client_io(connection: &dyn BusConnection, client: &Client) -> Option<ClientIoStats> {
    match ClientsReader::new(connection).client_io(&client.address).await {
        Ok(reply) if reply.is_present() => reply.into_present(),
        Ok(reply) => {
            tracing::debug!(address = %client.address, reason = reply.reason(), "No stats for client");
            None
        }
        Err(err) => {
            tracing::warn!(address = %client.address, %err, "Failed to fetch client stats");
            None
        }
    }
}

pub struct ClientsCollector {
    connector: Arc<dyn BusConnector>,
    fetch_concurrency: usize,
    specs: Vec<MetricSpec>,
}

impl ClientsCollector {
    pub fn new(connector: Arc<dyn BusConnector>, fetch_concurrency: usize) -> Self {
        Self {
            connector,
            fetch_concurrency,
            specs: client_specs(),
        }
    }

    async fn scrape(&self, session: &mut ScrapeSession) -> Result<Vec<Point>, ScrapeError> {
        session.enter(ScrapePhase::Listing);
        let listing = ClientsReader::new(session.connection())
            .list_clients()
            .await
            .map_err(|err| session.fail(err))?;
        tracing::debug!(
            clients = listing.len(),
            snapshot = %snapshot_time(listing.snapshot),
            "Listed clients"
        );

        session.enter(ScrapePhase::PerEntityFetch);
        let connection = session.connection();
        let fetched = fetch_each(&listing.entities, self.fetch_concurrency, |client| {
            fetch_client_io(connection, client)
        })
        .await;

        session.enter(ScrapePhase::Projecting);
        let mut points = vec![client_count_point(listing.len())];
        for (client, io) in &fetched {
            points.extend(project_client(client, io));
        }
        Ok(points)
    }
}

#[async_trait]
impl StatsCollector for ClientsCollector {
    fn name(&self) -> &'static str {
        ServiceTarget::CLIENTS.name
    }

    fn describe(&self) -> &[MetricSpec] {
        &self.specs
    }

    async fn collect(&self) -> Result<Vec<Point>, ScrapeError> {
        let mut session = ScrapeSession::open(self.connector.as_ref(), ServiceTarget::CLIENTS).await?;
        let result = self.scrape(&mut session).await;
        session.close().await;
        result
    }
}
