// SPDX-License-Identifier: GPL-3.0-only

//! NFS-Ganesha metrics exporter
//!
//! Reads export and client statistics from a running NFS-Ganesha daemon over D-Bus on
//! every scrape and serves them as Prometheus gauges.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ganesha_dbus::{BusConnector, ServiceTarget, ZbusConnector};

mod collectors;
mod config;
mod logging;
mod metrics;
mod registry;
mod scrape;
mod server;
mod versions;

use collectors::{ClientsCollector, ExportsCollector, VersionsCollector};
use config::{Cli, ExporterConfig};
use registry::CollectorRegistry;
use server::MetricsEndpoint;
use versions::BuildInfo;

const BUS_ENV_VARS: &[&str] = &[
    "DBUS_SYSTEM_BUS_ADDRESS",
    "DBUS_SESSION_BUS_ADDRESS",
    "KUBECONFIG",
];

fn log_startup(build: &BuildInfo, config: &ExporterConfig) {
    tracing::info!(
        program = %std::env::args().next().unwrap_or_default(),
        version = %build.version,
        commit_id = %build.commit_id,
        "Starting NFS-Ganesha exporter"
    );

    // SAFETY: getuid/getgid cannot fail and have no preconditions
    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    tracing::info!(uid, gid, "Process identity");

    for name in BUS_ENV_VARS {
        let value = std::env::var(name).unwrap_or_default();
        tracing::info!(name, value = %value, "Environment");
    }

    tracing::info!(
        listen = %config.socket_addr(),
        metrics_path = %config.metrics_path,
        bus = config.bus_address.as_deref().unwrap_or("system"),
        fetch_concurrency = config.fetch_concurrency,
        scrape_timeout_secs = config.scrape_timeout.map(|t| t.as_secs()),
        "Configuration"
    );
}

/// Opens and closes one connection per target. Failures are logged only.
async fn probe(connector: &dyn BusConnector) {
    for target in [ServiceTarget::EXPORTS, ServiceTarget::CLIENTS] {
        match connector.open(&target).await {
            Ok(connection) => {
                if let Err(err) = connection.close().await {
                    tracing::warn!(target_name = target.name, %err, "Probe connection did not close cleanly");
                }
                tracing::info!(target_name = target.name, path = target.path, "Bus reachable");
            }
            Err(err) => {
                tracing::error!(target_name = target.name, %err, "Bus probe failed");
            }
        }
    }
}

fn build_registry(
    config: &ExporterConfig,
    connector: Arc<dyn BusConnector>,
    build: BuildInfo,
) -> Result<CollectorRegistry> {
    let mut registry = CollectorRegistry::new(config.scrape_timeout);
    registry.register(Arc::new(VersionsCollector::new(build)))?;
    registry.register(Arc::new(ExportsCollector::new(
        connector.clone(),
        config.fetch_concurrency,
    )))?;
    registry.register(Arc::new(ClientsCollector::new(
        connector,
        config.fetch_concurrency,
    )))?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ExporterConfig::load(&cli)?;

    logging::init(config.log_level);

    let build = BuildInfo::from_build_env();
    log_startup(&build, &config);

    let connector: Arc<dyn BusConnector> = Arc::new(ZbusConnector::new(config.bus_address.clone()));
    if config.probe_on_start {
        probe(connector.as_ref()).await;
    }

    let registry = build_registry(&config, connector, build).context("Failed to register collectors")?;
    tracing::info!(collectors = ?registry.collector_names(), "Registered collectors");

    let addr = config.socket_addr();
    let listener = server::bind(addr)
        .await
        .with_context(|| format!("Failed to listen on {addr}"))?;
    tracing::info!(%addr, path = %config.metrics_path, "Serving metrics");

    let endpoint = Arc::new(MetricsEndpoint::new(Arc::new(registry), config.metrics_path.clone()));
    server::serve(listener, endpoint, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received shutdown signal");
    })
    .await?;

    tracing::info!("NFS-Ganesha exporter shutting down");
    Ok(())
}
