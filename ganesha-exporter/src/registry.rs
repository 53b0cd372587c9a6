// SPDX-License-Identifier: GPL-3.0-only

//! Collector registry
//!
//! Collectors describe their gauge families once at registration and produce points on
//! every scrape. The registry owns no metric state between scrapes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};
use thiserror::Error;

use crate::metrics::{MetricSpec, Point, build_families};
use crate::scrape::ScrapeError;

#[async_trait]
pub trait StatsCollector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every family this collector may emit.
    fn describe(&self) -> &[MetricSpec];

    async fn collect(&self) -> Result<Vec<Point>, ScrapeError>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid metric {name} in collector {collector}: {reason}")]
    InvalidMetric {
        collector: &'static str,
        name: String,
        reason: String,
    },

    #[error("Metric {name} of collector {collector} is already registered by {owner}")]
    Duplicate {
        collector: &'static str,
        name: String,
        owner: &'static str,
    },

    #[error("Failed to encode metrics: {0}")]
    Encode(String),
}

pub struct CollectorRegistry {
    collectors: Vec<Arc<dyn StatsCollector>>,
    owners: HashMap<String, &'static str>,
    timeout: Option<Duration>,
}

impl CollectorRegistry {
    /// `timeout` bounds each collector's scrape; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            collectors: Vec::new(),
            owners: HashMap::new(),
            timeout,
        }
    }

    /// Adds a collector after validating all of its specs. Nothing is added on error.
    pub fn register(&mut self, collector: Arc<dyn StatsCollector>) -> Result<(), RegistryError> {
        let name = collector.name();
        let mut claimed: HashMap<String, &'static str> = HashMap::new();

        for spec in collector.describe() {
            spec.desc().map_err(|err| RegistryError::InvalidMetric {
                collector: name,
                name: spec.fq_name.clone(),
                reason: err.to_string(),
            })?;

            let owner = self
                .owners
                .get(&spec.fq_name)
                .or_else(|| claimed.get(&spec.fq_name));
            if let Some(&owner) = owner {
                return Err(RegistryError::Duplicate {
                    collector: name,
                    name: spec.fq_name.clone(),
                    owner,
                });
            }
            claimed.insert(spec.fq_name.clone(), name);
        }

        tracing::debug!(collector = name, metrics = claimed.len(), "Registered collector");
        self.owners.extend(claimed);
        self.collectors.push(collector);
        Ok(())
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    async fn collect_one(&self, collector: &dyn StatsCollector) -> Vec<Point> {
        let name = collector.name();
        let result = match self.timeout {
            Some(after) => tokio::time::timeout(after, collector.collect())
                .await
                .unwrap_or_else(|_| {
                    Err(ScrapeError::TimedOut {
                        collector: name,
                        after,
                    })
                }),
            None => collector.collect().await,
        };

        match result {
            Ok(points) => {
                tracing::trace!(collector = name, points = points.len(), "Collected");
                points
            }
            Err(err) => {
                tracing::error!(collector = name, %err, "Collector scrape abandoned");
                Vec::new()
            }
        }
    }

    /// Runs every collector concurrently and returns their families sorted by name.
    pub async fn gather(&self) -> Vec<MetricFamily> {
        let outputs = join_all(
            self.collectors
                .iter()
                .map(|collector| self.collect_one(collector.as_ref())),
        )
        .await;

        let mut families = Vec::new();
        for (collector, points) in self.collectors.iter().zip(outputs) {
            match build_families(collector.describe(), &points) {
                Ok(built) => families.extend(built),
                Err(err) => {
                    tracing::error!(collector = collector.name(), %err, "Failed to build metric families")
                }
            }
        }
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));
        families
    }

    /// Text exposition of [`CollectorRegistry::gather`].
    pub async fn render(&self) -> Result<Vec<u8>, RegistryError> {
        let families = self.gather().await;
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buffer)
            .map_err(|err| RegistryError::Encode(err.to_string()))?;
        Ok(buffer)
    }
}
