// SPDX-License-Identifier: GPL-3.0-only

//! Per-scrape connection lifecycle.

use std::fmt;
use std::time::Duration;

use ganesha_dbus::{BusConnection, BusConnector, BusError, ServiceTarget};
use thiserror::Error;

/// Where a scrape is. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScrapePhase {
    Idle,
    Connecting,
    Listing,
    PerEntityFetch,
    Projecting,
    Closed,
}

impl fmt::Display for ScrapePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Listing => "listing",
            Self::PerEntityFetch => "fetching per-entity stats",
            Self::Projecting => "projecting",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{target} scrape failed while {phase}: {source}")]
    Bus {
        target: &'static str,
        phase: ScrapePhase,
        #[source]
        source: BusError,
    },

    #[error("{collector} collector timed out after {}s", .after.as_secs())]
    TimedOut {
        collector: &'static str,
        after: Duration,
    },
}

/// One connection, opened for one scrape of one target.
///
/// Call [`ScrapeSession::close`] on every path; dropping an unclosed session only
/// drops the connection.
pub struct ScrapeSession {
    target: ServiceTarget,
    phase: ScrapePhase,
    connection: Box<dyn BusConnection>,
    closed: bool,
}

impl ScrapeSession {
    pub async fn open(
        connector: &dyn BusConnector,
        target: ServiceTarget,
    ) -> Result<Self, ScrapeError> {
        tracing::debug!(target_name = target.name, phase = %ScrapePhase::Connecting, "Scrape phase");
        let connection = connector
            .open(&target)
            .await
            .map_err(|source| ScrapeError::Bus {
                target: target.name,
                phase: ScrapePhase::Connecting,
                source,
            })?;

        Ok(Self {
            target,
            phase: ScrapePhase::Connecting,
            connection,
            closed: false,
        })
    }

    pub fn connection(&self) -> &dyn BusConnection {
        self.connection.as_ref()
    }

    pub fn phase(&self) -> ScrapePhase {
        self.phase
    }

    pub fn enter(&mut self, phase: ScrapePhase) {
        if phase <= self.phase {
            return;
        }
        tracing::debug!(target_name = self.target.name, %phase, "Scrape phase");
        self.phase = phase;
    }

    /// Wraps a bus error with the current phase.
    pub fn fail(&self, source: BusError) -> ScrapeError {
        ScrapeError::Bus {
            target: self.target.name,
            phase: self.phase,
            source,
        }
    }

    pub async fn close(mut self) {
        self.enter(ScrapePhase::Closed);
        if let Err(err) = self.connection.close().await {
            tracing::warn!(target_name = self.target.name, %err, "Failed to close bus connection");
        }
        self.closed = true;
    }
}

impl Drop for ScrapeSession {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!(
                target_name = self.target.name,
                phase = %self.phase,
                "Scrape session dropped before close"
            );
        }
    }
}
