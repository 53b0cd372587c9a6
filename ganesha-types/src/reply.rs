// SPDX-License-Identifier: GPL-3.0-only

//! Stats reply envelope.

use serde::{Deserialize, Serialize};

use crate::entity::Timespec;

/// Header of every stats reply: `(status b, error s, time (tt))`.
///
/// When `status` is false the rest of the reply must not be read as counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub status: bool,
    pub error: String,
    pub timestamp: Timespec,
}

/// Decoded stats reply.
///
/// `stats` holds the default (all zero) value whenever the envelope status is false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReply<T> {
    pub envelope: ReplyEnvelope,
    pub stats: T,
}

impl<T: Default> StatsReply<T> {
    pub fn present(envelope: ReplyEnvelope, stats: T) -> Self {
        Self { envelope, stats }
    }

    /// Reply for which the daemon reported no data.
    pub fn absent(envelope: ReplyEnvelope) -> Self {
        Self {
            envelope,
            stats: T::default(),
        }
    }
}

impl<T> StatsReply<T> {
    pub fn is_present(&self) -> bool {
        self.envelope.status
    }

    /// Daemon-provided reason when the reply is absent.
    pub fn reason(&self) -> &str {
        &self.envelope.error
    }

    pub fn into_present(self) -> Option<T> {
        if self.envelope.status {
            Some(self.stats)
        } else {
            None
        }
    }
}
