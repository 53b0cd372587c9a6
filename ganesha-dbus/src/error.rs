// SPDX-License-Identifier: GPL-3.0-only

//! Error types for ganesha-dbus operations

use thiserror::Error;

/// Failures talking to the daemon.
///
/// A stats reply whose envelope status is false is not an error; it decodes to an
/// absent [`ganesha_types::StatsReply`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Bus unreachable, authentication or the initial handshake failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The call could not be dispatched or the daemon answered with a D-Bus error.
    #[error("Call {method} failed: {reason}")]
    Call { method: String, reason: String },

    /// The reply does not have the fixed layout of the method.
    #[error("Protocol error in {method}: {reason}")]
    Protocol { method: String, reason: String },
}

impl BusError {
    pub fn call(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Call {
            method: method.into(),
            reason: reason.into(),
        }
    }

    pub fn protocol(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            method: method.into(),
            reason: reason.into(),
        }
    }
}
