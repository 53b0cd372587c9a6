// SPDX-License-Identifier: GPL-3.0-only

//! Bus seam
//!
//! Readers only see [`BusConnection`]; the zbus backend and the scripted test bus both
//! implement it.

use async_trait::async_trait;

use crate::error::BusError;
use crate::value::ReplyValue;

pub const GANESHA_BUS_NAME: &str = "org.ganesha.nfsd";

pub const SHOW_EXPORTS: &str = "ShowExports";
pub const SHOW_CLIENTS: &str = "ShowClients";
pub const GET_TOTAL_OPS: &str = "GetTotalOPS";
pub const GET_GLOBAL_OPS: &str = "GetGlobalOPS";
pub const GET_CLIENT_IO_OPS: &str = "GetClientIOops";

/// Object and interfaces one manager lives at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTarget {
    /// Short name used in logs.
    pub name: &'static str,
    pub destination: &'static str,
    pub path: &'static str,
    /// Interface of the listing method.
    pub manager_interface: &'static str,
    /// Interface of the per-entity stats methods.
    pub stats_interface: &'static str,
}

impl ServiceTarget {
    pub const EXPORTS: Self = Self {
        name: "exports",
        destination: GANESHA_BUS_NAME,
        path: "/org/ganesha/nfsd/ExportMgr",
        manager_interface: "org.ganesha.nfsd.exportmgr",
        stats_interface: "org.ganesha.nfsd.exportstats",
    };

    pub const CLIENTS: Self = Self {
        name: "clients",
        destination: GANESHA_BUS_NAME,
        path: "/org/ganesha/nfsd/ClientMgr",
        manager_interface: "org.ganesha.nfsd.clientmgr",
        stats_interface: "org.ganesha.nfsd.clientstats",
    };
}

/// Argument of a stats call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallArg {
    /// Sent as D-Bus `q`.
    ExportId(u16),
    /// Sent as D-Bus `s`.
    Address(String),
}

impl std::fmt::Display for CallArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExportId(id) => write!(f, "export {id}"),
            Self::Address(address) => write!(f, "client {address}"),
        }
    }
}

/// Opens connections to one [`ServiceTarget`].
#[async_trait]
pub trait BusConnector: Send + Sync {
    async fn open(&self, target: &ServiceTarget) -> Result<Box<dyn BusConnection>, BusError>;
}

/// A connection bound to one [`ServiceTarget`].
///
/// `invoke` returns the top-level reply arguments, in order.
#[async_trait]
pub trait BusConnection: Send + Sync {
    fn target(&self) -> &ServiceTarget;

    async fn invoke(
        &self,
        interface: &str,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<ReplyValue>, BusError>;

    /// Releases the connection. Dropping without closing also releases it.
    async fn close(&self) -> Result<(), BusError>;
}
