// SPDX-License-Identifier: GPL-3.0-only

//! D-Bus readers for NFS-Ganesha statistics
//!
//! Calls the export and client managers of a running daemon and decodes the
//! positional replies into `ganesha-types` values.

pub mod bus;
pub mod connection;
pub mod cursor;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod listing;
pub mod mapper;
pub mod reader;
pub mod value;

pub use bus::{BusConnection, BusConnector, CallArg, GANESHA_BUS_NAME, ServiceTarget};
pub use connection::{ZbusConnection, ZbusConnector};
pub use cursor::{CursorStop, ReplyCursor};
pub use error::BusError;
pub use reader::{ClientsReader, ExportsReader};
pub use value::ReplyValue;
