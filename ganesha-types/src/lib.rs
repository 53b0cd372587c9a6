// SPDX-License-Identifier: GPL-3.0-only

//! Canonical data models for NFS-Ganesha runtime statistics
//!
//! These records are produced by `ganesha-dbus` from D-Bus replies and consumed by
//! the exporter when projecting metrics:
//!
//! - **entity**: exports and clients as listed by the daemon's manager interfaces
//! - **counters**: per-protocol operation counts and per-category I/O counters
//! - **reply**: the status envelope that prefixes every stats reply
//!
//! Every value here is built fresh for one scrape and dropped afterwards.

pub mod counters;
pub mod entity;
pub mod reply;

pub use counters::{
    ClientIoStats, IoCategory, IoCategoryBlock, IoCounters, NfsVersion, OperationCounters,
    OperationKind,
};
pub use entity::{Client, EntityListing, Export, ProtocolFlags, Timespec};
pub use reply::{ReplyEnvelope, StatsReply};
