// SPDX-License-Identifier: GPL-3.0-only

//! Export and client records from the `ShowExports` / `ShowClients` listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::counters::NfsVersion;

/// Seconds/nanoseconds pair as sent by the daemon (`(tt)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timespec {
    pub secs: u64,
    pub nanos: u64,
}

impl Timespec {
    pub fn new(secs: u64, nanos: u64) -> Self {
        Self { secs, nanos }
    }

    pub fn is_zero(&self) -> bool {
        self.secs == 0 && self.nanos == 0
    }

    /// Wall-clock time, if the pair is representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.secs).ok()?;
        let nanos = u32::try_from(self.nanos).ok()?;
        DateTime::from_timestamp(secs, nanos)
    }
}

/// Protocols an export or client is served over.
///
/// The wire order is `NFSv3, MNTv3, NLMv4, RQUOTA, NFSv40, NFSv41, NFSv42, 9P`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolFlags {
    pub nfsv3: bool,
    pub mntv3: bool,
    pub nlmv4: bool,
    pub rquota: bool,
    pub nfsv40: bool,
    pub nfsv41: bool,
    pub nfsv42: bool,
    pub plan9: bool,
}

impl ProtocolFlags {
    /// Number of flags in the wire record.
    pub const WIRE_LEN: usize = 8;

    /// Builds the flags from the eight booleans in wire order.
    pub fn from_wire(flags: [bool; Self::WIRE_LEN]) -> Self {
        let [nfsv3, mntv3, nlmv4, rquota, nfsv40, nfsv41, nfsv42, plan9] = flags;
        Self {
            nfsv3,
            mntv3,
            nlmv4,
            rquota,
            nfsv40,
            nfsv41,
            nfsv42,
            plan9,
        }
    }

    pub fn supports(&self, version: NfsVersion) -> bool {
        match version {
            NfsVersion::V3 => self.nfsv3,
            NfsVersion::V40 => self.nfsv40,
            NfsVersion::V41 => self.nfsv41,
            NfsVersion::V42 => self.nfsv42,
        }
    }
}

/// A filesystem path published by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub export_id: u32,
    pub path: String,
    pub protocols: ProtocolFlags,
    pub last_activity: Timespec,
}

impl Export {
    /// Id as taken by the export stats methods, which use a 16-bit argument.
    pub fn stats_id(&self) -> Option<u16> {
        u16::try_from(self.export_id).ok()
    }
}

/// A remote peer currently using the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub address: String,
    pub protocols: ProtocolFlags,
    pub last_activity: Timespec,
}

/// Decoded listing reply: daemon snapshot time plus the entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityListing<T> {
    pub snapshot: Timespec,
    pub entities: Vec<T>,
}

impl<T> EntityListing<T> {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
