// SPDX-License-Identifier: GPL-3.0-only

//! Operation and I/O counter records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol keys reported by `GetTotalOPS` / `GetGlobalOPS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Nfsv3,
    Nfsv40,
    Nfsv41,
    Nfsv42,
    Mntv1,
    Mntv3,
    Nlmv4,
    Rquota,
    Plan9,
}

impl OperationKind {
    pub const ALL: [OperationKind; 9] = [
        OperationKind::Nfsv3,
        OperationKind::Nfsv40,
        OperationKind::Nfsv41,
        OperationKind::Nfsv42,
        OperationKind::Mntv1,
        OperationKind::Mntv3,
        OperationKind::Nlmv4,
        OperationKind::Rquota,
        OperationKind::Plan9,
    ];

    /// Key as it appears in the reply.
    pub fn wire_key(self) -> &'static str {
        match self {
            Self::Nfsv3 => "NFSv3",
            Self::Nfsv40 => "NFSv40",
            Self::Nfsv41 => "NFSv41",
            Self::Nfsv42 => "NFSv42",
            Self::Mntv1 => "MNTv1",
            Self::Mntv3 => "MNTv3",
            Self::Nlmv4 => "NLMv4",
            Self::Rquota => "RQUOTA",
            Self::Plan9 => "9P",
        }
    }

    /// Unknown keys map to `None` so newer daemons can add protocols.
    pub fn from_wire_key(key: &str) -> Option<Self> {
        match key {
            "NFSv3" => Some(Self::Nfsv3),
            "NFSv40" => Some(Self::Nfsv40),
            "NFSv41" => Some(Self::Nfsv41),
            "NFSv42" => Some(Self::Nfsv42),
            "MNTv1" => Some(Self::Mntv1),
            "MNTv3" => Some(Self::Mntv3),
            "NLMv4" => Some(Self::Nlmv4),
            "RQUOTA" => Some(Self::Rquota),
            "9P" | "Plan9" => Some(Self::Plan9),
            _ => None,
        }
    }

    /// Lower-case slug used in metric names.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Nfsv3 => "nfsv3",
            Self::Nfsv40 => "nfsv40",
            Self::Nfsv41 => "nfsv41",
            Self::Nfsv42 => "nfsv42",
            Self::Mntv1 => "mntv1",
            Self::Mntv3 => "mntv3",
            Self::Nlmv4 => "nlmv4",
            Self::Rquota => "rquota",
            Self::Plan9 => "9p",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Nfsv3 => "NFSv3",
            Self::Nfsv40 => "NFSv4.0",
            Self::Nfsv41 => "NFSv4.1",
            Self::Nfsv42 => "NFSv4.2",
            Self::Mntv1 => "MNTv1",
            Self::Mntv3 => "MNTv3",
            Self::Nlmv4 => "NLMv4",
            Self::Rquota => "RQUOTA",
            Self::Plan9 => "9P",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_key())
    }
}

/// Operation counts keyed by protocol.
///
/// Only keys seen in the reply are stored; [`OperationCounters::get`] reads missing
/// keys as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCounters {
    counts: BTreeMap<OperationKind, u64>,
}

impl OperationCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a count; a repeated key overwrites the previous value.
    pub fn set(&mut self, kind: OperationKind, value: u64) {
        self.counts.insert(kind, value);
    }

    pub fn get(&self, kind: OperationKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn contains(&self, kind: OperationKind) -> bool {
        self.counts.contains_key(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OperationKind, u64)> + '_ {
        self.counts.iter().map(|(kind, value)| (*kind, *value))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// NFS protocol revisions that carry per-client I/O stats, in reply order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NfsVersion {
    V3,
    V40,
    V41,
    V42,
}

impl NfsVersion {
    pub const ALL: [NfsVersion; 4] = [
        NfsVersion::V3,
        NfsVersion::V40,
        NfsVersion::V41,
        NfsVersion::V42,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::V3 => "nfsv3",
            Self::V40 => "nfsv40",
            Self::V41 => "nfsv41",
            Self::V42 => "nfsv42",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::V3 => "NFSv3",
            Self::V40 => "NFSv40",
            Self::V41 => "NFSv41",
            Self::V42 => "NFSv42",
        }
    }

    /// pNFS layouts exist from 4.1 on.
    pub fn has_layouts(self) -> bool {
        matches!(self, Self::V41 | Self::V42)
    }
}

/// Operation categories inside one I/O block, in reply order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IoCategory {
    Read,
    Write,
    Other,
    Layout,
}

impl IoCategory {
    pub const ALL: [IoCategory; 4] = [
        IoCategory::Read,
        IoCategory::Write,
        IoCategory::Other,
        IoCategory::Layout,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Other => "other",
            Self::Layout => "layout",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Other => "OTHER",
            Self::Layout => "LAYOUT",
        }
    }
}

/// Counters for one category under one protocol version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCounters {
    pub total: u64,
    pub errors: u64,
    pub transferred: u64,
}

impl IoCounters {
    pub fn new(total: u64, errors: u64, transferred: u64) -> Self {
        Self {
            total,
            errors,
            transferred,
        }
    }
}

/// Read/write/other/layout counters for one protocol version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCategoryBlock {
    pub read: IoCounters,
    pub write: IoCounters,
    pub other: IoCounters,
    pub layout: IoCounters,
}

impl IoCategoryBlock {
    pub fn get(&self, category: IoCategory) -> IoCounters {
        match category {
            IoCategory::Read => self.read,
            IoCategory::Write => self.write,
            IoCategory::Other => self.other,
            IoCategory::Layout => self.layout,
        }
    }

    pub fn set(&mut self, category: IoCategory, counters: IoCounters) {
        match category {
            IoCategory::Read => self.read = counters,
            IoCategory::Write => self.write = counters,
            IoCategory::Other => self.other = counters,
            IoCategory::Layout => self.layout = counters,
        }
    }
}

/// Per-version I/O stats of one client.
///
/// `None` means the reply's gate flag for that version was false or the reply ended
/// before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIoStats {
    pub nfsv3: Option<IoCategoryBlock>,
    pub nfsv40: Option<IoCategoryBlock>,
    pub nfsv41: Option<IoCategoryBlock>,
    pub nfsv42: Option<IoCategoryBlock>,
}

impl ClientIoStats {
    pub fn version(&self, version: NfsVersion) -> Option<&IoCategoryBlock> {
        match version {
            NfsVersion::V3 => self.nfsv3.as_ref(),
            NfsVersion::V40 => self.nfsv40.as_ref(),
            NfsVersion::V41 => self.nfsv41.as_ref(),
            NfsVersion::V42 => self.nfsv42.as_ref(),
        }
    }

    /// Block for `version`, zero-valued when it was gated off.
    pub fn block(&self, version: NfsVersion) -> IoCategoryBlock {
        self.version(version).copied().unwrap_or_default()
    }

    pub fn set_version(&mut self, version: NfsVersion, block: IoCategoryBlock) {
        let slot = match version {
            NfsVersion::V3 => &mut self.nfsv3,
            NfsVersion::V40 => &mut self.nfsv40,
            NfsVersion::V41 => &mut self.nfsv41,
            NfsVersion::V42 => &mut self.nfsv42,
        };
        *slot = Some(block);
    }
}
