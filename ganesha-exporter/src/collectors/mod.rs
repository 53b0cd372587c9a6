// SPDX-License-Identifier: GPL-3.0-only

//! Exports, clients and versions collectors.

mod clients;
mod exports;
mod versions;

pub use clients::ClientsCollector;
pub use exports::ExportsCollector;
pub use versions::VersionsCollector;

use std::future::{Future, ready};

use futures::stream::{self, StreamExt};
use ganesha_types::Timespec;

/// Daemon snapshot time of a listing, for logs.
pub(crate) fn snapshot_time(snapshot: Timespec) -> String {
    snapshot
        .to_datetime()
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| format!("{}.{:09}", snapshot.secs, snapshot.nanos))
}

/// Runs `fetch` for every entity, at most `width` at a time.
///
/// Entities for which `fetch` yields `None` are left out. Output order is unspecified.
pub(crate) fn fetch_each<'e, E, T, F, Fut>(
    entities: &'e [E],
    width: usize,
    fetch: F,
) -> impl Future<Output = Vec<(&'e E, T)>> + Send
where
    E: Sync,
    T: Send,
    F: Fn(&'e E) -> Fut + Send,
    Fut: Future<Output = Option<T>> + Send,
{
    stream::iter(entities)
        .map(move |entity| {
            let pending = fetch(entity);
            async move { pending.await.map(|stats| (entity, stats)) }
        })
        .buffer_unordered(width.max(1))
        .filter_map(ready)
        .collect()
}
