// SPDX-License-Identifier: GPL-3.0-only

//! Stats reply mappers
//!
//! Everything below the envelope degrades instead of failing: a counter that is missing
//! or has the wrong type reads as zero, and a client I/O reply that ends early keeps
//! whatever was decoded so far. Only a broken envelope, or a successful envelope without
//! its payload, is reported as a protocol error.

use ganesha_types::{
    ClientIoStats, IoCategory, IoCategoryBlock, IoCounters, NfsVersion, OperationCounters,
    OperationKind, ReplyEnvelope, StatsReply, Timespec,
};

use crate::cursor::ReplyCursor;
use crate::error::BusError;
use crate::value::ReplyValue;

/// Reads a `(tt)` timestamp.
pub fn decode_timespec(value: &ReplyValue) -> Option<Timespec> {
    match value.as_sequence()? {
        [secs, nanos, ..] => Some(Timespec::new(secs.as_u64()?, nanos.as_u64()?)),
        _ => None,
    }
}

/// Reads the `(status, error[, time])` header of a stats reply.
pub fn decode_envelope(method: &str, values: &[ReplyValue]) -> Result<ReplyEnvelope, BusError> {
    let [status, error, rest @ ..] = values else {
        return Err(BusError::protocol(
            method,
            format!("illegal reply: {} fields", values.len()),
        ));
    };
    let status = status
        .as_bool()
        .ok_or_else(|| BusError::protocol(method, "illegal reply status"))?;
    let error = error
        .as_str()
        .ok_or_else(|| BusError::protocol(method, "illegal reply errstr"))?;
    let timestamp = rest.first().and_then(decode_timespec).unwrap_or_default();

    Ok(ReplyEnvelope {
        status,
        error: error.to_owned(),
        timestamp,
    })
}

/// Decodes a flat `key, count, key, count, ...` sequence.
///
/// Pairs whose key is not a string or whose count is not a `u64` are skipped, as are
/// unknown keys. A repeated key keeps its last value.
pub fn decode_operation_counters(values: &[ReplyValue]) -> OperationCounters {
    let mut ops = OperationCounters::new();
    for pair in values.chunks_exact(2) {
        let [key, value] = pair else { continue };
        let (Some(key), Some(value)) = (key.as_str(), value.as_u64()) else {
            continue;
        };
        if let Some(kind) = OperationKind::from_wire_key(key) {
            ops.set(kind, value);
        }
    }
    ops
}

/// Reads a `(total, errors, transferred)` triple, zero-filling missing fields.
///
/// Returns `None` if `value` is not a sequence at all.
pub fn decode_io_counters(value: &ReplyValue) -> Option<IoCounters> {
    let fields = value.as_sequence()?;
    let field = |index: usize| fields.get(index).and_then(ReplyValue::as_u64).unwrap_or(0);
    Some(IoCounters::new(field(0), field(1), field(2)))
}

/// Reads one counter block from the start of `values`.
///
/// The block is either one element holding up to four counter sequences, or up to four
/// counter sequences laid out directly in `values`. Returns the block and the number of
/// elements of `values` it used.
pub fn decode_io_block(values: &[ReplyValue]) -> (IoCategoryBlock, usize) {
    match values.first().and_then(ReplyValue::as_sequence) {
        Some(items) if is_packed_block(items) => (decode_categories(items).0, 1),
        Some(_) => decode_categories(values),
        None => (IoCategoryBlock::default(), 0),
    }
}

fn is_packed_block(items: &[ReplyValue]) -> bool {
    items
        .first()
        .is_some_and(|item| item.as_sequence().is_some())
}

fn decode_categories(values: &[ReplyValue]) -> (IoCategoryBlock, usize) {
    let mut block = IoCategoryBlock::default();
    let mut consumed = 0;
    for (category, value) in IoCategory::ALL.into_iter().zip(values) {
        let Some(counters) = decode_io_counters(value) else {
            break;
        };
        block.set(category, counters);
        consumed += 1;
    }
    (block, consumed)
}

/// Decodes the flag-gated per-version blocks of `GetClientIOops`.
///
/// Versions are read in order NFSv3, NFSv4.0, NFSv4.1, NFSv4.2. Decoding stops at the
/// first missing or non-boolean flag; a set flag without counters reads as zero and the
/// next flag follows it directly.
pub fn decode_client_io_stats(values: &[ReplyValue]) -> ClientIoStats {
    let mut stats = ClientIoStats::default();
    let mut cursor = ReplyCursor::new(values);

    for version in NfsVersion::ALL {
        let enabled = match cursor.read_flag() {
            Ok(enabled) => enabled,
            Err(stop) => {
                tracing::trace!(?version, ?stop, "client I/O reply ends");
                break;
            }
        };
        if !enabled {
            continue;
        }
        // a set flag with no counters after it keeps the version at zero
        let block = cursor.read_block().unwrap_or_else(|| {
            tracing::trace!(?version, "client I/O flag set without counters");
            IoCategoryBlock::default()
        });
        stats.set_version(version, block);
    }

    stats
}

/// Decodes a `GetTotalOPS` / `GetGlobalOPS` reply.
pub fn decode_ops_reply(
    method: &str,
    values: &[ReplyValue],
) -> Result<StatsReply<OperationCounters>, BusError> {
    let envelope = decode_envelope(method, values)?;
    if !envelope.status {
        return Ok(StatsReply::absent(envelope));
    }

    let (Some(_), Some(ops)) = (
        values.get(2).and_then(ReplyValue::as_sequence),
        values.get(3).and_then(ReplyValue::as_sequence),
    ) else {
        return Err(BusError::protocol(
            method,
            "expected timestamp and operation counters after the status",
        ));
    };

    Ok(StatsReply::present(envelope, decode_operation_counters(ops)))
}

/// Decodes a `GetClientIOops` reply.
pub fn decode_client_io_reply(
    method: &str,
    values: &[ReplyValue],
) -> Result<StatsReply<ClientIoStats>, BusError> {
    let envelope = decode_envelope(method, values)?;
    if !envelope.status {
        return Ok(StatsReply::absent(envelope));
    }
    if values.len() < 3 {
        return Err(BusError::protocol(
            method,
            format!("expected a timestamp after the status, got {} fields", values.len()),
        ));
    }

    let payload = values.get(3..).unwrap_or(&[]);
    Ok(StatsReply::present(envelope, decode_client_io_stats(payload)))
}
