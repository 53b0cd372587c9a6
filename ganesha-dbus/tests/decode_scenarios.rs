// SPDX-License-Identifier: GPL-3.0-only

//! Decoding scenarios over the public mapper API.

use ganesha_dbus::ReplyValue;
use ganesha_dbus::mapper::{
    decode_client_io_reply, decode_client_io_stats, decode_operation_counters, decode_ops_reply,
};
use ganesha_types::{IoCategory, IoCategoryBlock, IoCounters, NfsVersion, OperationKind};

fn counters(total: u64, errors: u64, transferred: u64) -> ReplyValue {
    ReplyValue::seq([total.into(), errors.into(), transferred.into()])
}

fn timestamp() -> ReplyValue {
    ReplyValue::seq([1_700_000_000u64.into(), 0u64.into()])
}

fn ops_pairs(pairs: &[(&str, u64)]) -> Vec<ReplyValue> {
    pairs
        .iter()
        .flat_map(|(key, value)| [ReplyValue::from(*key), ReplyValue::from(*value)])
        .collect()
}

#[test]
fn operation_counters_scenario() {
    let raw = ops_pairs(&[("NFSv3", 10), ("NFSv41", 3), ("Bogus", 99)]);
    let ops = decode_operation_counters(&raw);

    assert_eq!(ops.get(OperationKind::Nfsv3), 10);
    assert_eq!(ops.get(OperationKind::Nfsv41), 3);
    for kind in OperationKind::ALL {
        if !matches!(kind, OperationKind::Nfsv3 | OperationKind::Nfsv41) {
            assert_eq!(ops.get(kind), 0, "{kind}");
            assert!(!ops.contains(kind), "{kind}");
        }
    }
}

#[test]
fn operation_counters_ignore_order_of_distinct_keys() {
    let pairs = [("NFSv3", 1), ("NFSv40", 2), ("MNTv3", 3), ("9P", 4), ("RQUOTA", 5)];
    let forward = decode_operation_counters(&ops_pairs(&pairs));

    let mut reversed_pairs = pairs;
    reversed_pairs.reverse();
    let reversed = decode_operation_counters(&ops_pairs(&reversed_pairs));

    let mut rotated_pairs = pairs;
    rotated_pairs.rotate_left(2);
    let rotated = decode_operation_counters(&ops_pairs(&rotated_pairs));

    assert_eq!(forward, reversed);
    assert_eq!(forward, rotated);
}

#[test]
fn operation_counters_last_duplicate_wins() {
    let ops = decode_operation_counters(&ops_pairs(&[
        ("NFSv42", 1),
        ("NLMv4", 7),
        ("NFSv42", 2),
        ("NFSv42", 9),
    ]));
    assert_eq!(ops.get(OperationKind::Nfsv42), 9);
    assert_eq!(ops.get(OperationKind::Nlmv4), 7);
}

#[test]
fn client_io_scenario() {
    let raw = vec![
        true.into(),
        ReplyValue::seq([counters(5, 0, 500), counters(2, 0, 200)]),
        false.into(),
        true.into(),
        ReplyValue::seq([counters(1, 0, 10)]),
    ];
    let stats = decode_client_io_stats(&raw);

    let v3 = stats.block(NfsVersion::V3);
    assert_eq!(v3.read, IoCounters::new(5, 0, 500));
    assert_eq!(v3.write, IoCounters::new(2, 0, 200));
    assert_eq!(v3.other, IoCounters::default());
    assert_eq!(v3.layout, IoCounters::default());

    assert_eq!(stats.block(NfsVersion::V40), IoCategoryBlock::default());

    let v41 = stats.block(NfsVersion::V41);
    assert_eq!(v41.read, IoCounters::new(1, 0, 10));
    assert_eq!(v41.write, IoCounters::default());

    assert!(stats.version(NfsVersion::V42).is_none());
    assert_eq!(stats.block(NfsVersion::V42), IoCategoryBlock::default());
}

/// Native layout: every set flag is followed by its category counters, flat.
fn native_reply(enabled: [bool; 4]) -> Vec<ReplyValue> {
    let mut raw = Vec::new();
    for (index, version) in NfsVersion::ALL.into_iter().enumerate() {
        raw.push(enabled[index].into());
        if enabled[index] {
            let base = (index as u64 + 1) * 100;
            raw.push(counters(base + 1, 0, base * 10));
            raw.push(counters(base + 2, 1, base * 20));
            raw.push(counters(base + 3, 0, 0));
            if version.has_layouts() {
                raw.push(counters(base + 4, 0, 0));
            }
        }
    }
    raw
}

#[test]
fn client_io_trailing_flags_off() {
    for trailing_off in 0..=4 {
        let mut enabled = [true; 4];
        for flag in enabled.iter_mut().rev().take(trailing_off) {
            *flag = false;
        }

        let stats = decode_client_io_stats(&native_reply(enabled));
        for (index, version) in NfsVersion::ALL.into_iter().enumerate() {
            if enabled[index] {
                let block = stats
                    .version(version)
                    .unwrap_or_else(|| panic!("{version:?} with {trailing_off} off"));
                let base = (index as u64 + 1) * 100;
                assert_eq!(block.read, IoCounters::new(base + 1, 0, base * 10));
                assert_eq!(block.write.errors, 1);
                assert_eq!(block.other.total, base + 3);
                let layout_total = if version.has_layouts() { base + 4 } else { 0 };
                assert_eq!(block.get(IoCategory::Layout).total, layout_total);
            } else {
                assert!(stats.version(version).is_none(), "{version:?}");
            }
        }
    }
}

#[test]
fn client_io_truncated_mid_block_keeps_earlier_versions() {
    let full = native_reply([true, true, true, true]);
    // v3: flag + 3 blocks; v4.0: flag + 3 blocks; cut inside v4.1 after two categories
    let cut = 1 + 3 + 1 + 3 + 1 + 2;
    let stats = decode_client_io_stats(&full[..cut]);

    assert_eq!(stats.block(NfsVersion::V3).read.total, 101);
    assert_eq!(stats.block(NfsVersion::V40).other.total, 203);

    let v41 = stats.block(NfsVersion::V41);
    assert_eq!(v41.read.total, 301);
    assert_eq!(v41.write.total, 302);
    assert_eq!(v41.other, IoCounters::default());
    assert_eq!(v41.layout, IoCounters::default());

    assert!(stats.version(NfsVersion::V42).is_none());
}

#[test]
fn client_io_set_flag_without_counters_keeps_decoding() {
    let raw = vec![
        true.into(),
        false.into(),
        true.into(),
        ReplyValue::seq([counters(1, 0, 10)]),
    ];
    let stats = decode_client_io_stats(&raw);

    assert_eq!(stats.version(NfsVersion::V3), Some(&IoCategoryBlock::default()));
    assert!(stats.version(NfsVersion::V40).is_none());
    assert_eq!(stats.block(NfsVersion::V41).read, IoCounters::new(1, 0, 10));
    assert_eq!(stats.block(NfsVersion::V41).write, IoCounters::default());
    assert!(stats.version(NfsVersion::V42).is_none());
}

#[test]
fn client_io_truncated_every_length_never_fails() {
    let full = native_reply([true, true, true, true]);
    let complete = decode_client_io_stats(&full);
    for len in 0..=full.len() {
        let partial = decode_client_io_stats(&full[..len]);
        for version in NfsVersion::ALL {
            let got = partial.block(version);
            let want = complete.block(version);
            for category in IoCategory::ALL {
                let got = got.get(category);
                assert!(got == want.get(category) || got == IoCounters::default());
            }
        }
    }
}

#[test]
fn absent_envelope_ignores_payload() {
    let ops = decode_ops_reply(
        "GetTotalOPS",
        &[
            false.into(),
            "export not found".into(),
            timestamp(),
            ReplyValue::Seq(ops_pairs(&[("NFSv3", 10)])),
        ],
    )
    .unwrap();
    assert!(!ops.is_present());
    assert_eq!(ops.reason(), "export not found");
    assert!(ops.stats.is_empty());

    let io = decode_client_io_reply(
        "GetClientIOops",
        &[
            false.into(),
            "client not found".into(),
            timestamp(),
            true.into(),
            counters(1, 2, 3),
        ],
    )
    .unwrap();
    assert!(!io.is_present());
    assert!(io.stats.version(NfsVersion::V3).is_none());
}

#[test]
fn decoding_is_idempotent() {
    let mut raw = vec![true.into(), "OK".into(), timestamp()];
    raw.extend(native_reply([true, false, true, false]));

    let first = decode_client_io_reply("GetClientIOops", &raw).unwrap();
    let second = decode_client_io_reply("GetClientIOops", &raw).unwrap();
    assert_eq!(first, second);

    let ops_raw = vec![
        true.into(),
        "OK".into(),
        timestamp(),
        ReplyValue::Seq(ops_pairs(&[("NFSv3", 10), ("MNTv1", 2)])),
    ];
    assert_eq!(
        decode_ops_reply("GetTotalOPS", &ops_raw).unwrap(),
        decode_ops_reply("GetTotalOPS", &ops_raw).unwrap()
    );
}
