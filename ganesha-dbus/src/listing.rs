// SPDX-License-Identifier: GPL-3.0-only

//! `ShowExports` / `ShowClients` decoding
//!
//! Unlike the stats mappers, listing decode is strict: any entry that does not match
//! the fixed layout fails the whole listing.

use ganesha_types::{Client, EntityListing, Export, ProtocolFlags, Timespec};

use crate::bus::{SHOW_CLIENTS, SHOW_EXPORTS};
use crate::error::BusError;
use crate::mapper::decode_timespec;
use crate::value::ReplyValue;

pub fn decode_exports(values: &[ReplyValue]) -> Result<EntityListing<Export>, BusError> {
    decode_listing(SHOW_EXPORTS, values, "export", decode_export)
}

pub fn decode_clients(values: &[ReplyValue]) -> Result<EntityListing<Client>, BusError> {
    decode_listing(SHOW_CLIENTS, values, "client", decode_client)
}

fn decode_listing<T>(
    method: &str,
    values: &[ReplyValue],
    kind: &str,
    decode_entry: fn(&[ReplyValue]) -> Result<T, String>,
) -> Result<EntityListing<T>, BusError> {
    let [timestamp, entries, ..] = values else {
        return Err(BusError::protocol(
            method,
            format!("expected timestamp and entries, got {} fields", values.len()),
        ));
    };
    let snapshot = decode_timespec(timestamp)
        .ok_or_else(|| BusError::protocol(method, "snapshot timestamp is not (tt)"))?;
    let entries = entries
        .as_sequence()
        .ok_or_else(|| BusError::protocol(method, "entries are not an array"))?;

    let entities = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry
                .as_sequence()
                .ok_or_else(|| "not a structure".to_string())
                .and_then(decode_entry)
                .map_err(|reason| BusError::protocol(method, format!("{kind} {index}: {reason}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EntityListing { snapshot, entities })
}

fn decode_export(fields: &[ReplyValue]) -> Result<Export, String> {
    let [id, path, rest @ ..] = fields else {
        return Err(format!("expected at least 2 fields, got {}", fields.len()));
    };
    let export_id = id
        .as_u32()
        .ok_or_else(|| "export id is not an unsigned integer".to_string())?;
    let path = path
        .as_str()
        .ok_or_else(|| "path is not a string".to_string())?;
    let (protocols, last_activity) = decode_protocols_and_time(rest)?;

    Ok(Export {
        export_id,
        path: path.to_owned(),
        protocols,
        last_activity,
    })
}

fn decode_client(fields: &[ReplyValue]) -> Result<Client, String> {
    let [address, rest @ ..] = fields else {
        return Err("empty client entry".to_string());
    };
    let address = address
        .as_str()
        .ok_or_else(|| "client address is not a string".to_string())?;
    let (protocols, last_activity) = decode_protocols_and_time(rest)?;

    Ok(Client {
        address: address.to_owned(),
        protocols,
        last_activity,
    })
}

fn decode_protocols_and_time(fields: &[ReplyValue]) -> Result<(ProtocolFlags, Timespec), String> {
    if fields.len() < ProtocolFlags::WIRE_LEN + 1 {
        return Err(format!(
            "expected {} protocol flags and a timestamp, got {} fields",
            ProtocolFlags::WIRE_LEN,
            fields.len()
        ));
    }

    let mut flags = [false; ProtocolFlags::WIRE_LEN];
    for (index, (slot, value)) in flags.iter_mut().zip(fields).enumerate() {
        *slot = value
            .as_bool()
            .ok_or_else(|| format!("protocol flag {index} is not a boolean"))?;
    }
    let last_activity = fields
        .get(ProtocolFlags::WIRE_LEN)
        .and_then(decode_timespec)
        .ok_or_else(|| "last activity is not (tt)".to_string())?;

    Ok((ProtocolFlags::from_wire(flags), last_activity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: u64, nanos: u64) -> ReplyValue {
        ReplyValue::seq([secs.into(), nanos.into()])
    }

    fn flags(values: [bool; 8]) -> Vec<ReplyValue> {
        values.into_iter().map(ReplyValue::from).collect()
    }

    fn export_entry(id: u32, path: &str, protocol_flags: [bool; 8]) -> ReplyValue {
        let mut fields = vec![id.into(), path.into()];
        fields.extend(flags(protocol_flags));
        fields.push(ts(100, 0));
        ReplyValue::Seq(fields)
    }

    #[test]
    fn decodes_export_listing() {
        let reply = vec![
            ts(200, 5),
            ReplyValue::seq([
                export_entry(0, "/", [false; 8]),
                export_entry(
                    12,
                    "/srv/data",
                    [true, true, true, false, true, true, false, false],
                ),
            ]),
        ];

        let listing = decode_exports(&reply).unwrap();
        assert_eq!(listing.snapshot, Timespec::new(200, 5));
        assert_eq!(listing.len(), 2);

        let data = &listing.entities[1];
        assert_eq!(data.export_id, 12);
        assert_eq!(data.path, "/srv/data");
        assert!(data.protocols.nfsv3);
        assert!(data.protocols.nfsv41);
        assert!(!data.protocols.nfsv42);
        assert_eq!(data.last_activity, Timespec::new(100, 0));
    }

    #[test]
    fn decodes_client_listing() {
        let mut entry = vec!["192.168.1.20".into()];
        entry.extend(flags([false, false, false, false, true, false, true, false]));
        entry.push(ts(7, 8));
        let reply = vec![ts(1, 0), ReplyValue::seq([ReplyValue::Seq(entry)])];

        let listing = decode_clients(&reply).unwrap();
        let client = &listing.entities[0];
        assert_eq!(client.address, "192.168.1.20");
        assert!(client.protocols.nfsv40);
        assert!(client.protocols.nfsv42);
        assert!(!client.protocols.nfsv3);
    }

    #[test]
    fn empty_listing_is_valid() {
        let listing = decode_clients(&[ts(1, 0), ReplyValue::seq([])]).unwrap();
        assert!(listing.is_empty());
    }

    #[test]
    fn malformed_entry_fails_whole_listing() {
        let mut short = vec![3u32.into(), "/x".into()];
        short.extend(flags([true; 8]));
        let reply = vec![
            ts(1, 0),
            ReplyValue::seq([export_entry(1, "/ok", [true; 8]), ReplyValue::Seq(short)]),
        ];

        let err = decode_exports(&reply).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ShowExports"));
        assert!(msg.contains("export 1"));
    }

    #[test]
    fn mistyped_top_level_is_protocol_error() {
        assert!(matches!(
            decode_exports(&[ts(1, 0)]),
            Err(BusError::Protocol { .. })
        ));
        assert!(matches!(
            decode_exports(&[true.into(), ReplyValue::seq([])]),
            Err(BusError::Protocol { .. })
        ));
        assert!(matches!(
            decode_clients(&[ts(1, 0), "not an array".into()]),
            Err(BusError::Protocol { .. })
        ));
    }

    #[test]
    fn export_id_must_be_unsigned_32() {
        let mut fields = vec![12u64.into(), "/srv".into()];
        fields.extend(flags([false; 8]));
        fields.push(ts(0, 0));
        let reply = vec![ts(1, 0), ReplyValue::seq([ReplyValue::Seq(fields)])];

        let err = decode_exports(&reply).unwrap_err();
        assert!(err.to_string().contains("export id"));
    }
}
