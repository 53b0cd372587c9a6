// SPDX-License-Identifier: GPL-3.0-only

//! Tagged reply values
//!
//! Replies from the daemon are decoded into [`ReplyValue`] right after the call so the
//! mappers never touch `zvariant` directly. Accessors are total: a value of the wrong
//! shape reads as `None`, and callers fall back to zero.

use zbus::zvariant::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyValue {
    Str(String),
    U64(u64),
    /// 32-bit unsigned value; 16-bit values are widened into it.
    U32(u32),
    Bool(bool),
    /// Arrays and structures alike.
    Seq(Vec<ReplyValue>),
    Unknown,
}

impl ReplyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Elements of a composite value, without looking at their types.
    pub fn as_sequence(&self) -> Option<&[ReplyValue]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn seq(items: impl IntoIterator<Item = ReplyValue>) -> Self {
        Self::Seq(items.into_iter().collect())
    }
}

impl From<&Value<'_>> for ReplyValue {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::Str(s) => Self::Str(s.as_str().to_owned()),
            Value::U64(v) => Self::U64(*v),
            Value::U32(v) => Self::U32(*v),
            Value::U16(v) => Self::U32(u32::from(*v)),
            Value::Bool(b) => Self::Bool(*b),
            Value::Value(inner) => Self::from(&**inner),
            Value::Array(array) => Self::Seq(array.iter().map(Self::from).collect()),
            Value::Structure(structure) => {
                Self::Seq(structure.fields().iter().map(Self::from).collect())
            }
            _ => Self::Unknown,
        }
    }
}

impl From<&str> for ReplyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ReplyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<u64> for ReplyValue {
    fn from(value: u64) -> Self {
        Self::U64(value)
    }
}

impl From<u32> for ReplyValue {
    fn from(value: u32) -> Self {
        Self::U32(value)
    }
}

impl From<bool> for ReplyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<ReplyValue>> for ReplyValue {
    fn from(value: Vec<ReplyValue>) -> Self {
        Self::Seq(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::Structure;

    #[test]
    fn accessors_return_none_on_shape_mismatch() {
        let s = ReplyValue::from("NFSv3");
        assert_eq!(s.as_str(), Some("NFSv3"));
        assert_eq!(s.as_u64(), None);
        assert_eq!(s.as_bool(), None);
        assert!(s.as_sequence().is_none());

        let n = ReplyValue::from(7u64);
        assert_eq!(n.as_u64(), Some(7));
        assert_eq!(n.as_u32(), None);
        assert_eq!(n.as_str(), None);

        assert_eq!(ReplyValue::Unknown.as_bool(), None);
    }

    #[test]
    fn converts_scalars_and_unwraps_variants() {
        assert_eq!(ReplyValue::from(&Value::from(5u64)), ReplyValue::U64(5));
        assert_eq!(ReplyValue::from(&Value::from(9u16)), ReplyValue::U32(9));
        assert_eq!(ReplyValue::from(&Value::from(true)), ReplyValue::Bool(true));
        assert_eq!(
            ReplyValue::from(&Value::from("/srv/nfs")),
            ReplyValue::Str("/srv/nfs".to_string())
        );
        assert_eq!(
            ReplyValue::from(&Value::new(Value::from(3u64))),
            ReplyValue::U64(3)
        );
        assert_eq!(ReplyValue::from(&Value::from(1.5f64)), ReplyValue::Unknown);
    }

    #[test]
    fn converts_arrays_and_structures_to_sequences() {
        let array = Value::from(vec![5u64, 0, 500]);
        assert_eq!(
            ReplyValue::from(&array),
            ReplyValue::seq([5u64.into(), 0u64.into(), 500u64.into()])
        );

        let structure = Value::from(Structure::from((1u64, 2u64)));
        assert_eq!(
            ReplyValue::from(&structure),
            ReplyValue::seq([1u64.into(), 2u64.into()])
        );
    }
}
