// SPDX-License-Identifier: GPL-3.0-only

//! Cursor over the positional tail of a reply.

use ganesha_types::IoCategoryBlock;

use crate::mapper::decode_io_block;
use crate::value::ReplyValue;

/// Why a cursor could not read a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStop {
    /// No elements left.
    Exhausted,
    /// The next element is not a boolean.
    NotAFlag,
}

/// Reads flags and counter blocks in order, never past the end of the reply.
#[derive(Debug, Clone)]
pub struct ReplyCursor<'a> {
    values: &'a [ReplyValue],
    position: usize,
}

impl<'a> ReplyCursor<'a> {
    pub fn new(values: &'a [ReplyValue]) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.values.len()
    }

    pub fn remaining(&self) -> &'a [ReplyValue] {
        self.values.get(self.position..).unwrap_or(&[])
    }

    /// Reads one boolean. The cursor only moves on success.
    pub fn read_flag(&mut self) -> Result<bool, CursorStop> {
        let value = self.values.get(self.position).ok_or(CursorStop::Exhausted)?;
        let flag = value.as_bool().ok_or(CursorStop::NotAFlag)?;
        self.position += 1;
        Ok(flag)
    }

    /// Reads the counter block that follows a set flag.
    ///
    /// Returns `None`, without moving, when no category could be read.
    pub fn read_block(&mut self) -> Option<IoCategoryBlock> {
        let (block, consumed) = decode_io_block(self.remaining());
        if consumed == 0 {
            return None;
        }
        self.position += consumed;
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ganesha_types::IoCounters;

    fn counters(total: u64, errors: u64, transferred: u64) -> ReplyValue {
        ReplyValue::seq([total.into(), errors.into(), transferred.into()])
    }

    #[test]
    fn read_flag_stops_at_end_and_on_mismatch() {
        let values = vec![true.into(), ReplyValue::from("x")];
        let mut cursor = ReplyCursor::new(&values);

        assert_eq!(cursor.read_flag(), Ok(true));
        assert_eq!(cursor.read_flag(), Err(CursorStop::NotAFlag));
        assert_eq!(cursor.position(), 1);

        let empty: Vec<ReplyValue> = vec![];
        let mut cursor = ReplyCursor::new(&empty);
        assert_eq!(cursor.read_flag(), Err(CursorStop::Exhausted));
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn read_block_advances_by_consumed_categories() {
        let values = vec![
            counters(1, 0, 10),
            counters(2, 0, 20),
            counters(3, 1, 0),
            false.into(),
        ];
        let mut cursor = ReplyCursor::new(&values);

        let block = cursor.read_block().expect("flat block");
        assert_eq!(block.read, IoCounters::new(1, 0, 10));
        assert_eq!(block.other, IoCounters::new(3, 1, 0));
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.read_flag(), Ok(false));
    }

    #[test]
    fn read_block_on_non_sequence_does_not_move() {
        let values = vec![true.into()];
        let mut cursor = ReplyCursor::new(&values);

        assert_eq!(cursor.read_block(), None);
        assert_eq!(cursor.position(), 0);
    }
}
