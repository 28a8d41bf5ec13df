//! Leaf B+ tree node page.
//!
//! Layout (spec.md §6), parameterized by the tree's configured `max_keys`:
//! ```text
//! magic(8) key_count(u16) keys[max_keys](u64) data[max_keys](u32) prev(u32) next(u32) padding
//! ```
//! Each `data` slot is the pageno of the overflow chain holding that
//! entry's value (see `pager::overflow` — every value, however small,
//! lives in an overflow chain; the leaf only ever stores the 4-byte
//! page-number pointer the fixed layout has room for).

use super::{LEAF_MAGIC, check_length, check_magic, new_frame};
use crate::config::PAGESIZE;
use crate::error::{Error, Result};

const KEY_COUNT: usize = super::MAGIC_SIZE;
const KEYS_START: usize = KEY_COUNT + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPage {
    pub keys: Vec<u64>,
    pub data: Vec<u32>,
    pub prev: u32,
    pub next: u32,
}

impl LeafPage {
    pub fn capacity_for(max_keys: usize) -> usize {
        KEYS_START + max_keys * 8 + max_keys * 4 + 4 + 4
    }

    pub fn encode(&self, max_keys: usize) -> Vec<u8> {
        debug_assert_eq!(self.keys.len(), self.data.len());
        debug_assert!(self.keys.len() <= max_keys);
        debug_assert!(Self::capacity_for(max_keys) <= PAGESIZE);

        let mut frame = new_frame();
        frame[0..super::MAGIC_SIZE].copy_from_slice(&LEAF_MAGIC);
        frame[KEY_COUNT..KEY_COUNT + 2].copy_from_slice(&(self.keys.len() as u16).to_be_bytes());

        let data_start = KEYS_START + max_keys * 8;
        let prev_at = data_start + max_keys * 4;
        let next_at = prev_at + 4;

        for (i, key) in self.keys.iter().enumerate() {
            let at = KEYS_START + i * 8;
            frame[at..at + 8].copy_from_slice(&key.to_be_bytes());
        }
        for (i, ptr) in self.data.iter().enumerate() {
            let at = data_start + i * 4;
            frame[at..at + 4].copy_from_slice(&ptr.to_be_bytes());
        }
        frame[prev_at..prev_at + 4].copy_from_slice(&self.prev.to_be_bytes());
        frame[next_at..next_at + 4].copy_from_slice(&self.next.to_be_bytes());
        frame
    }

    pub fn decode(frame: &[u8], max_keys: usize) -> Result<Self> {
        check_length(frame)?;
        check_magic(frame, LEAF_MAGIC, "leaf page")?;

        let key_count = u16::from_be_bytes(frame[KEY_COUNT..KEY_COUNT + 2].try_into().unwrap()) as usize;
        if key_count > max_keys {
            return Err(Error::BadLength {
                expected: max_keys,
                actual: key_count,
            });
        }

        let data_start = KEYS_START + max_keys * 8;
        let prev_at = data_start + max_keys * 4;
        let next_at = prev_at + 4;

        let mut keys = Vec::with_capacity(key_count);
        for i in 0..key_count {
            let at = KEYS_START + i * 8;
            keys.push(u64::from_be_bytes(frame[at..at + 8].try_into().unwrap()));
        }
        let mut data = Vec::with_capacity(key_count);
        for i in 0..key_count {
            let at = data_start + i * 4;
            data.push(u32::from_be_bytes(frame[at..at + 4].try_into().unwrap()));
        }
        let prev = u32::from_be_bytes(frame[prev_at..prev_at + 4].try_into().unwrap());
        let next = u32::from_be_bytes(frame[next_at..next_at + 4].try_into().unwrap());

        Ok(Self { keys, data, prev, next })
    }
}
