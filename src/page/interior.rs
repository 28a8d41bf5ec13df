//! Interior (non-leaf) B+ tree node page.
//!
//! Layout (spec.md §6), parameterized by the tree's configured `max_keys`
//! (`ORDER - 1`, uniform across a given file):
//! ```text
//! magic(8) key_count(u16) keys[max_keys](u64) children[max_keys+1](u32) padding
//! ```
//! `len(children) == len(keys) + 1` always; unused key/child slots beyond
//! `key_count`/`key_count+1` are zeroed.

use super::{INTERIOR_MAGIC, check_length, check_magic, new_frame};
use crate::config::PAGESIZE;
use crate::error::{Error, Result};

const KEY_COUNT: usize = super::MAGIC_SIZE;
const KEYS_START: usize = KEY_COUNT + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteriorPage {
    pub keys: Vec<u64>,
    pub children: Vec<u32>,
}

impl InteriorPage {
    /// Bytes needed for the key/children arrays at a given fan-out. Used
    /// by [`crate::config::Config`] to validate that `max_keys` fits.
    pub fn capacity_for(max_keys: usize) -> usize {
        KEYS_START + max_keys * 8 + (max_keys + 1) * 4
    }

    pub fn encode(&self, max_keys: usize) -> Vec<u8> {
        debug_assert_eq!(self.children.len(), self.keys.len() + 1);
        debug_assert!(self.keys.len() <= max_keys);
        debug_assert!(Self::capacity_for(max_keys) <= PAGESIZE);

        let mut frame = new_frame();
        frame[0..super::MAGIC_SIZE].copy_from_slice(&INTERIOR_MAGIC);
        frame[KEY_COUNT..KEY_COUNT + 2].copy_from_slice(&(self.keys.len() as u16).to_be_bytes());

        let children_start = KEYS_START + max_keys * 8;
        for (i, key) in self.keys.iter().enumerate() {
            let at = KEYS_START + i * 8;
            frame[at..at + 8].copy_from_slice(&key.to_be_bytes());
        }
        for (i, child) in self.children.iter().enumerate() {
            let at = children_start + i * 4;
            frame[at..at + 4].copy_from_slice(&child.to_be_bytes());
        }
        frame
    }

    pub fn decode(frame: &[u8], max_keys: usize) -> Result<Self> {
        check_length(frame)?;
        check_magic(frame, INTERIOR_MAGIC, "interior page")?;

        let key_count = u16::from_be_bytes(frame[KEY_COUNT..KEY_COUNT + 2].try_into().unwrap()) as usize;
        if key_count > max_keys {
            return Err(Error::BadLength {
                expected: max_keys,
                actual: key_count,
            });
        }

        let children_start = KEYS_START + max_keys * 8;
        let mut keys = Vec::with_capacity(key_count);
        for i in 0..key_count {
            let at = KEYS_START + i * 8;
            keys.push(u64::from_be_bytes(frame[at..at + 8].try_into().unwrap()));
        }

        let mut children = Vec::with_capacity(key_count + 1);
        for i in 0..=key_count {
            let at = children_start + i * 4;
            children.push(u32::from_be_bytes(frame[at..at + 4].try_into().unwrap()));
        }

        Ok(Self { keys, children })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let page = InteriorPage {
            keys: vec![10, 20, 30],
            children: vec![1, 2, 3, 4],
        };
        let frame = page.encode(16);
        assert_eq!(frame.len(), PAGESIZE);
        assert_eq!(InteriorPage::decode(&frame, 16).unwrap(), page);
    }

    #[test]
    fn empty_keys_one_child() {
        let page = InteriorPage {
            keys: vec![],
            children: vec![5],
        };
        let frame = page.encode(16);
        assert_eq!(InteriorPage::decode(&frame, 16).unwrap(), page);
    }

    #[test]
    fn default_order_fits_in_one_page() {
        assert!(InteriorPage::capacity_for(339) <= PAGESIZE);
    }

    #[test]
    fn unused_slots_are_zeroed() {
        let page = InteriorPage {
            keys: vec![1],
            children: vec![1, 2],
        };
        let frame = page.encode(16);
        let children_start = KEYS_START + 16 * 8;
        // slot for child index 2 (unused) should be zero.
        let at = children_start + 2 * 4;
        assert_eq!(&frame[at..at + 4], &[0, 0, 0, 0]);
    }
}
