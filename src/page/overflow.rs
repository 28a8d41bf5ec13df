//! One link in a chain storing an oversize (or, in this crate, every) value.
//!
//! Layout (spec.md §6):
//! ```text
//! magic(8) next_overflow_pageno(u32) payload(DATASIZE)
//! ```
//! The first overflow page of a value's chain carries a 4-byte big-endian
//! length prefix at the start of its payload; subsequent pages hold raw
//! continuation bytes. `next_overflow_pageno == 0` marks the end of the
//! chain.

use super::{OVERFLOW_MAGIC, check_length, check_magic, new_frame};
use crate::config::PAGESIZE;
use crate::error::Result;

const NEXT_OVERFLOW_PAGENO: usize = super::MAGIC_SIZE;
const PAYLOAD_START: usize = NEXT_OVERFLOW_PAGENO + 4;

/// Usable payload bytes per overflow page.
pub const DATASIZE: usize = PAGESIZE - PAYLOAD_START;

/// The length prefix must fit contiguously within a page's payload; a
/// fresh page that starts a new value's chain always satisfies this since
/// `DATASIZE >= 4`, but `write_overflow` must still check before reusing a
/// partially-filled page (spec.md §9, Open Question (b)).
pub const MIN_ROOM_FOR_LENGTH_PREFIX: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowPage {
    pub next_overflow_pageno: u32,
    pub payload: Vec<u8>,
}

impl OverflowPage {
    pub fn encode(&self) -> Vec<u8> {
        debug_assert!(self.payload.len() <= DATASIZE);
        let mut frame = new_frame();
        frame[0..super::MAGIC_SIZE].copy_from_slice(&OVERFLOW_MAGIC);
        frame[NEXT_OVERFLOW_PAGENO..NEXT_OVERFLOW_PAGENO + 4]
            .copy_from_slice(&self.next_overflow_pageno.to_be_bytes());
        frame[PAYLOAD_START..PAYLOAD_START + self.payload.len()].copy_from_slice(&self.payload);
        frame
    }

    pub fn decode(frame: &[u8]) -> Result<Self> {
        check_length(frame)?;
        check_magic(frame, OVERFLOW_MAGIC, "overflow page")?;
        Ok(Self {
            next_overflow_pageno: u32::from_be_bytes(
                frame[NEXT_OVERFLOW_PAGENO..NEXT_OVERFLOW_PAGENO + 4]
                    .try_into()
                    .unwrap(),
            ),
            payload: frame[PAYLOAD_START..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut payload = vec![0u8; DATASIZE];
        payload[0] = 0xFF;
        let page = OverflowPage {
            next_overflow_pageno: 4,
            payload: payload.clone(),
        };
        let frame = page.encode();
        assert_eq!(frame.len(), PAGESIZE);
        let decoded = OverflowPage::decode(&frame).unwrap();
        assert_eq!(decoded.next_overflow_pageno, 4);
        assert_eq!(decoded.payload, payload);
    }

    #[test]
    fn datasize_has_room_for_length_prefix() {
        assert!(DATASIZE >= MIN_ROOM_FOR_LENGTH_PREFIX);
    }
}
