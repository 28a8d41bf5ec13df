//! Page 0: the database header.
//!
//! Layout (spec.md §6):
//! ```text
//! magic(8) root_pageno(u32) next_free_pageno(u32) next_overflow_pageno(u32)
//! current_overflow_pageno(u32) current_overflow_offset(u16) padding
//! ```

use super::{ZERO_MAGIC, check_length, check_magic, new_frame};
use crate::config::PAGESIZE;
use crate::error::Result;

const ROOT_PAGENO: usize = super::MAGIC_SIZE;
const NEXT_FREE_PAGENO: usize = ROOT_PAGENO + 4;
const NEXT_OVERFLOW_PAGENO: usize = NEXT_FREE_PAGENO + 4;
const CURRENT_OVERFLOW_PAGENO: usize = NEXT_OVERFLOW_PAGENO + 4;
const CURRENT_OVERFLOW_OFFSET: usize = CURRENT_OVERFLOW_PAGENO + 4;
pub(crate) const HEADER_SIZE: usize = CURRENT_OVERFLOW_OFFSET + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZeroPage {
    pub root_pageno: u32,
    pub next_free_pageno: u32,
    /// Reserved for a future pre-staged overflow page; this crate always
    /// writes 0 here (see DESIGN.md's resolution of the zero-page layout
    /// ambiguity) but preserves the field's on-disk position.
    pub next_overflow_pageno: u32,
    pub current_overflow_pageno: u32,
    pub current_overflow_offset: u16,
}

impl ZeroPage {
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = new_frame();
        frame[0..super::MAGIC_SIZE].copy_from_slice(&ZERO_MAGIC);
        frame[ROOT_PAGENO..ROOT_PAGENO + 4].copy_from_slice(&self.root_pageno.to_be_bytes());
        frame[NEXT_FREE_PAGENO..NEXT_FREE_PAGENO + 4]
            .copy_from_slice(&self.next_free_pageno.to_be_bytes());
        frame[NEXT_OVERFLOW_PAGENO..NEXT_OVERFLOW_PAGENO + 4]
            .copy_from_slice(&self.next_overflow_pageno.to_be_bytes());
        frame[CURRENT_OVERFLOW_PAGENO..CURRENT_OVERFLOW_PAGENO + 4]
            .copy_from_slice(&self.current_overflow_pageno.to_be_bytes());
        frame[CURRENT_OVERFLOW_OFFSET..CURRENT_OVERFLOW_OFFSET + 2]
            .copy_from_slice(&self.current_overflow_offset.to_be_bytes());
        debug_assert_eq!(frame.len(), PAGESIZE);
        frame
    }

    pub fn decode(frame: &[u8]) -> Result<Self> {
        check_length(frame)?;
        check_magic(frame, ZERO_MAGIC, "zero page")?;
        Ok(Self {
            root_pageno: u32::from_be_bytes(frame[ROOT_PAGENO..ROOT_PAGENO + 4].try_into().unwrap()),
            next_free_pageno: u32::from_be_bytes(
                frame[NEXT_FREE_PAGENO..NEXT_FREE_PAGENO + 4].try_into().unwrap(),
            ),
            next_overflow_pageno: u32::from_be_bytes(
                frame[NEXT_OVERFLOW_PAGENO..NEXT_OVERFLOW_PAGENO + 4]
                    .try_into()
                    .unwrap(),
            ),
            current_overflow_pageno: u32::from_be_bytes(
                frame[CURRENT_OVERFLOW_PAGENO..CURRENT_OVERFLOW_PAGENO + 4]
                    .try_into()
                    .unwrap(),
            ),
            current_overflow_offset: u16::from_be_bytes(
                frame[CURRENT_OVERFLOW_OFFSET..CURRENT_OVERFLOW_OFFSET + 2]
                    .try_into()
                    .unwrap(),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let page = ZeroPage {
            root_pageno: 7,
            next_free_pageno: 3,
            next_overflow_pageno: 0,
            current_overflow_pageno: 9,
            current_overflow_offset: 42,
        };
        let frame = page.encode();
        assert_eq!(frame.len(), PAGESIZE);
        assert_eq!(ZeroPage::decode(&frame).unwrap(), page);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let frame = vec![0u8; PAGESIZE];
        assert!(ZeroPage::decode(&frame).is_err());
    }

    #[test]
    fn bad_length_is_rejected() {
        let frame = vec![0u8; 10];
        assert!(ZeroPage::decode(&frame).is_err());
    }
}
