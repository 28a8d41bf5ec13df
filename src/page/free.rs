//! A released page awaiting reuse. `next_free_pageno == 0` marks the end
//! of the free list.

use super::{FREE_MAGIC, check_length, check_magic, new_frame};
use crate::error::Result;

const NEXT_FREE_PAGENO: usize = super::MAGIC_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreePage {
    pub next_free_pageno: u32,
}

impl FreePage {
    pub fn new(next_free_pageno: u32) -> Self {
        Self { next_free_pageno }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut frame = new_frame();
        frame[0..super::MAGIC_SIZE].copy_from_slice(&FREE_MAGIC);
        frame[NEXT_FREE_PAGENO..NEXT_FREE_PAGENO + 4]
            .copy_from_slice(&self.next_free_pageno.to_be_bytes());
        frame
    }

    pub fn decode(frame: &[u8]) -> Result<Self> {
        check_length(frame)?;
        check_magic(frame, FREE_MAGIC, "free page")?;
        Ok(Self {
            next_free_pageno: u32::from_be_bytes(
                frame[NEXT_FREE_PAGENO..NEXT_FREE_PAGENO + 4].try_into().unwrap(),
            ),
        })
    }
}
