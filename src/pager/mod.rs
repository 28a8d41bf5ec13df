//! Disk-backed page management.
//!
//! The [`Pager`] abstracts raw file I/O behind logical page numbers: callers
//! read and write whole `PAGESIZE` frames addressed by `u32` pageno, and the
//! pager takes care of caching, allocation, and the free list. Nothing above
//! this layer seeks into the file directly.
//!
//! # Free list
//!
//! Freed pages are threaded through the file itself rather than tracked in
//! an in-memory structure: each free page's body is a [`FreePage`] pointing
//! at the next free page (`0` terminates the chain), and the chain head is
//! the zero page's `next_free_pageno`. `alloc_page` pops the head of this
//! chain before ever extending the file.

pub mod cache;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use log::{debug, trace};

use crate::config::PAGESIZE;
use crate::error::{Error, Result};
use crate::page::{self, FreePage, OverflowPage, PageKind, ZeroPage};

use cache::{Cache, Frame};

pub const ZERO_PAGENO: u32 = 0;

/// Disk-backed page store: caching, allocation, and the overflow chain
/// helpers built on top of raw page read/write.
#[derive(Debug)]
pub struct Pager {
    file: File,
    npages: u32,
    next_free_pageno: u32,
    root_pageno: u32,
    cache: Cache,
}

impl Pager {
    /// Open (creating if necessary) a pager-managed file at `path`.
    ///
    /// A freshly created file gets a zero page written immediately so the
    /// root pageno and free list head have somewhere to live.
    pub fn open(path: impl AsRef<Path>, cache_maxsize: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        let len = file.metadata()?.len();
        let mut pager = Self {
            file,
            npages: (len / PAGESIZE as u64) as u32,
            next_free_pageno: 0,
            root_pageno: 0,
            cache: Cache::new(cache_maxsize),
        };

        if pager.npages == 0 {
            debug!("initializing fresh database file");
            pager.extend_by_one()?;
            let zero = ZeroPage::default();
            pager.write_frame(ZERO_PAGENO, &zero.encode())?;
        } else {
            let frame = pager.read_frame(ZERO_PAGENO)?;
            let zero = ZeroPage::decode(&frame)?;
            pager.next_free_pageno = zero.next_free_pageno;
            pager.root_pageno = zero.root_pageno;
        }

        Ok(pager)
    }

    /// The page number of the B+ tree root.
    pub fn root_pageno(&self) -> u32 {
        self.root_pageno
    }

    /// Commit a new root pageno to the zero page (spec.md §9, Open
    /// Question (c): every root replacement is persisted immediately).
    pub fn set_root_pageno(&mut self, root_pageno: u32) -> Result<()> {
        self.root_pageno = root_pageno;
        self.write_zero_page()
    }

    fn write_zero_page(&mut self) -> Result<()> {
        let zero = ZeroPage {
            root_pageno: self.root_pageno,
            next_free_pageno: self.next_free_pageno,
            next_overflow_pageno: 0,
            current_overflow_pageno: 0,
            current_overflow_offset: 0,
        };
        self.write_frame(ZERO_PAGENO, &zero.encode())
    }

    /// Read a page's raw frame, through the cache.
    pub fn read_page(&mut self, pageno: u32) -> Result<Frame> {
        if pageno >= self.npages {
            return Err(Error::OutOfBounds(pageno));
        }
        if let Some(frame) = self.cache.get(pageno) {
            return Ok(frame);
        }
        let bytes = self.read_frame(pageno)?;
        let frame: Frame = Arc::new(bytes.try_into().expect("read_frame returns PAGESIZE bytes"));
        self.cache.set(pageno, frame.clone());
        Ok(frame)
    }

    /// Write a page's raw frame, invalidating the cache entry so the next
    /// read goes back to disk (matching `dbstuff/pager.py`'s
    /// write-then-invalidate, rather than write-through, policy).
    pub fn write_page(&mut self, pageno: u32, bytes: &[u8]) -> Result<()> {
        if pageno >= self.npages {
            return Err(Error::OutOfBounds(pageno));
        }
        self.write_frame(pageno, bytes)?;
        self.cache.delete(pageno);
        Ok(())
    }

    /// Allocate a page, preferring a page released by a previous
    /// `free_page` over extending the file.
    pub fn alloc_page(&mut self) -> Result<u32> {
        if self.next_free_pageno != 0 {
            let pageno = self.next_free_pageno;
            let bytes = self.read_frame(pageno)?;
            if PageKind::of(&bytes)? != PageKind::Free {
                return Err(Error::BadFreeList(pageno));
            }
            let free = FreePage::decode(&bytes)?;
            self.next_free_pageno = free.next_free_pageno;
            self.write_zero_page()?;
            trace!("allocated page {pageno} from free list");
            Ok(pageno)
        } else {
            let pageno = self.extend_by_one()?;
            trace!("allocated fresh page {pageno}");
            Ok(pageno)
        }
    }

    /// Release a page back to the free list.
    pub fn free_page(&mut self, pageno: u32) -> Result<()> {
        self.cache.delete(pageno);
        let free = FreePage::new(self.next_free_pageno);
        self.write_frame(pageno, &free.encode())?;
        self.next_free_pageno = pageno;
        self.write_zero_page()?;
        Ok(())
    }

    /// Write `value` into a freshly allocated overflow chain, prefixing the
    /// first page's payload with a 4-byte big-endian length (spec.md §9,
    /// Open Question (b)). Returns the pageno of the chain's head.
    pub fn write_overflow(&mut self, value: &[u8]) -> Result<u32> {
        let prefixed = crate::util::length_prefix(value);
        let head = self.alloc_page()?;
        let mut pageno = head;
        let mut offset = 0usize;

        loop {
            let remaining = prefixed.len() - offset;
            let take = remaining.min(page::overflow::DATASIZE);
            let chunk = &prefixed[offset..offset + take];
            offset += take;

            let next = if offset < prefixed.len() {
                self.alloc_page()?
            } else {
                0
            };

            let op = OverflowPage {
                next_overflow_pageno: next,
                payload: chunk.to_vec(),
            };
            self.write_page(pageno, &op.encode())?;

            if next == 0 {
                break;
            }
            pageno = next;
        }

        Ok(head)
    }

    /// Read the value stored in the overflow chain starting at `head`.
    pub fn read_overflow(&mut self, head: u32) -> Result<Vec<u8>> {
        let mut pageno = head;
        let mut collected: Vec<u8> = Vec::new();
        let mut declared_len: Option<u32> = None;

        loop {
            let frame = self.read_page(pageno)?;
            let op = OverflowPage::decode(frame.as_slice())?;

            if declared_len.is_none() {
                let len_bytes: [u8; 4] = op.payload[0..4].try_into().unwrap();
                declared_len = Some(u32::from_be_bytes(len_bytes));
                collected.extend_from_slice(&op.payload[4..]);
            } else {
                collected.extend_from_slice(&op.payload);
            }

            if op.next_overflow_pageno == 0 {
                break;
            }
            pageno = op.next_overflow_pageno;
        }

        let declared_len = declared_len.unwrap_or(0) as usize;
        if collected.len() < declared_len {
            return Err(Error::ChainTruncated {
                expected: declared_len as u32,
                actual: collected.len() as u32,
            });
        }
        collected.truncate(declared_len);
        Ok(collected)
    }

    /// Release every page in an overflow chain back to the free list, e.g.
    /// when a value is overwritten or deleted.
    pub fn free_overflow(&mut self, head: u32) -> Result<()> {
        let mut pageno = head;
        loop {
            let frame = self.read_page(pageno)?;
            let op = OverflowPage::decode(frame.as_slice())?;
            let next = op.next_overflow_pageno;
            self.free_page(pageno)?;
            if next == 0 {
                break;
            }
            pageno = next;
        }
        Ok(())
    }

    /// Flush buffered writes to disk. The pager writes through on every
    /// `write_page`/`write_zero_page` call already; this exists for callers
    /// that want an explicit durability point without giving up the pager.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    /// Flush and release the file, consuming the pager.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        drop(self.file);
        Ok(())
    }

    fn extend_by_one(&mut self) -> Result<u32> {
        let pageno = self.npages;
        self.file.seek(SeekFrom::Start(pageno as u64 * PAGESIZE as u64))?;
        self.file.write_all(&vec![0u8; PAGESIZE])?;
        self.file.flush()?;
        self.npages += 1;
        Ok(pageno)
    }

    fn read_frame(&mut self, pageno: u32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; PAGESIZE];
        self.file.seek(SeekFrom::Start(pageno as u64 * PAGESIZE as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_frame(&mut self, pageno: u32, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(pageno as u64 * PAGESIZE as u64))?;
        self.file.write_all(bytes)?;
        self.file.flush()?;
        Ok(())
    }
}
