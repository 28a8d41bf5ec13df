//! Crate-wide error type.
//!
//! Errors fall into four kinds (see spec): structural corruption (fatal,
//! surfaced as-is), I/O failure (propagated unchanged), domain misuse
//! (raised at the call site), and not-found (never an error — callers see
//! `None`, `false`, or a silent no-op instead).

use std::io;

use thiserror::Error;

/// Errors produced by the pager and B+ tree.
#[derive(Debug, Error)]
pub enum Error {
    /// A pageno was read or written beyond the current file length.
    #[error("page {0} is out of bounds")]
    OutOfBounds(u32),

    /// A page's magic did not match the kind it was decoded as.
    #[error("bad magic decoding page as {kind}")]
    BadMagic { kind: &'static str },

    /// A buffer handed to the page codec was not exactly `PAGESIZE` bytes.
    #[error("expected a {expected}-byte page, got {actual}")]
    BadLength { expected: usize, actual: usize },

    /// A page reached via the free list did not carry the free-page magic.
    #[error("corrupt free list: page {0} is not a free page")]
    BadFreeList(u32),

    /// An overflow chain ended before the declared payload length was read.
    #[error("overflow chain truncated before {expected} bytes were read (got {actual})")]
    ChainTruncated { expected: u32, actual: u32 },

    /// `ORDER` was invalid for a new tree (must be >= 3).
    #[error("invalid order {0}: ORDER must be >= 3")]
    InvalidOrder(u32),

    /// Underlying file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
