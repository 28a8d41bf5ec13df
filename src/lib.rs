//! `pagetree`: an embedded, single-file key-value storage engine built on
//! a disk-resident B+ tree over a fixed-size paged file.
//!
//! ## Architecture
//!
//! - [`page`]: pure encode/decode of each on-disk page kind (zero, free,
//!   leaf, interior, overflow) to and from a `PAGESIZE` frame.
//! - [`pager`]: owns the backing file, allocation, the free list threaded
//!   through the file, the LRU + graveyard page cache, and overflow
//!   chains.
//! - [`btree`]: the recursive split/merge/borrow algorithms over the
//!   pager, exposed as `get`/`put`/`delete`/`contains`/`scan`.
//! - [`lock`]: the reader-preferring read/write lock guarding mutation for
//!   multi-threaded callers.
//!
//! [`Db`] composes these into the crate's public entry point.
//!
//! ```rust,no_run
//! use pagetree::{Config, Db};
//!
//! let mut db: Db<u64, String> = Db::open("example.db", Config::default())?;
//! db.put(1, &"hello".to_string())?;
//! assert_eq!(db.get(&1)?, Some("hello".to_string()));
//! # Ok::<(), pagetree::Error>(())
//! ```

pub mod btree;
pub mod codec;
pub mod config;
pub mod error;
pub mod lock;
pub mod page;
pub mod pager;
pub mod util;

pub use codec::{BincodeCodec, KeySlice, ValueCodec};
pub use config::Config;
pub use error::{Error, Result};

use std::path::Path;

use btree::BTree;
use lock::RwLock;

/// The crate's public entry point: a B+ tree key-value store over a
/// single file, safe to share between threads behind the reader-preferring
/// [`lock::RwLock`] (spec.md §5).
///
/// Every operation here takes [`lock::RwLock::write`], including lookups:
/// [`pager::Pager::read_page`] mutates the LRU cache's ordering (and, on a
/// miss, seeks the shared file handle) even on a pure read, so a lookup is
/// not actually safe to run concurrently with another lookup or a mutation
/// through this `Pager`. Spec.md §5 allows exactly this — "the
/// implementation is free to protect LRU-bookkeeping with a dedicated
/// fine-grained lock, as long as it preserves reader safety" — but a
/// from-scratch file layer built around `Seek` rather than positioned
/// reads (`pread`) has no safe way to let two lookups share the handle
/// without that fine-grained lock, so this crate takes the coarser but
/// sound route: every `Pager`-backed operation serializes under the write
/// lock. [`lock::RwLock`] itself still implements and is tested against
/// the full reader-preference contract for types that don't have this
/// constraint.
pub struct Db<K, V, VC = BincodeCodec> {
    tree: RwLock<BTree<K, V, VC>>,
}

impl<K, V, VC> Db<K, V, VC>
where
    K: KeySlice,
    VC: ValueCodec<V>,
{
    /// Open (creating if necessary) a database file at `path`.
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let tree = BTree::open(path, config)?;
        Ok(Self { tree: RwLock::new(tree) })
    }

    /// Insert `key` with `value`, replacing any existing value.
    pub fn put(&self, key: K, value: &V) -> Result<()> {
        self.tree.write().put(key, value)
    }

    /// Look up `key`.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.tree.write().get(key)
    }

    /// Report whether `key` is present.
    pub fn contains(&self, key: &K) -> Result<bool> {
        self.tree.write().contains(key)
    }

    /// Remove `key` if present; a missing key is a silent no-op.
    pub fn delete(&self, key: &K) -> Result<()> {
        self.tree.write().delete(key)
    }

    /// Collect every `(key, value)` pair in ascending key order.
    ///
    /// Unlike [`btree::BTree::scan`], this returns an owned `Vec` rather
    /// than a borrowing iterator: a lazily-borrowing cursor can't outlive
    /// the write guard it would need to hold the pager through, since
    /// [`btree::BTree::get`]/`put` take `&mut self` through the pager's
    /// cache. Callers who want a true lazy cursor should take the write
    /// lock themselves and call [`btree::BTree::scan`] directly.
    pub fn scan(&self) -> Result<Vec<(K, V)>> {
        self.tree.write().scan()?.collect()
    }

    pub fn close(self) -> Result<()> {
        self.tree.into_inner().close()
    }
}
