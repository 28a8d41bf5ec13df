//! Tunable parameters shared by the pager and the B+ tree.
//!
//! Mirrors the builder-style `Config` used across the example pack
//! (`btree-storage::Config`): a plain struct with chained setters, validated
//! once at the point a [`crate::Db`] or [`crate::btree::BTree`] is opened.

use crate::error::{Error, Result};

/// Fixed page size, in bytes. Not configurable: every on-disk layout
/// constant in `page` is derived from this value.
pub const PAGESIZE: usize = 4096;

/// Default number of pages held in the LRU tier of the pager cache before
/// eviction to the graveyard.
pub const DEFAULT_CACHE_MAXSIZE: usize = 32;

/// Default fan-out. Chosen, like the spec's calibration note, so that
/// `header + keys + children` fits in one page for 8-byte key slices and
/// 4-byte page-number children.
pub const DEFAULT_ORDER: u32 = 340;

/// Tree and cache tuning knobs.
///
/// `order` must be uniform across the lifetime of a given database file —
/// changing it after pages have been written will corrupt fan-out
/// assumptions baked into existing interior/leaf pages.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    order: u32,
    cache_maxsize: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            cache_maxsize: DEFAULT_CACHE_MAXSIZE,
        }
    }
}

impl Config {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tree fan-out (`ORDER`). Must be >= 3.
    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Set the number of pages the LRU tier holds before eviction to the
    /// cache graveyard.
    pub fn cache_maxsize(mut self, cache_maxsize: usize) -> Self {
        self.cache_maxsize = cache_maxsize;
        self
    }

    pub fn get_order(&self) -> u32 {
        self.order
    }

    pub fn get_cache_maxsize(&self) -> usize {
        self.cache_maxsize
    }

    /// Maximum number of keys in a node: `ORDER - 1`.
    pub fn max_keys(&self) -> usize {
        (self.order - 1) as usize
    }

    /// Minimum number of keys in a non-root node: `ceil(MAX_KEYS / 2)`.
    pub fn min_keys(&self) -> usize {
        self.max_keys().div_ceil(2)
    }

    /// Validate the configuration, returning the error the caller should
    /// surface before opening a pager.
    ///
    /// Beyond the `order >= 3` floor, this also rejects any `order` whose
    /// derived `max_keys` wouldn't fit a leaf or interior page in
    /// `PAGESIZE` bytes, so an oversized order surfaces as
    /// `Error::InvalidOrder` here rather than panicking on the
    /// `debug_assert!` inside `InteriorPage::encode`/`LeafPage::encode`
    /// later.
    pub fn validate(&self) -> Result<()> {
        if self.order < 3 {
            return Err(Error::InvalidOrder(self.order));
        }
        let max_keys = self.max_keys();
        if crate::page::InteriorPage::capacity_for(max_keys) > PAGESIZE
            || crate::page::LeafPage::capacity_for(max_keys) > PAGESIZE
        {
            return Err(Error::InvalidOrder(self.order));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn order_below_three_is_invalid() {
        let cfg = Config::new().order(2);
        assert!(matches!(cfg.validate(), Err(Error::InvalidOrder(2))));
    }

    #[test]
    fn order_too_large_to_fit_a_page_is_invalid() {
        let cfg = Config::new().order(10_000);
        assert!(matches!(cfg.validate(), Err(Error::InvalidOrder(10_000))));
    }

    #[test]
    fn max_and_min_keys_derivation() {
        let cfg = Config::new().order(8);
        assert_eq!(cfg.max_keys(), 7);
        assert_eq!(cfg.min_keys(), 4);

        let cfg = Config::new().order(9);
        assert_eq!(cfg.max_keys(), 8);
        assert_eq!(cfg.min_keys(), 4);
    }
}
