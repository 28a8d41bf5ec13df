//! A bounded LRU page cache with a weak-reference graveyard tier.
//!
//! Evicted pages aren't dropped outright: they move to a graveyard of weak
//! references and can be resurrected (moved back into the LRU tier) if
//! they're looked up again before the last strong reference (held by
//! whoever read them out of the cache) is dropped. This mirrors
//! `OrderedDict` + `WeakValueDictionary` in the Python original, since Rust
//! has no GC to quietly collect unreferenced values on our behalf — we use
//! `Arc`/`Weak` instead.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use crate::config::PAGESIZE;

pub type Frame = Arc<[u8; PAGESIZE]>;

/// LRU + graveyard cache of page frames, keyed by page number.
#[derive(Debug)]
pub struct Cache {
    maxsize: usize,
    /// Front = most recently used.
    lru: VecDeque<(u32, Frame)>,
    grave: HashMap<u32, Weak<[u8; PAGESIZE]>>,
    pub hits: u64,
    pub misses: u64,
    pub resurrections: u64,
}

impl Cache {
    pub fn new(maxsize: usize) -> Self {
        Self {
            maxsize,
            lru: VecDeque::new(),
            grave: HashMap::new(),
            hits: 0,
            misses: 0,
            resurrections: 0,
        }
    }

    /// Look up a page. On a hit in the LRU tier, the entry is moved to the
    /// front. On a hit in the graveyard (the weak reference is still
    /// alive), the page is resurrected back into the LRU tier.
    pub fn get(&mut self, pageno: u32) -> Option<Frame> {
        if let Some(pos) = self.lru.iter().position(|(p, _)| *p == pageno) {
            let entry = self.lru.remove(pos).unwrap();
            self.hits += 1;
            self.lru.push_front(entry.clone());
            return Some(entry.1);
        }

        if let Some(weak) = self.grave.remove(&pageno) {
            if let Some(frame) = weak.upgrade() {
                self.resurrections += 1;
                self.insert_front(pageno, frame.clone());
                return Some(frame);
            }
        }

        self.misses += 1;
        None
    }

    /// Insert or overwrite a page's cached frame.
    pub fn set(&mut self, pageno: u32, frame: Frame) {
        self.grave.remove(&pageno);
        if let Some(pos) = self.lru.iter().position(|(p, _)| *p == pageno) {
            self.lru.remove(pos);
        }
        self.insert_front(pageno, frame);
    }

    /// Drop a page from both tiers, e.g. after it's been freed or
    /// overwritten out from under the cache.
    pub fn delete(&mut self, pageno: u32) {
        self.grave.remove(&pageno);
        if let Some(pos) = self.lru.iter().position(|(p, _)| *p == pageno) {
            self.lru.remove(pos);
        }
    }

    fn insert_front(&mut self, pageno: u32, frame: Frame) {
        self.lru.push_front((pageno, frame));
        while self.lru.len() > self.maxsize {
            let (evicted_no, evicted_frame) = self.lru.pop_back().unwrap();
            self.grave.insert(evicted_no, Arc::downgrade(&evicted_frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(byte: u8) -> Frame {
        Arc::new([byte; PAGESIZE])
    }

    #[test]
    fn miss_then_hit() {
        let mut cache = Cache::new(2);
        assert!(cache.get(1).is_none());
        assert_eq!(cache.misses, 1);

        cache.set(1, frame(1));
        assert!(cache.get(1).is_some());
        assert_eq!(cache.hits, 1);
    }

    #[test]
    fn eviction_to_graveyard_and_resurrection() {
        let mut cache = Cache::new(1);
        cache.set(1, frame(1));
        let kept_alive = frame(2);
        cache.set(2, kept_alive.clone());

        // page 1 was evicted to the graveyard; it's kept alive here only by
        // nothing else holding a strong ref, so resurrection should fail.
        assert!(cache.get(1).is_none());
        assert_eq!(cache.resurrections, 0);

        // page 2 is still in the LRU tier.
        assert!(cache.get(2).is_some());

        drop(kept_alive);
    }

    #[test]
    fn resurrection_when_strong_ref_survives() {
        let mut cache = Cache::new(1);
        let held = frame(9);
        cache.set(1, held.clone());
        cache.set(2, frame(2)); // evicts 1 to the graveyard

        // `held` keeps page 1's Arc alive, so the weak ref upgrades.
        let resurrected = cache.get(1).unwrap();
        assert_eq!(*resurrected, *held);
        assert_eq!(cache.resurrections, 1);
    }

    #[test]
    fn delete_removes_from_both_tiers() {
        let mut cache = Cache::new(1);
        cache.set(1, frame(1));
        cache.delete(1);
        assert!(cache.get(1).is_none());
    }
}
