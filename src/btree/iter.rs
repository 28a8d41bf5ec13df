//! Lazy in-order scan over a B+ tree, chasing `next` leaf-chain pointers.
//!
//! Grounded on spec.md §4.3's `scan()` and the leaf sibling chain
//! maintained by `dbstuff/disk_btree.py`'s `LeafNode.next_leaf`; unlike the
//! source (which can hold a live `LeafNode` reference across iterations),
//! each step here re-reads the next leaf page from the pager by pageno.

use std::marker::PhantomData;

use crate::codec::{KeySlice, ValueCodec};
use crate::error::Result;
use crate::page::LeafPage;
use crate::pager::Pager;

/// Iterator over `(key, value)` pairs in ascending key order.
pub struct Scan<'a, K, V, VC> {
    pager: &'a mut Pager,
    leaf: Option<LeafPage>,
    idx: usize,
    max_keys: usize,
    _marker: PhantomData<(K, V, VC)>,
}

impl<'a, K, V, VC> Scan<'a, K, V, VC>
where
    K: KeySlice,
    VC: ValueCodec<V>,
{
    pub(crate) fn new(pager: &'a mut Pager, leaf: LeafPage, max_keys: usize) -> Self {
        Self {
            pager,
            leaf: Some(leaf),
            idx: 0,
            max_keys,
            _marker: PhantomData,
        }
    }
}

impl<'a, K, V, VC> Iterator for Scan<'a, K, V, VC>
where
    K: KeySlice,
    VC: ValueCodec<V>,
{
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let leaf = self.leaf.as_ref()?;
            if self.idx < leaf.keys.len() {
                let key_slice = leaf.keys[self.idx];
                let head = leaf.data[self.idx];
                self.idx += 1;
                let key = K::from_slice(key_slice.to_be_bytes());
                return Some(
                    self.pager
                        .read_overflow(head)
                        .and_then(|bytes| VC::decode(&bytes))
                        .map(|value| (key, value)),
                );
            }

            let next_pageno = leaf.next;
            if next_pageno == 0 {
                self.leaf = None;
                return None;
            }
            match self.pager.read_page(next_pageno) {
                Ok(frame) => match LeafPage::decode(frame.as_slice(), self.max_keys) {
                    Ok(next_leaf) => {
                        self.leaf = Some(next_leaf);
                        self.idx = 0;
                    }
                    Err(e) => {
                        self.leaf = None;
                        return Some(Err(e));
                    }
                },
                Err(e) => {
                    self.leaf = None;
                    return Some(Err(e));
                }
            }
        }
    }
}
