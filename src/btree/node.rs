//! In-memory leaf and interior node views, decoded from pages, with the
//! split/borrow/merge mechanics used by [`super::BTree`].
//!
//! Ported from `dbstuff/disk_btree.py`'s `LeafNode`/`InteriorNode`, whose
//! methods hold direct object references to parent/sibling/child nodes.
//! Here a node only ever knows its own `pageno`; siblings and children are
//! addressed by pageno and fetched through the [`Pager`] on demand (spec.md
//! §9, "recursive node links" design note) — there are no parent pointers,
//! so callers thread the descent path explicitly.

use log::trace;

use crate::error::Result;
use crate::page::{InteriorPage, LeafPage, PageKind};
use crate::pager::Pager;
use crate::util::split_list;

/// A decoded leaf page paired with the pageno it was read from.
pub(crate) struct LeafNode {
    pub pageno: u32,
    pub page: LeafPage,
}

/// A decoded interior page paired with the pageno it was read from.
pub(crate) struct InteriorNode {
    pub pageno: u32,
    pub page: InteriorPage,
}

pub(crate) fn page_kind(pager: &mut Pager, pageno: u32) -> Result<PageKind> {
    let frame = pager.read_page(pageno)?;
    PageKind::of(frame.as_slice())
}

impl LeafNode {
    pub fn read(pager: &mut Pager, pageno: u32, max_keys: usize) -> Result<Self> {
        let frame = pager.read_page(pageno)?;
        let page = LeafPage::decode(frame.as_slice(), max_keys)?;
        Ok(Self { pageno, page })
    }

    pub fn write(&self, pager: &mut Pager, max_keys: usize) -> Result<()> {
        pager.write_page(self.pageno, &self.page.encode(max_keys))
    }

    pub fn is_minimal(&self, min_keys: usize) -> bool {
        self.page.keys.len() <= min_keys
    }

    /// Creates a new right sibling, splices it into the leaf chain, and
    /// divides entries by [`split_list`] (median lands in the right half).
    /// Returns `(separator, right_sibling)`; the separator is
    /// `right.entries[0].key`, copied rather than moved.
    pub fn split(&mut self, pager: &mut Pager, max_keys: usize) -> Result<(u64, LeafNode)> {
        let right_pageno = pager.alloc_page()?;
        let (left_keys, right_keys) = split_list(std::mem::take(&mut self.page.keys));
        let (left_data, right_data) = split_list(std::mem::take(&mut self.page.data));
        let old_next = self.page.next;

        self.page.keys = left_keys;
        self.page.data = left_data;
        self.page.next = right_pageno;

        let right = LeafPage {
            keys: right_keys,
            data: right_data,
            prev: self.pageno,
            next: old_next,
        };
        let separator = right.keys[0];

        if old_next != 0 {
            let mut next = LeafNode::read(pager, old_next, max_keys)?;
            next.page.prev = right_pageno;
            next.write(pager, max_keys)?;
        }

        let right = LeafNode {
            pageno: right_pageno,
            page: right,
        };
        right.write(pager, max_keys)?;
        self.write(pager, max_keys)?;
        trace!("split leaf {} -> {} (separator {separator})", self.pageno, right_pageno);
        Ok((separator, right))
    }

    /// Move the right sibling's first entry to the end of `self`. Returns
    /// the new separator (the right sibling's new first key).
    pub fn borrow_right(&mut self, pager: &mut Pager, right: &mut LeafNode, max_keys: usize) -> Result<u64> {
        let key = right.page.keys.remove(0);
        let data = right.page.data.remove(0);
        self.page.keys.push(key);
        self.page.data.push(data);
        let separator = right.page.keys[0];
        self.write(pager, max_keys)?;
        right.write(pager, max_keys)?;
        Ok(separator)
    }

    /// Move the left sibling's last entry to the start of `self`. Returns
    /// the new separator (`self`'s new first key).
    pub fn borrow_left(&mut self, pager: &mut Pager, left: &mut LeafNode, max_keys: usize) -> Result<u64> {
        let key = left.page.keys.pop().expect("left sibling is non-minimal");
        let data = left.page.data.pop().expect("left sibling is non-minimal");
        self.page.keys.insert(0, key);
        self.page.data.insert(0, data);
        let separator = self.page.keys[0];
        self.write(pager, max_keys)?;
        left.write(pager, max_keys)?;
        Ok(separator)
    }

    /// Concatenate `right`'s entries onto `self` and unlink `right` from
    /// the leaf chain. The caller frees `right`'s page; the discarded
    /// separator is not needed (leaves don't store one).
    pub fn merge(&mut self, pager: &mut Pager, right: &LeafNode, max_keys: usize) -> Result<()> {
        self.page.keys.extend(right.page.keys.iter().copied());
        self.page.data.extend(right.page.data.iter().copied());
        self.page.next = right.page.next;
        if right.page.next != 0 {
            let mut next = LeafNode::read(pager, right.page.next, max_keys)?;
            next.page.prev = self.pageno;
            next.write(pager, max_keys)?;
        }
        self.write(pager, max_keys)?;
        Ok(())
    }
}

impl InteriorNode {
    pub fn read(pager: &mut Pager, pageno: u32, max_keys: usize) -> Result<Self> {
        let frame = pager.read_page(pageno)?;
        let page = InteriorPage::decode(frame.as_slice(), max_keys)?;
        Ok(Self { pageno, page })
    }

    pub fn write(&self, pager: &mut Pager, max_keys: usize) -> Result<()> {
        pager.write_page(self.pageno, &self.page.encode(max_keys))
    }

    pub fn is_minimal(&self, min_keys: usize) -> bool {
        self.page.keys.len() <= min_keys
    }

    /// Pops the median key (it moves up rather than being copied) at index
    /// `keys.len().div_ceil(2) - 1` — spec.md §9 Open Question (a), the
    /// disk variant's `ceil` rule, which is arithmetically the direct
    /// translation of `dbstuff/disk_btree.py`'s
    /// `ceil(len(self.keys) / 2 - 1)` using integer `div_ceil` instead of
    /// floats. The remaining keys and children are halved by
    /// [`split_list`]; `len(children) == len(keys) + 1` holds on both
    /// halves because `split_list` always gives the children array (one
    /// longer than keys) exactly one more entry on each side.
    pub fn split(&mut self, pager: &mut Pager, max_keys: usize) -> Result<(u64, InteriorNode)> {
        let right_pageno = pager.alloc_page()?;
        let median_idx = self.page.keys.len().div_ceil(2) - 1;
        let median = self.page.keys.remove(median_idx);

        let (left_keys, right_keys) = split_list(std::mem::take(&mut self.page.keys));
        let (left_children, right_children) = split_list(std::mem::take(&mut self.page.children));

        self.page.keys = left_keys;
        self.page.children = left_children;
        debug_assert_eq!(self.page.children.len(), self.page.keys.len() + 1);

        let right = InteriorNode {
            pageno: right_pageno,
            page: InteriorPage {
                keys: right_keys,
                children: right_children,
            },
        };
        debug_assert_eq!(right.page.children.len(), right.page.keys.len() + 1);

        right.write(pager, max_keys)?;
        self.write(pager, max_keys)?;
        trace!("split interior {} -> {} (median {median})", self.pageno, right_pageno);
        Ok((median, right))
    }

    /// Append the old separator and the right sibling's first child; pop
    /// and return the right sibling's first key as the new separator.
    pub fn borrow_right(
        &mut self,
        pager: &mut Pager,
        median: u64,
        right: &mut InteriorNode,
        max_keys: usize,
    ) -> Result<u64> {
        let child = right.page.children.remove(0);
        let new_median = right.page.keys.remove(0);
        self.page.keys.push(median);
        self.page.children.push(child);
        self.write(pager, max_keys)?;
        right.write(pager, max_keys)?;
        Ok(new_median)
    }

    /// Prepend the old separator and the left sibling's last child; pop
    /// and return the left sibling's last key as the new separator.
    pub fn borrow_left(
        &mut self,
        pager: &mut Pager,
        median: u64,
        left: &mut InteriorNode,
        max_keys: usize,
    ) -> Result<u64> {
        let child = left.page.children.pop().expect("left sibling is non-minimal");
        let new_median = left.page.keys.pop().expect("left sibling is non-minimal");
        self.page.keys.insert(0, median);
        self.page.children.insert(0, child);
        self.write(pager, max_keys)?;
        left.write(pager, max_keys)?;
        Ok(new_median)
    }

    /// Append the old separator, then all of the right sibling's keys and
    /// children. The caller frees `right`'s page.
    pub fn merge(&mut self, pager: &mut Pager, median: u64, right: &InteriorNode, max_keys: usize) -> Result<()> {
        self.page.keys.push(median);
        self.page.keys.extend(right.page.keys.iter().copied());
        self.page.children.extend(right.page.children.iter().copied());
        self.write(pager, max_keys)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn open_pager() -> (TempDir, Pager) {
        let dir = TempDir::new("node").unwrap();
        let pager = Pager::open(dir.path().join("test.db"), 8).unwrap();
        (dir, pager)
    }

    fn write_leaf(pager: &mut Pager, keys: Vec<u64>, prev: u32, next: u32, max_keys: usize) -> LeafNode {
        let pageno = pager.alloc_page().unwrap();
        let data = keys.iter().map(|k| *k as u32).collect();
        let node = LeafNode {
            pageno,
            page: LeafPage { keys, data, prev, next },
        };
        node.write(pager, max_keys).unwrap();
        node
    }

    #[test]
    fn leaf_split_puts_median_right_and_splices_chain() {
        let (_dir, mut pager) = open_pager();
        let mut leaf = write_leaf(&mut pager, vec![1, 2, 3, 4, 5], 0, 0, 16);

        let (separator, right) = leaf.split(&mut pager, 16).unwrap();
        assert_eq!(leaf.page.keys, vec![1, 2]);
        assert_eq!(right.page.keys, vec![3, 4, 5]);
        assert_eq!(separator, 3);
        assert_eq!(leaf.page.next, right.pageno);
        assert_eq!(right.page.prev, leaf.pageno);
    }

    #[test]
    fn leaf_borrow_right_moves_one_entry() {
        let (_dir, mut pager) = open_pager();
        let mut left = write_leaf(&mut pager, vec![1, 2], 0, 0, 16);
        let mut right = write_leaf(&mut pager, vec![3, 4, 5], left.pageno, 0, 16);

        let new_sep = left.borrow_right(&mut pager, &mut right, 16).unwrap();
        assert_eq!(left.page.keys, vec![1, 2, 3]);
        assert_eq!(right.page.keys, vec![4, 5]);
        assert_eq!(new_sep, 4);
    }

    #[test]
    fn leaf_merge_concatenates_and_unlinks() {
        let (_dir, mut pager) = open_pager();
        let mut left = write_leaf(&mut pager, vec![1, 2], 0, 0, 16);
        let right = write_leaf(&mut pager, vec![3, 4], left.pageno, 0, 16);

        left.merge(&mut pager, &right, 16).unwrap();
        assert_eq!(left.page.keys, vec![1, 2, 3, 4]);
        assert_eq!(left.page.next, 0);
    }

    #[test]
    fn interior_split_median_moves_up() {
        let (_dir, mut pager) = open_pager();
        let pageno = pager.alloc_page().unwrap();
        let mut node = InteriorNode {
            pageno,
            page: InteriorPage {
                keys: vec![10, 20, 30, 40],
                children: vec![1, 2, 3, 4, 5],
            },
        };
        node.write(&mut pager, 16).unwrap();

        let (median, right) = node.split(&mut pager, 16).unwrap();
        assert_eq!(median, 20);
        assert_eq!(node.page.keys, vec![10]);
        assert_eq!(node.page.children, vec![1, 2]);
        assert_eq!(right.page.keys, vec![30, 40]);
        assert_eq!(right.page.children, vec![3, 4, 5]);
    }
}
