//! Disjoint-set (union-find) structure over a fixed number of slots.
//!
//! [`DisjointSet`] partitions the slots `0..capacity` into trees. Each slot may also
//! carry a payload, which turns the structure into a read-mostly sequence: the
//! payloads can be indexed, searched and iterated, but slots can never be inserted
//! or removed. Kruskal-style algorithms use it to track which vertex positions are
//! already connected.
//!
//! # Examples
//!
//! ```rust
//! use edgeloom::utils::DisjointSet;
//!
//! let mut set: DisjointSet<&str> = DisjointSet::new(4);
//! set.set(0, Some("a"))?;
//! assert!(set.union(0, 1)?);
//! assert!(!set.union(1, 0)?);
//! assert_eq!(set.find(1)?, set.find(0)?);
//! assert_eq!(set.number_of_trees(), 3);
//! # Ok::<(), edgeloom::Error>(())
//! ```

use std::fmt;
use std::ops::{Index, Range};

use crate::{Error, Result};

/// A union-find structure with union by height and path compression.
///
/// Every slot starts as the root of its own single-node tree. [`find`](Self::find)
/// returns a slot's representative root and flattens the path it walked;
/// [`union`](Self::union) attaches the shorter tree beneath the taller one.
#[derive(Debug, Clone)]
pub struct DisjointSet<T> {
    /// Parent of each slot; a root is its own parent
    parents: Vec<usize>,
    /// Tree height, only meaningful for roots
    heights: Vec<u32>,
    payloads: Vec<Option<T>>,
    tree_count: usize,
    element_count: usize,
}

impl<T> DisjointSet<T> {
    /// Creates a set of `capacity` singleton trees without payloads.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        DisjointSet {
            parents: (0..capacity).collect(),
            heights: vec![1; capacity],
            payloads: std::iter::repeat_with(|| None).take(capacity).collect(),
            tree_count: capacity,
            element_count: 0,
        }
    }

    /// Resets every slot to a singleton root and drops all payloads.
    pub fn clear(&mut self) {
        for (index, parent) in self.parents.iter_mut().enumerate() {
            *parent = index;
        }
        self.heights.fill(1);
        self.payloads.iter_mut().for_each(|slot| *slot = None);
        self.tree_count = self.parents.len();
        self.element_count = 0;
    }

    /// Returns the representative root of the tree containing `index`.
    ///
    /// Every slot on the walked path is re-parented directly to the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index >= capacity`.
    pub fn find(&mut self, index: usize) -> Result<usize> {
        self.check(index)?;

        let mut root = index;
        while self.parents[root] != root {
            root = self.parents[root];
        }

        let mut cursor = index;
        while self.parents[cursor] != root {
            let next = self.parents[cursor];
            self.parents[cursor] = root;
            cursor = next;
        }
        Ok(root)
    }

    /// Merges the trees containing `first` and `second`.
    ///
    /// Both arguments are resolved to their roots first. The taller tree absorbs the
    /// shorter one; on a tie the root of `first` becomes the new root and grows by one.
    ///
    /// # Returns
    ///
    /// `true` if two distinct trees were merged, `false` if both already shared a root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if either index is out of range.
    pub fn union(&mut self, first: usize, second: usize) -> Result<bool> {
        self.check(first)?;
        self.check(second)?;

        let first = self.find(first)?;
        let second = self.find(second)?;
        if first == second {
            return Ok(false);
        }

        match self.heights[first].cmp(&self.heights[second]) {
            std::cmp::Ordering::Less => self.parents[first] = second,
            std::cmp::Ordering::Greater => self.parents[second] = first,
            std::cmp::Ordering::Equal => {
                self.parents[second] = first;
                self.heights[first] += 1;
            }
        }
        self.tree_count -= 1;
        Ok(true)
    }

    /// Stores `payload` in slot `index` and returns the previous payload.
    ///
    /// Passing `None` empties the slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index >= capacity`.
    pub fn set(&mut self, index: usize, payload: Option<T>) -> Result<Option<T>> {
        self.check(index)?;
        let old = std::mem::replace(&mut self.payloads[index], payload);
        match (old.is_some(), self.payloads[index].is_some()) {
            (false, true) => self.element_count += 1,
            (true, false) => self.element_count -= 1,
            _ => {}
        }
        Ok(old)
    }

    /// Returns the payload stored in slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index >= capacity`.
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        self.check(index)?;
        Ok(self.payloads[index].as_ref())
    }

    /// Returns the number of disjoint trees.
    #[must_use]
    pub fn number_of_trees(&self) -> usize {
        self.tree_count
    }

    /// Returns the number of slots holding a payload.
    #[must_use]
    pub fn number_of_elements(&self) -> usize {
        self.element_count
    }

    /// Returns the fixed number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.parents.len()
    }

    /// Returns `true` if no slot holds a payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    /// Iterates the payload of every slot in index order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.payloads.iter().map(Option::as_ref)
    }

    /// Returns the payloads of slots `range.start..range.end`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if the range exceeds the capacity.
    pub fn sub_list(&self, range: Range<usize>) -> Result<&[Option<T>]> {
        if range.start > range.end || range.end > self.capacity() {
            return Err(Error::IndexOutOfBounds {
                index: range.end.max(range.start),
                len: self.capacity(),
            });
        }
        Ok(&self.payloads[range])
    }

    fn check(&self, index: usize) -> Result<()> {
        if index >= self.parents.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.parents.len(),
            });
        }
        Ok(())
    }
}

impl<T: PartialEq> DisjointSet<T> {
    /// Returns `true` if any slot holds a payload equal to `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Returns the lowest slot holding a payload equal to `value`.
    #[must_use]
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.payloads
            .iter()
            .position(|slot| slot.as_ref() == Some(value))
    }

    /// Returns the highest slot holding a payload equal to `value`.
    #[must_use]
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        self.payloads
            .iter()
            .rposition(|slot| slot.as_ref() == Some(value))
    }
}

impl<T: Clone> DisjointSet<T> {
    /// Copies every slot's payload into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Option<T>> {
        self.payloads.clone()
    }
}

impl<T> Index<usize> for DisjointSet<T> {
    type Output = Option<T>;

    /// # Panics
    ///
    /// Panics if `index >= capacity`; use [`DisjointSet::get`] for a checked lookup.
    fn index(&self, index: usize) -> &Self::Output {
        &self.payloads[index]
    }
}

impl<T: fmt::Display> fmt::Display for DisjointSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisjointSet=[")?;
        for (index, slot) in self.payloads.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            match slot {
                Some(value) => write!(f, "{value}")?,
                None => write!(f, "-")?,
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_set_is_all_roots() {
        let mut set: DisjointSet<u32> = DisjointSet::new(10);
        assert_eq!(set.capacity(), 10);
        assert_eq!(set.number_of_trees(), 10);
        assert_eq!(set.number_of_elements(), 0);
        assert!(set.is_empty());
        for i in 0..10 {
            assert_eq!(set.find(i).unwrap(), i);
        }
    }

    #[test]
    fn test_union_and_find() {
        let mut set: DisjointSet<u32> = DisjointSet::new(10);
        assert!(set.union(0, 1).unwrap());
        assert!(set.union(2, 3).unwrap());
        assert!(set.union(1, 3).unwrap());
        assert_eq!(set.number_of_trees(), 7);

        let root = set.find(0).unwrap();
        for i in 1..4 {
            assert_eq!(set.find(i).unwrap(), root);
        }
        assert_ne!(set.find(4).unwrap(), root);

        // Merging within one tree changes nothing
        assert!(!set.union(3, 0).unwrap());
        assert_eq!(set.number_of_trees(), 7);
    }

    #[test]
    fn test_union_by_height() {
        let mut set: DisjointSet<()> = DisjointSet::new(5);
        // Equal heights: first root wins and grows
        set.union(0, 1).unwrap();
        assert_eq!(set.find(1).unwrap(), 0);

        // Shorter tree joins the taller one even when passed first
        set.union(2, 0).unwrap();
        assert_eq!(set.find(2).unwrap(), 0);

        // Two trees of height two: the first argument's root wins
        set.union(3, 4).unwrap();
        set.union(3, 0).unwrap();
        assert_eq!(set.find(0).unwrap(), 3);
        assert_eq!(set.find(2).unwrap(), 3);
        assert_eq!(set.heights[3], 3);
    }

    #[test]
    fn test_path_compression() {
        let mut set: DisjointSet<()> = DisjointSet::new(8);
        set.union(0, 1).unwrap();
        set.union(2, 3).unwrap();
        set.union(0, 2).unwrap();
        set.union(4, 5).unwrap();
        set.union(6, 7).unwrap();
        set.union(4, 6).unwrap();
        set.union(0, 4).unwrap();
        assert_eq!(set.number_of_trees(), 1);

        let root = set.find(7).unwrap();
        assert_eq!(set.parents[7], root);
        assert_eq!(set.parents[6], root);
    }

    #[test]
    fn test_payloads() {
        let mut set = DisjointSet::new(4);
        assert_eq!(set.set(1, Some("b")).unwrap(), None);
        assert_eq!(set.set(3, Some("b")).unwrap(), None);
        assert_eq!(set.set(1, Some("a")).unwrap(), Some("b"));
        assert_eq!(set.number_of_elements(), 2);

        assert_eq!(set.get(1).unwrap(), Some(&"a"));
        assert_eq!(set[2], None);
        assert!(set.contains(&"b"));
        assert!(!set.contains(&"z"));
        assert_eq!(set.index_of(&"b"), Some(3));
        assert_eq!(set.last_index_of(&"a"), Some(1));
        assert_eq!(set.to_vec(), vec![None, Some("a"), None, Some("b")]);
        assert_eq!(set.sub_list(1..3).unwrap(), &[Some("a"), None]);
        assert_eq!(set.iter().flatten().count(), 2);
        assert_eq!(set.to_string(), "DisjointSet=[-, a, -, b]");

        assert_eq!(set.set(3, None).unwrap(), Some("b"));
        assert_eq!(set.number_of_elements(), 1);
    }

    #[test]
    fn test_clear_resets() {
        let mut set = DisjointSet::new(6);
        set.set(0, Some(1)).unwrap();
        set.union(0, 5).unwrap();
        set.union(1, 2).unwrap();

        set.clear();
        assert_eq!(set.number_of_trees(), 6);
        assert!(set.is_empty());
        for i in 0..6 {
            assert_eq!(set.find(i).unwrap(), i);
            assert_eq!(set.get(i).unwrap(), None);
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let mut set: DisjointSet<u8> = DisjointSet::new(3);
        assert!(matches!(
            set.find(3),
            Err(Error::IndexOutOfBounds { index: 3, len: 3 })
        ));
        assert!(set.union(0, 7).is_err());
        assert!(set.set(5, Some(1)).is_err());
        assert!(set.get(3).is_err());
        assert!(set.sub_list(2..4).is_err());
        assert_eq!(set.number_of_trees(), 3);
    }

    #[test]
    fn test_zero_capacity() {
        let mut set: DisjointSet<u8> = DisjointSet::new(0);
        assert_eq!(set.number_of_trees(), 0);
        assert!(set.find(0).is_err());
        assert_eq!(set.to_string(), "DisjointSet=[]");
    }
}
