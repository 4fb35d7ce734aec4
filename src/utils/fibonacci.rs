//! Fibonacci heap priority queue.
//!
//! This module provides [`FibonacciHeap`], a mergeable priority queue keyed by `f64`
//! priorities with O(1) amortized `insert`, `decrease_key` and `union`, and O(log n)
//! amortized `remove_min`. It is the queue shortest-path and minimum-spanning-tree
//! algorithms want when they repeatedly relax tentative distances.
//!
//! # Architecture
//!
//! Nodes live in an arena (`Vec`) and reference each other by index: every node
//! sits in a circular, doubly-linked sibling ring, and the heap keeps a pointer to
//! the minimum root. Callers hold [`Entry`] handles returned by
//! [`FibonacciHeap::insert`]; a handle carries a generation so that handles to
//! removed entries are rejected with [`crate::Error::StaleEntry`] instead of
//! silently addressing a reused slot.
//!
//! # Examples
//!
//! ```rust
//! use edgeloom::utils::FibonacciHeap;
//!
//! let mut heap = FibonacciHeap::new();
//! heap.insert("far", 10.0);
//! let near = heap.insert("near", 7.0);
//! heap.insert("mid", 8.0);
//!
//! heap.decrease_key(near, 1.0)?;
//! assert_eq!(heap.remove_min(), Some("near"));
//! assert_eq!(heap.remove_min(), Some("mid"));
//! # Ok::<(), edgeloom::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! The heap is not internally synchronized. It is [`Send`] and [`Sync`] when `T` is;
//! concurrent mutation requires external locking.

use std::fmt;

use crate::{Error, Result};

/// A handle to an entry stored in a [`FibonacciHeap`].
///
/// Handles are returned by [`FibonacciHeap::insert`] and stay valid until the entry
/// is removed, the heap is cleared, or the heap is absorbed by
/// [`FibonacciHeap::append`] (use the returned [`EntryMap`] to re-address them).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    index: usize,
    generation: u64,
}

impl Entry {
    /// Returns the arena slot of this entry.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry({}@{})", self.index, self.generation)
    }
}

/// Translates handles of a heap that was absorbed by [`FibonacciHeap::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMap {
    index_offset: usize,
    generation_offset: u64,
}

impl EntryMap {
    /// Re-addresses an entry of the absorbed heap into the combined heap.
    #[must_use]
    pub const fn translate(&self, entry: Entry) -> Entry {
        Entry {
            index: entry.index + self.index_offset,
            generation: entry.generation + self.generation_offset,
        }
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    /// `None` marks a free slot
    payload: Option<T>,
    key: f64,
    parent: Option<usize>,
    child: Option<usize>,
    left: usize,
    right: usize,
    degree: usize,
    mark: bool,
    generation: u64,
}

/// A Fibonacci heap over payloads of type `T` keyed by `f64` priorities.
///
/// # Complexity
///
/// | Operation | Cost |
/// |---|---|
/// | [`insert`](Self::insert) | O(1) |
/// | [`min`](Self::min) | O(1) |
/// | [`remove_min`](Self::remove_min) | O(log n) amortized |
/// | [`decrease_key`](Self::decrease_key) | O(1) amortized |
/// | [`delete`](Self::delete) | O(log n) amortized |
/// | [`append`](Self::append) | O(1) splice, plus moving the absorbed arena |
///
/// # Known Limitation
///
/// [`delete`](Self::delete) works by lowering the entry's key to negative infinity and
/// extracting the minimum. If other entries already carry a key of negative infinity,
/// the extraction may remove one of those instead.
#[derive(Clone)]
pub struct FibonacciHeap<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    min: Option<usize>,
    len: usize,
    next_generation: u64,
}

impl<T> Default for FibonacciHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FibonacciHeap<T> {
    /// Creates a new empty heap.
    #[must_use]
    pub fn new() -> Self {
        FibonacciHeap {
            nodes: Vec::new(),
            free: Vec::new(),
            min: None,
            len: 0,
            next_generation: 0,
        }
    }

    /// Creates a new empty heap with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        FibonacciHeap {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            min: None,
            len: 0,
            next_generation: 0,
        }
    }

    /// Returns the number of entries in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the heap holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// Removes all entries.
    ///
    /// Outstanding handles become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.min = None;
        self.len = 0;
    }

    /// Inserts `payload` with priority `key` as a new singleton root.
    ///
    /// # Arguments
    ///
    /// * `payload` - The value to store
    /// * `key` - The priority; smaller keys are extracted first. A NaN key is
    ///   stored as positive infinity.
    ///
    /// # Returns
    ///
    /// A handle for later [`decrease_key`](Self::decrease_key) or [`delete`](Self::delete) calls.
    pub fn insert(&mut self, payload: T, key: f64) -> Entry {
        let key = if key.is_nan() { f64::INFINITY } else { key };
        let generation = self.next_generation;
        self.next_generation += 1;

        let node = Node {
            payload: Some(payload),
            key,
            parent: None,
            child: None,
            left: 0,
            right: 0,
            degree: 0,
            mark: false,
            generation,
        };

        let index = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.nodes[index].left = index;
        self.nodes[index].right = index;

        match self.min {
            Some(min) => {
                self.splice_right(min, index);
                if key < self.nodes[min].key {
                    self.min = Some(index);
                }
            }
            None => self.min = Some(index),
        }

        self.len += 1;
        Entry { index, generation }
    }

    /// Returns the minimum payload and its key without removing it.
    #[must_use]
    pub fn min(&self) -> Option<(&T, f64)> {
        let node = &self.nodes[self.min?];
        node.payload.as_ref().map(|payload| (payload, node.key))
    }

    /// Returns the handle of the current minimum entry.
    #[must_use]
    pub fn min_entry(&self) -> Option<Entry> {
        self.min.map(|index| Entry {
            index,
            generation: self.nodes[index].generation,
        })
    }

    /// Returns the payload of a live entry.
    #[must_use]
    pub fn get(&self, entry: Entry) -> Option<&T> {
        self.live(entry).ok().and_then(|node| node.payload.as_ref())
    }

    /// Returns the key of a live entry.
    #[must_use]
    pub fn key(&self, entry: Entry) -> Option<f64> {
        self.live(entry).ok().map(|node| node.key)
    }

    /// Returns `true` if `entry` still refers to an entry of this heap.
    #[must_use]
    pub fn contains(&self, entry: Entry) -> bool {
        self.live(entry).is_ok()
    }

    /// Removes the minimum entry and returns its payload.
    ///
    /// The minimum's children are promoted to the root list, then the roots are
    /// consolidated until every root has a distinct degree.
    pub fn remove_min(&mut self) -> Option<T> {
        let z = self.min?;

        let mut child = self.nodes[z].child;
        for _ in 0..self.nodes[z].degree {
            let Some(x) = child else {
                break;
            };
            child = Some(self.nodes[x].right);
            self.unlink(x);
            self.splice_right(z, x);
            self.nodes[x].parent = None;
        }
        self.nodes[z].child = None;
        self.nodes[z].degree = 0;

        let next = self.nodes[z].right;
        self.unlink(z);
        if next == z {
            self.min = None;
        } else {
            self.min = Some(next);
            self.consolidate();
        }

        self.len -= 1;
        self.free.push(z);
        self.nodes[z].payload.take()
    }

    /// Lowers the key of `entry` to `key`.
    ///
    /// If the new key breaks heap order against the parent, the entry is cut into
    /// the root list and a cascading cut runs up the ancestor chain.
    ///
    /// # Errors
    ///
    /// * [`Error::KeyIncrease`] if `key` is greater than the current key
    /// * [`Error::IllegalArgument`] if `key` is NaN
    /// * [`Error::StaleEntry`] if the entry is no longer in the heap
    pub fn decrease_key(&mut self, entry: Entry, key: f64) -> Result<()> {
        let current = self.live(entry)?.key;
        if key.is_nan() {
            return Err(argument_error!("key must not be NaN"));
        }
        if key > current {
            return Err(Error::KeyIncrease {
                current,
                requested: key,
            });
        }

        let x = entry.index;
        self.nodes[x].key = key;
        if let Some(parent) = self.nodes[x].parent {
            if key < self.nodes[parent].key {
                self.cut(x, parent);
                self.cascading_cut(parent);
            }
        }
        if let Some(min) = self.min {
            if key < self.nodes[min].key {
                self.min = Some(x);
            }
        }
        Ok(())
    }

    /// Removes `entry` from the heap.
    ///
    /// The key is lowered to negative infinity and the minimum is extracted. See the
    /// type-level documentation for the limitation when other keys are already
    /// negative infinity.
    ///
    /// # Returns
    ///
    /// The payload removed by the extraction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleEntry`] if the entry is no longer in the heap.
    pub fn delete(&mut self, entry: Entry) -> Result<Option<T>> {
        self.decrease_key(entry, f64::NEG_INFINITY)?;
        Ok(self.remove_min())
    }

    /// Absorbs `other` into this heap without consolidating.
    ///
    /// Handles of this heap remain valid; handles of `other` must be passed through
    /// the returned [`EntryMap`].
    pub fn append(&mut self, other: FibonacciHeap<T>) -> EntryMap {
        let map = EntryMap {
            index_offset: self.nodes.len(),
            generation_offset: self.next_generation,
        };
        let offset = map.index_offset;

        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            node.parent = node.parent.map(|p| p + offset);
            node.child = node.child.map(|c| c + offset);
            node.left += offset;
            node.right += offset;
            node.generation += map.generation_offset;
            node
        }));
        self.free.extend(other.free.into_iter().map(|slot| slot + offset));
        self.next_generation += other.next_generation;

        if let Some(other_min) = other.min.map(|m| m + offset) {
            match self.min {
                Some(min) => {
                    let min_right = self.nodes[min].right;
                    let other_left = self.nodes[other_min].left;
                    self.nodes[min_right].left = other_left;
                    self.nodes[other_left].right = min_right;
                    self.nodes[min].right = other_min;
                    self.nodes[other_min].left = min;
                    if self.nodes[other_min].key < self.nodes[min].key {
                        self.min = Some(other_min);
                    }
                }
                None => self.min = Some(other_min),
            }
        }

        self.len += other.len;
        map
    }

    /// Joins two heaps into one, consuming both.
    ///
    /// The size of the result is the sum of both sizes. Use [`append`](Self::append)
    /// when handles into `second` are still needed.
    #[must_use]
    pub fn union(first: FibonacciHeap<T>, second: FibonacciHeap<T>) -> FibonacciHeap<T> {
        let mut joined = first;
        joined.append(second);
        joined
    }

    fn live(&self, entry: Entry) -> Result<&Node<T>> {
        match self.nodes.get(entry.index) {
            Some(node) if node.payload.is_some() && node.generation == entry.generation => {
                Ok(node)
            }
            _ => Err(Error::StaleEntry),
        }
    }

    /// Inserts `x` into the ring right of `anchor`.
    fn splice_right(&mut self, anchor: usize, x: usize) {
        let right = self.nodes[anchor].right;
        self.nodes[x].left = anchor;
        self.nodes[x].right = right;
        self.nodes[anchor].right = x;
        self.nodes[right].left = x;
    }

    /// Detaches `x` from its ring, leaving it a singleton.
    fn unlink(&mut self, x: usize) {
        let (left, right) = (self.nodes[x].left, self.nodes[x].right);
        self.nodes[left].right = right;
        self.nodes[right].left = left;
        self.nodes[x].left = x;
        self.nodes[x].right = x;
    }

    /// Makes root `y` a child of root `x`.
    fn link(&mut self, y: usize, x: usize) {
        self.unlink(y);
        self.nodes[y].parent = Some(x);
        match self.nodes[x].child {
            Some(child) => self.splice_right(child, y),
            None => self.nodes[x].child = Some(y),
        }
        self.nodes[x].degree += 1;
        self.nodes[y].mark = false;
    }

    fn consolidate(&mut self) {
        let Some(start) = self.min else {
            return;
        };

        let mut roots = vec![start];
        let mut cursor = self.nodes[start].right;
        while cursor != start {
            roots.push(cursor);
            cursor = self.nodes[cursor].right;
        }

        // Degrees stay below log_phi(n); twice the bit length covers that bound
        let bound = 2 * (usize::BITS - self.len.leading_zeros()) as usize + 2;
        let mut by_degree: Vec<Option<usize>> = vec![None; bound];

        for root in roots {
            let mut x = root;
            let mut degree = self.nodes[x].degree;
            loop {
                if degree >= by_degree.len() {
                    by_degree.resize(degree + 1, None);
                }
                let Some(mut y) = by_degree[degree].take() else {
                    break;
                };
                if self.nodes[x].key > self.nodes[y].key {
                    std::mem::swap(&mut x, &mut y);
                }
                self.link(y, x);
                degree += 1;
            }
            if degree >= by_degree.len() {
                by_degree.resize(degree + 1, None);
            }
            by_degree[degree] = Some(x);
        }

        // The ring now holds exactly the surviving roots
        self.min = None;
        for root in by_degree.into_iter().flatten() {
            match self.min {
                Some(min) if self.nodes[root].key >= self.nodes[min].key => {}
                _ => self.min = Some(root),
            }
        }
    }

    /// Moves `x` from the child ring of `parent` into the root ring.
    fn cut(&mut self, x: usize, parent: usize) {
        if self.nodes[parent].child == Some(x) {
            let right = self.nodes[x].right;
            self.nodes[parent].child = if right == x { None } else { Some(right) };
        }
        self.unlink(x);
        self.nodes[parent].degree -= 1;
        if self.nodes[parent].degree == 0 {
            self.nodes[parent].child = None;
        }

        if let Some(min) = self.min {
            self.splice_right(min, x);
        }
        self.nodes[x].parent = None;
        self.nodes[x].mark = false;
    }

    fn cascading_cut(&mut self, start: usize) {
        let mut y = start;
        while let Some(parent) = self.nodes[y].parent {
            if !self.nodes[y].mark {
                self.nodes[y].mark = true;
                break;
            }
            self.cut(y, parent);
            y = parent;
        }
    }
}

impl<T> fmt::Debug for FibonacciHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FibonacciHeap")
            .field("len", &self.len)
            .field("min_key", &self.min.map(|m| self.nodes[m].key))
            .finish()
    }
}

impl<T> fmt::Display for FibonacciHeap<T> {
    /// Lists every key, ring by ring, starting at the minimum root.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FibonacciHeap=[")?;
        let mut first = true;
        let mut stack: Vec<usize> = self.min.into_iter().collect();
        while let Some(start) = stack.pop() {
            let mut cursor = start;
            loop {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{}", self.nodes[cursor].key)?;
                if let Some(child) = self.nodes[cursor].child {
                    stack.push(child);
                }
                cursor = self.nodes[cursor].right;
                if cursor == start {
                    break;
                }
            }
        }
        write!(f, "]")
    }
}
