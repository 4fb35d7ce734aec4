//! Data structures and primitives shared by the model and by graph algorithms.
//!
//! - [`FibonacciHeap`] - mergeable priority queue with O(1) amortized `decrease_key`
//! - [`DisjointSet`] - fixed-capacity union-find with payload slots
//! - [`TransactionGate`] / [`ListenerList`] - synchronization used by [`crate::model::GraphModel`]

mod disjoint;
mod fibonacci;
mod synchronization;

pub use disjoint::DisjointSet;
pub use fibonacci::{Entry, EntryMap, FibonacciHeap};
pub use synchronization::{ListenerList, TransactionGate};
