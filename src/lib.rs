// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # edgeloom
//!
//! A transactional graph data model for editors and graph algorithms.
//!
//! `edgeloom` stores vertices and edges in an adjacency-list [`model::GraphModel`]
//! whose mutations are grouped into transactions. Committed transactions notify
//! listeners and become undoable [`model::CompoundEdit`]s; cancelled ones roll back
//! exactly. Models persist to a compact checksummed snapshot format, and the
//! [`utils`] module provides the Fibonacci heap and union-find structures that
//! shortest-path and spanning-tree algorithms run on.
//!
//! ## Features
//!
//! - **Transactions** - FIFO-fair, thread-owned, with exact rollback on cancel
//! - **Notification** - structural events on commit, property events on change
//! - **Undo / redo** - one coalesced compound edit per committed transaction
//! - **Persistence** - SHA-1 checksummed binary snapshots, auto-save on commit
//! - **Algorithms support** - [`utils::FibonacciHeap`] and [`utils::DisjointSet`]
//!
//! ## Quick Start
//!
//! ```rust
//! use edgeloom::prelude::*;
//! use std::sync::Arc;
//!
//! let factory = DefaultModelFactory::new();
//! let model = factory.create_model();
//! let history = Arc::new(UndoHistory::new());
//! model.add_undoable_edit_listener(history.clone());
//!
//! let a = factory.create_vertex(0, 0, 0, 1.0);
//! let b = factory.create_vertex(100, 0, 0, 1.0);
//! model.start_transaction()?;
//! model.add_vertex(a.clone())?;
//! model.add_vertex(b.clone())?;
//! model.add_edge(factory.create_edge(a.clone(), b.clone(), true))?;
//! model.end_transaction()?;
//!
//! assert_eq!(model.edge_count(), 1);
//! history.undo()?;
//! assert_eq!(model.vertex_count(), 0);
//! # Ok::<(), edgeloom::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`model`] - vertices, edges, the transactional store, events and undo
//! - [`file`] - model sources, snapshot reading and writing
//! - [`utils`] - heap, union-find and the synchronization primitives of the model
//! - [`config`] - construction and persistence defaults
//! - [`Error`] and [`Result`] - error handling
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (transaction lifecycle at `debug`, buffered
//! mutations at `trace`, failed replays at `warn`). Install a subscriber in the
//! application to see them.

#[macro_use]
mod macros;

#[macro_use]
mod error;

pub mod config;
pub mod file;
pub mod model;
pub mod prelude;
pub mod utils;

/// `edgeloom` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust
/// use edgeloom::{Result, model::GraphModel};
///
/// fn open(model: &GraphModel) -> Result<()> {
///     model.start_transaction()?;
///     model.end_transaction()
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `edgeloom` Error type
///
/// Every fallible operation returns this; see its variants for the failure families.
pub use error::Error;

/// Defaults for factories, undo history and snapshot reading.
pub use config::ModelConfig;
