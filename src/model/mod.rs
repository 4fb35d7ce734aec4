//! The transactional graph model.
//!
//! A [`GraphModel`] stores [`Vertex`] and [`Edge`] handles in insertion order
//! together with an adjacency table of vertex positions. All structural changes
//! happen inside transactions, are announced to [`ModelListener`]s on commit, and
//! are published as [`CompoundEdit`]s for undo and redo.
//!
//! # Key Components
//!
//! - [`GraphModel`] - the store, its transactions and queries
//! - [`Vertex`] / [`Edge`] / [`Component`] - model elements with client properties
//! - [`ModelEvent`] / [`ModelListener`] - structural change notification
//! - [`PropertyChange`] / [`PropertyListener`] - attribute change notification
//! - [`CompoundEdit`] / [`UndoHistory`] - undo and redo
//! - [`ModelFactory`] / [`DefaultModelFactory`] - construction
//!
//! # Thread Safety
//!
//! Models and their elements are `Send + Sync`. One thread at a time owns the
//! open transaction; others queue in [`GraphModel::start_transaction`] in arrival
//! order. Queries never block on a transaction.

pub(crate) mod adjacency;
mod component;
mod edge;
mod event;
mod factory;
mod graph;
mod properties;
pub(crate) mod transaction;
mod undo;
mod vertex;

pub use component::Component;
pub use edge::Edge;
pub use event::{ModelEvent, ModelEventKind, ModelListener};
pub use factory::{DefaultModelFactory, ModelFactory};
pub use graph::{CommitHook, GraphModel};
pub use properties::{
    names, PropertyChange, PropertyListener, PropertySupport, PropertyTag, PropertyValue,
};
pub use undo::{CompoundEdit, Edit, EditGroup, EditKind, UndoHistory, UndoableEditListener};
pub use vertex::Vertex;
