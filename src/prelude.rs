//! # edgeloom Prelude
//!
//! The types most programs need, in one import.
//!
//! ```rust
//! use edgeloom::prelude::*;
//!
//! let factory = DefaultModelFactory::new();
//! let model = factory.create_model();
//! assert!(!model.is_in_transaction());
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all edgeloom operations
pub use crate::Error;

/// The result type used throughout edgeloom
pub use crate::Result;

/// Construction and persistence defaults
pub use crate::ModelConfig;

// ================================================================================================
// Model
// ================================================================================================

/// The transactional store and its commit hook
pub use crate::model::{CommitHook, GraphModel};

/// Model elements
pub use crate::model::{Component, Edge, Vertex};

/// Construction
pub use crate::model::{DefaultModelFactory, ModelFactory};

/// Notification
pub use crate::model::{
    ModelEvent, ModelEventKind, ModelListener, PropertyChange, PropertyListener, PropertyValue,
};

/// Undo and redo
pub use crate::model::{CompoundEdit, Edit, UndoHistory, UndoableEditListener};

// ================================================================================================
// Persistence
// ================================================================================================

/// Sources and access
pub use crate::file::{AutoSave, FileModelAccess, ModelAccess, ModelSource, SourceCache};

// ================================================================================================
// Algorithm Support
// ================================================================================================

/// Heap and union-find
pub use crate::utils::{DisjointSet, Entry, FibonacciHeap};
