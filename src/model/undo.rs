//! Undo and redo of committed transactions.
//!
//! Each committed transaction that changed the model is published to
//! [`UndoableEditListener`]s as one [`CompoundEdit`]. Undoing or redoing replays
//! the inverse or original operations inside an internal transaction, so the
//! model's listeners see the replay like any other change.
//!
//! # Examples
//!
//! ```rust
//! use edgeloom::model::{DefaultModelFactory, ModelFactory, UndoHistory};
//! use std::sync::Arc;
//!
//! let factory = DefaultModelFactory::new();
//! let model = factory.create_model();
//! let history = Arc::new(UndoHistory::new());
//! model.add_undoable_edit_listener(history.clone());
//!
//! model.start_transaction()?;
//! model.add_vertex(factory.create_vertex(0, 0, 0, 1.0))?;
//! model.add_vertex(factory.create_vertex(50, 0, 0, 1.0))?;
//! model.end_transaction()?;
//!
//! assert_eq!(history.undo_presentation_name().as_deref(), Some("Undo Add Vertices"));
//! history.undo()?;
//! assert_eq!(model.vertex_count(), 0);
//! history.redo()?;
//! assert_eq!(model.vertex_count(), 2);
//! # Ok::<(), edgeloom::Error>(())
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, warn};

use crate::{
    model::{Edge, GraphModel, Vertex},
    Error, Result,
};

/// A single undoable mutation.
#[derive(Debug, Clone)]
pub enum Edit {
    /// A vertex was added
    AddVertex(Arc<Vertex>),
    /// A vertex was removed
    RemoveVertex(Arc<Vertex>),
    /// An edge was added
    AddEdge(Arc<Edge>),
    /// An edge was removed
    RemoveEdge(Arc<Edge>),
}

/// The kind of an [`Edit`]; consecutive edits of one kind coalesce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// [`Edit::AddVertex`]
    AddVertex,
    /// [`Edit::RemoveVertex`]
    RemoveVertex,
    /// [`Edit::AddEdge`]
    AddEdge,
    /// [`Edit::RemoveEdge`]
    RemoveEdge,
}

impl EditKind {
    /// Returns the user-facing name of `count` edits of this kind.
    #[must_use]
    pub fn presentation_name(self, count: usize) -> &'static str {
        let plural = count > 1;
        match (self, plural) {
            (EditKind::AddVertex, false) => "Add Vertex",
            (EditKind::AddVertex, true) => "Add Vertices",
            (EditKind::RemoveVertex, false) => "Remove Vertex",
            (EditKind::RemoveVertex, true) => "Remove Vertices",
            (EditKind::AddEdge, false) => "Add Edge",
            (EditKind::AddEdge, true) => "Add Edges",
            (EditKind::RemoveEdge, false) => "Remove Edge",
            (EditKind::RemoveEdge, true) => "Remove Edges",
        }
    }
}

impl Edit {
    /// Returns the kind of this edit.
    #[must_use]
    pub fn kind(&self) -> EditKind {
        match self {
            Edit::AddVertex(_) => EditKind::AddVertex,
            Edit::RemoveVertex(_) => EditKind::RemoveVertex,
            Edit::AddEdge(_) => EditKind::AddEdge,
            Edit::RemoveEdge(_) => EditKind::RemoveEdge,
        }
    }

    /// Performs the edit again.
    fn apply(&self, model: &GraphModel) -> Result<()> {
        match self {
            Edit::AddVertex(vertex) => model.add_vertex(Arc::clone(vertex)),
            Edit::RemoveVertex(vertex) => model.remove_vertex(vertex),
            Edit::AddEdge(edge) => model.add_edge(Arc::clone(edge)),
            Edit::RemoveEdge(edge) => model.remove_edge(edge),
        }
    }

    /// Performs the inverse of the edit.
    fn revert(&self, model: &GraphModel) -> Result<()> {
        match self {
            Edit::AddVertex(vertex) => model.remove_vertex(vertex),
            Edit::RemoveVertex(vertex) => model.add_vertex(Arc::clone(vertex)),
            Edit::AddEdge(edge) => model.remove_edge(edge),
            Edit::RemoveEdge(edge) => model.add_edge(Arc::clone(edge)),
        }
    }
}

/// A run of consecutive edits of the same kind.
#[derive(Debug, Clone)]
pub struct EditGroup {
    kind: EditKind,
    edits: Vec<Edit>,
}

impl EditGroup {
    /// Returns the kind shared by all edits of the group.
    #[must_use]
    pub fn kind(&self) -> EditKind {
        self.kind
    }

    /// Returns the edits in the order they were made.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Returns the user-facing name, e.g. "Add Vertices".
    #[must_use]
    pub fn presentation_name(&self) -> &'static str {
        self.kind.presentation_name(self.edits.len())
    }
}

/// All edits of one committed transaction, undone and redone as a unit.
pub struct CompoundEdit {
    model: Weak<GraphModel>,
    groups: Vec<EditGroup>,
    /// `true` while the edit is applied to the model
    done: AtomicBool,
    alive: AtomicBool,
}

impl CompoundEdit {
    /// Groups `edits` into runs of the same kind.
    pub(crate) fn new(model: Weak<GraphModel>, edits: Vec<Edit>) -> Self {
        let mut groups: Vec<EditGroup> = Vec::new();
        for edit in edits {
            match groups.last_mut() {
                Some(group) if group.kind == edit.kind() => group.edits.push(edit),
                _ => groups.push(EditGroup {
                    kind: edit.kind(),
                    edits: vec![edit],
                }),
            }
        }

        CompoundEdit {
            model,
            groups,
            done: AtomicBool::new(true),
            alive: AtomicBool::new(true),
        }
    }

    /// Returns the coalesced groups in commit order.
    #[must_use]
    pub fn groups(&self) -> &[EditGroup] {
        &self.groups
    }

    /// Returns the total number of edits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.edits.len()).sum()
    }

    /// Returns `true` if the compound edit holds no edits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the name of the last group, which describes the transaction.
    #[must_use]
    pub fn presentation_name(&self) -> String {
        self.groups
            .last()
            .map(|group| group.presentation_name().to_string())
            .unwrap_or_default()
    }

    /// Returns e.g. "Undo Add Vertex".
    #[must_use]
    pub fn undo_presentation_name(&self) -> String {
        Self::prefixed("Undo", &self.presentation_name())
    }

    /// Returns e.g. "Redo Add Vertex".
    #[must_use]
    pub fn redo_presentation_name(&self) -> String {
        Self::prefixed("Redo", &self.presentation_name())
    }

    /// Returns `true` if the edit is applied and may be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.alive.load(Ordering::Acquire) && self.done.load(Ordering::Acquire)
    }

    /// Returns `true` if the edit was undone and may be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.alive.load(Ordering::Acquire) && !self.done.load(Ordering::Acquire)
    }

    /// Marks the edit as permanently unusable.
    pub fn die(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Reverts the transaction: inverse operations in reverse order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotUndo`] if the edit is not undoable, the model is gone,
    /// or an inverse operation fails. A failed replay is rolled back. An error from
    /// the model's commit hook is returned as is; the edit is undone regardless.
    pub fn undo(&self) -> Result<()> {
        if !self.can_undo() {
            return Err(Error::CannotUndo(format!(
                "{} is not undoable",
                self.presentation_name()
            )));
        }
        self.replay(true, Error::CannotUndo)?;
        debug!(edit = %self.presentation_name(), "undone");
        Ok(())
    }

    /// Re-applies the transaction in its original order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotRedo`] under the same conditions as [`undo`](Self::undo).
    pub fn redo(&self) -> Result<()> {
        if !self.can_redo() {
            return Err(Error::CannotRedo(format!(
                "{} is not redoable",
                self.presentation_name()
            )));
        }
        self.replay(false, Error::CannotRedo)?;
        debug!(edit = %self.presentation_name(), "redone");
        Ok(())
    }

    fn replay(&self, backwards: bool, refused: fn(String) -> Error) -> Result<()> {
        let model = self
            .model
            .upgrade()
            .ok_or_else(|| refused("model no longer exists".to_string()))?;
        model.start_replay().map_err(|e| refused(e.to_string()))?;

        let outcome = if backwards {
            self.groups
                .iter()
                .rev()
                .flat_map(|group| group.edits.iter().rev())
                .try_for_each(|edit| edit.revert(&model))
        } else {
            self.groups
                .iter()
                .flat_map(|group| group.edits.iter())
                .try_for_each(|edit| edit.apply(&model))
        };

        if let Err(error) = outcome {
            warn!(%error, edit = %self.presentation_name(), "replay failed, rolling back");
            if let Err(cancel) = model.cancel_transaction() {
                warn!(error = %cancel, "rollback of failed replay failed");
            }
            return Err(refused(error.to_string()));
        }

        self.done.store(!backwards, Ordering::Release);
        model.end_transaction()
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn prefixed(prefix: &str, name: &str) -> String {
        if name.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix} {name}")
        }
    }
}

impl fmt::Debug for CompoundEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundEdit")
            .field("name", &self.presentation_name())
            .field("edits", &self.len())
            .field("done", &self.done.load(Ordering::Relaxed))
            .finish()
    }
}

/// Receives the compound edit of every committed transaction.
pub trait UndoableEditListener: Send + Sync {
    /// Called after a transaction that changed the model has committed.
    fn undoable_edit_happened(&self, edit: &Arc<CompoundEdit>);
}

#[derive(Debug, Default)]
struct HistoryState {
    edits: Vec<Arc<CompoundEdit>>,
    /// Number of edits currently applied; `edits[cursor]` is the next redo
    cursor: usize,
}

/// A bounded undo/redo stack of compound edits.
///
/// Register it with [`GraphModel::add_undoable_edit_listener`]. Posting a new edit
/// discards everything that was undone; once the bound is exceeded the oldest
/// edit is dropped.
#[derive(Debug)]
pub struct UndoHistory {
    state: Mutex<HistoryState>,
    limit: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoHistory {
    /// Creates a history bounded by [`crate::ModelConfig::default`]'s undo limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(crate::ModelConfig::default().undo_limit)
    }

    /// Creates a history keeping at most `limit` edits.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        UndoHistory {
            state: Mutex::new(HistoryState::default()),
            limit,
        }
    }

    /// Returns the bound on retained edits.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of retained edits, undone ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_state(|state| state.edits.len())
    }

    /// Returns `true` if no edit is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if there is an applied edit to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.with_state(|state| {
            state
                .cursor
                .checked_sub(1)
                .is_some_and(|index| state.edits[index].can_undo())
        })
    }

    /// Returns `true` if there is an undone edit to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.with_state(|state| {
            state
                .edits
                .get(state.cursor)
                .is_some_and(|edit| edit.can_redo())
        })
    }

    /// Returns the name of the next undo, e.g. "Undo Add Edge".
    #[must_use]
    pub fn undo_presentation_name(&self) -> Option<String> {
        self.with_state(|state| {
            state
                .cursor
                .checked_sub(1)
                .map(|index| state.edits[index].undo_presentation_name())
        })
    }

    /// Returns the name of the next redo, e.g. "Redo Add Edge".
    #[must_use]
    pub fn redo_presentation_name(&self) -> Option<String> {
        self.with_state(|state| {
            state
                .edits
                .get(state.cursor)
                .map(|edit| edit.redo_presentation_name())
        })
    }

    /// Undoes the most recent applied edit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotUndo`] if nothing can be undone or the replay fails,
    /// and the commit hook's error if the replay committed but the hook failed. The
    /// history follows the edit in both cases.
    pub fn undo(&self) -> Result<()> {
        let edit = self
            .with_state(|state| {
                state
                    .cursor
                    .checked_sub(1)
                    .map(|index| Arc::clone(&state.edits[index]))
            })
            .ok_or_else(|| Error::CannotUndo("nothing to undo".to_string()))?;

        // The replay commits a transaction, so the lock must not be held here
        let outcome = edit.undo();
        if !edit.is_done() {
            self.with_state(|state| {
                if let Some(index) = state.edits.iter().position(|e| Arc::ptr_eq(e, &edit)) {
                    state.cursor = index;
                }
            });
        }
        outcome
    }

    /// Redoes the most recent undone edit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotRedo`] if nothing can be redone or the replay fails,
    /// and the commit hook's error as for [`undo`](Self::undo).
    pub fn redo(&self) -> Result<()> {
        let edit = self
            .with_state(|state| state.edits.get(state.cursor).cloned())
            .ok_or_else(|| Error::CannotRedo("nothing to redo".to_string()))?;

        let outcome = edit.redo();
        if edit.is_done() {
            self.with_state(|state| {
                if let Some(index) = state.edits.iter().position(|e| Arc::ptr_eq(e, &edit)) {
                    state.cursor = index + 1;
                }
            });
        }
        outcome
    }

    /// Drops every retained edit.
    pub fn discard_all_edits(&self) {
        self.with_state(|state| {
            for edit in state.edits.drain(..) {
                edit.die();
            }
            state.cursor = 0;
        });
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut HistoryState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }
}

impl UndoableEditListener for UndoHistory {
    fn undoable_edit_happened(&self, edit: &Arc<CompoundEdit>) {
        self.with_state(|state| {
            for undone in state.edits.drain(state.cursor..) {
                undone.die();
            }
            state.edits.push(Arc::clone(edit));
            if state.edits.len() > self.limit {
                let excess = state.edits.len() - self.limit;
                for dropped in state.edits.drain(..excess) {
                    dropped.die();
                }
            }
            state.cursor = state.edits.len();
        });
    }
}
