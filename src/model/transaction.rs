//! Per-transaction bookkeeping.

use std::sync::Weak;

use tracing::trace;

use crate::model::{
    adjacency::JournalEntry, undo::Edit, Component, GraphModel, ModelEvent, ModelEventKind,
};

/// State of the open transaction of a [`GraphModel`].
///
/// The journal drives rollback on cancel, the buffered events are dispatched on
/// commit, and the edits become the committed [`crate::model::CompoundEdit`].
#[derive(Debug)]
pub(crate) struct Transaction {
    pub(crate) journal: Vec<JournalEntry>,
    pub(crate) events: Vec<ModelEvent>,
    pub(crate) edits: Vec<Edit>,
    /// `false` while replaying an undo or redo
    pub(crate) record_edits: bool,
    /// Set once `end_transaction` starts dispatching
    pub(crate) committing: bool,
}

impl Transaction {
    pub(crate) fn new(record_edits: bool) -> Self {
        Transaction {
            journal: Vec::new(),
            events: Vec::new(),
            edits: Vec::new(),
            record_edits,
            committing: false,
        }
    }

    /// Buffers one successful mutation.
    pub(crate) fn record(
        &mut self,
        entry: JournalEntry,
        kind: ModelEventKind,
        component: Component,
        edit: Edit,
        model: &Weak<GraphModel>,
    ) {
        trace!(%kind, %component, "buffered mutation");
        self.journal.push(entry);
        self.events
            .push(ModelEvent::new(kind, component, model.clone()));
        if self.record_edits {
            self.edits.push(edit);
        }
    }
}
