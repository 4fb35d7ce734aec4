//! Structural change notification.
//!
//! Mutations inside a transaction are buffered as [`ModelEvent`]s and dispatched
//! to every [`ModelListener`] in issue order once the transaction commits.
//! Cancelled transactions dispatch nothing.

use std::fmt;
use std::sync::{Arc, Weak};

use strum::{EnumCount, EnumIter};

use crate::model::{Component, GraphModel};

/// The kind of structural change an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter)]
pub enum ModelEventKind {
    /// A vertex was appended to the model
    VertexAdded,
    /// A vertex was removed from the model
    VertexRemoved,
    /// An edge was appended to the model
    EdgeAdded,
    /// An edge was removed from the model
    EdgeRemoved,
}

impl ModelEventKind {
    /// Invokes the listener method matching this kind.
    pub fn dispatch(self, event: &ModelEvent, listener: &dyn ModelListener) {
        match self {
            ModelEventKind::VertexAdded => listener.vertex_added(event),
            ModelEventKind::VertexRemoved => listener.vertex_removed(event),
            ModelEventKind::EdgeAdded => listener.edge_added(event),
            ModelEventKind::EdgeRemoved => listener.edge_removed(event),
        }
    }
}

impl fmt::Display for ModelEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelEventKind::VertexAdded => "vertex added",
            ModelEventKind::VertexRemoved => "vertex removed",
            ModelEventKind::EdgeAdded => "edge added",
            ModelEventKind::EdgeRemoved => "edge removed",
        };
        f.write_str(name)
    }
}

/// A committed structural change of a [`GraphModel`].
#[derive(Debug, Clone)]
pub struct ModelEvent {
    kind: ModelEventKind,
    component: Component,
    model: Weak<GraphModel>,
}

impl ModelEvent {
    pub(crate) fn new(kind: ModelEventKind, component: Component, model: Weak<GraphModel>) -> Self {
        ModelEvent {
            kind,
            component,
            model,
        }
    }

    /// Returns what happened.
    #[must_use]
    pub fn kind(&self) -> ModelEventKind {
        self.kind
    }

    /// Returns the vertex or edge that was added or removed.
    #[must_use]
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// Returns the model that changed, if it is still alive.
    #[must_use]
    pub fn model(&self) -> Option<Arc<GraphModel>> {
        self.model.upgrade()
    }
}

/// Receives committed structural changes of a [`GraphModel`].
///
/// All methods default to doing nothing, so implementors override only what they
/// need. Listeners run on the committing thread after the mutations are visible;
/// mutating the model from inside a callback fails with
/// [`crate::Error::TransactionCommitting`].
pub trait ModelListener: Send + Sync {
    /// A vertex was added.
    fn vertex_added(&self, _event: &ModelEvent) {}

    /// A vertex was removed.
    fn vertex_removed(&self, _event: &ModelEvent) {}

    /// An edge was added.
    fn edge_added(&self, _event: &ModelEvent) {}

    /// An edge was removed.
    fn edge_removed(&self, _event: &ModelEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vertex;
    use std::sync::Mutex;
    use strum::IntoEnumIterator;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ModelEventKind>>);

    impl ModelListener for Recorder {
        fn vertex_added(&self, event: &ModelEvent) {
            self.0.lock().unwrap().push(event.kind());
        }

        fn edge_removed(&self, event: &ModelEvent) {
            self.0.lock().unwrap().push(event.kind());
        }
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let recorder = Recorder::default();
        let component = Component::Vertex(Arc::new(Vertex::new(0, 0, 0)));
        for kind in ModelEventKind::iter() {
            let event = ModelEvent::new(kind, component.clone(), Weak::new());
            kind.dispatch(&event, &recorder);
        }
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![ModelEventKind::VertexAdded, ModelEventKind::EdgeRemoved]
        );
        assert_eq!(ModelEventKind::COUNT, 4);
    }
}
