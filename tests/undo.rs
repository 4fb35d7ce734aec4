//! Integration tests for undo and redo of committed transactions.

use edgeloom::prelude::*;
use edgeloom::Error;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

struct Fixture {
    factory: DefaultModelFactory,
    model: Arc<GraphModel>,
    history: Arc<UndoHistory>,
}

impl Fixture {
    fn new() -> Self {
        let factory = DefaultModelFactory::new();
        let model = factory.create_model();
        let history = Arc::new(UndoHistory::new());
        model.add_undoable_edit_listener(history.clone());
        Fixture {
            factory,
            model,
            history,
        }
    }

    fn vertex(&self, x: i32, y: i32) -> Arc<Vertex> {
        self.factory.create_vertex(x, y, 0, 1.0)
    }
}

#[test]
fn test_undo_redo_across_two_transactions() -> Result<()> {
    let f = Fixture::new();
    let a = f.vertex(0, 0);
    let b = f.vertex(100, 0);

    f.model.start_transaction()?;
    f.model.add_vertex(Arc::clone(&a))?;
    f.model.add_vertex(Arc::clone(&b))?;
    f.model.end_transaction()?;

    f.model.start_transaction()?;
    f.model
        .add_edge(f.factory.create_edge(Arc::clone(&a), Arc::clone(&b), false))?;
    f.model.end_transaction()?;

    assert_eq!(f.history.len(), 2);
    assert_eq!(
        f.history.undo_presentation_name().as_deref(),
        Some("Undo Add Edge")
    );

    f.history.undo()?;
    assert_eq!(f.model.vertex_count(), 2);
    assert_eq!(f.model.edge_count(), 0);
    assert_eq!(
        f.history.undo_presentation_name().as_deref(),
        Some("Undo Add Vertices")
    );
    assert_eq!(
        f.history.redo_presentation_name().as_deref(),
        Some("Redo Add Edge")
    );

    f.history.undo()?;
    assert_eq!(f.model.vertex_count(), 0);
    assert!(!f.history.can_undo());
    assert!(matches!(f.history.undo(), Err(Error::CannotUndo(_))));

    f.history.redo()?;
    f.history.redo()?;
    assert_eq!(f.model.vertex_count(), 2);
    assert!(f.model.find_edge(&b, &a).is_some());
    assert!(!f.history.can_redo());
    assert!(matches!(f.history.redo(), Err(Error::CannotRedo(_))));
    Ok(())
}

#[test]
fn test_undo_of_removal_reattaches_vertices() -> Result<()> {
    let f = Fixture::new();
    let vertices: Vec<_> = (0..4).map(|i| f.vertex(i * 50, 0)).collect();
    f.model.start_transaction()?;
    for v in &vertices {
        f.model.add_vertex(Arc::clone(v))?;
    }
    f.model.add_edge(f.factory.create_edge(
        Arc::clone(&vertices[3]),
        Arc::clone(&vertices[0]),
        true,
    ))?;
    f.model.end_transaction()?;

    f.model.start_transaction()?;
    f.model.remove_vertex(&vertices[1])?;
    f.model.remove_vertex(&vertices[2])?;
    f.model.end_transaction()?;
    assert_eq!(f.model.adjacency_table(), vec![vec![], vec![0]]);
    assert!(vertices[1].model().is_none());
    assert_eq!(
        f.history.undo_presentation_name().as_deref(),
        Some("Undo Remove Vertices")
    );

    // Undo re-adds in reverse removal order, appending to the vertex list
    f.history.undo()?;
    let order: Vec<_> = f.model.vertices().iter().map(|v| v.x()).collect();
    assert_eq!(order, [0, 150, 100, 50]);
    assert_eq!(
        f.model.adjacency_table(),
        vec![vec![], vec![0], vec![], vec![]]
    );
    assert!(vertices[1].model().is_some());

    f.history.redo()?;
    assert_eq!(f.model.vertex_count(), 2);
    assert!(f.model.find_edge(&vertices[3], &vertices[0]).is_some());
    Ok(())
}

#[test]
fn test_replay_dispatches_events_but_records_nothing() -> Result<()> {
    #[derive(Default)]
    struct Counter(Mutex<Vec<ModelEventKind>>);

    impl ModelListener for Counter {
        fn vertex_added(&self, event: &ModelEvent) {
            self.0.lock().unwrap().push(event.kind());
        }
        fn vertex_removed(&self, event: &ModelEvent) {
            self.0.lock().unwrap().push(event.kind());
        }
    }

    let f = Fixture::new();
    let counter = Arc::new(Counter::default());
    f.model.add_model_listener(counter.clone());

    f.model.start_transaction()?;
    f.model.add_vertex(f.vertex(0, 0))?;
    f.model.end_transaction()?;
    f.history.undo()?;

    assert_eq!(
        *counter.0.lock().unwrap(),
        vec![ModelEventKind::VertexAdded, ModelEventKind::VertexRemoved]
    );
    assert_eq!(f.history.len(), 1);
    assert!(f.history.can_redo());
    Ok(())
}

#[test]
fn test_new_edit_discards_redo() -> Result<()> {
    let f = Fixture::new();
    for x in [0, 50] {
        f.model.start_transaction()?;
        f.model.add_vertex(f.vertex(x, 0))?;
        f.model.end_transaction()?;
    }
    f.history.undo()?;
    assert!(f.history.can_redo());

    f.model.start_transaction()?;
    f.model.add_vertex(f.vertex(300, 0))?;
    f.model.end_transaction()?;

    assert!(!f.history.can_redo());
    assert_eq!(f.history.len(), 2);
    Ok(())
}

#[test]
fn test_failed_undo_is_cancelled() -> Result<()> {
    let f = Fixture::new();
    let a = f.vertex(0, 0);
    let b = f.vertex(100, 0);

    f.model.start_transaction()?;
    f.model.add_vertex(Arc::clone(&a))?;
    f.model.end_transaction()?;

    // Undoing the addition of `a` is impossible while an edge is attached to it
    f.model.remove_undoable_edit_listener(&(f.history.clone() as Arc<dyn UndoableEditListener>));
    f.model.start_transaction()?;
    f.model.add_vertex(Arc::clone(&b))?;
    f.model
        .add_edge(f.factory.create_edge(Arc::clone(&a), Arc::clone(&b), true))?;
    f.model.end_transaction()?;

    let result = f.history.undo();
    assert!(matches!(result, Err(Error::CannotUndo(_))));
    assert!(!f.model.is_in_transaction());
    assert_eq!(f.model.vertex_count(), 2);
    assert_eq!(f.model.edge_count(), 1);
    assert!(f.history.can_undo());
    Ok(())
}

#[test]
fn test_empty_transaction_publishes_nothing() -> Result<()> {
    let f = Fixture::new();
    f.model.start_transaction()?;
    f.model.end_transaction()?;

    f.model.start_transaction()?;
    f.model.add_vertex(f.vertex(0, 0))?;
    f.model.cancel_transaction()?;

    assert!(f.history.is_empty());
    Ok(())
}

#[test]
fn test_history_limit() -> Result<()> {
    let factory = DefaultModelFactory::new();
    let model = factory.create_model();
    let history = Arc::new(UndoHistory::with_limit(3));
    model.add_undoable_edit_listener(history.clone());

    for x in 0..5 {
        model.start_transaction()?;
        model.add_vertex(factory.create_vertex(x * 40, 0, 0, 0.0))?;
        model.end_transaction()?;
    }
    assert_eq!(history.len(), 3);

    for _ in 0..3 {
        history.undo()?;
    }
    assert!(!history.can_undo());
    assert_eq!(model.vertex_count(), 2);
    Ok(())
}

#[test]
fn test_history_follows_replay_when_commit_hook_fails() -> Result<()> {
    struct Flaky(AtomicBool);

    impl CommitHook for Flaky {
        fn committed(&self, _model: &GraphModel) -> Result<()> {
            if self.0.load(Ordering::SeqCst) {
                Err(Error::FileError(std::io::Error::other("disk full")))
            } else {
                Ok(())
            }
        }
    }

    let f = Fixture::new();
    f.model.start_transaction()?;
    f.model.add_vertex(f.vertex(0, 0))?;
    f.model.end_transaction()?;

    let hook = Arc::new(Flaky(AtomicBool::new(true)));
    f.model.set_commit_hook(Some(hook.clone()));

    // The replay commits, so the hook failure is reported but the history moves
    let error = f.history.undo().unwrap_err();
    assert!(matches!(error, Error::FileError(_)));
    assert_eq!(f.model.vertex_count(), 0);
    assert!(!f.model.is_in_transaction());
    assert!(!f.history.can_undo());
    assert!(f.history.can_redo());

    let error = f.history.redo().unwrap_err();
    assert!(error.is_io_error());
    assert_eq!(f.model.vertex_count(), 1);
    assert!(f.history.can_undo());
    assert!(!f.history.can_redo());

    hook.0.store(false, Ordering::SeqCst);
    f.history.undo()?;
    assert_eq!(f.model.vertex_count(), 0);
    Ok(())
}
