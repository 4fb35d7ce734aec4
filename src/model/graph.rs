use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::{debug, warn};

use crate::{
    model::{
        adjacency::{AdjacencyList, JournalEntry},
        properties::{PropertyListener, PropertySupport, PropertyValue},
        transaction::Transaction,
        undo::{CompoundEdit, Edit, UndoableEditListener},
        Component, Edge, ModelEventKind, ModelListener, Vertex,
    },
    utils::{ListenerList, TransactionGate},
    Error, Result,
};

/// Work run after every committed transaction that changed the model.
///
/// [`crate::file::AutoSave`] uses this to persist the model. The hook runs after
/// listeners were notified and while the committing thread still holds the
/// transaction token, so the model cannot change underneath it.
pub trait CommitHook: Send + Sync {
    /// Called once per committed transaction that changed the model.
    ///
    /// # Errors
    ///
    /// The error is returned from [`GraphModel::end_transaction`].
    fn committed(&self, model: &GraphModel) -> Result<()>;
}

/// A transactional adjacency-list graph.
///
/// Every structural mutation must happen inside a transaction opened with
/// [`start_transaction`](Self::start_transaction). Only one transaction may be open
/// at a time; further callers block and are admitted in arrival order. The thread
/// that opened the transaction owns it: mutations and the closing call from any
/// other thread fail with [`Error::NotTransactionOwner`].
///
/// Mutations become visible to readers immediately, while their
/// [`ModelEvent`](crate::model::ModelEvent)s are buffered and dispatched when
/// [`end_transaction`](Self::end_transaction) commits. At the same point the
/// transaction's edits are published as one [`CompoundEdit`].
/// [`cancel_transaction`](Self::cancel_transaction) instead rolls every mutation
/// back silently.
///
/// # Examples
///
/// ```rust
/// use edgeloom::model::{DefaultModelFactory, ModelFactory};
///
/// let factory = DefaultModelFactory::new();
/// let model = factory.create_model();
/// let a = factory.create_vertex(0, 0, 0, 1.0);
/// let b = factory.create_vertex(100, 0, 0, 1.0);
///
/// model.start_transaction()?;
/// model.add_vertex(a.clone())?;
/// model.add_vertex(b.clone())?;
/// model.add_edge(factory.create_edge(a.clone(), b.clone(), false))?;
/// model.end_transaction()?;
///
/// assert!(model.find_edge(&b, &a).is_some());
/// assert_eq!(model.find_adjacent_vertices(&a).len(), 1);
/// # Ok::<(), edgeloom::Error>(())
/// ```
pub struct GraphModel {
    this: Weak<GraphModel>,
    gate: TransactionGate,
    transaction: Mutex<Option<Transaction>>,
    store: RwLock<AdjacencyList>,
    model_listeners: ListenerList<dyn ModelListener>,
    edit_listeners: ListenerList<dyn UndoableEditListener>,
    properties: PropertySupport,
    commit_hook: RwLock<Option<Arc<dyn CommitHook>>>,
}

impl GraphModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| GraphModel {
            this: this.clone(),
            gate: TransactionGate::new(),
            transaction: Mutex::new(None),
            store: RwLock::new(AdjacencyList::default()),
            model_listeners: ListenerList::new(),
            edit_listeners: ListenerList::new(),
            properties: PropertySupport::new(),
            commit_hook: RwLock::new(None),
        })
    }

    /// Opens a transaction owned by the calling thread.
    ///
    /// Blocks until any transaction held by another thread has ended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInTransaction`] if the calling thread already owns
    /// the open transaction.
    pub fn start_transaction(&self) -> Result<()> {
        self.begin(true)
    }

    /// Opens a transaction whose mutations are not published as undoable edits.
    pub(crate) fn start_replay(&self) -> Result<()> {
        self.begin(false)
    }

    fn begin(&self, record_edits: bool) -> Result<()> {
        self.gate.acquire()?;
        match lock!(self.transaction) {
            Ok(mut slot) => {
                *slot = Some(Transaction::new(record_edits));
                debug!(record_edits, "transaction started");
                Ok(())
            }
            Err(error) => {
                self.release_gate();
                Err(error)
            }
        }
    }

    /// Commits the open transaction.
    ///
    /// Buffered events are dispatched to model listeners in mutation order, the
    /// recorded edits are published as one [`CompoundEdit`], and the commit hook
    /// runs. The transaction token is released in every case.
    ///
    /// # Errors
    ///
    /// * [`Error::NotInTransaction`] / [`Error::NotTransactionOwner`] if the caller does not own an open transaction
    /// * [`Error::TransactionCommitting`] if called from a listener during the commit
    /// * any error reported by the commit hook, after the token was released
    pub fn end_transaction(&self) -> Result<()> {
        self.gate.check_owner()?;
        let (events, edits, changed) = {
            let mut slot = lock!(self.transaction)?;
            let transaction = slot.as_mut().ok_or(Error::NotInTransaction)?;
            if transaction.committing {
                return Err(Error::TransactionCommitting);
            }
            transaction.committing = true;
            (
                std::mem::take(&mut transaction.events),
                std::mem::take(&mut transaction.edits),
                !transaction.journal.is_empty(),
            )
        };

        let listeners = self.model_listeners.snapshot();
        for event in &events {
            for listener in listeners.iter() {
                event.kind().dispatch(event, listener.as_ref());
            }
        }

        if !edits.is_empty() {
            let compound = Arc::new(CompoundEdit::new(self.this.clone(), edits));
            for listener in self.edit_listeners.snapshot().iter() {
                listener.undoable_edit_happened(&compound);
            }
        }

        let hook = with_read!(self.commit_hook, |hook: &Option<Arc<dyn CommitHook>>| hook
            .clone());
        let outcome = match hook {
            Some(hook) if changed => hook.committed(self),
            _ => Ok(()),
        };

        let cleared = lock!(self.transaction).map(|mut slot| *slot = None);
        self.release_gate();
        debug!(events = events.len(), "transaction committed");

        cleared?;
        outcome
    }

    /// Abandons the open transaction, restoring the model exactly.
    ///
    /// Mutations are rolled back in reverse order; no events are dispatched and no
    /// edits are published. Does nothing when no transaction is open.
    ///
    /// # Errors
    ///
    /// * [`Error::NotTransactionOwner`] if another thread owns the open transaction
    /// * [`Error::TransactionCommitting`] if called from a listener during the commit
    pub fn cancel_transaction(&self) -> Result<()> {
        match self.gate.check_owner() {
            Err(Error::NotInTransaction) => return Ok(()),
            Err(error) => return Err(error),
            Ok(()) => {}
        }

        let transaction = {
            let mut slot = lock!(self.transaction)?;
            if slot.as_ref().is_some_and(|t| t.committing) {
                return Err(Error::TransactionCommitting);
            }
            slot.take()
        };

        let mut rolled_back = 0;
        if let Some(transaction) = transaction {
            let mut store = write_lock!(self.store)?;
            for entry in transaction.journal.into_iter().rev() {
                self.restore_owner(&entry);
                store.revert(entry);
                rolled_back += 1;
            }
        }

        self.release_gate();
        debug!(rolled_back, "transaction cancelled");
        Ok(())
    }

    /// Returns `true` while any thread has a transaction open.
    #[must_use]
    pub fn is_in_transaction(&self) -> bool {
        self.gate.is_held()
    }

    /// Appends a vertex.
    ///
    /// # Errors
    ///
    /// * transaction errors as for every mutation
    /// * [`Error::IllegalArgument`] if this vertex handle is already in the model
    /// * [`Error::IllegalState`] if the vertex belongs to another model
    pub fn add_vertex(&self, vertex: Arc<Vertex>) -> Result<()> {
        self.mutate(|transaction, store| {
            if let Some(owner) = vertex.model() {
                if std::ptr::eq(Arc::as_ptr(&owner), self) {
                    return Err(argument_error!("vertex already in model"));
                }
                return Err(state_error!("vertex belongs to another model"));
            }

            let entry = store.push_vertex(Arc::clone(&vertex));
            vertex.set_owner(self.this.clone());
            transaction.record(
                entry,
                ModelEventKind::VertexAdded,
                Component::Vertex(Arc::clone(&vertex)),
                Edit::AddVertex(vertex),
                &self.this,
            );
            Ok(())
        })
    }

    /// Appends an edge and records its adjacency.
    ///
    /// An undirected edge is entered in the adjacency lists of both endpoints.
    ///
    /// # Errors
    ///
    /// * [`Error::IllegalState`] if an endpoint is not in the model, both endpoints
    ///   are equal, or the edge belongs to another model
    /// * [`Error::IllegalArgument`] if an edge already connects the endpoints
    pub fn add_edge(&self, edge: Arc<Edge>) -> Result<()> {
        self.mutate(|transaction, store| {
            if let Some(owner) = edge.model() {
                if !std::ptr::eq(Arc::as_ptr(&owner), self) {
                    return Err(state_error!("edge belongs to another model"));
                }
            }

            let source = edge.source();
            let target = edge.target();
            let (Some(si), Some(ti)) = (store.index_of(source), store.index_of(target)) else {
                return Err(state_error!("vertices not in model"));
            };
            if source == target {
                return Err(state_error!("edge endpoints are same"));
            }
            if store.find_edge(source, target).is_some()
                || (!edge.is_directed() && store.find_edge(target, source).is_some())
            {
                return Err(argument_error!("edge already exists"));
            }

            let entry = store.push_edge(Arc::clone(&edge), si, ti);
            edge.set_owner(self.this.clone());
            transaction.record(
                entry,
                ModelEventKind::EdgeAdded,
                Component::Edge(Arc::clone(&edge)),
                Edit::AddEdge(edge),
                &self.this,
            );
            Ok(())
        })
    }

    /// Removes an edge and its adjacency entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the edge is not in the model.
    pub fn remove_edge(&self, edge: &Arc<Edge>) -> Result<()> {
        self.mutate(|transaction, store| {
            let index = store
                .edge_index(edge)
                .ok_or_else(|| argument_error!("edge not in model"))?;
            let stored = Arc::clone(&store.edges[index]);
            let (Some(si), Some(ti)) = (
                store.index_of(stored.source()),
                store.index_of(stored.target()),
            ) else {
                return Err(state_error!("vertices not in model"));
            };

            let entry = store.remove_edge_at(index, si, ti);
            stored.set_owner(Weak::new());
            transaction.record(
                entry,
                ModelEventKind::EdgeRemoved,
                Component::Edge(Arc::clone(&stored)),
                Edit::RemoveEdge(stored),
                &self.this,
            );
            Ok(())
        })
    }

    /// Removes a vertex that has no incident edges.
    ///
    /// Every adjacency entry pointing past the removed position shifts down by one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the vertex is not in the model or
    /// still has incident edges.
    pub fn remove_vertex(&self, vertex: &Arc<Vertex>) -> Result<()> {
        self.mutate(|transaction, store| {
            let index = store
                .index_of(vertex)
                .ok_or_else(|| argument_error!("vertex not in model"))?;
            let stored = Arc::clone(&store.vertices[index]);
            if !store.adjacent_edges(&stored, false).is_empty() {
                return Err(argument_error!("vertex must not have edges"));
            }

            let entry = store.remove_vertex_at(index);
            stored.set_owner(Weak::new());
            transaction.record(
                entry,
                ModelEventKind::VertexRemoved,
                Component::Vertex(Arc::clone(&stored)),
                Edit::RemoveVertex(stored),
                &self.this,
            );
            Ok(())
        })
    }

    /// Removes a vertex or an edge.
    ///
    /// # Errors
    ///
    /// As [`remove_vertex`](Self::remove_vertex) or [`remove_edge`](Self::remove_edge).
    pub fn remove(&self, component: &Component) -> Result<()> {
        match component {
            Component::Vertex(vertex) => self.remove_vertex(vertex),
            Component::Edge(edge) => self.remove_edge(edge),
        }
    }

    /// Returns the edge from `source` to `target`, or an undirected edge joining
    /// them in either order.
    ///
    /// Returns `None` when `source` equals `target`.
    #[must_use]
    pub fn find_edge(&self, source: &Vertex, target: &Vertex) -> Option<Arc<Edge>> {
        self.read(|store| store.find_edge(source, target))
    }

    /// Returns the first vertex whose ellipse contains the point.
    #[must_use]
    pub fn find_vertex(&self, x: i32, y: i32, z: i32) -> Option<Arc<Vertex>> {
        self.read(|store| store.find_vertex(x, y, z))
    }

    /// Returns edges whose source is `vertex`, plus, unless `directed_only`, edges
    /// whose target is `vertex`.
    #[must_use]
    pub fn find_adjacent_edges(&self, vertex: &Vertex, directed_only: bool) -> Vec<Arc<Edge>> {
        self.read(|store| store.adjacent_edges(vertex, directed_only))
    }

    /// Returns the vertices reachable over one edge, in adjacency order.
    #[must_use]
    pub fn find_adjacent_vertices(&self, vertex: &Vertex) -> Vec<Arc<Vertex>> {
        self.read(|store| store.adjacent_vertices(vertex))
    }

    /// Returns the adjacency list of `vertex` as vertex positions.
    #[must_use]
    pub fn adjacency(&self, vertex: &Vertex) -> Option<Vec<usize>> {
        self.read(|store| {
            store
                .index_of(vertex)
                .map(|index| store.adjacency[index].clone())
        })
    }

    /// Returns a copy of the whole adjacency table.
    #[must_use]
    pub fn adjacency_table(&self) -> Vec<Vec<usize>> {
        self.read(|store| store.adjacency.clone())
    }

    /// Returns the position of `vertex` in [`vertices`](Self::vertices).
    #[must_use]
    pub fn index_of(&self, vertex: &Vertex) -> Option<usize> {
        self.read(|store| store.index_of(vertex))
    }

    /// Returns the vertices in insertion order.
    #[must_use]
    pub fn vertices(&self) -> Vec<Arc<Vertex>> {
        self.read(|store| store.vertices.clone())
    }

    /// Returns the edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> Vec<Arc<Edge>> {
        self.read(|store| store.edges.clone())
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.read(|store| store.vertices.len())
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.read(|store| store.edges.len())
    }

    /// Registers a structural change listener.
    pub fn add_model_listener(&self, listener: Arc<dyn ModelListener>) {
        self.model_listeners.add(listener);
    }

    /// Unregisters a structural change listener.
    pub fn remove_model_listener(&self, listener: &Arc<dyn ModelListener>) -> bool {
        self.model_listeners.remove(listener)
    }

    /// Registers a receiver for the compound edit of each committed transaction.
    pub fn add_undoable_edit_listener(&self, listener: Arc<dyn UndoableEditListener>) {
        self.edit_listeners.add(listener);
    }

    /// Unregisters an undoable edit listener.
    pub fn remove_undoable_edit_listener(&self, listener: &Arc<dyn UndoableEditListener>) -> bool {
        self.edit_listeners.remove(listener)
    }

    /// Installs or, with `None`, removes the commit hook.
    pub fn set_commit_hook(&self, hook: Option<Arc<dyn CommitHook>>) {
        with_write!(self.commit_hook, |slot: &mut Option<Arc<dyn CommitHook>>| *slot = hook);
    }

    /// Returns the client property stored under `key`.
    #[must_use]
    pub fn client_property(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(key)
    }

    /// Sets or, with `None`, removes a client property of the model.
    pub fn put_client_property(&self, key: &str, value: Option<PropertyValue>) {
        self.properties.put(key, value);
    }

    /// Returns all client properties of the model ordered by key.
    #[must_use]
    pub fn client_properties(&self) -> Vec<(String, PropertyValue)> {
        self.properties.entries()
    }

    /// Registers a listener for client property changes of the model.
    pub fn add_property_listener(&self, listener: Arc<dyn PropertyListener>) {
        self.properties.add_listener(listener);
    }

    /// Unregisters a property listener.
    pub fn remove_property_listener(&self, listener: &Arc<dyn PropertyListener>) -> bool {
        self.properties.remove_listener(listener)
    }

    /// Runs a mutation against the open transaction owned by the caller.
    fn mutate<R>(
        &self,
        operation: impl FnOnce(&mut Transaction, &mut AdjacencyList) -> Result<R>,
    ) -> Result<R> {
        self.gate.check_owner()?;
        let mut slot = lock!(self.transaction)?;
        let transaction = slot.as_mut().ok_or(Error::NotInTransaction)?;
        if transaction.committing {
            return Err(Error::TransactionCommitting);
        }
        let mut store = write_lock!(self.store)?;
        operation(transaction, &mut *store)
    }

    fn read<R>(&self, query: impl FnOnce(&AdjacencyList) -> R) -> R {
        with_read!(self.store, query)
    }

    fn restore_owner(&self, entry: &JournalEntry) {
        match entry {
            JournalEntry::VertexAdded { vertex } => vertex.set_owner(Weak::new()),
            JournalEntry::VertexRemoved { vertex, .. } => vertex.set_owner(self.this.clone()),
            JournalEntry::EdgeAdded { edge, .. } => edge.set_owner(Weak::new()),
            JournalEntry::EdgeRemoved { edge, .. } => edge.set_owner(self.this.clone()),
        }
    }

    fn release_gate(&self) {
        if let Err(error) = self.gate.release() {
            warn!(%error, "failed to release transaction token");
        }
    }
}

impl std::fmt::Debug for GraphModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphModel")
            .field("vertices", &self.vertex_count())
            .field("edges", &self.edge_count())
            .field("in_transaction", &self.is_in_transaction())
            .finish()
    }
}
