//! Synchronization utilities for transactional models.
//!
//! This module provides the two primitives the graph model is built on.
//!
//! # Key Components
//!
//! - [`TransactionGate`] - A fair, owner-tracking token granting exclusive transaction access
//! - [`ListenerList`] - A copy-on-write collection of listeners that is safe to iterate while mutated
//!
//! # Design Principles
//!
//! - **Fairness**: Threads waiting for the gate are served strictly in arrival order
//! - **Ownership**: Only the thread that acquired the gate may release it
//! - **Lock-free dispatch**: Listener snapshots are plain `Arc`s; callbacks run without any lock held

use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use crate::{Error, Result};

#[derive(Debug, Default)]
struct GateState {
    /// Next ticket to hand out
    next_ticket: u64,
    /// Ticket currently allowed to hold the gate
    serving: u64,
    /// Thread holding the gate
    owner: Option<ThreadId>,
}

/// A fair token that grants one thread at a time the right to mutate a model.
///
/// The gate is a ticket lock: every caller of [`acquire`](Self::acquire) draws a
/// ticket and blocks until that ticket is served, so contending threads enter in
/// FIFO order. Unlike [`std::sync::Mutex`] the gate is not tied to a guard's
/// lifetime; it is released explicitly by the owning thread, which lets a
/// transaction span several method calls.
///
/// # Examples
///
/// ```rust
/// use edgeloom::utils::TransactionGate;
///
/// let gate = TransactionGate::new();
/// gate.acquire()?;
/// assert!(gate.is_held_by_current());
/// gate.release()?;
/// assert!(!gate.is_held());
/// # Ok::<(), edgeloom::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct TransactionGate {
    state: Mutex<GateState>,
    condvar: Condvar,
}

impl TransactionGate {
    /// Creates a new, unheld gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the calling thread holds the gate.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyInTransaction`] if the calling thread already holds the gate
    /// * [`Error::LockError`] if the internal mutex was poisoned
    pub fn acquire(&self) -> Result<()> {
        let me = thread::current().id();
        let mut state = lock!(self.state)?;
        if state.owner == Some(me) {
            return Err(Error::AlreadyInTransaction);
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;

        let mut state = self
            .condvar
            .wait_while(state, |state| state.serving != ticket)
            .map_err(|_| Error::LockError)?;
        state.owner = Some(me);
        Ok(())
    }

    /// Releases the gate and wakes the next waiting thread.
    ///
    /// # Errors
    ///
    /// * [`Error::NotInTransaction`] if the gate is not held
    /// * [`Error::NotTransactionOwner`] if another thread holds the gate
    pub fn release(&self) -> Result<()> {
        let mut state = lock!(self.state)?;
        Self::verify(&state)?;
        state.owner = None;
        state.serving += 1;
        drop(state);

        self.condvar.notify_all();
        Ok(())
    }

    /// Checks that the calling thread holds the gate.
    ///
    /// # Errors
    ///
    /// * [`Error::NotInTransaction`] if the gate is not held
    /// * [`Error::NotTransactionOwner`] if another thread holds the gate
    pub fn check_owner(&self) -> Result<()> {
        let state = lock!(self.state)?;
        Self::verify(&state)
    }

    /// Returns `true` if any thread holds the gate.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .owner
            .is_some()
    }

    /// Returns `true` if the calling thread holds the gate.
    #[must_use]
    pub fn is_held_by_current(&self) -> bool {
        self.owner() == Some(thread::current().id())
    }

    /// Returns the thread holding the gate, if any.
    #[must_use]
    pub fn owner(&self) -> Option<ThreadId> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .owner
    }

    /// Returns the number of threads blocked in [`acquire`](Self::acquire).
    #[must_use]
    pub fn waiting(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let queued = state.next_ticket - state.serving;
        let held = u64::from(state.owner.is_some());
        usize::try_from(queued.saturating_sub(held)).unwrap_or(usize::MAX)
    }

    fn verify(state: &GateState) -> Result<()> {
        match state.owner {
            None => Err(Error::NotInTransaction),
            Some(owner) if owner != thread::current().id() => Err(Error::NotTransactionOwner),
            Some(_) => Ok(()),
        }
    }
}

/// An ordered, copy-on-write collection of listeners.
///
/// Adding or removing a listener replaces the backing vector, so a snapshot
/// taken with [`snapshot`](Self::snapshot) is never affected by later changes.
/// Dispatchers iterate a snapshot without holding any lock, which lets listeners
/// register or unregister other listeners from inside a callback.
///
/// # Examples
///
/// ```rust
/// use edgeloom::utils::ListenerList;
/// use std::sync::Arc;
///
/// let listeners: ListenerList<dyn Fn(u32) + Send + Sync> = ListenerList::new();
/// let first: Arc<dyn Fn(u32) + Send + Sync> = Arc::new(|_| {});
/// listeners.add(first.clone());
///
/// let snapshot = listeners.snapshot();
/// listeners.remove(&first);
/// assert_eq!(snapshot.len(), 1);
/// assert!(listeners.is_empty());
/// ```
pub struct ListenerList<L: ?Sized> {
    inner: RwLock<Arc<Vec<Arc<L>>>>,
}

impl<L: ?Sized> Default for ListenerList<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> ListenerList<L> {
    /// Creates an empty listener list.
    #[must_use]
    pub fn new() -> Self {
        ListenerList {
            inner: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Appends a listener. The same listener may be registered more than once.
    pub fn add(&self, listener: Arc<L>) {
        with_write!(self.inner, |list: &mut Arc<Vec<Arc<L>>>| {
            let mut next = Vec::with_capacity(list.len() + 1);
            next.extend(list.iter().cloned());
            next.push(listener);
            *list = Arc::new(next);
        });
    }

    /// Removes the first registration of `listener`, compared by address.
    ///
    /// # Returns
    ///
    /// `true` if a registration was removed.
    pub fn remove(&self, listener: &Arc<L>) -> bool {
        with_write!(self.inner, |list: &mut Arc<Vec<Arc<L>>>| {
            let Some(position) = list
                .iter()
                .position(|current| std::ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(listener)))
            else {
                return false;
            };
            let mut next: Vec<Arc<L>> = list.iter().cloned().collect();
            next.remove(position);
            *list = Arc::new(next);
            true
        })
    }

    /// Returns the current listeners in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Arc<L>>> {
        with_read!(self.inner, |list: &Arc<Vec<Arc<L>>>| Arc::clone(list))
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        with_read!(self.inner, |list: &Arc<Vec<Arc<L>>>| list.len())
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every listener.
    pub fn clear(&self) {
        with_write!(self.inner, |list: &mut Arc<Vec<Arc<L>>>| {
            *list = Arc::new(Vec::new());
        });
    }
}

impl<L: ?Sized> std::fmt::Debug for ListenerList<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_gate_acquire_release() {
        let gate = TransactionGate::new();
        assert!(!gate.is_held());
        assert!(matches!(gate.check_owner(), Err(Error::NotInTransaction)));

        gate.acquire().unwrap();
        assert!(gate.is_held());
        assert!(gate.is_held_by_current());
        gate.check_owner().unwrap();

        assert!(matches!(gate.acquire(), Err(Error::AlreadyInTransaction)));

        gate.release().unwrap();
        assert!(!gate.is_held());
        assert!(matches!(gate.release(), Err(Error::NotInTransaction)));
    }

    #[test]
    fn test_gate_rejects_foreign_release() {
        let gate = Arc::new(TransactionGate::new());
        gate.acquire().unwrap();

        let other = Arc::clone(&gate);
        let result = thread::spawn(move || (other.release(), other.check_owner()))
            .join()
            .unwrap();
        assert!(matches!(result.0, Err(Error::NotTransactionOwner)));
        assert!(matches!(result.1, Err(Error::NotTransactionOwner)));

        gate.release().unwrap();
    }

    #[test]
    fn test_gate_serves_fifo() {
        let gate = Arc::new(TransactionGate::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        gate.acquire().unwrap();

        let mut handles = Vec::new();
        for id in 0..4 {
            let worker = Arc::clone(&gate);
            let order = Arc::clone(&order);
            handles.push(thread::spawn(move || {
                worker.acquire().unwrap();
                order.lock().unwrap().push(id);
                worker.release().unwrap();
            }));
            // Wait until this thread has drawn its ticket before starting the next
            while gate.waiting() < id + 1 {
                thread::sleep(Duration::from_millis(1));
            }
        }

        gate.release().unwrap();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_listener_list_copy_on_write() {
        let list: ListenerList<AtomicUsize> = ListenerList::new();
        let first = Arc::new(AtomicUsize::new(1));
        let second = Arc::new(AtomicUsize::new(2));
        list.add(Arc::clone(&first));
        list.add(Arc::clone(&second));

        let snapshot = list.snapshot();
        assert!(list.remove(&first));
        assert!(!list.remove(&first));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(list.len(), 1);
        assert_eq!(list.snapshot()[0].load(Ordering::Relaxed), 2);

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_listener_list_trait_objects() {
        let hits = Arc::new(AtomicUsize::new(0));
        let list: ListenerList<dyn Fn() + Send + Sync> = ListenerList::new();
        let counter = Arc::clone(&hits);
        let listener: Arc<dyn Fn() + Send + Sync> = Arc::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        list.add(Arc::clone(&listener));
        list.add(Arc::clone(&listener));

        for callback in list.snapshot().iter() {
            callback();
        }
        assert_eq!(hits.load(Ordering::Relaxed), 2);

        assert!(list.remove(&listener));
        assert_eq!(list.len(), 1);
    }
}
