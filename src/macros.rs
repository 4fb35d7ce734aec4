#![allow(unused_macros)]

/// Helper macro for locking items, mapping poisoning to [`crate::Error::LockError`]
///
/// ```rust, ignore
///  let mut data = lock!(my_mutex)?;
///  data.some_field = 42;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().map_err(|_| crate::Error::LockError)
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let data = read_lock!(my_rwlock)?;
///  println!("{}", data.some_field);
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock.read().map_err(|_| crate::Error::LockError)
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  let mut data = write_lock!(my_rwlock)?;
///  data.some_field = 42;
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock.write().map_err(|_| crate::Error::LockError)
    };
}

/// Helper macro for reading locked items without surfacing poisoning
///
/// Used by infallible accessors. A poisoned lock still holds a consistent value
/// for the plain-data fields it guards, so the inner guard is recovered.
///
/// ```rust, ignore
///  let name = with_read!(vertex.state, |state| state.label.clone());
/// ```
macro_rules! with_read {
    ($rwlock:expr, $closure:expr) => {{
        let guard = $rwlock
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        $closure(&*guard)
    }};
}

/// Helper macro for writing to locked items without surfacing poisoning
///
/// ```rust, ignore
///  with_write!(vertex.state, |state| state.label = "new_name".to_string());
/// ```
macro_rules! with_write {
    ($rwlock:expr, $closure:expr) => {{
        let mut guard = $rwlock
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        $closure(&mut *guard)
    }};
}
