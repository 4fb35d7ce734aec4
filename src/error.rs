use std::path::PathBuf;

use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! state_error {
    ($msg:expr) => {
        crate::Error::IllegalState {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::IllegalState {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! argument_error {
    ($msg:expr) => {
        crate::Error::IllegalArgument {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::IllegalArgument {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into four families. Callers that only care about the family can use
/// [`Error::is_state_error`], [`Error::is_argument_error`] and [`Error::is_io_error`].
///
/// # Error Categories
///
/// ## State Errors
/// Contract violations by the caller. They are surfaced immediately and never retried.
/// - [`Error::NotInTransaction`] - Mutation attempted without an open transaction
/// - [`Error::NotTransactionOwner`] - Transaction used from a thread that did not open it
/// - [`Error::AlreadyInTransaction`] - Owner thread tried to open a second transaction
/// - [`Error::TransactionCommitting`] - Mutation attempted while the commit is dispatching events
/// - [`Error::IllegalState`] - Model invariants would be broken (foreign vertices, self loops, ...)
/// - [`Error::KeyIncrease`] - Fibonacci heap key was asked to grow
/// - [`Error::LockError`] - A lock was poisoned by a panicking thread
///
/// ## Argument Errors
/// - [`Error::IllegalArgument`] - Duplicate edge, unknown component, vertex with live edges
/// - [`Error::IndexOutOfBounds`] - Slot index outside a fixed-capacity structure
/// - [`Error::StaleEntry`] - Heap handle refers to an entry that no longer exists
///
/// ## I/O Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::ReadOnlySource`] - Write attempted on a read-only model source
/// - [`Error::Malformed`] - Snapshot stream is corrupted
/// - [`Error::OutOfBounds`] - Snapshot stream ended early
/// - [`Error::ChecksumMismatch`] - Snapshot digest does not match its contents
///
/// ## Undo Errors
/// - [`Error::CannotUndo`] / [`Error::CannotRedo`] - Edit cannot be replayed
///
/// # Examples
///
/// ```rust
/// use edgeloom::{Error, model::{DefaultModelFactory, ModelFactory}};
///
/// let factory = DefaultModelFactory::new();
/// let model = factory.create_model();
/// let vertex = factory.create_vertex(1, 1, 1, 1.0);
///
/// match model.add_vertex(vertex) {
///     Err(Error::NotInTransaction) => println!("open a transaction first"),
///     Err(e) => println!("Other error: {}", e),
///     Ok(()) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Transaction discipline
    /// A mutation was attempted while no transaction was open.
    #[error("must be in a transaction")]
    NotInTransaction,

    /// The calling thread does not own the open transaction.
    #[error("thread is not transaction owner")]
    NotTransactionOwner,

    /// The calling thread already owns the open transaction.
    #[error("current thread already in a transaction")]
    AlreadyInTransaction,

    /// The transaction is dispatching its buffered events and can no longer be mutated.
    #[error("transaction is committing")]
    TransactionCommitting,

    /// The requested operation would corrupt the model.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated invariant
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Illegal state - {file}:{line}: {message}")]
    IllegalState {
        /// The message to be printed for the IllegalState error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The caller passed an argument the operation cannot accept.
    ///
    /// Used for duplicate edges, components that are not part of the model and
    /// vertices that still have incident edges.
    #[error("Illegal argument - {file}:{line}: {message}")]
    IllegalArgument {
        /// The message to be printed for the IllegalArgument error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A Fibonacci heap key may only decrease.
    #[error("cannot increase key value from {current} to {requested}")]
    KeyIncrease {
        /// The key currently stored for the entry
        current: f64,
        /// The rejected replacement key
        requested: f64,
    },

    /// The heap entry handle no longer refers to a live entry.
    #[error("heap entry is no longer present")]
    StaleEntry,

    /// An index fell outside a fixed-capacity structure.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The rejected index
        index: usize,
        /// The capacity of the structure
        len: usize,
    },

    /// Failed to lock target.
    ///
    /// This error occurs when a mutex or rwlock was poisoned by a panicking thread.
    #[error("Failed to lock target")]
    LockError,

    // Persistence
    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The model source does not accept writes.
    #[error("model source is read-only - {0}")]
    ReadOnlySource(PathBuf),

    /// The snapshot is damaged and could not be parsed.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing a snapshot.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The trailing digest of a snapshot does not match its contents.
    #[error("snapshot checksum mismatch")]
    ChecksumMismatch,

    // Undo / redo
    /// The edit could not be undone.
    #[error("cannot undo - {0}")]
    CannotUndo(String),

    /// The edit could not be redone.
    #[error("cannot redo - {0}")]
    CannotRedo(String),
}

impl Error {
    /// Returns `true` for transaction-discipline and invariant violations.
    #[must_use]
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            Error::NotInTransaction
                | Error::NotTransactionOwner
                | Error::AlreadyInTransaction
                | Error::TransactionCommitting
                | Error::IllegalState { .. }
                | Error::KeyIncrease { .. }
                | Error::LockError
        )
    }

    /// Returns `true` for errors caused by an unacceptable argument.
    #[must_use]
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Error::IllegalArgument { .. } | Error::IndexOutOfBounds { .. } | Error::StaleEntry
        )
    }

    /// Returns `true` for environmental failures while reading or writing snapshots.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Error::FileError(_)
                | Error::ReadOnlySource(_)
                | Error::Malformed { .. }
                | Error::OutOfBounds
                | Error::ChecksumMismatch
        )
    }
}
