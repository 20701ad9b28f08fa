//! Error taxonomy for refile operations.
//!
//! Per-file errors (`Move`, `Read`, `CreateDir`) are contained by the engine:
//! the affected file is left in place and the pass continues. `Persistence`
//! is the exception: a ledger or rules store that cannot be read or written
//! aborts the current operation rather than risking a stale or partially
//! written store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for refile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How a failed rename should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveErrorClass {
    /// Permission or contention class failure. Retrying is worthwhile.
    Recoverable,
    /// The source no longer exists. Retrying cannot help.
    NonRecoverable,
    /// Anything else. Retried like recoverable, logged distinctly.
    Unknown,
}

/// Classifies an I/O error raised by a rename attempt.
pub fn classify_move_error(err: &io::Error) -> MoveErrorClass {
    match err.kind() {
        io::ErrorKind::NotFound => MoveErrorClass::NonRecoverable,
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::ResourceBusy
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut
        | io::ErrorKind::Interrupted => MoveErrorClass::Recoverable,
        _ => MoveErrorClass::Unknown,
    }
}

/// refile error types.
#[derive(Error, Debug)]
pub enum Error {
    /// A rename failed after the retry policy short-circuited or ran out of
    /// attempts. `attempts` counts every rename call that was made.
    #[error("could not move {} to {}: {cause}", source_path.display(), dest.display())]
    Move {
        source_path: PathBuf,
        dest: PathBuf,
        class: MoveErrorClass,
        attempts: u32,
        #[source]
        cause: io::Error,
    },

    /// A file could not be opened or read while computing its digest.
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The ledger or rules store is unreadable, unparsable or unwritable.
    #[error("store {} is unusable: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    /// A category directory could not be created.
    #[error("could not create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The organize root does not exist or is not a directory.
    #[error("invalid root directory {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// Settings file is missing, unparsable or contains bad patterns.
    #[error("invalid settings: {0}")]
    Config(String),

    /// Filesystem watch subscription failed.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}
