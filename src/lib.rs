//! refile - organize a directory tree into category subfolders
//!
//! This library classifies files by extension, detects duplicate content
//! via streaming digests, moves files with a bounded retry policy, records
//! every move in a durable ledger for undo, and can run continuously from
//! filesystem creation events.

pub mod category;
pub mod cli;
pub mod config;
pub mod digest;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod file_mover;
pub mod ledger;
pub mod output;
pub mod undo;
pub mod watcher;

pub use category::{Classifier, FALLBACK_CATEGORY, RuleBook};
pub use config::Settings;
pub use duplicates::{
    Disposition, DispositionSource, DuplicateGroup, DuplicateReport, DuplicateResolver,
    FixedDisposition,
};
pub use engine::{OrganizeEngine, OrganizeSummary};
pub use error::{Error, MoveErrorClass, Result};
pub use file_mover::{AlertSink, LogAlertSink, MoveExecutor, RetryPolicy};
pub use ledger::{MovementLedger, MovementRecord};
pub use undo::{UndoManager, UndoReport};
pub use watcher::{FileWatcher, WatchAdapter, WatchEvent};
