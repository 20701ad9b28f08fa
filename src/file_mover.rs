//! Single-file relocation with a bounded, error-classified retry policy.
//!
//! A move is one atomic rename. Failures are classified (see
//! [`crate::error::classify_move_error`]): recoverable and unknown errors
//! consume one attempt each and sleep between tries; a vanished source
//! short-circuits immediately. Exhausting the attempt budget fires the
//! operator alert channel exactly once.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{Error, MoveErrorClass, Result, classify_move_error};

/// Side channel for operator attention, distinct from ordinary logging.
///
/// Invoked exactly once per move that exhausts its retry budget, never for
/// short-circuited non-recoverable failures. The host application wires
/// this to its own alerting; the default sink emits a critical-severity
/// tracing event.
pub trait AlertSink {
    fn critical(&self, message: &str);
}

/// Default sink: an error-level tracing event on a dedicated target so
/// subscribers can route alerts separately from ordinary logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn critical(&self, message: &str) {
        error!(target: "refile::alert", "ALERT: {message}");
    }
}

/// Bounds on how hard a single move is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total rename attempts, including the first.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Moves a single file, retrying recoverable failures.
pub struct MoveExecutor<'a> {
    policy: RetryPolicy,
    alert: &'a dyn AlertSink,
}

impl<'a> MoveExecutor<'a> {
    pub fn new(policy: RetryPolicy, alert: &'a dyn AlertSink) -> Self {
        Self { policy, alert }
    }

    /// Renames `source` to `dest` under the retry policy.
    ///
    /// On failure nothing is recorded anywhere, so re-invoking with the
    /// same arguments is safe and independent.
    pub fn move_file(&self, source: &Path, dest: &Path) -> Result<()> {
        self.move_file_with(source, dest, |s, d| fs::rename(s, d))
    }

    /// Same as [`MoveExecutor::move_file`] with the rename primitive
    /// injected, so retry behavior is testable without provoking real
    /// filesystem faults.
    pub fn move_file_with<F>(&self, source: &Path, dest: &Path, mut rename: F) -> Result<()>
    where
        F: FnMut(&Path, &Path) -> io::Result<()>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let cause = match rename(source, dest) {
                Ok(()) => {
                    info!("moved {} -> {}", source.display(), dest.display());
                    return Ok(());
                }
                Err(cause) => cause,
            };

            let class = classify_move_error(&cause);
            match class {
                MoveErrorClass::NonRecoverable => {
                    warn!(
                        "attempt {attempt}: source {} is gone, not retrying",
                        source.display()
                    );
                    return Err(Error::Move {
                        source_path: source.to_path_buf(),
                        dest: dest.to_path_buf(),
                        class,
                        attempts: attempt,
                        cause,
                    });
                }
                MoveErrorClass::Recoverable => {
                    warn!(
                        "attempt {attempt}: recoverable error moving {}: {cause}",
                        source.display()
                    );
                }
                MoveErrorClass::Unknown => {
                    error!(
                        "attempt {attempt}: unknown error moving {}: {cause}",
                        source.display()
                    );
                }
            }

            if attempt >= max_attempts {
                self.alert.critical(&format!(
                    "failed to move {} to {} after {attempt} attempts",
                    source.display(),
                    dest.display()
                ));
                return Err(Error::Move {
                    source_path: source.to_path_buf(),
                    dest: dest.to_path_buf(),
                    class,
                    attempts: attempt,
                    cause,
                });
            }
            thread::sleep(self.policy.delay);
        }
    }
}
