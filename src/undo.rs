//! Reverting recorded moves.
//!
//! Undo is driven by the movement ledger: every record whose original path
//! contains the query is moved back, and its ledger entry is removed as
//! soon as the file lands at its original location. Failed restores keep
//! their entries so a later attempt can pick them up.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::ledger::{MovementLedger, MovementRecord};

/// Outcome of one undo request.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Files moved back to their original locations.
    pub restored: usize,
    /// Files that could not be restored, with reasons.
    pub failed: Vec<(PathBuf, String)>,
    /// Files no longer present at their recorded destination.
    pub skipped: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// True when every matching record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Applies undo operations against a movement ledger.
pub struct UndoManager;

impl UndoManager {
    /// Moves back every ledger record whose original path contains `query`.
    ///
    /// # Edge cases handled
    ///
    /// * **Destination missing**: skipped with a note; the ledger entry is
    ///   kept in case the file reappears.
    /// * **Conflict at the original location**: the conflicting file is
    ///   renamed aside with a timestamp suffix before restoring.
    /// * **Missing parent directories**: recreated before the rename.
    pub fn undo_matching(ledger: &MovementLedger, query: &str) -> Result<UndoReport> {
        let records = ledger.find_by_original(query)?;
        let mut report = UndoReport::default();

        if records.is_empty() {
            info!("no recorded moves match '{query}'");
            return Ok(report);
        }

        for record in &records {
            match Self::restore(record) {
                Ok(()) => {
                    ledger.remove(&record.dest)?;
                    report.restored += 1;
                }
                Err((path, reason)) => {
                    warn!("could not restore {}: {reason}", path.display());
                    if reason.contains("not found") {
                        report.skipped.push((path, reason));
                    } else {
                        report.failed.push((path, reason));
                    }
                }
            }
        }

        Ok(report)
    }

    fn restore(record: &MovementRecord) -> std::result::Result<(), (PathBuf, String)> {
        if !record.dest.exists() {
            return Err((
                record.dest.clone(),
                "file not found at recorded location".to_string(),
            ));
        }

        if let Some(parent) = record.original.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                (
                    record.original.clone(),
                    format!("could not recreate original directory: {e}"),
                )
            })?;
        }

        if record.original.exists() {
            let aside = Self::conflict_backup_path(&record.original);
            fs::rename(&record.original, &aside).map_err(|e| {
                (
                    record.original.clone(),
                    format!("could not move conflicting file aside: {e}"),
                )
            })?;
        }

        fs::rename(&record.dest, &record.original).map_err(|e| {
            (record.dest.clone(), format!("restore failed: {e}"))
        })?;

        info!(
            "moved back {} -> {}",
            record.dest.display(),
            record.original.display()
        );
        Ok(())
    }

    /// Example: `file.txt` becomes `file.txt.bak.20251109-143052`.
    fn conflict_backup_path(original: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let backup_name = format!("{filename}.bak.{timestamp}");

        match original.parent() {
            Some(parent) => parent.join(backup_name),
            None => PathBuf::from(backup_name),
        }
    }
}
