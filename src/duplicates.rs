//! Duplicate grouping and batch disposition.
//!
//! The engine defers every later-seen copy of already-seen content into a
//! [`DuplicateGroup`]. After the walk, one disposition is chosen for the
//! whole batch and applied here. Originals are never touched; per-file
//! failures are logged and do not stop the rest of the batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

/// A file whose content matches an earlier-seen file in the same pass.
///
/// "Original" means first-seen in walk order, nothing more: discovery order
/// is the sole tie-break, so which copy counts as the original depends on
/// how the filesystem walk enumerates entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// The later-discovered copy, still sitting where the scan found it.
    pub duplicate: PathBuf,
    /// The first-seen file with the same digest.
    pub original: PathBuf,
}

/// Batch-wide handling for detected duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Leave every duplicate in place.
    Skip,
    /// Remove every duplicate file.
    Delete,
    /// Relocate every duplicate into the backup directory.
    Backup,
}

impl FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" | "no" => Ok(Disposition::Skip),
            "delete" | "yes" => Ok(Disposition::Delete),
            "backup" => Ok(Disposition::Backup),
            other => Err(format!(
                "invalid disposition '{other}', expected delete, backup or skip"
            )),
        }
    }
}

/// Chooses one disposition for an entire duplicate batch.
///
/// The interactive prompt lives behind this seam so the resolver can be
/// driven by tests and by watch mode without a terminal.
pub trait DispositionSource {
    fn choose(&self, groups: &[DuplicateGroup]) -> Disposition;
}

/// Always answers with the same disposition. Used by watch mode,
/// non-interactive runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDisposition(pub Disposition);

impl DispositionSource for FixedDisposition {
    fn choose(&self, _groups: &[DuplicateGroup]) -> Disposition {
        self.0
    }
}

/// Outcome of one resolution batch.
#[derive(Debug, Default)]
pub struct DuplicateReport {
    pub deleted: usize,
    pub backed_up: usize,
    pub kept: usize,
    pub failures: Vec<(PathBuf, String)>,
}

/// Applies one batch-wide disposition to a set of duplicate groups.
pub struct DuplicateResolver {
    backup_dir: PathBuf,
}

impl DuplicateResolver {
    pub fn new(backup_dir: PathBuf) -> Self {
        Self { backup_dir }
    }

    /// Where backed-up duplicates land. Created on demand.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Resolves the batch with a disposition obtained from `source`.
    ///
    /// An empty batch returns immediately without consulting the source.
    pub fn resolve(
        &self,
        groups: &[DuplicateGroup],
        source: &dyn DispositionSource,
    ) -> DuplicateReport {
        let mut report = DuplicateReport::default();
        if groups.is_empty() {
            info!("no duplicate files found");
            return report;
        }

        match source.choose(groups) {
            Disposition::Delete => self.delete_all(groups, &mut report),
            Disposition::Backup => self.backup_all(groups, &mut report),
            Disposition::Skip => {
                report.kept = groups.len();
                info!("{} duplicate(s) left in place", groups.len());
            }
        }
        report
    }

    fn delete_all(&self, groups: &[DuplicateGroup], report: &mut DuplicateReport) {
        for group in groups {
            match fs::remove_file(&group.duplicate) {
                Ok(()) => {
                    info!("deleted duplicate {}", group.duplicate.display());
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!("could not delete {}: {e}", group.duplicate.display());
                    report
                        .failures
                        .push((group.duplicate.clone(), e.to_string()));
                }
            }
        }
    }

    fn backup_all(&self, groups: &[DuplicateGroup], report: &mut DuplicateReport) {
        if let Err(e) = fs::create_dir_all(&self.backup_dir) {
            warn!(
                "could not create backup directory {}: {e}",
                self.backup_dir.display()
            );
            for group in groups {
                report
                    .failures
                    .push((group.duplicate.clone(), e.to_string()));
            }
            return;
        }

        for group in groups {
            let Some(file_name) = group.duplicate.file_name() else {
                report.failures.push((
                    group.duplicate.clone(),
                    "file has no name component".to_string(),
                ));
                continue;
            };
            let target = self.backup_dir.join(file_name);
            match fs::rename(&group.duplicate, &target) {
                Ok(()) => {
                    info!(
                        "moved duplicate {} to {}",
                        group.duplicate.display(),
                        target.display()
                    );
                    report.backed_up += 1;
                }
                Err(e) => {
                    warn!(
                        "could not back up {}: {e}",
                        group.duplicate.display()
                    );
                    report
                        .failures
                        .push((group.duplicate.clone(), e.to_string()));
                }
            }
        }
    }
}
