//! One organize pass over a directory tree.
//!
//! A pass runs: scan the tree, classify and move each file, resolve the
//! accumulated duplicate batch, prune emptied directories. Per-file errors
//! leave the file in place and the pass continues; only a persistence
//! failure of the ledger or rules store aborts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::category::{Classifier, RuleBook};
use crate::config::{ScanFilter, Settings};
use crate::digest::{ContentDigest, digest_file};
use crate::duplicates::{
    Disposition, DispositionSource, DuplicateGroup, DuplicateReport, DuplicateResolver,
    FixedDisposition,
};
use crate::error::{Error, Result};
use crate::file_mover::{AlertSink, MoveExecutor, RetryPolicy};
use crate::ledger::MovementLedger;

/// Ledger store kept at the organize root.
pub const LEDGER_FILE: &str = ".refile_ledger.json";

/// Counters reported after every pass, failures included.
#[derive(Debug, Default)]
pub struct OrganizeSummary {
    /// Files the scan considered.
    pub scanned: usize,
    /// Files moved (or, in a dry run, that would be moved).
    pub moved: usize,
    /// Files already at their destination.
    pub skipped: usize,
    /// Files left in place because a move or read failed.
    pub failed: usize,
    /// Duplicate groups detected this pass.
    pub duplicates: usize,
    /// Empty directories removed after the pass.
    pub pruned: usize,
    /// Moves per category, for reporting.
    pub by_category: HashMap<String, usize>,
    /// What happened to the duplicate batch.
    pub report: DuplicateReport,
}

/// Orchestrates organize passes over one root directory.
pub struct OrganizeEngine {
    root: PathBuf,
    classifier: Classifier,
    rules: RuleBook,
    ledger: MovementLedger,
    resolver: DuplicateResolver,
    policy: RetryPolicy,
    filter: ScanFilter,
    alert: Box<dyn AlertSink>,
}

impl OrganizeEngine {
    /// Builds an engine for `root` from settings.
    ///
    /// The ledger lives at the root as a hidden file; custom rules come
    /// from the default rule book location unless overridden with
    /// [`OrganizeEngine::with_rules`].
    pub fn new(root: &Path, settings: &Settings, alert: Box<dyn AlertSink>) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::InvalidRoot {
                path: root.to_path_buf(),
                reason: "does not exist or is not a directory".to_string(),
            });
        }
        let backup_dir = {
            let configured = Path::new(&settings.duplicates.backup_dir);
            if configured.is_absolute() {
                configured.to_path_buf()
            } else {
                root.join(configured)
            }
        };
        Ok(Self {
            root: root.to_path_buf(),
            classifier: Classifier::new(),
            rules: RuleBook::new(RuleBook::default_path()),
            ledger: MovementLedger::new(root.join(LEDGER_FILE)),
            resolver: DuplicateResolver::new(backup_dir),
            policy: settings.retry.policy(),
            filter: settings.filters.compile()?,
            alert,
        })
    }

    /// Replaces the rule book, mainly for tests and explicit store paths.
    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    /// The movement ledger for this root.
    pub fn ledger(&self) -> &MovementLedger {
        &self.ledger
    }

    /// The custom rule book consulted on every pass.
    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Runs one full pass, applying the duplicate disposition from
    /// `disposition` to whatever batch accumulates.
    pub fn run(&self, disposition: &dyn DispositionSource) -> Result<OrganizeSummary> {
        self.run_inner(disposition, false)
    }

    /// Runs the same analysis without moving anything: no renames, no
    /// ledger writes, no duplicate handling beyond counting.
    pub fn dry_run(&self) -> Result<OrganizeSummary> {
        self.run_inner(&FixedDisposition(Disposition::Skip), true)
    }

    fn run_inner(&self, disposition: &dyn DispositionSource, dry_run: bool) -> Result<OrganizeSummary> {
        info!("organizing {}", self.root.display());
        let custom_rules = self.rules.load()?;
        let mut summary = OrganizeSummary::default();
        let mut seen: HashMap<ContentDigest, PathBuf> = HashMap::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();

        // Collected up front: moving files mid-walk would let the walker
        // re-discover them under their category directory. Entries are
        // sorted by name so duplicate grouping is reproducible across
        // filesystems with unstable enumeration order.
        let files = self.scan();

        for path in files {
            summary.scanned += 1;

            let Some(file_name) = path.file_name().map(|n| n.to_os_string()) else {
                summary.skipped += 1;
                continue;
            };
            let category = self.classifier.classify_path(&path, &custom_rules);
            let dest_dir = self.root.join(&category);
            let dest = dest_dir.join(&file_name);

            let digest = match digest_file(&path) {
                Ok(digest) => digest,
                Err(e) => {
                    warn!("skipping unreadable file: {e}");
                    summary.failed += 1;
                    continue;
                }
            };

            if let Some(original) = seen.get(&digest) {
                debug!(
                    "duplicate content: {} matches {}",
                    path.display(),
                    original.display()
                );
                groups.push(DuplicateGroup {
                    duplicate: path.clone(),
                    original: original.clone(),
                });
                // Deferred: duplicates are not moved until the batch
                // disposition is known.
                continue;
            }
            seen.insert(digest, path.clone());

            if dest == path {
                debug!("{} already organized", path.display());
                summary.skipped += 1;
                continue;
            }

            if dry_run {
                info!("would move {} -> {}", path.display(), dest.display());
                summary.moved += 1;
                *summary.by_category.entry(category).or_insert(0) += 1;
                continue;
            }

            if !dest_dir.exists()
                && let Err(e) = fs::create_dir_all(&dest_dir)
            {
                error!(
                    "{}",
                    Error::CreateDir {
                        path: dest_dir.clone(),
                        source: e,
                    }
                );
                summary.failed += 1;
                continue;
            }

            let executor = MoveExecutor::new(self.policy, self.alert.as_ref());
            match executor.move_file(&path, &dest) {
                Ok(()) => {
                    // A failed persist aborts the pass: continuing would
                    // leave completed moves with no undo trail.
                    self.ledger.record(&path, &dest)?;
                    summary.moved += 1;
                    *summary.by_category.entry(category).or_insert(0) += 1;
                }
                Err(e) => {
                    error!("{e}");
                    summary.failed += 1;
                }
            }
        }

        summary.duplicates = groups.len();
        if dry_run {
            summary.report.kept = groups.len();
        } else {
            summary.report = self.resolver.resolve(&groups, disposition);
            summary.pruned = self.prune_empty_dirs();
        }

        info!(
            "pass complete: {} moved, {} duplicate(s), {} failed, {} skipped",
            summary.moved, summary.duplicates, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    /// Every file the pass should look at, in sorted walk order.
    fn scan(&self) -> Vec<PathBuf> {
        let backup_dir = self.resolver.backup_dir().to_path_buf();
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !entry.path().starts_with(&backup_dir))
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(entry.into_path()),
                Ok(_) => None,
                Err(e) => {
                    warn!("scan error: {e}");
                    None
                }
            })
            .filter(|path| {
                path != self.ledger.path()
                    && path != self.rules.path()
                    && self.filter.admits(path)
            })
            .collect()
    }

    /// Removes directories left empty, deepest first. The root itself is
    /// never removed. Failures are logged, not fatal.
    fn prune_empty_dirs(&self) -> usize {
        let mut pruned = 0;
        for entry in WalkDir::new(&self.root).min_depth(1).contents_first(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("prune walk error: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let is_empty = match fs::read_dir(entry.path()) {
                Ok(mut it) => it.next().is_none(),
                Err(e) => {
                    warn!("cannot inspect {}: {e}", entry.path().display());
                    false
                }
            };
            if is_empty {
                match fs::remove_dir(entry.path()) {
                    Ok(()) => {
                        debug!("removed empty directory {}", entry.path().display());
                        pruned += 1;
                    }
                    Err(e) => warn!("cannot remove {}: {e}", entry.path().display()),
                }
            }
        }
        pruned
    }
}
