//! Output formatting and styling module.
//!
//! Centralizes CLI output: colored status lines, the post-pass summary
//! table and the spinner shown while a pass runs. Diagnostic logging goes
//! through `tracing`; this module is only for what the user is meant to
//! read.

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::duplicates::DuplicateGroup;
use crate::engine::OrganizeSummary;
use crate::undo::UndoReport;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Spinner shown while a pass is running.
    pub fn pass_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Prints the post-pass summary table.
    pub fn summary_table(summary: &OrganizeSummary) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = summary.by_category.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let width = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));
        for (category, count) in &categories {
            println!(
                "{:<width$} | {}",
                category,
                count.to_string().green(),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));

        println!(
            "Moved: {}  Duplicates: {}  Skipped: {}  Failed: {}  Pruned dirs: {}",
            summary.moved.to_string().green().bold(),
            summary.duplicates.to_string().yellow(),
            summary.skipped,
            if summary.failed > 0 {
                summary.failed.to_string().red().to_string()
            } else {
                summary.failed.to_string()
            },
            summary.pruned
        );

        let report = &summary.report;
        if report.deleted + report.backed_up + report.kept > 0 {
            println!(
                "Duplicate handling: {} deleted, {} backed up, {} kept",
                report.deleted, report.backed_up, report.kept
            );
        }
        for (path, reason) in &report.failures {
            Self::error(&format!("{}: {}", path.display(), reason));
        }
    }

    /// Lists detected duplicate groups before a disposition is chosen.
    pub fn duplicate_listing(groups: &[DuplicateGroup]) {
        Self::header("Duplicate files found");
        for (idx, group) in groups.iter().enumerate() {
            println!(
                "{}. Duplicate: {}\n   Original:  {}",
                idx + 1,
                group.duplicate.display(),
                group.original.display()
            );
        }
    }

    /// Prints the outcome of an undo request.
    pub fn undo_report(report: &UndoReport) {
        Self::success(&format!("Restored: {}", report.restored));

        if !report.skipped.is_empty() {
            Self::warning(&format!("Skipped: {}", report.skipped.len()));
            for (path, reason) in &report.skipped {
                println!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.failed.is_empty() {
            Self::error(&format!("Failed: {}", report.failed.len()));
            for (path, reason) in &report.failed {
                eprintln!("    - {}: {}", path.display(), reason);
            }
            Self::warning("Failed entries stay in the ledger; fix the issues and undo again.");
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
