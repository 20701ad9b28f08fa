//! Command-line interface for refile.
//!
//! Wires the engine, ledger, rule book and watcher to clap subcommands,
//! and supplies the interactive duplicate-disposition prompt.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::category::RuleBook;
use crate::config::Settings;
use crate::duplicates::{Disposition, DispositionSource, DuplicateGroup, FixedDisposition};
use crate::engine::OrganizeEngine;
use crate::error::Result;
use crate::file_mover::LogAlertSink;
use crate::output::OutputFormatter;
use crate::undo::UndoManager;
use crate::watcher;

#[derive(Parser)]
#[command(
    name = "refile",
    version,
    about = "Organize files into category folders, with duplicate handling, undo and watch mode."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a settings file (TOML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Organize a directory into category subfolders.
    Organize {
        /// The directory to organize.
        dir: PathBuf,

        /// Analyze and report without moving anything.
        #[arg(long)]
        dry_run: bool,

        /// Batch disposition for duplicates (delete, backup, skip)
        /// instead of prompting.
        #[arg(long, value_parser = parse_disposition)]
        on_duplicates: Option<Disposition>,
    },

    /// Move previously organized files back to where they came from.
    Undo {
        /// The directory that was organized.
        dir: PathBuf,

        /// Substring of the original path(s) to restore.
        query: String,
    },

    /// Manage custom extension rules.
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// Monitor a directory and organize new files as they appear.
    Watch {
        /// The directory to monitor.
        dir: PathBuf,

        /// Batch disposition for duplicates found while watching.
        #[arg(long, value_parser = parse_disposition, default_value = "skip")]
        on_duplicates: Disposition,
    },
}

#[derive(Subcommand)]
pub enum RuleAction {
    /// Map an extension to a category (e.g. `.raw Photos`).
    Add { extension: String, category: String },
    /// Show every custom rule.
    List,
    /// Delete all custom rules, restoring built-in behavior.
    Reset,
}

fn parse_disposition(s: &str) -> std::result::Result<Disposition, String> {
    s.parse()
}

/// Asks on stdin what to do with a duplicate batch.
///
/// Invalid answers re-prompt; an unreadable stdin falls back to leaving
/// the duplicates in place.
struct PromptDisposition;

impl DispositionSource for PromptDisposition {
    fn choose(&self, groups: &[DuplicateGroup]) -> Disposition {
        OutputFormatter::duplicate_listing(groups);
        let stdin = io::stdin();
        loop {
            print!("Handle all duplicates? (delete/backup/skip): ");
            if io::stdout().flush().is_err() {
                return Disposition::Skip;
            }
            let mut answer = String::new();
            match stdin.lock().read_line(&mut answer) {
                Ok(0) | Err(_) => return Disposition::Skip,
                Ok(_) => {}
            }
            match answer.trim().parse() {
                Ok(disposition) => return disposition,
                Err(e) => OutputFormatter::warning(&e),
            }
        }
    }
}

/// Runs the parsed command-line invocation.
pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Organize {
            dir,
            dry_run,
            on_duplicates,
        } => organize(&dir, &settings, dry_run, on_duplicates),
        Command::Undo { dir, query } => undo(&dir, &settings, &query),
        Command::Rule { action } => rule(action),
        Command::Watch { dir, on_duplicates } => {
            let engine = OrganizeEngine::new(&dir, &settings, Box::new(LogAlertSink))?;
            watcher::watch_forever(&engine, &dir, &FixedDisposition(on_duplicates))
        }
    }
}

fn organize(
    dir: &Path,
    settings: &Settings,
    dry_run: bool,
    on_duplicates: Option<Disposition>,
) -> Result<()> {
    let engine = OrganizeEngine::new(dir, settings, Box::new(LogAlertSink))?;

    if dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing {}", dir.display()));
        let summary = engine.dry_run()?;
        OutputFormatter::summary_table(&summary);
        OutputFormatter::dry_run_notice("No files were modified.");
        return Ok(());
    }

    OutputFormatter::info(&format!("Organizing {}", dir.display()));
    let spinner = OutputFormatter::pass_spinner("organizing...");
    let result = match on_duplicates {
        Some(disposition) => engine.run(&FixedDisposition(disposition)),
        None => engine.run(&PromptDisposition),
    };
    spinner.finish_and_clear();

    let summary = result?;
    OutputFormatter::summary_table(&summary);
    if summary.failed > 0 {
        OutputFormatter::warning("Some files could not be organized; see the log for details.");
    } else {
        OutputFormatter::success("Organization complete!");
    }
    OutputFormatter::info(&format!(
        "Use 'refile undo {} <query>' to revert moves.",
        dir.display()
    ));
    Ok(())
}

fn undo(dir: &Path, settings: &Settings, query: &str) -> Result<()> {
    // The engine owns the ledger location; building one also validates
    // the directory.
    let engine = OrganizeEngine::new(dir, settings, Box::new(LogAlertSink))?;
    OutputFormatter::info(&format!("Undoing moves matching '{query}'"));

    let report = UndoManager::undo_matching(engine.ledger(), query)?;
    OutputFormatter::undo_report(&report);
    Ok(())
}

fn rule(action: RuleAction) -> Result<()> {
    let book = RuleBook::new(RuleBook::default_path());
    match action {
        RuleAction::Add {
            extension,
            category,
        } => {
            book.add(&extension, &category)?;
            OutputFormatter::success(&format!("Custom rule added: {extension} -> {category}"));
        }
        RuleAction::List => {
            let rules = book.load()?;
            if rules.is_empty() {
                OutputFormatter::info("No custom rules defined.");
            } else {
                OutputFormatter::header("Custom rules");
                for (extension, category) in rules {
                    println!("  {extension} -> {category}");
                }
            }
        }
        RuleAction::Reset => {
            book.reset()?;
            OutputFormatter::success("Custom rules have been reset to default.");
        }
    }
    Ok(())
}
