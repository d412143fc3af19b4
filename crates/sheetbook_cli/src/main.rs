//! Command-line front end for inspecting and repairing workspaces on disk.
//!
//! # Responsibility
//! - Load a workspace through `sheetbook_core` and report consistency issues.
//! - Apply recommended repairs, optionally writing the result back.
//!
//! # Exit codes
//! - `0` success, `1` issues found by `check`, `2` usage, load or write failure.

use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use sheetbook_core::{
    column_label, detect, init_logging, load_workspace_snapshot, repair, save_workspace_snapshot,
    sheet_bounds, Clock, ConsistencyIssue, Decision, Severity, SystemClock,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ISSUES: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "sheetbook")]
#[command(about = "Inspect and repair local spreadsheet workspaces")]
#[command(version)]
struct Cli {
    /// Log level: trace|debug|info|warn|error.
    #[arg(long, global = true, env = "SHEETBOOK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, global = true, env = "SHEETBOOK_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report drift between workspace.json and the book files
    Check {
        /// Path to workspace.json
        workspace: PathBuf,

        /// Print issues as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Apply each issue's recommended decision
    Repair {
        /// Path to workspace.json
        workspace: PathBuf,

        /// Write the repaired documents back to disk
        #[arg(long)]
        write: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print rendered bounds for every sheet of a book
    Bounds {
        /// Path to workspace.json
        workspace: PathBuf,

        /// Book id as listed in workspace.json
        book_id: String,
    },

    /// Print the core library version
    Version,
}

struct CliError {
    code: u8,
    message: String,
}

impl CliError {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_FAILURE,
            message: message.into(),
        }
    }

    fn issues_found() -> Self {
        Self {
            code: EXIT_ISSUES,
            message: String::new(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or(sheetbook_core::default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: {err}");
        }
    }

    let result = match cli.command {
        Commands::Check { workspace, json } => cmd_check(workspace, json),
        Commands::Repair {
            workspace,
            write,
            json,
        } => cmd_repair(workspace, write, json),
        Commands::Bounds { workspace, book_id } => cmd_bounds(workspace, &book_id),
        Commands::Version => {
            println!("sheetbook_core {}", sheetbook_core::core_version());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message }) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            ExitCode::from(code)
        }
    }
}

fn cmd_check(workspace: PathBuf, as_json: bool) -> Result<(), CliError> {
    let snapshot =
        load_workspace_snapshot(&workspace).map_err(|err| CliError::failure(err.to_string()))?;
    let issues = detect(&snapshot);
    info!(
        "event=cli_check module=cli status=ok issues={}",
        issues.len()
    );

    if as_json {
        let payload = serde_json::to_string_pretty(&issues)
            .map_err(|err| CliError::failure(err.to_string()))?;
        println!("{payload}");
    } else if issues.is_empty() {
        println!("no issues");
    } else {
        for issue in &issues {
            println!("{}", describe_issue(issue));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(CliError::issues_found())
    }
}

fn cmd_repair(workspace: PathBuf, write: bool, as_json: bool) -> Result<(), CliError> {
    let snapshot =
        load_workspace_snapshot(&workspace).map_err(|err| CliError::failure(err.to_string()))?;
    let issues = detect(&snapshot);
    let decisions: HashMap<String, Decision> = issues
        .iter()
        .map(|issue| (issue.id.clone(), issue.recommended_decision()))
        .collect();

    let now = SystemClock.now();
    let outcome = repair(&snapshot, &issues, &decisions, &now)
        .map_err(|err| CliError::failure(err.to_string()))?;

    let written = write && outcome.snapshot != snapshot;
    if written {
        save_workspace_snapshot(&outcome.snapshot)
            .map_err(|err| CliError::failure(err.to_string()))?;
    }
    info!(
        "event=cli_repair module=cli status=ok resolved={} unresolved={} written={}",
        outcome.resolved_issue_ids.len(),
        outcome.unresolved_issue_ids.len(),
        written
    );

    if as_json {
        let payload = json!({
            "resolvedIssueIds": outcome.resolved_issue_ids,
            "unresolvedIssueIds": outcome.unresolved_issue_ids,
            "bookIdReplacements": outcome.book_id_replacements,
            "sheetSelectionUpdates": outcome.sheet_selection_updates,
            "written": written,
        });
        let payload = serde_json::to_string_pretty(&payload)
            .map_err(|err| CliError::failure(err.to_string()))?;
        println!("{payload}");
        return Ok(());
    }

    for issue_id in &outcome.resolved_issue_ids {
        println!("resolved\t{issue_id}");
    }
    for issue_id in &outcome.unresolved_issue_ids {
        println!("unresolved\t{issue_id}");
    }
    for (old_id, new_id) in &outcome.book_id_replacements {
        println!("replaced\t{old_id} -> {new_id}");
    }
    if write {
        println!("{}", if written { "written" } else { "nothing to write" });
    } else if outcome.snapshot != snapshot {
        println!("dry run; pass --write to save");
    }
    Ok(())
}

fn cmd_bounds(workspace: PathBuf, book_id: &str) -> Result<(), CliError> {
    let snapshot =
        load_workspace_snapshot(&workspace).map_err(|err| CliError::failure(err.to_string()))?;
    let document = snapshot
        .book_document(book_id)
        .ok_or_else(|| CliError::failure(format!("book not found: {book_id}")))?;

    for sheet in &document.sheets {
        let bounds = sheet_bounds(sheet);
        let last_column = column_label(bounds.cols.saturating_sub(1) as usize);
        println!(
            "{}\t{} x {}\tA:{}",
            sheet.id, bounds.rows, bounds.cols, last_column
        );
    }
    Ok(())
}

fn describe_issue(issue: &ConsistencyIssue) -> String {
    let severity = match issue.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    format!(
        "{severity}\t{}\t{} (recommended: {})",
        issue.id,
        issue.message,
        issue.recommended_decision()
    )
}
