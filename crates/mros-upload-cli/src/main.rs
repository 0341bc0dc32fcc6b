// SPDX-License-Identifier: AGPL-3.0
// mros Upload Service - Command line frontend
//
// Used directly from a terminal and by the file manager, which spawns it with
// the selected files.

use chrono::{Local, TimeZone};
use clap::error::ErrorKind;
use clap::Parser;
use mros_upload_core::{
    format_bytes, BatchResult, BatchSummary, UploadRecord, UploadService, DEFAULT_HISTORY_LIMIT,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "mros-upload-service",
    version,
    about = "Upload files to bashupload.com and keep a local history",
    arg_required_else_help = true
)]
struct Cli {
    /// Files to upload, in order
    #[arg(value_name = "FILE", conflicts_with_all = ["folder", "history", "clear_history"])]
    files: Vec<PathBuf>,

    /// Upload every file in a folder, recursively
    #[arg(long, value_name = "DIR", conflicts_with_all = ["history", "clear_history"])]
    folder: Option<PathBuf>,

    /// Show the upload history
    #[arg(long, conflicts_with = "clear_history")]
    history: bool,

    /// Number of history entries to show
    #[arg(long, value_name = "N", default_value_t = DEFAULT_HISTORY_LIMIT, requires = "history")]
    limit: usize,

    /// Delete the upload history
    #[arg(long)]
    clear_history: bool,
}

#[derive(Debug, PartialEq)]
enum Action {
    Files(Vec<PathBuf>),
    Folder(PathBuf),
    History(usize),
    ClearHistory,
}

impl Cli {
    fn action(self) -> Option<Action> {
        if self.history {
            Some(Action::History(self.limit))
        } else if self.clear_history {
            Some(Action::ClearHistory)
        } else if let Some(folder) = self.folder {
            Some(Action::Folder(folder))
        } else if !self.files.is_empty() {
            Some(Action::Files(self.files))
        } else {
            None
        }
    }
}

fn print_usage() {
    eprintln!("Usage: mros-upload-service <file1> [file2] [file3] ...");
    eprintln!("       mros-upload-service --folder <folder_path>");
    eprintln!("       mros-upload-service --history [--limit N]");
    eprintln!("       mros-upload-service --clear-history");
}

fn print_report(results: &[BatchResult]) {
    let summary = BatchSummary::from_results(results);
    println!(
        "Upload complete: {}/{} files uploaded successfully",
        summary.successful, summary.total
    );
    for result in results {
        println!("{}", result.report_line());
    }
}

fn history_line(record: &UploadRecord) -> String {
    let when = Local
        .timestamp_opt(record.timestamp as i64, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string());

    format!(
        "{} {} - {} ({}, {})",
        record.status.glyph(),
        record.filename,
        record.download_url.as_deref().unwrap_or("N/A"),
        format_bytes(record.size),
        when
    )
}

fn print_history(records: &[UploadRecord]) {
    if records.is_empty() {
        println!("No upload history found.");
        return;
    }

    println!("Upload History:");
    println!("{}", "-".repeat(80));
    for record in records {
        println!("{}", history_line(record));
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("mros_upload_cli=info,mros_upload_core=warn")
            }),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) if e.kind() == ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            print_usage();
            return ExitCode::FAILURE;
        }
        Err(e) => {
            if let Some(reason) = e.kind().as_str() {
                eprintln!("Error: {}", reason);
            }
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let Some(action) = cli.action() else {
        print_usage();
        return ExitCode::FAILURE;
    };

    let service = match UploadService::from_user_config() {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to start upload service: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match action {
        Action::History(limit) => print_history(&service.get_history(limit)),
        Action::ClearHistory => {
            service.clear_history();
            println!("Upload history cleared.");
        }
        Action::Folder(folder) => {
            println!("Uploading folder: {}", folder.display());
            let results = service.upload_folder(&folder).await;
            print_report(&results);
        }
        Action::Files(files) => {
            println!("Uploading {} file(s)...", files.len());
            let results = service.upload_many(&files).await;
            print_report(&results);
        }
    }

    // Individual upload failures are reported per line, not in the exit code
    ExitCode::SUCCESS
}
