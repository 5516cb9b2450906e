//! CLI entry point.
//!
//! # Responsibility
//! - Smoke-probe `coursekit_core` linkage (`ping`, `version`).
//! - Run the content pipeline on local files (`render`, `sanitize`,
//!   `validate`) with deterministic stdout output.

use clap::{Parser, Subcommand};
use coursekit_core::{render_with_highlights, sanitize, validate, Highlight};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "coursekit - course content engine tools", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Check that the core library is linked
    Ping,
    /// Print the core library version
    Version,
    /// Format topic content to HTML, optionally applying highlights
    Render {
        /// Raw topic content file
        content: PathBuf,

        /// JSON array of highlights captured against the content
        highlights: Option<PathBuf>,
    },
    /// Print a sanitized copy of an HTML fragment
    Sanitize {
        /// HTML fragment file
        html: PathBuf,
    },
    /// Report tag balance problems; exits with 2 when any are found
    Validate {
        /// HTML fragment file
        html: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("coursekit: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, String> {
    match command {
        Commands::Ping => {
            println!("coursekit_core ping={}", coursekit_core::ping());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("coursekit_core version={}", coursekit_core::core_version());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Render {
            content,
            highlights,
        } => render(&content, highlights.as_deref()),
        Commands::Sanitize { html } => {
            print!("{}", sanitize(&read_file(&html)?));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { html } => {
            let report = validate(&read_file(&html)?);
            if report.is_valid() {
                println!("valid");
                return Ok(ExitCode::SUCCESS);
            }
            for message in report.messages() {
                println!("{message}");
            }
            Ok(ExitCode::from(2))
        }
    }
}

fn render(content_path: &Path, highlights_path: Option<&Path>) -> Result<ExitCode, String> {
    let content = read_file(content_path)?;
    let highlights: Vec<Highlight> = match highlights_path {
        Some(path) => serde_json::from_str(&read_file(path)?).map_err(|err| {
            format!("invalid highlights file `{}`: {err}", path.display())
        })?,
        None => Vec::new(),
    };

    let rendered = render_with_highlights(&content, &highlights);
    println!("{}", rendered.html);
    if !rendered.skipped.is_empty() {
        eprintln!("skipped {} highlight(s)", rendered.skipped.len());
    }
    Ok(ExitCode::SUCCESS)
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))
}
