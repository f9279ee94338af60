use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::engine::{Engine, FixResult, SkippedFix};
use crate::error::SnapfixError;
use crate::format::CommandFormatter;
use crate::policy::Policy;
use crate::request::{FixRequest, parse_fix_batch};
use crate::write::{PendingWrite, write_fixed_files};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[arg(
        value_name = "REQUESTS",
        help = "Path to fix-request JSON; if omitted, read it from stdin"
    )]
    pub input: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Configuration file (defaults to ./snapfix.toml when present)"
    )]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Write updated files in place")]
    pub write: bool,
    #[arg(long, help = "Skip the configured formatter")]
    pub no_format: bool,
    #[arg(long, help = "Include updated file contents in output")]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
pub struct ApplySummary {
    pub total_fixed: usize,
    pub files_changed: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: String,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyCliResponse {
    pub summary: ApplySummary,
    pub files: Vec<FileReport>,
    pub skipped: Vec<SkippedFix>,
}

pub fn run_apply(args: ApplyArgs) -> Result<ApplyCliResponse, SnapfixError> {
    let requests = match &args.input {
        Some(path) => read_requests_from_file(path)?,
        None => read_requests_from_stdin()?,
    };
    let policy = load_policy(args.config.as_deref())?;

    let formatter = if args.no_format {
        None
    } else {
        policy.formatter.as_ref().map(CommandFormatter::from_config)
    };
    let mut engine = Engine::new(policy);
    if let Some(formatter) = formatter {
        engine = engine.with_formatter(formatter);
    }

    let result = engine.apply_fixes(&requests)?;
    let files = emit_files(&result, args.write, args.verbose)?;

    info!(
        total_fixed = result.total_fixed,
        files_changed = files.len(),
        skipped = result.skipped.len(),
        "apply finished"
    );

    Ok(ApplyCliResponse {
        summary: ApplySummary {
            total_fixed: result.total_fixed,
            files_changed: files.len(),
            skipped: result.skipped.len(),
        },
        files,
        skipped: result.skipped,
    })
}

fn emit_files(
    result: &FixResult,
    write: bool,
    verbose: bool,
) -> Result<Vec<FileReport>, SnapfixError> {
    if write {
        let pending: Vec<PendingWrite<'_>> = result
            .updated_text_by_file
            .iter()
            .map(|(file, text)| PendingWrite {
                path: file,
                contents: text,
                expected_hash: result.source_hash_by_file.get(file).map(String::as_str),
            })
            .collect();
        write_fixed_files(&pending)?;
    }

    Ok(result
        .updated_text_by_file
        .iter()
        .map(|(file, text)| FileReport {
            file: file.display().to_string(),
            written: write,
            text: verbose.then(|| text.clone()),
        })
        .collect())
}

fn load_policy(config: Option<&Path>) -> Result<Policy, SnapfixError> {
    match config {
        Some(path) => Policy::load(path),
        None => {
            let current_dir =
                env::current_dir().map_err(|error| SnapfixError::io(Path::new("."), error))?;
            Policy::discover(&current_dir)
        }
    }
}

fn read_requests_from_file(path: &Path) -> Result<Vec<FixRequest>, SnapfixError> {
    let content = fs::read_to_string(path).map_err(|error| SnapfixError::io(path, error))?;
    parse_fix_batch(&content)
}

fn read_requests_from_stdin() -> Result<Vec<FixRequest>, SnapfixError> {
    let mut request_body = String::new();
    std::io::stdin()
        .read_to_string(&mut request_body)
        .map_err(|error| SnapfixError::StdinRead { source: error })?;

    parse_fix_batch(&request_body)
}
