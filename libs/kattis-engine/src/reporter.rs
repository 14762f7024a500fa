/// Verdict Reporter
///
/// Passing cases get a one-line confirmation. Cases whose program ran to
/// completion but failed get a markdown diagnostic next to the samples,
/// holding everything needed to reproduce the failure by hand.
///
/// Record construction, rendering and persistence are separate steps so the
/// diagnostic format can be tested without running anything.

use crate::error::ReportError;
use chrono::{DateTime, Local};
use kattis_common::naming::diagnostic_file_name;
use kattis_common::types::{CaseId, CasePair, CaseStatus, Invocation, Verdict};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, error, info};

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Everything a diagnostic file says about one failing case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub case: CaseId,
    pub input_name: String,
    pub command_line: String,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub status: CaseStatus,
    pub timestamp: DateTime<Local>,
}

impl DiagnosticRecord {
    pub fn new(invocation: &Invocation, pair: &CasePair, input: String, verdict: &Verdict) -> Self {
        Self {
            case: pair.id.clone(),
            input_name: pair.input_name(),
            command_line: invocation.command_line(),
            input,
            expected: pair.expected_output.clone(),
            actual: verdict.actual_output.clone(),
            stderr: verdict.stderr.clone(),
            exit_code: verdict.exit_code,
            status: verdict.status.clone(),
            timestamp: verdict.timestamp,
        }
    }
}

/// Render a record as markdown
pub fn render_diagnostic(record: &DiagnosticRecord) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# Test failure: {}\n\n", record.input_name));
    doc.push_str(&format!(
        "Failed at {} with verdict **{}**.\n\n",
        record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f %:z"),
        record.status
    ));
    doc.push_str(&format!("Command: `{}`\n\n", record.command_line));
    doc.push_str(&format!("Input file: `{}`\n\n", record.input_name));
    if let Some(code) = record.exit_code {
        doc.push_str(&format!("Exit status: {}\n\n", code));
    }

    push_block(&mut doc, "Input", &record.input);
    push_block(&mut doc, "Expected output", &record.expected);
    push_block(&mut doc, "Actual output", &record.actual);
    if !record.stderr.is_empty() {
        push_block(&mut doc, "Standard error", &record.stderr);
    }

    doc
}

/// Fenced block whose fence is longer than any backtick run in `content`,
/// so the content is reproduced verbatim
fn push_block(doc: &mut String, title: &str, content: &str) {
    let longest_run = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);

    doc.push_str(&format!("## {}\n\n{}\n", title, fence));
    doc.push_str(content);
    if !content.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str(&fence);
    doc.push_str("\n\n");
}

/// Writes diagnostics into one directory without ever replacing a file
#[derive(Debug)]
pub struct DiagnosticWriter {
    dir: PathBuf,
}

impl DiagnosticWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a record, returning where it landed
    ///
    /// The document goes to a temporary file in the results directory and is
    /// then moved under its final name without clobbering. A taken name moves
    /// on to the next `-N` suffix. Either the complete file exists under its
    /// final name or an error is returned.
    pub async fn persist(&self, record: &DiagnosticRecord) -> Result<PathBuf, ReportError> {
        let dir = self.dir.clone();
        let record = record.clone();

        tokio::task::spawn_blocking(move || persist_blocking(&dir, &record))
            .await
            .map_err(|e| ReportError::Write {
                path: self.dir.clone(),
                source: std::io::Error::other(e),
            })?
    }
}

fn persist_blocking(dir: &Path, record: &DiagnosticRecord) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::ResultsDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| ReportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    tmp.write_all(render_diagnostic(record).as_bytes())
        .map_err(|source| ReportError::Write {
            path: tmp.path().to_path_buf(),
            source,
        })?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(diagnostic_file_name(&record.input_name, &record.timestamp, attempt));
        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(case = %record.case, path = %path.display(), "Diagnostic written");
                return Ok(path);
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => tmp = e.file,
            Err(e) => return Err(ReportError::Write { path, source: e.error }),
        }
    }

    Err(ReportError::NameExhausted {
        input: record.input_name.clone(),
        attempts: MAX_NAME_ATTEMPTS,
    })
}

/// What the reporter did with one verdict
#[derive(Debug)]
pub enum ReportOutcome {
    Confirmed,
    Diagnosed(PathBuf),
    Noted,
    InputUnreadable(ReportError),
    WriteFailed(ReportError),
}

/// Prints verdicts and persists diagnostics for failing cases
#[derive(Debug)]
pub struct Reporter {
    writer: DiagnosticWriter,
}

impl Reporter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: DiagnosticWriter::new(results_dir),
        }
    }

    pub fn writer(&self) -> &DiagnosticWriter {
        &self.writer
    }

    /// Report a single verdict
    ///
    /// Each case's report is one `println!`, so concurrent cases never
    /// interleave inside a line.
    pub async fn report(
        &self,
        invocation: &Invocation,
        pair: &CasePair,
        verdict: &Verdict,
    ) -> ReportOutcome {
        let input_name = pair.input_name();

        if verdict.passed() {
            println!("✅ {} passes", input_name);
            return ReportOutcome::Confirmed;
        }

        if !verdict.status.has_diagnostic() {
            println!("❌ {} failed: {}", input_name, verdict.status);
            return ReportOutcome::Noted;
        }

        let input = match fs::read(&pair.input_path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(source) => {
                let e = ReportError::Input {
                    path: pair.input_path.clone(),
                    source,
                };
                error!(case = %pair.id, error = %e, "Failed to re-read input for diagnostic");
                println!(
                    "❌ {} does not pass ({}). ⚠️  I/O error, no diagnostic written: {}",
                    input_name, verdict.status, e
                );
                return ReportOutcome::InputUnreadable(e);
            }
        };
        let record = DiagnosticRecord::new(invocation, pair, input, verdict);

        match self.writer.persist(&record).await {
            Ok(path) => {
                info!(case = %pair.id, path = %path.display(), "Diagnostic persisted");
                println!(
                    "❌ {} does not pass ({}). Details: {}",
                    input_name,
                    verdict.status,
                    path.display()
                );
                ReportOutcome::Diagnosed(path)
            }
            Err(e) => {
                error!(case = %pair.id, error = %e, "Failed to persist diagnostic");
                println!(
                    "❌ {} does not pass ({}). ⚠️  Diagnostic could not be written: {}",
                    input_name, verdict.status, e
                );
                ReportOutcome::WriteFailed(e)
            }
        }
    }

    /// Report a case that never got to run
    pub fn report_unrunnable(&self, case: &CaseId, status: &CaseStatus) {
        println!("❌ case {} failed: {}", case, status);
    }
}
