use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of a test case, taken from the stem of its answer file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sample: the input fed to the program and the answer it must print
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePair {
    pub id: CaseId,
    pub input_path: PathBuf,
    pub answer_path: PathBuf,
    pub expected_output: String,
}

impl CasePair {
    /// File name of the input, used in reports and artifact names
    pub fn input_name(&self) -> String {
        self.input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.in", self.id))
    }
}

/// The candidate program and the arguments it is started with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Human-readable command line: program and arguments joined by spaces
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Terminal state of a single case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Mismatched,
    RuntimeError { exit_code: Option<i32> },
    TimedOut { limit_ms: u64 },
    LaunchError { reason: String },
    IoError { reason: String },
    DiscoveryError { reason: String },
    /// The case's task died before producing a verdict
    Aborted { reason: String },
}

impl CaseStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, CaseStatus::Passed)
    }

    /// Whether the program ran far enough to produce output worth archiving
    pub fn has_diagnostic(&self) -> bool {
        matches!(self, CaseStatus::Mismatched | CaseStatus::RuntimeError { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Passed => "passed",
            CaseStatus::Mismatched => "wrong answer",
            CaseStatus::RuntimeError { .. } => "runtime error",
            CaseStatus::TimedOut { .. } => "timed out",
            CaseStatus::LaunchError { .. } => "launch error",
            CaseStatus::IoError { .. } => "I/O error",
            CaseStatus::DiscoveryError { .. } => "discovery error",
            CaseStatus::Aborted { .. } => "aborted",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseStatus::RuntimeError { exit_code: Some(code) } => {
                write!(f, "{} (exit code {})", self.label(), code)
            }
            CaseStatus::RuntimeError { exit_code: None } => {
                write!(f, "{} (killed by signal)", self.label())
            }
            CaseStatus::TimedOut { limit_ms } => write!(f, "{} after {}ms", self.label(), limit_ms),
            CaseStatus::LaunchError { reason }
            | CaseStatus::IoError { reason }
            | CaseStatus::DiscoveryError { reason }
            | CaseStatus::Aborted { reason } => write!(f, "{}: {}", self.label(), reason),
            _ => f.write_str(self.label()),
        }
    }
}

/// Outcome of running one case, produced exactly once by its runner task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub case: CaseId,
    pub status: CaseStatus,
    pub actual_output: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<PathBuf>,
}

impl Verdict {
    /// Verdict for a case that never produced any output
    pub fn without_output(case: CaseId, status: CaseStatus) -> Self {
        Self {
            case,
            status,
            actual_output: String::new(),
            stderr: String::new(),
            exit_code: None,
            execution_time_ms: 0,
            timestamp: Local::now(),
            diagnostic: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.status.is_pass()
    }
}

/// Aggregate of every verdict in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub verdicts: Vec<Verdict>,
}

impl SessionSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn verdict(&self, case: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.case.as_str() == case)
    }
}
