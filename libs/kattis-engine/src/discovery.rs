/// Sample discovery
///
/// Every `*.ans` file in the test directory is one case. Its input is the
/// `*.in` file with the same stem. Problems with a single answer file never
/// stop the others from running; they come back as [`DiscoveryFailure`]s.

use crate::error::DiscoveryError;
use kattis_common::naming::{input_file_name, is_answer_extension};
use kattis_common::types::{CaseId, CasePair};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Why an answer file did not become a runnable case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    MissingInput { expected: PathBuf },
    UnreadableAnswer { message: String },
    DuplicateId { files: Vec<PathBuf> },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingInput { expected } => {
                write!(f, "no input file {}", expected.display())
            }
            FailureReason::UnreadableAnswer { message } => {
                write!(f, "cannot read answer file: {}", message)
            }
            FailureReason::DuplicateId { files } => {
                let names: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
                write!(f, "several answer files share this id: {}", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFailure {
    pub case: CaseId,
    pub reason: FailureReason,
}

/// Result of scanning a directory, sorted by case id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub pairs: Vec<CasePair>,
    pub failures: Vec<DiscoveryFailure>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len() + self.failures.len()
    }
}

/// Scan `dir` for answer files and pair each with its input file
pub fn discover(dir: &Path) -> Result<Discovery, DiscoveryError> {
    let unreadable = |source| DiscoveryError::UnreadableDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut by_id: BTreeMap<CaseId, Vec<PathBuf>> = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if !path.is_file() {
            continue;
        }
        let is_answer = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(is_answer_extension);
        if !is_answer {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        by_id.entry(CaseId::new(stem)).or_default().push(path);
    }

    let mut discovery = Discovery::default();
    for (id, mut answers) in by_id {
        if answers.len() > 1 {
            answers.sort();
            warn!(case = %id, count = answers.len(), "Ambiguous case id");
            discovery.failures.push(DiscoveryFailure {
                case: id,
                reason: FailureReason::DuplicateId { files: answers },
            });
            continue;
        }

        let answer_path = answers.remove(0);
        match pair_case(dir, id.clone(), answer_path) {
            Ok(pair) => {
                debug!(case = %pair.id, input = %pair.input_path.display(), "Discovered case");
                discovery.pairs.push(pair);
            }
            Err(reason) => {
                warn!(case = %id, reason = %reason, "Skipping case");
                discovery.failures.push(DiscoveryFailure { case: id, reason });
            }
        }
    }

    Ok(discovery)
}

fn pair_case(dir: &Path, id: CaseId, answer_path: PathBuf) -> Result<CasePair, FailureReason> {
    let input_path = dir.join(input_file_name(id.as_str()));
    if !input_path.is_file() {
        return Err(FailureReason::MissingInput {
            expected: input_path,
        });
    }

    let expected_output =
        fs::read_to_string(&answer_path).map_err(|e| FailureReason::UnreadableAnswer {
            message: e.to_string(),
        })?;

    Ok(CasePair {
        id,
        input_path,
        answer_path,
        expected_output,
    })
}
