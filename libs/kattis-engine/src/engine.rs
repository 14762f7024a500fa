/// Case Runner - Executes the Candidate Program for One Case
///
/// **Core Responsibility:**
/// Start the candidate with the case's input file on stdin and capture what it prints.
///
/// **Boundary:**
/// - Runner knows HOW to execute (process, stdin binding, timeout)
/// - Runner does NOT compare outputs
/// - Runner returns raw outputs for the Evaluator to judge
///
/// **Resource Rules:**
/// - Every case opens its own input handle and gets its own process and buffers
/// - stdout and stderr are drained while waiting, so nothing is lost at exit
/// - The child is killed when its future is dropped (timeout, task abort, panic)

use crate::error::ExecutionError;
use kattis_common::types::{CasePair, Invocation};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Raw result of one execution
/// Produced by CaseRunner, consumed by the Evaluator
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal or timed out
    pub exit_code: Option<i32>,
    pub execution_time_ms: u64,
    pub timed_out: bool,
    /// Time limit the run was held to, `None` when unlimited
    pub limit_ms: Option<u64>,
}

impl ExecutionOutput {
    pub fn exited_cleanly(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Runs the shared invocation against individual cases
#[derive(Debug, Clone)]
pub struct CaseRunner {
    invocation: Arc<Invocation>,
    timeout: Option<Duration>,
}

impl CaseRunner {
    pub fn new(invocation: Arc<Invocation>, timeout: Option<Duration>) -> Self {
        Self {
            invocation,
            timeout,
        }
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Execute the invocation with `pair`'s input file bound to stdin
    ///
    /// A non-zero exit status is not an error here; it is reported in
    /// [`ExecutionOutput::exit_code`] for the Evaluator to judge.
    pub async fn run(&self, pair: &CasePair) -> Result<ExecutionOutput, ExecutionError> {
        let input = tokio::fs::File::open(&pair.input_path)
            .await
            .map_err(|source| ExecutionError::Input {
                path: pair.input_path.clone(),
                source,
            })?
            .into_std()
            .await;

        let program = &self.invocation.program;
        let limit_ms = self.timeout.map(|t| t.as_millis() as u64);
        let child = Command::new(program)
            .args(&self.invocation.args)
            .stdin(Stdio::from(input))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::from_spawn(program, source))?;

        let start = Instant::now();
        let collected = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output()).await,
            None => Ok(child.wait_with_output().await),
        };
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let output = match collected {
            Ok(result) => result.map_err(|source| ExecutionError::Wait {
                program: program.clone(),
                source,
            })?,
            Err(_) => {
                // The wait future owned the child; dropping it sent SIGKILL.
                warn!(
                    case = %pair.id,
                    limit_ms = limit_ms.unwrap_or_default(),
                    "Candidate timed out, process killed"
                );
                return Ok(ExecutionOutput {
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: None,
                    execution_time_ms,
                    timed_out: true,
                    limit_ms,
                });
            }
        };

        let exit_code = output.status.code();
        debug!(
            case = %pair.id,
            exit_code = ?exit_code,
            execution_ms = execution_time_ms,
            stdout_bytes = output.stdout.len(),
            "Candidate finished"
        );

        Ok(ExecutionOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
            execution_time_ms,
            timed_out: false,
            limit_ms,
        })
    }
}
