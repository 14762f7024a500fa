/// Test Session - High-Level Orchestration
///
/// **Responsibility:**
/// Discover the samples, run every case concurrently, report and aggregate.
///
/// **Architecture:**
/// 1. Discovery scans the test directory once (discovery.rs)
/// 2. One task per case runs the candidate (engine.rs)
/// 3. The Evaluator judges each output (evaluator.rs)
/// 4. The Reporter prints and persists each verdict (reporter.rs)
/// 5. All tasks are joined and summarised
///
/// A failing case never cancels its siblings. Concurrency is capped by a
/// semaphore sized from [`SessionConfig::max_parallel`].

use crate::config::{ExitPolicy, SessionConfig};
use crate::discovery::{self, Discovery};
use crate::engine::CaseRunner;
use crate::error::ExecutionError;
use crate::evaluator;
use crate::reporter::{ReportOutcome, Reporter};
use anyhow::{bail, Context, Result};
use chrono::Local;
use kattis_common::types::{CaseId, CasePair, CaseStatus, Invocation, SessionSummary, Verdict};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// What a case task hands back to the session
struct CaseReport {
    verdict: Verdict,
    exhausted: bool,
}

/// One run of the engine over a sample directory
pub struct TestSession {
    invocation: Arc<Invocation>,
    config: SessionConfig,
    reporter: Arc<Reporter>,
}

impl TestSession {
    pub fn new(invocation: Invocation, config: SessionConfig) -> Self {
        let reporter = Arc::new(Reporter::new(config.results_dir.clone()));
        Self {
            invocation: Arc::new(invocation),
            config,
            reporter,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run every discovered case and wait for all of them
    ///
    /// Only an unreadable test directory, or the OS refusing to start any
    /// process at all, makes this return an error.
    #[instrument(skip(self), fields(program = %self.invocation.program, dir = %self.config.test_dir.display()))]
    pub async fn run(&self) -> Result<SessionSummary> {
        debug!("Discovering cases");
        let Discovery { pairs, failures } = discovery::discover(&self.config.test_dir)
            .with_context(|| {
                format!(
                    "Failed to discover test cases in {}",
                    self.config.test_dir.display()
                )
            })?;

        let mut verdicts = Vec::with_capacity(pairs.len() + failures.len());
        for failure in failures {
            let status = CaseStatus::DiscoveryError {
                reason: failure.reason.to_string(),
            };
            self.reporter.report_unrunnable(&failure.case, &status);
            verdicts.push(Verdict::without_output(failure.case, status));
        }

        if pairs.is_empty() {
            warn!("No runnable test cases found");
            return Ok(evaluator::summarize(verdicts));
        }

        info!(
            cases = pairs.len(),
            max_parallel = ?self.config.max_parallel,
            timeout_ms = self.config.timeout_ms(),
            "Running cases"
        );

        let limiter = self.config.max_parallel.map(|n| Arc::new(Semaphore::new(n)));
        let runner = CaseRunner::new(self.invocation.clone(), self.config.timeout);
        let attempted = pairs.len();
        let mut pending: BTreeSet<CaseId> = pairs.iter().map(|p| p.id.clone()).collect();

        let mut tasks = JoinSet::new();
        for pair in pairs {
            let runner = runner.clone();
            let reporter = self.reporter.clone();
            let limiter = limiter.clone();
            let exit_policy = self.config.exit_policy;
            let case = pair.id.clone();

            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let report = run_case(&runner, &reporter, &pair, exit_policy).await;
                (case, report)
            });
        }

        debug!(in_flight = tasks.len(), "Waiting for cases");
        let mut exhausted = 0usize;
        let mut lost = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((case, report)) => {
                    pending.remove(&case);
                    if report.exhausted {
                        exhausted += 1;
                    }
                    verdicts.push(report.verdict);
                }
                Err(e) => {
                    error!(error = %e, "Case task did not complete");
                    lost.push(if e.is_panic() { "case task panicked" } else { "case task was cancelled" });
                }
            }
        }

        for verdict in aborted_verdicts(pending, lost) {
            self.reporter.report_unrunnable(&verdict.case, &verdict.status);
            verdicts.push(verdict);
        }

        if exhausted == attempted {
            bail!(
                "Could not start '{}' for any of the {} cases: the system refused to create processes",
                self.invocation.program,
                attempted
            );
        }

        debug!("Aggregating verdicts");
        let summary = evaluator::summarize(verdicts);
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            "Session complete"
        );
        Ok(summary)
    }
}

/// Verdicts for tasks that died without handing back their case
///
/// A dead task never returns its id, so whatever is still pending is theirs.
fn aborted_verdicts(pending: BTreeSet<CaseId>, lost: Vec<&'static str>) -> Vec<Verdict> {
    pending
        .into_iter()
        .zip(lost)
        .map(|(case, reason)| {
            Verdict::without_output(
                case,
                CaseStatus::Aborted {
                    reason: reason.to_string(),
                },
            )
        })
        .collect()
}

/// Run, judge and report one case; never fails, every outcome is a verdict
async fn run_case(
    runner: &CaseRunner,
    reporter: &Reporter,
    pair: &CasePair,
    exit_policy: ExitPolicy,
) -> CaseReport {
    debug!(case = %pair.id, "Case running");

    let mut exhausted = false;
    let mut verdict = match runner.run(pair).await {
        Ok(output) => {
            let status = evaluator::evaluate(&output, pair, exit_policy);
            Verdict {
                case: pair.id.clone(),
                status,
                actual_output: output.stdout,
                stderr: output.stderr,
                exit_code: output.exit_code,
                execution_time_ms: output.execution_time_ms,
                timestamp: Local::now(),
                diagnostic: None,
            }
        }
        Err(e) => {
            warn!(case = %pair.id, error = %e, "Case could not be executed");
            let status = match &e {
                ExecutionError::Input { .. } | ExecutionError::Wait { .. } => {
                    CaseStatus::IoError { reason: e.to_string() }
                }
                ExecutionError::ResourceExhausted { .. } => {
                    exhausted = true;
                    CaseStatus::LaunchError { reason: e.to_string() }
                }
                ExecutionError::Launch { .. } => CaseStatus::LaunchError { reason: e.to_string() },
            };
            Verdict::without_output(pair.id.clone(), status)
        }
    };

    info!(
        case = %pair.id,
        status = verdict.status.label(),
        execution_ms = verdict.execution_time_ms,
        "Case finished"
    );

    match reporter.report(runner.invocation(), pair, &verdict).await {
        ReportOutcome::Diagnosed(path) => verdict.diagnostic = Some(path),
        ReportOutcome::InputUnreadable(e) | ReportOutcome::WriteFailed(e) => {
            warn!(case = %pair.id, error = %e, "Verdict kept without diagnostic");
        }
        ReportOutcome::Confirmed | ReportOutcome::Noted => {}
    }

    CaseReport { verdict, exhausted }
}
