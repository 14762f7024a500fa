/// Verdict Evaluator - Judging Logic
///
/// **Core Responsibility:**
/// Compare raw execution outputs against expected answers and assign a terminal status.
///
/// **Critical Properties:**
/// - Knows nothing about processes
/// - Pure function: (execution output, expected answer, policy) → status
///
/// **Comparison Rules:**
/// - Exact text equality, byte for byte
/// - No trimming, no whitespace folding, no line-ending normalisation
/// - A missing or extra trailing newline is a mismatch
///
/// **Priority:**
/// 1. Timeout
/// 2. Non-zero exit (under [`ExitPolicy::Strict`])
/// 3. Output comparison

use crate::config::ExitPolicy;
use crate::engine::ExecutionOutput;
use kattis_common::types::{CasePair, CaseStatus, SessionSummary, Verdict};

/// Judge a single execution
pub fn evaluate(output: &ExecutionOutput, pair: &CasePair, policy: ExitPolicy) -> CaseStatus {
    if output.timed_out {
        return CaseStatus::TimedOut {
            limit_ms: output.limit_ms.unwrap_or(output.execution_time_ms),
        };
    }

    if policy == ExitPolicy::Strict && output.exit_code != Some(0) {
        return CaseStatus::RuntimeError {
            exit_code: output.exit_code,
        };
    }

    if output.stdout == pair.expected_output {
        CaseStatus::Passed
    } else {
        CaseStatus::Mismatched
    }
}

/// Count passes and failures across every verdict of a session
///
/// Verdicts are ordered by case id so the summary is stable regardless of
/// the order cases finished in.
pub fn summarize(mut verdicts: Vec<Verdict>) -> SessionSummary {
    verdicts.sort_by(|a, b| a.case.cmp(&b.case));

    let passed = verdicts.iter().filter(|v| v.passed()).count();
    let total = verdicts.len();

    SessionSummary {
        total,
        passed,
        failed: total - passed,
        verdicts,
    }
}
