// Session configuration for the test engine
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// How the candidate's exit status affects its verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Non-zero exit is a runtime error even when the output matches
    #[default]
    Strict,
    /// Only the output is judged
    IgnoreExitCode,
}

/// Everything a test session needs, resolved once by the caller
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding the `*.in` / `*.ans` pairs
    pub test_dir: PathBuf,
    /// Where diagnostics for failing cases are written
    pub results_dir: PathBuf,
    /// Per-case wall clock limit, `None` to wait forever
    pub timeout: Option<Duration>,
    /// Maximum cases in flight, `None` for unbounded fan-out
    pub max_parallel: Option<usize>,
    pub exit_policy: ExitPolicy,
}

impl SessionConfig {
    /// Defaults for a directory: diagnostics next to the samples,
    /// 10s timeout, one case per available CPU
    pub fn new(test_dir: impl Into<PathBuf>) -> Self {
        let test_dir = test_dir.into();
        Self {
            results_dir: test_dir.clone(),
            test_dir,
            timeout: Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
            max_parallel: Some(default_parallelism()),
            exit_policy: ExitPolicy::default(),
        }
    }

    pub fn with_results_dir(mut self, results_dir: impl Into<PathBuf>) -> Self {
        self.results_dir = results_dir.into();
        self
    }

    /// `0` disables the timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        self
    }

    /// `0` means unbounded
    pub fn with_max_parallel(mut self, jobs: usize) -> Self {
        self.max_parallel = (jobs > 0).then_some(jobs);
        self
    }

    pub fn with_exit_policy(mut self, exit_policy: ExitPolicy) -> Self {
        self.exit_policy = exit_policy;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0)
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
