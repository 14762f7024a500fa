// CLI commands: problem scaffolding and test runs
use crate::samples;
use anyhow::{Context, Result};
use kattis_common::config::KattisEndpoints;
use kattis_common::types::{Invocation, SessionSummary};
use kattis_engine::{ExitPolicy, SessionConfig, TestSession};
use std::path::{Path, PathBuf};
use tracing::info;

/// Create `<dir>/<problem>` and fill it with the problem's sample data
///
/// An existing folder is left untouched. A rejected download only warns;
/// the folder is still created.
pub async fn init_problem(
    dir: &Path,
    problem: &str,
    no_download: bool,
    endpoints: &KattisEndpoints,
) -> Result<()> {
    let problem_dir = dir.join(problem);

    match tokio::fs::create_dir(&problem_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            info!(path = %problem_dir.display(), "Problem folder already exists");
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create {}", problem_dir.display()));
        }
    }
    println!("📁 Created {}", problem_dir.display());

    if no_download {
        return Ok(());
    }

    let url = endpoints.samples_url(problem);
    let Some(archive) = samples::download(&url).await? else {
        println!("⚠️  Warning! Could not download sample data. Proceeding without...");
        return Ok(());
    };

    let written = samples::extract(archive, &problem_dir)
        .await
        .with_context(|| format!("Failed to extract samples into {}", problem_dir.display()))?;
    println!("📥 Extracted {} sample files", written.len());

    Ok(())
}

/// Options of the `test` subcommand, resolved by `main`
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub dir: PathBuf,
    pub results_dir: Option<PathBuf>,
    pub timeout_ms: u64,
    pub jobs: Option<usize>,
    pub allow_nonzero_exit: bool,
    pub json: bool,
}

impl TestOptions {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(&self.dir).with_timeout_ms(self.timeout_ms);
        if let Some(results_dir) = &self.results_dir {
            config = config.with_results_dir(results_dir);
        }
        if let Some(jobs) = self.jobs {
            config = config.with_max_parallel(jobs);
        }
        if self.allow_nonzero_exit {
            config = config.with_exit_policy(ExitPolicy::IgnoreExitCode);
        }
        config
    }
}

/// Run the program against every sample; `Ok(true)` when every case passed
pub async fn run_tests(program: &str, args: Vec<String>, options: TestOptions) -> Result<bool> {
    let invocation = Invocation::new(program, args);
    println!("🧪 Testing `{}` in {}", invocation.command_line(), options.dir.display());

    let session = TestSession::new(invocation, options.session_config());
    let summary = session.run().await?;

    print_summary(&summary);
    if options.json {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize session summary")?;
        println!("{}", json);
    }

    Ok(summary.success())
}

fn print_summary(summary: &SessionSummary) {
    println!();
    if summary.total == 0 {
        println!("⚠️  No test cases found (expected *.in / *.ans pairs)");
    } else if summary.success() {
        println!("✅ All {} cases passed", summary.total);
    } else {
        println!(
            "❌ {} of {} cases failed ({} passed)",
            summary.failed, summary.total, summary.passed
        );
    }
}
