mod commands;
mod samples;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kattis_common::config::KattisEndpoints;
use kattis_engine::config::DEFAULT_TIMEOUT_MS;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "kattis")]
#[command(about = "Kattis helper - Scaffold problem folders and test solutions against the samples", long_about = None)]
struct Cli {
    /// Working directory (defaults to the current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a folder for a problem and download its sample data
    Init {
        /// Problem id (e.g. hello, itu.bits)
        problem: String,

        /// Do not download sample data from the Kattis server
        #[arg(long, default_value = "false")]
        no_download: bool,
    },

    /// Run a solution against every *.in / *.ans pair
    ///
    /// Options go before the program; everything after it is passed to the program.
    Test {
        /// Per-case time limit in milliseconds (0 disables it)
        #[arg(long, env = "KATTIS_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,

        /// Maximum cases run at once (0 runs all cases at once)
        #[arg(short, long, env = "KATTIS_JOBS")]
        jobs: Option<usize>,

        /// Judge only the output, ignoring non-zero exit codes
        #[arg(long, default_value = "false")]
        allow_nonzero_exit: bool,

        /// Where to write diagnostics for failing cases (defaults to --dir)
        #[arg(long, env = "KATTIS_RESULTS_DIR")]
        results_dir: Option<PathBuf>,

        /// Print the session summary as JSON
        #[arg(long, default_value = "false")]
        json: bool,

        /// Program to test
        program: String,

        /// Arguments passed to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Fatal errors (unreadable directory, no processes at all) exit with 2,
/// failing cases with 1
const FATAL_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(FATAL_EXIT)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };

    match cli.command {
        Commands::Init {
            problem,
            no_download,
        } => {
            let endpoints = KattisEndpoints::from_env();
            commands::init_problem(&dir, &problem, no_download, &endpoints).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Test {
            timeout_ms,
            jobs,
            allow_nonzero_exit,
            results_dir,
            json,
            program,
            args,
        } => {
            let options = commands::TestOptions {
                dir,
                results_dir,
                timeout_ms,
                jobs,
                allow_nonzero_exit,
                json,
            };
            let passed = commands::run_tests(&program, args, options).await?;
            Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
