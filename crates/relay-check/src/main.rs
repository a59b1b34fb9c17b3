//! Relay replay checker
//!
//! # Usage
//!
//! ```bash
//! # Run every built-in check
//! relay-check check
//!
//! # Run one check with debug logging
//! relay-check --log-level debug check --only pending-replay
//!
//! # Compare relay and model on 10k seeded random operations
//! relay-check soak --seed 42 --operations 10000
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use relay_check::{CheckError, check_names, run_checks, soak};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "relay-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify pending-message replay and live dispatch")]
struct Cli {
    /// Log level, used when RUST_LOG is not set
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LevelArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the built-in replay scenarios
    Check {
        /// Run only the check with this name
        #[arg(long)]
        only: Option<String>,

        /// List check names and exit
        #[arg(long)]
        list: bool,
    },
    /// Run a seeded random workload against the reference model
    Soak {
        /// Workload seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of operations to generate
        #[arg(long, default_value = "10000")]
        operations: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelArg {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LevelArg {
    fn directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

fn run(command: Command) -> Result<(), CheckError> {
    match command {
        Command::Check { list: true, .. } => {
            for name in check_names() {
                info!(check = %name);
            }
            Ok(())
        },
        Command::Check { only, list: false } => {
            let passed = run_checks(only.as_deref())?;
            info!(passed, "all checks passed");
            Ok(())
        },
        Command::Soak { seed, operations } => soak(seed, operations),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.directive()));
    fmt().with_env_filter(filter).with_target(false).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "relay check failed");
            ExitCode::FAILURE
        },
    }
}
