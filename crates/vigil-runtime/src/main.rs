//! Vigil binary.
//!
//! # Usage
//!
//! ```bash
//! # 5 students, a 2-seat room, 3 inspections
//! vigil 5 2 3
//!
//! # Same run on the binary-gate coordinator, with a different seed
//! vigil 5 2 3 --protocol gates --seed 42
//! ```
//!
//! Bad arguments print a usage message to stderr and exit with status 1.

use std::{process::ExitCode, time::Duration};

use clap::{CommandFactory, Parser, ValueEnum, builder::RangedU64ValueParser, error::ErrorKind};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use vigil_core::{DEFAULT_SEED, Protocol, RunConfig, TimingConfig};
use vigil_runtime::{Runtime, SystemEnv};

/// Coordinator implementation
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProtocolArg {
    /// Mutex and condition variables
    Condvar,
    /// Three binary gates
    Gates,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Condvar => Self::Condvar,
            ProtocolArg::Gates => Self::Gates,
        }
    }
}

/// Room guard and students simulation
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "A guard inspects a shared room while students come and go")]
#[command(version)]
struct Args {
    /// Number of student threads
    num_students: usize,

    /// Maximum number of students in the room at once
    #[arg(value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    capacity: usize,

    /// Number of inspections the guard makes before the run ends
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    num_checks: u32,

    /// Base seed for the actors' random activity durations
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Shortest activity, in milliseconds
    #[arg(long, default_value_t = 20)]
    min_sleep_ms: u64,

    /// Longest student activity, in milliseconds
    #[arg(long, default_value_t = 100)]
    max_sleep_ms: u64,

    /// Coordinator implementation
    #[arg(long, value_enum, default_value = "condvar")]
    protocol: ProtocolArg,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            num_students: self.num_students,
            capacity: self.capacity,
            num_checks: self.num_checks,
            seed: self.seed,
            protocol: self.protocol.into(),
            timing: TimingConfig {
                min_sleep: Duration::from_millis(self.min_sleep_ms),
                max_sleep: Duration::from_millis(self.max_sleep_ms),
            },
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::from(1) } else { ExitCode::SUCCESS };
        },
    };

    let config = args.run_config();
    if let Err(e) = config.validate() {
        let _ = Args::command().error(ErrorKind::ValueValidation, e).print();
        return ExitCode::from(1);
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer().with_thread_names(true)).with(filter).init();

    match Runtime::new(config, SystemEnv::new()).and_then(Runtime::run) {
        Ok(report) => {
            for (index, visits) in report.visits.iter().enumerate() {
                tracing::info!(student = index + 1, visits, "student summary");
            }
            tracing::info!(
                protocol = %report.protocol,
                inspections = report.inspections,
                total_visits = report.total_visits(),
                "guard done, all students stopped"
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::from(2)
        },
    }
}
