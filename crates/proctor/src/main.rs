// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proctor - adaptive AI interview orchestration engine.
//!
//! Binary entry point: the background worker plus operator commands.

mod commands;
mod doctor;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use proctor_config::model::ProctorConfig;
use proctor_core::{InterviewId, ProctorError};
use serde::Serialize;

/// Proctor - adaptive AI interview orchestration engine.
#[derive(Parser, Debug)]
#[command(name = "proctor", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the profile worker and periodic timeout sweep until signalled.
    Worker,
    /// Cancel no-shows and force-complete abandoned interviews once.
    Sweep,
    /// Synthesize (or show) the profile of a completed interview.
    Profile {
        /// Interview id.
        interview_id: String,
    },
    /// Print the live transcript of an interview as JSON lines.
    Transcript {
        /// Interview id.
        interview_id: String,
    },
    /// Check configuration, database and oracle connectivity.
    Doctor {
        /// Send one real prompt to the oracle.
        #[arg(long)]
        probe: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => proctor_config::load_and_validate_path(path),
        None => proctor_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            proctor_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Option<Commands>, config: &ProctorConfig) -> Result<(), ProctorError> {
    match command {
        Some(Commands::Worker) => commands::worker(config).await,
        Some(Commands::Sweep) => print_json(&commands::sweep(config).await?),
        Some(Commands::Profile { interview_id }) => {
            let id = InterviewId(interview_id);
            print_json(&commands::profile(config, &id).await?)
        }
        Some(Commands::Transcript { interview_id }) => {
            let id = InterviewId(interview_id);
            for record in commands::transcript(config, &id).await? {
                let line = serde_json::to_string(&record)
                    .map_err(|e| ProctorError::Internal(format!("transcript encoding: {e}")))?;
                println!("{line}");
            }
            Ok(())
        }
        Some(Commands::Doctor { probe }) => {
            let results = doctor::run_checks(config, probe).await;
            if doctor::print_report(&results) {
                Ok(())
            } else {
                Err(ProctorError::Config("doctor found failing checks".into()))
            }
        }
        None => {
            println!("proctor: use --help for available commands");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ProctorError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ProctorError::Internal(format!("output encoding: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("proctor={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
