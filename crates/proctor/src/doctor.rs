// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `proctor doctor` command implementation.
//!
//! Runs diagnostic checks against the configured database and oracle so an
//! operator can spot setup problems before the first interview starts.

use std::time::{Duration, Instant};

use proctor_config::model::ProctorConfig;
use proctor_core::types::HealthStatus;
use proctor_core::{OracleAdapter, PluginAdapter, ProctorError};
use proctor_gemini::GeminiOracle;

use crate::commands::open_storage;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(
        name: &'static str,
        status: CheckStatus,
        message: impl Into<String>,
        start: Instant,
    ) -> Self {
        Self {
            name,
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Runs every check. With `probe`, also sends one real prompt to the oracle.
pub async fn run_checks(config: &ProctorConfig, probe: bool) -> Vec<CheckResult> {
    let mut results = vec![check_config(config), check_database(config).await];
    results.push(check_oracle(config, probe).await);
    results
}

/// Prints the report. Returns `true` when no check failed.
pub fn print_report(results: &[CheckResult]) -> bool {
    println!();
    println!("  proctor doctor");
    println!("  {}", "-".repeat(50));

    for result in results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        println!(
            "    {tag} {:<20} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }
    println!();

    let failed = results.iter().filter(|r| r.status == CheckStatus::Fail).count();
    let warned = results.iter().filter(|r| r.status == CheckStatus::Warn).count();
    if failed + warned == 0 {
        println!("  All checks passed.");
    } else {
        let issues = failed + warned;
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
    }
    println!();
    failed == 0
}

fn check_config(config: &ProctorConfig) -> CheckResult {
    let start = Instant::now();
    CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!(
            "valid (model={}, {} min/question)",
            config.gemini.model, config.interview.minutes_per_question
        ),
        start,
    )
}

async fn check_database(config: &ProctorConfig) -> CheckResult {
    let start = Instant::now();
    let path = &config.storage.database_path;
    let existed = std::path::Path::new(path).exists();

    let outcome = async {
        let storage = open_storage(config).await?;
        let health = storage.health_check().await?;
        storage.shutdown().await?;
        Ok::<_, ProctorError>(health)
    }
    .await;

    match outcome {
        Ok(HealthStatus::Healthy) if existed => {
            CheckResult::new("Database", CheckStatus::Pass, format!("connected: {path}"), start)
        }
        Ok(HealthStatus::Healthy) => CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("created new database: {path}"),
            start,
        ),
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new("Database", CheckStatus::Warn, reason, start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            CheckResult::new("Database", CheckStatus::Fail, reason, start)
        }
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_oracle(config: &ProctorConfig, probe: bool) -> CheckResult {
    let start = Instant::now();
    let oracle = match GeminiOracle::new(&config.gemini) {
        Ok(oracle) => oracle,
        Err(e) => return CheckResult::new("Oracle", CheckStatus::Fail, e.to_string(), start),
    };
    if !probe {
        return CheckResult::new(
            "Oracle",
            CheckStatus::Pass,
            format!("API key present (use --probe to call {})", config.gemini.model),
            start,
        );
    }

    match oracle.generate("Reply with the single word OK.").await {
        Ok(reply) if !reply.trim().is_empty() => CheckResult::new(
            "Oracle",
            CheckStatus::Pass,
            format!("{} replied", config.gemini.model),
            start,
        ),
        Ok(_) => CheckResult::new("Oracle", CheckStatus::Warn, "empty reply", start),
        Err(e) => CheckResult::new("Oracle", CheckStatus::Fail, e.to_string(), start),
    }
}
