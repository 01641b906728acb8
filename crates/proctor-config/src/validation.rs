// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::ProctorConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ProctorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.service.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::invalid(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path must not be empty"));
    }

    if config.gemini.model.trim().is_empty() {
        errors.push(ConfigError::invalid("gemini.model must not be empty"));
    }

    let base_url = config.gemini.base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        errors.push(ConfigError::invalid(format!(
            "gemini.base_url `{base_url}` must be an http(s) URL"
        )));
    }

    if config.gemini.timeout_secs == 0 {
        errors.push(ConfigError::invalid("gemini.timeout_secs must be at least 1"));
    }

    if config.interview.minutes_per_question == 0 {
        errors.push(ConfigError::invalid(
            "interview.minutes_per_question must be at least 1",
        ));
    }

    if config.interview.oracle_timeout_secs == 0 {
        errors.push(ConfigError::invalid(
            "interview.oracle_timeout_secs must be at least 1",
        ));
    }

    if config.interview.opening_question.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "interview.opening_question must not be empty",
        ));
    }

    if config.interview.confirm_message.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "interview.confirm_message must not be empty",
        ));
    }

    if config.worker.poll_interval_secs == 0 {
        errors.push(ConfigError::invalid("worker.poll_interval_secs must be at least 1"));
    }

    if config.worker.max_job_attempts == 0 {
        errors.push(ConfigError::invalid("worker.max_job_attempts must be at least 1"));
    }

    let sweep_grace_secs = u64::from(config.worker.sweep_grace_mins) * 60;
    if config.interview.transcript_ttl_grace_secs <= sweep_grace_secs {
        errors.push(ConfigError::invalid(format!(
            "interview.transcript_ttl_grace_secs ({}) must exceed worker.sweep_grace_mins ({} s)",
            config.interview.transcript_ttl_grace_secs, sweep_grace_secs
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
