// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Proctor interview engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error instead of a silently ignored setting.

use serde::{Deserialize, Serialize};

/// Top-level Proctor configuration.
///
/// Every section is optional and falls back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProctorConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Gemini oracle settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Interview pacing and oracle call behavior.
    #[serde(default)]
    pub interview: InterviewConfig,

    /// Post-interview profile synthesis.
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Background profile worker and timeout sweep.
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "proctor".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Gemini `generateContent` configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient (429/500/503) response.
    #[serde(default = "default_gemini_max_retries")]
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_gemini_timeout_secs(),
            max_retries: default_gemini_max_retries(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_timeout_secs() -> u64 {
    60
}

fn default_gemini_max_retries() -> u32 {
    1
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("proctor").join("proctor.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("proctor.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Interview pacing and oracle call behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InterviewConfig {
    /// Opening question template. `{first_name}` is replaced with the
    /// candidate's first name.
    #[serde(default = "default_opening_question")]
    pub opening_question: String,

    /// Expected minutes per question, used by the section planner.
    #[serde(default = "default_minutes_per_question")]
    pub minutes_per_question: u32,

    /// Re-asks allowed when the oracle repeats an earlier question.
    #[serde(default = "default_novelty_retries")]
    pub novelty_retries: u32,

    /// Clarifying prompt used when the classifier asks to confirm without a message.
    #[serde(default = "default_confirm_message")]
    pub confirm_message: String,

    /// Added to the session duration when setting the transcript TTL.
    ///
    /// Must outlast `worker.sweep_grace_mins` so the sweep can still replay
    /// an abandoned voice transcript.
    #[serde(default = "default_transcript_ttl_grace_secs")]
    pub transcript_ttl_grace_secs: u64,

    /// Upper bound on a single oracle call.
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            opening_question: default_opening_question(),
            minutes_per_question: default_minutes_per_question(),
            novelty_retries: default_novelty_retries(),
            confirm_message: default_confirm_message(),
            transcript_ttl_grace_secs: default_transcript_ttl_grace_secs(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
        }
    }
}

fn default_opening_question() -> String {
    "Hi {first_name}, welcome! To get started, could you briefly introduce yourself \
     and walk me through your background?"
        .to_string()
}

fn default_minutes_per_question() -> u32 {
    3
}

fn default_novelty_retries() -> u32 {
    2
}

fn default_confirm_message() -> String {
    "Would you like to skip this question and move on to the next one?".to_string()
}

fn default_transcript_ttl_grace_secs() -> u64 {
    1800
}

fn default_oracle_timeout_secs() -> u64 {
    30
}

/// Profile synthesis configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Score with the deterministic rubric when oracle output is malformed.
    #[serde(default)]
    pub rubric_fallback: bool,
}

/// Background worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// How often the worker polls the profile queue when no event arrives.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How often the worker runs the timeout sweep. `0` disables it.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Attempts before a profile job is marked failed.
    #[serde(default = "default_max_job_attempts")]
    pub max_job_attempts: u32,

    /// Minutes past the scheduled window before an ONGOING session is force-completed.
    #[serde(default = "default_sweep_grace_mins")]
    pub sweep_grace_mins: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_job_attempts: default_max_job_attempts(),
            sweep_grace_mins: default_sweep_grace_mins(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_max_job_attempts() -> u32 {
    3
}

fn default_sweep_grace_mins() -> u32 {
    10
}
