// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete engine stack with mock adapters, a
//! temp SQLite database, and an in-process event bus, plus helpers to seed
//! candidates and scheduled interviews.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use proctor_bus::EventBus;
use proctor_config::model::{ProctorConfig, StorageConfig};
use proctor_core::types::{
    Candidate, CandidateId, Experience, InterviewId, InterviewSession, Modality, ResumeProfile,
};
use proctor_core::{InterviewStore, ProctorError};
use proctor_engine::{InterviewEngine, ProfileWorker};
use proctor_storage::SqliteStorage;

use crate::mock_oracle::MockOracle;
use crate::mock_speech::MockSpeech;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    config: ProctorConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            config: ProctorConfig::default(),
        }
    }

    /// Set mock oracle replies.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Use the deterministic rubric when profile replies are malformed.
    pub fn with_rubric_fallback(mut self, enabled: bool) -> Self {
        self.config.profile.rubric_fallback = enabled;
        self
    }

    /// Adjust any configuration value before the stack is built.
    pub fn configure(mut self, f: impl FnOnce(&mut ProctorConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ProctorError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ProctorError::Storage { source: e.into() })?;
        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let oracle = Arc::new(if self.responses.is_empty() {
            MockOracle::new()
        } else {
            MockOracle::with_responses(self.responses)
        });
        let speech = Arc::new(MockSpeech::new());
        let bus = Arc::new(EventBus::default());

        let engine = InterviewEngine::new(
            storage.clone(),
            storage.clone(),
            oracle.clone(),
            bus.clone(),
            &config,
        )
        .with_speech(speech.clone());

        Ok(TestHarness {
            oracle,
            speech,
            storage,
            bus,
            engine: Arc::new(engine),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// Ids of a seeded candidate and their interview.
#[derive(Debug, Clone)]
pub struct SeededInterview {
    pub candidate_id: CandidateId,
    pub interview_id: InterviewId,
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock text oracle.
    pub oracle: Arc<MockOracle>,
    /// The mock speech adapter attached to the engine.
    pub speech: Arc<MockSpeech>,
    /// SQLite storage (temp DB, cleaned up on drop). Serves both the
    /// interview store and the transcript store.
    pub storage: Arc<SqliteStorage>,
    /// Event bus the engine publishes to.
    pub bus: Arc<EventBus>,
    /// The engine under test.
    pub engine: Arc<InterviewEngine>,
    /// Configuration the stack was built with.
    pub config: ProctorConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Seeds a candidate with a small resume and a PENDING interview starting now.
    pub async fn seed_interview(
        &self,
        modality: Modality,
        duration_min: u32,
    ) -> Result<SeededInterview, ProctorError> {
        self.seed_interview_at(Utc::now(), modality, duration_min).await
    }

    /// Seeds a candidate and a PENDING interview scheduled at `scheduled_at`.
    pub async fn seed_interview_at(
        &self,
        scheduled_at: DateTime<Utc>,
        modality: Modality,
        duration_min: u32,
    ) -> Result<SeededInterview, ProctorError> {
        let candidate_id = CandidateId(format!("cand-{}", uuid::Uuid::new_v4()));
        let interview_id = InterviewId(format!("iv-{}", uuid::Uuid::new_v4()));
        self.storage.upsert_candidate(&sample_candidate(&candidate_id)).await?;
        self.storage
            .create_interview(&InterviewSession::scheduled(
                interview_id.clone(),
                candidate_id.clone(),
                scheduled_at,
                duration_min,
                modality,
            ))
            .await?;
        Ok(SeededInterview {
            candidate_id,
            interview_id,
        })
    }

    /// Seeds and starts a TEXT interview, discarding the opening question.
    pub async fn started_text_interview(
        &self,
        duration_min: u32,
    ) -> Result<SeededInterview, ProctorError> {
        let seeded = self.seed_interview(Modality::Text, duration_min).await?;
        self.engine
            .start_session(&seeded.candidate_id, &seeded.interview_id)
            .await?;
        Ok(seeded)
    }

    /// A profile worker over this harness's engine.
    pub fn worker(&self) -> ProfileWorker {
        ProfileWorker::new(self.engine.clone(), &self.config.worker)
    }
}

fn sample_candidate(id: &CandidateId) -> Candidate {
    Candidate {
        candidate_id: id.clone(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        resume: Some(ResumeProfile {
            profile_title: Some("Backend Engineer".into()),
            technical_skills: serde_json::json!(["Rust", "Tokio", "PostgreSQL"]),
            experience_summary: vec![Experience {
                dates: "2021-2025".into(),
                title: "Software Engineer".into(),
                company: "Analytical Engines Ltd".into(),
                location: "London".into(),
                responsibilities: vec!["Built the billing pipeline".into()],
            }],
            ..ResumeProfile::default()
        }),
    }
}
