// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the interview and transcript store traits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use proctor_config::model::StorageConfig;
use proctor_core::traits::{Completion, TurnWrite};
use proctor_core::types::{
    Candidate, CandidateId, InterviewId, InterviewProfile, InterviewSession, QueueEntry,
    SweepReport, TranscriptRecord, Turn,
};
use proctor_core::{
    AdapterType, HealthStatus, InterviewStore, PluginAdapter, ProctorError, TranscriptStore,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// One adapter serves both [`InterviewStore`] and [`TranscriptStore`] so that
/// every write goes through the same single-writer connection. The database is
/// opened on the first call to [`InterviewStore::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, ProctorError> {
        self.db.get().ok_or_else(|| ProctorError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ProctorError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ProctorError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl InterviewStore for SqliteStorage {
    async fn initialize(&self) -> Result<(), ProctorError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ProctorError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ProctorError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Candidates ---

    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<(), ProctorError> {
        queries::candidates::upsert_candidate(self.db()?, candidate).await
    }

    async fn get_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, ProctorError> {
        queries::candidates::get_candidate(self.db()?, id).await
    }

    // --- Interviews ---

    async fn create_interview(&self, session: &InterviewSession) -> Result<(), ProctorError> {
        queries::interviews::create_interview(self.db()?, session).await
    }

    async fn get_interview(
        &self,
        id: &InterviewId,
    ) -> Result<Option<InterviewSession>, ProctorError> {
        queries::interviews::get_interview(self.db()?, id).await
    }

    async fn try_start(
        &self,
        id: &InterviewId,
        candidate: &CandidateId,
    ) -> Result<bool, ProctorError> {
        queries::interviews::try_start(self.db()?, id, candidate).await
    }

    async fn complete_interview(&self, completion: &Completion) -> Result<bool, ProctorError> {
        queries::interviews::complete_interview(self.db()?, completion).await
    }

    async fn cancel_interview(
        &self,
        id: &InterviewId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, ProctorError> {
        queries::interviews::cancel_interview(self.db()?, id, reason, at).await
    }

    async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        grace: chrono::Duration,
        max_job_attempts: u32,
    ) -> Result<SweepReport, ProctorError> {
        queries::interviews::sweep_expired(self.db()?, now, grace, max_job_attempts).await
    }

    // --- Turns ---

    async fn insert_turn(&self, turn: &Turn) -> Result<TurnWrite, ProctorError> {
        queries::turns::insert_turn(self.db()?, turn).await
    }

    async fn get_turn(
        &self,
        interview: &InterviewId,
        turn_id: &str,
    ) -> Result<Option<Turn>, ProctorError> {
        queries::turns::get_turn(self.db()?, interview, turn_id).await
    }

    async fn list_turns(&self, interview: &InterviewId) -> Result<Vec<Turn>, ProctorError> {
        queries::turns::list_turns(self.db()?, interview).await
    }

    // --- Profiles ---

    async fn insert_profile(&self, profile: &InterviewProfile) -> Result<bool, ProctorError> {
        queries::profiles::insert_profile(self.db()?, profile).await
    }

    async fn get_profile(
        &self,
        interview: &InterviewId,
    ) -> Result<Option<InterviewProfile>, ProctorError> {
        queries::profiles::get_profile(self.db()?, interview).await
    }

    // --- Queue ---

    async fn enqueue(
        &self,
        queue_name: &str,
        payload: &str,
        max_attempts: u32,
    ) -> Result<i64, ProctorError> {
        queries::queue::enqueue(self.db()?, queue_name, payload, max_attempts).await
    }

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, ProctorError> {
        queries::queue::dequeue(self.db()?, queue_name).await
    }

    async fn ack(&self, id: i64) -> Result<(), ProctorError> {
        queries::queue::ack(self.db()?, id).await
    }

    async fn fail(&self, id: i64) -> Result<(), ProctorError> {
        queries::queue::fail(self.db()?, id).await
    }
}

#[async_trait]
impl TranscriptStore for SqliteStorage {
    async fn append(
        &self,
        session_key: &str,
        record: &TranscriptRecord,
    ) -> Result<bool, ProctorError> {
        queries::transcripts::append(self.db()?, session_key, record, Utc::now()).await
    }

    async fn read_all(&self, session_key: &str) -> Result<Vec<TranscriptRecord>, ProctorError> {
        queries::transcripts::read_all(self.db()?, session_key, Utc::now()).await
    }

    async fn set_expiry(&self, session_key: &str, ttl: Duration) -> Result<bool, ProctorError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| ProctorError::Validation(format!("transcript ttl out of range: {e}")))?;
        queries::transcripts::set_expiry(self.db()?, session_key, Utc::now() + ttl).await
    }
}
