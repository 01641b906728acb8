// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations and runtime wiring.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use proctor_bus::EventBus;
use proctor_config::model::ProctorConfig;
use proctor_core::types::{InterviewProfile, SweepReport, TranscriptRecord};
use proctor_core::{InterviewId, InterviewStore, PluginAdapter, ProctorError, TranscriptStore};
use proctor_engine::{InterviewEngine, ProfileWorker};
use proctor_gemini::GeminiOracle;
use proctor_storage::SqliteStorage;

/// Opens and migrates the configured database.
pub async fn open_storage(config: &ProctorConfig) -> Result<Arc<SqliteStorage>, ProctorError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    Ok(storage)
}

/// A fully wired engine over SQLite, Gemini, and the in-process bus.
pub struct Runtime {
    pub storage: Arc<SqliteStorage>,
    pub bus: Arc<EventBus>,
    pub engine: Arc<InterviewEngine>,
}

impl Runtime {
    pub async fn build(config: &ProctorConfig) -> Result<Self, ProctorError> {
        let storage = open_storage(config).await?;
        let oracle = Arc::new(GeminiOracle::new(&config.gemini)?);
        let bus = Arc::new(EventBus::default());
        let engine = Arc::new(InterviewEngine::new(
            storage.clone(),
            storage.clone(),
            oracle,
            bus.clone(),
            config,
        ));
        Ok(Self {
            storage,
            bus,
            engine,
        })
    }

    pub async fn shutdown(&self) -> Result<(), ProctorError> {
        self.storage.shutdown().await
    }
}

/// `proctor worker`: drains profile jobs and sweeps until signalled.
pub async fn worker(config: &ProctorConfig) -> Result<(), ProctorError> {
    let runtime = Runtime::build(config).await?;
    let cancel = crate::shutdown::install_signal_handler();
    let worker = ProfileWorker::new(runtime.engine.clone(), &config.worker);

    // Catch up on jobs left behind by a previous run before waiting.
    worker.drain().await?;
    worker.run(Some(runtime.bus.subscribe()), cancel).await;

    runtime.shutdown().await?;
    info!("worker stopped");
    Ok(())
}

/// `proctor sweep`: one timeout sweep as of now.
///
/// Touches only the store, so it works without oracle credentials. Profile
/// jobs for force-completed interviews wait in the queue for a worker.
/// Abandoned voice interviews need their transcript graded, so they are
/// reported as awaiting replay and left for the worker's sweep.
pub async fn sweep(config: &ProctorConfig) -> Result<SweepReport, ProctorError> {
    let storage = open_storage(config).await?;
    let report = storage
        .sweep_expired(
            Utc::now(),
            chrono::Duration::minutes(i64::from(config.worker.sweep_grace_mins)),
            config.worker.max_job_attempts,
        )
        .await?;
    info!(
        cancelled = report.cancelled.len(),
        force_completed = report.force_completed.len(),
        awaiting_replay = report.awaiting_replay.len(),
        "sweep complete"
    );
    storage.shutdown().await?;
    Ok(report)
}

/// `proctor profile <id>`: synthesizes (or fetches) one profile now.
pub async fn profile(
    config: &ProctorConfig,
    interview_id: &InterviewId,
) -> Result<InterviewProfile, ProctorError> {
    let runtime = Runtime::build(config).await?;
    let profile = runtime.engine.synthesizer().synthesize(interview_id).await;
    runtime.shutdown().await?;
    profile
}

/// `proctor transcript <id>`: the live transcript of one interview.
pub async fn transcript(
    config: &ProctorConfig,
    interview_id: &InterviewId,
) -> Result<Vec<TranscriptRecord>, ProctorError> {
    let storage = open_storage(config).await?;
    if storage.get_interview(interview_id).await?.is_none() {
        return Err(ProctorError::NotFound {
            entity: "interview",
            id: interview_id.to_string(),
        });
    }
    let records = storage.read_all(&interview_id.transcript_key()).await?;
    storage.shutdown().await?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_config::model::StorageConfig;
    use proctor_core::types::{
        Candidate, CandidateId, InterviewSession, InterviewStatus, Modality, Role,
    };

    fn temp_config(dir: &tempfile::TempDir) -> ProctorConfig {
        let mut config = ProctorConfig::default();
        config.storage = StorageConfig {
            database_path: dir.path().join("cli.db").to_string_lossy().to_string(),
            wal_mode: true,
        };
        config
    }

    async fn seed(storage: &SqliteStorage, id: &str, scheduled_at: chrono::DateTime<Utc>) {
        let candidate_id = CandidateId::from("cand-1");
        storage
            .upsert_candidate(&Candidate {
                candidate_id: candidate_id.clone(),
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                resume: None,
            })
            .await
            .unwrap();
        storage
            .create_interview(&InterviewSession::scheduled(
                InterviewId::from(id),
                candidate_id,
                scheduled_at,
                30,
                Modality::Text,
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sweep_cancels_stale_pending_interviews() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let storage = open_storage(&config).await.unwrap();
        seed(&storage, "iv-stale", Utc::now() - chrono::Duration::hours(3)).await;
        seed(&storage, "iv-later", Utc::now() + chrono::Duration::hours(3)).await;
        storage.shutdown().await.unwrap();
        drop(storage);

        let report = sweep(&config).await.unwrap();
        assert_eq!(report.cancelled, vec![InterviewId::from("iv-stale")]);
        assert!(report.force_completed.is_empty());

        let storage = open_storage(&config).await.unwrap();
        let stale = storage
            .get_interview(&InterviewId::from("iv-stale"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stale.status, InterviewStatus::Cancelled);
        let later = storage
            .get_interview(&InterviewId::from("iv-later"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(later.status, InterviewStatus::Pending);
    }

    #[tokio::test]
    async fn transcript_reads_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let storage = open_storage(&config).await.unwrap();
        seed(&storage, "iv-1", Utc::now()).await;
        let key = InterviewId::from("iv-1").transcript_key();
        for (id, role, ts) in [("b", Role::User, 20), ("a", Role::Assistant, 10)] {
            storage
                .append(
                    &key,
                    &TranscriptRecord {
                        id: id.into(),
                        role,
                        text: format!("text {id}"),
                        timestamp: ts,
                    },
                )
                .await
                .unwrap();
        }
        storage.shutdown().await.unwrap();
        drop(storage);

        let records = transcript(&config, &InterviewId::from("iv-1")).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn transcript_of_unknown_interview_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let err = transcript(&config, &InterviewId::from("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProctorError::NotFound { entity: "interview", .. }));
    }
}
