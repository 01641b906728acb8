// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview session orchestration.
//!
//! [`InterviewEngine`] owns the lifecycle of every interview: start, per-turn
//! classification and grading, question generation, end, and the timeout
//! sweep. Status transitions are compare-and-set updates in the store, so two
//! racing callers can never both win; the loser gets `InvalidState`.
//!
//! Oracle calls always happen outside store transactions: rows are read
//! before the call and written after it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use proctor_config::model::{InterviewConfig, ProctorConfig};
use proctor_core::traits::Completion;
use proctor_core::traits::storage::NO_SHOW_REASON;
use proctor_core::types::{
    Candidate, CandidateId, Difficulty, Grade, InterviewId, InterviewProfile, InterviewSession,
    InterviewStatus, Role, Section, SweepReport, TranscriptRecord, Turn,
};
use proctor_core::{
    InterviewEvent, InterviewStore, LiveChannel, OracleAdapter, ProctorError, SpeechAdapter,
    TranscriptStore, TurnWrite,
};

use crate::capture::CaptureStrategy;
use crate::classifier::{Action, Decision, DecisionClassifier};
use crate::generator::{GeneratedQuestion, QuestionGenerator};
use crate::grader::{self, AnswerGrader, NO_FEEDBACK};
use crate::oracle::BoundedOracle;
use crate::profile::ProfileSynthesizer;
use crate::prompts;

/// Reason recorded when an operator cancels without giving one.
pub const DEFAULT_CANCEL_REASON: &str = "Interviewer unavailable due to emergency";

/// Everything a client needs to render the first screen of an interview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedSession {
    pub session: InterviewSession,
    pub candidate: Candidate,
    pub opening: GeneratedQuestion,
}

/// One answer submitted for grading.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    /// Idempotency key; resubmitting the same id returns the stored grade.
    pub turn_id: String,
    pub question: String,
    pub candidate_answer: String,
    #[serde(default)]
    pub difficulty_level: Option<Difficulty>,
    #[serde(default)]
    pub section: Option<Section>,
}

/// Drives interviews turn by turn.
pub struct InterviewEngine {
    store: Arc<dyn InterviewStore + Send + Sync>,
    transcripts: Arc<dyn TranscriptStore + Send + Sync>,
    live: Arc<dyn LiveChannel>,
    speech: Option<Arc<dyn SpeechAdapter + Send + Sync>>,
    classifier: DecisionClassifier,
    grader: AnswerGrader,
    generator: QuestionGenerator,
    synthesizer: Arc<ProfileSynthesizer>,
    interview: InterviewConfig,
    max_job_attempts: u32,
    sweep_grace: chrono::Duration,
    /// Interviews whose last classification asked the candidate to confirm.
    awaiting_confirm: DashSet<InterviewId>,
}

impl InterviewEngine {
    pub fn new(
        store: Arc<dyn InterviewStore + Send + Sync>,
        transcripts: Arc<dyn TranscriptStore + Send + Sync>,
        oracle: Arc<dyn OracleAdapter + Send + Sync>,
        live: Arc<dyn LiveChannel>,
        config: &ProctorConfig,
    ) -> Self {
        let oracle = BoundedOracle::new(
            oracle,
            Duration::from_secs(config.interview.oracle_timeout_secs),
        );
        let synthesizer = Arc::new(ProfileSynthesizer::new(
            store.clone(),
            oracle.clone(),
            config.profile.rubric_fallback,
        ));
        Self {
            store,
            transcripts,
            live,
            speech: None,
            classifier: DecisionClassifier::new(oracle.clone()),
            grader: AnswerGrader::new(oracle.clone()),
            generator: QuestionGenerator::new(
                oracle,
                config.interview.minutes_per_question,
                config.interview.novelty_retries,
            ),
            synthesizer,
            interview: config.interview.clone(),
            max_job_attempts: config.worker.max_job_attempts,
            sweep_grace: chrono::Duration::minutes(i64::from(config.worker.sweep_grace_mins)),
            awaiting_confirm: DashSet::new(),
        }
    }

    /// Attaches the speech adapter used by voice interviews.
    pub fn with_speech(mut self, speech: Arc<dyn SpeechAdapter + Send + Sync>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn store(&self) -> Arc<dyn InterviewStore + Send + Sync> {
        self.store.clone()
    }

    pub fn synthesizer(&self) -> Arc<ProfileSynthesizer> {
        self.synthesizer.clone()
    }

    // --- Lifecycle ---

    /// PENDING/RESCHEDULED -> ONGOING and the opening question.
    ///
    /// The opening question is rendered from configuration, so starting an
    /// interview never waits on the oracle.
    pub async fn start_session(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
    ) -> Result<StartedSession, ProctorError> {
        let mut session = self.owned(candidate_id, interview_id).await?;
        if !session.status.is_startable() {
            return Err(invalid_state(&session, "start"));
        }

        let candidate = self
            .store
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| ProctorError::NotFound {
                entity: "candidate",
                id: candidate_id.to_string(),
            })?;

        if !self.store.try_start(interview_id, candidate_id).await? {
            return Err(self.lost_race(interview_id, "start").await);
        }
        session.status = InterviewStatus::Ongoing;

        let ttl = Duration::from_secs(
            u64::from(session.duration_min) * 60 + self.interview.transcript_ttl_grace_secs,
        );
        if let Err(e) = self
            .transcripts
            .set_expiry(&interview_id.transcript_key(), ttl)
            .await
        {
            warn!(interview_id = %interview_id, error = %e, "failed to set transcript expiry");
        }

        self.live.publish(InterviewEvent::SessionStarted {
            interview_id: interview_id.clone(),
        });
        info!(
            interview_id = %interview_id,
            candidate_id = %candidate_id,
            modality = %session.modality,
            duration_min = session.duration_min,
            "interview started"
        );

        let opening = GeneratedQuestion {
            question: self
                .interview
                .opening_question
                .replace("{first_name}", &candidate.first_name),
            section: Some(Section::Introduction),
            difficulty_level: Some(Difficulty::SEED),
        };
        Ok(StartedSession {
            session,
            candidate,
            opening,
        })
    }

    /// ONGOING -> COMPLETED.
    ///
    /// Per-turn sessions already stored their turns and ignore `transcript`.
    /// Replay sessions grade `transcript` (or the stored live transcript when
    /// none is given) and store the resulting turns in the same transaction as
    /// the status change. A profile job is enqueued in that transaction too.
    pub async fn end_session(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
        completion_min: u32,
        transcript: Option<Vec<TranscriptRecord>>,
    ) -> Result<(), ProctorError> {
        let session = self.owned(candidate_id, interview_id).await?;
        require_ongoing(&session, "end")?;

        let strategy = CaptureStrategy::for_modality(session.modality);
        let turns = if strategy.replays_on_end() {
            let records = match transcript {
                Some(records) => records,
                None => self.transcripts.read_all(&interview_id.transcript_key()).await?,
            };
            self.replay_turns(interview_id, &session, &records).await?
        } else {
            if transcript.is_some() {
                warn!(
                    interview_id = %interview_id,
                    "ignoring transcript supplied to a per-turn interview"
                );
            }
            Vec::new()
        };

        let completion = Completion {
            interview_id: interview_id.clone(),
            completion_min,
            ended_at: Utc::now(),
            turns,
            max_job_attempts: self.max_job_attempts,
        };
        if !self.store.complete_interview(&completion).await? {
            return Err(self.lost_race(interview_id, "end").await);
        }
        self.awaiting_confirm.remove(interview_id);

        for turn in completion.turns {
            self.live.publish(InterviewEvent::TurnRecorded {
                interview_id: interview_id.clone(),
                turn,
            });
        }
        self.live.publish(InterviewEvent::SessionEnded {
            interview_id: interview_id.clone(),
            completion_min,
        });
        self.live.publish(InterviewEvent::ProfileRequested {
            interview_id: interview_id.clone(),
        });
        info!(interview_id = %interview_id, completion_min, %strategy, "interview completed");
        Ok(())
    }

    async fn replay_turns(
        &self,
        interview_id: &InterviewId,
        session: &InterviewSession,
        records: &[TranscriptRecord],
    ) -> Result<Vec<Turn>, ProctorError> {
        let pairs = grader::pair_transcript(records);
        debug!(
            interview_id = %interview_id,
            records = records.len(),
            pairs = pairs.len(),
            "replaying transcript"
        );
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let resume = self.resume_excerpt(&session.candidate_id).await?;
        let grades = self.grader.replay(&resume, &pairs).await?;
        Ok(pairs
            .into_iter()
            .zip(grades)
            .map(|(pair, grade)| Turn {
                turn_id: pair.turn_id,
                interview_id: interview_id.clone(),
                content: pair.question,
                section: None,
                difficulty_level: Some(grade.difficulty),
                candidate_answer: pair.answer,
                correct: Some(grade.correct),
                ai_feedback: Some(grade.ai_feedback),
                asked_at: pair.asked_at,
            })
            .collect())
    }

    /// PENDING/RESCHEDULED -> CANCELLED.
    pub async fn cancel_session(
        &self,
        interview_id: &InterviewId,
        reason: Option<&str>,
    ) -> Result<(), ProctorError> {
        let session = self.find(interview_id).await?;
        if !session.status.is_startable() {
            return Err(invalid_state(&session, "cancel"));
        }
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_CANCEL_REASON);
        if !self.store.cancel_interview(interview_id, reason, Utc::now()).await? {
            return Err(self.lost_race(interview_id, "cancel").await);
        }
        self.live.publish(InterviewEvent::SessionCancelled {
            interview_id: interview_id.clone(),
            reason: reason.to_string(),
        });
        info!(interview_id = %interview_id, reason, "interview cancelled");
        Ok(())
    }

    /// Cancels no-shows and force-completes abandoned interviews as of `now`.
    ///
    /// Abandoned voice interviews are graded from their live transcript
    /// before completing. If that grading fails they stay ONGOING and are
    /// listed in `awaiting_replay` for the next sweep.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, ProctorError> {
        let mut report = self
            .store
            .sweep_expired(now, self.sweep_grace, self.max_job_attempts)
            .await?;

        for id in std::mem::take(&mut report.awaiting_replay) {
            match self.complete_from_transcript(&id, now).await {
                Ok(true) => report.force_completed.push(id),
                Ok(false) => {
                    debug!(interview_id = %id, "abandoned interview already left ONGOING");
                }
                Err(e) => {
                    warn!(
                        interview_id = %id,
                        error = %e,
                        "transcript replay failed, retrying next sweep"
                    );
                    report.awaiting_replay.push(id);
                }
            }
        }

        for id in &report.cancelled {
            self.live.publish(InterviewEvent::SessionCancelled {
                interview_id: id.clone(),
                reason: NO_SHOW_REASON.to_string(),
            });
        }
        for id in &report.force_completed {
            self.awaiting_confirm.remove(id);
            let completion_min = self
                .store
                .get_interview(id)
                .await?
                .and_then(|s| s.completion_min)
                .unwrap_or_default();
            self.live.publish(InterviewEvent::SessionEnded {
                interview_id: id.clone(),
                completion_min,
            });
            self.live.publish(InterviewEvent::ProfileRequested {
                interview_id: id.clone(),
            });
        }

        if report == SweepReport::default() {
            debug!("sweep found nothing to do");
        } else {
            info!(
                cancelled = report.cancelled.len(),
                force_completed = report.force_completed.len(),
                awaiting_replay = report.awaiting_replay.len(),
                "sweep complete"
            );
        }
        Ok(report)
    }

    /// Grades an abandoned voice interview's transcript and completes it.
    ///
    /// Returns `false` when the interview is no longer ONGOING.
    async fn complete_from_transcript(
        &self,
        interview_id: &InterviewId,
        now: DateTime<Utc>,
    ) -> Result<bool, ProctorError> {
        let session = self.find(interview_id).await?;
        if session.status != InterviewStatus::Ongoing {
            return Ok(false);
        }
        let records = self
            .transcripts
            .read_all(&interview_id.transcript_key())
            .await?;
        let turns = self.replay_turns(interview_id, &session, &records).await?;

        let completion = Completion {
            interview_id: interview_id.clone(),
            completion_min: session.duration_min,
            ended_at: now,
            turns,
            max_job_attempts: self.max_job_attempts,
        };
        if !self.store.complete_interview(&completion).await? {
            return Ok(false);
        }
        for turn in completion.turns {
            self.live.publish(InterviewEvent::TurnRecorded {
                interview_id: interview_id.clone(),
                turn,
            });
        }
        Ok(true)
    }

    // --- Turns ---

    /// Classifies an utterance as an answer, a request to clarify, or a confirmed skip.
    ///
    /// A `proceed` only stands when the previous verdict for this interview
    /// was `confirm`; otherwise it is downgraded to `confirm`.
    pub async fn submit_utterance(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
        question: &str,
        candidate_answer: &str,
    ) -> Result<Decision, ProctorError> {
        if candidate_answer.trim().is_empty() {
            return Err(ProctorError::Validation("candidate answer is empty".into()));
        }
        let session = self.owned(candidate_id, interview_id).await?;
        require_ongoing(&session, "classify an utterance for")?;

        let mut decision = self.classifier.classify(question, candidate_answer).await?;
        match decision.action {
            Action::NextStep => {
                self.awaiting_confirm.remove(interview_id);
            }
            Action::Proceed => {
                if self.awaiting_confirm.remove(interview_id).is_none() {
                    debug!(
                        interview_id = %interview_id,
                        "proceed without pending confirm, asking first"
                    );
                    decision = Decision::confirm(None);
                }
            }
            Action::Confirm => {}
        }

        if decision.action == Action::Confirm {
            self.awaiting_confirm.insert(interview_id.clone());
            if decision.message.is_none() {
                decision.message = Some(self.interview.confirm_message.clone());
            }
        }
        debug!(interview_id = %interview_id, action = %decision.action, "utterance decision");
        Ok(decision)
    }

    /// Grades one answer and stores it as a turn.
    ///
    /// Resubmitting a `turn_id` returns the stored grade without calling the
    /// oracle. Only per-turn (TEXT) interviews accept graded answers.
    pub async fn grade_answer(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
        request: GradeRequest,
    ) -> Result<Grade, ProctorError> {
        if request.turn_id.trim().is_empty() {
            return Err(ProctorError::Validation("turn id is empty".into()));
        }
        let session = self.owned(candidate_id, interview_id).await?;
        if !CaptureStrategy::for_modality(session.modality).grades_live() {
            return Err(ProctorError::Validation(format!(
                "interview {interview_id} is {} and is graded from its transcript at the end",
                session.modality
            )));
        }
        if let Some(existing) = self.store.get_turn(interview_id, &request.turn_id).await? {
            debug!(interview_id = %interview_id, turn_id = %request.turn_id, "turn already graded");
            return Ok(stored_grade(&existing));
        }
        require_ongoing(&session, "grade an answer for")?;

        let resume = self.resume_excerpt(candidate_id).await?;
        let grade = self
            .grader
            .grade(
                &resume,
                &request.question,
                &request.candidate_answer,
                request.difficulty_level,
                request.section,
            )
            .await?;

        let turn = Turn {
            turn_id: request.turn_id,
            interview_id: interview_id.clone(),
            content: request.question,
            section: request.section,
            difficulty_level: request.difficulty_level,
            candidate_answer: request.candidate_answer,
            correct: Some(grade.correct),
            ai_feedback: Some(grade.ai_feedback.clone()),
            asked_at: Utc::now(),
        };

        match self.store.insert_turn(&turn).await? {
            TurnWrite::Inserted => {
                self.awaiting_confirm.remove(interview_id);
                info!(
                    interview_id = %interview_id,
                    turn_id = %turn.turn_id,
                    correct = grade.correct,
                    "turn recorded"
                );
                self.live.publish(InterviewEvent::TurnRecorded {
                    interview_id: interview_id.clone(),
                    turn,
                });
                Ok(grade)
            }
            TurnWrite::Duplicate => {
                debug!(
                    interview_id = %interview_id,
                    turn_id = %turn.turn_id,
                    "concurrent duplicate turn"
                );
                let stored = self
                    .store
                    .get_turn(interview_id, &turn.turn_id)
                    .await?
                    .ok_or_else(|| {
                        ProctorError::Internal(format!("turn {} vanished", turn.turn_id))
                    })?;
                Ok(stored_grade(&stored))
            }
            TurnWrite::Rejected(current) => Err(ProctorError::InvalidState {
                interview_id: interview_id.to_string(),
                current,
                operation: "grade an answer for",
            }),
        }
    }

    /// Generates the next question.
    ///
    /// `remaining_min` is clamped to `total_min`.
    pub async fn next_question(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
        remaining_min: u32,
        total_min: u32,
    ) -> Result<GeneratedQuestion, ProctorError> {
        if total_min == 0 {
            return Err(ProctorError::Validation("interview duration must be positive".into()));
        }
        let session = self.owned(candidate_id, interview_id).await?;
        require_ongoing(&session, "generate a question for")?;

        let turns = self.store.list_turns(interview_id).await?;
        let mut prior: Vec<String> = turns.iter().map(|t| t.content.clone()).collect();
        let live = self.transcripts.read_all(&interview_id.transcript_key()).await?;
        prior.extend(
            live.into_iter()
                .filter(|r| r.role == Role::Assistant)
                .map(|r| r.text),
        );

        let resume = self.resume_excerpt(candidate_id).await?;
        self.generator
            .generate(&resume, &turns, &prior, remaining_min.min(total_min), total_min)
            .await
    }

    // --- Transcript and live view ---

    /// Appends one live utterance. Returns `false` for an already-seen record id.
    pub async fn record_transcript(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
        record: TranscriptRecord,
    ) -> Result<bool, ProctorError> {
        if record.id.trim().is_empty() {
            return Err(ProctorError::Validation("transcript record id is empty".into()));
        }
        let session = self.owned(candidate_id, interview_id).await?;
        require_ongoing(&session, "record transcript for")?;

        let inserted = self
            .transcripts
            .append(&interview_id.transcript_key(), &record)
            .await?;
        if inserted {
            self.live.publish(InterviewEvent::TranscriptAppended {
                interview_id: interview_id.clone(),
                record,
            });
        } else {
            debug!(
                interview_id = %interview_id,
                record_id = %record.id,
                "duplicate transcript record"
            );
        }
        Ok(inserted)
    }

    /// Current live transcript, for observers joining mid-interview.
    pub async fn live_snapshot(
        &self,
        interview_id: &InterviewId,
    ) -> Result<Vec<TranscriptRecord>, ProctorError> {
        self.find(interview_id).await?;
        self.transcripts.read_all(&interview_id.transcript_key()).await
    }

    // --- Profile ---

    pub async fn get_profile(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
    ) -> Result<InterviewProfile, ProctorError> {
        self.owned(candidate_id, interview_id).await?;
        self.store
            .get_profile(interview_id)
            .await?
            .ok_or_else(|| ProctorError::NotFound {
                entity: "profile",
                id: interview_id.to_string(),
            })
    }

    // --- Speech ---

    pub async fn speech_token(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
    ) -> Result<String, ProctorError> {
        let session = self.owned(candidate_id, interview_id).await?;
        require_ongoing(&session, "issue a speech token for")?;
        self.speech()?.streaming_token().await
    }

    pub async fn synthesize_speech(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
        text: &str,
    ) -> Result<Vec<u8>, ProctorError> {
        if text.trim().is_empty() {
            return Err(ProctorError::Validation("text to synthesize is empty".into()));
        }
        let session = self.owned(candidate_id, interview_id).await?;
        require_ongoing(&session, "synthesize speech for")?;
        self.speech()?.synthesize(text).await
    }

    fn speech(&self) -> Result<&Arc<dyn SpeechAdapter + Send + Sync>, ProctorError> {
        self.speech
            .as_ref()
            .ok_or_else(|| ProctorError::Config("no speech adapter configured".into()))
    }

    // --- Helpers ---

    async fn find(&self, interview_id: &InterviewId) -> Result<InterviewSession, ProctorError> {
        self.store
            .get_interview(interview_id)
            .await?
            .ok_or_else(|| ProctorError::NotFound {
                entity: "interview",
                id: interview_id.to_string(),
            })
    }

    /// Loads the session and checks that `candidate_id` owns it.
    async fn owned(
        &self,
        candidate_id: &CandidateId,
        interview_id: &InterviewId,
    ) -> Result<InterviewSession, ProctorError> {
        let session = self.find(interview_id).await?;
        if session.candidate_id != *candidate_id {
            warn!(
                interview_id = %interview_id,
                candidate_id = %candidate_id,
                "candidate does not own interview"
            );
            return Err(ProctorError::NotAuthorized {
                interview_id: interview_id.to_string(),
                candidate_id: candidate_id.to_string(),
            });
        }
        Ok(session)
    }

    /// Builds the `InvalidState` for a compare-and-set that matched no row.
    async fn lost_race(&self, interview_id: &InterviewId, operation: &'static str) -> ProctorError {
        match self.find(interview_id).await {
            Ok(current) => {
                warn!(
                    interview_id = %interview_id,
                    current = %current.status,
                    operation,
                    "status changed concurrently"
                );
                invalid_state(&current, operation)
            }
            Err(e) => e,
        }
    }

    async fn resume_excerpt(&self, candidate_id: &CandidateId) -> Result<String, ProctorError> {
        let candidate = self.store.get_candidate(candidate_id).await?;
        Ok(prompts::resume_excerpt(candidate.as_ref()))
    }
}

fn invalid_state(session: &InterviewSession, operation: &'static str) -> ProctorError {
    ProctorError::InvalidState {
        interview_id: session.interview_id.to_string(),
        current: session.status,
        operation,
    }
}

fn require_ongoing(
    session: &InterviewSession,
    operation: &'static str,
) -> Result<(), ProctorError> {
    if session.status == InterviewStatus::Ongoing {
        Ok(())
    } else {
        Err(invalid_state(session, operation))
    }
}

fn stored_grade(turn: &Turn) -> Grade {
    Grade {
        correct: turn.correct.unwrap_or(false),
        ai_feedback: turn
            .ai_feedback
            .clone()
            .unwrap_or_else(|| NO_FEEDBACK.to_string()),
    }
}
