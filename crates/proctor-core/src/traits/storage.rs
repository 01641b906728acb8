// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview store trait for persistence backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ProctorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Candidate, CandidateId, InterviewId, InterviewProfile, InterviewSession, InterviewStatus,
    QueueEntry, SweepReport, Turn,
};

/// Queue that carries post-interview profile jobs.
pub const PROFILE_QUEUE: &str = "profile";

/// Reason recorded when an unattended interview's window elapses.
pub const NO_SHOW_REASON: &str = "Candidate did not attend";

/// Outcome of appending a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnWrite {
    Inserted,
    /// A turn with the same `(interview_id, turn_id)` already exists.
    Duplicate,
    /// The interview is not ONGOING; nothing was written.
    Rejected(InterviewStatus),
}

/// Everything committed atomically when an interview ends.
#[derive(Debug, Clone)]
pub struct Completion {
    pub interview_id: InterviewId,
    pub completion_min: u32,
    pub ended_at: DateTime<Utc>,
    /// Turns produced by transcript replay. Empty for per-turn sessions.
    pub turns: Vec<Turn>,
    /// Attempt budget for the profile job enqueued alongside.
    pub max_job_attempts: u32,
}

/// Persistence for sessions, turns, profiles, and deferred jobs.
///
/// Every status transition is a compare-and-set: it returns `false` when the
/// precondition no longer holds and leaves the row untouched.
#[async_trait]
pub trait InterviewStore: PluginAdapter {
    /// Opens the backend and applies migrations.
    async fn initialize(&self) -> Result<(), ProctorError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), ProctorError>;

    // --- Candidates ---

    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<(), ProctorError>;

    async fn get_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, ProctorError>;

    // --- Interviews ---

    async fn create_interview(&self, session: &InterviewSession) -> Result<(), ProctorError>;

    async fn get_interview(
        &self,
        id: &InterviewId,
    ) -> Result<Option<InterviewSession>, ProctorError>;

    /// PENDING/RESCHEDULED -> ONGOING, keyed by interview and owning candidate.
    async fn try_start(
        &self,
        id: &InterviewId,
        candidate: &CandidateId,
    ) -> Result<bool, ProctorError>;

    /// ONGOING -> COMPLETED, inserting replayed turns and enqueueing the
    /// profile job in the same transaction.
    async fn complete_interview(&self, completion: &Completion) -> Result<bool, ProctorError>;

    /// PENDING/RESCHEDULED -> CANCELLED.
    async fn cancel_interview(
        &self,
        id: &InterviewId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, ProctorError>;

    /// Cancels unattended sessions whose window elapsed and force-completes
    /// ONGOING sessions whose window plus `grace` elapsed.
    ///
    /// Overrun VOICE sessions are not completed here: their turns only exist
    /// in the live transcript, so they are reported in `awaiting_replay` for
    /// the caller to grade and complete.
    async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        grace: chrono::Duration,
        max_job_attempts: u32,
    ) -> Result<SweepReport, ProctorError>;

    // --- Turns ---

    /// Appends one turn if the interview is ONGOING, checked in the same
    /// transaction as the insert.
    async fn insert_turn(&self, turn: &Turn) -> Result<TurnWrite, ProctorError>;

    async fn get_turn(
        &self,
        interview: &InterviewId,
        turn_id: &str,
    ) -> Result<Option<Turn>, ProctorError>;

    /// All turns of an interview ordered by `asked_at`.
    async fn list_turns(&self, interview: &InterviewId) -> Result<Vec<Turn>, ProctorError>;

    // --- Profiles ---

    /// Stores the profile. Returns `false` if one already exists.
    async fn insert_profile(&self, profile: &InterviewProfile) -> Result<bool, ProctorError>;

    async fn get_profile(
        &self,
        interview: &InterviewId,
    ) -> Result<Option<InterviewProfile>, ProctorError>;

    // --- Queue ---

    async fn enqueue(
        &self,
        queue_name: &str,
        payload: &str,
        max_attempts: u32,
    ) -> Result<i64, ProctorError>;

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, ProctorError>;

    async fn ack(&self, id: i64) -> Result<(), ProctorError>;

    async fn fail(&self, id: i64) -> Result<(), ProctorError>;
}
