// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by adapters, storage, and the interview engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for an interview session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterviewId(pub String);

/// Unique identifier for a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl InterviewId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the live transcript for this interview is stored.
    pub fn transcript_key(&self) -> String {
        format!("interview:{}:messages", self.0)
    }
}

impl CandidateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InterviewId {
    fn from(s: &str) -> Self {
        InterviewId(s.to_string())
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        CandidateId(s.to_string())
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Oracle,
    Storage,
    Transcript,
    Speech,
}

/// Lifecycle status of an interview session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    Pending,
    Rescheduled,
    Ongoing,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    /// Statuses from which `start` may move the session to ONGOING.
    pub const STARTABLE: [InterviewStatus; 2] =
        [InterviewStatus::Pending, InterviewStatus::Rescheduled];

    pub fn is_startable(self) -> bool {
        Self::STARTABLE.contains(&self)
    }
}

/// How the candidate takes the interview; selects the turn capture strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    /// Chat-driven: every answer is graded as it arrives.
    Text,
    /// Voice-driven: only a raw transcript is captured and replayed at the end.
    Voice,
}

/// Topic area a question belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Section {
    Introduction,
    Skills,
    #[strum(serialize = "Work Experience")]
    #[serde(rename = "Work Experience")]
    WorkExperience,
    Personality,
}

impl Section {
    /// Sections every interview must cover at least once.
    pub const REQUIRED: [Section; 3] =
        [Section::Skills, Section::WorkExperience, Section::Personality];

    /// Lenient parse for section names produced by the oracle.
    pub fn parse_loose(raw: &str) -> Option<Section> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "introduction" | "intro" => Some(Section::Introduction),
            "skills" | "skill" | "technicalskills" => Some(Section::Skills),
            "workexperience" | "experience" | "work" => Some(Section::WorkExperience),
            "personality" | "behavioral" | "behavioural" => Some(Section::Personality),
            _ => None,
        }
    }

    /// Introduction answers are recorded but never graded.
    pub fn is_graded(self) -> bool {
        self != Section::Introduction
    }
}

/// Question difficulty, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    /// Starting difficulty when no graded turn exists.
    pub const SEED: Difficulty = Difficulty(2);

    /// Returns `None` when `level` is outside `[1, 5]`.
    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Difficulty(level))
    }

    /// Clamps any integer into range.
    pub fn clamped(level: i64) -> Self {
        Difficulty(level.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Next difficulty after an answer graded `correct`.
    pub fn adjusted(self, correct: bool) -> Self {
        let delta = if correct { 1 } else { -1 };
        Self::clamped(i64::from(self.0) + delta)
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Difficulty::new)
            .ok_or_else(|| format!("difficulty {value} outside 1..=5"))
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One scheduled interview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub interview_id: InterviewId,
    pub candidate_id: CandidateId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_min: u32,
    pub status: InterviewStatus,
    pub modality: Modality,
    pub completion_min: Option<u32>,
    pub attempted_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl InterviewSession {
    /// A freshly scheduled session in PENDING state.
    pub fn scheduled(
        interview_id: InterviewId,
        candidate_id: CandidateId,
        scheduled_at: DateTime<Utc>,
        duration_min: u32,
        modality: Modality,
    ) -> Self {
        Self {
            interview_id,
            candidate_id,
            scheduled_at,
            duration_min,
            status: InterviewStatus::Pending,
            modality,
            completion_min: None,
            attempted_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }

    /// End of the scheduled window.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.scheduled_at + chrono::Duration::minutes(i64::from(self.duration_min))
    }
}

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Caller-supplied idempotency key, unique within the interview.
    pub turn_id: String,
    pub interview_id: InterviewId,
    pub content: String,
    pub section: Option<Section>,
    pub difficulty_level: Option<Difficulty>,
    pub candidate_answer: String,
    pub correct: Option<bool>,
    pub ai_feedback: Option<String>,
    pub asked_at: DateTime<Utc>,
}

/// Result of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub correct: bool,
    pub ai_feedback: String,
}

/// Speaker of a transcript utterance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

/// A single utterance captured by the live transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Unique per utterance; appends with an existing id are ignored.
    pub id: String,
    pub role: Role,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Where a stored profile's numbers came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    Oracle,
    Rubric,
}

/// Aggregate counts over an interview's turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub average_difficulty: f64,
}

impl Analytics {
    /// Computes analytics from persisted turns.
    pub fn from_turns(turns: &[Turn]) -> Self {
        let total_questions = turns.len() as u32;
        let correct_answers = turns.iter().filter(|t| t.correct == Some(true)).count() as u32;
        let levels: Vec<f64> = turns
            .iter()
            .filter_map(|t| t.difficulty_level.map(|d| f64::from(d.level())))
            .collect();
        let average_difficulty = if levels.is_empty() {
            0.0
        } else {
            let mean = levels.iter().sum::<f64>() / levels.len() as f64;
            (mean * 100.0).round() / 100.0
        };
        Self {
            total_questions,
            correct_answers,
            average_difficulty,
        }
    }
}

/// Post-interview performance summary; exactly one per completed interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewProfile {
    pub interview_id: InterviewId,
    pub performance_score: f64,
    pub recommended_roles: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub analytics: Analytics,
    pub source: ProfileSource,
    pub created_at: DateTime<Utc>,
}

/// One role from a parsed resume's work history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub dates: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub responsibilities: Vec<String>,
}

/// One project listed on a parsed resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: Vec<String>,
}

/// Structured resume produced by the (external) resume parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResumeProfile {
    pub profile_title: Option<String>,
    pub technical_skills: serde_json::Value,
    pub other_skills: serde_json::Value,
    pub experience_summary: Vec<Experience>,
    pub education_summary: Option<String>,
    pub certifications: serde_json::Value,
    pub projects: Vec<Project>,
}

/// A candidate and their parsed resume, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub candidate_id: CandidateId,
    pub first_name: String,
    pub last_name: String,
    pub resume: Option<ResumeProfile>,
}

/// A unit of deferred work claimed from the durable queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    pub status: String,
    pub attempts: i64,
    pub max_attempts: i64,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

/// Counts of rows touched by one timeout sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub cancelled: Vec<InterviewId>,
    pub force_completed: Vec<InterviewId>,
    /// Overrun voice sessions left ONGOING until their transcript is graded.
    pub awaiting_replay: Vec<InterviewId>,
}
