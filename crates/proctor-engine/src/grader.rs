// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer grading, one answer at a time or a whole transcript at once.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use proctor_core::ProctorError;
use proctor_core::types::{Difficulty, Grade, Role, Section, TranscriptRecord};

use crate::decode;
use crate::oracle::BoundedOracle;
use crate::prompts;

const COMPONENT: &str = "grader";

/// Feedback stored when a per-turn grade cannot be read.
pub const NO_FEEDBACK: &str = "No feedback generated";
/// Feedback stored for introduction answers, which are never graded.
pub const INTRODUCTION_FEEDBACK: &str = "Introduction recorded, not graded";

/// An assistant question and the candidate reply that immediately followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct QaPair {
    /// Id of the assistant utterance; becomes the replayed turn's id.
    pub turn_id: String,
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// Grade for one replayed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayGrade {
    pub correct: bool,
    pub difficulty: Difficulty,
    pub ai_feedback: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReplayGrade {
    #[serde(default)]
    correct: Value,
    #[serde(default)]
    difficulty_level: Value,
    #[serde(default, alias = "ai_feedback", alias = "feedback")]
    ai_feedback: Option<String>,
}

/// Grades answers through the oracle.
pub struct AnswerGrader {
    oracle: BoundedOracle,
}

impl AnswerGrader {
    pub fn new(oracle: BoundedOracle) -> Self {
        Self { oracle }
    }

    /// Grades one answer. Introduction answers are accepted without an oracle call.
    ///
    /// An unreadable reply grades the answer incorrect with [`NO_FEEDBACK`].
    pub async fn grade(
        &self,
        resume: &str,
        question: &str,
        answer: &str,
        difficulty: Option<Difficulty>,
        section: Option<Section>,
    ) -> Result<Grade, ProctorError> {
        if section.is_some_and(|s| !s.is_graded()) {
            return Ok(Grade {
                correct: true,
                ai_feedback: INTRODUCTION_FEEDBACK.to_string(),
            });
        }

        let prompt = prompts::grade(resume, question, answer, difficulty, section);
        let raw = self.oracle.ask(COMPONENT, &prompt).await?;
        Ok(read_grade(&raw).unwrap_or_else(|| {
            warn!("unreadable grade, recording as incorrect");
            debug!(raw_response = %raw, "grader reply");
            Grade {
                correct: false,
                ai_feedback: NO_FEEDBACK.to_string(),
            }
        }))
    }

    /// Grades every pair in one oracle call.
    ///
    /// The reply must be an array with one element per pair, in order.
    /// Anything else is [`ProctorError::MalformedOracleOutput`] and nothing
    /// should be persisted.
    pub async fn replay(
        &self,
        resume: &str,
        pairs: &[QaPair],
    ) -> Result<Vec<ReplayGrade>, ProctorError> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let raw = self.oracle.ask(COMPONENT, &prompts::replay(resume, pairs)).await?;

        let Some(items) = decode::decode_logged::<Vec<RawReplayGrade>>(COMPONENT, &raw) else {
            return Err(ProctorError::MalformedOracleOutput {
                component: COMPONENT,
                detail: "replay reply is not a JSON array of grades".into(),
            });
        };
        if items.len() != pairs.len() {
            warn!(expected = pairs.len(), got = items.len(), "replay grade count mismatch");
            return Err(ProctorError::MalformedOracleOutput {
                component: COMPONENT,
                detail: format!("expected {} grades, got {}", pairs.len(), items.len()),
            });
        }

        let grades: Vec<ReplayGrade> = items
            .into_iter()
            .map(|item| ReplayGrade {
                correct: lenient_bool(&item.correct).unwrap_or(false),
                difficulty: lenient_i64(&item.difficulty_level)
                    .map(Difficulty::clamped)
                    .unwrap_or(Difficulty::SEED),
                ai_feedback: item
                    .ai_feedback
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or_else(|| NO_FEEDBACK.to_string()),
            })
            .collect();
        info!(pairs = grades.len(), "transcript replay graded");
        Ok(grades)
    }
}

fn read_grade(raw: &str) -> Option<Grade> {
    let value = decode::decode_value(raw)?;
    let value = match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    let map = value.as_object()?;
    let correct = lenient_bool(map.get("correct")?)?;
    let ai_feedback = ["aiFeedback", "ai_feedback", "feedback"]
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(NO_FEEDBACK)
        .to_string();
    Some(Grade {
        correct,
        ai_feedback,
    })
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "correct" => Some(true),
            "false" | "no" | "incorrect" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Pairs each assistant utterance with the user utterance right after it.
///
/// Assistant utterances followed by another assistant utterance (or by
/// nothing) are skipped, as are user utterances with no question before them.
pub fn pair_transcript(records: &[TranscriptRecord]) -> Vec<QaPair> {
    records
        .windows(2)
        .filter(|w| w[0].role == Role::Assistant && w[1].role == Role::User)
        .map(|w| QaPair {
            turn_id: w[0].id.clone(),
            question: w[0].text.clone(),
            answer: w[1].text.clone(),
            asked_at: DateTime::from_timestamp_millis(w[0].timestamp).unwrap_or_else(Utc::now),
        })
        .collect()
}
