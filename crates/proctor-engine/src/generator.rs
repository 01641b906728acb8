// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Next-question generation.
//!
//! The oracle writes the question text. Difficulty and, near the end of the
//! interview, the section are decided here and override whatever the oracle
//! reports.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use proctor_core::ProctorError;
use proctor_core::types::{Difficulty, Section, Turn};

use crate::decode;
use crate::oracle::BoundedOracle;
use crate::prompts::{self, QuestionPrompt};

const COMPONENT: &str = "generator";

/// A question ready to put to the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,
    pub section: Option<Section>,
    pub difficulty_level: Option<Difficulty>,
}

/// Difficulty for the next question.
///
/// Follows the most recent graded, non-introduction turn: one level up after a
/// correct answer, one down after an incorrect one. Seeds at
/// [`Difficulty::SEED`] when nothing has been graded yet.
pub fn next_difficulty(turns: &[Turn]) -> Difficulty {
    turns
        .iter()
        .rev()
        .filter(|t| t.section.is_none_or(Section::is_graded))
        .find_map(|t| t.correct.map(|c| (t.difficulty_level, c)))
        .map(|(level, correct)| level.unwrap_or(Difficulty::SEED).adjusted(correct))
        .unwrap_or(Difficulty::SEED)
}

/// Section coverage decision for the next question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPlan {
    /// Required sections with no turn yet, in canonical order.
    pub uncovered: Vec<Section>,
    /// Set when the remaining time only just fits the uncovered sections.
    pub forced: Option<Section>,
}

/// Forces the first uncovered section once
/// `uncovered * minutes_per_question >= remaining_min`.
pub fn plan_sections(turns: &[Turn], remaining_min: u32, minutes_per_question: u32) -> SectionPlan {
    let covered: HashSet<Section> = turns.iter().filter_map(|t| t.section).collect();
    let uncovered: Vec<Section> = Section::REQUIRED
        .iter()
        .copied()
        .filter(|s| !covered.contains(s))
        .collect();
    let needed = (uncovered.len() as u32).saturating_mul(minutes_per_question);
    let forced = if !uncovered.is_empty() && needed >= remaining_min {
        uncovered.first().copied()
    } else {
        None
    };
    SectionPlan { uncovered, forced }
}

/// Comparison key for question novelty: lowercase words, punctuation dropped.
pub fn normalize_question(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Produces the next question from resume, history, and remaining time.
pub struct QuestionGenerator {
    oracle: BoundedOracle,
    minutes_per_question: u32,
    novelty_retries: u32,
}

impl QuestionGenerator {
    pub fn new(oracle: BoundedOracle, minutes_per_question: u32, novelty_retries: u32) -> Self {
        Self {
            oracle,
            minutes_per_question,
            novelty_retries,
        }
    }

    /// Generates a question that repeats none of `prior_questions`.
    ///
    /// A repeat triggers up to `novelty_retries` re-asks with the rejected
    /// text added to the prompt; if every attempt repeats, the call fails as
    /// retryable [`ProctorError::OracleUnavailable`].
    pub async fn generate(
        &self,
        resume: &str,
        turns: &[Turn],
        prior_questions: &[String],
        remaining_min: u32,
        total_min: u32,
    ) -> Result<GeneratedQuestion, ProctorError> {
        let difficulty = next_difficulty(turns);
        let plan = plan_sections(turns, remaining_min, self.minutes_per_question);
        let seen: HashSet<String> = prior_questions
            .iter()
            .map(|q| normalize_question(q))
            .collect();
        let mut rejected: Vec<String> = Vec::new();

        for attempt in 0..=self.novelty_retries {
            let prompt = prompts::question(&QuestionPrompt {
                resume,
                turns,
                prior_questions,
                rejected: &rejected,
                difficulty,
                uncovered: &plan.uncovered,
                forced: plan.forced,
                remaining_min,
                total_min,
            });
            let raw = self.oracle.ask(COMPONENT, &prompt).await?;
            let question = read_question(&raw, difficulty, plan.forced);

            if question.question.is_empty() {
                warn!(attempt, "oracle returned an empty question");
                continue;
            }
            if seen.contains(&normalize_question(&question.question)) {
                warn!(attempt, question = %question.question, "oracle repeated a prior question");
                rejected.push(question.question);
                continue;
            }

            info!(
                attempt,
                section = ?question.section,
                difficulty = ?question.difficulty_level.map(Difficulty::level),
                forced = plan.forced.is_some(),
                "next question generated"
            );
            return Ok(question);
        }

        Err(ProctorError::oracle(format!(
            "no novel question after {} attempts",
            self.novelty_retries + 1
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(alias = "content", alias = "nextQuestion", alias = "next_question")]
    question: String,
    #[serde(default)]
    section: Option<String>,
}

/// Reads the oracle's reply, applying the policy difficulty and any forced section.
///
/// When the reply cannot be decoded at all, its trimmed text becomes the
/// question with section and difficulty left empty.
fn read_question(raw: &str, difficulty: Difficulty, forced: Option<Section>) -> GeneratedQuestion {
    let parsed = decode::decode_value(raw).and_then(|value| {
        let value = match value {
            Value::Array(mut items) if items.len() == 1 => items.remove(0),
            other => other,
        };
        serde_json::from_value::<RawQuestion>(value).ok()
    });

    match parsed {
        Some(q) => {
            let reported = q.section.as_deref().and_then(Section::parse_loose);
            if let (Some(forced), Some(reported)) = (forced, reported) {
                if forced != reported {
                    debug!(%forced, %reported, "overriding oracle-reported section");
                }
            }
            GeneratedQuestion {
                question: q.question.trim().to_string(),
                section: forced.or(reported),
                difficulty_level: Some(difficulty),
            }
        }
        None => {
            warn!("question reply was not structured, using raw text");
            debug!(raw_response = %raw, "generator reply");
            GeneratedQuestion {
                question: decode::strip_fences(raw).to_string(),
                section: None,
                difficulty_level: None,
            }
        }
    }
}
