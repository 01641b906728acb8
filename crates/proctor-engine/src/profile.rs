// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-interview profile synthesis.
//!
//! A profile is written at most once per interview. The oracle supplies the
//! score and the prose fields; analytics are always recomputed from the
//! stored turns.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use proctor_core::types::{
    Analytics, Candidate, InterviewId, InterviewProfile, InterviewStatus, ProfileSource, Section,
    Turn,
};
use proctor_core::{InterviewStore, ProctorError};

use crate::decode;
use crate::oracle::BoundedOracle;
use crate::prompts;

const COMPONENT: &str = "profile";
/// Fewest recommended roles a profile may carry.
pub const MIN_RECOMMENDED_ROLES: usize = 2;
/// Recommended roles kept from the oracle reply.
pub const MAX_RECOMMENDED_ROLES: usize = 3;

/// Oracle-supplied part of a profile, already validated.
#[derive(Debug, Clone, PartialEq)]
struct ProfileBody {
    performance_score: f64,
    recommended_roles: Vec<String>,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
}

/// Builds and stores the single profile for a completed interview.
pub struct ProfileSynthesizer {
    store: Arc<dyn InterviewStore + Send + Sync>,
    oracle: BoundedOracle,
    rubric_fallback: bool,
}

impl ProfileSynthesizer {
    pub fn new(
        store: Arc<dyn InterviewStore + Send + Sync>,
        oracle: BoundedOracle,
        rubric_fallback: bool,
    ) -> Self {
        Self {
            store,
            oracle,
            rubric_fallback,
        }
    }

    /// Returns the interview's profile, synthesizing it on first call.
    ///
    /// Safe to call repeatedly and concurrently: an existing profile is
    /// returned untouched, and a lost insert race returns the winner's row.
    pub async fn synthesize(
        &self,
        interview_id: &InterviewId,
    ) -> Result<InterviewProfile, ProctorError> {
        if let Some(existing) = self.store.get_profile(interview_id).await? {
            debug!(interview_id = %interview_id, "profile already exists");
            return Ok(existing);
        }

        let session = self
            .store
            .get_interview(interview_id)
            .await?
            .ok_or_else(|| ProctorError::NotFound {
                entity: "interview",
                id: interview_id.to_string(),
            })?;
        if session.status != InterviewStatus::Completed {
            return Err(ProctorError::InvalidState {
                interview_id: interview_id.to_string(),
                current: session.status,
                operation: "synthesize profile for",
            });
        }

        let candidate = self.store.get_candidate(&session.candidate_id).await?;
        let turns = self.store.list_turns(interview_id).await?;
        let resume = prompts::resume_excerpt(candidate.as_ref());

        let raw = self
            .oracle
            .ask(COMPONENT, &prompts::profile(&resume, &turns))
            .await?;

        let (body, source) = match read_profile(&raw) {
            Ok(body) => (body, ProfileSource::Oracle),
            Err(detail) if self.rubric_fallback => {
                warn!(
                    interview_id = %interview_id,
                    %detail,
                    "malformed profile reply, using rubric fallback"
                );
                debug!(raw_response = %raw, "profile reply");
                (RubricScorer::score(&turns, candidate.as_ref()), ProfileSource::Rubric)
            }
            Err(detail) => {
                warn!(interview_id = %interview_id, %detail, "malformed profile reply");
                debug!(raw_response = %raw, "profile reply");
                return Err(ProctorError::MalformedOracleOutput {
                    component: COMPONENT,
                    detail,
                });
            }
        };

        let profile = InterviewProfile {
            interview_id: interview_id.clone(),
            performance_score: body.performance_score,
            recommended_roles: body.recommended_roles,
            strengths: body.strengths,
            weaknesses: body.weaknesses,
            analytics: Analytics::from_turns(&turns),
            source,
            created_at: Utc::now(),
        };

        if self.store.insert_profile(&profile).await? {
            info!(
                interview_id = %interview_id,
                score = profile.performance_score,
                source = %profile.source,
                turns = turns.len(),
                "profile synthesized"
            );
            return Ok(profile);
        }

        debug!(interview_id = %interview_id, "profile written concurrently, returning stored row");
        self.store.get_profile(interview_id).await?.ok_or_else(|| {
            ProctorError::Internal(format!(
                "profile for {interview_id} vanished after insert conflict"
            ))
        })
    }
}

fn read_profile(raw: &str) -> Result<ProfileBody, String> {
    let value = decode::decode_value(raw).ok_or_else(|| "reply is not JSON".to_string())?;
    let map = value
        .as_object()
        .ok_or_else(|| "reply is not a JSON object".to_string())?;

    let score = match map.get("performanceScore").or_else(|| map.get("performance_score")) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| "performanceScore missing or not a number".to_string())?;
    if !(0.0..=100.0).contains(&score) {
        return Err(format!("performanceScore {score} outside 0-100"));
    }

    let mut recommended_roles = Vec::new();
    let listed = map
        .get("recommendedRoles")
        .or_else(|| map.get("recommended_roles"));
    for role in string_list(listed) {
        push_distinct(&mut recommended_roles, &role);
    }
    if recommended_roles.len() < MIN_RECOMMENDED_ROLES {
        return Err(format!(
            "recommendedRoles has {} distinct entries, expected at least {MIN_RECOMMENDED_ROLES}",
            recommended_roles.len()
        ));
    }

    Ok(ProfileBody {
        performance_score: score,
        recommended_roles,
        strengths: string_list(map.get("strengths")),
        weaknesses: string_list(map.get("weaknesses")),
    })
}

/// Appends `role` when it is new and the list still has room.
fn push_distinct(roles: &mut Vec<String>, role: &str) {
    let role = role.trim();
    if !role.is_empty()
        && roles.len() < MAX_RECOMMENDED_ROLES
        && !roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    {
        roles.push(role.to_string());
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Deterministic scorer used when the oracle's profile cannot be read.
///
/// Each criterion scores in `[0, 1]` and is weighted into a 0-100 total.
pub struct RubricScorer;

impl RubricScorer {
    pub const ACCURACY: f64 = 30.0;
    pub const DOMAIN_DEPTH: f64 = 25.0;
    pub const PROBLEM_SOLVING: f64 = 15.0;
    pub const COMMUNICATION: f64 = 10.0;
    pub const PRACTICAL_EXPERIENCE: f64 = 10.0;
    pub const COMPOSURE: f64 = 5.0;
    pub const ADAPTABILITY: f64 = 5.0;

    /// Answers shorter than this many words count against communication.
    const SUBSTANTIVE_WORDS: usize = 8;

    fn score(turns: &[Turn], candidate: Option<&Candidate>) -> ProfileBody {
        let graded: Vec<&Turn> = turns
            .iter()
            .filter(|t| t.section.is_none_or(Section::is_graded) && t.correct.is_some())
            .collect();
        let criteria = Self::criteria(&graded);

        let total: f64 = criteria.iter().map(|(_, weight, score)| weight * score).sum();
        let performance_score = (total * 100.0).round() / 100.0;

        let strengths = criteria
            .iter()
            .filter(|(_, _, s)| *s >= 0.7)
            .map(|(name, _, _)| (*name).to_string())
            .collect();
        let weaknesses = criteria
            .iter()
            .filter(|(_, _, s)| *s <= 0.4)
            .map(|(name, _, _)| (*name).to_string())
            .collect();

        let mut recommended_roles = resume_roles(candidate);
        for role in generic_roles(strongest_section(&graded)) {
            if recommended_roles.len() >= MIN_RECOMMENDED_ROLES {
                break;
            }
            push_distinct(&mut recommended_roles, role);
        }

        ProfileBody {
            performance_score,
            recommended_roles,
            strengths,
            weaknesses,
        }
    }

    fn criteria(graded: &[&Turn]) -> [(&'static str, f64, f64); 7] {
        let rate = |turns: &[&Turn]| {
            if turns.is_empty() {
                0.0
            } else {
                turns.iter().filter(|t| t.correct == Some(true)).count() as f64 / turns.len() as f64
            }
        };

        let accuracy = rate(graded);

        let correct_levels: Vec<f64> = graded
            .iter()
            .filter(|t| t.correct == Some(true))
            .filter_map(|t| t.difficulty_level.map(|d| f64::from(d.level())))
            .collect();
        let depth = if correct_levels.is_empty() {
            0.0
        } else {
            correct_levels.iter().sum::<f64>() / correct_levels.len() as f64 / 5.0
        };

        let hard: Vec<&Turn> = graded
            .iter()
            .copied()
            .filter(|t| t.difficulty_level.is_some_and(|d| d.level() >= 3))
            .collect();
        let problem_solving = rate(&hard);

        let communication = if graded.is_empty() {
            0.0
        } else {
            graded
                .iter()
                .filter(|t| {
                    t.candidate_answer.split_whitespace().count() >= Self::SUBSTANTIVE_WORDS
                })
                .count() as f64
                / graded.len() as f64
        };

        let experience: Vec<&Turn> = graded
            .iter()
            .copied()
            .filter(|t| t.section == Some(Section::WorkExperience))
            .collect();
        let practical = rate(&experience);

        let mut longest_miss = 0usize;
        let mut run = 0usize;
        for t in graded {
            if t.correct == Some(false) {
                run += 1;
                longest_miss = longest_miss.max(run);
            } else {
                run = 0;
            }
        }
        let composure = if graded.is_empty() {
            0.0
        } else {
            1.0 - longest_miss as f64 / graded.len() as f64
        };

        let misses = graded.iter().filter(|t| t.correct == Some(false)).count();
        let recoveries = graded
            .windows(2)
            .filter(|w| w[0].correct == Some(false) && w[1].correct == Some(true))
            .count();
        let adaptability = match (graded.is_empty(), misses) {
            (true, _) => 0.0,
            (false, 0) => 1.0,
            (false, n) => recoveries as f64 / n as f64,
        };

        [
            ("Answer accuracy", Self::ACCURACY, accuracy),
            ("Domain depth", Self::DOMAIN_DEPTH, depth),
            ("Problem solving", Self::PROBLEM_SOLVING, problem_solving),
            ("Communication", Self::COMMUNICATION, communication),
            ("Practical experience", Self::PRACTICAL_EXPERIENCE, practical),
            ("Composure", Self::COMPOSURE, composure),
            ("Adaptability", Self::ADAPTABILITY, adaptability),
        ]
    }
}

/// Roles named on the resume: profile title first, then recent job titles.
fn resume_roles(candidate: Option<&Candidate>) -> Vec<String> {
    let Some(resume) = candidate.and_then(|c| c.resume.as_ref()) else {
        return Vec::new();
    };
    let mut roles: Vec<String> = Vec::new();
    let titles = resume
        .profile_title
        .iter()
        .chain(resume.experience_summary.iter().map(|e| &e.title));
    for title in titles {
        push_distinct(&mut roles, title);
    }
    roles
}

/// Graded section with the best correct rate. Earlier sections win ties.
fn strongest_section(graded: &[&Turn]) -> Option<Section> {
    let mut best: Option<(Section, f64)> = None;
    for section in Section::REQUIRED {
        let answered: Vec<&Turn> = graded
            .iter()
            .copied()
            .filter(|t| t.section == Some(section))
            .collect();
        if answered.is_empty() {
            continue;
        }
        let correct = answered.iter().filter(|t| t.correct == Some(true)).count();
        let rate = correct as f64 / answered.len() as f64;
        if best.is_none_or(|(_, top)| rate > top) {
            best = Some((section, rate));
        }
    }
    best.map(|(section, _)| section)
}

/// Role suggestions used when the resume names fewer than two roles.
fn generic_roles(strongest: Option<Section>) -> [&'static str; 2] {
    match strongest {
        Some(Section::WorkExperience) => ["Senior Software Engineer", "Technical Lead"],
        Some(Section::Personality) => ["Software Engineer", "Engineering Team Lead"],
        _ => ["Software Engineer", "Backend Developer"],
    }
}
