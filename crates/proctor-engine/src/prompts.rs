// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt builders for every oracle call the engine makes.
//!
//! Each builder states the exact JSON shape it expects back. The decode
//! ladder in [`crate::decode`] tolerates the usual deviations, but asking
//! for bare JSON keeps those deviations rare.

use std::fmt::Write;

use proctor_core::types::{Candidate, Difficulty, ResumeProfile, Section, Turn};

use crate::grader::QaPair;

/// Upper bound on the resume excerpt embedded in prompts.
const RESUME_EXCERPT_MAX_CHARS: usize = 4000;
/// Responsibilities listed per role in the excerpt.
const RESPONSIBILITIES_PER_ROLE: usize = 3;

/// Renders a compact, prompt-sized view of a candidate's resume.
pub fn resume_excerpt(candidate: Option<&Candidate>) -> String {
    let Some(candidate) = candidate else {
        return "No resume on file.".to_string();
    };
    let mut out = format!("Candidate: {} {}\n", candidate.first_name, candidate.last_name);
    match &candidate.resume {
        Some(resume) => render_resume(&mut out, resume),
        None => out.push_str("No resume on file.\n"),
    }
    truncate_chars(&out, RESUME_EXCERPT_MAX_CHARS)
}

fn render_resume(out: &mut String, resume: &ResumeProfile) {
    if let Some(title) = resume.profile_title.as_deref().filter(|t| !t.is_empty()) {
        let _ = writeln!(out, "Title: {title}");
    }
    if let Some(skills) = compact_json(&resume.technical_skills) {
        let _ = writeln!(out, "Technical skills: {skills}");
    }
    if let Some(skills) = compact_json(&resume.other_skills) {
        let _ = writeln!(out, "Other skills: {skills}");
    }
    if !resume.experience_summary.is_empty() {
        out.push_str("Experience:\n");
        for role in &resume.experience_summary {
            let _ = writeln!(out, "- {} at {} ({})", role.title, role.company, role.dates);
            for duty in role.responsibilities.iter().take(RESPONSIBILITIES_PER_ROLE) {
                let _ = writeln!(out, "  * {duty}");
            }
        }
    }
    if !resume.projects.is_empty() {
        out.push_str("Projects:\n");
        for project in &resume.projects {
            let summary = project.description.first().map(String::as_str).unwrap_or("");
            let _ = writeln!(out, "- {}: {summary}", project.name);
        }
    }
    if let Some(education) = resume.education_summary.as_deref().filter(|e| !e.is_empty()) {
        let _ = writeln!(out, "Education: {education}");
    }
    if let Some(certs) = compact_json(&resume.certifications) {
        let _ = writeln!(out, "Certifications: {certs}");
    }
}

fn compact_json(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(a) if a.is_empty() => None,
        serde_json::Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Asks whether an utterance answers the question, asks to skip, or confirms a skip.
pub fn classify(question: &str, utterance: &str) -> String {
    format!(
        r#"You are moderating a live job interview. Decide what the candidate's latest message means relative to the interviewer's last question.

Last question: "{question}"
Candidate message: "{utterance}"

Choose exactly one action:
- "next_step": the message is an attempt to answer the question (even a wrong or partial one).
- "confirm": the message is off-topic, unclear, or asks to skip the question. Include a short "message" asking the candidate to clarify or confirm they want to skip.
- "proceed": the candidate has just confirmed they want to skip the question.

Reply with JSON only, no prose:
{{"action": "next_step" | "confirm" | "proceed", "message": "optional text for the candidate"}}"#
    )
}

/// Grades a single answer.
pub fn grade(
    resume: &str,
    question: &str,
    answer: &str,
    difficulty: Option<Difficulty>,
    section: Option<Section>,
) -> String {
    let difficulty = difficulty.map_or_else(|| "unspecified".to_string(), |d| d.to_string());
    let section = section.map_or_else(|| "unspecified".to_string(), |s| s.to_string());
    format!(
        r#"You are grading one answer from a technical job interview.

Resume excerpt:
{resume}

Section: {section}
Difficulty (1-5): {difficulty}
Question: "{question}"
Candidate answer: "{answer}"

Judge whether the answer is substantially correct for the stated difficulty.
Write "aiFeedback" as a short corrective note of 6 to 8 words.

Reply with JSON only, no prose:
{{"correct": true | false, "aiFeedback": "6-8 word note"}}"#
    )
}

/// Grades a whole replayed transcript in one call.
pub fn replay(resume: &str, pairs: &[QaPair]) -> String {
    let mut exchanges = String::new();
    for (i, pair) in pairs.iter().enumerate() {
        let _ = writeln!(
            exchanges,
            "{}. Question: \"{}\"\n   Answer: \"{}\"",
            i + 1,
            pair.question,
            pair.answer
        );
    }
    format!(
        r#"You are grading a completed job interview transcript.

Resume excerpt:
{resume}

Exchanges ({count}):
{exchanges}
For every exchange, in the same order, decide whether the answer is substantially correct, estimate the question's difficulty from 1 (easy) to 5 (expert), and write a 6-8 word corrective note.

Reply with a JSON array only, exactly {count} elements, no prose:
[{{"content": "question text", "candidateAnswer": "answer text", "correct": true | false, "difficultyLevel": 1-5, "aiFeedback": "6-8 word note"}}]"#,
        count = pairs.len()
    )
}

/// Inputs the question prompt is built from.
pub struct QuestionPrompt<'a> {
    pub resume: &'a str,
    pub turns: &'a [Turn],
    pub prior_questions: &'a [String],
    pub rejected: &'a [String],
    pub difficulty: Difficulty,
    pub uncovered: &'a [Section],
    pub forced: Option<Section>,
    pub remaining_min: u32,
    pub total_min: u32,
}

/// Asks for the next interview question.
pub fn question(p: &QuestionPrompt<'_>) -> String {
    let mut history = String::new();
    for turn in p.turns {
        let section = turn.section.map_or_else(|| "-".to_string(), |s| s.to_string());
        let verdict = match turn.correct {
            Some(true) => "correct",
            Some(false) => "incorrect",
            None => "ungraded",
        };
        let _ = writeln!(history, "- [{section}] {} ({verdict})", turn.content);
    }
    if history.is_empty() {
        history.push_str("- none yet\n");
    }

    let mut avoid = String::new();
    for q in p.prior_questions.iter().chain(p.rejected) {
        let _ = writeln!(avoid, "- {q}");
    }
    if avoid.is_empty() {
        avoid.push_str("- none\n");
    }

    let section_rule = match p.forced {
        Some(section) => format!("The next question MUST be from the \"{section}\" section."),
        None if p.uncovered.is_empty() => {
            "All required sections are covered; pick whichever section fits best.".to_string()
        }
        None => {
            let names: Vec<String> = p.uncovered.iter().map(|s| format!("\"{s}\"")).collect();
            format!(
                "Sections not covered yet: {}. Make sure each is covered before time runs out.",
                names.join(", ")
            )
        }
    };

    format!(
        r#"You are conducting an adaptive technical job interview.

Resume excerpt:
{resume}

Time remaining: {remaining} of {total} minutes.
Target difficulty (1-5): {difficulty}
{section_rule}

Questions asked so far:
{history}
Never repeat or rephrase any of these questions:
{avoid}
Ask exactly one new question tailored to the resume. Sections are "Skills", "Work Experience", and "Personality".

Reply with JSON only, no prose:
{{"question": "text", "section": "Skills" | "Work Experience" | "Personality", "difficultyLevel": {difficulty}}}"#,
        resume = p.resume,
        remaining = p.remaining_min,
        total = p.total_min,
        difficulty = p.difficulty,
    )
}

/// Asks for the post-interview performance profile.
pub fn profile(resume: &str, turns: &[Turn]) -> String {
    let mut transcript = String::new();
    for (i, turn) in turns.iter().enumerate() {
        let section = turn.section.map_or_else(|| "-".to_string(), |s| s.to_string());
        let level = turn.difficulty_level.map_or_else(|| "-".to_string(), |d| d.to_string());
        let verdict = match turn.correct {
            Some(true) => "correct",
            Some(false) => "incorrect",
            None => "ungraded",
        };
        let _ = writeln!(
            transcript,
            "{}. [{section}, difficulty {level}, {verdict}] Q: \"{}\" A: \"{}\"",
            i + 1,
            turn.content,
            turn.candidate_answer
        );
    }
    format!(
        r#"You are writing the final assessment of a completed job interview.

Resume excerpt:
{resume}

Graded exchanges:
{transcript}
Score the candidate from 0 to 100 using this rubric:
- accuracy of answers: 30
- domain depth: 25
- problem solving: 15
- communication: 10
- practical experience: 10
- composure under pressure: 5
- adaptability: 5

Recommend 2 or 3 job roles that fit the candidate.

Reply with JSON only, no prose:
{{"performanceScore": 0-100, "recommendedRoles": ["role"], "strengths": ["short phrase"], "weaknesses": ["short phrase"], "analytics": {{"totalQuestions": n, "correctAnswers": n, "averageDifficulty": n}}}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proctor_core::types::{CandidateId, Experience, InterviewId, Project};

    fn candidate() -> Candidate {
        Candidate {
            candidate_id: CandidateId::from("c-1"),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            resume: Some(ResumeProfile {
                profile_title: Some("Backend Engineer".into()),
                technical_skills: serde_json::json!(["Rust", "PostgreSQL"]),
                experience_summary: vec![Experience {
                    dates: "2021-2025".into(),
                    title: "Engineer".into(),
                    company: "Analytical Engines".into(),
                    location: "London".into(),
                    responsibilities: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                }],
                projects: vec![Project {
                    name: "Difference".into(),
                    description: vec!["Computes tables".into()],
                }],
                ..ResumeProfile::default()
            }),
        }
    }

    #[test]
    fn excerpt_renders_key_fields() {
        let text = resume_excerpt(Some(&candidate()));
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("Title: Backend Engineer"));
        assert!(text.contains(r#"["Rust","PostgreSQL"]"#));
        assert!(text.contains("Engineer at Analytical Engines"));
        assert!(text.contains("  * c"));
        assert!(!text.contains("  * d"));
        assert!(text.contains("Difference: Computes tables"));
        assert!(!text.contains("Certifications"));
    }

    #[test]
    fn excerpt_without_candidate_or_resume() {
        assert_eq!(resume_excerpt(None), "No resume on file.");
        let mut c = candidate();
        c.resume = None;
        assert!(resume_excerpt(Some(&c)).ends_with("No resume on file.\n"));
    }

    #[test]
    fn excerpt_is_bounded() {
        let mut c = candidate();
        if let Some(resume) = c.resume.as_mut() {
            resume.education_summary = Some("x".repeat(10_000));
        }
        let text = resume_excerpt(Some(&c));
        assert!(text.chars().count() <= RESUME_EXCERPT_MAX_CHARS + 3);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn question_prompt_names_forced_section_and_prior_questions() {
        let turn = Turn {
            turn_id: "t1".into(),
            interview_id: InterviewId::from("iv"),
            content: "What is ownership?".into(),
            section: Some(Section::Skills),
            difficulty_level: Difficulty::new(2),
            candidate_answer: "Moves".into(),
            correct: Some(true),
            ai_feedback: None,
            asked_at: Utc::now(),
        };
        let prior = vec!["What is ownership?".to_string()];
        let text = question(&QuestionPrompt {
            resume: "r",
            turns: std::slice::from_ref(&turn),
            prior_questions: &prior,
            rejected: &[],
            difficulty: Difficulty::new(3).unwrap(),
            uncovered: &[Section::WorkExperience, Section::Personality],
            forced: Some(Section::WorkExperience),
            remaining_min: 6,
            total_min: 30,
        });
        assert!(text.contains("MUST be from the \"Work Experience\" section"));
        assert!(text.contains("[Skills] What is ownership? (correct)"));
        assert!(text.contains("Target difficulty (1-5): 3"));
        assert!(text.contains("6 of 30 minutes"));
    }

    #[test]
    fn replay_prompt_states_count() {
        let pairs = vec![QaPair {
            turn_id: "a1".into(),
            question: "Q?".into(),
            answer: "A.".into(),
            asked_at: Utc::now(),
        }];
        let text = replay("r", &pairs);
        assert!(text.contains("exactly 1 elements"));
        assert!(text.contains("1. Question: \"Q?\""));
    }
}
