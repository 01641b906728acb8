// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end interview scenarios.
//!
//! Each test creates an isolated TestHarness with temp SQLite, a scripted
//! mock oracle, and the in-process bus. Tests are independent and
//! order-insensitive.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use proctor_core::traits::storage::NO_SHOW_REASON;
use proctor_core::types::{
    CandidateId, InterviewStatus, Modality, ProfileSource, Role, Section, TranscriptRecord,
};
use proctor_core::{FailureSignal, InterviewEvent, InterviewId, InterviewStore, ProctorError};
use proctor_engine::session::DEFAULT_CANCEL_REASON;
use proctor_engine::{Action, DrainStats, GradeRequest};
use proctor_test_utils::{SeededInterview, TestHarness};

fn question_reply(text: &str, section: &str) -> String {
    json!({ "question": text, "section": section, "difficultyLevel": 1 }).to_string()
}

fn grade_reply(correct: bool, feedback: &str) -> String {
    json!({ "correct": correct, "aiFeedback": feedback }).to_string()
}

fn profile_reply(score: u32) -> String {
    json!({
        "performanceScore": score,
        "recommendedRoles": ["Backend Engineer", "Platform Engineer"],
        "strengths": ["Rust fundamentals"],
        "weaknesses": ["System design depth"]
    })
    .to_string()
}

fn answer(turn_id: &str, question: &str, section: Section) -> GradeRequest {
    GradeRequest {
        turn_id: turn_id.to_string(),
        question: question.to_string(),
        candidate_answer: "A reasonably detailed answer about ownership and borrowing".to_string(),
        difficulty_level: None,
        section: Some(section),
    }
}

fn record(id: &str, role: Role, text: &str, timestamp: i64) -> TranscriptRecord {
    TranscriptRecord {
        id: id.to_string(),
        role,
        text: text.to_string(),
        timestamp,
    }
}

async fn status_of(harness: &TestHarness, id: &InterviewId) -> InterviewStatus {
    harness.storage.get_interview(id).await.unwrap().unwrap().status
}

fn drain_events(rx: &mut broadcast::Receiver<InterviewEvent>) -> Vec<InterviewEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ---- Adaptive difficulty ----

#[tokio::test]
async fn correct_answers_raise_difficulty_two_through_five() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            question_reply("How does the borrow checker prevent data races?", "Skills"),
            grade_reply(true, "Clear explanation"),
            question_reply("When would you reach for Arc<Mutex<T>>?", "Skills"),
            grade_reply(true, "Good tradeoffs"),
            question_reply("How do you design a lock-free queue?", "Skills"),
            grade_reply(true, "Solid"),
            question_reply("Explain Pin and self-referential futures.", "Skills"),
        ])
        .build()
        .await
        .unwrap();
    let SeededInterview {
        candidate_id,
        interview_id,
    } = harness.started_text_interview(30).await.unwrap();

    let mut levels = Vec::new();
    let mut seen = HashSet::new();
    for (i, remaining) in [30, 27, 24, 21].into_iter().enumerate() {
        let next = harness
            .engine
            .next_question(&candidate_id, &interview_id, remaining, 30)
            .await
            .unwrap();
        levels.push(next.difficulty_level.unwrap().level());
        assert!(seen.insert(next.question.clone()), "question repeated: {}", next.question);
        assert_eq!(next.section, Some(Section::Skills));

        if i < 3 {
            let mut request = answer(&format!("turn-{i}"), &next.question, Section::Skills);
            request.difficulty_level = next.difficulty_level;
            let grade = harness
                .engine
                .grade_answer(&candidate_id, &interview_id, request)
                .await
                .unwrap();
            assert!(grade.correct);
        }
    }

    assert_eq!(levels, vec![2, 3, 4, 5]);
    assert_eq!(harness.storage.list_turns(&interview_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn repeated_question_is_reasked() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            question_reply("What is ownership in Rust?", "Skills"),
            grade_reply(false, "Incomplete"),
            question_reply("What is ownership in Rust", "Skills"),
            question_reply("Describe a production incident you handled.", "Work Experience"),
        ])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();

    let first = harness
        .engine
        .next_question(&s.candidate_id, &s.interview_id, 30, 30)
        .await
        .unwrap();
    let mut request = answer("t1", &first.question, Section::Skills);
    request.difficulty_level = first.difficulty_level;
    harness
        .engine
        .grade_answer(&s.candidate_id, &s.interview_id, request)
        .await
        .unwrap();

    let second = harness
        .engine
        .next_question(&s.candidate_id, &s.interview_id, 27, 30)
        .await
        .unwrap();
    assert_eq!(second.question, "Describe a production incident you handled.");
    assert_eq!(second.section, Some(Section::WorkExperience));
    // Incorrect at 2 steps down to 1.
    assert_eq!(second.difficulty_level.unwrap().level(), 1);

    let prompts = harness.oracle.prompts().await;
    assert_eq!(prompts.len(), 4);
    assert!(prompts[3].contains("What is ownership in Rust"));
}

#[tokio::test]
async fn sections_are_forced_as_time_runs_out() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            question_reply("What motivates you at work?", "Personality"),
            grade_reply(true, "ok"),
            question_reply("Which Rust crates do you know best?", "Skills"),
            grade_reply(true, "ok"),
            question_reply("Tell me about a recent project.", "Skills"),
        ])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();

    let mut sections = Vec::new();
    for (i, remaining) in [9, 6, 3].into_iter().enumerate() {
        let next = harness
            .engine
            .next_question(&s.candidate_id, &s.interview_id, remaining, 30)
            .await
            .unwrap();
        let section = next.section.unwrap();
        sections.push(section);
        if i < 2 {
            harness
                .engine
                .grade_answer(
                    &s.candidate_id,
                    &s.interview_id,
                    answer(&format!("t{i}"), &next.question, section),
                )
                .await
                .unwrap();
        }
    }

    assert_eq!(
        sections,
        vec![Section::Skills, Section::WorkExperience, Section::Personality]
    );
}

// ---- Utterance classification ----

#[tokio::test]
async fn skip_request_needs_confirmation_and_records_no_turn() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            json!({ "action": "confirm", "message": "Shall we skip this one?" }).to_string(),
            json!({ "action": "proceed" }).to_string(),
        ])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    let question = "How would you shard a Postgres table?";

    let first = harness
        .engine
        .submit_utterance(
            &s.candidate_id,
            &s.interview_id,
            question,
            "I don't know, can we move on?",
        )
        .await
        .unwrap();
    assert_eq!(first.action, Action::Confirm);
    assert_eq!(first.message.as_deref(), Some("Shall we skip this one?"));

    let second = harness
        .engine
        .submit_utterance(&s.candidate_id, &s.interview_id, question, "yes")
        .await
        .unwrap();
    assert_eq!(second.action, Action::Proceed);

    assert!(harness.storage.list_turns(&s.interview_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn proceed_without_prior_confirm_is_downgraded() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![json!({ "action": "proceed" }).to_string()])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();

    let decision = harness
        .engine
        .submit_utterance(&s.candidate_id, &s.interview_id, "Any question", "skip")
        .await
        .unwrap();
    assert_eq!(decision.action, Action::Confirm);
    assert_eq!(
        decision.message.as_deref(),
        Some(harness.config.interview.confirm_message.as_str())
    );
}

#[tokio::test]
async fn unreadable_classification_asks_to_confirm() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["I am not sure what you mean".to_string()])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();

    let decision = harness
        .engine
        .submit_utterance(&s.candidate_id, &s.interview_id, "Any question", "hmm")
        .await
        .unwrap();
    assert_eq!(decision.action, Action::Confirm);
}

// ---- Grading ----

#[tokio::test]
async fn duplicate_turn_id_is_stored_once() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![grade_reply(true, "Well reasoned")])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    let request = answer("turn-42", "Explain lifetimes.", Section::Skills);

    let first = harness
        .engine
        .grade_answer(&s.candidate_id, &s.interview_id, request.clone())
        .await
        .unwrap();
    let second = harness
        .engine
        .grade_answer(&s.candidate_id, &s.interview_id, request)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(harness.oracle.call_count().await, 1);
    assert_eq!(harness.storage.list_turns(&s.interview_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn oracle_failure_is_retryable_and_records_nothing() {
    let harness = TestHarness::builder().build().await.unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    harness.oracle.add_failure("quota exhausted").await;
    harness.oracle.add_response(grade_reply(true, "Recovered")).await;
    let request = answer("turn-1", "Explain traits.", Section::Skills);

    let err = harness
        .engine
        .grade_answer(&s.candidate_id, &s.interview_id, request.clone())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.signal(), FailureSignal::TryAgain);
    assert!(harness.storage.list_turns(&s.interview_id).await.unwrap().is_empty());

    let grade = harness
        .engine
        .grade_answer(&s.candidate_id, &s.interview_id, request)
        .await
        .unwrap();
    assert_eq!(grade.ai_feedback, "Recovered");
    assert_eq!(harness.storage.list_turns(&s.interview_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn introduction_is_recorded_without_grading() {
    let harness = TestHarness::builder().build().await.unwrap();
    let s = harness.seed_interview(Modality::Text, 30).await.unwrap();
    let started = harness
        .engine
        .start_session(&s.candidate_id, &s.interview_id)
        .await
        .unwrap();
    assert!(started.opening.question.contains("Ada"));
    assert_eq!(started.opening.section, Some(Section::Introduction));

    let grade = harness
        .engine
        .grade_answer(
            &s.candidate_id,
            &s.interview_id,
            answer("intro", &started.opening.question, Section::Introduction),
        )
        .await
        .unwrap();
    assert!(grade.correct);
    assert_eq!(harness.oracle.call_count().await, 0);
}

// ---- Lifecycle ----

#[tokio::test]
async fn end_twice_is_invalid_and_yields_one_profile() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![grade_reply(true, "ok"), profile_reply(78)])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    harness
        .engine
        .grade_answer(
            &s.candidate_id,
            &s.interview_id,
            answer("t1", "Explain traits.", Section::Skills),
        )
        .await
        .unwrap();

    harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 25, None)
        .await
        .unwrap();
    let err = harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 26, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProctorError::InvalidState {
            current: InterviewStatus::Completed,
            ..
        }
    ));

    let session = harness.storage.get_interview(&s.interview_id).await.unwrap().unwrap();
    assert_eq!(session.completion_min, Some(25));

    let worker = harness.worker();
    assert_eq!(
        worker.drain().await.unwrap(),
        DrainStats {
            completed: 1,
            failed: 0
        }
    );
    assert_eq!(worker.drain().await.unwrap(), DrainStats::default());

    let profile = harness
        .engine
        .get_profile(&s.candidate_id, &s.interview_id)
        .await
        .unwrap();
    assert_eq!(profile.performance_score, 78.0);
    assert_eq!(profile.source, ProfileSource::Oracle);
    assert_eq!(profile.analytics.total_questions, 1);
    assert_eq!(profile.analytics.correct_answers, 1);

    let calls = harness.oracle.call_count().await;
    let again = harness.engine.synthesizer().synthesize(&s.interview_id).await.unwrap();
    assert_eq!(again, profile);
    assert_eq!(harness.oracle.call_count().await, calls);
}

#[tokio::test]
async fn concurrent_synthesis_stores_one_profile() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![profile_reply(60), profile_reply(61)])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 30, None)
        .await
        .unwrap();

    let synthesizer = harness.engine.synthesizer();
    let (a, b) = tokio::join!(
        synthesizer.synthesize(&s.interview_id),
        synthesizer.synthesize(&s.interview_id)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    // Whichever call lost the insert race returns the winner's row.
    assert_eq!(a.performance_score, b.performance_score);

    let stored = harness.storage.get_profile(&s.interview_id).await.unwrap().unwrap();
    assert_eq!(stored.performance_score, a.performance_score);
    assert_eq!(stored.recommended_roles, a.recommended_roles);
}

#[tokio::test]
async fn start_requires_a_startable_status() {
    let harness = TestHarness::builder().build().await.unwrap();
    let s = harness.started_text_interview(30).await.unwrap();

    let err = harness
        .engine
        .start_session(&s.candidate_id, &s.interview_id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProctorError::InvalidState {
            current: InterviewStatus::Ongoing,
            operation: "start",
            ..
        }
    ));
    assert_eq!(err.signal(), FailureSignal::HardStop);

    let pending = harness.seed_interview(Modality::Text, 30).await.unwrap();
    let err = harness
        .engine
        .end_session(&pending.candidate_id, &pending.interview_id, 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::InvalidState { current: InterviewStatus::Pending, .. }));
    assert_eq!(status_of(&harness, &pending.interview_id).await, InterviewStatus::Pending);
}

#[tokio::test]
async fn other_candidates_are_not_authorized() {
    let harness = TestHarness::builder().build().await.unwrap();
    let s = harness.seed_interview(Modality::Text, 30).await.unwrap();
    let intruder = CandidateId::from("someone-else");

    let err = harness
        .engine
        .start_session(&intruder, &s.interview_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::NotAuthorized { .. }));
    assert_eq!(err.signal(), FailureSignal::HardStop);
    assert_eq!(status_of(&harness, &s.interview_id).await, InterviewStatus::Pending);

    let err = harness
        .engine
        .get_profile(&intruder, &s.interview_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::NotAuthorized { .. }));
}

#[tokio::test]
async fn profile_before_synthesis_is_not_found() {
    let harness = TestHarness::builder().build().await.unwrap();
    let s = harness.started_text_interview(30).await.unwrap();

    let err = harness
        .engine
        .get_profile(&s.candidate_id, &s.interview_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::NotFound { entity: "profile", .. }));

    let err = harness.engine.synthesizer().synthesize(&s.interview_id).await.unwrap_err();
    assert!(matches!(err, ProctorError::InvalidState { current: InterviewStatus::Ongoing, .. }));
}

#[tokio::test]
async fn cancel_uses_default_reason_once() {
    let harness = TestHarness::builder().build().await.unwrap();
    let s = harness.seed_interview(Modality::Text, 30).await.unwrap();

    harness.engine.cancel_session(&s.interview_id, Some("   ")).await.unwrap();
    let session = harness.storage.get_interview(&s.interview_id).await.unwrap().unwrap();
    assert_eq!(session.status, InterviewStatus::Cancelled);
    assert_eq!(session.cancellation_reason.as_deref(), Some(DEFAULT_CANCEL_REASON));
    assert!(session.cancelled_at.is_some());

    let err = harness
        .engine
        .cancel_session(&s.interview_id, Some("double click"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::InvalidState { current: InterviewStatus::Cancelled, .. }));

    let err = harness
        .engine
        .start_session(&s.candidate_id, &s.interview_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::InvalidState { .. }));
}

// ---- Sweep and worker ----

#[tokio::test]
async fn sweep_cancels_no_shows_and_completes_abandoned_sessions() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![profile_reply(40)])
        .build()
        .await
        .unwrap();
    let long_ago = Utc::now() - chrono::Duration::hours(3);
    let no_show = harness.seed_interview_at(long_ago, Modality::Text, 30).await.unwrap();
    let abandoned = harness.seed_interview_at(long_ago, Modality::Text, 30).await.unwrap();
    harness
        .engine
        .start_session(&abandoned.candidate_id, &abandoned.interview_id)
        .await
        .unwrap();
    let upcoming = harness.seed_interview(Modality::Text, 30).await.unwrap();

    let mut rx = harness.bus.subscribe();
    let report = harness.engine.sweep(Utc::now()).await.unwrap();
    assert_eq!(report.cancelled, vec![no_show.interview_id.clone()]);
    assert_eq!(report.force_completed, vec![abandoned.interview_id.clone()]);

    let events = drain_events(&mut rx);
    assert!(events.contains(&InterviewEvent::SessionCancelled {
        interview_id: no_show.interview_id.clone(),
        reason: NO_SHOW_REASON.to_string(),
    }));
    assert!(events.contains(&InterviewEvent::ProfileRequested {
        interview_id: abandoned.interview_id.clone(),
    }));

    assert_eq!(status_of(&harness, &upcoming.interview_id).await, InterviewStatus::Pending);
    let session = harness.storage.get_interview(&abandoned.interview_id).await.unwrap().unwrap();
    assert_eq!(session.status, InterviewStatus::Completed);
    assert_eq!(session.completion_min, Some(30));

    // Ending after the sweep loses the race.
    let err = harness
        .engine
        .end_session(&abandoned.candidate_id, &abandoned.interview_id, 20, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::InvalidState { .. }));

    assert_eq!(harness.worker().drain().await.unwrap().completed, 1);
    assert!(harness.storage.get_profile(&abandoned.interview_id).await.unwrap().is_some());
}

#[tokio::test]
async fn sweep_grades_abandoned_voice_transcript_before_completing() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            "I could not grade that.".to_string(),
            json!([{ "correct": true, "difficultyLevel": 4, "aiFeedback": "Thorough" }])
                .to_string(),
            profile_reply(62),
        ])
        .build()
        .await
        .unwrap();
    let long_ago = Utc::now() - chrono::Duration::hours(3);
    let s = harness.seed_interview_at(long_ago, Modality::Voice, 30).await.unwrap();
    harness
        .engine
        .start_session(&s.candidate_id, &s.interview_id)
        .await
        .unwrap();
    for r in [
        record("a1", Role::Assistant, "How do you profile a slow service?", 1_000),
        record("u1", Role::User, "Flamegraphs first, then targeted benchmarks.", 2_000),
    ] {
        harness
            .engine
            .record_transcript(&s.candidate_id, &s.interview_id, r)
            .await
            .unwrap();
    }

    // Unreadable grades leave the session for the next sweep.
    let report = harness.engine.sweep(Utc::now()).await.unwrap();
    assert!(report.force_completed.is_empty());
    assert_eq!(report.awaiting_replay, vec![s.interview_id.clone()]);
    assert_eq!(status_of(&harness, &s.interview_id).await, InterviewStatus::Ongoing);
    assert_eq!(harness.worker().drain().await.unwrap(), DrainStats::default());

    let report = harness.engine.sweep(Utc::now()).await.unwrap();
    assert_eq!(report.force_completed, vec![s.interview_id.clone()]);
    assert!(report.awaiting_replay.is_empty());

    let turns = harness.storage.list_turns(&s.interview_id).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].turn_id, "a1");
    assert_eq!(turns[0].correct, Some(true));
    let session = harness.storage.get_interview(&s.interview_id).await.unwrap().unwrap();
    assert_eq!(session.status, InterviewStatus::Completed);
    assert_eq!(session.completion_min, Some(30));

    assert_eq!(harness.worker().drain().await.unwrap().completed, 1);
    let profile = harness.storage.get_profile(&s.interview_id).await.unwrap().unwrap();
    assert_eq!(profile.analytics.total_questions, 1);
    assert_eq!(profile.analytics.correct_answers, 1);
}

#[tokio::test]
async fn running_worker_synthesizes_after_end() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![profile_reply(55)])
        .configure(|c| c.worker.poll_interval_secs = 1)
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();

    let worker = harness.worker();
    let wake = harness.bus.subscribe();
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    let handle = tokio::spawn(async move { worker.run(Some(wake), stop).await });

    harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 28, None)
        .await
        .unwrap();

    let profile = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(profile) = harness.storage.get_profile(&s.interview_id).await.unwrap() {
                break profile;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("worker should synthesize the profile");
    assert_eq!(profile.performance_score, 55.0);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn malformed_profile_uses_rubric_when_enabled() {
    let harness = TestHarness::builder()
        .with_rubric_fallback(true)
        .with_mock_responses(vec![
            grade_reply(true, "good"),
            grade_reply(false, "missed the point"),
            "I would rate this candidate highly overall.".to_string(),
        ])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    for (id, section) in [("t1", Section::Skills), ("t2", Section::WorkExperience)] {
        harness
            .engine
            .grade_answer(&s.candidate_id, &s.interview_id, answer(id, "A question", section))
            .await
            .unwrap();
    }
    harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 30, None)
        .await
        .unwrap();

    assert_eq!(harness.worker().drain().await.unwrap().completed, 1);
    let profile = harness
        .engine
        .get_profile(&s.candidate_id, &s.interview_id)
        .await
        .unwrap();
    assert_eq!(profile.source, ProfileSource::Rubric);
    assert!((0.0..=100.0).contains(&profile.performance_score));
    assert!((2..=3).contains(&profile.recommended_roles.len()));
    assert_eq!(profile.analytics.total_questions, 2);
    assert_eq!(profile.analytics.correct_answers, 1);
}

#[tokio::test]
async fn malformed_profile_without_fallback_is_retried() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["not a profile".to_string(), profile_reply(66)])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 30, None)
        .await
        .unwrap();

    let worker = harness.worker();
    assert_eq!(
        worker.drain().await.unwrap(),
        DrainStats {
            completed: 0,
            failed: 1
        }
    );
    assert!(harness.storage.get_profile(&s.interview_id).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_without_enough_roles_is_not_stored() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            json!({
                "performanceScore": 70,
                "recommendedRoles": [],
                "strengths": ["Clear reasoning"],
                "weaknesses": []
            })
            .to_string(),
            profile_reply(70),
        ])
        .build()
        .await
        .unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 30, None)
        .await
        .unwrap();

    assert_eq!(harness.worker().drain().await.unwrap().completed, 0);
    assert!(harness.storage.get_profile(&s.interview_id).await.unwrap().is_none());

    let profile = harness
        .engine
        .synthesizer()
        .synthesize(&s.interview_id)
        .await
        .unwrap();
    assert_eq!(
        profile.recommended_roles,
        vec!["Backend Engineer", "Platform Engineer"]
    );
}

// ---- Voice interviews ----

#[tokio::test]
async fn voice_end_replays_the_live_transcript() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![json!([
            { "correct": true, "difficultyLevel": 3, "aiFeedback": "Accurate" },
            { "correct": false, "difficultyLevel": 9, "aiFeedback": "Vague" }
        ])
        .to_string()])
        .build()
        .await
        .unwrap();
    let s = harness.seed_interview(Modality::Voice, 30).await.unwrap();
    harness
        .engine
        .start_session(&s.candidate_id, &s.interview_id)
        .await
        .unwrap();

    let err = harness
        .engine
        .grade_answer(&s.candidate_id, &s.interview_id, answer("t1", "q", Section::Skills))
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::Validation(_)));

    for r in [
        record("a1", Role::Assistant, "What drew you to Rust?", 1_000),
        record("u1", Role::User, "Memory safety without a GC.", 2_000),
        record("a2", Role::Assistant, "How does borrowing work?", 3_000),
        record("u2", Role::User, "Something about pointers.", 4_000),
    ] {
        assert!(harness
            .engine
            .record_transcript(&s.candidate_id, &s.interview_id, r)
            .await
            .unwrap());
    }

    harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 22, None)
        .await
        .unwrap();

    let turns = harness.storage.list_turns(&s.interview_id).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].turn_id, "a1");
    assert_eq!(turns[0].content, "What drew you to Rust?");
    assert_eq!(turns[0].candidate_answer, "Memory safety without a GC.");
    assert_eq!(turns[0].correct, Some(true));
    assert_eq!(turns[0].difficulty_level.unwrap().level(), 3);
    assert_eq!(turns[1].correct, Some(false));
    assert_eq!(turns[1].difficulty_level.unwrap().level(), 5);
    assert!(turns.iter().all(|t| t.section.is_none()));
    assert_eq!(status_of(&harness, &s.interview_id).await, InterviewStatus::Completed);
}

#[tokio::test]
async fn malformed_replay_persists_nothing() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            "Here are the grades you asked for.".to_string(),
            json!([{ "correct": true, "difficultyLevel": 2, "aiFeedback": "Fine" }]).to_string(),
        ])
        .build()
        .await
        .unwrap();
    let s = harness.seed_interview(Modality::Voice, 30).await.unwrap();
    harness
        .engine
        .start_session(&s.candidate_id, &s.interview_id)
        .await
        .unwrap();
    let transcript = vec![
        record("a1", Role::Assistant, "Why this role?", 1_000),
        record("u1", Role::User, "I enjoy distributed systems.", 2_000),
    ];

    let err = harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 15, Some(transcript.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::MalformedOracleOutput { component: "grader", .. }));
    assert_eq!(err.signal(), FailureSignal::TryAgain);
    assert_eq!(status_of(&harness, &s.interview_id).await, InterviewStatus::Ongoing);
    assert!(harness.storage.list_turns(&s.interview_id).await.unwrap().is_empty());
    assert_eq!(harness.worker().drain().await.unwrap(), DrainStats::default());

    harness
        .engine
        .end_session(&s.candidate_id, &s.interview_id, 15, Some(transcript))
        .await
        .unwrap();
    assert_eq!(harness.storage.list_turns(&s.interview_id).await.unwrap().len(), 1);
}

// ---- Transcript, live view, speech ----

#[tokio::test]
async fn transcript_appends_are_idempotent_and_snapshotted() {
    let harness = TestHarness::builder().build().await.unwrap();
    let s = harness.started_text_interview(30).await.unwrap();
    let mut rx = harness.bus.subscribe();

    let utterance = record("r1", Role::User, "Hello there", 1_000);
    assert!(harness
        .engine
        .record_transcript(&s.candidate_id, &s.interview_id, utterance.clone())
        .await
        .unwrap());
    assert!(!harness
        .engine
        .record_transcript(&s.candidate_id, &s.interview_id, utterance.clone())
        .await
        .unwrap());

    let snapshot = harness.engine.live_snapshot(&s.interview_id).await.unwrap();
    assert_eq!(snapshot, vec![utterance.clone()]);

    let events = drain_events(&mut rx);
    assert_eq!(
        events,
        vec![InterviewEvent::TranscriptAppended {
            interview_id: s.interview_id.clone(),
            record: utterance,
        }]
    );

    let err = harness
        .engine
        .live_snapshot(&InterviewId::from("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::NotFound { entity: "interview", .. }));
}

#[tokio::test]
async fn speech_requires_text_and_an_ongoing_session() {
    let harness = TestHarness::builder().build().await.unwrap();
    let s = harness.seed_interview(Modality::Voice, 30).await.unwrap();

    let err = harness
        .engine
        .speech_token(&s.candidate_id, &s.interview_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::InvalidState { .. }));

    harness
        .engine
        .start_session(&s.candidate_id, &s.interview_id)
        .await
        .unwrap();

    let err = harness
        .engine
        .synthesize_speech(&s.candidate_id, &s.interview_id, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, ProctorError::Validation(_)));
    assert!(harness.speech.synthesized().await.is_empty());

    let token = harness
        .engine
        .speech_token(&s.candidate_id, &s.interview_id)
        .await
        .unwrap();
    assert!(token.starts_with("mock-token-"));

    let audio = harness
        .engine
        .synthesize_speech(&s.candidate_id, &s.interview_id, "Next question")
        .await
        .unwrap();
    assert_eq!(audio, b"Next question".to_vec());
    assert_eq!(harness.speech.synthesized().await, vec!["Next question"]);
}
