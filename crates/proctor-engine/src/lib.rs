// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adaptive interview orchestration for Proctor.
//!
//! The engine sequences the unreliable text oracle into a consistent
//! interview: classify each utterance, grade answers, pick the next question
//! and its difficulty, close the session exactly once, and synthesize one
//! profile afterwards. Storage, oracle, live fan-out, and speech are all
//! injected as trait objects.

pub mod capture;
pub mod classifier;
pub mod decode;
pub mod generator;
pub mod grader;
pub mod oracle;
pub mod profile;
pub mod prompts;
pub mod session;
pub mod worker;

#[cfg(test)]
mod testing;

pub use capture::CaptureStrategy;
pub use classifier::{Action, Decision, DecisionClassifier};
pub use generator::{GeneratedQuestion, QuestionGenerator};
pub use grader::AnswerGrader;
pub use oracle::BoundedOracle;
pub use profile::{ProfileSynthesizer, RubricScorer};
pub use session::{GradeRequest, InterviewEngine, StartedSession};
pub use worker::{DrainStats, ProfileWorker};
