// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Proctor interview engine.
//!
//! This crate provides the adapter trait definitions, error type, and domain
//! types shared across the Proctor workspace. Storage, oracle, transcript, and
//! speech backends implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{FailureSignal, ProctorError};
pub use types::{AdapterType, CandidateId, HealthStatus, InterviewId};

pub use traits::{
    Completion, InterviewEvent, InterviewStore, LiveChannel, OracleAdapter, PluginAdapter,
    SpeechAdapter, TranscriptStore, TurnWrite,
};
