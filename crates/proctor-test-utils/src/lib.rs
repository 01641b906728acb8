// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Proctor integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockOracle`] - Scripted text oracle with failure injection and prompt capture
//! - [`MockSpeech`] - Speech adapter returning canned tokens and audio
//! - [`TestHarness`] - Temp SQLite store, event bus, and engine wired together

pub mod harness;
pub mod mock_oracle;
pub mod mock_speech;

pub use harness::{SeededInterview, TestHarness};
pub use mock_oracle::MockOracle;
pub use mock_speech::MockSpeech;
