// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod live;
pub mod oracle;
pub mod speech;
pub mod storage;
pub mod transcript;

pub use adapter::PluginAdapter;
pub use live::{InterviewEvent, LiveChannel};
pub use oracle::OracleAdapter;
pub use speech::SpeechAdapter;
pub use storage::{Completion, InterviewStore, TurnWrite};
pub use transcript::TranscriptStore;
