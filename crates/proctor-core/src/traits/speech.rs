// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech services used by voice interviews.

use async_trait::async_trait;

use crate::error::ProctorError;
use crate::traits::adapter::PluginAdapter;

/// Speech-to-text token issuance and text-to-speech synthesis.
#[async_trait]
pub trait SpeechAdapter: PluginAdapter {
    /// Returns a short-lived token the client uses for streaming recognition.
    async fn streaming_token(&self) -> Result<String, ProctorError>;

    /// Synthesizes `text` into encoded audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProctorError>;
}
