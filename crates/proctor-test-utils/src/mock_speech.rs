// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock speech adapter for voice-interview tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use proctor_core::types::{AdapterType, HealthStatus};
use proctor_core::{PluginAdapter, ProctorError, SpeechAdapter};

/// Returns fresh tokens and echoes text back as "audio" bytes.
pub struct MockSpeech {
    synthesized: Arc<Mutex<Vec<String>>>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self {
            synthesized: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Texts passed to `synthesize`, oldest first.
    pub async fn synthesized(&self) -> Vec<String> {
        self.synthesized.lock().await.clone()
    }
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSpeech {
    fn name(&self) -> &str {
        "mock-speech"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, ProctorError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ProctorError> {
        Ok(())
    }
}

#[async_trait]
impl SpeechAdapter for MockSpeech {
    async fn streaming_token(&self) -> Result<String, ProctorError> {
        Ok(format!("mock-token-{}", uuid::Uuid::new_v4()))
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProctorError> {
        self.synthesized.lock().await.push(text.to_string());
        Ok(text.as_bytes().to_vec())
    }
}
