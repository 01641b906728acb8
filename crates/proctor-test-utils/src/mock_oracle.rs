// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock text oracle for deterministic testing.
//!
//! `MockOracle` implements `OracleAdapter` with pre-configured replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use proctor_core::types::{AdapterType, HealthStatus};
use proctor_core::{OracleAdapter, PluginAdapter, ProctorError};

/// A mock oracle that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. A queued failure surfaces as
/// `OracleUnavailable`. When the queue is empty, a default "mock response"
/// text is returned. Every prompt is recorded for assertions.
pub struct MockOracle {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockOracle {
    /// Create a new mock oracle with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock oracle pre-loaded with the given replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failure; the matching call returns `OracleUnavailable`.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.replies.lock().await.push_back(Err(message.into()));
    }

    /// All prompts received so far, oldest first.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }

    /// Replies still queued.
    pub async fn pending(&self) -> usize {
        self.replies.lock().await.len()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockOracle {
    fn name(&self) -> &str {
        "mock-oracle"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, ProctorError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ProctorError> {
        Ok(())
    }
}

#[async_trait]
impl OracleAdapter for MockOracle {
    async fn generate(&self, prompt: &str) -> Result<String, ProctorError> {
        self.prompts.lock().await.push(prompt.to_string());
        match self.replies.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ProctorError::oracle(message)),
            None => Ok("mock response".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_response_when_queue_empty() {
        let oracle = MockOracle::new();
        assert_eq!(oracle.generate("p").await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn queued_replies_and_failures_in_order() {
        let oracle = MockOracle::with_responses(vec!["first".to_string()]);
        oracle.add_failure("quota exhausted").await;
        oracle.add_response("third").await;

        assert_eq!(oracle.generate("a").await.unwrap(), "first");
        let err = oracle.generate("b").await.unwrap_err();
        assert!(matches!(err, ProctorError::OracleUnavailable { .. }));
        assert_eq!(oracle.generate("c").await.unwrap(), "third");
        assert_eq!(oracle.pending().await, 0);
        assert_eq!(oracle.prompts().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn plugin_adapter_identity() {
        let oracle = MockOracle::new();
        assert_eq!(oracle.name(), "mock-oracle");
        assert_eq!(oracle.adapter_type(), AdapterType::Oracle);
        assert_eq!(oracle.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
