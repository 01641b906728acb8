// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted oracle for unit tests inside this crate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use proctor_core::types::{AdapterType, HealthStatus};
use proctor_core::{OracleAdapter, PluginAdapter, ProctorError};

pub(crate) struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    failure: Mutex<Option<ProctorError>>,
    delay: Option<Duration>,
}

impl ScriptedOracle {
    pub(crate) fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            delay: None,
        }
    }

    pub(crate) fn failing(error: ProctorError) -> Self {
        let oracle = Self::new(Vec::<String>::new());
        *oracle.failure.lock().unwrap() = Some(error);
        oracle
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluginAdapter for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 0, 0)
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
impl OracleAdapter for ScriptedOracle {
    async fn generate(&self, prompt: &str) -> Result<String, ProctorError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "scripted reply".to_string()))
    }
}
