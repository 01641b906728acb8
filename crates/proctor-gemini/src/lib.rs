// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini oracle adapter for Proctor.
//!
//! Implements [`OracleAdapter`] over `generateContent`. Only the generated
//! text crosses the adapter boundary; vendor response shapes stay here.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use proctor_config::model::GeminiConfig;
use proctor_core::types::{AdapterType, HealthStatus};
use proctor_core::{OracleAdapter, PluginAdapter, ProctorError};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::client::GeminiClient;
use crate::types::GenerateContentRequest;

/// Gemini-backed text oracle.
///
/// API key resolution order: config -> `GEMINI_API_KEY` env var -> error.
pub struct GeminiOracle {
    client: GeminiClient,
}

impl GeminiOracle {
    pub fn new(config: &GeminiConfig) -> Result<Self, ProctorError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = GeminiClient::new(
            &api_key,
            config.model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )?;
        info!(model = %config.model, "Gemini oracle initialized");
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

fn resolve_api_key(config_key: Option<&str>) -> Result<SecretString, ProctorError> {
    match config_key {
        Some(key) if !key.is_empty() => Ok(SecretString::from(key.to_string())),
        _ => std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| {
                ProctorError::Config(
                    "Gemini API key not found. Set gemini.api_key in config or \
                     GEMINI_API_KEY environment variable."
                        .into(),
                )
            }),
    }
}

#[async_trait]
impl PluginAdapter for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, ProctorError> {
        // Avoid spending quota on health checks.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ProctorError> {
        debug!("Gemini oracle shutting down");
        Ok(())
    }
}

#[async_trait]
impl OracleAdapter for GeminiOracle {
    async fn generate(&self, prompt: &str) -> Result<String, ProctorError> {
        let request = GenerateContentRequest::from_prompt(prompt);
        let response = self.client.generate_content(&request).await?;

        if let Some(text) = response.text() {
            return Ok(text);
        }

        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
            .or_else(|| {
                response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.clone())
            })
            .unwrap_or_else(|| "no candidates".to_string());
        warn!(model = %self.client.model(), reason = %reason, "Gemini returned no text");
        Err(ProctorError::oracle(format!("Gemini returned no text: {reason}")))
    }
}
