// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generation oracle trait.

use async_trait::async_trait;

use crate::error::ProctorError;
use crate::traits::adapter::PluginAdapter;

/// A single-shot text generator.
///
/// Implementations hide vendor response shapes and return only the
/// generated text. Output is untrusted: it may be wrapped in prose or code
/// fences, or be structurally invalid.
#[async_trait]
pub trait OracleAdapter: PluginAdapter {
    /// Generates text for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ProctorError>;
}
