// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live transcript store trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProctorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::TranscriptRecord;

/// Ordered, expiring utterance log keyed by session.
#[async_trait]
pub trait TranscriptStore: PluginAdapter {
    /// Appends `record` unless a record with the same id already exists.
    ///
    /// Returns `true` when the record was newly stored.
    async fn append(&self, session_key: &str, record: &TranscriptRecord)
    -> Result<bool, ProctorError>;

    /// Returns every live record for the key ordered by timestamp.
    async fn read_all(&self, session_key: &str) -> Result<Vec<TranscriptRecord>, ProctorError>;

    /// Sets the key's time-to-live. Only the first call for a key has effect.
    ///
    /// Returns `true` when this call set the expiry.
    async fn set_expiry(&self, session_key: &str, ttl: Duration) -> Result<bool, ProctorError>;
}
