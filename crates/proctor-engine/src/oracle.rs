// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-bounded oracle calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use proctor_core::{OracleAdapter, ProctorError};
use tracing::{debug, warn};

/// An oracle adapter plus the per-call deadline every component shares.
///
/// Adapter errors and deadline misses both surface as
/// [`ProctorError::OracleUnavailable`], so components never see raw
/// adapter failures.
#[derive(Clone)]
pub struct BoundedOracle {
    adapter: Arc<dyn OracleAdapter + Send + Sync>,
    timeout: Duration,
}

impl BoundedOracle {
    pub fn new(adapter: Arc<dyn OracleAdapter + Send + Sync>, timeout: Duration) -> Self {
        Self { adapter, timeout }
    }

    /// Sends `prompt` and returns the raw reply text.
    pub async fn ask(&self, component: &'static str, prompt: &str) -> Result<String, ProctorError> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.adapter.generate(prompt)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(text)) => {
                debug!(component, elapsed_ms, chars = text.len(), "oracle replied");
                Ok(text)
            }
            Ok(Err(e @ ProctorError::OracleUnavailable { .. })) => {
                warn!(component, elapsed_ms, error = %e, "oracle call failed");
                Err(e)
            }
            Ok(Err(e)) => {
                warn!(component, elapsed_ms, error = %e, "oracle call failed");
                Err(ProctorError::OracleUnavailable {
                    message: format!("{component}: {e}"),
                    source: Some(Box::new(e)),
                })
            }
            Err(_) => {
                warn!(
                    component,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "oracle call timed out"
                );
                Err(ProctorError::oracle(format!(
                    "{component}: no reply within {:?}",
                    self.timeout
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedOracle;

    #[tokio::test]
    async fn passes_text_through() {
        let oracle = BoundedOracle::new(
            Arc::new(ScriptedOracle::new(["hello"])),
            Duration::from_secs(1),
        );
        assert_eq!(oracle.ask("test", "p").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn adapter_errors_become_oracle_unavailable() {
        let oracle = BoundedOracle::new(
            Arc::new(ScriptedOracle::failing(ProctorError::Internal("socket closed".into()))),
            Duration::from_secs(1),
        );
        let err = oracle.ask("grader", "p").await.unwrap_err();
        assert!(matches!(err, ProctorError::OracleUnavailable { .. }));
        assert!(err.to_string().contains("grader"));
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_oracle_times_out() {
        let oracle = BoundedOracle::new(
            Arc::new(ScriptedOracle::new(["late"]).with_delay(Duration::from_secs(60))),
            Duration::from_secs(2),
        );
        let err = oracle.ask("generator", "p").await.unwrap_err();
        assert!(matches!(err, ProctorError::OracleUnavailable { .. }));
        assert!(err.to_string().contains("no reply within"));
    }
}
