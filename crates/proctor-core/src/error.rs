// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Proctor interview engine.

use thiserror::Error;

use crate::types::InterviewStatus;

/// How a caller-facing surface should react to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal {
    /// Transient failure; the same request may be retried as a whole.
    TryAgain,
    /// The session is not usable by this caller; stop the interview UI.
    HardStop,
    /// Infrastructure or programming error.
    Fatal,
}

/// The primary error type used across all Proctor adapters and engine operations.
#[derive(Debug, Error)]
pub enum ProctorError {
    /// The caller is not the candidate that owns the interview.
    #[error("candidate {candidate_id} is not authorized for interview {interview_id}")]
    NotAuthorized {
        interview_id: String,
        candidate_id: String,
    },

    /// The requested transition is not legal from the interview's current status.
    #[error("cannot {operation} interview {interview_id} while it is {current}")]
    InvalidState {
        interview_id: String,
        current: InterviewStatus,
        operation: &'static str,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The text-generation dependency failed, timed out, or could not produce a usable answer.
    #[error("oracle unavailable: {message}")]
    OracleUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Oracle output could not be decoded even after fallback extraction.
    #[error("malformed oracle output in {component}: {detail}")]
    MalformedOracleOutput {
        component: &'static str,
        detail: String,
    },

    /// Request payload failed validation before any work was done.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProctorError {
    /// Shorthand for an [`ProctorError::OracleUnavailable`] without a source.
    pub fn oracle(message: impl Into<String>) -> Self {
        ProctorError::OracleUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ProctorError::Storage {
            source: Box::new(err),
        }
    }

    /// Returns true when retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProctorError::OracleUnavailable { .. } | ProctorError::Timeout { .. }
        )
    }

    /// Maps the error to the signal the interview UI acts on.
    pub fn signal(&self) -> FailureSignal {
        match self {
            ProctorError::OracleUnavailable { .. }
            | ProctorError::MalformedOracleOutput { .. }
            | ProctorError::Timeout { .. } => FailureSignal::TryAgain,
            ProctorError::NotAuthorized { .. }
            | ProctorError::InvalidState { .. }
            | ProctorError::NotFound { .. }
            | ProctorError::Validation(_) => FailureSignal::HardStop,
            ProctorError::Storage { .. } | ProctorError::Config(_) | ProctorError::Internal(_) => {
                FailureSignal::Fatal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_failures_are_retryable() {
        assert!(ProctorError::oracle("boom").is_retryable());
        assert!(
            ProctorError::Timeout {
                duration: std::time::Duration::from_secs(5)
            }
            .is_retryable()
        );
        assert!(!ProctorError::Validation("bad".into()).is_retryable());
    }

    #[test]
    fn state_errors_are_hard_stops() {
        let err = ProctorError::InvalidState {
            interview_id: "iv-1".into(),
            current: InterviewStatus::Completed,
            operation: "end",
        };
        assert_eq!(err.signal(), FailureSignal::HardStop);
        assert_eq!(
            err.to_string(),
            "cannot end interview iv-1 while it is COMPLETED"
        );

        let err = ProctorError::NotAuthorized {
            interview_id: "iv-1".into(),
            candidate_id: "c-2".into(),
        };
        assert_eq!(err.signal(), FailureSignal::HardStop);
    }

    #[test]
    fn oracle_failures_signal_try_again() {
        assert_eq!(ProctorError::oracle("down").signal(), FailureSignal::TryAgain);
        let malformed = ProctorError::MalformedOracleOutput {
            component: "batch_grader",
            detail: "not an array".into(),
        };
        assert_eq!(malformed.signal(), FailureSignal::TryAgain);
    }

    #[test]
    fn storage_errors_are_fatal() {
        let err = ProctorError::storage(std::io::Error::other("disk"));
        assert_eq!(err.signal(), FailureSignal::Fatal);
        assert!(err.to_string().contains("disk"));
    }
}
