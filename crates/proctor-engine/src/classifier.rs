// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decision classifier: answer, clarify, or skip.
//!
//! Anything the classifier cannot read with confidence becomes `confirm`.
//! Asking the candidate again is cheap; grading an off-topic utterance or
//! silently skipping a question is not.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, warn};

use proctor_core::ProctorError;

use crate::decode;
use crate::oracle::BoundedOracle;
use crate::prompts;

const COMPONENT: &str = "classifier";

/// What the session should do with the latest utterance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The utterance answers the question; grade it.
    NextStep,
    /// Ask the candidate to clarify or confirm a skip.
    Confirm,
    /// The candidate confirmed the skip; move on without grading.
    Proceed,
}

/// Classifier verdict returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Decision {
    pub fn confirm(message: Option<String>) -> Self {
        Self {
            action: Action::Confirm,
            message,
        }
    }
}

/// Classifies candidate utterances against the last question.
pub struct DecisionClassifier {
    oracle: BoundedOracle,
}

impl DecisionClassifier {
    pub fn new(oracle: BoundedOracle) -> Self {
        Self { oracle }
    }

    /// One oracle call. Unavailability is an error, not a classification.
    pub async fn classify(
        &self,
        question: &str,
        utterance: &str,
    ) -> Result<Decision, ProctorError> {
        let raw = self
            .oracle
            .ask(COMPONENT, &prompts::classify(question, utterance))
            .await?;
        let decision = interpret(&raw);
        debug!(action = %decision.action, "utterance classified");
        Ok(decision)
    }
}

/// Reads a classifier reply, falling back to `confirm`.
///
/// Accepted shapes: `{"action", "message"}`, the same object under a
/// `decision` or `response` key, a one-element array of any of those, or a
/// bare action string (quoted or not).
pub fn interpret(raw: &str) -> Decision {
    let decision = match decode::decode_value(raw) {
        Some(value) => from_value(&value),
        None => parse_action(raw).map(|action| Decision {
            action,
            message: None,
        }),
    };
    decision.unwrap_or_else(|| {
        warn!("unreadable classifier reply, defaulting to confirm");
        debug!(raw_response = %raw, "classifier reply");
        Decision::confirm(None)
    })
}

fn from_value(value: &Value) -> Option<Decision> {
    match value {
        Value::String(s) => parse_action(s).map(|action| Decision {
            action,
            message: None,
        }),
        Value::Array(items) if items.len() == 1 => from_value(&items[0]),
        Value::Object(map) => {
            for wrapper in ["decision", "response"] {
                if let Some(inner) = map.get(wrapper) {
                    return from_value(inner);
                }
            }
            let action = map.get("action").and_then(Value::as_str).and_then(parse_action)?;
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            Some(Decision { action, message })
        }
        _ => None,
    }
}

fn parse_action(raw: &str) -> Option<Action> {
    let normalized: String = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect();
    normalized.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::testing::ScriptedOracle;

    #[test]
    fn plain_object() {
        let d = interpret(r#"{"action": "next_step"}"#);
        assert_eq!(d, Decision { action: Action::NextStep, message: None });
    }

    #[test]
    fn confirm_keeps_message() {
        let d = interpret(r#"{"action":"confirm","message":"Do you want to skip this one?"}"#);
        assert_eq!(d.action, Action::Confirm);
        assert_eq!(d.message.as_deref(), Some("Do you want to skip this one?"));
    }

    #[test]
    fn wrapper_shapes_are_tolerated() {
        assert_eq!(interpret(r#"{"decision": {"action": "proceed"}}"#).action, Action::Proceed);
        assert_eq!(interpret(r#"{"response": {"action": "next_step"}}"#).action, Action::NextStep);
        assert_eq!(interpret(r#"[{"action": "proceed"}]"#).action, Action::Proceed);
        assert_eq!(interpret(r#""next_step""#).action, Action::NextStep);
        assert_eq!(interpret("proceed").action, Action::Proceed);
        assert_eq!(interpret("```json\n{\"action\": \"Next-Step\"}\n```").action, Action::NextStep);
    }

    #[test]
    fn unreadable_or_unknown_is_confirm() {
        assert_eq!(interpret("I think they are answering.").action, Action::Confirm);
        assert_eq!(interpret(r#"{"action": "grade"}"#).action, Action::Confirm);
        let many = interpret(r#"[{"action":"proceed"},{"action":"next_step"}]"#);
        assert_eq!(many.action, Action::Confirm);
        assert_eq!(interpret("").action, Action::Confirm);
        assert_eq!(interpret(r#"{"message": "hi"}"#).action, Action::Confirm);
    }

    #[test]
    fn blank_message_is_dropped() {
        assert_eq!(interpret(r#"{"action":"confirm","message":"  "}"#).message, None);
    }

    #[tokio::test]
    async fn oracle_failure_is_an_error_not_a_verdict() {
        let oracle = Arc::new(ScriptedOracle::failing(ProctorError::oracle("down")));
        let classifier =
            DecisionClassifier::new(BoundedOracle::new(oracle, Duration::from_secs(1)));
        let err = classifier.classify("Q", "A").await.unwrap_err();
        assert!(matches!(err, ProctorError::OracleUnavailable { .. }));
    }

    #[tokio::test]
    async fn prompt_carries_question_and_utterance() {
        let oracle = Arc::new(ScriptedOracle::new([r#"{"action":"next_step"}"#]));
        let classifier =
            DecisionClassifier::new(BoundedOracle::new(oracle.clone(), Duration::from_secs(1)));
        let d = classifier
            .classify("What is a trait object?", "A dyn pointer with a vtable")
            .await
            .unwrap();
        assert_eq!(d.action, Action::NextStep);
        let prompts = oracle.prompts();
        assert!(prompts[0].contains("What is a trait object?"));
        assert!(prompts[0].contains("A dyn pointer with a vtable"));
    }
}
