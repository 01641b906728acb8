// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live session events fanned out to observers.

use serde::{Deserialize, Serialize};

use crate::types::{InterviewId, TranscriptRecord, Turn};

/// Events published while interviews run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterviewEvent {
    SessionStarted {
        interview_id: InterviewId,
    },
    TranscriptAppended {
        interview_id: InterviewId,
        record: TranscriptRecord,
    },
    TurnRecorded {
        interview_id: InterviewId,
        turn: Turn,
    },
    SessionEnded {
        interview_id: InterviewId,
        completion_min: u32,
    },
    SessionCancelled {
        interview_id: InterviewId,
        reason: String,
    },
    /// A profile job was enqueued and a worker should pick it up.
    ProfileRequested {
        interview_id: InterviewId,
    },
}

impl InterviewEvent {
    pub fn interview_id(&self) -> &InterviewId {
        match self {
            InterviewEvent::SessionStarted { interview_id }
            | InterviewEvent::TranscriptAppended { interview_id, .. }
            | InterviewEvent::TurnRecorded { interview_id, .. }
            | InterviewEvent::SessionEnded { interview_id, .. }
            | InterviewEvent::SessionCancelled { interview_id, .. }
            | InterviewEvent::ProfileRequested { interview_id } => interview_id,
        }
    }
}

/// Fire-and-forget fan-out of live events. No acknowledgement is expected.
pub trait LiveChannel: Send + Sync + 'static {
    fn publish(&self, event: InterviewEvent);
}
