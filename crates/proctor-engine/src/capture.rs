// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! How a session's turns reach storage.

use proctor_core::types::Modality;
use strum::Display;

/// Turn capture strategy, chosen from the session's modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CaptureStrategy {
    /// Every answer is graded and stored as it arrives; `end` adds nothing.
    PerTurn,
    /// Only the raw transcript is kept live; `end` grades it in one pass and
    /// stores the turns together with the completion.
    TranscriptReplay,
}

impl CaptureStrategy {
    pub fn for_modality(modality: Modality) -> Self {
        match modality {
            Modality::Text => CaptureStrategy::PerTurn,
            Modality::Voice => CaptureStrategy::TranscriptReplay,
        }
    }

    /// Whether `gradeAnswer` may record turns during the session.
    pub fn grades_live(self) -> bool {
        self == CaptureStrategy::PerTurn
    }

    /// Whether `end` must replay a transcript into turns.
    pub fn replays_on_end(self) -> bool {
        self == CaptureStrategy::TranscriptReplay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modality_selects_strategy() {
        let text = CaptureStrategy::for_modality(Modality::Text);
        assert_eq!(text, CaptureStrategy::PerTurn);
        assert!(text.grades_live());
        assert!(!text.replays_on_end());

        let voice = CaptureStrategy::for_modality(Modality::Voice);
        assert_eq!(voice, CaptureStrategy::TranscriptReplay);
        assert!(!voice.grades_live());
        assert!(voice.replays_on_end());
        assert_eq!(voice.to_string(), "transcript_replay");
    }
}
