// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn persistence.
//!
//! Turns are append-only. `(interview_id, turn_id)` is unique, so a replayed
//! write is reported as a duplicate instead of creating a second row.

use proctor_core::traits::TurnWrite;
use proctor_core::types::{InterviewId, InterviewStatus, Turn};
use proctor_core::ProctorError;
use rusqlite::{Connection, OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{TURN_COLUMNS, enum_col, fmt_ts, turn_from_row};

/// Inserts one turn on an open transaction. Returns `false` for a duplicate.
pub(crate) fn insert_turn_on(conn: &Connection, turn: &Turn) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO turns
            (interview_id, turn_id, content, section, difficulty_level,
             candidate_answer, correct, ai_feedback, asked_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            turn.interview_id.as_str(),
            turn.turn_id,
            turn.content,
            turn.section.map(|s| s.to_string()),
            turn.difficulty_level.map(|d| d.level()),
            turn.candidate_answer,
            turn.correct,
            turn.ai_feedback,
            fmt_ts(turn.asked_at),
        ],
    )?;
    Ok(changed == 1)
}

/// Appends a turn if, and only if, the interview is ONGOING.
///
/// The status read and the insert share one transaction on the single writer,
/// so a turn can never land after the interview was completed.
pub async fn insert_turn(db: &Database, turn: &Turn) -> Result<TurnWrite, ProctorError> {
    let interview_id = turn.interview_id.to_string();
    let turn = turn.clone();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<Option<TurnWrite>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let status: Option<InterviewStatus> = tx
                .query_row(
                    "SELECT status FROM interviews WHERE id = ?1",
                    params![turn.interview_id.as_str()],
                    |row| enum_col(row, 0),
                )
                .optional()?;
            let outcome = match status {
                None => None,
                Some(InterviewStatus::Ongoing) => {
                    if insert_turn_on(&tx, &turn)? {
                        Some(TurnWrite::Inserted)
                    } else {
                        Some(TurnWrite::Duplicate)
                    }
                }
                Some(other) => Some(TurnWrite::Rejected(other)),
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)?;

    outcome.ok_or_else(|| ProctorError::NotFound {
        entity: "interview",
        id: interview_id,
    })
}

/// Fetches a single turn by its idempotency key.
pub async fn get_turn(
    db: &Database,
    interview: &InterviewId,
    turn_id: &str,
) -> Result<Option<Turn>, ProctorError> {
    let interview = interview.as_str().to_string();
    let turn_id = turn_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Turn>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {TURN_COLUMNS} FROM turns WHERE interview_id = ?1 AND turn_id = ?2"
                ),
                params![interview, turn_id],
                turn_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Lists an interview's turns ordered by when they were asked.
pub async fn list_turns(db: &Database, interview: &InterviewId) -> Result<Vec<Turn>, ProctorError> {
    let interview = interview.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Turn>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TURN_COLUMNS} FROM turns
                 WHERE interview_id = ?1 ORDER BY asked_at ASC, seq ASC"
            ))?;
            let rows = stmt.query_map(params![interview], turn_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
