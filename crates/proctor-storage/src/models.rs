// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column encodings and row mappers shared by the query modules.
//!
//! Timestamps are stored as RFC 3339 UTC strings with millisecond precision,
//! the same shape SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ')` produces, so they
//! compare correctly as text.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

pub use proctor_core::types::QueueEntry;
use proctor_core::types::{
    CandidateId, Difficulty, InterviewId, InterviewSession, Section, Turn,
};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Formats a timestamp for storage.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn conversion_err<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn invalid_value(idx: usize, detail: String) -> rusqlite::Error {
    conversion_err(idx, Type::Text, std::io::Error::other(detail))
}

/// Reads a stored timestamp column.
pub fn ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, Type::Text, e))
}

/// Reads a nullable timestamp column.
pub fn opt_ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_err(idx, Type::Text, e))
    })
    .transpose()
}

/// Reads a column holding a strum-encoded enum.
pub fn enum_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|_| invalid_value(idx, format!("unexpected value `{raw}`")))
}

/// Reads a JSON-encoded text column.
pub fn json_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_err(idx, Type::Text, e))
}

/// Encodes a value as JSON for a text column.
pub fn to_json<T: serde::Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub(crate) const INTERVIEW_COLUMNS: &str = "id, candidate_id, scheduled_at, duration_min, status, \
     modality, completion_min, attempted_at, cancelled_at, cancellation_reason";

/// Maps a row selected with [`INTERVIEW_COLUMNS`].
pub fn interview_from_row(row: &Row<'_>) -> rusqlite::Result<InterviewSession> {
    Ok(InterviewSession {
        interview_id: InterviewId(row.get(0)?),
        candidate_id: CandidateId(row.get(1)?),
        scheduled_at: ts_col(row, 2)?,
        duration_min: row.get(3)?,
        status: enum_col(row, 4)?,
        modality: enum_col(row, 5)?,
        completion_min: row.get(6)?,
        attempted_at: opt_ts_col(row, 7)?,
        cancelled_at: opt_ts_col(row, 8)?,
        cancellation_reason: row.get(9)?,
    })
}

pub(crate) const TURN_COLUMNS: &str = "turn_id, interview_id, content, section, difficulty_level, \
     candidate_answer, correct, ai_feedback, asked_at";

/// Maps a row selected with [`TURN_COLUMNS`].
pub fn turn_from_row(row: &Row<'_>) -> rusqlite::Result<Turn> {
    let section: Option<String> = row.get(3)?;
    let section = section
        .map(|s| {
            Section::from_str(&s).map_err(|_| invalid_value(3, format!("unknown section `{s}`")))
        })
        .transpose()?;
    let level: Option<i64> = row.get(4)?;
    let difficulty_level = level
        .map(|l| Difficulty::try_from(l).map_err(|e| invalid_value(4, e)))
        .transpose()?;
    Ok(Turn {
        turn_id: row.get(0)?,
        interview_id: InterviewId(row.get(1)?),
        content: row.get(2)?,
        section,
        difficulty_level,
        candidate_answer: row.get(5)?,
        correct: row.get(6)?,
        ai_feedback: row.get(7)?,
        asked_at: ts_col(row, 8)?,
    })
}
