// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview profile persistence. One row per interview, never updated.

use proctor_core::ProctorError;
use proctor_core::types::{Analytics, InterviewId, InterviewProfile};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{enum_col, fmt_ts, json_col, to_json, ts_col};

/// Stores a profile. Returns `false` when the interview already has one.
pub async fn insert_profile(
    db: &Database,
    profile: &InterviewProfile,
) -> Result<bool, ProctorError> {
    let p = profile.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO profiles
                    (interview_id, performance_score, recommended_roles, strengths, weaknesses,
                     total_questions, correct_answers, average_difficulty, source, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    p.interview_id.as_str(),
                    p.performance_score,
                    to_json(&p.recommended_roles)?,
                    to_json(&p.strengths)?,
                    to_json(&p.weaknesses)?,
                    p.analytics.total_questions,
                    p.analytics.correct_answers,
                    p.analytics.average_difficulty,
                    p.source.to_string(),
                    fmt_ts(p.created_at),
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Get the profile for an interview, if one was synthesized.
pub async fn get_profile(
    db: &Database,
    interview: &InterviewId,
) -> Result<Option<InterviewProfile>, ProctorError> {
    let key = interview.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<InterviewProfile>, rusqlite::Error> {
            conn.query_row(
                "SELECT interview_id, performance_score, recommended_roles, strengths, weaknesses,
                        total_questions, correct_answers, average_difficulty, source, created_at
                 FROM profiles WHERE interview_id = ?1",
                params![key],
                |row| {
                    Ok(InterviewProfile {
                        interview_id: InterviewId(row.get(0)?),
                        performance_score: row.get(1)?,
                        recommended_roles: json_col(row, 2)?,
                        strengths: json_col(row, 3)?,
                        weaknesses: json_col(row, 4)?,
                        analytics: Analytics {
                            total_questions: row.get(5)?,
                            correct_answers: row.get(6)?,
                            average_difficulty: row.get(7)?,
                        },
                        source: enum_col(row, 8)?,
                        created_at: ts_col(row, 9)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
