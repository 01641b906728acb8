// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview lifecycle writes.
//!
//! Every transition is a single `UPDATE ... WHERE status IN (...)`. When two
//! writers race (a user ending a session while the sweep force-completes it),
//! the first precondition match wins and the other sees zero changed rows.

use chrono::{DateTime, Utc};
use proctor_core::ProctorError;
use proctor_core::traits::Completion;
use proctor_core::traits::storage::{NO_SHOW_REASON, PROFILE_QUEUE};
use proctor_core::types::{
    CandidateId, InterviewId, InterviewSession, InterviewStatus, Modality, SweepReport,
};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::json;
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::models::{INTERVIEW_COLUMNS, fmt_ts, interview_from_row};
use crate::queries::queue::enqueue_on;
use crate::queries::turns::insert_turn_on;

/// Inserts a newly scheduled interview.
pub async fn create_interview(
    db: &Database,
    session: &InterviewSession,
) -> Result<(), ProctorError> {
    let s = session.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO interviews
                    (id, candidate_id, scheduled_at, duration_min, status, modality,
                     completion_min, attempted_at, cancelled_at, cancellation_reason)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    s.interview_id.as_str(),
                    s.candidate_id.as_str(),
                    fmt_ts(s.scheduled_at),
                    s.duration_min,
                    s.status.to_string(),
                    s.modality.to_string(),
                    s.completion_min,
                    s.attempted_at.map(fmt_ts),
                    s.cancelled_at.map(fmt_ts),
                    s.cancellation_reason,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get an interview by ID.
pub async fn get_interview(
    db: &Database,
    id: &InterviewId,
) -> Result<Option<InterviewSession>, ProctorError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<InterviewSession>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = ?1"),
                params![id],
                interview_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// PENDING/RESCHEDULED -> ONGOING for the owning candidate only.
pub async fn try_start(
    db: &Database,
    id: &InterviewId,
    candidate: &CandidateId,
) -> Result<bool, ProctorError> {
    let id = id.as_str().to_string();
    let candidate = candidate.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE interviews
                 SET status = 'ONGOING', updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND candidate_id = ?2 AND status IN ('PENDING', 'RESCHEDULED')",
                params![id, candidate],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// ONGOING -> COMPLETED with replayed turns and the profile job, all or nothing.
fn complete_on(conn: &mut Connection, c: &Completion) -> rusqlite::Result<bool> {
    let tx = conn.transaction()?;
    let attempted_at = c.ended_at - chrono::Duration::minutes(i64::from(c.completion_min));
    let changed = tx.execute(
        "UPDATE interviews
         SET status = 'COMPLETED', completion_min = ?2, attempted_at = ?3,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?1 AND status = 'ONGOING'",
        params![c.interview_id.as_str(), c.completion_min, fmt_ts(attempted_at)],
    )?;
    if changed == 0 {
        // Dropping the transaction rolls it back.
        return Ok(false);
    }
    for turn in &c.turns {
        insert_turn_on(&tx, turn)?;
    }
    let payload = json!({ "interview_id": c.interview_id.as_str() }).to_string();
    enqueue_on(&tx, PROFILE_QUEUE, &payload, c.max_job_attempts)?;
    tx.commit()?;
    Ok(true)
}

/// Completes an interview. Returns `false` if it was not ONGOING.
pub async fn complete_interview(
    db: &Database,
    completion: &Completion,
) -> Result<bool, ProctorError> {
    let completion = completion.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> { complete_on(conn, &completion) })
        .await
        .map_err(map_tr_err)
}

fn cancel_on(
    conn: &Connection,
    id: &str,
    reason: &str,
    at: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE interviews
         SET status = 'CANCELLED', cancelled_at = ?2, cancellation_reason = ?3,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?1 AND status IN ('PENDING', 'RESCHEDULED')",
        params![id, fmt_ts(at), reason],
    )?;
    Ok(changed == 1)
}

/// PENDING/RESCHEDULED -> CANCELLED. Returns `false` if not cancellable.
pub async fn cancel_interview(
    db: &Database,
    id: &InterviewId,
    reason: &str,
    at: DateTime<Utc>,
) -> Result<bool, ProctorError> {
    let id = id.as_str().to_string();
    let reason = reason.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> { cancel_on(conn, &id, &reason, at) })
        .await
        .map_err(map_tr_err)
}

/// Cancels no-shows and force-completes overrun sessions.
///
/// Each row goes through the same status-conditioned update used by the
/// interactive paths, one transaction per row.
pub async fn sweep_expired(
    db: &Database,
    now: DateTime<Utc>,
    grace: chrono::Duration,
    max_job_attempts: u32,
) -> Result<SweepReport, ProctorError> {
    db.connection()
        .call(move |conn| -> Result<SweepReport, rusqlite::Error> {
            let candidates: Vec<InterviewSession> = {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {INTERVIEW_COLUMNS} FROM interviews
                     WHERE status IN ('PENDING', 'RESCHEDULED', 'ONGOING')
                     ORDER BY scheduled_at ASC"
                ))?;
                let rows = stmt.query_map([], interview_from_row)?;
                rows.collect::<Result<_, _>>()?
            };

            let mut report = SweepReport::default();
            for session in candidates {
                let window_end = session.window_end();
                match session.status {
                    InterviewStatus::Pending | InterviewStatus::Rescheduled if window_end < now => {
                        if cancel_on(conn, session.interview_id.as_str(), NO_SHOW_REASON, now)? {
                            report.cancelled.push(session.interview_id);
                        }
                    }
                    InterviewStatus::Ongoing
                        if window_end + grace < now && session.modality == Modality::Voice =>
                    {
                        report.awaiting_replay.push(session.interview_id);
                    }
                    InterviewStatus::Ongoing if window_end + grace < now => {
                        let completion = Completion {
                            interview_id: session.interview_id.clone(),
                            completion_min: session.duration_min,
                            ended_at: now,
                            turns: Vec::new(),
                            max_job_attempts,
                        };
                        if complete_on(conn, &completion)? {
                            report.force_completed.push(session.interview_id);
                        }
                    }
                    _ => {}
                }
            }
            Ok(report)
        })
        .await
        .map_err(map_tr_err)
        .inspect(|report| {
            debug!(
                cancelled = report.cancelled.len(),
                force_completed = report.force_completed.len(),
                awaiting_replay = report.awaiting_replay.len(),
                "sweep finished"
            );
        })
}
