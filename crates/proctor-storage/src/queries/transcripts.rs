// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live transcript records with a set-once expiry per session key.
//!
//! Expiry is enforced on read: an expired key reads as empty and its rows are
//! purged in the same call.

use chrono::{DateTime, Utc};
use proctor_core::ProctorError;
use proctor_core::types::TranscriptRecord;
use rusqlite::{Connection, OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{enum_col, fmt_ts};

fn purge_if_expired(conn: &Connection, key: &str, now: &str) -> rusqlite::Result<bool> {
    let expired: bool = conn
        .query_row(
            "SELECT expires_at <= ?2 FROM transcript_expiry WHERE session_key = ?1",
            params![key, now],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(false);
    if expired {
        conn.execute("DELETE FROM transcript_records WHERE session_key = ?1", params![key])?;
        conn.execute("DELETE FROM transcript_expiry WHERE session_key = ?1", params![key])?;
    }
    Ok(expired)
}

/// Appends a record unless its id already exists under the key.
pub async fn append(
    db: &Database,
    key: &str,
    record: &TranscriptRecord,
    now: DateTime<Utc>,
) -> Result<bool, ProctorError> {
    let key = key.to_string();
    let record = record.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            purge_if_expired(&tx, &key, &fmt_ts(now))?;
            let changed = tx.execute(
                "INSERT OR IGNORE INTO transcript_records (session_key, id, role, text, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![key, record.id, record.role.to_string(), record.text, record.timestamp],
            )?;
            tx.commit()?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Reads every live record for the key ordered by timestamp.
pub async fn read_all(
    db: &Database,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Vec<TranscriptRecord>, ProctorError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<TranscriptRecord>, rusqlite::Error> {
            let tx = conn.transaction()?;
            if purge_if_expired(&tx, &key, &fmt_ts(now))? {
                tx.commit()?;
                return Ok(Vec::new());
            }
            let records = {
                let mut stmt = tx.prepare(
                    "SELECT id, role, text, timestamp FROM transcript_records
                     WHERE session_key = ?1
                     ORDER BY timestamp ASC, rowid ASC",
                )?;
                let rows = stmt.query_map(params![key], |row| {
                    Ok(TranscriptRecord {
                        id: row.get(0)?,
                        role: enum_col(row, 1)?,
                        text: row.get(2)?,
                        timestamp: row.get(3)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            tx.commit()?;
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// Records the key's expiry unless one is already set.
pub async fn set_expiry(
    db: &Database,
    key: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool, ProctorError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO transcript_expiry (session_key, expires_at) VALUES (?1, ?2)",
                params![key, fmt_ts(expires_at)],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}
