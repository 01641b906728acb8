// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue operations for crash-safe deferred jobs.
//!
//! A claimed entry is locked for five minutes; if the claimant dies before
//! acking or failing it, the entry becomes claimable again once the lock lapses.

use proctor_core::ProctorError;
use rusqlite::{Connection, params};

use crate::database::{Database, map_tr_err};
use crate::models::QueueEntry;

/// Inserts a pending entry on an existing connection or transaction.
pub(crate) fn enqueue_on(
    conn: &Connection,
    queue_name: &str,
    payload: &str,
    max_attempts: u32,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO queue (queue_name, payload, max_attempts) VALUES (?1, ?2, ?3)",
        params![queue_name, payload, max_attempts],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Enqueue a new item. Returns the auto-generated queue entry ID.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: &str,
    max_attempts: u32,
) -> Result<i64, ProctorError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            enqueue_on(conn, &queue_name, &payload, max_attempts)
        })
        .await
        .map_err(map_tr_err)
}

/// Claims the oldest claimable entry from the named queue.
///
/// Pending entries and processing entries whose lock expired are both
/// claimable. Returns `None` if nothing is claimable.
pub async fn dequeue(db: &Database, queue_name: &str) -> Result<Option<QueueEntry>, ProctorError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<QueueEntry>, rusqlite::Error> {
            let tx = conn.transaction()?;

            let result = tx.query_row(
                "SELECT id, queue_name, payload, status, attempts, max_attempts,
                        created_at, updated_at, locked_until
                 FROM queue
                 WHERE queue_name = ?1
                   AND (status = 'pending'
                        OR (status = 'processing'
                            AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))
                 ORDER BY id ASC
                 LIMIT 1",
                params![queue_name],
                |row| {
                    Ok(QueueEntry {
                        id: row.get(0)?,
                        queue_name: row.get(1)?,
                        payload: row.get(2)?,
                        status: row.get(3)?,
                        attempts: row.get(4)?,
                        max_attempts: row.get(5)?,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                        locked_until: row.get(8)?,
                    })
                },
            );

            let entry = match result {
                Ok(entry) => entry,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e),
            };

            let locked_until: String = tx.query_row(
                "UPDATE queue SET status = 'processing',
                 locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1
                 RETURNING locked_until",
                params![entry.id],
                |row| row.get(0),
            )?;
            tx.commit()?;

            Ok(Some(QueueEntry {
                status: "processing".to_string(),
                locked_until: Some(locked_until),
                ..entry
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Marks an entry as completed.
pub async fn ack(db: &Database, id: i64) -> Result<(), ProctorError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Records a failed attempt.
///
/// The entry returns to `pending` until `max_attempts` is reached, then
/// becomes `failed` for good.
pub async fn fail(db: &Database, id: i64) -> Result<(), ProctorError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE queue SET attempts = attempts + 1,
                 status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'pending' END,
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
