// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate reads and seeding writes.

use proctor_core::ProctorError;
use proctor_core::types::{Candidate, CandidateId, ResumeProfile};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::to_json;

/// Inserts or replaces a candidate and their resume.
pub async fn upsert_candidate(db: &Database, candidate: &Candidate) -> Result<(), ProctorError> {
    let candidate = candidate.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let resume = candidate.resume.as_ref().map(to_json).transpose()?;
            conn.execute(
                "INSERT INTO candidates (id, first_name, last_name, resume)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    resume = excluded.resume,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    candidate.candidate_id.as_str(),
                    candidate.first_name,
                    candidate.last_name,
                    resume,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a candidate by ID.
///
/// A stored resume that no longer decodes is treated as absent.
pub async fn get_candidate(
    db: &Database,
    id: &CandidateId,
) -> Result<Option<Candidate>, ProctorError> {
    let key = id.as_str().to_string();
    let row = db
        .connection()
        .call(
            move |conn| -> Result<Option<(String, String, Option<String>)>, rusqlite::Error> {
                conn.query_row(
                    "SELECT first_name, last_name, resume FROM candidates WHERE id = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
            },
        )
        .await
        .map_err(map_tr_err)?;

    Ok(row.map(|(first_name, last_name, resume)| {
        let resume = resume.and_then(|raw| match serde_json::from_str::<ResumeProfile>(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(candidate_id = %id, error = %e, "stored resume does not decode");
                None
            }
        });
        Candidate {
            candidate_id: id.clone(),
            first_name,
            last_name,
            resume,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::types::Experience;
    use tempfile::tempdir;

    #[tokio::test]
    async fn upsert_then_read_back() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();

        let mut candidate = Candidate {
            candidate_id: CandidateId::from("c-1"),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            resume: Some(ResumeProfile {
                profile_title: Some("Analyst".into()),
                experience_summary: vec![Experience {
                    title: "Engineer".into(),
                    company: "Analytical Engines".into(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        };
        upsert_candidate(&db, &candidate).await.unwrap();
        let read = get_candidate(&db, &candidate.candidate_id).await.unwrap().unwrap();
        assert_eq!(read, candidate);

        candidate.first_name = "Augusta".into();
        upsert_candidate(&db, &candidate).await.unwrap();
        let read = get_candidate(&db, &candidate.candidate_id).await.unwrap().unwrap();
        assert_eq!(read.first_name, "Augusta");

        assert!(get_candidate(&db, &CandidateId::from("nobody")).await.unwrap().is_none());
    }
}
