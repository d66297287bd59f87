use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{IssueId, NoteId, UserId};

/// Moderator-only annotation on an issue. Never serialized for the public or
/// the submitter.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InternalNote {
    pub id: NoteId,
    pub issue_id: IssueId,
    pub note: String,
    pub added_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl InternalNote {
    /// Pure append; no status side effect.
    pub async fn add(
        issue_id: IssueId,
        note: &str,
        added_by: UserId,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO internal_notes (issue_id, note, added_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(issue_id)
        .bind(note)
        .bind(added_by)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Newest first.
    pub async fn find_for_issue(issue_id: IssueId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM internal_notes WHERE issue_id = $1 ORDER BY created_at DESC",
        )
        .bind(issue_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
