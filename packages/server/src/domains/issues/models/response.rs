use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{IssueId, ResponseId, UserId};

/// The official reply to an issue. At most one per issue; responding again
/// replaces the previous reply rather than appending.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminResponse {
    pub id: ResponseId,
    pub issue_id: IssueId,
    pub message: String,
    pub responded_by: UserId,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminResponse {
    /// Replace the issue's response (delete-then-insert) and, when the issue
    /// is still open, advance it to pending. Both writes share a
    /// transaction so readers never see a half-applied response.
    pub async fn respond(
        issue_id: IssueId,
        message: &str,
        is_public: bool,
        responded_by: UserId,
        pool: &PgPool,
    ) -> Result<Self> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM admin_responses WHERE issue_id = $1")
            .bind(issue_id)
            .execute(&mut *tx)
            .await?;

        let response = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO admin_responses (issue_id, message, responded_by, is_public)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(issue_id)
        .bind(message)
        .bind(responded_by)
        .bind(is_public)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE issues SET status = 'pending', updated_at = now() \
             WHERE id = $1 AND status = 'open'",
        )
        .bind(issue_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(response)
    }

    pub async fn find_for_issue(issue_id: IssueId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM admin_responses WHERE issue_id = $1")
            .bind(issue_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}
