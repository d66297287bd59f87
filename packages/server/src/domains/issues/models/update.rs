use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{IssueId, UpdateId, UserId};

/// A progress-update entry on an issue, independent of the official
/// response. Public entries show to everyone, private ones only to
/// moderation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueUpdate {
    pub id: UpdateId,
    pub issue_id: IssueId,
    pub title: String,
    pub description: String,
    pub updated_by: UserId,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl IssueUpdate {
    pub async fn add(
        issue_id: IssueId,
        title: &str,
        description: &str,
        is_public: bool,
        updated_by: UserId,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issue_updates (issue_id, title, description, updated_by, is_public)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(issue_id)
        .bind(title)
        .bind(description)
        .bind(updated_by)
        .bind(is_public)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Newest first.
    pub async fn find_for_issue(issue_id: IssueId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM issue_updates WHERE issue_id = $1 ORDER BY created_at DESC",
        )
        .bind(issue_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
