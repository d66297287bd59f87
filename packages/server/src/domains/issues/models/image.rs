use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ImageId, IssueId};

/// Attachment metadata for an issue photo. Storage of the bytes themselves
/// lives with the upload service; we only keep the URL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueImage {
    pub id: ImageId,
    pub issue_id: IssueId,
    pub image_url: String,
    pub caption: String,
    pub uploaded_at: DateTime<Utc>,
}

impl IssueImage {
    pub async fn add(
        issue_id: IssueId,
        image_url: &str,
        caption: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issue_images (issue_id, image_url, caption)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(issue_id)
        .bind(image_url)
        .bind(caption)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_issue(issue_id: IssueId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM issue_images WHERE issue_id = $1 ORDER BY uploaded_at",
        )
        .bind(issue_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
