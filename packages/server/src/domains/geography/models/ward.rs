use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ConstituencyId, WardId};

/// Leaf of the administrative hierarchy; belongs to exactly one
/// constituency, name unique within it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ward {
    pub id: WardId,
    pub name: String,
    pub constituency_id: ConstituencyId,
    pub created_at: DateTime<Utc>,
}

impl Ward {
    pub async fn create(name: &str, constituency_id: ConstituencyId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO wards (name, constituency_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(constituency_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM wards ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Wards of a constituency, matched by constituency name.
    pub async fn list_for_constituency(constituency: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT w.*
            FROM wards w
            INNER JOIN constituencies c ON c.id = w.constituency_id
            WHERE c.name ILIKE $1
            ORDER BY w.name
            "#,
        )
        .bind(constituency)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
