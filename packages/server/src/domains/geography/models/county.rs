use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::CountyId;

/// Top level of the administrative hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct County {
    pub id: CountyId,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl County {
    pub async fn create(name: &str, code: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO counties (name, code) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(code)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM counties ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

}
