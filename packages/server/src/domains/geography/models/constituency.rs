use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ConstituencyId, CountyId};

/// Second level of the administrative hierarchy; belongs to exactly one
/// county, name unique within it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Constituency {
    pub id: ConstituencyId,
    pub name: String,
    pub county_id: CountyId,
    pub created_at: DateTime<Utc>,
}

impl Constituency {
    pub async fn create(name: &str, county_id: CountyId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO constituencies (name, county_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(county_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM constituencies ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Constituencies of a county, matched by county name.
    pub async fn list_for_county(county: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT c.*
            FROM constituencies c
            INNER JOIN counties co ON co.id = c.county_id
            WHERE co.name ILIKE $1
            ORDER BY c.name
            "#,
        )
        .bind(county)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
