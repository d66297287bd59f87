use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::common::{IssueId, Page, UserId};
use crate::domains::issues::filters::{IssueFilters, IssueOrdering};

/// A citizen report. Vote counters and status are never written directly by
/// clients; they move only through the voting and moderation paths.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: String, // Maps to IssueCategory enum
    pub severity: String, // Maps to IssueSeverity enum
    pub status: String,   // Maps to IssueStatus enum

    // Location tag
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub submitted_by: UserId,
    pub anonymous: bool,

    // Engagement counters, only ever moved by relative deltas
    pub upvotes: i32,
    pub downvotes: i32,

    // Advisory classification output, never authoritative
    pub ai_confidence: Option<f64>,
    pub ai_tags: JsonValue,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Derived ranking signal.
    pub fn vote_score(&self) -> i32 {
        self.upvotes - self.downvotes
    }
}

// =============================================================================
// Enums for type-safe edges
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Roads,
    Water,
    Health,
    Security,
    Corruption,
    Education,
    Environment,
    Housing,
}

impl IssueCategory {
    pub const ALL: &'static [IssueCategory] = &[
        IssueCategory::Roads,
        IssueCategory::Water,
        IssueCategory::Health,
        IssueCategory::Security,
        IssueCategory::Corruption,
        IssueCategory::Education,
        IssueCategory::Environment,
        IssueCategory::Housing,
    ];
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueCategory::Roads => "roads",
            IssueCategory::Water => "water",
            IssueCategory::Health => "health",
            IssueCategory::Security => "security",
            IssueCategory::Corruption => "corruption",
            IssueCategory::Education => "education",
            IssueCategory::Environment => "environment",
            IssueCategory::Housing => "housing",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for IssueCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "roads" => Ok(IssueCategory::Roads),
            "water" => Ok(IssueCategory::Water),
            "health" => Ok(IssueCategory::Health),
            "security" => Ok(IssueCategory::Security),
            "corruption" => Ok(IssueCategory::Corruption),
            "education" => Ok(IssueCategory::Education),
            "environment" => Ok(IssueCategory::Environment),
            "housing" => Ok(IssueCategory::Housing),
            _ => Err(anyhow::anyhow!("Invalid category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueSeverity::Low => "low",
            IssueSeverity::Medium => "medium",
            IssueSeverity::High => "high",
            IssueSeverity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for IssueSeverity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(IssueSeverity::Low),
            "medium" => Ok(IssueSeverity::Medium),
            "high" => Ok(IssueSeverity::High),
            "critical" => Ok(IssueSeverity::Critical),
            _ => Err(anyhow::anyhow!("Invalid severity: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Pending,
    Resolved,
    Closed,
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueStatus::Open => "open",
            IssueStatus::Pending => "pending",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(IssueStatus::Open),
            "pending" => Ok(IssueStatus::Pending),
            "resolved" => Ok(IssueStatus::Resolved),
            "closed" => Ok(IssueStatus::Closed),
            _ => Err(anyhow::anyhow!("Invalid status: {}", s)),
        }
    }
}

// =============================================================================
// Write payloads
// =============================================================================

/// Fields accepted at creation. The submitter always comes from the
/// authenticated context, never from this payload.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub anonymous: bool,
}

/// Partial content edit. Absent fields keep their current value; status and
/// counters are deliberately not part of this payload.
#[derive(Debug, Clone, Default)]
pub struct IssueChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<IssueCategory>,
    pub severity: Option<IssueSeverity>,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub anonymous: Option<bool>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Issue {
    pub async fn create(fields: &NewIssue, submitted_by: UserId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issues (
                title, description, category, severity,
                county, constituency, ward, location, latitude, longitude,
                submitted_by, anonymous
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.category.to_string())
        .bind(fields.severity.to_string())
        .bind(&fields.county)
        .bind(&fields.constituency)
        .bind(&fields.ward)
        .bind(&fields.location)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(submitted_by)
        .bind(fields.anonymous)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: IssueId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM issues WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Filtered, ordered, paginated listing. Returns the page plus the total
    /// match count; both queries share the same WHERE conditions.
    pub async fn list(
        filters: &IssueFilters,
        ordering: IssueOrdering,
        page: &Page,
        pool: &PgPool,
    ) -> Result<(Vec<Self>, i64)> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM issues WHERE 1=1");
        filters.apply(&mut qb);
        qb.push(" ORDER BY ");
        qb.push(ordering.to_sql());
        qb.push(" LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());
        let issues = qb.build_query_as::<Self>().fetch_all(pool).await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM issues WHERE 1=1");
        filters.apply(&mut count_qb);
        let (count,): (i64,) = count_qb.build_query_as().fetch_one(pool).await?;

        Ok((issues, count))
    }

    /// Apply a partial content edit. Absent fields are left untouched.
    pub async fn update_content(
        id: IssueId,
        changes: &IssueChanges,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE issues SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                severity = COALESCE($5, severity),
                county = COALESCE($6, county),
                constituency = COALESCE($7, constituency),
                ward = COALESCE($8, ward),
                location = COALESCE($9, location),
                latitude = COALESCE($10, latitude),
                longitude = COALESCE($11, longitude),
                anonymous = COALESCE($12, anonymous),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.category.map(|c| c.to_string()))
        .bind(changes.severity.map(|s| s.to_string()))
        .bind(&changes.county)
        .bind(&changes.constituency)
        .bind(&changes.ward)
        .bind(&changes.location)
        .bind(changes.latitude)
        .bind(changes.longitude)
        .bind(changes.anonymous)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Moderation status change; any status is reachable from any other.
    pub async fn set_status(id: IssueId, status: IssueStatus, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE issues SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.to_string())
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Store the advisory classification result. Does not bump updated_at:
    /// like votes, this is metadata, not content.
    pub async fn set_classification(
        id: IssueId,
        confidence: Option<f64>,
        tags: &[String],
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query("UPDATE issues SET ai_confidence = $2, ai_tags = $3 WHERE id = $1")
            .bind(id)
            .bind(confidence)
            .bind(serde_json::json!(tags))
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Hard delete; foreign keys cascade to images, votes, notes, responses
    /// and updates.
    pub async fn delete(id: IssueId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_roundtrip() {
        for category in IssueCategory::ALL {
            assert_eq!(
                IssueCategory::from_str(&category.to_string()).unwrap(),
                *category
            );
        }
    }

    #[test]
    fn test_invalid_enum_values() {
        assert!(IssueCategory::from_str("potholes").is_err());
        assert!(IssueSeverity::from_str("urgent").is_err());
        assert!(IssueStatus::from_str("done").is_err());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            IssueStatus::Open,
            IssueStatus::Pending,
            IssueStatus::Resolved,
            IssueStatus::Closed,
        ] {
            assert_eq!(IssueStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }
}
