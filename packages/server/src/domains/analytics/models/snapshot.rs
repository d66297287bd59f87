use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::SnapshotId;

/// Daily rollup of the issue store. An optimization surface for dashboards
/// and exports; the live analytics endpoints never depend on it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnalyticsSnapshot {
    pub id: SnapshotId,
    pub snapshot_date: NaiveDate,
    pub total_issues: i32,
    pub open_issues: i32,
    pub pending_issues: i32,
    pub resolved_issues: i32,
    pub closed_issues: i32,
    pub new_issues_today: i32,
    pub resolved_today: i32,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsSnapshot {
    /// Recompute today's rollup from current issue rows (upsert on the
    /// date).
    pub async fn compute_today(pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO analytics_snapshots (
                snapshot_date, total_issues, open_issues, pending_issues,
                resolved_issues, closed_issues, new_issues_today, resolved_today
            )
            SELECT
                CURRENT_DATE,
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'open'),
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'resolved'),
                COUNT(*) FILTER (WHERE status = 'closed'),
                COUNT(*) FILTER (WHERE created_at::date = CURRENT_DATE),
                COUNT(*) FILTER (WHERE status = 'resolved'
                                   AND updated_at::date = CURRENT_DATE)
            FROM issues
            ON CONFLICT (snapshot_date) DO UPDATE SET
                total_issues = EXCLUDED.total_issues,
                open_issues = EXCLUDED.open_issues,
                pending_issues = EXCLUDED.pending_issues,
                resolved_issues = EXCLUDED.resolved_issues,
                closed_issues = EXCLUDED.closed_issues,
                new_issues_today = EXCLUDED.new_issues_today,
                resolved_today = EXCLUDED.resolved_today
            RETURNING *
            "#,
        )
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Most recent snapshots first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM analytics_snapshots ORDER BY snapshot_date DESC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
