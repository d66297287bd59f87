//! Read-only aggregation over the issue store.
//!
//! Everything here is computed on demand from current rows; nothing mutates
//! issue state, and empty data degrades to zeros rather than erroring.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;

use crate::common::IssueId;
use crate::domains::issues::models::IssueCategory;

const MONTHLY_TREND_WINDOW: u32 = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_issues: i64,
    pub open_issues: i64,
    pub pending_issues: i64,
    pub resolved_issues: i64,
    pub closed_issues: i64,
    /// resolved / total * 100, rounded to 2 decimals; 0 on an empty store.
    pub resolution_rate: f64,
    pub category_breakdown: BTreeMap<String, i64>,
    pub county_breakdown: BTreeMap<String, i64>,
    pub severity_breakdown: BTreeMap<String, i64>,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub recent_activity: Vec<RecentActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub issues: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecentActivity {
    pub id: IssueId,
    pub title: String,
    pub status: String,
    pub category: String,
    pub county: String,
    pub ward: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CountyStats {
    pub county: String,
    pub total: i64,
    pub resolved: i64,
    pub pending: i64,
    pub open: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryStats {
    pub category: String,
    pub total: i64,
    pub resolved: i64,
    pub pending: i64,
    pub open: i64,
    pub critical: i64,
    pub high: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub issues: i64,
    pub resolved: i64,
}

impl DashboardStats {
    pub async fn compute(pool: &PgPool) -> Result<Self> {
        let status_counts = breakdown_by("status", pool).await?;
        let count = |status: &str| status_counts.get(status).copied().unwrap_or(0);

        let open_issues = count("open");
        let pending_issues = count("pending");
        let resolved_issues = count("resolved");
        let closed_issues = count("closed");
        let total_issues: i64 = status_counts.values().sum();

        let resolution_rate = if total_issues > 0 {
            let rate = resolved_issues as f64 / total_issues as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };

        Ok(Self {
            total_issues,
            open_issues,
            pending_issues,
            resolved_issues,
            closed_issues,
            resolution_rate,
            category_breakdown: breakdown_by("category", pool).await?,
            county_breakdown: breakdown_by("county", pool).await?,
            severity_breakdown: breakdown_by("severity", pool).await?,
            monthly_trends: monthly_trends(pool).await?,
            recent_activity: recent_activity(pool).await?,
        })
    }
}

/// Grouped counts over one of the issue columns. `column` is only ever
/// called with literal column names, never client input.
async fn breakdown_by(column: &str, pool: &PgPool) -> Result<BTreeMap<String, i64>> {
    let query = format!("SELECT {col}, COUNT(*) FROM issues GROUP BY {col}", col = column);
    let rows: Vec<(String, i64)> = sqlx::query_as(&query).fetch_all(pool).await?;
    Ok(rows.into_iter().collect())
}

/// The trailing six calendar months, oldest first. A month's `resolved`
/// counts issues created that month that are currently resolved (keyed off
/// creation month, not resolution month).
async fn monthly_trends(pool: &PgPool) -> Result<Vec<MonthlyTrend>> {
    let today = Utc::now().date_naive();
    let this_month = today
        .with_day(1)
        .context("first of current month")?;
    let window_start = this_month
        .checked_sub_months(Months::new(MONTHLY_TREND_WINDOW - 1))
        .context("monthly trend window start")?;

    let rows: Vec<(DateTime<Utc>, i64, i64)> = sqlx::query_as(
        r#"
        SELECT date_trunc('month', created_at) AS month,
               COUNT(*),
               COUNT(*) FILTER (WHERE status = 'resolved')
        FROM issues
        WHERE created_at::date >= $1
        GROUP BY 1
        "#,
    )
    .bind(window_start)
    .fetch_all(pool)
    .await?;

    let by_month: BTreeMap<(i32, u32), (i64, i64)> = rows
        .into_iter()
        .map(|(month, issues, resolved)| ((month.year(), month.month()), (issues, resolved)))
        .collect();

    let mut trends = Vec::with_capacity(MONTHLY_TREND_WINDOW as usize);
    let mut cursor = window_start;
    for _ in 0..MONTHLY_TREND_WINDOW {
        let (issues, resolved) = by_month
            .get(&(cursor.year(), cursor.month()))
            .copied()
            .unwrap_or((0, 0));
        trends.push(MonthlyTrend {
            month: cursor.format("%B %Y").to_string(),
            issues,
            resolved,
        });
        cursor = cursor
            .checked_add_months(Months::new(1))
            .context("monthly trend cursor")?;
    }
    Ok(trends)
}

/// The ten most recently updated issues, newest first.
async fn recent_activity(pool: &PgPool) -> Result<Vec<RecentActivity>> {
    sqlx::query_as::<_, RecentActivity>(
        r#"
        SELECT id, title, status, category, county, ward, updated_at
        FROM issues
        ORDER BY updated_at DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Per-county totals, optionally pre-filtered by a case-insensitive
/// substring, busiest counties first.
pub async fn county_breakdown(filter: Option<&str>, pool: &PgPool) -> Result<Vec<CountyStats>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        r#"
        SELECT county,
               COUNT(*) AS total,
               COUNT(*) FILTER (WHERE status = 'resolved') AS resolved,
               COUNT(*) FILTER (WHERE status = 'pending') AS pending,
               COUNT(*) FILTER (WHERE status = 'open') AS open
        FROM issues
        WHERE 1=1
        "#,
    );
    if let Some(county) = filter {
        qb.push(" AND county ILIKE ").push_bind(format!("%{}%", county));
    }
    qb.push(" GROUP BY county ORDER BY total DESC");
    qb.build_query_as::<CountyStats>()
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

/// Per-category totals with severity hot-spots, busiest categories first.
pub async fn category_breakdown(
    filter: Option<IssueCategory>,
    pool: &PgPool,
) -> Result<Vec<CategoryStats>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        r#"
        SELECT category,
               COUNT(*) AS total,
               COUNT(*) FILTER (WHERE status = 'resolved') AS resolved,
               COUNT(*) FILTER (WHERE status = 'pending') AS pending,
               COUNT(*) FILTER (WHERE status = 'open') AS open,
               COUNT(*) FILTER (WHERE severity = 'critical') AS critical,
               COUNT(*) FILTER (WHERE severity = 'high') AS high
        FROM issues
        WHERE 1=1
        "#,
    );
    if let Some(category) = filter {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    qb.push(" GROUP BY category ORDER BY total DESC");
    qb.build_query_as::<CategoryStats>()
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

/// One bucket per calendar day in `[today - days, today]`, oldest first:
/// issues created that day, and currently-resolved issues whose last update
/// fell on that day.
pub async fn daily_trends(days: i64, pool: &PgPool) -> Result<Vec<DailyTrend>> {
    let days = days.clamp(1, 365);
    let today = Utc::now().date_naive();
    let start = today - chrono::Duration::days(days);

    let created: BTreeMap<NaiveDate, i64> = sqlx::query_as::<_, (NaiveDate, i64)>(
        r#"
        SELECT created_at::date AS day, COUNT(*)
        FROM issues
        WHERE created_at::date >= $1
        GROUP BY 1
        "#,
    )
    .bind(start)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let resolved: BTreeMap<NaiveDate, i64> = sqlx::query_as::<_, (NaiveDate, i64)>(
        r#"
        SELECT updated_at::date AS day, COUNT(*)
        FROM issues
        WHERE status = 'resolved' AND updated_at::date >= $1
        GROUP BY 1
        "#,
    )
    .bind(start)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let mut trends = Vec::with_capacity(days as usize + 1);
    let mut cursor = start;
    while cursor <= today {
        trends.push(DailyTrend {
            date: cursor,
            issues: created.get(&cursor).copied().unwrap_or(0),
            resolved: resolved.get(&cursor).copied().unwrap_or(0),
        });
        cursor += chrono::Duration::days(1);
    }
    Ok(trends)
}
