//! Read-only analytics endpoints plus the snapshot rollup.

use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::common::ApiError;
use crate::domains::analytics::models::{
    category_breakdown, county_breakdown, daily_trends, AnalyticsSnapshot, CategoryStats,
    CountyStats, DailyTrend, DashboardStats,
};
use crate::domains::identity::models::Role;
use crate::domains::issues::models::IssueCategory;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::issues::require_auth;

#[derive(Debug, Deserialize)]
pub struct CountyQuery {
    pub county: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    pub days: Option<i64>,
}

/// GET /api/analytics/dashboard
pub async fn dashboard_stats(
    Extension(state): Extension<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = DashboardStats::compute(&state.db_pool).await?;
    Ok(Json(stats))
}

/// GET /api/analytics/counties?county=
pub async fn county_analytics(
    Extension(state): Extension<AppState>,
    Query(query): Query<CountyQuery>,
) -> Result<Json<Vec<CountyStats>>, ApiError> {
    let filter = query.county.as_deref().filter(|s| !s.is_empty());
    let stats = county_breakdown(filter, &state.db_pool).await?;
    Ok(Json(stats))
}

/// GET /api/analytics/categories?category=
pub async fn category_analytics(
    Extension(state): Extension<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<CategoryStats>>, ApiError> {
    let filter = query
        .category
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| {
            IssueCategory::from_str(s)
                .map_err(|_| ApiError::Validation(format!("Invalid category: {}", s)))
        })
        .transpose()?;
    let stats = category_breakdown(filter, &state.db_pool).await?;
    Ok(Json(stats))
}

/// GET /api/analytics/trends?days=N
pub async fn trends_analytics(
    Extension(state): Extension<AppState>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<Vec<DailyTrend>>, ApiError> {
    let days = query.days.unwrap_or(30);
    let trends = daily_trends(days, &state.db_pool).await?;
    Ok(Json(trends))
}

/// GET /api/analytics/snapshots - stored daily rollups, newest first.
pub async fn list_snapshots(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<AnalyticsSnapshot>>, ApiError> {
    let snapshots = AnalyticsSnapshot::list(&state.db_pool).await?;
    Ok(Json(snapshots))
}

/// POST /api/analytics/snapshots - recompute today's rollup (moderation
/// only).
pub async fn compute_snapshot(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
) -> Result<Json<AnalyticsSnapshot>, ApiError> {
    let user = require_auth(auth)?;
    user.require_role(Role::MODERATION)?;
    let snapshot = AnalyticsSnapshot::compute_today(&state.db_pool).await?;
    Ok(Json(snapshot))
}
