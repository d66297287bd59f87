//! Public lookups over the administrative hierarchy.

use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;

use crate::common::ApiError;
use crate::domains::geography::models::{Constituency, County, Ward};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ConstituencyQuery {
    pub county: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WardQuery {
    pub constituency: Option<String>,
}

/// GET /api/counties
pub async fn list_counties(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<County>>, ApiError> {
    let counties = County::list(&state.db_pool).await?;
    Ok(Json(counties))
}

/// GET /api/constituencies?county=
pub async fn list_constituencies(
    Extension(state): Extension<AppState>,
    Query(query): Query<ConstituencyQuery>,
) -> Result<Json<Vec<Constituency>>, ApiError> {
    let constituencies = match query.county.as_deref().filter(|s| !s.is_empty()) {
        Some(county) => Constituency::list_for_county(county, &state.db_pool).await?,
        None => Constituency::list(&state.db_pool).await?,
    };
    Ok(Json(constituencies))
}

/// GET /api/wards?constituency=
pub async fn list_wards(
    Extension(state): Extension<AppState>,
    Query(query): Query<WardQuery>,
) -> Result<Json<Vec<Ward>>, ApiError> {
    let wards = match query.constituency.as_deref().filter(|s| !s.is_empty()) {
        Some(constituency) => Ward::list_for_constituency(constituency, &state.db_pool).await?,
        None => Ward::list(&state.db_pool).await?,
    };
    Ok(Json(wards))
}
