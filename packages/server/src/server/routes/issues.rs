//! Issue CRUD, listing, voting, attachments and classification endpoints.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::str::FromStr;

use crate::common::{ApiError, IssueId, PageParams, Paginated, UserId};
use crate::domains::classification::{classify_description, spawn_advisory_classification, Classification};
use crate::domains::identity::data::UserData;
use crate::domains::identity::models::User;
use crate::domains::issues::data::{IssueData, IssueDetailData, IssueImageData, Viewer};
use crate::domains::issues::filters::{IssueFilters, IssueOrdering};
use crate::domains::issues::models::{
    Issue, IssueCategory, IssueChanges, IssueImage, IssueSeverity, IssueVote, NewIssue, VoteType,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::detail::load_issue_detail;

// =============================================================================
// Requests / queries
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct IssueListQuery {
    pub category: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub anonymous: Option<bool>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateIssueRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: Option<String>,
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub anonymous: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateIssueRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub severity: Option<String>,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub anonymous: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddImageRequest {
    pub image_url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub category: Option<String>,
    pub severity: Option<String>,
    pub confidence: Option<f64>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/issues - public listing with filters, search, ordering and
/// pagination.
pub async fn list_issues(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Query(query): Query<IssueListQuery>,
) -> Result<Json<Paginated<IssueData>>, ApiError> {
    let viewer = Viewer::from_auth(auth.as_ref().map(|ext| &ext.0));

    let filters = IssueFilters {
        category: parse_filter::<IssueCategory>(query.category.as_deref(), "category")?,
        severity: parse_filter::<IssueSeverity>(query.severity.as_deref(), "severity")?,
        status: parse_filter(query.status.as_deref(), "status")?,
        county: non_empty(query.county),
        constituency: non_empty(query.constituency),
        ward: non_empty(query.ward),
        date_from: query.date_from,
        date_to: query.date_to,
        anonymous: query.anonymous,
        search: non_empty(query.search),
        submitted_by: None,
    };
    let ordering = parse_ordering(query.ordering.as_deref())?;
    let page = PageParams {
        page: query.page,
        page_size: query.page_size,
    }
    .validate();

    let (issues, count) = Issue::list(&filters, ordering, &page, &state.db_pool).await?;
    let results = issue_page_data(issues, &viewer, &state.db_pool).await?;
    Ok(Json(Paginated::new(results, count, &page)))
}

/// POST /api/issues - create a report. The submitter is always the
/// authenticated caller; a background task asks the classifier for an
/// advisory suggestion.
pub async fn create_issue(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<CreateIssueRequest>,
) -> Result<(StatusCode, Json<IssueData>), ApiError> {
    let user = require_auth(auth)?;

    let fields = NewIssue {
        title: require_text(&body.title, "title")?,
        description: require_text(&body.description, "description")?,
        category: parse_value(&body.category, "category")?,
        severity: match body.severity.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => parse_value(s, "severity")?,
            None => IssueSeverity::Medium,
        },
        county: require_text(&body.county, "county")?,
        constituency: require_text(&body.constituency, "constituency")?,
        ward: require_text(&body.ward, "ward")?,
        location: body.location,
        latitude: body.latitude,
        longitude: body.longitude,
        anonymous: body.anonymous.unwrap_or(false),
    };

    let issue = Issue::create(&fields, user.user_id, &state.db_pool).await?;

    if let Some(ai) = &state.ai {
        spawn_advisory_classification(
            ai.clone(),
            issue.id,
            issue.description.clone(),
            state.db_pool.clone(),
        );
    }

    let viewer = Viewer::from_auth(Some(&user));
    let submitter = User::find_by_id(user.user_id, &state.db_pool)
        .await?
        .map(UserData::from);
    let data = IssueData::new(issue, submitter, None, &viewer);
    Ok((StatusCode::CREATED, Json(data)))
}

/// GET /api/issues/my-issues - the caller's own submissions.
pub async fn my_issues(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Query(query): Query<IssueListQuery>,
) -> Result<Json<Paginated<IssueData>>, ApiError> {
    let user = require_auth(auth)?;
    let viewer = Viewer::from_auth(Some(&user));

    let filters = IssueFilters {
        submitted_by: Some(user.user_id),
        ..Default::default()
    };
    let ordering = parse_ordering(query.ordering.as_deref())?;
    let page = PageParams {
        page: query.page,
        page_size: query.page_size,
    }
    .validate();

    let (issues, count) = Issue::list(&filters, ordering, &page, &state.db_pool).await?;
    let results = issue_page_data(issues, &viewer, &state.db_pool).await?;
    Ok(Json(Paginated::new(results, count, &page)))
}

/// GET /api/issues/{id} - viewer-aware detail payload.
pub async fn get_issue(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
) -> Result<Json<IssueDetailData>, ApiError> {
    let issue = Issue::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue"))?;
    let viewer = Viewer::from_auth(auth.as_ref().map(|ext| &ext.0));
    let detail = load_issue_detail(issue, &viewer, &state.db_pool).await?;
    Ok(Json(detail))
}

/// PUT/PATCH /api/issues/{id} - partial content edit by the owner or
/// moderation. Status and counters are not reachable from here.
pub async fn update_issue(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
    Json(body): Json<UpdateIssueRequest>,
) -> Result<Json<IssueData>, ApiError> {
    let user = require_auth(auth)?;
    let issue = Issue::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue"))?;

    if !(user.can_moderate() || issue.submitted_by == user.user_id) {
        return Err(ApiError::PermissionDenied(
            "You do not have permission to update this issue".to_string(),
        ));
    }

    let changes = IssueChanges {
        title: validate_opt_text(body.title, "title")?,
        description: validate_opt_text(body.description, "description")?,
        category: parse_filter(body.category.as_deref(), "category")?,
        severity: parse_filter(body.severity.as_deref(), "severity")?,
        county: validate_opt_text(body.county, "county")?,
        constituency: validate_opt_text(body.constituency, "constituency")?,
        ward: validate_opt_text(body.ward, "ward")?,
        location: body.location,
        latitude: body.latitude,
        longitude: body.longitude,
        anonymous: body.anonymous,
    };

    let updated = Issue::update_content(id, &changes, &state.db_pool).await?;
    let viewer = Viewer::from_auth(Some(&user));
    let submitter = User::find_by_id(updated.submitted_by, &state.db_pool)
        .await?
        .map(UserData::from);
    let user_vote = IssueVote::find_for_user(id, user.user_id, &state.db_pool)
        .await?
        .map(|v| v.vote_type);
    Ok(Json(IssueData::new(updated, submitter, user_vote, &viewer)))
}

/// DELETE /api/issues/{id} - owner or moderation; cascades to images,
/// votes, notes, responses and updates.
pub async fn delete_issue(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
) -> Result<StatusCode, ApiError> {
    let user = require_auth(auth)?;
    let issue = Issue::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue"))?;

    if !(user.can_moderate() || issue.submitted_by == user.user_id) {
        return Err(ApiError::PermissionDenied(
            "You do not have permission to delete this issue".to_string(),
        ));
    }

    Issue::delete(id, &state.db_pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/issues/{id}/vote - toggle/switch the caller's vote.
pub async fn vote_issue(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
    Json(body): Json<VoteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_auth(auth)?;

    Issue::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue"))?;

    let vote_type = body
        .vote_type
        .as_deref()
        .and_then(|s| VoteType::from_str(s).ok())
        .ok_or_else(|| ApiError::Validation("Invalid vote type".to_string()))?;

    let outcome = IssueVote::cast(id, user.user_id, vote_type, &state.db_pool).await?;
    Ok(Json(json!({ "message": outcome.message() })))
}

/// POST /api/issues/{id}/images - record an attachment by URL; owner or
/// moderation.
pub async fn add_image(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
    Json(body): Json<AddImageRequest>,
) -> Result<(StatusCode, Json<IssueImageData>), ApiError> {
    let user = require_auth(auth)?;
    let issue = Issue::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue"))?;

    if !(user.can_moderate() || issue.submitted_by == user.user_id) {
        return Err(ApiError::PermissionDenied(
            "You do not have permission to attach images to this issue".to_string(),
        ));
    }

    let image_url = require_text(&body.image_url, "image_url")?;
    let image = IssueImage::add(
        id,
        &image_url,
        body.caption.as_deref().unwrap_or(""),
        &state.db_pool,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(image.into())))
}

/// POST /api/issues/categorize - advisory {category, severity} suggestion
/// for a draft description. Nulls when the classifier is unavailable.
pub async fn categorize_issue(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, ApiError> {
    require_auth(auth)?;

    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("Description is required".to_string()))?;

    let classification = match &state.ai {
        Some(ai) => classify_description(ai.as_ref(), description).await,
        None => Classification::Unavailable,
    };

    let response = match classification {
        Classification::Suggestion {
            category,
            severity,
            confidence,
        } => CategorizeResponse {
            category: Some(category.to_string()),
            severity: Some(severity.to_string()),
            confidence,
        },
        Classification::Unavailable => CategorizeResponse {
            category: None,
            severity: None,
            confidence: None,
        },
    };
    Ok(Json(response))
}

// =============================================================================
// Helpers shared by the issue handlers
// =============================================================================

pub(crate) fn require_auth(auth: Option<Extension<AuthUser>>) -> Result<AuthUser, ApiError> {
    auth.map(|Extension(user)| user)
        .ok_or(ApiError::Unauthenticated)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn require_text(value: &str, field: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn validate_opt_text(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
    value.map(|v| require_text(&v, field)).transpose()
}

fn parse_value<T: FromStr>(value: &str, what: &str) -> Result<T, ApiError> {
    value
        .parse::<T>()
        .map_err(|_| ApiError::Validation(format!("Invalid {}: {}", what, value)))
}

fn parse_filter<T: FromStr>(value: Option<&str>, what: &str) -> Result<Option<T>, ApiError> {
    value
        .filter(|s| !s.is_empty())
        .map(|s| parse_value(s, what))
        .transpose()
}

fn parse_ordering(value: Option<&str>) -> Result<IssueOrdering, ApiError> {
    match value.filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse::<IssueOrdering>()
            .map_err(|_| ApiError::Validation(format!("Invalid ordering: {}", s))),
        None => Ok(IssueOrdering::default()),
    }
}

/// Serialize a page of issues: submitters are batch-loaded and the caller's
/// standing votes attached, avoiding per-row queries.
async fn issue_page_data(
    issues: Vec<Issue>,
    viewer: &Viewer,
    pool: &PgPool,
) -> Result<Vec<IssueData>, ApiError> {
    let submitter_ids: Vec<UserId> = issues.iter().map(|i| i.submitted_by).collect();
    let users: HashMap<UserId, User> = User::find_by_ids(&submitter_ids, pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let votes = match viewer.user_id {
        Some(user_id) => {
            let issue_ids: Vec<IssueId> = issues.iter().map(|i| i.id).collect();
            IssueVote::map_for_user(user_id, &issue_ids, pool).await?
        }
        None => HashMap::new(),
    };

    Ok(issues
        .into_iter()
        .map(|issue| {
            let submitter = users.get(&issue.submitted_by).cloned().map(UserData::from);
            let user_vote = votes.get(&issue.id).cloned();
            IssueData::new(issue, submitter, user_vote, viewer)
        })
        .collect())
}
