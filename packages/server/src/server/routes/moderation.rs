//! Moderation endpoints: official responses, internal notes, progress
//! updates and status changes. Every operation here is gated on the
//! moderation roles before anything is written.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

use crate::common::{ApiError, IssueId};
use crate::domains::identity::data::UserData;
use crate::domains::identity::models::{Role, User};
use crate::domains::issues::data::{AdminResponseData, InternalNoteData, IssueUpdateData};
use crate::domains::issues::models::{
    AdminResponse, InternalNote, Issue, IssueStatus, IssueUpdate,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::issues::require_auth;

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub message: String,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub title: String,
    pub description: String,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// POST /api/issues/{id}/response - replace the issue's official reply.
/// An open issue advances to pending as a side effect.
pub async fn add_response(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
    Json(body): Json<RespondRequest>,
) -> Result<(StatusCode, Json<AdminResponseData>), ApiError> {
    let user = require_moderation(auth, &state, id).await?;

    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::Validation("message is required".to_string()));
    }

    let response = AdminResponse::respond(
        id,
        message,
        body.is_public.unwrap_or(true),
        user.user_id,
        &state.db_pool,
    )
    .await?;

    let responder = User::find_by_id(user.user_id, &state.db_pool)
        .await?
        .map(UserData::from);
    Ok((
        StatusCode::CREATED,
        Json(AdminResponseData::new(response, responder)),
    ))
}

/// POST /api/issues/{id}/note - append a moderator-only annotation.
pub async fn add_note(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
    Json(body): Json<NoteRequest>,
) -> Result<(StatusCode, Json<InternalNoteData>), ApiError> {
    let user = require_moderation(auth, &state, id).await?;

    let note = body.note.trim();
    if note.is_empty() {
        return Err(ApiError::Validation("note is required".to_string()));
    }

    let note = InternalNote::add(id, note, user.user_id, &state.db_pool).await?;
    let author = User::find_by_id(user.user_id, &state.db_pool)
        .await?
        .map(UserData::from);
    Ok((
        StatusCode::CREATED,
        Json(InternalNoteData::new(note, author)),
    ))
}

/// POST /api/issues/{id}/updates - append a progress update.
pub async fn add_update(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
    Json(body): Json<UpdateEntryRequest>,
) -> Result<(StatusCode, Json<IssueUpdateData>), ApiError> {
    let user = require_moderation(auth, &state, id).await?;

    let title = body.title.trim();
    let description = body.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(ApiError::Validation(
            "title and description are required".to_string(),
        ));
    }

    let update = IssueUpdate::add(
        id,
        title,
        description,
        body.is_public.unwrap_or(true),
        user.user_id,
        &state.db_pool,
    )
    .await?;
    let author = User::find_by_id(user.user_id, &state.db_pool)
        .await?
        .map(UserData::from);
    Ok((
        StatusCode::CREATED,
        Json(IssueUpdateData::new(update, author)),
    ))
}

/// PATCH /api/issues/{id}/status - set any status; transitions are
/// deliberately unrestricted.
pub async fn update_status(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<IssueId>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_moderation(auth, &state, id).await?;

    let status = body
        .status
        .as_deref()
        .and_then(|s| IssueStatus::from_str(s).ok())
        .ok_or_else(|| ApiError::Validation("Invalid status".to_string()))?;

    Issue::set_status(id, status, &state.db_pool).await?;
    Ok(Json(json!({ "message": "Status updated successfully" })))
}

/// Shared gate: the issue must exist and the caller must hold a moderation
/// role. Runs before any mutation.
async fn require_moderation(
    auth: Option<Extension<AuthUser>>,
    state: &AppState,
    issue_id: IssueId,
) -> Result<AuthUser, ApiError> {
    let user = require_auth(auth)?;
    Issue::find_by_id(issue_id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue"))?;
    user.require_role(Role::MODERATION)?;
    Ok(user)
}
