//! Wire representations for issues and their attachments.
//!
//! These are viewer-aware: anonymous submissions drop the submitter from the
//! payload for everyone except moderation (and the owner), internal notes
//! only exist for moderation, and non-public responses/updates are hidden
//! from ordinary callers. The stored references are always retained; only
//! the serialization is filtered.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::common::UserId;
use crate::domains::identity::data::UserData;
use crate::domains::issues::models::{
    AdminResponse, InternalNote, Issue, IssueImage, IssueUpdate,
};
use crate::server::middleware::AuthUser;

/// Who is looking at the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer {
    pub user_id: Option<UserId>,
    pub is_moderation: bool,
}

impl Viewer {
    pub fn from_auth(auth: Option<&AuthUser>) -> Self {
        Viewer {
            user_id: auth.map(|a| a.user_id),
            is_moderation: auth.map(|a| a.can_moderate()).unwrap_or(false),
        }
    }

    fn owns(&self, issue: &Issue) -> bool {
        self.user_id == Some(issue.submitted_by)
    }

    /// Whether this viewer may see the submitter of the given issue.
    fn sees_submitter(&self, issue: &Issue) -> bool {
        !issue.anonymous || self.is_moderation || self.owns(issue)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: String,
    pub status: String,
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub submitted_by: Option<UserData>,
    pub anonymous: bool,
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
    pub ai_confidence: Option<f64>,
    pub ai_tags: JsonValue,
    pub user_vote: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl IssueData {
    pub fn new(
        issue: Issue,
        submitter: Option<UserData>,
        user_vote: Option<String>,
        viewer: &Viewer,
    ) -> Self {
        let submitted_by = if viewer.sees_submitter(&issue) {
            submitter
        } else {
            None
        };
        Self {
            id: issue.id.to_string(),
            title: issue.title,
            description: issue.description,
            category: issue.category,
            severity: issue.severity,
            status: issue.status,
            county: issue.county,
            constituency: issue.constituency,
            ward: issue.ward,
            location: issue.location,
            latitude: issue.latitude,
            longitude: issue.longitude,
            submitted_by,
            anonymous: issue.anonymous,
            upvotes: issue.upvotes,
            downvotes: issue.downvotes,
            vote_score: issue.upvotes - issue.downvotes,
            ai_confidence: issue.ai_confidence,
            ai_tags: issue.ai_tags,
            user_vote,
            created_at: issue.created_at.to_rfc3339(),
            updated_at: issue.updated_at.to_rfc3339(),
        }
    }
}

/// Detail payload: the flat issue plus its attachments, already filtered for
/// the viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDetailData {
    #[serde(flatten)]
    pub issue: IssueData,
    pub images: Vec<IssueImageData>,
    pub admin_response: Option<AdminResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<Vec<InternalNoteData>>,
    pub updates: Vec<IssueUpdateData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueImageData {
    pub id: String,
    pub image_url: String,
    pub caption: String,
    pub uploaded_at: String,
}

impl From<IssueImage> for IssueImageData {
    fn from(image: IssueImage) -> Self {
        Self {
            id: image.id.to_string(),
            image_url: image.image_url,
            caption: image.caption,
            uploaded_at: image.uploaded_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminResponseData {
    pub id: String,
    pub message: String,
    pub responded_by: Option<UserData>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl AdminResponseData {
    pub fn new(response: AdminResponse, responder: Option<UserData>) -> Self {
        Self {
            id: response.id.to_string(),
            message: response.message,
            responded_by: responder,
            is_public: response.is_public,
            created_at: response.created_at.to_rfc3339(),
            updated_at: response.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalNoteData {
    pub id: String,
    pub note: String,
    pub added_by: Option<UserData>,
    pub created_at: String,
}

impl InternalNoteData {
    pub fn new(note: InternalNote, author: Option<UserData>) -> Self {
        Self {
            id: note.id.to_string(),
            note: note.note,
            added_by: author,
            created_at: note.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueUpdateData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub updated_by: Option<UserData>,
    pub is_public: bool,
    pub created_at: String,
}

impl IssueUpdateData {
    pub fn new(update: IssueUpdate, author: Option<UserData>) -> Self {
        Self {
            id: update.id.to_string(),
            title: update.title,
            description: update.description,
            updated_by: author,
            is_public: update.is_public,
            created_at: update.created_at.to_rfc3339(),
        }
    }
}
