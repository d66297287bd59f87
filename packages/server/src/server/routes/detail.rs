//! Assembly of the full issue detail payload.
//!
//! Pulls the issue's attachments through the model queries, batch-resolves
//! the users referenced by them, and applies the viewer's visibility: the
//! submitter disappears from anonymous issues, internal notes only exist
//! for moderation, and non-public responses/updates are dropped for
//! ordinary callers.

use sqlx::PgPool;
use std::collections::HashMap;

use crate::common::{ApiError, UserId};
use crate::domains::identity::data::UserData;
use crate::domains::identity::models::User;
use crate::domains::issues::data::{
    AdminResponseData, InternalNoteData, IssueData, IssueDetailData, IssueUpdateData, Viewer,
};
use crate::domains::issues::models::{
    AdminResponse, InternalNote, Issue, IssueImage, IssueUpdate, IssueVote,
};

pub async fn load_issue_detail(
    issue: Issue,
    viewer: &Viewer,
    pool: &PgPool,
) -> Result<IssueDetailData, ApiError> {
    let issue_id = issue.id;

    let images = IssueImage::find_for_issue(issue_id, pool).await?;
    let response = AdminResponse::find_for_issue(issue_id, pool).await?;
    let updates = IssueUpdate::find_for_issue(issue_id, pool).await?;
    let notes = if viewer.is_moderation {
        Some(InternalNote::find_for_issue(issue_id, pool).await?)
    } else {
        None
    };

    // Resolve every referenced user in one query
    let mut user_ids: Vec<UserId> = vec![issue.submitted_by];
    if let Some(r) = &response {
        user_ids.push(r.responded_by);
    }
    user_ids.extend(updates.iter().map(|u| u.updated_by));
    if let Some(notes) = &notes {
        user_ids.extend(notes.iter().map(|n| n.added_by));
    }
    let users: HashMap<UserId, User> = User::find_by_ids(&user_ids, pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let user_data = |id: UserId| users.get(&id).cloned().map(UserData::from);

    let admin_response = response
        .filter(|r| r.is_public || viewer.is_moderation)
        .map(|r| {
            let responder = user_data(r.responded_by);
            AdminResponseData::new(r, responder)
        });

    let internal_notes = notes.map(|notes| {
        notes
            .into_iter()
            .map(|n| {
                let author = user_data(n.added_by);
                InternalNoteData::new(n, author)
            })
            .collect()
    });

    let updates = updates
        .into_iter()
        .filter(|u| u.is_public || viewer.is_moderation)
        .map(|u| {
            let author = user_data(u.updated_by);
            IssueUpdateData::new(u, author)
        })
        .collect();

    let user_vote = match viewer.user_id {
        Some(user_id) => IssueVote::find_for_user(issue_id, user_id, pool)
            .await?
            .map(|v| v.vote_type),
        None => None,
    };

    let submitter = user_data(issue.submitted_by);
    Ok(IssueDetailData {
        issue: IssueData::new(issue, submitter, user_vote, viewer),
        images: images.into_iter().map(Into::into).collect(),
        admin_response,
        internal_notes,
        updates,
    })
}
