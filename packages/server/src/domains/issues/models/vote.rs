use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::common::{IssueId, UserId, VoteId};

/// A single user's standing vote on one issue. At most one row per
/// (issue, user) pair, enforced by a unique constraint; rows are created,
/// flipped and deleted only through `cast`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueVote {
    pub id: VoteId,
    pub issue_id: IssueId,
    pub user_id: UserId,
    pub vote_type: String, // Maps to VoteType enum
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Up,
    Down,
}

impl std::fmt::Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteType::Up => write!(f, "up"),
            VoteType::Down => write!(f, "down"),
        }
    }
}

impl std::str::FromStr for VoteType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(VoteType::Up),
            "down" => Ok(VoteType::Down),
            _ => Err(anyhow::anyhow!("Invalid vote type: {}", s)),
        }
    }
}

/// What a cast did to the caller's standing vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded,
    Updated,
    Removed,
}

impl VoteOutcome {
    pub fn message(self) -> &'static str {
        match self {
            VoteOutcome::Recorded => "Vote recorded",
            VoteOutcome::Updated => "Vote updated",
            VoteOutcome::Removed => "Vote removed",
        }
    }
}

// =============================================================================
// Voting engine
// =============================================================================

impl IssueVote {
    /// Toggle/switch a user's vote on an issue.
    ///
    /// The whole read-branch-write runs in one transaction: the existing vote
    /// row (if any) is locked with FOR UPDATE, and the issue counters are
    /// moved as relative deltas so concurrent votes from other users on the
    /// same issue cannot lose updates. Decrements only ever happen alongside
    /// a locked vote row of that type, which keeps the counters non-negative.
    ///
    /// Two concurrent first-votes for the same (issue, user) pair race on the
    /// unique constraint instead; the loser retries once and lands in the
    /// toggle branch.
    pub async fn cast(
        issue_id: IssueId,
        user_id: UserId,
        vote_type: VoteType,
        pool: &PgPool,
    ) -> Result<VoteOutcome> {
        match Self::try_cast(issue_id, user_id, vote_type, pool).await {
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(%issue_id, %user_id, "concurrent vote insert, retrying");
                Self::try_cast(issue_id, user_id, vote_type, pool).await
            }
            other => other,
        }
    }

    async fn try_cast(
        issue_id: IssueId,
        user_id: UserId,
        vote_type: VoteType,
        pool: &PgPool,
    ) -> Result<VoteOutcome> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query_as::<_, Self>(
            "SELECT * FROM issue_votes WHERE issue_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(issue_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match existing {
            None => {
                sqlx::query(
                    "INSERT INTO issue_votes (issue_id, user_id, vote_type) VALUES ($1, $2, $3)",
                )
                .bind(issue_id)
                .bind(user_id)
                .bind(vote_type.to_string())
                .execute(&mut *tx)
                .await?;

                let delta = match vote_type {
                    VoteType::Up => "UPDATE issues SET upvotes = upvotes + 1 WHERE id = $1",
                    VoteType::Down => "UPDATE issues SET downvotes = downvotes + 1 WHERE id = $1",
                };
                sqlx::query(delta).bind(issue_id).execute(&mut *tx).await?;

                VoteOutcome::Recorded
            }
            Some(vote) if vote.vote_type == vote_type.to_string() => {
                // Same type again toggles the vote off
                sqlx::query("DELETE FROM issue_votes WHERE id = $1")
                    .bind(vote.id)
                    .execute(&mut *tx)
                    .await?;

                let delta = match vote_type {
                    VoteType::Up => "UPDATE issues SET upvotes = upvotes - 1 WHERE id = $1",
                    VoteType::Down => "UPDATE issues SET downvotes = downvotes - 1 WHERE id = $1",
                };
                sqlx::query(delta).bind(issue_id).execute(&mut *tx).await?;

                VoteOutcome::Removed
            }
            Some(vote) => {
                sqlx::query("UPDATE issue_votes SET vote_type = $2 WHERE id = $1")
                    .bind(vote.id)
                    .bind(vote_type.to_string())
                    .execute(&mut *tx)
                    .await?;

                // Both counters move in the same statement
                let delta = match vote_type {
                    VoteType::Up => {
                        "UPDATE issues SET upvotes = upvotes + 1, downvotes = downvotes - 1 \
                         WHERE id = $1"
                    }
                    VoteType::Down => {
                        "UPDATE issues SET downvotes = downvotes + 1, upvotes = upvotes - 1 \
                         WHERE id = $1"
                    }
                };
                sqlx::query(delta).bind(issue_id).execute(&mut *tx).await?;

                VoteOutcome::Updated
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn find_for_user(
        issue_id: IssueId,
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM issue_votes WHERE issue_id = $1 AND user_id = $2",
        )
        .bind(issue_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// The caller's standing votes across a batch of issues, keyed by issue
    /// (for list serialization, avoids N+1).
    pub async fn map_for_user(
        user_id: UserId,
        issue_ids: &[IssueId],
        pool: &PgPool,
    ) -> Result<HashMap<IssueId, String>> {
        if issue_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let uuids: Vec<Uuid> = issue_ids.iter().map(|id| (*id).into()).collect();
        let rows = sqlx::query_as::<_, Self>(
            "SELECT * FROM issue_votes WHERE user_id = $1 AND issue_id = ANY($2)",
        )
        .bind(user_id)
        .bind(&uuids)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|v| (v.issue_id, v.vote_type)).collect())
    }

    pub async fn count_for_issue(issue_id: IssueId, pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM issue_votes WHERE issue_id = $1")
                .bind(issue_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_vote_type_roundtrip() {
        assert_eq!(VoteType::from_str("up").unwrap(), VoteType::Up);
        assert_eq!(VoteType::from_str("down").unwrap(), VoteType::Down);
        assert!(VoteType::from_str("sideways").is_err());
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(VoteOutcome::Recorded.message(), "Vote recorded");
        assert_eq!(VoteOutcome::Updated.message(), "Vote updated");
        assert_eq!(VoteOutcome::Removed.message(), "Vote removed");
    }
}
