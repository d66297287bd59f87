//! Test fixtures for creating test data.
//!
//! These use the model methods directly, the same code paths the handlers
//! call.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use server_core::domains::identity::models::{Role, User};
use server_core::domains::issues::models::{
    Issue, IssueCategory, IssueSeverity, IssueStatus, NewIssue,
};

/// Create a citizen user with a unique email.
pub async fn create_citizen(pool: &PgPool, name: &str) -> Result<User> {
    let email = format!("{}-{}@example.com", name, Uuid::new_v4().simple());
    User::create(&email, name, name, "Tester", pool).await
}

/// Create a user holding a moderation role.
pub async fn create_moderator(pool: &PgPool, name: &str) -> Result<User> {
    let user = create_citizen(pool, name).await?;
    User::set_role(user.id, Role::Moderator, pool).await
}

pub async fn create_admin(pool: &PgPool, name: &str) -> Result<User> {
    let user = create_citizen(pool, name).await?;
    User::set_role(user.id, Role::Admin, pool).await
}

/// Field overrides for an issue fixture.
pub struct IssueFixture {
    pub title: String,
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub anonymous: bool,
}

impl Default for IssueFixture {
    fn default() -> Self {
        Self {
            title: "Burst water pipe".to_string(),
            category: IssueCategory::Water,
            severity: IssueSeverity::Medium,
            county: "Kiambu".to_string(),
            constituency: "Ruiru".to_string(),
            ward: "Kahawa Wendani".to_string(),
            anonymous: false,
        }
    }
}

pub async fn create_test_issue(
    pool: &PgPool,
    submitted_by: &User,
    fixture: IssueFixture,
) -> Result<Issue> {
    let fields = NewIssue {
        title: fixture.title,
        description: "Fixture issue description".to_string(),
        category: fixture.category,
        severity: fixture.severity,
        county: fixture.county,
        constituency: fixture.constituency,
        ward: fixture.ward,
        location: None,
        latitude: None,
        longitude: None,
        anonymous: fixture.anonymous,
    };
    Issue::create(&fields, submitted_by.id, pool).await
}

/// Shorthand: default fixture with a custom title.
pub async fn create_simple_issue(pool: &PgPool, submitted_by: &User, title: &str) -> Result<Issue> {
    create_test_issue(
        pool,
        submitted_by,
        IssueFixture {
            title: title.to_string(),
            ..Default::default()
        },
    )
    .await
}

/// Move an issue to the given status through the model path.
pub async fn set_issue_status(pool: &PgPool, issue: &Issue, status: IssueStatus) -> Result<Issue> {
    Issue::set_status(issue.id, status, pool).await
}
