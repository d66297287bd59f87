use serde::{Deserialize, Serialize};

use crate::domains::identity::models::User;

/// Public attribution payload for a user. Embedded in issue, response, note
/// and update representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub is_verified: bool,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            full_name: user.full_name(),
            role: user.role.clone(),
            county: user.county,
            constituency: user.constituency,
            ward: user.ward,
            is_verified: user.is_verified,
        }
    }
}
