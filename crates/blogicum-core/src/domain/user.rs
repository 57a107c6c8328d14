use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of trailing password-hash characters used as a security stamp.
const SECURITY_STAMP_LEN: usize = 16;

/// User entity - an account that authors posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            is_staff: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Roles carried in access tokens issued to this user.
    pub fn roles(&self) -> Vec<String> {
        let mut roles = vec!["user".to_string()];
        if self.is_staff {
            roles.push("admin".to_string());
        }
        roles
    }

    /// A value that changes whenever the password changes.
    ///
    /// Password reset tokens embed it, so a token stops working once it has
    /// been used to set a new password.
    pub fn security_stamp(&self) -> &str {
        let hash = self.password_hash.as_str();
        let start = hash.len().saturating_sub(SECURITY_STAMP_LEN);
        hash.get(start..).unwrap_or(hash)
    }
}
