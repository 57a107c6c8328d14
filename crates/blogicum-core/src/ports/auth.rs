//! Authentication ports: access tokens, reset tokens and password hashing.

use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    pub exp: i64,
}

/// Claims carried by a password reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetClaims {
    pub user_id: Uuid,
    /// Security stamp of the user at issue time.
    pub stamp: String,
}

/// Signed token issuing and verification.
pub trait TokenService: Send + Sync {
    /// Generate an access token for a user.
    fn generate_token(&self, user_id: Uuid, roles: Vec<String>) -> Result<String, AuthError>;

    /// Validate and decode an access token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of access tokens in seconds.
    fn expiration_seconds(&self) -> i64;

    /// Generate a single-purpose password reset token.
    fn generate_reset_token(&self, user_id: Uuid, stamp: &str) -> Result<String, AuthError>;

    /// Validate a password reset token. Access tokens are rejected.
    fn validate_reset_token(&self, token: &str) -> Result<ResetClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Hashing error: {0}")]
    HashingError(String),
}
