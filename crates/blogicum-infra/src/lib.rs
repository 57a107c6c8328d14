//! # Blogicum Infrastructure
//!
//! Concrete implementations of the ports defined in `blogicum-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory store and log mailer only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `webhook-mail` - Deliver mail through an HTTP relay via reqwest

pub mod auth;
pub mod database;
pub mod mail;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{DatabaseConfig, InMemoryStore};
pub use mail::{InMemoryMailer, LogMailer};

#[cfg(feature = "webhook-mail")]
pub use mail::WebhookMailer;
