//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod clock;
mod mailer;
mod repository;

pub use auth::{AuthError, PasswordService, ResetClaims, TokenClaims, TokenService};
pub use clock::{Clock, SystemClock};
pub use mailer::{Email, MailError, Mailer};
pub use repository::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
