//! Profile pages and self-service profile edits.

use actix_web::{HttpResponse, web};

use blogicum_core::error::DomainError;
use blogicum_core::policy;
use blogicum_core::ports::BaseRepository;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::ProfileResponse;
use blogicum_shared::forms::{self, UserForm};

use super::{PageQuery, current_user, ensure_in_range, present, profile_url, redirect};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let request = query.request()?;

    let owner = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| DomainError::not_found("User", &username))?;

    let filter = policy::profile_feed_filter(identity.viewer(), owner.id, state.clock.now());
    let page = state.posts.list(&filter, request).await?;
    ensure_in_range(&page)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ProfileResponse {
        profile: present::profile_user(owner),
        posts: present::page(page, present::post),
    })))
}

/// GET /profile/edit/
pub async fn edit_profile_form(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = current_user(&state, &identity).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::user_form(&user))))
}

/// POST /profile/edit/
pub async fn edit_profile(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<UserForm>,
) -> AppResult<HttpResponse> {
    let mut user = current_user(&state, &identity).await?;
    let form = body.into_inner();
    forms::check(&form)?;

    if let Some(other) = state.users.find_by_username(&form.username).await? {
        if other.id != user.id {
            return Err(AppError::field(
                "username",
                "A user with that username already exists.",
            ));
        }
    }

    user.username = form.username;
    user.first_name = form.first_name;
    user.last_name = form.last_name;
    user.email = form.email;
    user.updated_at = state.clock.now();
    let user = state.users.save(user).await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(redirect(profile_url(&user)))
}
