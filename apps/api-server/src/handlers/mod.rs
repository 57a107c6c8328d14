//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod comments;
mod health;
mod posts;
mod present;
mod profile;

#[cfg(test)]
mod tests;

use actix_web::{
    HttpRequest, HttpResponse,
    error::{JsonPayloadError, PathError},
    http::header,
    web,
};
use serde::Deserialize;

use blogicum_core::domain::{Post, User};
use blogicum_core::error::DomainError;
use blogicum_core::pagination::{MAX_PAGE, Page, PageRequest};
use blogicum_core::ports::BaseRepository;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .route("/", web::get().to(posts::index))
        .route("/health", web::get().to(health::health_check))
        .route("/category/{slug}/", web::get().to(posts::category_posts))
        .service(
            web::scope("/posts")
                .route("/create/", web::post().to(posts::create_post))
                .route("/{post_id}/", web::get().to(posts::post_detail))
                .service(
                    web::resource("/{post_id}/edit/")
                        .route(web::get().to(posts::edit_post_form))
                        .route(web::post().to(posts::edit_post)),
                )
                .service(
                    web::resource("/{post_id}/delete/")
                        .route(web::get().to(posts::delete_post_confirm))
                        .route(web::post().to(posts::delete_post)),
                )
                .route("/{post_id}/add_comment/", web::post().to(comments::add_comment))
                .service(
                    web::resource("/{post_id}/edit_comment/{comment_id}/")
                        .route(web::get().to(comments::edit_comment_form))
                        .route(web::post().to(comments::edit_comment)),
                )
                .service(
                    web::resource("/{post_id}/delete_comment/{comment_id}/")
                        .route(web::get().to(comments::delete_comment_confirm))
                        .route(web::post().to(comments::delete_comment)),
                ),
        )
        .service(
            web::scope("/profile")
                .service(
                    web::resource("/edit/")
                        .route(web::get().to(profile::edit_profile_form))
                        .route(web::post().to(profile::edit_profile)),
                )
                .route("/{username}/", web::get().to(profile::profile)),
        )
        .service(
            web::scope("/auth")
                .route("/registration/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login))
                .route("/me/", web::get().to(auth::me))
                .route("/password_reset/", web::post().to(auth::password_reset))
                .route(
                    "/password_reset/done/",
                    web::get().to(auth::password_reset_done),
                )
                .route("/reset/{token}/", web::post().to(auth::password_reset_confirm))
                .route("/password_change/", web::post().to(auth::password_change))
                .route(
                    "/password_change/done/",
                    web::get().to(auth::password_change_done),
                ),
        )
        .service(
            web::scope("/admin")
                .route("/categories/", web::post().to(admin::create_category))
                .route("/categories/{slug}/", web::post().to(admin::update_category))
                .route(
                    "/categories/{slug}/delete/",
                    web::post().to(admin::delete_category),
                )
                .route("/locations/", web::post().to(admin::create_location))
                .route("/locations/{location_id}/", web::post().to(admin::update_location))
                .route(
                    "/locations/{location_id}/delete/",
                    web::post().to(admin::delete_location),
                )
                .route(
                    "/posts/{post_id}/publication/",
                    web::post().to(admin::set_publication),
                ),
        )
        .default_service(web::to(not_found));
}

/// Fallback for unknown URLs.
async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("No route for {}", req.path())))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Malformed ids in the path behave like missing objects.
fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound(err.to_string()).into()
}

/// `?page=N` on listing routes.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Page 1 when absent; anything that is not a positive number is a 404.
    pub fn request(&self) -> AppResult<PageRequest> {
        match self.page.as_deref() {
            None => Ok(PageRequest::first()),
            Some(raw) => match raw.parse::<u64>() {
                Ok(number) if (1..=MAX_PAGE).contains(&number) => Ok(PageRequest::new(number)),
                _ => Err(AppError::NotFound(format!("Invalid page '{raw}'"))),
            },
        }
    }
}

/// Pages past the last one do not exist.
pub fn ensure_in_range<T>(page: &Page<T>) -> AppResult<()> {
    if page.is_out_of_range() {
        return Err(AppError::NotFound(format!(
            "Page {} is out of range",
            page.number
        )));
    }
    Ok(())
}

pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub fn post_url(post: &Post) -> String {
    format!("/posts/{}/", post.id)
}

pub fn profile_url(user: &User) -> String {
    format!("/profile/{}/", user.username)
}

/// The account behind a token. A token for a deleted account counts as
/// no login at all.
pub async fn current_user(state: &AppState, identity: &Identity) -> AppResult<User> {
    state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthenticated)
}

/// Load a post by id or fail with 404.
pub async fn find_post(state: &AppState, post_id: uuid::Uuid) -> AppResult<Post> {
    Ok(state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?)
}
