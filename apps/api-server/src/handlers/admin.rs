//! Staff-only management of categories, locations and post publication.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::domain::{Category, Location};
use blogicum_core::error::DomainError;
use blogicum_core::ports::BaseRepository;
use blogicum_shared::ApiResponse;
use blogicum_shared::forms::{self, CategoryForm, LocationForm, PublicationRequest};

use super::{find_post, present};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Slugs are unique across categories.
async fn ensure_slug_free(
    state: &AppState,
    slug: &str,
    current: Option<Uuid>,
) -> AppResult<()> {
    match state.categories.find_by_slug(slug).await? {
        Some(other) if Some(other.id) != current => Err(AppError::field(
            "slug",
            "Category with this slug already exists.",
        )),
        _ => Ok(()),
    }
}

async fn find_category(state: &AppState, slug: &str) -> AppResult<Category> {
    Ok(state
        .categories
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| DomainError::not_found("Category", slug))?)
}

async fn find_location(state: &AppState, location_id: Uuid) -> AppResult<Location> {
    Ok(state
        .locations
        .find_by_id(location_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Location", location_id))?)
}

/// POST /admin/categories/
pub async fn create_category(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<CategoryForm>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let form = body.into_inner();
    forms::check(&form)?;
    ensure_slug_free(&state, &form.slug, None).await?;

    let mut category = Category::new(form.title, form.description, form.slug);
    category.is_published = form.is_published;
    let category = state.categories.save(category).await?;

    tracing::info!(slug = %category.slug, "Category created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(present::category(category))))
}

/// POST /admin/categories/{slug}/
pub async fn update_category(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CategoryForm>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let mut category = find_category(&state, &path.into_inner()).await?;
    let form = body.into_inner();
    forms::check(&form)?;
    ensure_slug_free(&state, &form.slug, Some(category.id)).await?;

    category.title = form.title;
    category.description = form.description;
    category.slug = form.slug;
    category.is_published = form.is_published;
    let category = state.categories.save(category).await?;

    tracing::info!(slug = %category.slug, "Category updated");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::category(category))))
}

/// POST /admin/categories/{slug}/delete/ - posts keep existing without a category.
pub async fn delete_category(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let category = find_category(&state, &path.into_inner()).await?;
    state.categories.delete(category.id).await?;

    tracing::info!(slug = %category.slug, "Category deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// POST /admin/locations/
pub async fn create_location(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<LocationForm>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let form = body.into_inner();
    forms::check(&form)?;

    let mut location = Location::new(form.name);
    location.is_published = form.is_published;
    let location = state.locations.save(location).await?;

    tracing::info!(location_id = %location.id, "Location created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(present::location(location))))
}

/// POST /admin/locations/{location_id}/
pub async fn update_location(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<LocationForm>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let mut location = find_location(&state, path.into_inner()).await?;
    let form = body.into_inner();
    forms::check(&form)?;

    location.name = form.name;
    location.is_published = form.is_published;
    let location = state.locations.save(location).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::location(location))))
}

/// POST /admin/locations/{location_id}/delete/
pub async fn delete_location(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let location = find_location(&state, path.into_inner()).await?;
    state.locations.delete(location.id).await?;

    tracing::info!(location_id = %location.id, "Location deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// POST /admin/posts/{post_id}/publication/ - hide or restore a post.
pub async fn set_publication(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PublicationRequest>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let mut post = find_post(&state, path.into_inner()).await?;

    post.is_published = body.is_published;
    let post = state.posts.save(post).await?;
    let summary = state
        .posts
        .find_summary(post.id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post.id))?;

    tracing::info!(post_id = %post.id, is_published = post.is_published, "Publication changed");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::post(summary))))
}
