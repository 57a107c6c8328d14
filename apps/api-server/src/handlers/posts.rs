//! Post feeds, detail and author mutations.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::domain::Post;
use blogicum_core::error::DomainError;
use blogicum_core::policy::{self, Access};
use blogicum_core::ports::BaseRepository;
use blogicum_core::query::PostFilter;
use blogicum_shared::ApiResponse;
use blogicum_shared::FieldError;
use blogicum_shared::dto::{CategoryPostsResponse, PostDetailResponse};
use blogicum_shared::forms::{self, CommentForm, PostForm};

use super::{
    PageQuery, current_user, ensure_in_range, find_post, post_url, present, profile_url,
    redirect,
};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET / - public feed.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = query.request()?;
    let filter = PostFilter::public(state.clock.now());

    let page = state.posts.list(&filter, request).await?;
    ensure_in_range(&page)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::page(page, present::post))))
}

/// GET /category/{slug}/ - public feed of a published category.
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let request = query.request()?;

    let category = state.categories.find_by_slug(&slug).await?;
    let category = match (policy::category_feed_access(category.as_ref()), category) {
        (Access::Allow, Some(category)) => category,
        _ => return Err(DomainError::not_found("Category", slug).into()),
    };

    let filter = PostFilter::public(state.clock.now()).in_category(category.id);
    let page = state.posts.list(&filter, request).await?;
    ensure_in_range(&page)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CategoryPostsResponse {
        category: present::category(category),
        posts: present::page(page, present::post),
    })))
}

/// GET /posts/{post_id}/ - post with its comments.
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let summary = state
        .posts
        .find_summary(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    let access = policy::post_read_access(
        identity.viewer(),
        &summary.post,
        summary.category_published(),
        state.clock.now(),
    );
    if !access.is_allowed() {
        return Err(DomainError::not_found("Post", post_id).into());
    }

    let comments = state.comments.list_for_post(post_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostDetailResponse {
        post: present::post(summary),
        comments: comments.into_iter().map(present::comment).collect(),
        form: CommentForm::default(),
    })))
}

/// Run the form rules plus the checks that need the store.
async fn clean_post_form(state: &AppState, form: &PostForm) -> AppResult<()> {
    let mut errors = forms::check(form).err().unwrap_or_default();

    if let Some(category_id) = form.category_id {
        if state.categories.find_by_id(category_id).await?.is_none() {
            errors.push(FieldError::new("category_id", "Select a valid choice."));
        }
    }
    if let Some(location_id) = form.location_id {
        if state.locations.find_by_id(location_id).await?.is_none() {
            errors.push(FieldError::new("location_id", "Select a valid choice."));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Copy whitelisted form fields onto a post.
fn apply_form(post: &mut Post, form: PostForm) -> AppResult<()> {
    let pub_date = form
        .pub_date
        .ok_or_else(|| DomainError::Validation("pub_date is required".to_string()))?;

    post.title = form.title;
    post.text = form.text;
    post.image = form.image;
    post.pub_date = pub_date;
    post.category_id = form.category_id;
    post.location_id = form.location_id;
    post.is_published = form.is_published;
    Ok(())
}

/// Load a post the caller may mutate; others are sent to the detail page.
async fn authored_post(state: &AppState, identity: &Identity, post_id: Uuid) -> AppResult<Post> {
    let post = find_post(state, post_id).await?;

    match policy::post_write_access(identity.viewer(), &post) {
        Access::Allow => Ok(post),
        Access::DenyRedirect => Err(AppError::PermissionRedirect(post_url(&post))),
        Access::DenyNotFound => Err(DomainError::not_found("Post", post_id).into()),
    }
}

/// POST /posts/create/
pub async fn create_post(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let author = current_user(&state, &identity).await?;
    let form = body.into_inner();
    clean_post_form(&state, &form).await?;

    let mut post = Post::new(author.id, String::new(), String::new(), state.clock.now());
    apply_form(&mut post, form)?;
    let post = state.posts.save(post).await?;

    tracing::info!(post_id = %post.id, author = %author.username, "Post created");
    Ok(redirect(profile_url(&author)))
}

/// GET /posts/{post_id}/edit/ - current values for the author.
pub async fn edit_post_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = authored_post(&state, &identity, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::post_form(&post))))
}

/// POST /posts/{post_id}/edit/
pub async fn edit_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let mut post = authored_post(&state, &identity, path.into_inner()).await?;
    let form = body.into_inner();
    clean_post_form(&state, &form).await?;

    apply_form(&mut post, form)?;
    let post = state.posts.save(post).await?;

    tracing::info!(post_id = %post.id, "Post updated");
    Ok(redirect(post_url(&post)))
}

/// GET /posts/{post_id}/delete/ - the post about to be deleted.
pub async fn delete_post_confirm(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = authored_post(&state, &identity, path.into_inner()).await?;
    let summary = state
        .posts
        .find_summary(post.id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post.id))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::post(summary))))
}

/// POST /posts/{post_id}/delete/
pub async fn delete_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = authored_post(&state, &identity, path.into_inner()).await?;
    state.posts.delete(post.id).await?;

    tracing::info!(post_id = %post.id, "Post deleted");
    Ok(redirect("/"))
}
