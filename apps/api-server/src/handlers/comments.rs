//! Comment mutations. Reading happens through the post detail.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::domain::{Comment, CommentSummary};
use blogicum_core::error::DomainError;
use blogicum_core::policy::{self, Access};
use blogicum_core::ports::BaseRepository;
use blogicum_shared::ApiResponse;
use blogicum_shared::forms::{self, CommentForm};

use super::{current_user, present};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn post_location(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

/// Load a comment of this post written by the caller; anything else is a 404.
async fn authored_comment(
    state: &AppState,
    identity: &Identity,
    post_id: Uuid,
    comment_id: Uuid,
) -> AppResult<Comment> {
    let comment = state
        .comments
        .find_for_post(post_id, comment_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;

    match policy::comment_write_access(identity.viewer(), &comment) {
        Access::Allow => Ok(comment),
        Access::DenyRedirect | Access::DenyNotFound => {
            Err(DomainError::not_found("Comment", comment_id).into())
        }
    }
}

/// POST /posts/{post_id}/add_comment/
pub async fn add_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let author = current_user(&state, &identity).await?;

    // Only posts the caller can read accept comments.
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

    let form = body.into_inner();
    forms::check(&form)?;

    let comment = state
        .comments
        .save(Comment::new(post_id, author.id, form.text))
        .await?;

    tracing::info!(comment_id = %comment.id, %post_id, "Comment added");
    Ok(super::redirect(post_location(post_id)))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = authored_comment(&state, &identity, post_id, comment_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CommentForm { text: comment.text })))
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let mut comment = authored_comment(&state, &identity, post_id, comment_id).await?;

    let form = body.into_inner();
    forms::check(&form)?;

    comment.text = form.text;
    state.comments.save(comment).await?;

    tracing::info!(%comment_id, "Comment updated");
    Ok(super::redirect(post_location(post_id)))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment_confirm(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = authored_comment(&state, &identity, post_id, comment_id).await?;
    let author = current_user(&state, &identity).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::comment(CommentSummary {
        comment,
        author_username: author.username,
    }))))
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = authored_comment(&state, &identity, post_id, comment_id).await?;

    state.comments.delete(comment.id).await?;

    tracing::info!(%comment_id, "Comment deleted");
    Ok(super::redirect(post_location(post_id)))
}
