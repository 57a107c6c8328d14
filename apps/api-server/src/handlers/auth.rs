//! Registration, login, password reset and password change.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use blogicum_core::domain::User;
use blogicum_core::ports::{AuthError, BaseRepository, Email, PasswordService, TokenService};
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::AuthResponse;
use blogicum_shared::forms::{
    self, LoginRequest, PasswordChangeRequest, PasswordResetRequest, RegisterUserRequest,
    SetPasswordRequest,
};

use super::{current_user, present, redirect};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult, LOGIN_URL};
use crate::state::AppState;

const RESET_DONE_URL: &str = "/auth/password_reset/done/";
const CHANGE_DONE_URL: &str = "/auth/password_change/done/";

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    forms::check(&req)?;

    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::field(
            "username",
            "A user with that username already exists.",
        ));
    }

    let password_hash = password_service.hash(&req.password1)?;
    let user = state
        .users
        .save(User::new(req.username, req.email, password_hash))
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let welcome = Email {
        from: state.mail_from.clone(),
        to: user.email.clone(),
        subject: "Welcome!".to_string(),
        body: "Thank you for registering on our site.".to_string(),
    };
    if let Err(e) = state.mailer.send(welcome).await {
        tracing::warn!(user_id = %user.id, error = %e, "Welcome email not sent");
    }

    Ok(redirect("/"))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password_service.verify(&req.password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = token_service.generate_token(user.id, user.roles())?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds() as u64,
    }))
}

/// GET /auth/me/
pub async fn me(identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = current_user(&state, &identity).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(present::user(user))))
}

/// POST /auth/password_reset/ - mail a reset link to the account's address.
pub async fn password_reset(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    body: web::Json<PasswordResetRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    forms::check(&req)?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| {
            AppError::field(
                "email",
                "There is no user registered with the specified email address.",
            )
        })?;

    let token = token_service.generate_reset_token(user.id, user.security_stamp())?;
    let link = format!("{}/auth/reset/{}/", state.site_url, token);

    state
        .mailer
        .send(Email {
            from: state.mail_from.clone(),
            to: user.email.clone(),
            subject: "Password reset".to_string(),
            body: format!(
                "A password reset was requested for your account. \
                 Follow the link to choose a new password: {link}\n\
                 If this was not you, contact the administrator."
            ),
        })
        .await?;

    tracing::info!(user_id = %user.id, "Password reset requested");
    Ok(redirect(RESET_DONE_URL))
}

/// GET /auth/password_reset/done/
pub async fn password_reset_done() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::message(
        "We've emailed you instructions for setting your password.",
    ))
}

/// POST /auth/reset/{token}/ - set a new password with a mailed token.
pub async fn password_reset_confirm(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    path: web::Path<String>,
    body: web::Json<SetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let invalid_link =
        || AppError::InvalidToken("The password reset link is invalid or has expired.".into());

    let claims = token_service
        .validate_reset_token(&path.into_inner())
        .map_err(|_| invalid_link())?;

    let mut user = state
        .users
        .find_by_id(claims.user_id)
        .await?
        .ok_or_else(invalid_link)?;

    // The stamp changes with the password hash, so a used link stops working.
    if user.security_stamp() != claims.stamp {
        return Err(invalid_link());
    }

    let req = body.into_inner();
    forms::check(&req)?;

    user.password_hash = password_service.hash(&req.new_password1)?;
    user.updated_at = state.clock.now();
    let user = state.users.save(user).await?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(redirect(LOGIN_URL))
}

/// POST /auth/password_change/
pub async fn password_change(
    identity: Identity,
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<PasswordChangeRequest>,
) -> AppResult<HttpResponse> {
    let mut user = current_user(&state, &identity).await?;
    let req = body.into_inner();
    forms::check(&req)?;

    if !password_service.verify(&req.old_password, &user.password_hash)? {
        return Err(AppError::field(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        ));
    }

    user.password_hash = password_service.hash(&req.new_password1)?;
    user.updated_at = state.clock.now();
    let user = state.users.save(user).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(redirect(CHANGE_DONE_URL))
}

/// GET /auth/password_change/done/
pub async fn password_change_done(_identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::message("Your password was changed."))
}
