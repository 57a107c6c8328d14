//! Submitted forms and their field rules.
//!
//! Each form only carries the fields a client may set; anything else in a
//! request body is dropped during deserialization. Rules that need the
//! store (unique usernames, existing categories) are checked by the handlers.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::response::FieldError;

pub const REQUIRED: &str = "This field is required.";
const TITLE_MAX: u64 = 256;
const NAME_MAX: u64 = 150;
const PASSWORD_MIN: usize = 8;

fn default_true() -> bool {
    true
}

/// Post fields editable by the author. The author itself is set server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, max = 256, message = "Title is required and must be at most 256 characters."))]
    pub title: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    pub image: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub pub_date: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub is_published: bool,
}

impl Default for PostForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            image: None,
            pub_date: None,
            category_id: None,
            location_id: None,
            is_published: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

/// Profile fields a user may change on their own account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UserForm {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterUserRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password1: String,
    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    pub password2: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

/// New password chosen through a reset link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SetPasswordRequest {
    #[validate(custom(function = "validate_password"))]
    pub new_password1: String,
    #[validate(must_match(
        other = "new_password1",
        message = "The two password fields didn't match."
    ))]
    pub new_password2: String,
}

/// Password change by a logged-in user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordChangeRequest {
    #[validate(length(min = 1, message = "This field is required."))]
    pub old_password: String,
    #[validate(custom(function = "validate_password"))]
    pub new_password1: String,
    #[validate(must_match(
        other = "new_password1",
        message = "The two password fields didn't match."
    ))]
    pub new_password2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 256, message = "Title is required and must be at most 256 characters."))]
    pub title: String,
    pub description: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    pub is_published: bool,
}

impl Default for CategoryForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            slug: String::new(),
            is_published: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LocationForm {
    #[validate(length(min = 1, max = 256, message = "Name is required and must be at most 256 characters."))]
    pub name: String,
    pub is_published: bool,
}

impl Default for LocationForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_published: default_true(),
        }
    }
}

/// Staff toggle of a post's `is_published` flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PublicationRequest {
    pub is_published: bool,
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Letters, digits and `@.+-_`, at most 150 characters.
pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rule("required", REQUIRED));
    }
    if value.chars().count() as u64 > NAME_MAX {
        return Err(rule(
            "length",
            "Ensure this value has at most 150 characters.",
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(rule(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

/// Empty is allowed, anything else must look like an address.
pub fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(rule("email", "Enter a valid email address."))
    }
}

pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(rule(
            "password_too_short",
            "This password is too short. It must contain at least 8 characters.",
        ));
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err(rule("password_entirely_numeric", "This password is entirely numeric."));
    }
    Ok(())
}

/// Latin letters, digits, hyphens and underscores.
pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rule("required", REQUIRED));
    }
    if value.len() as u64 > TITLE_MAX {
        return Err(rule(
            "length",
            "Ensure this value has at most 256 characters.",
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(rule(
            "slug",
            "Enter a valid slug consisting of Latin letters, numbers, underscores or hyphens.",
        ));
    }
    Ok(())
}

/// Flatten validator output into field messages, ordered by field name.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                FieldError::new(field.clone(), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// Run the derived rules and return field messages on failure.
pub fn check<F: Validate>(form: &F) -> Result<(), Vec<FieldError>> {
    form.validate().map_err(|e| field_errors(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: Vec<FieldError>) -> Vec<String> {
        errors.into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_post_form_requires_title_text_and_date() {
        let errors = check(&PostForm::default()).unwrap_err();
        assert_eq!(fields(errors), vec!["pub_date", "text", "title"]);

        let form = PostForm {
            title: "Trip".into(),
            text: "Went to the sea".into(),
            pub_date: Some(Utc::now()),
            ..PostForm::default()
        };
        assert!(check(&form).is_ok());
    }

    #[test]
    fn test_post_title_length_limit() {
        let form = PostForm {
            title: "x".repeat(257),
            text: "body".into(),
            pub_date: Some(Utc::now()),
            ..PostForm::default()
        };
        assert_eq!(fields(check(&form).unwrap_err()), vec!["title"]);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let form: CommentForm =
            serde_json::from_str(r#"{"text": "hi", "author_id": "someone"}"#).unwrap();
        assert_eq!(form.text, "hi");
    }

    #[test]
    fn test_post_form_defaults_to_published() {
        let form: PostForm = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert!(form.is_published);
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("ann.lee+blog@x_y-z").is_ok());
        assert!(validate_username("ann lee").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("s3cret-pass").is_ok());
    }

    #[test]
    fn test_registration_passwords_must_match() {
        let form = RegisterUserRequest {
            username: "ann".into(),
            email: "ann@example.com".into(),
            password1: "s3cret-pass".into(),
            password2: "other-pass".into(),
        };
        assert_eq!(fields(check(&form).unwrap_err()), vec!["password2"]);
    }

    #[test]
    fn test_password_change_rules() {
        assert_eq!(
            fields(check(&PasswordChangeRequest::default()).unwrap_err()),
            vec!["new_password1", "old_password"]
        );

        let form = PasswordChangeRequest {
            old_password: "s3cret-pass".into(),
            new_password1: "brand-new-pass".into(),
            new_password2: "brand-new-past".into(),
        };
        assert_eq!(fields(check(&form).unwrap_err()), vec!["new_password2"]);
    }

    #[test]
    fn test_profile_email_is_optional() {
        let mut form = UserForm {
            username: "ann".into(),
            ..UserForm::default()
        };
        assert!(check(&form).is_ok());

        form.email = "not-an-address".into();
        assert_eq!(fields(check(&form).unwrap_err()), vec!["email"]);
    }

    #[test]
    fn test_slug_rules() {
        assert!(validate_slug("travel_2024-summer").is_ok());
        assert!(validate_slug("путешествия").is_err());
        assert!(validate_slug("with space").is_err());
    }
}
