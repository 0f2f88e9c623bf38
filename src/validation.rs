//! Input validation for the orchestrated authentication flows
//!
//! Every rule here is local and deterministic. A failure short-circuits the
//! flow before any network call and is reported as a 400-coded `AuthResult`
//! (401 for a missing change-password token). Rules are checked in a fixed
//! order so the first failing rule decides the message.

use crate::models::auth::{STATUS_BAD_REQUEST, STATUS_UNAUTHORIZED};
use crate::models::{AuthResult, LoginCredentials, PasswordChange, PasswordReset, Registration};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub code: u16,
}

impl ValidationError {
    fn bad_request(message: &str) -> Self {
        Self {
            message: message.to_string(),
            code: STATUS_BAD_REQUEST,
        }
    }

    fn unauthorized(message: &str) -> Self {
        Self {
            message: message.to_string(),
            code: STATUS_UNAUTHORIZED,
        }
    }
}

impl From<ValidationError> for AuthResult {
    fn from(error: ValidationError) -> Self {
        AuthResult::failure(error.message, error.code)
    }
}

fn require(condition: bool, message: &str) -> Result<(), ValidationError> {
    if condition {
        Ok(())
    } else {
        Err(ValidationError::bad_request(message))
    }
}

/// Lengths count UTF-16 code units, as browser forms and the identity service do
fn long_enough(value: &str, min: usize) -> bool {
    value.encode_utf16().count() >= min
}

/// # Errors
///
/// Returns the first sign-up rule the registration breaks
pub fn validate_sign_up(registration: &Registration) -> Result<(), ValidationError> {
    require(
        !registration.username.is_empty()
            && !registration.email.is_empty()
            && !registration.password.is_empty(),
        "Username, email, and password are required",
    )?;
    require(
        registration.password == registration.password_confirm,
        "Passwords do not match",
    )?;
    require(
        long_enough(&registration.username, MIN_USERNAME_LENGTH),
        "Username must be at least 3 characters",
    )?;
    require(
        long_enough(&registration.password, MIN_PASSWORD_LENGTH),
        "Password must be at least 6 characters",
    )
}

/// # Errors
///
/// Returns an error if the identifier or password is missing
pub fn validate_sign_in(credentials: &LoginCredentials) -> Result<(), ValidationError> {
    require(
        !credentials.identifier.is_empty() && !credentials.password.is_empty(),
        "Email/username and password are required",
    )
}

/// # Errors
///
/// Returns 401 without a token, otherwise the first form rule that fails
pub fn validate_change_password(
    token: Option<&str>,
    change: &PasswordChange,
) -> Result<(), ValidationError> {
    if token.is_none_or(str::is_empty) {
        return Err(ValidationError::unauthorized("Authentication required"));
    }
    require(
        !change.current_password.is_empty(),
        "Current password is required",
    )?;
    require(!change.password.is_empty(), "New password is required")?;
    require(
        !change.password_confirmation.is_empty(),
        "Password confirmation is required",
    )?;
    require(
        change.password == change.password_confirmation,
        "New passwords do not match",
    )
}

/// # Errors
///
/// Returns an error if the email is missing
pub fn validate_password_reset_email(email: &str) -> Result<(), ValidationError> {
    require(!email.is_empty(), "Email is required")
}

/// # Errors
///
/// Returns the first reset rule the form breaks
pub fn validate_reset_password(reset: &PasswordReset) -> Result<(), ValidationError> {
    require(
        !reset.code.is_empty()
            && !reset.password.is_empty()
            && !reset.password_confirmation.is_empty(),
        "Reset code and new password are required",
    )?;
    require(
        reset.password == reset.password_confirmation,
        "Passwords do not match",
    )?;
    require(
        long_enough(&reset.password, MIN_PASSWORD_LENGTH),
        "Password must be at least 6 characters",
    )
}

/// # Errors
///
/// Returns an error if the confirmation code is missing
pub fn validate_confirm_email(confirmation: &str) -> Result<(), ValidationError> {
    require(!confirmation.is_empty(), "Confirmation code is required")
}

/// # Errors
///
/// Returns an error if the access token is missing
pub fn validate_github_token(access_token: &str) -> Result<(), ValidationError> {
    require(!access_token.is_empty(), "GitHub access token is required")
}
