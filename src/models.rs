use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub mod auth;
pub mod session;

pub use auth::{AuthError, AuthResult, FlowOutcome, SideEffect, SideEffectFailure};
pub use session::UserSession;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Identity provider recorded on a user account
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthProvider {
    #[default]
    Local,
    Github,
    Other(String),
}

impl AuthProvider {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Github => "github",
            AuthProvider::Other(name) => name,
        }
    }
}

impl From<String> for AuthProvider {
    fn from(value: String) -> Self {
        match value.as_str() {
            "local" => AuthProvider::Local,
            "github" => AuthProvider::Github,
            _ => AuthProvider::Other(value),
        }
    }
}

impl From<AuthProvider> for String {
    fn from(provider: AuthProvider) -> Self {
        provider.as_str().to_string()
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role attached to a user by the identity service's users-permissions plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub role_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// User record as returned by the identity service
///
/// Fields the service adds beyond the common ones (document ids, timestamps,
/// custom profile attributes) are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub provider: AuthProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthenticatedUser {
    /// A record is usable only when it carries a non-zero id
    #[must_use]
    pub fn has_valid_id(&self) -> bool {
        self.id > 0
    }
}

/// Successful response of the login, register and OAuth exchange endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrapiAuthResponse {
    pub jwt: String,
    pub user: AuthenticatedUser,
}

/// Credentials for the local login flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginCredentials {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Change-password form; the bearer token travels separately
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// Reset-password form submitted with the code from the reset email
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// Profile fields written back after a GitHub sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSync {
    pub provider: AuthProvider,
    pub confirmed: bool,
    pub username: String,
    pub email: String,
}
