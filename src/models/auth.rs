//! Common authentication data types
//!
//! `AuthResult` is the envelope every authentication flow returns, whether it
//! ran against the identity service directly or through this server's own API.
//! `FlowOutcome` pairs a result with the best-effort side effects that failed
//! while producing it, so callers can log them without failing the flow.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Uniform success/failure envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    pub success: bool,
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl AuthResult {
    #[must_use]
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            code: STATUS_OK,
            message: message.into(),
            data,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            data: None,
            extra: Map::new(),
        }
    }

    /// Local validation failure; never produced by a network call
    #[must_use]
    pub fn validation_failure(message: impl Into<String>) -> Self {
        Self::failure(message, STATUS_BAD_REQUEST)
    }

    /// The "nobody is signed in" shape: a success carrying no user
    #[must_use]
    pub fn not_authenticated() -> Self {
        Self::success("", None)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Deserialize `data` into a typed value, `None` if absent or mismatched
    #[must_use]
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }

    /// Read a boolean from `extra`, treating anything but `true` as false
    #[must_use]
    pub fn extra_flag(&self, key: &str) -> bool {
        self.extra.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Best-effort steps whose failure must not fail the surrounding flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    ConfirmationEmail,
    EnsureUserRole,
    SyncGitHubProfile,
    AccountLinkCheck,
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SideEffect::ConfirmationEmail => "confirmation email",
            SideEffect::EnsureUserRole => "ensure user role",
            SideEffect::SyncGitHubProfile => "sync GitHub profile",
            SideEffect::AccountLinkCheck => "account link check",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectFailure {
    pub effect: SideEffect,
    pub message: String,
}

/// Primary result of a flow plus any side-effect failures swallowed on the way
#[derive(Debug, Clone, PartialEq)]
pub struct FlowOutcome {
    pub result: AuthResult,
    pub side_effect_failures: Vec<SideEffectFailure>,
}

impl FlowOutcome {
    #[must_use]
    pub fn new(result: AuthResult) -> Self {
        Self {
            result,
            side_effect_failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, effect: SideEffect, message: impl Into<String>) {
        self.side_effect_failures.push(SideEffectFailure {
            effect,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn has_side_effect_failures(&self) -> bool {
        !self.side_effect_failures.is_empty()
    }
}

impl From<AuthResult> for FlowOutcome {
    fn from(result: AuthResult) -> Self {
        Self::new(result)
    }
}

/// Errors raised below the orchestrator
///
/// The orchestrator folds these into failed `AuthResult`s.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Upstream request failed with status {code}: {message}")]
    Upstream { code: u16, message: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Session(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_authenticated_shape() {
        let result = AuthResult::not_authenticated();
        assert!(result.success);
        assert_eq!(result.code, 200);
        assert!(result.data.is_none());

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["data"], Value::Null);
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_extra_flags() {
        let result = AuthResult::success("ok", None).with_extra("resetSuccess", true);
        assert!(result.extra_flag("resetSuccess"));
        assert!(!result.extra_flag("authenticated"));
    }

    #[test]
    fn test_data_as_typed_value() {
        let result = AuthResult::success("", Some(json!({"jwt": "T", "user": {"id": 7}})));
        let response: crate::models::StrapiAuthResponse = result.data_as().unwrap();
        assert_eq!(response.jwt, "T");
        assert_eq!(response.user.id, 7);

        let malformed = AuthResult::success("", Some(json!({"user": {"id": 7}})));
        assert!(malformed.data_as::<crate::models::StrapiAuthResponse>().is_none());
    }

    #[test]
    fn test_flow_outcome_records_side_effects() {
        let mut outcome = FlowOutcome::new(AuthResult::success("done", None));
        assert!(!outcome.has_side_effect_failures());

        outcome.record_failure(SideEffect::EnsureUserRole, "role lookup failed");
        assert!(outcome.has_side_effect_failures());
        assert!(outcome.result.success);
        assert_eq!(outcome.side_effect_failures[0].effect, SideEffect::EnsureUserRole);
    }
}
