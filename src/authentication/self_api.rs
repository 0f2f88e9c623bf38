//! Self-call authentication backend
//!
//! Used outside the server context: each flow becomes an HTTP call to this
//! service's own `/api/auth/*` endpoints, which run the same orchestrator with
//! the in-process backend. The caller's `Cookie` header is forwarded so the
//! session travels with the call.

use crate::authentication::context::{ExecutionContext, RequestContext};
use crate::authentication::traits::AuthBackend;
use crate::models::auth::STATUS_INTERNAL_ERROR;
use crate::models::{
    AuthError, AuthResult, FlowOutcome, LoginCredentials, PasswordChange, PasswordReset,
    Registration,
};
use actix_web::http::header;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};
use url::Url;

const USER_AGENT: &str = "Web3Insights-Auth/1.0";

/// `extra` key holding the `Set-Cookie` value a self-call answered with
pub const SET_COOKIE_EXTRA: &str = "setCookie";

pub struct SelfApiAuthBackend {
    http: Client,
    base_url: String,
}

impl SelfApiAuthBackend {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL or the client cannot be built
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        Url::parse(base_url).map_err(|e| {
            AuthError::Configuration(format!("Invalid public base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            http: Client::builder().user_agent(USER_AGENT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, request: Option<&RequestContext>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match request.and_then(RequestContext::cookie_header) {
            Some(cookie) => builder.header(header::COOKIE.as_str(), cookie),
            None => builder,
        }
    }

    /// Send a self-call and read the `AuthResult` the endpoint answers with
    async fn call(&self, builder: RequestBuilder, operation: &str, generic_message: &str) -> AuthResult {
        match Self::send(builder).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("Self-API {operation} failed: {e}");
                AuthResult::failure(generic_message, STATUS_INTERNAL_ERROR)
            }
        }
    }

    /// Read the endpoint's answer
    ///
    /// Most endpoints answer an `AuthResult`; the login endpoint answers
    /// failures as `{"error": message}`, which maps onto a failure carrying the
    /// HTTP status. A `Set-Cookie` header is surfaced as `extra.setCookie` so
    /// the caller can hand the session on.
    async fn send(builder: RequestBuilder) -> Result<AuthResult, AuthError> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE.as_str())
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response.text().await?;

        let value: Value = serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse {
            url: url.clone(),
            reason: format!("status {}: {e}", status.as_u16()),
        })?;

        let result = match serde_json::from_value::<AuthResult>(value.clone()) {
            Ok(result) => result,
            Err(e) => match value.get("error").and_then(Value::as_str) {
                Some(message) if !status.is_success() => {
                    AuthResult::failure(message, status.as_u16())
                }
                _ => {
                    return Err(AuthError::InvalidResponse {
                        url,
                        reason: format!("status {}: {e}", status.as_u16()),
                    });
                }
            },
        };

        Ok(match set_cookie {
            Some(cookie) if !result.extra.contains_key(SET_COOKIE_EXTRA) => {
                result.with_extra(SET_COOKIE_EXTRA, cookie)
            }
            _ => result,
        })
    }
}

#[async_trait]
impl AuthBackend for SelfApiAuthBackend {
    fn context(&self) -> ExecutionContext {
        ExecutionContext::Client
    }

    async fn sign_up(
        &self,
        registration: &Registration,
        requires_email_verification: bool,
    ) -> FlowOutcome {
        let mut body = serde_json::to_value(registration).unwrap_or(Value::Null);
        if let Value::Object(fields) = &mut body {
            fields.insert(
                "requiresEmailVerification".to_string(),
                Value::Bool(requires_email_verification),
            );
        }
        let builder = self
            .request(Method::POST, "/api/auth/register", None)
            .json(&body);
        FlowOutcome::new(
            self.call(builder, "registration", "An error occurred during registration")
                .await,
        )
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> AuthResult {
        let builder = self.request(Method::POST, "/api/auth/login", None).json(&json!({
            "identifier": credentials.identifier,
            "password": credentials.password,
            "clientSide": true,
        }));
        self.call(builder, "login", "An error occurred during login")
            .await
    }

    async fn sign_out(&self, request: &RequestContext) -> AuthResult {
        let builder = self
            .request(Method::POST, "/api/auth/logout", Some(request))
            .json(&json!({ "clientSide": true }));
        self.call(builder, "logout", "An error occurred during logout")
            .await
    }

    async fn fetch_current_user(&self, request: &RequestContext) -> AuthResult {
        let builder = self.request(Method::GET, "/api/auth/me", Some(request));
        let result = self
            .call(builder, "current user", "An error occurred while fetching the user")
            .await;
        if result.success {
            result
        } else {
            AuthResult::not_authenticated().with_extra("authenticated", false)
        }
    }

    async fn change_password(&self, token: &str, change: &PasswordChange) -> AuthResult {
        let builder = self
            .request(Method::POST, "/api/auth/change-password", None)
            .bearer_auth(token)
            .json(change);
        self.call(
            builder,
            "change password",
            "An error occurred during password change",
        )
        .await
    }

    async fn send_password_reset_email(&self, email: &str) -> AuthResult {
        let builder = self
            .request(Method::POST, "/api/auth/forgot-password", None)
            .json(&json!({ "email": email }));
        self.call(
            builder,
            "forgot password",
            "An error occurred while processing your request",
        )
        .await
    }

    async fn reset_password(&self, reset: &PasswordReset) -> AuthResult {
        let builder = self
            .request(Method::POST, "/api/auth/reset-password", None)
            .json(reset);
        self.call(
            builder,
            "reset password",
            "An error occurred while resetting your password",
        )
        .await
    }

    async fn confirm_email(&self, confirmation: &str) -> AuthResult {
        let path = format!(
            "/api/auth/email-confirmation?confirmation={}",
            urlencoding::encode(confirmation)
        );
        let builder = self.request(Method::GET, &path, None);
        self.call(
            builder,
            "email confirmation",
            "An error occurred during email confirmation",
        )
        .await
    }

    async fn auth_with_github(&self, access_token: &str) -> FlowOutcome {
        let builder = self
            .request(Method::POST, "/api/auth/github", None)
            .json(&json!({ "accessToken": access_token }));
        FlowOutcome::new(
            self.call(
                builder,
                "GitHub authentication",
                "An error occurred during GitHub authentication",
            )
            .await,
        )
    }
}
