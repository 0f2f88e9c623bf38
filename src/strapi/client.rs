//! HTTP plumbing for the identity service
//!
//! Every call is normalized into an `AuthResult`: a 2xx response becomes a
//! success carrying the parsed body as `data`, anything else becomes a failure
//! with the service's error message and HTTP status. Transport problems are
//! returned as `AuthError` so each operation can pick its own generic message.

use crate::models::{AuthError, AuthResult};
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Which bearer token, if any, a request carries
#[derive(Debug, Clone, Copy)]
pub enum Credentials<'a> {
    Anonymous,
    /// The signed-in user's JWT
    User(&'a str),
    /// The configured admin API token
    ApiToken,
}

#[derive(Clone)]
pub struct StrapiClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl StrapiClient {
    /// Create a client for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the HTTP client cannot be built
    pub fn new(base_url: &str, api_token: Option<String>) -> Result<Self, AuthError> {
        Url::parse(base_url).map_err(|e| {
            AuthError::Configuration(format!("Invalid identity service URL '{base_url}': {e}"))
        })?;

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|token| !token.is_empty()),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn has_api_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Absolute URL for an API path such as `/api/users/me`
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or an unparsable success body
    pub async fn get(&self, path: &str, credentials: Credentials<'_>) -> Result<AuthResult, AuthError> {
        let url = self.url(path);
        let request = self.authorize(self.http.get(&url), credentials);
        Self::send(request, &url).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or an unparsable success body
    pub async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
        credentials: Credentials<'_>,
    ) -> Result<AuthResult, AuthError> {
        let url = self.url(path);
        let request = self.authorize(self.http.post(&url).json(body), credentials);
        Self::send(request, &url).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or an unparsable success body
    pub async fn put<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
        credentials: Credentials<'_>,
    ) -> Result<AuthResult, AuthError> {
        let url = self.url(path);
        let request = self.authorize(self.http.put(&url).json(body), credentials);
        Self::send(request, &url).await
    }

    fn authorize(&self, request: RequestBuilder, credentials: Credentials<'_>) -> RequestBuilder {
        match credentials {
            Credentials::Anonymous => request,
            Credentials::User(token) => request.bearer_auth(token),
            Credentials::ApiToken => match &self.api_token {
                Some(token) => request.bearer_auth(token),
                None => request,
            },
        }
    }

    async fn send(request: RequestBuilder, url: &str) -> Result<AuthResult, AuthError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(body) => body,
                Err(e) if status.is_success() => {
                    return Err(AuthError::InvalidResponse {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(_) => Value::Null,
            }
        };

        Ok(normalize_response(status, body, url))
    }
}

/// Map a status and parsed body onto the `AuthResult` envelope
#[must_use]
pub fn normalize_response(status: StatusCode, body: Value, url: &str) -> AuthResult {
    if status.is_success() {
        let mut result = AuthResult::success("", Some(body));
        result.code = status.as_u16();
        return result;
    }

    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });
    log::error!("[HTTP] {} {url}: {message}", status.as_u16());

    AuthResult::failure(message, status.as_u16())
}

/// Error text from a service error body
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` and
/// `{"message": ..}`.
#[must_use]
pub fn error_message(body: &Value) -> Option<String> {
    let nested = body.get("error").and_then(|error| match error {
        Value::String(message) => Some(message.as_str()),
        Value::Object(_) => error.get("message").and_then(Value::as_str),
        _ => None,
    });

    nested
        .or_else(|| body.get("message").and_then(Value::as_str))
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}
