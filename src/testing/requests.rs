//! HTTP request builders for testing handlers

use crate::session::SessionManager;
use actix_web::body::to_bytes;
use actix_web::http::{header, Method};
use actix_web::test::TestRequest;
use actix_web::HttpResponse;
use serde_json::Value;

/// Builder for requests against the auth endpoints
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    raw_body: Option<String>,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: None,
            raw_body: None,
        }
    }

    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    #[must_use]
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Send a raw `Cookie` header
    #[must_use]
    pub fn with_cookie_header(self, cookies: &str) -> Self {
        self.header(header::COOKIE.as_str(), cookies)
    }

    /// Attach a freshly signed session for `user_id`
    ///
    /// # Panics
    ///
    /// Panics if the session cannot be signed
    #[must_use]
    pub fn with_session(self, manager: &SessionManager, user_id: u64, jwt: &str) -> Self {
        let cookie = session_cookie_header(manager, user_id, jwt);
        self.with_cookie_header(&cookie)
    }

    #[must_use]
    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send a body as-is, e.g. malformed JSON
    #[must_use]
    pub fn raw_body(mut self, body: &str) -> Self {
        self.raw_body = Some(body.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> TestRequest {
        let mut req = TestRequest::default().method(self.method).uri(&self.uri);

        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        if let Some(body) = self.body {
            req = req.set_json(body);
        } else if let Some(raw) = self.raw_body {
            req = req
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .set_payload(raw);
        }

        req
    }
}

/// `name=value` pair of a signed session cookie, ready for a `Cookie` header
///
/// # Panics
///
/// Panics if the session cannot be signed
#[must_use]
pub fn session_cookie_header(manager: &SessionManager, user_id: u64, jwt: &str) -> String {
    let redirect = manager.create_user_session(user_id, jwt, "/").unwrap();
    format!("{}={}", redirect.cookie.name(), redirect.cookie.value())
}

/// Turn a `Set-Cookie` value into the `Cookie` header a browser would send back
#[must_use]
pub fn cookie_header_from_set_cookie(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Read a response body as JSON
///
/// # Panics
///
/// Panics if the body cannot be read or is not JSON
pub async fn response_json(response: HttpResponse) -> Value {
    let bytes = to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
