//! Response builders shared by the auth handlers
//!
//! Two body shapes leave this service: the serialized `AuthResult`, whose HTTP
//! status follows its `code`, and the login endpoint's `{"error": message}`.

use crate::models::AuthResult;
use actix_web::http::StatusCode;
use actix_web::{cookie::Cookie, http::header, HttpResponse};
use serde_json::json;

const METHOD_NOT_ALLOWED_BODY: &str = r#"{"error":"Method not allowed"}"#;

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// 405 with `{"error": "Method not allowed"}`
    #[must_use]
    pub fn method_not_allowed() -> HttpResponse {
        HttpResponse::MethodNotAllowed()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(METHOD_NOT_ALLOWED_BODY)
    }

    /// Login-style error: `{"error": message}` with the given status
    ///
    /// Codes that are not 4xx/5xx fall back to 500.
    #[must_use]
    pub fn error_message(status: u16, message: &str) -> HttpResponse {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(json!({ "error": message }))
    }

    /// 302 to `location`, carrying any session cookies
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder {
            location: location.to_string(),
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn ok() -> JsonResponseBuilder {
        JsonResponseBuilder::new(StatusCode::OK)
    }

    /// Serialize an `AuthResult` with the HTTP status taken from its `code`
    #[must_use]
    pub fn auth_result(result: &AuthResult) -> JsonResponseBuilder {
        let status = StatusCode::from_u16(result.code).unwrap_or(if result.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        });
        JsonResponseBuilder::new(status)
    }
}

pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
}

impl RedirectBuilder {
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder
            .append_header((header::LOCATION, self.location))
            .finish()
    }
}

pub struct JsonResponseBuilder {
    status_code: StatusCode,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
}

impl JsonResponseBuilder {
    fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    fn builder(self) -> actix_web::HttpResponseBuilder {
        let mut builder = HttpResponse::build(self.status_code);
        for (name, value) in self.headers {
            builder.insert_header((name, value));
        }
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder
    }

    #[must_use]
    pub fn json<T: serde::Serialize>(self, data: &T) -> HttpResponse {
        self.builder().json(data)
    }

    /// Build the response without a body
    #[must_use]
    pub fn finish(self) -> HttpResponse {
        self.builder().finish()
    }
}
