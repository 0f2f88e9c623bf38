use actix_web::http::header;
use actix_web::HttpRequest;
use std::fmt;

/// Where an orchestrated flow executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// In-process, with direct access to the session store and identity service
    Server,
    /// Remote caller going through this server's HTTP API
    Client,
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Server => f.write_str("server"),
            ExecutionContext::Client => f.write_str("client"),
        }
    }
}

/// The parts of an inbound request a flow may need
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    cookie_header: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new(cookie_header: Option<String>) -> Self {
        Self { cookie_header }
    }

    /// A request without any cookies
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_request(req: &HttpRequest) -> Self {
        let cookie_header = req
            .headers()
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        Self { cookie_header }
    }

    #[must_use]
    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }
}
