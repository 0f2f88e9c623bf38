//! Session Manager - Stateless Signed Session Handling
//!
//! `SessionManager` translates between the request `Cookie` header and a
//! `UserSession`, and between a session and the `Set-Cookie` header that
//! carries it back to the browser. There is no server-side session table;
//! everything lives in the HMAC-signed cookie.
//!
//! ## Organization
//!
//! 1. **Construction** - `SessionManager` creation
//! 2. **Session Extraction** - Reading and verifying sessions from requests
//! 3. **Session Creation** - Committing sessions after sign-in
//! 4. **Session Removal** - Clearing the cookie on sign-out
//! 5. **Tests**

use crate::models::UserSession;
use crate::session::cookie::{find_cookie_value, CookieFactory, COOKIE_NAME};
use crate::utils::responses::ResponseBuilder;
use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use anyhow::Result;

/// A committed session plus the location the caller should be sent to
#[derive(Debug, Clone)]
pub struct SessionRedirect {
    pub location: String,
    pub cookie: Cookie<'static>,
}

impl SessionRedirect {
    /// Value for the `Set-Cookie` response header
    #[must_use]
    pub fn set_cookie_header(&self) -> String {
        self.cookie.to_string()
    }

    /// Headers to attach to the response, as name/value pairs
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            (header::SET_COOKIE.as_str().to_string(), self.set_cookie_header()),
            (header::LOCATION.as_str().to_string(), self.location.clone()),
        ]
    }

    /// 302 response carrying the session cookie
    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        ResponseBuilder::redirect(&self.location)
            .with_cookie(self.cookie)
            .build()
    }
}

/// Session Manager for stateless signed session handling
#[derive(Clone)]
pub struct SessionManager {
    cookie_factory: CookieFactory,
}

// =============================================================================
// 1. Construction
// =============================================================================

impl SessionManager {
    #[must_use]
    pub fn new(secret: &[u8], cookie_secure: bool, session_duration_hours: u64) -> Self {
        Self {
            cookie_factory: CookieFactory::new(secret, cookie_secure, session_duration_hours),
        }
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_factory.cookie_secure()
    }
}

// =============================================================================
// 2. Session Extraction
// =============================================================================

impl SessionManager {
    /// Read the session from a raw `Cookie` header
    ///
    /// Fails open: a missing, malformed or forged cookie yields an empty
    /// session, indistinguishable from "not signed in".
    #[must_use]
    pub fn get_session(&self, cookie_header: Option<&str>) -> UserSession {
        let Some(value) = cookie_header.and_then(|header| find_cookie_value(header, COOKIE_NAME))
        else {
            return UserSession::new();
        };

        self.cookie_factory
            .read_session_value(value)
            .unwrap_or_else(|e| {
                log::debug!("Ignoring unreadable session cookie: {e}");
                UserSession::new()
            })
    }

    /// Read the session from an inbound request
    #[must_use]
    pub fn get_session_from_request(&self, req: &HttpRequest) -> UserSession {
        let cookie_header = req
            .headers()
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok());
        self.get_session(cookie_header)
    }
}

// =============================================================================
// 3. Session Creation
// =============================================================================

impl SessionManager {
    /// Sign a session into a fresh cookie
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails
    pub fn commit_session(&self, session: &UserSession) -> Result<Cookie<'static>> {
        self.cookie_factory.create_session_cookie(session)
    }

    /// Create a brand new session for a signed-in user
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails
    pub fn create_user_session(
        &self,
        user_id: u64,
        user_jwt: &str,
        redirect_to: &str,
    ) -> Result<SessionRedirect> {
        let session = UserSession::for_user(user_id, user_jwt);
        let cookie = self.commit_session(&session)?;
        log::debug!("Created session for user {user_id}");

        Ok(SessionRedirect {
            location: redirect_to.to_string(),
            cookie,
        })
    }
}

// =============================================================================
// 4. Session Removal
// =============================================================================

impl SessionManager {
    /// Expire the session cookie
    ///
    /// The session content is irrelevant: the signed cookie is the only copy.
    #[must_use]
    pub fn clear_session(&self, _session: &UserSession) -> Cookie<'static> {
        self.cookie_factory.create_expired_cookie()
    }
}

// =============================================================================
// 5. Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    fn manager() -> SessionManager {
        SessionManager::new(b"test_session_secret_for_manager", false, 24)
    }

    fn cookie_header(cookie: &Cookie<'_>) -> String {
        format!("{}={}", cookie.name(), cookie.value())
    }

    #[test]
    fn test_create_then_get_session() {
        let manager = manager();
        let redirect = manager.create_user_session(7, "T", "/dashboard").unwrap();

        let header = format!("theme=dark; {}", cookie_header(&redirect.cookie));
        let session = manager.get_session(Some(&header));

        assert_eq!(session.user_jwt(), Some("T"));
        assert_eq!(session.user_id(), Some(7));
        assert_eq!(redirect.location, "/dashboard");
    }

    #[test]
    fn test_get_session_fails_open() {
        let manager = manager();
        assert!(manager.get_session(None).is_empty());
        assert!(manager.get_session(Some("")).is_empty());
        assert!(manager
            .get_session(Some("web3insights_session=garbage"))
            .is_empty());

        let foreign = SessionManager::new(b"some_other_secret", false, 24)
            .create_user_session(1, "X", "/")
            .unwrap();
        assert!(manager
            .get_session(Some(&cookie_header(&foreign.cookie)))
            .is_empty());
    }

    #[test]
    fn test_get_session_from_request() {
        let manager = manager();
        let redirect = manager.create_user_session(42, "jwt-42", "/").unwrap();

        let req = TestRequest::default()
            .insert_header((header::COOKIE, cookie_header(&redirect.cookie)))
            .to_http_request();

        assert_eq!(manager.get_session_from_request(&req).user_id(), Some(42));
    }

    #[test]
    fn test_clear_session_expires_cookie() {
        let manager = manager();
        let cookie = manager.clear_session(&UserSession::for_user(7, "T"));
        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().unwrap().is_negative());
    }

    #[test]
    fn test_session_redirect_response() {
        let redirect = manager().create_user_session(7, "T", "/home").unwrap();
        let headers = redirect.headers();
        assert!(headers
            .iter()
            .any(|(name, value)| name == "set-cookie" && value.starts_with(COOKIE_NAME)));

        let response = redirect.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/home"
        );
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }
}
