use actix_web::cookie::{time::Duration, Cookie, SameSite};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserSession;
use crate::utils::crypto::{generate_nonce, sign_data, verify_signed_data};

/// Name of the signed session cookie
pub const COOKIE_NAME: &str = "web3insights_session";

/// Random bytes mixed into every signed session value
const SESSION_NONCE_BYTES: usize = 16;

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: Duration::hours(24),
        }
    }
}

/// What actually gets signed into the cookie value
///
/// `issued_at` and `nonce` make every committed value distinct even when the
/// session content is identical.
#[derive(Debug, Serialize, Deserialize)]
struct SignedSession {
    data: UserSession,
    issued_at: DateTime<Utc>,
    nonce: String,
}

/// Cookie factory for creating signed cookies with proper configuration
///
/// This factory centralizes all cookie creation logic for the session cookie.
#[derive(Clone)]
pub struct CookieFactory {
    signing_key: Vec<u8>,
    cookie_secure: bool,
    session_duration_hours: u64,
}

impl CookieFactory {
    /// Create a new cookie factory with the specified configuration
    #[must_use]
    pub fn new(signing_key: &[u8], cookie_secure: bool, session_duration_hours: u64) -> Self {
        Self {
            signing_key: signing_key.to_vec(),
            cookie_secure,
            session_duration_hours,
        }
    }

    /// Generic method to create a cookie carrying signed data
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails
    pub fn create_cookie<T: Serialize>(
        &self,
        name: &str,
        data: Option<&T>,
        options: CookieOptions,
    ) -> Result<Cookie<'static>> {
        let value = match data {
            Some(data) => sign_data(data, &self.signing_key)?,
            None => String::new(),
        };

        Ok(Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish())
    }

    /// Create a signed session cookie from `UserSession`
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails
    pub fn create_session_cookie(&self, session: &UserSession) -> Result<Cookie<'static>> {
        let signed = SignedSession {
            data: session.clone(),
            issued_at: Utc::now(),
            nonce: generate_nonce(SESSION_NONCE_BYTES),
        };

        self.create_cookie(
            COOKIE_NAME,
            Some(&signed),
            CookieOptions {
                max_age: Duration::hours(i64::try_from(self.session_duration_hours).unwrap_or(24)),
                ..Default::default()
            },
        )
    }

    /// Verify a session cookie value and return its session
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty, unsigned, or signed with another key
    pub fn read_session_value(&self, value: &str) -> Result<UserSession> {
        if value.is_empty() {
            return Err(anyhow!("Session cookie is empty"));
        }
        let signed: SignedSession = verify_signed_data(value, &self.signing_key)?;
        Ok(signed.data)
    }

    /// Create an expired cookie to clear the session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(COOKIE_NAME, self.cookie_secure)
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(-1))
        .finish()
}

/// Find a cookie value in a raw `Cookie` request header
#[must_use]
pub fn find_cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|cookie| {
        let (cookie_name, value) = cookie.trim().split_once('=')?;
        (cookie_name.trim() == name).then(|| value.trim())
    })
}
