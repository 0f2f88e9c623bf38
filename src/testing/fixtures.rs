//! Test fixtures providing pre-built test objects

use crate::models::{
    AuthProvider, AuthResult, AuthenticatedUser, LoginCredentials, Registration,
};
use crate::session::SessionManager;
use crate::settings::{
    ApplicationSettings, CookieSettings, SessionSettings, StrapiSettings, Web3InsightsSettings,
};
use serde_json::{json, Map, Value};

use super::constants::{
    TEST_EMAIL, TEST_JWT, TEST_PASSWORD, TEST_SESSION_SECRET, TEST_STRAPI_URL,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// A confirmed local user with the given id
    #[must_use]
    pub fn user(id: u64) -> AuthenticatedUser {
        AuthenticatedUser {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            confirmed: true,
            blocked: false,
            provider: AuthProvider::Local,
            role: None,
            extra: Map::new(),
        }
    }

    fn user_json(id: u64, provider: &str, confirmed: bool) -> Value {
        json!({
            "id": id,
            "username": format!("user{id}"),
            "email": format!("user{id}@example.com"),
            "provider": provider,
            "confirmed": confirmed,
            "blocked": false
        })
    }

    /// What `/api/users/me` answers for user `id`
    ///
    /// An id of `0` produces a record the cache must refuse.
    #[must_use]
    pub fn current_user_result(id: u64) -> AuthResult {
        AuthResult::success("", Some(Self::user_json(id, "local", true)))
    }

    /// A successful local login carrying `jwt` and the user
    #[must_use]
    pub fn login_result(jwt: &str, id: u64, confirmed: bool) -> AuthResult {
        AuthResult::success(
            "Login successful",
            Some(json!({
                "jwt": jwt,
                "user": Self::user_json(id, "local", confirmed)
            })),
        )
    }

    /// A successful GitHub token exchange for a user stored with `provider`
    #[must_use]
    pub fn github_auth_result(id: u64, provider: &str, confirmed: bool) -> AuthResult {
        AuthResult::success(
            "",
            Some(json!({
                "jwt": TEST_JWT,
                "user": Self::user_json(id, provider, confirmed)
            })),
        )
        .with_extra("authMethod", "github")
    }

    /// A sign-up form that passes validation
    #[must_use]
    pub fn registration() -> Registration {
        Registration {
            username: "alice".to_string(),
            email: TEST_EMAIL.to_string(),
            password: TEST_PASSWORD.to_string(),
            password_confirm: TEST_PASSWORD.to_string(),
        }
    }

    #[must_use]
    pub fn credentials() -> LoginCredentials {
        LoginCredentials {
            identifier: TEST_EMAIL.to_string(),
            password: TEST_PASSWORD.to_string(),
        }
    }

    /// Session manager with the shared test secret and insecure cookies
    #[must_use]
    pub fn session_manager() -> SessionManager {
        SessionManager::new(TEST_SESSION_SECRET, false, 168)
    }

    /// Settings pointing at a local identity service
    #[must_use]
    pub fn settings() -> Web3InsightsSettings {
        Self::settings_for(TEST_STRAPI_URL)
    }

    /// Settings pointing at the given identity service, e.g. a `MockServer`
    #[must_use]
    pub fn settings_for(strapi_url: &str) -> Web3InsightsSettings {
        Web3InsightsSettings {
            application: ApplicationSettings {
                cors_origins: "http://localhost:3000".to_string(),
                ..ApplicationSettings::default()
            },
            session: SessionSettings {
                session_secret: String::from_utf8_lossy(TEST_SESSION_SECRET).into_owned(),
                session_duration_hours: 168,
            },
            cookies: CookieSettings {
                secure: Some(false),
            },
            strapi: StrapiSettings {
                api_url: strapi_url.to_string(),
                api_token: Some("admin-token".to_string()),
                ..StrapiSettings::default()
            },
            ..Web3InsightsSettings::default()
        }
    }
}
