//! Service factory for creating configured authentication services
//!
//! Wires the session store, identity service clients and user cache into an
//! [`AuthOrchestrator`] for either execution context.

use crate::authentication::orchestrator::AuthOrchestrator;
use crate::authentication::self_api::SelfApiAuthBackend;
use crate::authentication::server::ServerAuthBackend;
use crate::cache::UserCache;
use crate::models::AuthError;
use crate::session::SessionManager;
use crate::settings::Web3InsightsSettings;
use crate::strapi::{StrapiAuthService, StrapiClient, StrapiUserService};
use std::sync::Arc;

/// Configuration for creating authentication services
#[derive(Debug, Clone)]
pub struct AuthenticationConfig {
    pub signing_key: Vec<u8>,
    pub cookie_secure: bool,
    pub session_duration_hours: u64,
    pub strapi_api_url: String,
    pub strapi_api_token: Option<String>,
    pub default_role: String,
    pub public_base_url: String,
    pub github_auth_url: String,
}

impl AuthenticationConfig {
    #[must_use]
    pub fn from_settings(settings: &Web3InsightsSettings) -> Self {
        Self {
            signing_key: settings.session.session_secret.as_bytes().to_vec(),
            cookie_secure: settings.cookie_secure(),
            session_duration_hours: settings.session.session_duration_hours,
            strapi_api_url: settings.strapi.api_url.clone(),
            strapi_api_token: settings.strapi.api_token.clone(),
            default_role: settings.strapi.default_role.clone(),
            public_base_url: settings.application.public_base_url.clone(),
            github_auth_url: settings.github_auth_url(),
        }
    }
}

/// Factory for creating authentication services with dependency injection
pub struct AuthenticationServiceFactory;

impl AuthenticationServiceFactory {
    #[must_use]
    pub fn create_session_manager(config: &AuthenticationConfig) -> SessionManager {
        SessionManager::new(
            &config.signing_key,
            config.cookie_secure,
            config.session_duration_hours,
        )
    }

    /// Orchestrator that runs flows in-process
    ///
    /// `cache` is shared with every other orchestrator built from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity service URL is invalid or an HTTP client cannot be built
    pub fn create_server_orchestrator(
        config: &AuthenticationConfig,
        cache: UserCache,
    ) -> Result<AuthOrchestrator, AuthError> {
        log::info!("🏭 Starting authentication service factory...");

        let client = StrapiClient::new(&config.strapi_api_url, config.strapi_api_token.clone())?;
        log::info!("✅ Identity service client configured");
        log::info!("   └─ {}", client.base_url());

        let users = Arc::new(StrapiUserService::new(client.clone()));
        if client.has_api_token() {
            log::info!("✅ User management configured with API token");
        }
        let remote = Arc::new(StrapiAuthService::new(client));

        let backend = ServerAuthBackend::new(
            Self::create_session_manager(config),
            remote,
            users,
            cache,
            &config.default_role,
        );
        log::info!(
            "✅ User cache configured (ttl {}s)",
            backend.cache().ttl().as_secs()
        );

        log::info!("🏭 Authentication service factory completed successfully");
        Ok(AuthOrchestrator::new(
            Arc::new(backend),
            &config.github_auth_url,
        ))
    }

    /// Orchestrator that runs flows through this service's own HTTP API
    ///
    /// # Errors
    ///
    /// Returns an error if the public base URL is invalid or the HTTP client cannot be built
    pub fn create_client_orchestrator(
        config: &AuthenticationConfig,
    ) -> Result<AuthOrchestrator, AuthError> {
        let backend = SelfApiAuthBackend::new(&config.public_base_url)?;
        log::info!("✅ Self-API authentication configured");
        log::info!("   └─ {}", backend.base_url());

        Ok(AuthOrchestrator::new(
            Arc::new(backend),
            &config.github_auth_url,
        ))
    }
}
