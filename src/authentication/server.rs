//! In-process authentication backend
//!
//! Runs flows directly against the session store, the identity service and
//! the shared user cache.
//!
//! ## Organization
//!
//! 1. **Construction**
//! 2. **Session Flows** - sign-out and current-user lookups
//! 3. **GitHub Post-processing** - best-effort user management
//! 4. **Backend Implementation**
//! 5. **Tests**

use crate::authentication::context::{ExecutionContext, RequestContext};
use crate::authentication::traits::{AuthBackend, RemoteAuthService, UserManagementService};
use crate::cache::UserCache;
use crate::models::{
    AuthResult, AuthenticatedUser, AuthProvider, FlowOutcome, LoginCredentials, PasswordChange,
    PasswordReset, ProfileSync, Registration, SideEffect, StrapiAuthResponse,
};
use crate::session::SessionManager;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct ServerAuthBackend {
    session_manager: SessionManager,
    remote: Arc<dyn RemoteAuthService>,
    users: Arc<dyn UserManagementService>,
    cache: UserCache,
    default_role: String,
}

// =============================================================================
// 1. Construction
// =============================================================================

impl ServerAuthBackend {
    #[must_use]
    pub fn new(
        session_manager: SessionManager,
        remote: Arc<dyn RemoteAuthService>,
        users: Arc<dyn UserManagementService>,
        cache: UserCache,
        default_role: &str,
    ) -> Self {
        Self {
            session_manager,
            remote,
            users,
            cache,
            default_role: default_role.to_string(),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &UserCache {
        &self.cache
    }

    #[must_use]
    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }
}

// =============================================================================
// 2. Session Flows
// =============================================================================

fn authenticated_user_result(user: &AuthenticatedUser) -> AuthResult {
    let data = serde_json::to_value(user).unwrap_or(Value::Null);
    AuthResult::success("", Some(data)).with_extra("authenticated", true)
}

fn anonymous_result() -> AuthResult {
    AuthResult::not_authenticated().with_extra("authenticated", false)
}

impl ServerAuthBackend {
    async fn sign_out_request(&self, request: &RequestContext) -> AuthResult {
        let session = self.session_manager.get_session(request.cookie_header());

        if let Some(token) = session.user_jwt() {
            if self.cache.invalidate(token).await {
                log::debug!("Evicted cached user on sign-out");
            }
        }

        let cookie = self.session_manager.clear_session(&session);
        AuthResult::success("", Some(Value::String(cookie.to_string())))
    }

    async fn current_user(&self, request: &RequestContext) -> AuthResult {
        let session = self.session_manager.get_session(request.cookie_header());
        let Some(token) = session.user_jwt() else {
            return anonymous_result();
        };

        if let Some(user) = self.cache.get(token).await {
            log::debug!("User cache hit for user {}", user.id);
            return authenticated_user_result(&user);
        }
        log::debug!("User cache miss");

        let response = self.remote.get_current_user(token).await;
        if !response.success {
            return anonymous_result();
        }

        match response.data_as::<AuthenticatedUser>() {
            Some(user) if user.has_valid_id() => {
                self.cache.set(token, user.clone()).await;
                authenticated_user_result(&user)
            }
            _ => anonymous_result(),
        }
    }
}

// =============================================================================
// 3. GitHub Post-processing
// =============================================================================

impl ServerAuthBackend {
    /// Role, profile and duplicate-account steps after a GitHub sign-in
    ///
    /// Steps run in order and stop at the first failure, which is recorded on
    /// `outcome` instead of failing the sign-in.
    async fn process_github_user(&self, user: &AuthenticatedUser, outcome: &mut FlowOutcome) {
        if let Err(e) = self.users.ensure_user_role(user.id, &self.default_role).await {
            outcome.record_failure(SideEffect::EnsureUserRole, e.to_string());
            return;
        }

        if user.provider != AuthProvider::Github || !user.confirmed {
            let profile = ProfileSync {
                provider: AuthProvider::Github,
                confirmed: true,
                username: user.username.clone(),
                email: user.email.clone(),
            };
            if let Err(e) = self.users.sync_github_user_profile(user.id, &profile).await {
                outcome.record_failure(SideEffect::SyncGitHubProfile, e.to_string());
                return;
            }
        }

        if !user.email.is_empty() {
            match self.users.find_user_by_email(&user.email).await {
                Ok(Some(existing)) if existing.id != user.id => {
                    // Account linking is not implemented; only report the collision
                    log::info!(
                        "Found existing user with email {}, potential account linking needed",
                        user.email
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    outcome.record_failure(SideEffect::AccountLinkCheck, e.to_string());
                    return;
                }
            }
        }

        log::info!(
            "GitHub OAuth user {} ({}) successfully processed",
            user.username,
            user.email
        );
    }
}

// =============================================================================
// 4. Backend Implementation
// =============================================================================

#[async_trait]
impl AuthBackend for ServerAuthBackend {
    fn context(&self) -> ExecutionContext {
        ExecutionContext::Server
    }

    async fn sign_up(
        &self,
        registration: &Registration,
        requires_email_verification: bool,
    ) -> FlowOutcome {
        self.remote
            .register_user(registration, requires_email_verification)
            .await
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> AuthResult {
        self.remote.login_user(credentials).await
    }

    async fn sign_out(&self, request: &RequestContext) -> AuthResult {
        self.sign_out_request(request).await
    }

    async fn fetch_current_user(&self, request: &RequestContext) -> AuthResult {
        self.current_user(request).await
    }

    async fn change_password(&self, token: &str, change: &PasswordChange) -> AuthResult {
        self.remote.change_password(token, change).await
    }

    async fn send_password_reset_email(&self, email: &str) -> AuthResult {
        self.remote.send_password_reset_email(email).await
    }

    async fn reset_password(&self, reset: &PasswordReset) -> AuthResult {
        self.remote.reset_password(reset).await
    }

    async fn confirm_email(&self, confirmation: &str) -> AuthResult {
        self.remote.confirm_email(confirmation).await
    }

    async fn auth_with_github(&self, access_token: &str) -> FlowOutcome {
        let result = self.remote.auth_with_github_access_token(access_token).await;
        if !result.success {
            return FlowOutcome::new(result);
        }

        let mut outcome = FlowOutcome::new(result);
        match outcome.result.data_as::<StrapiAuthResponse>() {
            Some(auth) => self.process_github_user(&auth.user, &mut outcome).await,
            None => log::warn!("GitHub exchange answered without a user record; skipping user management"),
        }

        // Flushed after every accepted exchange, parsable or not
        self.cache.invalidate_all().await;
        outcome
    }
}

// =============================================================================
// 5. Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::TestFixtures;
    use crate::testing::mock::{MockRemoteAuthService, MockUserManagementService};

    struct Harness {
        backend: ServerAuthBackend,
        remote: Arc<MockRemoteAuthService>,
        users: Arc<MockUserManagementService>,
    }

    fn harness() -> Harness {
        let remote = Arc::new(MockRemoteAuthService::new());
        let users = Arc::new(MockUserManagementService::new());
        let backend = ServerAuthBackend::new(
            TestFixtures::session_manager(),
            remote.clone(),
            users.clone(),
            UserCache::new(),
            "authenticated",
        );
        Harness {
            backend,
            remote,
            users,
        }
    }

    fn signed_in_request(backend: &ServerAuthBackend, user_id: u64, jwt: &str) -> RequestContext {
        let redirect = backend
            .session_manager()
            .create_user_session(user_id, jwt, "/")
            .unwrap();
        let cookie = &redirect.cookie;
        RequestContext::new(Some(format!("{}={}", cookie.name(), cookie.value())))
    }

    #[tokio::test]
    async fn test_fetch_current_user_without_session() {
        let h = harness();
        let result = h.backend.fetch_current_user(&RequestContext::anonymous()).await;

        assert!(result.success);
        assert!(result.data.is_none());
        assert!(!result.extra_flag("authenticated"));
        assert_eq!(h.remote.current_user_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_current_user_caches_lookup() {
        let h = harness();
        h.remote
            .set_current_user_response(TestFixtures::current_user_result(7));
        let request = signed_in_request(&h.backend, 7, "T");

        let first = h.backend.fetch_current_user(&request).await;
        let second = h.backend.fetch_current_user(&request).await;

        assert_eq!(first.data.as_ref().unwrap()["id"], 7);
        assert!(first.extra_flag("authenticated"));
        assert_eq!(first, second);
        assert_eq!(h.remote.current_user_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_current_user_does_not_cache_invalid_id() {
        let h = harness();
        h.remote
            .set_current_user_response(TestFixtures::current_user_result(0));
        let request = signed_in_request(&h.backend, 7, "T");

        let result = h.backend.fetch_current_user(&request).await;
        assert!(result.success);
        assert!(result.data.is_none());
        assert!(h.backend.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_fetch_current_user_hides_upstream_failure() {
        let h = harness();
        h.remote
            .set_current_user_response(AuthResult::failure("Unauthorized", 401));
        let request = signed_in_request(&h.backend, 7, "T");

        let result = h.backend.fetch_current_user(&request).await;
        assert!(result.success);
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_evicts_cache_and_clears_cookie() {
        let h = harness();
        h.remote
            .set_current_user_response(TestFixtures::current_user_result(7));
        let request = signed_in_request(&h.backend, 7, "T");
        h.backend.fetch_current_user(&request).await;
        assert_eq!(h.backend.cache().len().await, 1);

        let result = h.backend.sign_out(&request).await;

        assert!(result.success);
        let set_cookie = result.data.unwrap();
        assert!(set_cookie.as_str().unwrap().starts_with("web3insights_session="));
        assert!(h.backend.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_github_flushes_cache_and_runs_side_effects() {
        let h = harness();
        h.backend
            .cache()
            .set("other-token", TestFixtures::user(3))
            .await;
        h.remote
            .set_github_response(TestFixtures::github_auth_result(11, "local", false));

        let outcome = h.backend.auth_with_github("gho_token").await;

        assert!(outcome.result.success);
        assert!(!outcome.has_side_effect_failures());
        assert!(h.backend.cache().is_empty().await);
        assert_eq!(h.users.ensure_role_calls(), 1);
        assert_eq!(h.users.sync_profile_calls(), 1);
        assert_eq!(h.users.find_by_email_calls(), 1);
    }

    #[tokio::test]
    async fn test_github_skips_profile_sync_for_confirmed_github_user() {
        let h = harness();
        h.remote
            .set_github_response(TestFixtures::github_auth_result(11, "github", true));

        h.backend.auth_with_github("gho_token").await;
        assert_eq!(h.users.sync_profile_calls(), 0);
    }

    #[tokio::test]
    async fn test_github_side_effect_failure_is_recorded() {
        let h = harness();
        h.users.fail_ensure_role();
        h.backend
            .cache()
            .set("other-token", TestFixtures::user(3))
            .await;
        h.remote
            .set_github_response(TestFixtures::github_auth_result(11, "local", false));

        let outcome = h.backend.auth_with_github("gho_token").await;

        assert!(outcome.result.success);
        assert_eq!(outcome.side_effect_failures.len(), 1);
        assert_eq!(
            outcome.side_effect_failures[0].effect,
            SideEffect::EnsureUserRole
        );
        assert_eq!(h.users.sync_profile_calls(), 0);
        assert!(h.backend.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_github_flushes_cache_without_user_record() {
        let h = harness();
        h.backend
            .cache()
            .set("other-token", TestFixtures::user(3))
            .await;
        h.remote.set_github_response(
            AuthResult::success("", Some(serde_json::json!({ "jwt": "T" })))
                .with_extra("authMethod", "github"),
        );

        let outcome = h.backend.auth_with_github("gho_token").await;

        assert!(outcome.result.success);
        assert!(h.backend.cache().is_empty().await);
        assert_eq!(h.users.ensure_role_calls(), 0);
    }

    #[tokio::test]
    async fn test_github_failure_keeps_cache() {
        let h = harness();
        h.backend
            .cache()
            .set("other-token", TestFixtures::user(3))
            .await;
        h.remote
            .set_github_response(AuthResult::failure("Invalid token", 400));

        let outcome = h.backend.auth_with_github("gho_token").await;
        assert!(!outcome.result.success);
        assert_eq!(h.backend.cache().len().await, 1);
        assert_eq!(h.users.ensure_role_calls(), 0);
    }
}
