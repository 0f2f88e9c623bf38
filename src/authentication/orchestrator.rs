//! Auth Orchestrator
//!
//! The single entry point for authentication flows. It owns the business
//! rules (validation, the sign-in terminal check, GitHub result shaping and
//! side-effect reporting) and hands execution to whichever [`AuthBackend`] it
//! was built with. No operation returns an error: every path ends in an
//! `AuthResult`.

use crate::authentication::context::{ExecutionContext, RequestContext};
use crate::authentication::traits::AuthBackend;
use crate::models::auth::STATUS_INTERNAL_ERROR;
use crate::models::{
    AuthResult, AuthenticatedUser, FlowOutcome, LoginCredentials, PasswordChange, PasswordReset,
    Registration, StrapiAuthResponse,
};
use crate::validation::{
    validate_change_password, validate_confirm_email, validate_github_token,
    validate_password_reset_email, validate_reset_password, validate_sign_in, validate_sign_up,
};
use std::sync::Arc;

pub const GITHUB_SUCCESS_MESSAGE: &str = "GitHub authentication successful";

#[derive(Clone)]
pub struct AuthOrchestrator {
    backend: Arc<dyn AuthBackend>,
    github_auth_url: String,
}

impl AuthOrchestrator {
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, github_auth_url: &str) -> Self {
        Self {
            backend,
            github_auth_url: github_auth_url.to_string(),
        }
    }

    #[must_use]
    pub fn context(&self) -> ExecutionContext {
        self.backend.context()
    }

    /// Log side-effect failures and keep the primary result
    fn settle(&self, operation: &str, outcome: FlowOutcome) -> AuthResult {
        for failure in &outcome.side_effect_failures {
            log::warn!(
                "⚠️  {operation} ({}): {} failed: {}",
                self.context(),
                failure.effect,
                failure.message
            );
        }
        outcome.result
    }

    pub async fn sign_up(
        &self,
        registration: &Registration,
        requires_email_verification: bool,
    ) -> AuthResult {
        if let Err(e) = validate_sign_up(registration) {
            return e.into();
        }
        let outcome = self
            .backend
            .sign_up(registration, requires_email_verification)
            .await;
        self.settle("Registration", outcome)
    }

    /// Log in; a success must carry both a JWT and a user
    pub async fn sign_in(&self, credentials: &LoginCredentials) -> AuthResult {
        if let Err(e) = validate_sign_in(credentials) {
            return e.into();
        }

        let result = self.backend.sign_in(credentials).await;
        if !result.success {
            return result;
        }

        match result.data_as::<StrapiAuthResponse>() {
            Some(auth) if !auth.jwt.is_empty() => result,
            _ => {
                log::error!("Login response without jwt and user");
                AuthResult::failure("Login failed", STATUS_INTERNAL_ERROR)
            }
        }
    }

    /// Clear the session; `data` carries the `Set-Cookie` value that does it
    pub async fn sign_out(&self, request: &RequestContext) -> AuthResult {
        self.backend.sign_out(request).await
    }

    /// Current user for the request's session, `data: null` when signed out
    pub async fn fetch_current_user(&self, request: &RequestContext) -> AuthResult {
        self.backend.fetch_current_user(request).await
    }

    /// Typed shortcut over [`Self::fetch_current_user`] for route gating
    pub async fn get_user(&self, request: &RequestContext) -> Option<AuthenticatedUser> {
        self.fetch_current_user(request)
            .await
            .data_as::<AuthenticatedUser>()
    }

    pub async fn change_password(
        &self,
        token: Option<&str>,
        change: &PasswordChange,
    ) -> AuthResult {
        if let Err(e) = validate_change_password(token, change) {
            return e.into();
        }
        let token = token.unwrap_or_default();
        self.backend.change_password(token, change).await
    }

    pub async fn send_password_reset_email(&self, email: &str) -> AuthResult {
        if let Err(e) = validate_password_reset_email(email) {
            return e.into();
        }
        let result = self.backend.send_password_reset_email(email).await;
        let sent = result.success;
        result.with_extra("resetSuccess", sent)
    }

    pub async fn reset_password(&self, reset: &PasswordReset) -> AuthResult {
        if let Err(e) = validate_reset_password(reset) {
            return e.into();
        }
        self.backend.reset_password(reset).await
    }

    pub async fn confirm_email(&self, confirmation: &str) -> AuthResult {
        if let Err(e) = validate_confirm_email(confirmation) {
            return e.into();
        }
        self.backend.confirm_email(confirmation).await
    }

    /// Exchange a GitHub access token and shape the result
    ///
    /// User-management failures along the way are logged and never fail the
    /// sign-in.
    pub async fn auth_with_github(&self, access_token: &str) -> AuthResult {
        if let Err(e) = validate_github_token(access_token) {
            return e.into();
        }

        let outcome = self.backend.auth_with_github(access_token).await;
        let result = self.settle("GitHub authentication", outcome);
        if !result.success {
            return result;
        }
        if result.data.is_none() {
            return AuthResult::failure(
                "Invalid GitHub authentication response",
                STATUS_INTERNAL_ERROR,
            );
        }

        let is_new_github_user = result
            .extra
            .get("authMethod")
            .and_then(serde_json::Value::as_str)
            == Some("github");
        result
            .with_message(GITHUB_SUCCESS_MESSAGE)
            .with_extra("isNewGitHubUser", is_new_github_user)
    }

    /// Browser-facing URL that starts the GitHub OAuth dance
    #[must_use]
    pub fn get_github_auth_url(&self) -> &str {
        &self.github_auth_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::server::ServerAuthBackend;
    use crate::cache::UserCache;
    use crate::models::SideEffect;
    use crate::testing::fixtures::TestFixtures;
    use crate::testing::mock::{MockRemoteAuthService, MockUserManagementService};
    use serde_json::json;

    const GITHUB_URL: &str = "https://cms.example.com/api/connect/github";

    struct Harness {
        orchestrator: AuthOrchestrator,
        backend: Arc<ServerAuthBackend>,
        remote: Arc<MockRemoteAuthService>,
        users: Arc<MockUserManagementService>,
    }

    fn harness() -> Harness {
        let remote = Arc::new(MockRemoteAuthService::new());
        let users = Arc::new(MockUserManagementService::new());
        let backend = Arc::new(ServerAuthBackend::new(
            TestFixtures::session_manager(),
            remote.clone(),
            users.clone(),
            UserCache::new(),
            "authenticated",
        ));
        Harness {
            orchestrator: AuthOrchestrator::new(backend.clone(), GITHUB_URL),
            backend,
            remote,
            users,
        }
    }

    fn session_request(h: &Harness, user_id: u64, jwt: &str) -> RequestContext {
        let redirect = h
            .backend
            .session_manager()
            .create_user_session(user_id, jwt, "/")
            .unwrap();
        RequestContext::new(Some(format!(
            "{}={}",
            redirect.cookie.name(),
            redirect.cookie.value()
        )))
    }

    fn change(current: &str) -> PasswordChange {
        PasswordChange {
            current_password: current.to_string(),
            password: "newpass1".to_string(),
            password_confirmation: "newpass1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_validation_never_reaches_network() {
        let h = harness();
        let invalid = [
            ("", "a@b.com", "secret1", "secret1"),
            ("bob", "a@b.com", "secret1", "secret2"),
            ("bo", "a@b.com", "secret1", "secret1"),
            ("bob", "a@b.com", "short", "short"),
        ];

        for (username, email, password, confirm) in invalid {
            let registration = Registration {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                password_confirm: confirm.to_string(),
            };
            let result = h.orchestrator.sign_up(&registration, true).await;
            assert!(!result.success);
            assert_eq!(result.code, 400);
        }
        assert_eq!(h.remote.register_calls(), 0);

        let result = h
            .orchestrator
            .sign_up(&TestFixtures::registration(), true)
            .await;
        assert!(result.success);
        assert_eq!(h.remote.register_calls(), 1);
    }

    #[tokio::test]
    async fn test_sign_up_side_effect_failure_keeps_success() {
        let h = harness();
        let mut outcome = FlowOutcome::new(AuthResult::success("Registered", None));
        outcome.record_failure(SideEffect::ConfirmationEmail, "smtp down");
        h.remote.set_register_outcome(outcome);

        let result = h
            .orchestrator
            .sign_up(&TestFixtures::registration(), true)
            .await;
        assert!(result.success);
        assert_eq!(result.message, "Registered");
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let h = harness();
        h.remote
            .set_login_response(TestFixtures::login_result("T", 7, true));

        let result = h.orchestrator.sign_in(&TestFixtures::credentials()).await;

        assert!(result.success);
        assert_eq!(result.data.unwrap()["user"]["id"], 7);
        assert_eq!(h.remote.login_calls(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_missing_fields() {
        let h = harness();
        let credentials = LoginCredentials {
            identifier: "a@b.com".to_string(),
            password: String::new(),
        };
        let result = h.orchestrator.sign_in(&credentials).await;
        assert_eq!(result.code, 400);
        assert_eq!(result.message, "Email/username and password are required");
        assert_eq!(h.remote.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_success_without_session_payload() {
        let h = harness();
        h.remote
            .set_login_response(AuthResult::success("", Some(json!({"ok": true}))));

        let result = h.orchestrator.sign_in(&TestFixtures::credentials()).await;
        assert!(!result.success);
        assert_eq!(result.code, 500);
        assert_eq!(result.message, "Login failed");
    }

    #[tokio::test]
    async fn test_sign_in_passes_failure_through() {
        let h = harness();
        h.remote
            .set_login_response(AuthResult::failure("Invalid identifier or password", 400));

        let result = h.orchestrator.sign_in(&TestFixtures::credentials()).await;
        assert_eq!(result.message, "Invalid identifier or password");
        assert_eq!(result.code, 400);
    }

    #[tokio::test]
    async fn test_sign_out_then_fetch_is_anonymous_without_network() {
        let h = harness();
        h.remote
            .set_current_user_response(TestFixtures::current_user_result(7));
        let request = session_request(&h, 7, "T");

        assert!(h.orchestrator.get_user(&request).await.is_some());
        assert_eq!(h.remote.current_user_calls(), 1);

        let signed_out = h.orchestrator.sign_out(&request).await;
        let set_cookie = signed_out.data.unwrap();
        let cleared = set_cookie.as_str().unwrap().split(';').next().unwrap();
        let cleared_request = RequestContext::new(Some(cleared.to_string()));

        let result = h.orchestrator.fetch_current_user(&cleared_request).await;
        assert!(result.success);
        assert!(result.data.is_none());
        assert_eq!(h.remote.current_user_calls(), 1);
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let h = harness();
        let result = h.orchestrator.change_password(Some("T"), &change("")).await;

        assert_eq!(result.code, 400);
        assert_eq!(result.message, "Current password is required");
        assert_eq!(h.remote.change_password_calls(), 0);
    }

    #[tokio::test]
    async fn test_change_password_requires_token() {
        let h = harness();
        let result = h
            .orchestrator
            .change_password(None, &change("oldpass1"))
            .await;
        assert_eq!(result.code, 401);
        assert_eq!(h.remote.change_password_calls(), 0);

        let result = h
            .orchestrator
            .change_password(Some("T"), &change("oldpass1"))
            .await;
        assert!(result.success);
        assert_eq!(h.remote.change_password_calls(), 1);
    }

    #[tokio::test]
    async fn test_password_reset_email_sets_flag() {
        let h = harness();
        let result = h.orchestrator.send_password_reset_email("a@b.com").await;
        assert!(result.extra_flag("resetSuccess"));

        h.remote
            .set_default_response(AuthResult::failure("Failed to send password reset email", 400));
        let result = h.orchestrator.send_password_reset_email("a@b.com").await;
        assert!(!result.extra_flag("resetSuccess"));

        let result = h.orchestrator.send_password_reset_email("").await;
        assert_eq!(result.message, "Email is required");
    }

    #[tokio::test]
    async fn test_github_success_flushes_every_cached_token() {
        let h = harness();
        h.backend.cache().set("unrelated", TestFixtures::user(3)).await;
        h.backend.cache().set("another", TestFixtures::user(4)).await;
        h.remote
            .set_github_response(TestFixtures::github_auth_result(11, "github", true));

        let result = h.orchestrator.auth_with_github("gho_token").await;

        assert!(result.success);
        assert_eq!(result.message, GITHUB_SUCCESS_MESSAGE);
        assert!(result.extra_flag("isNewGitHubUser"));
        assert!(h.backend.cache().get("unrelated").await.is_none());
        assert!(h.backend.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_github_user_management_failure_does_not_fail_sign_in() {
        let h = harness();
        h.users.fail_ensure_role();
        h.remote
            .set_github_response(TestFixtures::github_auth_result(11, "local", false));

        let result = h.orchestrator.auth_with_github("gho_token").await;
        assert!(result.success);
        assert_eq!(result.message, GITHUB_SUCCESS_MESSAGE);
    }

    #[tokio::test]
    async fn test_github_success_without_data() {
        let h = harness();
        h.remote
            .set_github_response(AuthResult::success("", None));

        let result = h.orchestrator.auth_with_github("gho_token").await;
        assert!(!result.success);
        assert_eq!(result.message, "Invalid GitHub authentication response");
    }

    #[tokio::test]
    async fn test_github_requires_token() {
        let h = harness();
        let result = h.orchestrator.auth_with_github("").await;
        assert_eq!(result.message, "GitHub access token is required");
        assert_eq!(h.remote.github_calls(), 0);
    }

    #[test]
    fn test_github_auth_url_and_context() {
        let h = harness();
        assert_eq!(h.orchestrator.get_github_auth_url(), GITHUB_URL);
        assert_eq!(h.orchestrator.context(), ExecutionContext::Server);
    }
}
