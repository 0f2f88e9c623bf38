//! Authentication service traits
//!
//! The orchestrator only ever talks to an [`AuthBackend`]; which one it gets
//! decides whether a flow runs in-process against the session store and the
//! identity service, or through this server's own HTTP API.

use crate::authentication::context::{ExecutionContext, RequestContext};
use crate::models::{
    AuthError, AuthResult, AuthenticatedUser, FlowOutcome, LoginCredentials, PasswordChange,
    PasswordReset, ProfileSync, Registration,
};
use async_trait::async_trait;

/// Stateless client for the identity service
///
/// Implementations never cache, never touch the session, and never return an
/// error: transport failures become a generic failed `AuthResult`.
#[async_trait]
pub trait RemoteAuthService: Send + Sync {
    /// Log in with identifier (email or username) and password
    async fn login_user(&self, credentials: &LoginCredentials) -> AuthResult;

    /// Register a local account, sending a confirmation email when required
    ///
    /// A failed confirmation email is reported as a side-effect failure and
    /// does not fail the registration.
    async fn register_user(
        &self,
        registration: &Registration,
        requires_email_verification: bool,
    ) -> FlowOutcome;

    async fn send_confirmation_email(&self, email: &str) -> AuthResult;

    async fn send_password_reset_email(&self, email: &str) -> AuthResult;

    async fn reset_password(&self, reset: &PasswordReset) -> AuthResult;

    async fn confirm_email(&self, confirmation: &str) -> AuthResult;

    async fn change_password(&self, token: &str, change: &PasswordChange) -> AuthResult;

    /// Resolve a JWT to the user it belongs to
    async fn get_current_user(&self, token: &str) -> AuthResult;

    /// Exchange a GitHub access token for an identity service session
    async fn auth_with_github_access_token(&self, access_token: &str) -> AuthResult;
}

/// Admin-level user management used after a GitHub sign-in
#[async_trait]
pub trait UserManagementService: Send + Sync {
    /// Make sure `user_id` has the role whose type is `role_type`
    ///
    /// # Errors
    ///
    /// Returns an error if the user or role cannot be read or updated
    async fn ensure_user_role(&self, user_id: u64, role_type: &str) -> Result<(), AuthError>;

    /// Write provider, confirmation and profile fields onto the user
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected
    async fn sync_github_user_profile(
        &self,
        user_id: u64,
        profile: &ProfileSync,
    ) -> Result<(), AuthError>;

    /// Look a user up by email address
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails
    async fn find_user_by_email(&self, email: &str)
        -> Result<Option<AuthenticatedUser>, AuthError>;
}

/// Execution strategy behind the orchestrator
///
/// Inputs arrive already validated; backends only carry out the flow.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    fn context(&self) -> ExecutionContext;

    async fn sign_up(
        &self,
        registration: &Registration,
        requires_email_verification: bool,
    ) -> FlowOutcome;

    async fn sign_in(&self, credentials: &LoginCredentials) -> AuthResult;

    async fn sign_out(&self, request: &RequestContext) -> AuthResult;

    async fn fetch_current_user(&self, request: &RequestContext) -> AuthResult;

    async fn change_password(&self, token: &str, change: &PasswordChange) -> AuthResult;

    async fn send_password_reset_email(&self, email: &str) -> AuthResult;

    async fn reset_password(&self, reset: &PasswordReset) -> AuthResult;

    async fn confirm_email(&self, confirmation: &str) -> AuthResult;

    async fn auth_with_github(&self, access_token: &str) -> FlowOutcome;
}
