//! Mock objects and fake implementations for testing
//!
//! Both mocks count their calls so tests can prove that a flow never reached
//! the network.

use crate::authentication::traits::{RemoteAuthService, UserManagementService};
use crate::models::{
    AuthError, AuthResult, AuthenticatedUser, FlowOutcome, LoginCredentials, PasswordChange,
    PasswordReset, ProfileSync, Registration,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::constants::TEST_JWT;
use super::fixtures::TestFixtures;

/// In-memory identity service
///
/// Each operation answers with a configurable canned result.
pub struct MockRemoteAuthService {
    login_response: Mutex<AuthResult>,
    register_outcome: Mutex<FlowOutcome>,
    current_user_response: Mutex<AuthResult>,
    github_response: Mutex<AuthResult>,
    default_response: Mutex<AuthResult>,
    last_email_verification: Mutex<Option<bool>>,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    current_user_calls: AtomicUsize,
    change_password_calls: AtomicUsize,
    github_calls: AtomicUsize,
}

impl Default for MockRemoteAuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteAuthService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            login_response: Mutex::new(TestFixtures::login_result(TEST_JWT, 1, true)),
            register_outcome: Mutex::new(FlowOutcome::new(AuthResult::success(
                "Registration successful",
                None,
            ))),
            current_user_response: Mutex::new(AuthResult::failure("Unauthorized", 401)),
            github_response: Mutex::new(TestFixtures::github_auth_result(1, "github", true)),
            default_response: Mutex::new(AuthResult::success("ok", None)),
            last_email_verification: Mutex::new(None),
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            current_user_calls: AtomicUsize::new(0),
            change_password_calls: AtomicUsize::new(0),
            github_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_login_response(&self, result: AuthResult) {
        *self.login_response.lock().unwrap() = result;
    }

    pub fn set_register_outcome(&self, outcome: FlowOutcome) {
        *self.register_outcome.lock().unwrap() = outcome;
    }

    pub fn set_current_user_response(&self, result: AuthResult) {
        *self.current_user_response.lock().unwrap() = result;
    }

    pub fn set_github_response(&self, result: AuthResult) {
        *self.github_response.lock().unwrap() = result;
    }

    /// Answer for the email, password and confirmation operations
    pub fn set_default_response(&self, result: AuthResult) {
        *self.default_response.lock().unwrap() = result;
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn current_user_calls(&self) -> usize {
        self.current_user_calls.load(Ordering::SeqCst)
    }

    pub fn change_password_calls(&self) -> usize {
        self.change_password_calls.load(Ordering::SeqCst)
    }

    pub fn github_calls(&self) -> usize {
        self.github_calls.load(Ordering::SeqCst)
    }

    /// Email-verification flag of the most recent registration
    pub fn last_email_verification(&self) -> Option<bool> {
        *self.last_email_verification.lock().unwrap()
    }

    fn default_response(&self) -> AuthResult {
        self.default_response.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteAuthService for MockRemoteAuthService {
    async fn login_user(&self, _credentials: &LoginCredentials) -> AuthResult {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_response.lock().unwrap().clone()
    }

    async fn register_user(
        &self,
        _registration: &Registration,
        requires_email_verification: bool,
    ) -> FlowOutcome {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_email_verification.lock().unwrap() = Some(requires_email_verification);
        self.register_outcome.lock().unwrap().clone()
    }

    async fn send_confirmation_email(&self, _email: &str) -> AuthResult {
        self.default_response()
    }

    async fn send_password_reset_email(&self, _email: &str) -> AuthResult {
        self.default_response()
    }

    async fn reset_password(&self, _reset: &PasswordReset) -> AuthResult {
        self.default_response()
    }

    async fn confirm_email(&self, _confirmation: &str) -> AuthResult {
        self.default_response()
    }

    async fn change_password(&self, _token: &str, _change: &PasswordChange) -> AuthResult {
        self.change_password_calls.fetch_add(1, Ordering::SeqCst);
        self.default_response()
    }

    async fn get_current_user(&self, _token: &str) -> AuthResult {
        self.current_user_calls.fetch_add(1, Ordering::SeqCst);
        self.current_user_response.lock().unwrap().clone()
    }

    async fn auth_with_github_access_token(&self, _access_token: &str) -> AuthResult {
        self.github_calls.fetch_add(1, Ordering::SeqCst);
        self.github_response.lock().unwrap().clone()
    }
}

/// In-memory user management
///
/// Succeeds by default; individual steps can be switched to fail.
pub struct MockUserManagementService {
    fail_ensure_role: AtomicBool,
    fail_sync_profile: AtomicBool,
    existing_user: Mutex<Option<AuthenticatedUser>>,
    ensure_role_calls: AtomicUsize,
    sync_profile_calls: AtomicUsize,
    find_by_email_calls: AtomicUsize,
}

impl Default for MockUserManagementService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUserManagementService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fail_ensure_role: AtomicBool::new(false),
            fail_sync_profile: AtomicBool::new(false),
            existing_user: Mutex::new(None),
            ensure_role_calls: AtomicUsize::new(0),
            sync_profile_calls: AtomicUsize::new(0),
            find_by_email_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_ensure_role(&self) {
        self.fail_ensure_role.store(true, Ordering::SeqCst);
    }

    pub fn fail_sync_profile(&self) {
        self.fail_sync_profile.store(true, Ordering::SeqCst);
    }

    /// User returned by every email lookup
    pub fn set_existing_user(&self, user: AuthenticatedUser) {
        *self.existing_user.lock().unwrap() = Some(user);
    }

    pub fn ensure_role_calls(&self) -> usize {
        self.ensure_role_calls.load(Ordering::SeqCst)
    }

    pub fn sync_profile_calls(&self) -> usize {
        self.sync_profile_calls.load(Ordering::SeqCst)
    }

    pub fn find_by_email_calls(&self) -> usize {
        self.find_by_email_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserManagementService for MockUserManagementService {
    async fn ensure_user_role(&self, user_id: u64, role_type: &str) -> Result<(), AuthError> {
        self.ensure_role_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ensure_role.load(Ordering::SeqCst) {
            return Err(AuthError::Upstream {
                code: 404,
                message: format!("Role '{role_type}' not found for user {user_id}"),
            });
        }
        Ok(())
    }

    async fn sync_github_user_profile(
        &self,
        _user_id: u64,
        _profile: &ProfileSync,
    ) -> Result<(), AuthError> {
        self.sync_profile_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync_profile.load(Ordering::SeqCst) {
            return Err(AuthError::Upstream {
                code: 403,
                message: "Forbidden".to_string(),
            });
        }
        Ok(())
    }

    async fn find_user_by_email(
        &self,
        _email: &str,
    ) -> Result<Option<AuthenticatedUser>, AuthError> {
        self.find_by_email_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.existing_user.lock().unwrap().clone())
    }
}
