//! Remote auth client backed by the Strapi users-permissions API

use crate::authentication::traits::RemoteAuthService;
use crate::models::{
    AuthError, AuthResult, AuthenticatedUser, FlowOutcome, LoginCredentials, PasswordChange, PasswordReset,
    Registration, SideEffect, StrapiAuthResponse,
};
use crate::strapi::client::{Credentials, StrapiClient};
use async_trait::async_trait;
use serde_json::json;

pub const UNCONFIRMED_LOGIN_MESSAGE: &str =
    "Please verify your email address to access all features.";
pub const REGISTRATION_SUCCESS_MESSAGE: &str =
    "Registration successful. Please check your email to verify your account.";

const PASSWORD_RESET_EMAIL_SENT: &str = "Password reset email sent successfully";
const PASSWORD_RESET_DONE: &str = "Password has been reset successfully. You can now login.";
const EMAIL_CONFIRMED: &str = "Email confirmed successfully. You can now login.";
const PASSWORD_CHANGED: &str = "Password changed successfully";

/// Overlay a fixed message on success, or keep the service's message on failure
fn overlay_message(mut result: AuthResult, success_message: &str, failure_fallback: &str) -> AuthResult {
    if result.success {
        result.message = success_message.to_string();
    } else if result.message.is_empty() {
        result.message = failure_fallback.to_string();
    }
    result
}

/// Convert a transport-level error into the generic failure for an operation
fn generic_failure(operation: &str, error: &AuthError, message: &str) -> AuthResult {
    log::error!("Identity service {operation} failed: {error}");
    AuthResult::failure(message, crate::models::auth::STATUS_INTERNAL_ERROR)
}

pub struct StrapiAuthService {
    client: StrapiClient,
}

impl StrapiAuthService {
    #[must_use]
    pub fn new(client: StrapiClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &StrapiClient {
        &self.client
    }
}

#[async_trait]
impl RemoteAuthService for StrapiAuthService {
    async fn login_user(&self, credentials: &LoginCredentials) -> AuthResult {
        let body = json!({
            "identifier": credentials.identifier,
            "password": credentials.password,
        });
        match self
            .client
            .post("/api/auth/local", &body, Credentials::Anonymous)
            .await
        {
            Ok(result) if result.success => {
                let unconfirmed = result
                    .data_as::<StrapiAuthResponse>()
                    .is_some_and(|auth| !auth.user.confirmed);
                if unconfirmed {
                    result.with_message(UNCONFIRMED_LOGIN_MESSAGE)
                } else {
                    result
                }
            }
            Ok(result) => result,
            Err(e) => generic_failure("login", &e, "An error occurred during login"),
        }
    }

    async fn register_user(
        &self,
        registration: &Registration,
        requires_email_verification: bool,
    ) -> FlowOutcome {
        let body = json!({
            "username": registration.username,
            "email": registration.email,
            "password": registration.password,
        });
        let result = match self
            .client
            .post("/api/auth/local/register", &body, Credentials::Anonymous)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                return generic_failure("registration", &e, "An error occurred during registration")
                    .into();
            }
        };
        if !result.success {
            return result.into();
        }

        let mut outcome = FlowOutcome::new(
            result
                .clone()
                .with_message(REGISTRATION_SUCCESS_MESSAGE)
                .with_extra("requiresEmailVerification", requires_email_verification),
        );

        // With email confirmation on, the service answers without a jwt
        let unconfirmed = result
            .data
            .as_ref()
            .and_then(|data| data.get("user"))
            .and_then(|user| serde_json::from_value::<AuthenticatedUser>(user.clone()).ok())
            .is_some_and(|user| !user.confirmed);
        if requires_email_verification && unconfirmed {
            let confirmation = self.send_confirmation_email(&registration.email).await;
            if !confirmation.success {
                outcome.record_failure(SideEffect::ConfirmationEmail, confirmation.message);
            }
        }

        outcome
    }

    async fn send_confirmation_email(&self, email: &str) -> AuthResult {
        match self
            .client
            .post(
                "/api/auth/send-email-confirmation",
                &json!({ "email": email }),
                Credentials::Anonymous,
            )
            .await
        {
            Ok(result) => result,
            Err(e) => generic_failure(
                "confirmation email",
                &e,
                "Error occurred while sending confirmation mail",
            ),
        }
    }

    async fn send_password_reset_email(&self, email: &str) -> AuthResult {
        match self
            .client
            .post(
                "/api/auth/forgot-password",
                &json!({ "email": email }),
                Credentials::Anonymous,
            )
            .await
        {
            Ok(result) => overlay_message(
                result,
                PASSWORD_RESET_EMAIL_SENT,
                "Failed to send password reset email",
            ),
            Err(e) => generic_failure(
                "forgot password",
                &e,
                "An error occurred while sending the password reset email",
            ),
        }
    }

    async fn reset_password(&self, reset: &PasswordReset) -> AuthResult {
        match self
            .client
            .post("/api/auth/reset-password", reset, Credentials::Anonymous)
            .await
        {
            Ok(result) => overlay_message(result, PASSWORD_RESET_DONE, "Failed to reset password"),
            Err(e) => generic_failure(
                "reset password",
                &e,
                "An error occurred while resetting your password",
            ),
        }
    }

    async fn confirm_email(&self, confirmation: &str) -> AuthResult {
        let path = format!(
            "/api/auth/email-confirmation?confirmation={}",
            urlencoding::encode(confirmation)
        );
        match self.client.get(&path, Credentials::Anonymous).await {
            Ok(result) => overlay_message(result, EMAIL_CONFIRMED, "Failed to confirm email"),
            Err(e) => generic_failure(
                "email confirmation",
                &e,
                "An error occurred while confirming your email",
            ),
        }
    }

    async fn change_password(&self, token: &str, change: &PasswordChange) -> AuthResult {
        match self
            .client
            .post("/api/auth/change-password", change, Credentials::User(token))
            .await
        {
            Ok(result) => overlay_message(result, PASSWORD_CHANGED, "Failed to change password"),
            Err(e) => generic_failure(
                "change password",
                &e,
                "An error occurred while changing your password",
            ),
        }
    }

    async fn get_current_user(&self, token: &str) -> AuthResult {
        match self
            .client
            .get("/api/users/me", Credentials::User(token))
            .await
        {
            Ok(result) => result,
            Err(e) => generic_failure(
                "current user",
                &e,
                "An error occurred while fetching the current user",
            ),
        }
    }

    async fn auth_with_github_access_token(&self, access_token: &str) -> AuthResult {
        let path = format!(
            "/api/auth/github/callback?access_token={}",
            urlencoding::encode(access_token)
        );
        match self.client.get(&path, Credentials::Anonymous).await {
            Ok(result) if result.success => result.with_extra("authMethod", "github"),
            Ok(result) => result,
            Err(e) => generic_failure(
                "GitHub exchange",
                &e,
                "An error occurred during GitHub authentication",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> StrapiAuthService {
        StrapiAuthService::new(StrapiClient::new(&server.uri(), None).unwrap())
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials {
            identifier: "a@b.com".to_string(),
            password: "secret1".to_string(),
        }
    }

    fn registration() -> Registration {
        Registration {
            username: "alice".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
            password_confirm: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_confirmed_user_keeps_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local"))
            .and(body_json(json!({"identifier": "a@b.com", "password": "secret1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "T",
                "user": {"id": 7, "username": "alice", "email": "a@b.com", "confirmed": true}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = service(&server).login_user(&credentials()).await;
        assert!(result.success);
        assert_eq!(result.message, "");
        assert_eq!(result.data.unwrap()["user"]["id"], 7);
    }

    #[tokio::test]
    async fn test_login_unconfirmed_user_overrides_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "T",
                "user": {"id": 7, "username": "alice", "email": "a@b.com", "confirmed": false}
            })))
            .mount(&server)
            .await;

        let result = service(&server).login_user(&credentials()).await;
        assert!(result.success);
        assert_eq!(result.message, UNCONFIRMED_LOGIN_MESSAGE);
        assert_eq!(result.data.unwrap()["jwt"], "T");
    }

    #[tokio::test]
    async fn test_login_transport_failure_is_generic() {
        let service =
            StrapiAuthService::new(StrapiClient::new("http://127.0.0.1:1", None).unwrap());
        let result = service.login_user(&credentials()).await;
        assert!(!result.success);
        assert_eq!(result.code, 500);
        assert_eq!(result.message, "An error occurred during login");
    }

    #[tokio::test]
    async fn test_register_sends_confirmation_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local/register"))
            .and(body_json(json!({"username": "alice", "email": "a@b.com", "password": "secret1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": 9, "username": "alice", "email": "a@b.com", "confirmed": false}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/send-email-confirmation"))
            .and(body_json(json!({"email": "a@b.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.com", "sent": true})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = service(&server).register_user(&registration(), true).await;
        assert!(outcome.result.success);
        assert_eq!(outcome.result.message, REGISTRATION_SUCCESS_MESSAGE);
        assert!(outcome.result.extra_flag("requiresEmailVerification"));
        assert!(!outcome.has_side_effect_failures());
    }

    #[tokio::test]
    async fn test_register_survives_confirmation_email_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": 9, "username": "alice", "email": "a@b.com", "confirmed": false}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/send-email-confirmation"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"status": 500, "message": "Email provider unavailable"}
            })))
            .mount(&server)
            .await;

        let outcome = service(&server).register_user(&registration(), true).await;
        assert!(outcome.result.success);
        assert_eq!(outcome.side_effect_failures.len(), 1);
        assert_eq!(
            outcome.side_effect_failures[0].effect,
            SideEffect::ConfirmationEmail
        );
    }

    #[tokio::test]
    async fn test_register_without_verification_skips_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "T",
                "user": {"id": 9, "username": "alice", "email": "a@b.com", "confirmed": false}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/send-email-confirmation"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = service(&server).register_user(&registration(), false).await;
        assert!(outcome.result.success);
        assert_eq!(
            outcome.result.extra.get("requiresEmailVerification"),
            Some(&Value::Bool(false))
        );
    }

    #[tokio::test]
    async fn test_register_rejection_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"status": 400, "message": "Email or Username are already taken"}
            })))
            .mount(&server)
            .await;

        let outcome = service(&server).register_user(&registration(), true).await;
        assert!(!outcome.result.success);
        assert_eq!(outcome.result.code, 400);
        assert_eq!(outcome.result.message, "Email or Username are already taken");
    }

    #[tokio::test]
    async fn test_change_password_uses_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/change-password"))
            .and(header("Authorization", "Bearer T"))
            .and(body_json(json!({
                "currentPassword": "secret1",
                "password": "secret2",
                "passwordConfirmation": "secret2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "T2"})))
            .expect(1)
            .mount(&server)
            .await;

        let change = PasswordChange {
            current_password: "secret1".to_string(),
            password: "secret2".to_string(),
            password_confirmation: "secret2".to_string(),
        };
        let result = service(&server).change_password("T", &change).await;
        assert!(result.success);
        assert_eq!(result.message, "Password changed successfully");
    }

    #[tokio::test]
    async fn test_forgot_password_failure_fallback_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": {}})))
            .mount(&server)
            .await;

        let result = service(&server)
            .send_password_reset_email("a@b.com")
            .await;
        assert!(!result.success);
        assert_eq!(result.message, "Bad Request");
    }

    #[tokio::test]
    async fn test_confirm_email_encodes_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/email-confirmation"))
            .and(query_param("confirmation", "abc 123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let result = service(&server).confirm_email("abc 123").await;
        assert!(result.success);
        assert_eq!(result.message, "Email confirmed successfully. You can now login.");
    }

    #[tokio::test]
    async fn test_github_exchange_marks_auth_method() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/github/callback"))
            .and(query_param("access_token", "gho_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "G",
                "user": {"id": 11, "username": "octo", "email": "o@c.to", "provider": "github", "confirmed": true}
            })))
            .mount(&server)
            .await;

        let result = service(&server)
            .auth_with_github_access_token("gho_123")
            .await;
        assert!(result.success);
        assert_eq!(result.extra["authMethod"], "github");
    }
}
