//! User management through the identity service admin API
//!
//! These calls authenticate with the configured API token and back the
//! best-effort steps that follow a GitHub sign-in.

use crate::authentication::traits::UserManagementService;
use crate::models::{AuthError, AuthResult, AuthenticatedUser, ProfileSync, UserRole};
use crate::strapi::client::{Credentials, StrapiClient};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RolesResponse {
    roles: Vec<UserRole>,
}

/// Turn a failed `AuthResult` into an `AuthError`
fn ensure_success(result: AuthResult) -> Result<AuthResult, AuthError> {
    if result.success {
        Ok(result)
    } else {
        Err(AuthError::Upstream {
            code: result.code,
            message: result.message,
        })
    }
}

pub struct StrapiUserService {
    client: StrapiClient,
}

impl StrapiUserService {
    #[must_use]
    pub fn new(client: StrapiClient) -> Self {
        if !client.has_api_token() {
            log::warn!("⚠️  No identity service API token configured; user management calls are anonymous");
        }
        Self { client }
    }

    async fn get_user_with_role(&self, user_id: u64) -> Result<AuthenticatedUser, AuthError> {
        let path = format!("/api/users/{user_id}?populate=role");
        let result = ensure_success(self.client.get(&path, Credentials::ApiToken).await?)?;
        result
            .data_as::<AuthenticatedUser>()
            .ok_or_else(|| AuthError::InvalidResponse {
                url: self.client.url(&path),
                reason: "user record missing".to_string(),
            })
    }

    async fn find_role_by_type(&self, role_type: &str) -> Result<UserRole, AuthError> {
        let path = "/api/users-permissions/roles";
        let result = ensure_success(self.client.get(path, Credentials::ApiToken).await?)?;
        let roles = result
            .data_as::<RolesResponse>()
            .ok_or_else(|| AuthError::InvalidResponse {
                url: self.client.url(path),
                reason: "roles list missing".to_string(),
            })?;

        roles
            .roles
            .into_iter()
            .find(|role| role.role_type == role_type)
            .ok_or_else(|| AuthError::Upstream {
                code: 404,
                message: format!("Role '{role_type}' not found"),
            })
    }
}

#[async_trait]
impl UserManagementService for StrapiUserService {
    async fn ensure_user_role(&self, user_id: u64, role_type: &str) -> Result<(), AuthError> {
        let user = self.get_user_with_role(user_id).await?;
        if user
            .role
            .as_ref()
            .is_some_and(|role| role.role_type == role_type)
        {
            log::debug!("User {user_id} already has role '{role_type}'");
            return Ok(());
        }

        let role = self.find_role_by_type(role_type).await?;
        let path = format!("/api/users/{user_id}");
        ensure_success(
            self.client
                .put(&path, &serde_json::json!({ "role": role.id }), Credentials::ApiToken)
                .await?,
        )?;
        log::info!("Assigned role '{role_type}' to user {user_id}");
        Ok(())
    }

    async fn sync_github_user_profile(
        &self,
        user_id: u64,
        profile: &ProfileSync,
    ) -> Result<(), AuthError> {
        let path = format!("/api/users/{user_id}");
        ensure_success(self.client.put(&path, profile, Credentials::ApiToken).await?)?;
        log::debug!("Synced GitHub profile for user {user_id}");
        Ok(())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AuthenticatedUser>, AuthError> {
        let path = format!(
            "/api/users?filters[email][$eq]={}",
            urlencoding::encode(email)
        );
        let result = ensure_success(self.client.get(&path, Credentials::ApiToken).await?)?;
        let users = result
            .data_as::<Vec<AuthenticatedUser>>()
            .ok_or_else(|| AuthError::InvalidResponse {
                url: self.client.url(&path),
                reason: "user list missing".to_string(),
            })?;
        Ok(users.into_iter().next())
    }
}
