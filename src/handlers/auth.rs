// Auth API handlers: login, logout, registration, password and GitHub flows
use crate::authentication::{AuthOrchestrator, RequestContext};
use crate::models::{
    AuthResult, LoginCredentials, PasswordChange, PasswordReset, Registration, StrapiAuthResponse,
};
use crate::session::SessionManager;
use crate::settings::Web3InsightsSettings;
use crate::utils::redirect_validator::{redirect_target_or_default, DEFAULT_REDIRECT};
use crate::utils::responses::ResponseBuilder;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const INVALID_BODY: &str = "Invalid request body";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub redirect_to: Option<String>,
    #[serde(default)]
    pub client_side: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(flatten)]
    pub registration: Registration,
    #[serde(default)]
    pub requires_email_verification: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationQuery {
    #[serde(default)]
    pub confirmation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubAuthRequest {
    #[serde(default)]
    pub access_token: String,
}

fn parse_body<T: DeserializeOwned>(body: &web::Bytes) -> Option<T> {
    serde_json::from_slice(body)
        .map_err(|e| debug!("Rejected request body: {e}"))
        .ok()
}

fn auth_response(result: &AuthResult) -> HttpResponse {
    ResponseBuilder::auth_result(result).json(result)
}

fn invalid_body() -> HttpResponse {
    auth_response(&AuthResult::validation_failure(INVALID_BODY))
}

/// JWT of the signed-in user, falling back to an `Authorization: Bearer` header
fn request_token(req: &HttpRequest, session_manager: &SessionManager) -> Option<String> {
    let session = session_manager.get_session_from_request(req);
    if let Some(token) = session.user_jwt() {
        return Some(token.to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

/// Log in and start a session
///
/// Browsers get a 302 to the validated `redirectTo`; `clientSide` callers get
/// the JSON result. Both carry the session cookie. Failures answer
/// `{"error": message}`.
///
/// # Errors
///
/// Never fails; every outcome is encoded in the response
pub async fn login(
    body: web::Bytes,
    orchestrator: web::Data<AuthOrchestrator>,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    let Some(request) = parse_body::<LoginRequest>(&body) else {
        return Ok(ResponseBuilder::error_message(400, INVALID_BODY));
    };

    let credentials = LoginCredentials {
        identifier: request.identifier,
        password: request.password,
    };
    let result = orchestrator.sign_in(&credentials).await;
    if !result.success {
        return Ok(ResponseBuilder::error_message(result.code, &result.message));
    }

    let Some(auth) = result.data_as::<StrapiAuthResponse>() else {
        error!("Login succeeded without a session payload");
        return Ok(ResponseBuilder::error_message(500, "Login failed"));
    };

    let target = redirect_target_or_default(request.redirect_to.as_deref());
    match session_manager.create_user_session(auth.user.id, &auth.jwt, &target) {
        Ok(redirect) => {
            info!("User {} signed in", auth.user.id);
            if request.client_side {
                Ok(ResponseBuilder::auth_result(&result)
                    .with_cookie(redirect.cookie)
                    .json(&result))
            } else {
                Ok(redirect.into_response())
            }
        }
        Err(e) => {
            error!("Failed to create session for user {}: {e}", auth.user.id);
            Ok(ResponseBuilder::error_message(
                500,
                "An error occurred during login",
            ))
        }
    }
}

/// CORS preflight for cross-origin login forms
pub async fn login_preflight() -> Result<HttpResponse> {
    Ok(ResponseBuilder::ok()
        .with_header(header::ACCESS_CONTROL_ALLOW_ORIGIN.as_str(), "*")
        .with_header(
            header::ACCESS_CONTROL_ALLOW_METHODS.as_str(),
            "POST, OPTIONS",
        )
        .with_header(header::ACCESS_CONTROL_ALLOW_HEADERS.as_str(), "Content-Type")
        .finish())
}

pub async fn login_method_not_allowed() -> Result<HttpResponse> {
    Ok(ResponseBuilder::method_not_allowed())
}

/// Sign out; the response expires the session cookie
///
/// # Errors
///
/// Never fails
pub async fn logout(
    req: HttpRequest,
    orchestrator: web::Data<AuthOrchestrator>,
) -> Result<HttpResponse> {
    let result = orchestrator
        .sign_out(&RequestContext::from_request(&req))
        .await;

    let mut response = ResponseBuilder::auth_result(&result);
    if let Some(set_cookie) = result.data.as_ref().and_then(Value::as_str) {
        response = response.with_header(header::SET_COOKIE.as_str(), set_cookie);
    }
    Ok(response.json(&result))
}

pub async fn current_user(
    req: HttpRequest,
    orchestrator: web::Data<AuthOrchestrator>,
) -> Result<HttpResponse> {
    let result = orchestrator
        .fetch_current_user(&RequestContext::from_request(&req))
        .await;
    Ok(auth_response(&result))
}

/// Register; `requiresEmailVerification` defaults to the configured value
///
/// # Errors
///
/// Never fails
pub async fn register(
    body: web::Bytes,
    orchestrator: web::Data<AuthOrchestrator>,
    settings: web::Data<Web3InsightsSettings>,
) -> Result<HttpResponse> {
    let Some(request) = parse_body::<RegisterRequest>(&body) else {
        return Ok(invalid_body());
    };
    let requires_email_verification = request
        .requires_email_verification
        .unwrap_or(settings.strapi.requires_email_verification);

    let result = orchestrator
        .sign_up(&request.registration, requires_email_verification)
        .await;
    Ok(auth_response(&result))
}

pub async fn forgot_password(
    body: web::Bytes,
    orchestrator: web::Data<AuthOrchestrator>,
) -> Result<HttpResponse> {
    let Some(request) = parse_body::<ForgotPasswordRequest>(&body) else {
        return Ok(invalid_body());
    };
    let result = orchestrator.send_password_reset_email(&request.email).await;
    Ok(auth_response(&result))
}

/// # Errors
///
/// Never fails
pub async fn reset_password(
    body: web::Bytes,
    orchestrator: web::Data<AuthOrchestrator>,
) -> Result<HttpResponse> {
    let Some(reset) = parse_body::<PasswordReset>(&body) else {
        return Ok(invalid_body());
    };
    let result = orchestrator.reset_password(&reset).await;
    Ok(auth_response(&result))
}

/// Change the signed-in user's password
///
/// # Errors
///
/// Never fails
pub async fn change_password(
    req: HttpRequest,
    body: web::Bytes,
    orchestrator: web::Data<AuthOrchestrator>,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    let Some(change) = parse_body::<PasswordChange>(&body) else {
        return Ok(invalid_body());
    };
    let token = request_token(&req, &session_manager);
    let result = orchestrator
        .change_password(token.as_deref(), &change)
        .await;
    Ok(auth_response(&result))
}

/// # Errors
///
/// Never fails
pub async fn confirm_email(
    query: web::Query<ConfirmationQuery>,
    orchestrator: web::Data<AuthOrchestrator>,
) -> Result<HttpResponse> {
    let result = orchestrator.confirm_email(&query.confirmation).await;
    Ok(auth_response(&result))
}

/// Sign in with a GitHub access token; success also starts a session
///
/// # Errors
///
/// Never fails
pub async fn github_auth(
    body: web::Bytes,
    orchestrator: web::Data<AuthOrchestrator>,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    let Some(request) = parse_body::<GitHubAuthRequest>(&body) else {
        return Ok(invalid_body());
    };

    let result = orchestrator.auth_with_github(&request.access_token).await;
    let mut response = ResponseBuilder::auth_result(&result);

    if result.success {
        if let Some(auth) = result.data_as::<StrapiAuthResponse>() {
            match session_manager.create_user_session(auth.user.id, &auth.jwt, DEFAULT_REDIRECT) {
                Ok(redirect) => {
                    info!("GitHub user {} signed in", auth.user.id);
                    response = response.with_cookie(redirect.cookie);
                }
                Err(e) => {
                    error!("Failed to create session for GitHub user {}: {e}", auth.user.id);
                    return Ok(auth_response(&AuthResult::failure(
                        "An error occurred during GitHub authentication",
                        500,
                    )));
                }
            }
        }
    }

    Ok(response.json(&result))
}

pub async fn github_auth_url(orchestrator: web::Data<AuthOrchestrator>) -> Result<HttpResponse> {
    Ok(ResponseBuilder::ok().json(&json!({ "url": orchestrator.get_github_auth_url() })))
}
