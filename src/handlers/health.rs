use crate::models::HealthResponse;
use actix_web::{HttpResponse, Result};

/// # Errors
///
/// Never fails; the `Result` keeps the signature uniform with other handlers
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Web3Insights auth service is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
