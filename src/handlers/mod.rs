// HTTP request handlers for the auth API
pub mod auth;
pub mod health;

use actix_web::http::Method;
use actix_web::web;

pub use auth::{
    change_password, confirm_email, current_user, forgot_password, github_auth, github_auth_url,
    login, login_method_not_allowed, login_preflight, logout, register, reset_password,
};
pub use health::health;

/// Path prefix of every auth endpoint
pub const AUTH_SCOPE: &str = "/api/auth";

/// `/api/auth/login`, which answers its own preflight requests
pub fn configure_login(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/auth/login")
            .route(web::post().to(login))
            .route(web::method(Method::OPTIONS).to(login_preflight))
            .default_service(web::route().to(login_method_not_allowed)),
    );
}

/// Every other auth endpoint, relative to [`AUTH_SCOPE`]
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/logout", web::post().to(logout))
        .route("/me", web::get().to(current_user))
        .route("/register", web::post().to(register))
        .route("/forgot-password", web::post().to(forgot_password))
        .route("/reset-password", web::post().to(reset_password))
        .route("/change-password", web::post().to(change_password))
        .route("/email-confirmation", web::get().to(confirm_email))
        .route("/github", web::post().to(github_auth))
        .route("/github/url", web::get().to(github_auth_url));
}

/// All routes without CORS, for tests and embedding
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    configure_login(cfg);
    cfg.service(web::scope(AUTH_SCOPE).configure(configure_auth_routes))
        .route("/ping", web::get().to(health));
}
