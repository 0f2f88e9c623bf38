#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use web3insights_auth::{
    authentication::{AuthOrchestrator, AuthenticationConfig, AuthenticationServiceFactory},
    cache::UserCache,
    handlers::{configure_auth_routes, configure_login, health, AUTH_SCOPE},
    session::SessionManager,
    settings::Web3InsightsSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = Web3InsightsSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let auth_config = AuthenticationConfig::from_settings(&settings);

    // One cache for the whole process, shared by every worker
    let orchestrator =
        AuthenticationServiceFactory::create_server_orchestrator(&auth_config, UserCache::new())
            .map_err(|e| {
                std::io::Error::other(format!("Failed to initialize authentication: {e}"))
            })?;
    let session_manager = AuthenticationServiceFactory::create_session_manager(&auth_config);

    start_server(settings, orchestrator, session_manager).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    settings: Web3InsightsSettings,
    orchestrator: AuthOrchestrator,
    session_manager: SessionManager,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept", "Cookie"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(orchestrator.clone()))
            .app_data(web::Data::new(session_manager.clone()))
            .app_data(web::Data::new(settings.clone()))
            .wrap(Logger::default())
            // Login answers its own preflight, so it stays outside the CORS scope
            .configure(configure_login)
            .service(
                web::scope(AUTH_SCOPE)
                    .wrap(cors)
                    .configure(configure_auth_routes),
            )
            .route("/ping", web::get().to(health))
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &Web3InsightsSettings) {
    println!(
        "Starting Web3Insights auth service v{} on http://{bind_address}",
        web3insights_auth::VERSION
    );
    println!("Environment: {}", settings.application.environment);
    println!();
    println!("Auth endpoints:");
    println!("  POST /api/auth/login              - Sign in (redirect or clientSide JSON)");
    println!("  POST /api/auth/logout             - Clear session");
    println!("  GET  /api/auth/me                 - Current user (cached 60s)");
    println!("  POST /api/auth/register           - Create account");
    println!("  POST /api/auth/forgot-password    - Send reset email");
    println!("  POST /api/auth/reset-password     - Reset with emailed code");
    println!("  POST /api/auth/change-password    - Change password (signed in)");
    println!("  GET  /api/auth/email-confirmation - Confirm email address");
    println!("  POST /api/auth/github             - Sign in with GitHub access token");
    println!("  GET  /api/auth/github/url         - GitHub OAuth start URL");
    println!();
    println!("Identity service: {}", settings.strapi.api_url);
    println!(
        "Email verification on sign-up: {}",
        settings.strapi.requires_email_verification
    );
    println!();
    println!("Health check:");
    println!("  GET  /ping");
}
