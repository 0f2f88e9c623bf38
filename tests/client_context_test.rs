// Client-context flows: the self-API orchestrator talking to a live instance of the handlers
use actix_web::{web, App, HttpServer};
use serde_json::json;
use web3insights_auth::authentication::self_api::SET_COOKIE_EXTRA;
use web3insights_auth::authentication::{
    AuthOrchestrator, AuthenticationConfig, AuthenticationServiceFactory, ExecutionContext,
    RequestContext,
};
use web3insights_auth::cache::UserCache;
use web3insights_auth::handlers::configure_services;
use web3insights_auth::models::LoginCredentials;
use web3insights_auth::testing::fixtures::TestFixtures;
use web3insights_auth::testing::requests::cookie_header_from_set_cookie;
use wiremock::matchers::{header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Deployment {
    server: AuthOrchestrator,
    client: AuthOrchestrator,
}

/// Serve the auth API on an ephemeral port and build both orchestrators
async fn deploy(strapi: &MockServer, cache: &UserCache) -> Deployment {
    let settings = TestFixtures::settings_for(&strapi.uri());
    let mut config = AuthenticationConfig::from_settings(&settings);
    let server = AuthenticationServiceFactory::create_server_orchestrator(&config, cache.clone())
        .unwrap();
    let session_manager = AuthenticationServiceFactory::create_session_manager(&config);

    let orchestrator_data = web::Data::new(server.clone());
    let session_data = web::Data::new(session_manager);
    let settings_data = web::Data::new(settings);
    let http = HttpServer::new(move || {
        App::new()
            .app_data(orchestrator_data.clone())
            .app_data(session_data.clone())
            .app_data(settings_data.clone())
            .configure(configure_services)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let address = http.addrs()[0];
    actix_web::rt::spawn(http.run());

    config.public_base_url = format!("http://{address}");
    let client = AuthenticationServiceFactory::create_client_orchestrator(&config).unwrap();

    Deployment { server, client }
}

fn credentials(password: &str) -> LoginCredentials {
    LoginCredentials {
        identifier: "user7@example.com".to_string(),
        password: password.to_string(),
    }
}

#[actix_web::test]
async fn test_client_sign_in_failure_matches_server() {
    let strapi = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/local"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "data": null,
            "error": { "status": 400, "name": "ValidationError", "message": "Invalid identifier or password" }
        })))
        .mount(&strapi)
        .await;

    let deployment = deploy(&strapi, &UserCache::new()).await;
    assert_eq!(deployment.client.context(), ExecutionContext::Client);

    let server_result = deployment.server.sign_in(&credentials("wrong-pass")).await;
    let client_result = deployment.client.sign_in(&credentials("wrong-pass")).await;

    assert!(!client_result.success);
    assert_eq!(client_result.code, 400);
    assert_eq!(client_result.message, "Invalid identifier or password");
    assert_eq!(client_result.code, server_result.code);
    assert_eq!(client_result.message, server_result.message);
}

#[actix_web::test]
async fn test_client_sign_in_hands_back_session() {
    let strapi = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/local"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jwt": "strapi-jwt",
            "user": {
                "id": 7,
                "username": "user7",
                "email": "user7@example.com",
                "provider": "local",
                "confirmed": true
            }
        })))
        .expect(1)
        .mount(&strapi)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header_matcher("authorization", "Bearer strapi-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "username": "user7",
            "email": "user7@example.com",
            "provider": "local",
            "confirmed": true
        })))
        .expect(1)
        .mount(&strapi)
        .await;

    let cache = UserCache::new();
    let deployment = deploy(&strapi, &cache).await;

    let result = deployment.client.sign_in(&credentials("secret123")).await;
    assert!(result.success);
    assert_eq!(result.data.as_ref().unwrap()["user"]["id"], 7);

    let set_cookie = result.extra[SET_COOKIE_EXTRA].as_str().unwrap();
    assert!(set_cookie.starts_with("web3insights_session="));

    let request = RequestContext::new(Some(cookie_header_from_set_cookie(set_cookie)));
    let current = deployment.client.fetch_current_user(&request).await;
    assert_eq!(current.data.as_ref().unwrap()["id"], 7);
    assert!(current.extra_flag("authenticated"));

    let signed_out = deployment.client.sign_out(&request).await;
    assert!(signed_out.success);
    assert!(cache.is_empty().await);
}
