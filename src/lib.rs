#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the web3insights-auth service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod cache;
pub mod handlers;
pub mod models;
pub mod session;
pub mod settings;
pub mod strapi;
pub mod utils;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::{AuthOrchestrator, AuthenticationConfig, AuthenticationServiceFactory};
pub use cache::UserCache;
pub use handlers::{configure_services, health};
pub use models::{AuthResult, AuthenticatedUser, UserSession};
pub use session::SessionManager;
pub use settings::Web3InsightsSettings;
