//! Authentication flows
//!
//! [`AuthOrchestrator`] is the entry point. It delegates to a backend chosen at
//! construction: [`ServerAuthBackend`] in-process, or [`SelfApiAuthBackend`]
//! through this service's own HTTP API.

pub mod context;
pub mod factory;
pub mod orchestrator;
pub mod self_api;
pub mod server;
pub mod traits;

pub use context::{ExecutionContext, RequestContext};
pub use factory::{AuthenticationConfig, AuthenticationServiceFactory};
pub use orchestrator::AuthOrchestrator;
pub use self_api::SelfApiAuthBackend;
pub use server::ServerAuthBackend;
pub use traits::{AuthBackend, RemoteAuthService, UserManagementService};
