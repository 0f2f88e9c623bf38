//! Session Management Module
//!
//! Signed-cookie sessions for the dashboard.
//!
//! # Modules
//!
//! - [`manager`] - Session store adapter over the signed cookie
//! - [`cookie`] - Cookie construction and lookup utilities

pub mod cookie;
pub mod manager;

// Re-export commonly used items for convenience
pub use cookie::{CookieFactory, CookieOptions, COOKIE_NAME};
pub use manager::{SessionManager, SessionRedirect};
