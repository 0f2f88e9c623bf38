//! Shared testing utilities
//!
//! Available to unit tests and, through the `testing` feature, to the
//! integration tests under `tests/`.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (users, auth results, settings)
//! - [`mock`] - In-memory identity service and user management with call counters
//! - [`requests`] - Request builders and response helpers for handler tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use web3insights_auth::testing::{fixtures::TestFixtures, mock::MockRemoteAuthService};
//!
//! let remote = Arc::new(MockRemoteAuthService::new());
//! remote.set_current_user_response(TestFixtures::current_user_result(7));
//! ```

pub mod fixtures;
pub mod mock;
pub mod requests;

pub use fixtures::TestFixtures;
pub use mock::{MockRemoteAuthService, MockUserManagementService};
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    /// Session signing secret shared by every test session manager
    pub const TEST_SESSION_SECRET: &[u8] = b"test_key_32_bytes_long_for_test_";

    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Default test password, long enough to pass form validation
    pub const TEST_PASSWORD: &str = "secret123";

    /// JWT handed out by the mock identity service
    pub const TEST_JWT: &str = "test-user-jwt";

    /// Local identity service address used by test settings
    pub const TEST_STRAPI_URL: &str = "http://localhost:1337";
}
