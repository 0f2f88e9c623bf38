//! Identity service integration

pub mod auth;
pub mod client;
pub mod users;

pub use auth::StrapiAuthService;
pub use client::{Credentials, StrapiClient};
pub use users::StrapiUserService;
