//! Request extractors for authentication and authorization.
//!
//! - [`auth::AuthUser`]: the account behind a Bearer access token.
//! - [`rbac::RequireAdmin`]: admissions staff only.

pub mod auth;
pub mod rbac;
