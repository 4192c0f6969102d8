//! Domain model structs and DTOs.
//!
//! Each submodule holds a `FromRow` entity matching one table plus the DTOs
//! its repository accepts.

pub mod applicant;
pub mod application;
pub mod draft_entry;
pub mod role;
pub mod session;
pub mod user;
