//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Inserts that take part in
//! a transaction accept any `PgExecutor`.

pub mod applicant_repo;
pub mod application_repo;
pub mod draft_store_repo;
pub mod role_repo;
pub mod session_repo;
pub mod user_repo;

pub use applicant_repo::ApplicantRepo;
pub use application_repo::ApplicationRepo;
pub use draft_store_repo::DraftStoreRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
