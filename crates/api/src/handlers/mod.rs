pub mod accounts;
pub mod application;
pub mod applications;
pub mod auth;
pub mod dashboard;
