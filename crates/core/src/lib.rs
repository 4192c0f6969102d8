//! Admissions portal domain logic.
//!
//! Everything here is free of database and HTTP concerns:
//!
//! - [`draft`]: the application draft and its slice reducers.
//! - [`validation`]: per-step field editors that mint [`validation::StepClearance`].
//! - [`wizard`]: the step controller state machine.
//! - [`persistence`]: autosave and rehydration through a key-value store.
//! - [`consent`]: the consent gate and its policy.
//! - [`submission`]: the submission assembler and its collaborator traits.
//! - [`session`]: one live intake session tying the above together.
//! - [`analytics`]: dashboard aggregation.

pub mod analytics;
pub mod application;
pub mod consent;
pub mod draft;
pub mod error;
pub mod pagination;
pub mod persistence;
pub mod roles;
pub mod session;
pub mod submission;
pub mod types;
pub mod validation;
pub mod wizard;
