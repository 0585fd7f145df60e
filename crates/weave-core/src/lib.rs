//! Core types for Weave, the CI configuration include resolver.
//!
//! This crate contains:
//! - Expansion identifiers
//! - Project and revision identities
//! - Include rule records
//! - The repository search collaborator
//! - The error type collaborators report with

pub mod error;
pub mod id;
pub mod project;
pub mod repository;
pub mod rule;

pub use error::{Error, Result};
pub use id::ExpansionId;
pub use project::{ProjectPath, Revision};
pub use repository::{InMemoryRepository, RepositorySearch};
pub use rule::{Rule, RuleOutcome, RuleWhen};
