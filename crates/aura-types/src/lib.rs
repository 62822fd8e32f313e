//! Aura Types - Shared domain types
//!
//! This crate contains domain types used across the Aura backend:
//! - User and conversation identifiers
//! - Authentication provider tags
//! - Subscription lifecycle statuses
//! - Verified identity tuples produced by credential verifiers

pub mod identity;
pub mod ids;
pub mod provider;
pub mod subscription;

pub use identity::*;
pub use ids::*;
pub use provider::*;
pub use subscription::*;
