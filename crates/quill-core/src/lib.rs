//! # Quill Core
//!
//! The domain layer of the Quill blog backend.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the post lifecycle state machine, versioning rules, slug normalization,
//! and the ports that infrastructure must implement.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod slug;

pub use error::DomainError;
