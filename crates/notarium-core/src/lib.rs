//! # notarium-core
//!
//! Core types, traits, and access-control rules for the notarium
//! multi-tenant note-taking service.
//!
//! This crate provides the foundational data structures, the error
//! taxonomy, and the trait definitions that the store layer implements.

pub mod defaults;
pub mod error;
pub mod models;
pub mod permissions;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, ErrorKind, Result};
pub use models::*;
pub use traits::*;
