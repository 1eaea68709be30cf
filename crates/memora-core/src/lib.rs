//! # memora-core
//!
//! Core types, traits, and abstractions for memora.
//!
//! This crate provides the memo and session models, the error type, and the
//! backend trait definitions that the client and web crates depend on.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
