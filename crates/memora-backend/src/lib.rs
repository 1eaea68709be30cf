//! # memora-backend
//!
//! Client for the hosted backend that stores memos and manages accounts.
//!
//! This crate provides:
//! - `BackendConfig`: endpoint + anon key, read from the environment
//! - `SupabaseClient`: HTTP implementation of the `memora-core` backend traits
//! - `mock::MockBackend` (feature `mock`): in-memory backend with a call log
//!
//! # Example
//!
//! ```rust,no_run
//! use memora_backend::create_client;
//! use memora_core::MemoRepository;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_client().expect("SUPABASE_URL and SUPABASE_ANON_KEY must be set");
//!     let memos = client.list_memos().await.unwrap();
//!     println!("{} memos", memos.len());
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::{create_client, SupabaseClient};
pub use config::BackendConfig;
