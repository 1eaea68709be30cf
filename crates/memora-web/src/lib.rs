//! # memora-web
//!
//! The memo page: a controller owning all view state, an HTML renderer, and
//! the axum routes that connect browser form posts to controller operations.

pub mod controller;
pub mod page;
pub mod routes;
pub mod telemetry;

pub use controller::{EditDraft, MemoController, ViewState};
pub use page::Notice;
pub use routes::{router, AppState};
