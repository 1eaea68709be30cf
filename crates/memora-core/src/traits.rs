//! Core traits for memora abstractions.
//!
//! These traits describe the remote backend the application talks to. The
//! HTTP client implements them against the hosted service; tests swap in an
//! in-memory implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// MEMO REPOSITORY
// =============================================================================

/// Data access for the `memos` table.
#[async_trait]
pub trait MemoRepository: Send + Sync {
    /// All memos visible to the current session, newest first.
    async fn list_memos(&self) -> Result<Vec<Memo>>;

    /// Insert a memo carrying only `content`; id and timestamp are assigned
    /// by the backend.
    async fn insert_memo(&self, content: &str) -> Result<()>;

    /// Replace the content of memo `id`.
    async fn update_memo(&self, id: &str, content: &str) -> Result<()>;

    /// Delete memo `id`.
    async fn delete_memo(&self, id: &str) -> Result<()>;
}

// =============================================================================
// AUTH SERVICE
// =============================================================================

/// Account and session management.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account. Does not establish a session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;

    /// Exchange credentials for a session and keep it for later requests.
    async fn sign_in(&self, email: &str, password: &str) -> Result<User>;

    /// Terminate the session. The locally held session is dropped even when
    /// the backend rejects the request.
    async fn sign_out(&self) -> Result<()>;

    /// User for the held session, or `None` when no session is held.
    async fn current_user(&self) -> Result<Option<User>>;
}

/// Everything the memo page needs from the backend.
pub trait MemoBackend: MemoRepository + AuthService {}

impl<T: MemoRepository + AuthService + ?Sized> MemoBackend for T {}
