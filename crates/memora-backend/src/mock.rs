//! In-memory backend for deterministic testing.
//!
//! Implements the same traits as [`SupabaseClient`](crate::SupabaseClient),
//! records every call, and can be told to fail specific operations.
//!
//! ## Usage
//!
//! ```rust
//! use memora_backend::mock::MockBackend;
//! use memora_core::{AuthService, MemoRepository};
//!
//! async fn example() {
//!     let backend = MockBackend::new().with_account("a@b.com", "secret");
//!     backend.sign_in("a@b.com", "secret").await.unwrap();
//!     backend.insert_memo("hello").await.unwrap();
//!     assert_eq!(backend.list_memos().await.unwrap().len(), 1);
//!     assert_eq!(backend.call_count("insert_memo"), 1);
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use memora_core::{AuthService, Error, Memo, MemoRepository, Result, SignUpOutcome, User};

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Debug)]
struct MockState {
    memos: Vec<Memo>,
    accounts: HashMap<String, String>,
    failing: HashMap<String, String>,
    confirm_on_sign_up: bool,
    next_id: u64,
    clock: DateTime<Utc>,
}

/// In-memory backend.
///
/// Clones share state, so a test can keep a handle for assertions while the
/// code under test owns another. [`fork`](Self::fork) gives a handle with
/// its own session over the same store, like a second browser.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    session: Arc<Mutex<Option<User>>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockBackend {
    /// Empty backend: no accounts, no memos, no session.
    pub fn new() -> Self {
        let epoch = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);

        Self {
            state: Arc::new(Mutex::new(MockState {
                memos: Vec::new(),
                accounts: HashMap::new(),
                failing: HashMap::new(),
                confirm_on_sign_up: true,
                next_id: 1,
                clock: epoch,
            })),
            session: Arc::new(Mutex::new(None)),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register an account that can sign in.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.state()
            .accounts
            .insert(email.to_string(), password.to_string());
        self
    }

    /// Start with `email` already signed in (an account is created for it).
    pub fn with_session(self, email: &str) -> Self {
        self.state()
            .accounts
            .entry(email.to_string())
            .or_insert_with(String::new);
        *self.session() = Some(user_for(email));
        self
    }

    /// Seed a memo with an explicit creation time.
    pub fn with_memo(self, content: &str, created_at: DateTime<Utc>) -> Self {
        {
            let mut state = self.state();
            let id = state.allocate_id();
            state.memos.push(Memo {
                id,
                content: content.to_string(),
                created_at,
            });
        }
        self
    }

    /// Sign-ups return a session instead of waiting for confirmation.
    pub fn with_auto_confirm(self) -> Self {
        self.state().confirm_on_sign_up = false;
        self
    }

    /// Handle sharing memos, accounts, failures and the call log, with a
    /// session of its own that starts as a copy of this handle's.
    pub fn fork(&self) -> Self {
        let session = self.session().clone();
        Self {
            state: Arc::clone(&self.state),
            session: Arc::new(Mutex::new(session)),
            call_log: Arc::clone(&self.call_log),
        }
    }

    /// Make `operation` fail with a backend error carrying `message`.
    pub fn fail(&self, operation: &str, message: &str) {
        self.state()
            .failing
            .insert(operation.to_string(), message.to_string());
    }

    /// Let `operation` succeed again.
    pub fn recover(&self, operation: &str) {
        self.state().failing.remove(operation);
    }

    /// Snapshot of the stored memos in insertion order.
    pub fn memos(&self) -> Vec<Memo> {
        self.state().memos.clone()
    }

    /// Whether this handle currently holds a session.
    pub fn has_session(&self) -> bool {
        self.session().is_some()
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.log().clone()
    }

    /// Number of recorded calls to `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.log()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.log().clear()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock poisoned")
    }

    fn session(&self) -> MutexGuard<'_, Option<User>> {
        self.session.lock().expect("mock session lock poisoned")
    }

    fn require_session(&self) -> Result<()> {
        if self.session().is_none() {
            return Err(Error::Backend {
                status: 401,
                message: "JWT required".to_string(),
            });
        }
        Ok(())
    }

    fn log(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().expect("mock call log lock poisoned")
    }

    /// Record the call and apply any injected failure.
    fn enter(&self, operation: &str, input: &str) -> Result<()> {
        self.log().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });

        match self.state().failing.get(operation) {
            Some(message) => Err(Error::Backend {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    fn allocate_id(&mut self) -> String {
        let id = format!("memo-{}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Strictly increasing creation timestamps.
    fn tick(&mut self) -> DateTime<Utc> {
        let latest = self
            .memos
            .iter()
            .map(|m| m.created_at)
            .max()
            .unwrap_or(self.clock);
        self.clock = latest.max(self.clock) + Duration::seconds(1);
        self.clock
    }
}

fn user_for(email: &str) -> User {
    User {
        id: format!("user-{}", email),
        email: Some(email.to_string()),
        created_at: None,
        confirmed_at: None,
        last_sign_in_at: None,
    }
}

#[async_trait]
impl MemoRepository for MockBackend {
    async fn list_memos(&self) -> Result<Vec<Memo>> {
        self.enter("list_memos", "")?;
        self.require_session()?;

        let mut memos = self.state().memos.clone();
        memos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(memos)
    }

    async fn insert_memo(&self, content: &str) -> Result<()> {
        self.enter("insert_memo", content)?;
        self.require_session()?;
        let mut state = self.state();

        let id = state.allocate_id();
        let created_at = state.tick();
        state.memos.push(Memo {
            id,
            content: content.to_string(),
            created_at,
        });
        Ok(())
    }

    async fn update_memo(&self, id: &str, content: &str) -> Result<()> {
        self.enter("update_memo", &format!("{}={}", id, content))?;
        self.require_session()?;
        let mut state = self.state();

        // Filters matching no rows succeed silently, as the data API does.
        if let Some(memo) = state.memos.iter_mut().find(|m| m.id == id) {
            memo.content = content.to_string();
        }
        Ok(())
    }

    async fn delete_memo(&self, id: &str) -> Result<()> {
        self.enter("delete_memo", id)?;
        self.require_session()?;

        self.state().memos.retain(|m| m.id != id);
        Ok(())
    }
}

#[async_trait]
impl AuthService for MockBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        self.enter("sign_up", email)?;
        let mut state = self.state();

        if state.accounts.contains_key(email) {
            return Err(Error::Backend {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        state
            .accounts
            .insert(email.to_string(), password.to_string());

        Ok(SignUpOutcome {
            user: Some(user_for(email)),
            confirmation_pending: state.confirm_on_sign_up,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        self.enter("sign_in", email)?;
        let known = self
            .state()
            .accounts
            .get(email)
            .is_some_and(|stored| stored == password);
        if !known {
            return Err(Error::Backend {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }

        let user = user_for(email);
        *self.session() = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        // Dropped before the outcome is known, like the HTTP client.
        *self.session() = None;
        self.enter("sign_out", "")
    }

    async fn current_user(&self) -> Result<Option<User>> {
        self.enter("current_user", "")?;
        Ok(self.session().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let backend = MockBackend::new()
            .with_session("a@b.com")
            .with_memo("older", at(0))
            .with_memo("newer", at(10));

        let memos = backend.list_memos().await.unwrap();
        assert_eq!(memos[0].content, "newer");
        assert_eq!(memos[1].content, "older");
    }

    #[tokio::test]
    async fn test_insert_assigns_later_timestamp() {
        let backend = MockBackend::new()
            .with_session("a@b.com")
            .with_memo("seed", at(100));

        backend.insert_memo("fresh").await.unwrap();
        let memos = backend.list_memos().await.unwrap();
        assert_eq!(memos[0].content, "fresh");
        assert!(memos[0].created_at > at(100));
    }

    #[tokio::test]
    async fn test_data_requires_session() {
        let backend = MockBackend::new();
        let err = backend.list_memos().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_injected_failure_and_recovery() {
        let backend = MockBackend::new().with_session("a@b.com");
        backend.fail("insert_memo", "boom");

        let err = backend.insert_memo("x").await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(backend.memos().is_empty());

        backend.recover("insert_memo");
        backend.insert_memo("x").await.unwrap();
        assert_eq!(backend.memos().len(), 1);
        assert_eq!(backend.call_count("insert_memo"), 2);
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let backend = MockBackend::new().with_account("a@b.com", "secret");
        let err = backend.sign_in("a@b.com", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(!backend.has_session());
    }

    #[tokio::test]
    async fn test_sign_out_drops_session_even_on_failure() {
        let backend = MockBackend::new().with_session("a@b.com");
        backend.fail("sign_out", "network down");

        assert!(backend.sign_out().await.is_err());
        assert!(!backend.has_session());
    }

    #[tokio::test]
    async fn test_sign_up_duplicate() {
        let backend = MockBackend::new().with_account("a@b.com", "secret");
        let err = backend.sign_up("a@b.com", "other").await.unwrap_err();
        assert_eq!(err.status(), Some(422));
    }

    #[tokio::test]
    async fn test_shared_state_across_clones() {
        let backend = MockBackend::new().with_session("a@b.com");
        let handle = backend.clone();
        backend.insert_memo("shared").await.unwrap();
        assert_eq!(handle.memos().len(), 1);
    }

    #[tokio::test]
    async fn test_fork_has_its_own_session() {
        let backend = MockBackend::new().with_account("a@b.com", "secret");
        let first = backend.fork();
        let second = backend.fork();

        first.sign_in("a@b.com", "secret").await.unwrap();
        first.insert_memo("mine").await.unwrap();

        assert!(first.has_session());
        assert!(!second.has_session());
        assert!(second.current_user().await.unwrap().is_none());
        assert_eq!(second.list_memos().await.unwrap_err().status(), Some(401));
        // Store and call log stay shared.
        assert_eq!(backend.memos().len(), 1);
        assert_eq!(backend.call_count("insert_memo"), 1);
    }
}
