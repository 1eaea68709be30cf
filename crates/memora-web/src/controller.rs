//! Memo view controller.
//!
//! Owns everything the page shows (current user, memo list, form drafts,
//! edit mode) and performs each user action as one backend round trip
//! followed by a full refetch of the memo list.
//!
//! Failures are logged and returned; state is left as it was before the
//! attempt, except for sign-out, which always clears the local session.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use memora_core::{MemoBackend, Memo, Result, SignUpOutcome, User};

/// Memo currently being edited and its draft content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: String,
    pub content: String,
}

/// All state the page renders.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Signed-in user; `None` means logged out.
    pub user: Option<User>,
    /// Result of the last successful fetch, newest first.
    pub memos: Vec<Memo>,
    /// Draft text of the memo being composed.
    pub new_memo: String,
    /// Edit target, if any.
    pub editing: Option<EditDraft>,
    /// Auth form email field.
    pub email: String,
    /// Auth form password field.
    pub password: String,
}

impl ViewState {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Whether memo `id` is the current edit target.
    pub fn is_editing(&self, id: &str) -> bool {
        self.editing.as_ref().is_some_and(|e| e.id == id)
    }
}

/// Controller for the memo page.
///
/// State sits behind its own lock, taken only to read or apply state and
/// never held across a backend call, so the page can be rendered while an
/// operation is in flight. When two operations overlap, the refetch that
/// completes last decides the list.
pub struct MemoController {
    backend: Arc<dyn MemoBackend>,
    state: Mutex<ViewState>,
}

impl MemoController {
    /// Create a controller in the logged-out state. Call [`init`](Self::init)
    /// to pick up an existing session.
    pub fn new(backend: Arc<dyn MemoBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Copy of the current state, for rendering.
    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    // ─── Form inputs ───────────────────────────────────────────────────────

    pub async fn set_email(&self, email: impl Into<String>) {
        self.state.lock().await.email = email.into();
    }

    pub async fn set_password(&self, password: impl Into<String>) {
        self.state.lock().await.password = password.into();
    }

    pub async fn set_new_memo(&self, content: impl Into<String>) {
        self.state.lock().await.new_memo = content.into();
    }

    /// Update the draft of the memo being edited. Ignored outside edit mode.
    pub async fn set_edit_content(&self, content: impl Into<String>) {
        if let Some(draft) = self.state.lock().await.editing.as_mut() {
            draft.content = content.into();
        }
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────

    /// Look up the current user once; a present user triggers the sign-in
    /// handler.
    #[instrument(skip(self), fields(subsystem = "controller", op = "init"))]
    pub async fn init(&self) -> Result<()> {
        match self.backend.current_user().await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Resumed existing session");
                self.state.lock().await.user = Some(user);
                self.on_signed_in().await;
                Ok(())
            }
            Ok(None) => {
                debug!("No existing session");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to get current user");
                Err(e)
            }
        }
    }

    /// Runs whenever the user goes from absent to present.
    async fn on_signed_in(&self) {
        self.refresh().await;
    }

    // ─── Memo list ─────────────────────────────────────────────────────────

    /// Replace the memo list with the backend's current list. On failure the
    /// previous list is kept.
    #[instrument(skip(self), fields(subsystem = "controller", op = "fetch_memos"))]
    pub async fn fetch_memos(&self) -> Result<()> {
        match self.backend.list_memos().await {
            Ok(memos) => {
                debug!(result_count = memos.len(), "Memo list replaced");
                self.state.lock().await.memos = memos;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch memos");
                Err(e)
            }
        }
    }

    /// Refetch after a successful mutation. The mutation already succeeded,
    /// so a fetch failure only leaves the previous list in place.
    async fn refresh(&self) {
        let _ = self.fetch_memos().await;
    }

    // ─── Auth ──────────────────────────────────────────────────────────────

    /// Create an account. Never signs in.
    #[instrument(skip_all, fields(subsystem = "controller", op = "sign_up"))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        self.fill_auth_form(email, password).await;

        match self.backend.sign_up(email, password).await {
            Ok(outcome) => {
                info!(
                    confirmation_pending = outcome.confirmation_pending,
                    "Sign-up accepted"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "Sign-up failed");
                Err(e)
            }
        }
    }

    /// Sign in; on success the memo list is fetched.
    #[instrument(skip_all, fields(subsystem = "controller", op = "sign_in"))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.fill_auth_form(email, password).await;

        match self.backend.sign_in(email, password).await {
            Ok(user) => {
                info!(user_id = %user.id, "Signed in");
                let was_logged_out = self.state.lock().await.user.replace(user).is_none();
                if was_logged_out {
                    self.on_signed_in().await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                Err(e)
            }
        }
    }

    async fn fill_auth_form(&self, email: &str, password: &str) {
        let mut state = self.state.lock().await;
        state.email = email.to_string();
        state.password = password.to_string();
    }

    /// Sign out. User, memo list and edit state are cleared whether or not
    /// the backend acknowledges; its error is still returned.
    #[instrument(skip(self), fields(subsystem = "controller", op = "sign_out"))]
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.backend.sign_out().await;

        {
            let mut state = self.state.lock().await;
            state.user = None;
            state.memos.clear();
            state.editing = None;
        }

        match result {
            Ok(()) => {
                info!("Signed out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Sign-out not acknowledged; local session cleared anyway");
                Err(e)
            }
        }
    }

    // ─── Mutations ─────────────────────────────────────────────────────────

    /// Insert the new-memo draft. Blank drafts are ignored without a backend
    /// call. On success the draft is cleared (unless it was changed while
    /// the insert was pending) and the list refetched.
    #[instrument(skip(self), fields(subsystem = "controller", op = "add_memo"))]
    pub async fn add_memo(&self) -> Result<()> {
        let content = self.state.lock().await.new_memo.clone();
        if content.trim().is_empty() {
            debug!("Blank memo ignored");
            return Ok(());
        }

        match self.backend.insert_memo(&content).await {
            Ok(()) => {
                info!("Memo added");
                {
                    let mut state = self.state.lock().await;
                    if state.new_memo == content {
                        state.new_memo.clear();
                    }
                }
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to add memo");
                Err(e)
            }
        }
    }

    /// Enter edit mode for `id`, seeding the draft with its current content.
    pub async fn start_editing(&self, id: impl Into<String>, current_content: impl Into<String>) {
        self.state.lock().await.editing = Some(EditDraft {
            id: id.into(),
            content: current_content.into(),
        });
    }

    /// Leave edit mode without saving.
    pub async fn cancel_edit(&self) {
        self.state.lock().await.editing = None;
    }

    /// Write the edit draft to the backend. No-op outside edit mode. On
    /// failure edit mode stays active.
    #[instrument(skip(self), fields(subsystem = "controller", op = "save_edit"))]
    pub async fn save_edit(&self) -> Result<()> {
        let Some(draft) = self.state.lock().await.editing.clone() else {
            return Ok(());
        };

        match self.backend.update_memo(&draft.id, &draft.content).await {
            Ok(()) => {
                info!(memo_id = %draft.id, "Memo updated");
                {
                    let mut state = self.state.lock().await;
                    if state.is_editing(&draft.id) {
                        state.editing = None;
                    }
                }
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!(memo_id = %draft.id, error = %e, "Failed to update memo");
                Err(e)
            }
        }
    }

    /// Delete memo `id`; on success the list is refetched.
    #[instrument(skip(self), fields(subsystem = "controller", op = "delete_memo"))]
    pub async fn delete_memo(&self, id: &str) -> Result<()> {
        match self.backend.delete_memo(id).await {
            Ok(()) => {
                info!(memo_id = %id, "Memo deleted");
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!(memo_id = %id, error = %e, "Failed to delete memo");
                Err(e)
            }
        }
    }
}
