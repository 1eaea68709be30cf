//! HTTP routes for the memo page.
//!
//! Every browser gets its own controller, found through the `memora_session`
//! cookie (a UUIDv7). Each POST route maps one form submission onto one
//! controller operation, stores the outcome as a flash notice and redirects
//! to `/`, so reloading the page never repeats an action. The cookie is
//! `SameSite=Strict`: a form posted from another site arrives without it and
//! lands in a fresh, logged-out session.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{debug, warn};
use uuid::Uuid;

use memora_core::MemoBackend;

use crate::controller::MemoController;
use crate::page::{self, Notice};

/// Form bodies are a few short text fields.
const MAX_FORM_BYTES: usize = 64 * 1024;

pub const SESSION_COOKIE: &str = "memora_session";

/// Oldest sessions are dropped beyond this many.
const MAX_SESSIONS: usize = 10_000;

/// Builds the backend handle for a new browser session.
pub type BackendFactory = Arc<dyn Fn() -> Arc<dyn MemoBackend> + Send + Sync>;

/// One browser's controller plus the notice waiting for its next page load.
struct BrowserSession {
    id: Uuid,
    controller: MemoController,
    flash: Mutex<Option<Notice>>,
}

impl BrowserSession {
    /// Store `notice` for the next `GET /` and redirect there.
    async fn redirect_home(&self, notice: Option<Notice>) -> Response {
        *self.flash.lock().await = notice;
        with_session_cookie(self.id, Redirect::to("/"))
    }
}

/// Shared state: browser sessions keyed by cookie id, and the factory that
/// gives each new session its own backend handle.
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<RwLock<BTreeMap<Uuid, Arc<BrowserSession>>>>,
    backend_factory: BackendFactory,
}

impl AppState {
    pub fn new<F>(backend_factory: F) -> Self
    where
        F: Fn() -> Arc<dyn MemoBackend> + Send + Sync + 'static,
    {
        Self {
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            backend_factory: Arc::new(backend_factory),
        }
    }

    /// Session named by the request cookie, or a new one. A new session runs
    /// the controller's startup lookup before it is used.
    async fn session(&self, headers: &HeaderMap) -> Arc<BrowserSession> {
        if let Some(id) = session_id(headers) {
            if let Some(existing) = self.sessions.read().await.get(&id) {
                return Arc::clone(existing);
            }
        }

        let session = Arc::new(BrowserSession {
            id: Uuid::now_v7(),
            controller: MemoController::new((self.backend_factory)()),
            flash: Mutex::new(None),
        });

        {
            let mut sessions = self.sessions.write().await;
            // v7 ids sort by creation time, so the first entry is the oldest.
            while sessions.len() >= MAX_SESSIONS {
                if let Some((evicted, _)) = sessions.pop_first() {
                    debug!(session_id = %evicted, "Evicted oldest browser session");
                }
            }
            sessions.insert(session.id, Arc::clone(&session));
        }

        debug!(session_id = %session.id, "Browser session started");
        if let Err(e) = session.controller.init().await {
            // Treated as logged out; the user can sign in from the page.
            warn!(session_id = %session.id, error = %e, "Could not resolve current user");
        }
        session
    }
}

/// Session id from the `Cookie` header, if present and well-formed.
fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

fn with_session_cookie(id: Uuid, response: impl IntoResponse) -> Response {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE, id
    );
    ([(header::SET_COOKIE, cookie)], response).into_response()
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/signout", post(sign_out))
        .route("/memos", post(add_memo))
        .route("/memos/edit", post(start_editing))
        .route("/memos/save", post(save_edit))
        .route("/memos/cancel", post(cancel_edit))
        .route("/memos/delete", post(delete_memo))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .with_state(state)
}

// =============================================================================
// FORMS
// =============================================================================

#[derive(Debug, Deserialize)]
struct AuthForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct ContentForm {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct MemoIdForm {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EditForm {
    id: String,
    #[serde(default)]
    content: String,
}

// =============================================================================
// HANDLERS
// =============================================================================

fn failure(action: &str, err: memora_core::Error) -> Option<Notice> {
    Some(Notice::Error(format!("{}: {}", action, err.user_message())))
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session(&headers).await;
    let notice = session.flash.lock().await.take();
    let view = session.controller.snapshot().await;

    let body = page::render(&view, notice.as_ref());
    with_session_cookie(
        session.id,
        ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body),
    )
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AuthForm>,
) -> Response {
    let session = state.session(&headers).await;
    let notice = match session.controller.sign_up(&form.email, &form.password).await {
        Ok(outcome) if outcome.confirmation_pending => Some(Notice::Info(
            "Confirmation email sent. Follow the link, then log in.".to_string(),
        )),
        Ok(_) => Some(Notice::Info(
            "Account created. You can now log in.".to_string(),
        )),
        Err(e) => failure("Sign-up failed", e),
    };
    session.redirect_home(notice).await
}

async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AuthForm>,
) -> Response {
    let session = state.session(&headers).await;
    let notice = match session.controller.sign_in(&form.email, &form.password).await {
        Ok(()) => None,
        Err(e) => failure("Login failed", e),
    };
    session.redirect_home(notice).await
}

async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session(&headers).await;
    let notice = match session.controller.sign_out().await {
        Ok(()) => None,
        Err(e) => failure(
            "Logged out locally, but the server did not confirm",
            e,
        ),
    };
    session.redirect_home(notice).await
}

async fn add_memo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ContentForm>,
) -> Response {
    let session = state.session(&headers).await;
    session.controller.set_new_memo(form.content).await;
    let notice = match session.controller.add_memo().await {
        Ok(()) => None,
        Err(e) => failure("Failed to add memo", e),
    };
    session.redirect_home(notice).await
}

async fn start_editing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<EditForm>,
) -> Response {
    let session = state.session(&headers).await;
    session.controller.start_editing(form.id, form.content).await;
    session.redirect_home(None).await
}

async fn save_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ContentForm>,
) -> Response {
    let session = state.session(&headers).await;
    session.controller.set_edit_content(form.content).await;
    let notice = match session.controller.save_edit().await {
        Ok(()) => None,
        Err(e) => failure("Failed to save memo", e),
    };
    session.redirect_home(notice).await
}

async fn cancel_edit(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session(&headers).await;
    session.controller.cancel_edit().await;
    session.redirect_home(None).await
}

async fn delete_memo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<MemoIdForm>,
) -> Response {
    let session = state.session(&headers).await;
    let notice = match session.controller.delete_memo(&form.id).await {
        Ok(()) => None,
        Err(e) => failure("Failed to delete memo", e),
    };
    session.redirect_home(notice).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn cookie_headers(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(header::COOKIE, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_session_id_found_among_other_cookies() {
        let id = Uuid::now_v7();
        let cookie = format!("theme=dark; {}={}; lang=en", SESSION_COOKIE, id);
        assert_eq!(session_id(&cookie_headers(&[cookie.as_str()])), Some(id));
    }

    #[test]
    fn test_session_id_in_second_cookie_header() {
        let id = Uuid::now_v7();
        let cookie = format!("{}={}", SESSION_COOKIE, id);
        let headers = cookie_headers(&["theme=dark", cookie.as_str()]);
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn test_session_id_missing_or_malformed() {
        assert_eq!(session_id(&HeaderMap::new()), None);

        let malformed = format!("{}=not-a-uuid", SESSION_COOKIE);
        assert_eq!(session_id(&cookie_headers(&[malformed.as_str()])), None);

        let other = "other_session=0190b6c4-7b1e-7000-8000-000000000000";
        assert_eq!(session_id(&cookie_headers(&[other])), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = Uuid::now_v7();
        let response = with_session_cookie(id, Redirect::to("/"));
        assert_eq!(response.status().as_u16(), 303);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("{}={}", SESSION_COOKIE, id)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
    }
}
