//! HTTP client for the hosted data and auth APIs.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use memora_core::defaults::{AUTH_PATH, MEMOS_ORDER_COLUMN, MEMOS_TABLE, REST_PATH};
use memora_core::{
    AuthService, Credentials, Error, Memo, MemoContentUpdate, MemoRepository, NewMemo, Result,
    Session, SignUpOutcome, User,
};

use crate::config::BackendConfig;
use crate::error;

/// Build a client from `SUPABASE_URL` / `SUPABASE_ANON_KEY`.
///
/// Fails with [`Error::Config`] when either variable is missing or empty.
pub fn create_client() -> Result<SupabaseClient> {
    SupabaseClient::new(BackendConfig::from_env()?)
}

/// Client for the hosted backend.
///
/// Holds the session obtained by [`AuthService::sign_in`] in memory; data
/// requests are authorized with its access token, or with the anon key when
/// no session is held. Requests carry no timeout and are never retried.
pub struct SupabaseClient {
    client: Client,
    config: BackendConfig,
    session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    /// Create a client for the given configuration.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            url = %config.url,
            anon_key = %config.redacted_key(),
            "Initializing backend client"
        );

        Ok(Self {
            client,
            config,
            session: RwLock::new(None),
        })
    }

    /// A client for another browser session: same configuration and
    /// connection pool, no session.
    pub fn fork(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            session: RwLock::new(None),
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Copy of the held session, if any.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}{}/{}", self.config.url, REST_PATH, table)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}{}/{}", self.config.url, AUTH_PATH, endpoint)
    }

    /// Attach the key headers, authorizing with `bearer`.
    fn authorize(&self, req: RequestBuilder, bearer: &str) -> RequestBuilder {
        req.header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    /// Attach the key headers using the session token when one is held.
    async fn with_session(&self, req: RequestBuilder) -> RequestBuilder {
        let guard = self.session.read().await;
        let bearer = guard
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(self.config.anon_key.as_str());
        self.authorize(req, bearer)
    }

    /// Send a request and turn non-success statuses into backend errors.
    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = error::from_response(status.as_u16(), &body);
        warn!(status = status.as_u16(), error = %err, "Backend request failed");
        Err(err)
    }
}

#[async_trait]
impl MemoRepository for SupabaseClient {
    #[instrument(skip(self), fields(subsystem = "backend", op = "list_memos"))]
    async fn list_memos(&self) -> Result<Vec<Memo>> {
        let start = Instant::now();
        let order = format!("{}.desc", MEMOS_ORDER_COLUMN);
        let req = self
            .client
            .get(self.rest_url(MEMOS_TABLE))
            .query(&[("select", "*"), ("order", order.as_str())]);

        let response = self.send(self.with_session(req).await).await?;
        let memos: Vec<Memo> = response.json().await?;

        debug!(
            result_count = memos.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched memos"
        );
        Ok(memos)
    }

    #[instrument(skip(self, content), fields(subsystem = "backend", op = "insert_memo", content_len = content.len()))]
    async fn insert_memo(&self, content: &str) -> Result<()> {
        let req = self
            .client
            .post(self.rest_url(MEMOS_TABLE))
            .header("Prefer", "return=minimal")
            .json(&[NewMemo { content }]);

        self.send(self.with_session(req).await).await?;
        debug!("Memo inserted");
        Ok(())
    }

    #[instrument(skip(self, content), fields(subsystem = "backend", op = "update_memo", memo_id = %id))]
    async fn update_memo(&self, id: &str, content: &str) -> Result<()> {
        let filter = format!("eq.{}", id);
        let req = self
            .client
            .patch(self.rest_url(MEMOS_TABLE))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&MemoContentUpdate { content });

        self.send(self.with_session(req).await).await?;
        debug!("Memo updated");
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "backend", op = "delete_memo", memo_id = %id))]
    async fn delete_memo(&self, id: &str) -> Result<()> {
        let filter = format!("eq.{}", id);
        let req = self
            .client
            .delete(self.rest_url(MEMOS_TABLE))
            .query(&[("id", filter.as_str())]);

        self.send(self.with_session(req).await).await?;
        debug!("Memo deleted");
        Ok(())
    }
}

/// Sign-up answers with a session when the project auto-confirms accounts,
/// otherwise with the bare user awaiting e-mail confirmation.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    User(User),
}

#[async_trait]
impl AuthService for SupabaseClient {
    #[instrument(skip_all, fields(subsystem = "backend", op = "sign_up"))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let req = self
            .client
            .post(self.auth_url("signup"))
            .json(&Credentials { email, password });

        let response = self.send(self.authorize(req, &self.config.anon_key)).await?;
        let outcome = match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(session) => SignUpOutcome {
                user: Some(session.user),
                confirmation_pending: false,
            },
            SignUpResponse::User(user) => SignUpOutcome {
                user: Some(user),
                confirmation_pending: true,
            },
        };

        info!(
            confirmation_pending = outcome.confirmation_pending,
            "Account created"
        );
        Ok(outcome)
    }

    #[instrument(skip_all, fields(subsystem = "backend", op = "sign_in"))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let req = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });

        let response = self.send(self.authorize(req, &self.config.anon_key)).await?;
        let session: Session = response.json().await?;
        let user = session.user.clone();

        *self.session.write().await = Some(session);
        info!(user_id = %user.id, "Session established");
        Ok(user)
    }

    #[instrument(skip(self), fields(subsystem = "backend", op = "sign_out"))]
    async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.session.write().await.take() else {
            debug!("No session held, nothing to terminate");
            return Ok(());
        };

        let req = self.client.post(self.auth_url("logout"));
        self.send(self.authorize(req, &session.access_token))
            .await?;
        info!(user_id = %session.user.id, "Session terminated");
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "backend", op = "current_user"))]
    async fn current_user(&self) -> Result<Option<User>> {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => return Ok(None),
        };

        let req = self.client.get(self.auth_url("user"));
        let response = self.send(self.authorize(req, &token)).await?;
        let user: User = response.json().await?;
        Ok(Some(user))
    }
}
