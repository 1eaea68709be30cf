//! Backend connection settings.

use std::fmt;

use memora_core::defaults::{
    ENV_BACKEND_ANON_KEY, ENV_BACKEND_ANON_KEY_PUBLIC, ENV_BACKEND_URL, ENV_BACKEND_URL_PUBLIC,
    REDACTED_KEY_PREFIX,
};
use memora_core::{Error, Result};

/// Endpoint and public anon key for the hosted backend.
///
/// Both values are required and non-empty. `Debug` never prints the key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the project, without trailing slash.
    pub url: String,
    /// Public anon key sent as `apikey` on every request.
    pub anon_key: String,
}

impl BackendConfig {
    /// Build a config, rejecting missing or blank values.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        let anon_key = anon_key.into().trim().to_string();

        if url.is_empty() || anon_key.is_empty() {
            return Err(Error::Config(
                "Backend URL or anon key is missing".to_string(),
            ));
        }

        Ok(Self { url, anon_key })
    }

    /// Read `SUPABASE_URL` / `SUPABASE_ANON_KEY`, falling back to the
    /// `NEXT_PUBLIC_` prefixed names.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |primary: &str, fallback: &str| {
            lookup(primary)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| lookup(fallback))
                .unwrap_or_default()
        };

        let url = read(ENV_BACKEND_URL, ENV_BACKEND_URL_PUBLIC);
        let anon_key = read(ENV_BACKEND_ANON_KEY, ENV_BACKEND_ANON_KEY_PUBLIC);

        if url.trim().is_empty() {
            return Err(Error::Config(format!("{} is not set", ENV_BACKEND_URL)));
        }
        if anon_key.trim().is_empty() {
            return Err(Error::Config(format!("{} is not set", ENV_BACKEND_ANON_KEY)));
        }

        Self::new(url, anon_key)
    }

    /// Key form safe to write to logs: a short prefix and the length.
    pub fn redacted_key(&self) -> String {
        redact(&self.anon_key)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &self.redacted_key())
            .finish()
    }
}

fn redact(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= REDACTED_KEY_PREFIX * 2 {
        return format!("***({} chars)", len);
    }
    let prefix: String = secret.chars().take(REDACTED_KEY_PREFIX).collect();
    format!("{}***({} chars)", prefix, len)
}
