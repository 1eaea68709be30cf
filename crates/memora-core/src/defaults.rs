//! Centralized default constants for memora.
//!
//! Crates reference these instead of repeating literals.

// =============================================================================
// BACKEND
// =============================================================================

/// Environment variable holding the backend endpoint.
pub const ENV_BACKEND_URL: &str = "SUPABASE_URL";

/// Environment variable holding the public anon key.
pub const ENV_BACKEND_ANON_KEY: &str = "SUPABASE_ANON_KEY";

/// Fallback endpoint variable name used by browser builds.
pub const ENV_BACKEND_URL_PUBLIC: &str = "NEXT_PUBLIC_SUPABASE_URL";

/// Fallback anon key variable name used by browser builds.
pub const ENV_BACKEND_ANON_KEY_PUBLIC: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

/// Table holding memo rows.
pub const MEMOS_TABLE: &str = "memos";

/// Column memos are ordered by (descending).
pub const MEMOS_ORDER_COLUMN: &str = "created_at";

/// Path prefix of the data API.
pub const REST_PATH: &str = "/rest/v1";

/// Path prefix of the auth API.
pub const AUTH_PATH: &str = "/auth/v1";

/// Number of key characters kept when a key is written to logs.
pub const REDACTED_KEY_PREFIX: usize = 4;

// =============================================================================
// WEB SERVER
// =============================================================================

/// Default bind address.
pub const HOST: &str = "127.0.0.1";

/// Default bind port.
pub const PORT: u16 = 3000;

/// Default tracing filter for the web binary.
pub const LOG_FILTER: &str = "memora_web=debug,memora_backend=debug,tower_http=debug";

/// Default file name when `LOG_FILE` points at a directory-less path.
pub const LOG_FILE_NAME: &str = "memora-web.log";
