//! memora-web - memo page server

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};

use memora_backend::create_client;
use memora_core::{defaults, MemoBackend};
use memora_web::telemetry::{self, LogSettings};
use memora_web::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = telemetry::init(&LogSettings::from_env());

    let host = std::env::var("HOST").unwrap_or_else(|_| defaults::HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(defaults::PORT);

    // Missing backend credentials halt startup.
    let client = create_client().map_err(|e| {
        error!(error = %e, "Backend configuration invalid");
        e
    })?;

    // Each browser session gets its own client over the shared connection pool.
    let app = router(AppState::new(move || {
        Arc::new(client.fork()) as Arc<dyn MemoBackend>
    }));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    if !addr.ip().is_loopback() {
        warn!(%addr, "Listening beyond loopback; serve behind TLS so session cookies stay private");
    }
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
