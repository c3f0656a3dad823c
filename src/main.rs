//! LegalManager server entry point.
//!
//! Initializes structured logging (console + daily rolling file), opens
//! the store, seeds the initial admin account if the environment asks for
//! one, and serves the API router.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use legalmanager::config::ServerConfig;
use legalmanager::{auth, db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,legalmanager=debug"));

    // Rolling file appender: creates daily log files under the data dir
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "legalmanager");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the process — dropping it
    // flushes logs. Leaked intentionally since the server runs until exit.
    std::mem::forget(guard);

    info!("Starting LegalManager v{}", env!("CARGO_PKG_VERSION"));

    let db_state = db::init(&config.data_dir).map_err(anyhow::Error::msg)?;

    let auth_state = {
        let conn = db_state
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("database lock poisoned at startup: {e}"))?;
        auth::asegurar_admin_inicial(&conn);
        auth::AuthState::desde_ajustes(&conn)
    };

    let estado = Arc::new(AppState {
        db: db_state,
        auth: auth_state,
    });

    let app = routes::router(estado);
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("No se pudo escuchar en {}", config.bind_addr()))?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
