use anyhow::Context;
use carelink_core::{Database, TokenService};
use carelink_http::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carelink_http=info,carelink_core=info".into()),
        )
        .init();

    let db_path = std::env::var("CARELINK_DB").unwrap_or_else(|_| "carelink.db".to_string());
    let bind = std::env::var("CARELINK_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

    let db = Database::open(&db_path).with_context(|| format!("opening database {db_path}"))?;
    let state = AppState::new(db, TokenService::from_env());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(%bind, %db_path, "carelink listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
    }
}
