mod config;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use himo_api::auth::hash_password;
use himo_api::state::AppStateInner;
use himo_db::Database;
use himo_db::him_id::HashedHimIds;

use crate::config::{BootstrapAdmin, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "himo=debug,himo_api=debug,himo_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = match &config.db_path {
        Some(path) => {
            let db = Database::open(path)?;
            if let Some(admin) = &config.admin {
                bootstrap_admin(&db, admin)?;
            }
            Some(db)
        }
        None => {
            warn!("HIMO_DB_PATH is not set; every request will fail until it is configured");
            None
        }
    };

    let app = himo_api::router(Arc::new(AppStateInner::new(db))).layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Himo server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn bootstrap_admin(db: &Database, admin: &BootstrapAdmin) -> Result<()> {
    let password_hash = hash_password(&admin.password)?;
    let mut him_ids = HashedHimIds::new(Uuid::new_v4());

    if db.ensure_super_admin(&admin.username, &password_hash, &mut him_ids, Utc::now())? {
        info!("Created super-admin '{}'", admin.username);
    } else {
        info!("Super-admin already present, skipping bootstrap");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sig) => sig,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
