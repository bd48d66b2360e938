use anyhow::Context;
use async_trait::async_trait;
use tracing::info;

use pantry_common::LaunchConfig;
use pantry_core::Server;
use pantry_router::pantry_router;
use pantry_storage::PantryStorage;

/// Serves the pantry HTTP API until ctrl-c.
pub(crate) struct HttpServer;

#[async_trait]
impl Server for HttpServer {
    async fn serve(&self, config: LaunchConfig) -> anyhow::Result<()> {
        let storage = PantryStorage::connect(&config.dsn())
            .await
            .context("connect storage")?;
        info!(database = %config.database_path.display(), "db connected");
        // Covers a first run whose initializer failed.
        storage.sync().await.context("schema sync")?;

        let app = pantry_router(storage, &config.manager_password);
        let addr = config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("bind {addr}"))?;
        info!(addr = %addr, "listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("serve")?;
        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
