//! Startup sequence for the pantry service.
//!
//! Steps run strictly in order and stop on the first fatal error:
//! 1) create the data directory,
//! 2) initialize the database if its file is missing (failure tolerated
//!    unless `strict_init` is set),
//! 3) run the server until it returns.

pub mod initializer;

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, warn};

use pantry_common::LaunchConfig;

use self::initializer::Initializer;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("create data dir {}: {source}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("database initialization failed: {0}")]
    InitFailed(String),
}

/// What happened to the database file before the server started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    AlreadyPresent,
    InitFailed(String),
}

/// The long-running process the launcher hands off to.
#[async_trait]
pub trait Server: Send + Sync {
    /// Runs until shutdown. The launcher does nothing after this returns.
    async fn serve(&self, config: LaunchConfig) -> anyhow::Result<()>;
}

pub fn ensure_data_dir(path: &Path) -> Result<(), BootstrapError> {
    std::fs::create_dir_all(path).map_err(|source| BootstrapError::DataDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Run the initializer only when the database file does not exist yet.
/// Initializer errors are reported in the outcome, never returned.
pub async fn prepare_database(config: &LaunchConfig, initializer: &dyn Initializer) -> InitOutcome {
    if config.database_path.exists() {
        info!(database = %config.database_path.display(), "database present");
        return InitOutcome::AlreadyPresent;
    }

    info!(
        database = %config.database_path.display(),
        "database not found, initializing"
    );
    match initializer.initialize(config).await {
        Ok(()) => {
            info!(database = %config.database_path.display(), "database initialized");
            InitOutcome::Initialized
        }
        Err(err) => {
            let reason = format!("{err:#}");
            warn!(
                database = %config.database_path.display(),
                error = %reason,
                "database initialization failed, starting server anyway"
            );
            InitOutcome::InitFailed(reason)
        }
    }
}

pub async fn launch(
    config: LaunchConfig,
    initializer: &dyn Initializer,
    server: &dyn Server,
) -> anyhow::Result<InitOutcome> {
    ensure_data_dir(&config.data_dir)?;
    info!(data_dir = %config.data_dir.display(), "data dir ready");

    let outcome = prepare_database(&config, initializer).await;
    if config.strict_init
        && let InitOutcome::InitFailed(reason) = &outcome
    {
        return Err(BootstrapError::InitFailed(reason.clone()).into());
    }

    info!(addr = %config.bind_addr(), "handing off to server");
    server.serve(config).await.context("server")?;
    Ok(outcome)
}
