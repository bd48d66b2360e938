use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use pantry_common::LaunchConfig;
use pantry_storage::PantryStorage;

/// Flag that switches the `pantry` binary into one-shot database setup.
pub const INIT_DB_FLAG: &str = "--init-db";

/// First-run database setup, invoked only when the database file is missing.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn initialize(&self, config: &LaunchConfig) -> anyhow::Result<()>;
}

/// Creates the pantry schema in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaInitializer;

#[async_trait]
impl Initializer for SchemaInitializer {
    async fn initialize(&self, config: &LaunchConfig) -> anyhow::Result<()> {
        let storage = PantryStorage::connect(&config.dsn())
            .await
            .context("connect storage")?;
        storage.sync().await.context("schema sync")?;
        Ok(())
    }
}

/// Runs `<program> --init-db --data-dir <dir>` as a child process.
#[derive(Debug, Clone)]
pub struct CommandInitializer {
    program: PathBuf,
}

impl CommandInitializer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Initializer for CommandInitializer {
    async fn initialize(&self, config: &LaunchConfig) -> anyhow::Result<()> {
        let status = Command::new(&self.program)
            .arg(INIT_DB_FLAG)
            .arg("--data-dir")
            .arg(&config.data_dir)
            .status()
            .await
            .with_context(|| format!("spawn initializer {}", self.program.display()))?;
        if !status.success() {
            anyhow::bail!("initializer {} exited with {status}", self.program.display());
        }
        Ok(())
    }
}
