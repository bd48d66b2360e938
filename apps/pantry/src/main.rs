use anyhow::Context;
use clap::Parser;
use tracing::info;

mod cli;
mod server;

use pantry_core::{CommandInitializer, Initializer, SchemaInitializer, ensure_data_dir, launch};

use crate::cli::Cli;
use crate::server::HttpServer;

const DEFAULT_LOG_FILTER: &str =
    "pantry=info,pantry_core=info,pantry_storage=info,pantry_router=info,sqlx=warn";

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("pantry failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.settings().into_config().context("config")?;
    info!(
        data_dir = %config.data_dir.display(),
        database = %config.database_path.display(),
        addr = %config.bind_addr(),
        strict_init = config.strict_init,
        "config loaded"
    );

    if cli.init_db {
        ensure_data_dir(&config.data_dir)?;
        SchemaInitializer.initialize(&config).await?;
        info!(database = %config.database_path.display(), "database initialized");
        return Ok(());
    }

    let initializer: Box<dyn Initializer> = match cli.init_command() {
        Some(program) => Box::new(CommandInitializer::new(program)),
        None => Box::new(SchemaInitializer),
    };
    let outcome = launch(config, initializer.as_ref(), &HttpServer).await?;
    info!(init = ?outcome, "pantry stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
