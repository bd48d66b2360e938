use clap::Parser;

use pantry_common::LaunchSettings;

#[derive(Parser, Debug)]
#[command(name = "pantry")]
pub(crate) struct Cli {
    #[arg(long, env = "PANTRY_DATA_DIR")]
    pub(crate) data_dir: Option<String>,
    #[arg(long, env = "PANTRY_HOST")]
    pub(crate) host: Option<String>,
    #[arg(long, env = "PORT")]
    pub(crate) port: Option<String>,
    #[arg(long, env = "PANTRY_MANAGER_PASSWORD", hide_env_values = true)]
    pub(crate) manager_password: Option<String>,
    /// Abort when first-run initialization fails. A bare flag means `true`.
    #[arg(long, env = "PANTRY_STRICT_INIT", num_args = 0..=1, default_missing_value = "true")]
    pub(crate) strict_init: Option<String>,
    /// External program run as `<program> --init-db --data-dir <dir>` on first start.
    #[arg(long, env = "PANTRY_INIT_COMMAND")]
    pub(crate) init_command: Option<String>,
    /// Create the database schema in the data dir and exit.
    #[arg(long)]
    pub(crate) init_db: bool,
}

impl Cli {
    pub(crate) fn settings(&self) -> LaunchSettings {
        LaunchSettings {
            data_dir: self.data_dir.clone(),
            host: self.host.clone(),
            port: self.port.clone(),
            manager_password: self.manager_password.clone(),
            strict_init: self.strict_init.clone(),
        }
    }

    pub(crate) fn init_command(&self) -> Option<&str> {
        self.init_command
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}
