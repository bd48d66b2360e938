use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "PANTRY_DATA_DIR";
pub const PORT_ENV: &str = "PORT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DATABASE_FILE_NAME: &str = "church_pantry.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MANAGER_PASSWORD: &str = "ChangeMe123!";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name} value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Final, resolved configuration for one launch.
///
/// Built once by the launcher and handed to the initializer and the server;
/// nothing downstream reads the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub data_dir: PathBuf,
    /// Always `data_dir/church_pantry.db`.
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub manager_password: String,
    /// Abort the launch when first-run initialization fails.
    pub strict_init: bool,
}

impl LaunchConfig {
    /// SQLite DSN for the database file. `mode=rwc` lets the first
    /// connection create the file.
    pub fn dsn(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database_path.display())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Raw settings as they arrive from CLI flags or the environment.
///
/// `None`, empty strings and unresolved `${VAR}` placeholders all mean
/// "not set" and resolve to the defaults above.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSettings {
    pub data_dir: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub manager_password: Option<String>,
    pub strict_init: Option<String>,
}

impl LaunchSettings {
    pub fn into_config(self) -> Result<LaunchConfig, ConfigError> {
        let data_dir = resolve_data_dir(self.data_dir.as_deref());
        let database_path = database_path(&data_dir);
        let port = resolve_port(self.port.as_deref())?;
        let strict_init = parse_bool_value(self.strict_init, "PANTRY_STRICT_INIT")?.unwrap_or(false);

        Ok(LaunchConfig {
            data_dir,
            database_path,
            host: sanitize_optional_value(self.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            manager_password: sanitize_optional_value(self.manager_password)
                .unwrap_or_else(|| DEFAULT_MANAGER_PASSWORD.to_string()),
            strict_init,
        })
    }
}

/// Empty means unset; any other value is taken verbatim.
pub fn resolve_data_dir(value: Option<&str>) -> PathBuf {
    match value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_DATA_DIR),
    }
}

pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE_NAME)
}

pub fn resolve_port(value: Option<&str>) -> Result<u16, ConfigError> {
    let Some(raw) = sanitize_optional_value(value.map(str::to_string)) else {
        return Ok(DEFAULT_PORT);
    };
    raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
        name: PORT_ENV,
        value: raw,
    })
}

fn sanitize_optional_value(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    // Some PaaS systems inject unresolved placeholders like `${VAR}`.
    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return None;
    }
    Some(trimmed)
}

fn parse_bool_value(value: Option<String>, name: &'static str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = sanitize_optional_value(value) else {
        return Ok(None);
    };
    let parsed = match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => return Err(ConfigError::InvalidValue { name, value: raw }),
    };
    Ok(Some(parsed))
}
