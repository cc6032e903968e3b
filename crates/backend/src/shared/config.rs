use contracts::domain::a006_load::access::{AccessMode, StageAccessPolicy};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory uploaded attachments are written to
    pub root_dir: String,
    /// URL prefix the stored files are served under
    pub public_base_url: String,
    pub upload_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AccessConfig {
    #[serde(default)]
    pub mode: AccessMode,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/app.db"

[server]
host = "0.0.0.0"
port = 3000

[storage]
root_dir = "target/files"
public_base_url = "/files"
upload_timeout_secs = 30
max_upload_bytes = 20971520

[access]
mode = "strict"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Make the loaded configuration available to handlers
pub fn install(config: Config) -> anyhow::Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Configuration already installed"))
}

/// Stage access policy for the configured mode; strict until configured
pub fn access_policy() -> StageAccessPolicy {
    let mode = CONFIG.get().map(|c| c.access.mode).unwrap_or_default();
    StageAccessPolicy::new(mode)
}

/// Resolve a configured path; relative paths are taken relative to the
/// executable directory
pub fn resolve_path(path: &str) -> PathBuf {
    let candidate = Path::new(path);

    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(candidate);
        }
    }

    PathBuf::from(path)
}

pub fn get_database_path(config: &Config) -> PathBuf {
    resolve_path(&config.database.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.database.path, "target/db/app.db");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.public_base_url, "/files");
        assert_eq!(config.access.mode, AccessMode::Strict);
    }

    #[test]
    fn test_access_section_is_optional() {
        let text = r#"
[database]
path = "db.sqlite"

[server]
host = "127.0.0.1"
port = 8080

[storage]
root_dir = "/var/lib/files"
public_base_url = "https://cdn.example.com/files"
upload_timeout_secs = 5
max_upload_bytes = 1024
"#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.access.mode, AccessMode::Strict);
        assert_eq!(resolve_path("/var/lib/files"), PathBuf::from("/var/lib/files"));
    }

    #[test]
    fn test_preview_mode_parses() {
        let text = DEFAULT_CONFIG.replace("mode = \"strict\"", "mode = \"preview_only\"");
        let config: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.access.mode, AccessMode::PreviewOnly);
    }
}
