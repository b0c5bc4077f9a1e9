use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub listen_addr: String,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    /// 0 disables rate limiting.
    pub rate_limit_permits: u32,
    pub rate_limit_window_secs: u64,
    pub overdue_poll_interval_secs: u64,
    pub log_dir: String,
    pub db_max_connections: u32,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
    cors_allowed_origins: Option<String>,
    rate_limit_permits: Option<u32>,
    rate_limit_window_secs: Option<u64>,
    overdue_poll_interval_secs: Option<u64>,
    log_dir: Option<String>,
    db_max_connections: Option<u32>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ServerConfig {
    /// Defaults, then the optional TOML file, then environment variables
    /// (after `.env` is loaded). Later layers win.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let contents = fs::read_to_string(path_str).map_err(|source| ConfigError::Read {
                    path: path_str.to_string(),
                    source,
                })?;
                Self::parse_toml(path_str, &contents)?
            }
            _ => PartialServerConfig::default(),
        };

        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()?;

        Self::merge(file_config, env_config)
    }

    pub fn parse_toml(path: &str, contents: &str) -> Result<PartialServerConfig, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn merge(
        file_config: PartialServerConfig,
        env_config: PartialServerConfig,
    ) -> Result<Self, ConfigError> {
        let cors_allowed_origins = env_config
            .cors_allowed_origins
            .or(file_config.cors_allowed_origins)
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ServerConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            jwt_secret: env_config
                .jwt_secret
                .or(file_config.jwt_secret)
                .ok_or(ConfigError::Missing("JWT_SECRET"))?,
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            cors_allowed_origins,
            rate_limit_permits: env_config
                .rate_limit_permits
                .or(file_config.rate_limit_permits)
                .unwrap_or(100),
            rate_limit_window_secs: env_config
                .rate_limit_window_secs
                .or(file_config.rate_limit_window_secs)
                .unwrap_or(60)
                .max(1),
            overdue_poll_interval_secs: env_config
                .overdue_poll_interval_secs
                .or(file_config.overdue_poll_interval_secs)
                .unwrap_or(60)
                .max(1),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            db_max_connections: env_config
                .db_max_connections
                .or(file_config.db_max_connections)
                .unwrap_or(10),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn overdue_poll_interval(&self) -> Duration {
        Duration::from_secs(self.overdue_poll_interval_secs)
    }
}
