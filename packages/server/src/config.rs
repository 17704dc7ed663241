use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The storage node whose HTTP API is being proxied.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the node's HTTP API, e.g. `http://127.0.0.1:5001`.
    pub url: String,
    /// Timeout for a single forwarded request, in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `postgres://...`, or `memory` for a non-durable in-process store.
    pub url: String,
}

impl DatabaseConfig {
    pub const MEMORY: &'static str = "memory";

    pub fn is_memory(&self) -> bool {
        self.url == Self::MEMORY
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("PIN_PROXY_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("backend.url", "http://127.0.0.1:5001")?
            .set_default("backend.timeout_secs", 300_i64)?
            .set_default("database.url", DatabaseConfig::MEMORY)?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., PIN_PROXY__DATABASE__URL)
            .add_source(Environment::with_prefix("PIN_PROXY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
