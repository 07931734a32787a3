// Configuration module entry point
// Loads the layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, FilemanConfig, HttpConfig, LoggingConfig, NameList, PerformanceConfig, ServerConfig,
};

/// Prefix of environment variables overriding file values, e.g. `FILEMAN_SERVER__PORT`
pub const ENV_PREFIX: &str = "FILEMAN";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "fileman.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::build(config::File::with_name(config_path).required(false))
    }

    /// Load configuration from TOML text on top of the defaults (environment ignored)
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        with_defaults(config::Config::builder())?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn build<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        with_defaults(config::Config::builder())?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.shutdown_timeout", 30)?
        .set_default("http.max_body_size", 104_857_600)? // 100MB
        .set_default("fileman.root", ".")?
        .set_default("fileman.context_path", "")?
        .set_default("fileman.servlet_path", "")?
        .set_default("fileman.buffer", 8192)?
        .set_default("fileman.fields", vec!["name", "size", "modified", "type"])?
        .set_default("fileman.ranges", vec!["bytes"])?
        .set_default("fileman.formatter", "html")?
        .set_default("fileman.fail_soft", true)
}
