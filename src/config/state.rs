// Application state module
// Holds the loaded configuration and the file manager service built from it

use crate::fileman::{Fileman, SetupError};

use super::types::Config;

/// Application state, shared read-only by all connections
pub struct AppState {
    pub config: Config,
    pub fileman: Fileman,
}

impl AppState {
    /// Build the file manager service described by `config`
    pub fn new(config: Config) -> Result<Self, SetupError> {
        let fileman = Fileman::from_config(&config.fileman, config.http.max_body_size)?;
        Ok(Self { config, fileman })
    }
}
