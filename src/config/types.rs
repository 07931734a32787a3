// Configuration types
// Deserialized from the layered sources assembled in `config::Config::load_from`

use serde::Deserialize;

/// Everything the binary reads at startup
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub fileman: FilemanConfig,
}

/// `[server]`: where to listen
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Runtime worker threads, one per core when unset
    pub workers: Option<usize>,
}

/// `[logging]`
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `info`, `warn` or `error`
    pub level: String,
    pub access_log: bool,
    /// `combined`, `common`, `json`, or a `$variable` template
    pub access_log_format: String,
    /// Info and access lines go to stdout when unset
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Warnings and errors go to stderr when unset
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// `[performance]`, all timeouts in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// 0 disables keep-alive
    pub keep_alive_timeout: u64,
    /// Time allowed for a request head to arrive, 0 for none
    pub read_timeout: u64,
    /// Grace period for open connections once shutdown starts
    pub shutdown_timeout: u64,
    pub max_connections: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Request body limit in bytes
    pub max_body_size: u64,
}

/// File manager configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FilemanConfig {
    /// Served directory
    pub root: String,
    /// Mount prefixes stripped from every request path
    #[serde(default)]
    pub context_path: String,
    #[serde(default)]
    pub servlet_path: String,
    /// I/O buffer size in bytes
    pub buffer: usize,
    /// Converter identifiers, in column order
    pub fields: NameList,
    /// Extractor identifiers, later ones override earlier ones
    pub ranges: NameList,
    /// Formatter identifier
    pub formatter: String,
    /// Degrade failing converters to an empty value instead of failing the listing
    pub fail_soft: bool,
}

/// Ordered identifier list, given either as an array or as one string
///
/// The string form is split on commas and whitespace, so `"name, size\n type"` works
/// from a file as well as from an environment variable.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum NameList {
    List(Vec<String>),
    Text(String),
}

impl NameList {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::List(names) => names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .collect(),
            Self::Text(text) => text
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }
}
