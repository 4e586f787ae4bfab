use serde::Deserialize;

/// Default desktop-browser identity sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Main configuration structure for garden-stock
///
/// Every field has a default, so an empty TOML file is a valid configuration
/// pointing at the production stock page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Scrape target and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Page to scrape
    #[serde(rename = "target-url", default = "default_target_url")]
    pub target_url: String,

    /// Fetch attempts per cycle before the cycle counts as failed
    #[serde(rename = "fetch-attempts", default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    /// Per-request timeout in seconds
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,
}

/// Outbound transport identity and egress options
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Optional proxy URLs; fetch attempts rotate through direct egress
    /// plus one profile per entry
    #[serde(default)]
    pub proxies: Vec<String>,
}

/// Read API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to serve the read API on
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            fetch_attempts: default_fetch_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            proxies: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_target_url() -> String {
    "https://vulcanvalues.com/grow-a-garden/stock".to_string()
}

fn default_fetch_attempts() -> u32 {
    2
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_listen() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_database_path() -> String {
    "./stock_data.db".to_string()
}
