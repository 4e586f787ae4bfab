use crate::config::types::{Config, OutputConfig, ScraperConfig, ServerConfig, TransportConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_transport_config(&config.transport)?;
    validate_server_config(&config.server)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates scrape target and retry settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.target_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "target_url must use http or https, got '{}'",
            config.target_url
        )));
    }

    if config.fetch_attempts < 1 || config.fetch_attempts > 3 {
        return Err(ConfigError::Validation(format!(
            "fetch_attempts must be between 1 and 3, got {}",
            config.fetch_attempts
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 60 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 60, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates transport identity and proxy entries
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for proxy in &config.proxies {
        let url = Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy URL '{}': {}", proxy, e)))?;

        if !matches!(url.scheme(), "http" | "https" | "socks5") {
            return Err(ConfigError::Validation(format!(
                "Proxy URL '{}' must use http, https, or socks5",
                proxy
            )));
        }
    }

    Ok(())
}

/// Validates the read API listen address
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.listen.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("Invalid listen address '{}': {}", config.listen, e))
    })?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
