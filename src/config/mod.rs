//! Configuration module for garden-stock
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every field has a default, so a minimal (even empty) file is valid.
//!
//! # Example
//!
//! ```no_run
//! use garden_stock::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Scraping {} every cycle", config.scraper.target_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, ScraperConfig, ServerConfig, TransportConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
