mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./booksearch.toml",
        "./config.toml",
        "~/.config/booksearch/config.toml",
        "/etc/booksearch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.cache.capacity == 0 {
        anyhow::bail!("Cache capacity must be greater than 0");
    }

    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("Fetch timeout must be greater than 0");
    }

    let providers = [
        (
            "isbndb",
            &config.isbndb.base_url,
            &config.isbndb.api_key,
            config.isbndb.requests_per_second,
        ),
        (
            "google_books",
            &config.google_books.base_url,
            &config.google_books.api_key,
            config.google_books.requests_per_second,
        ),
    ];

    for (name, base_url, api_key, rate) in providers {
        if base_url.trim().is_empty() {
            anyhow::bail!("Provider '{}' has an empty base_url", name);
        }
        if rate == 0 {
            anyhow::bail!("Provider '{}' requests_per_second must be greater than 0", name);
        }
        if api_key.is_empty() {
            tracing::warn!("Provider '{}' has no API key configured", name);
        }
    }

    Ok(())
}
