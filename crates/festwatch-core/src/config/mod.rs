//! Client configuration.
//!
//! Resolves where the watchlist service lives and where device-local state is
//! kept. Values come from explicit overrides first, then the environment, then
//! built-in defaults.

use std::path::PathBuf;

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

/// Environment variable holding the watchlist service base URL.
pub const API_URL_ENV: &str = "FESTWATCH_API_URL";

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080";

const DATA_DIR_NAME: &str = "festwatch";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URL without trailing slash.
    pub api_base_url: String,
    /// Directory holding the local identity and watchlist snapshot.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Resolve configuration from overrides, the environment value and the
    /// platform data directory (in that order of preference).
    pub fn resolve(
        api_url_override: Option<String>,
        api_url_env: Option<String>,
        data_dir_override: Option<PathBuf>,
        platform_data_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let raw_url = normalize_text_option(api_url_override)
            .or_else(|| normalize_text_option(api_url_env))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = normalize_api_base_url(&raw_url)?;

        let data_dir = data_dir_override
            .or_else(|| platform_data_dir.map(|dir| dir.join(DATA_DIR_NAME)))
            .ok_or_else(|| {
                Error::InvalidInput(
                    "no data directory available; pass one explicitly".to_string(),
                )
            })?;

        Ok(Self {
            api_base_url,
            data_dir,
        })
    }
}

/// Validate a service base URL and strip trailing slashes.
pub fn normalize_api_base_url(raw: &str) -> Result<String> {
    let value = normalize_text_option(Some(raw.to_string()))
        .ok_or_else(|| Error::InvalidInput("API base URL must not be empty".to_string()))?;
    if is_http_url(&value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
