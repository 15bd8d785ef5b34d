use std::collections::HashMap;
use std::env;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use festwatch_core::models::SYNC_CODE_TTL;
use festwatch_core::util::is_http_url;
use thiserror::Error;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub namespace: String,
    pub store: StoreSettings,
    pub store_timeout: Duration,
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: u32,
    pub sync_code_ttl: Duration,
}

/// Which key-value backend the service talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreSettings {
    /// No store: reads degrade to empty lists, writes fail with `store_unavailable`.
    Disabled,
    /// Process-local store for development.
    Memory,
    /// Upstash / Vercel KV compatible REST endpoint.
    Rest(KvRuntimeConfig),
}

#[derive(Clone, PartialEq, Eq)]
pub struct KvRuntimeConfig {
    pub url: String,
    pub token: String,
}

impl fmt::Debug for KvRuntimeConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("KvRuntimeConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "FESTWATCH_API_BIND_ADDR", "127.0.0.1:8080");

        let namespace = value_or_default(&lookup, "FESTWATCH_NAMESPACE", "festwatch");
        if !namespace
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(ConfigError::Invalid(
                "FESTWATCH_NAMESPACE may only contain letters, digits, '-' and '_'".to_string(),
            ));
        }

        let store = parse_store_settings(&lookup)?;

        let store_timeout_secs = bounded_integer(&lookup, "KV_REQUEST_TIMEOUT_SECS", 5, 1..=60)?;
        let rate_limit_window_secs =
            bounded_integer(&lookup, "RATE_LIMIT_WINDOW_SECS", 60, 10..=3_600)?;
        let rate_limit_max_requests =
            bounded_integer(&lookup, "RATE_LIMIT_MAX_REQUESTS", 60, 1..=10_000)?;
        let sync_code_ttl_days = bounded_integer(
            &lookup,
            "SYNC_CODE_TTL_DAYS",
            SYNC_CODE_TTL.as_secs() / SECS_PER_DAY,
            1..=365,
        )?;

        Ok(Self {
            bind_addr,
            namespace,
            store,
            store_timeout: Duration::from_secs(store_timeout_secs),
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            rate_limit_max_requests: u32::try_from(rate_limit_max_requests).map_err(|_| {
                ConfigError::Invalid("RATE_LIMIT_MAX_REQUESTS is out of range".to_string())
            })?,
            sync_code_ttl: Duration::from_secs(sync_code_ttl_days * SECS_PER_DAY),
        })
    }
}

fn parse_store_settings(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<StoreSettings, ConfigError> {
    let mode = value_or_default(&lookup, "FESTWATCH_STORE", "auto").to_ascii_lowercase();
    match mode.as_str() {
        "auto" => Ok(parse_kv_config(&lookup)?.map_or(StoreSettings::Disabled, StoreSettings::Rest)),
        "rest" => parse_kv_config(&lookup)?
            .map(StoreSettings::Rest)
            .ok_or(ConfigError::MissingVar("KV_REST_API_URL")),
        "memory" => Ok(StoreSettings::Memory),
        "disabled" => Ok(StoreSettings::Disabled),
        other => Err(ConfigError::Invalid(format!(
            "FESTWATCH_STORE must be one of auto, rest, memory, disabled (got {other:?})"
        ))),
    }
}

fn parse_kv_config(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<KvRuntimeConfig>, ConfigError> {
    let url = optional_trimmed(&lookup, "KV_REST_API_URL")
        .or_else(|| optional_trimmed(&lookup, "UPSTASH_REDIS_REST_URL"));
    let token = optional_trimmed(&lookup, "KV_REST_API_TOKEN")
        .or_else(|| optional_trimmed(&lookup, "UPSTASH_REDIS_REST_TOKEN"));

    if url.is_none() && token.is_none() {
        return Ok(None);
    }

    let url = url.ok_or(ConfigError::MissingVar("KV_REST_API_URL"))?;
    let token = token.ok_or(ConfigError::MissingVar("KV_REST_API_TOKEN"))?;
    if !is_http_url(&url) {
        return Err(ConfigError::Invalid(
            "KV_REST_API_URL must start with http:// or https://".to_string(),
        ));
    }

    Ok(Some(KvRuntimeConfig {
        url: trim_trailing(&url).to_string(),
        token,
    }))
}

fn bounded_integer(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
    range: RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    let invalid = || {
        ConfigError::Invalid(format!(
            "{name} must be an integer in [{}, {}]",
            range.start(),
            range.end()
        ))
    };

    let value = match optional_trimmed(lookup, name) {
        Some(raw) => raw.parse::<u64>().map_err(|_| invalid())?,
        None => default,
    };
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(invalid())
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}
