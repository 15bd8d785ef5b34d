use std::time::Duration;

use festwatch_core::util::compact_text;
use serde::Deserialize;
use serde_json::Value;

use super::{ScanPage, StoreError, StoreResult};
use crate::config::KvRuntimeConfig;

/// Client for Upstash / Vercel KV style REST endpoints: each command is a
/// JSON array posted to the base URL, answered by `{"result": ...}` or
/// `{"error": "..."}`.
#[derive(Debug, Clone)]
pub struct RestKvClient {
    client: reqwest::Client,
    config: KvRuntimeConfig,
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl RestKvClient {
    pub fn new(config: KvRuntimeConfig, timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| StoreError::Http(sanitize(&error)))?;
        Ok(Self { client, config })
    }

    async fn command(&self, args: &[&str]) -> StoreResult<Value> {
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.token)
            .header("Accept", "application/json")
            .json(args)
            .send()
            .await
            .map_err(|error| StoreError::Http(sanitize(&error)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| StoreError::Http(sanitize(&error)))?;

        let parsed = serde_json::from_str::<CommandResponse>(&body).ok();
        if let Some(message) = parsed.as_ref().and_then(|payload| payload.error.clone()) {
            return Err(StoreError::Command(message));
        }
        if !status.is_success() {
            return Err(StoreError::Http(format!(
                "HTTP {}: {}",
                status.as_u16(),
                compact_text(&body)
            )));
        }

        parsed.map(|payload| payload.result).ok_or_else(|| {
            StoreError::Protocol(format!("undecodable body: {}", compact_text(&body)))
        })
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        decode_optional_string(self.command(&["GET", key]).await?)
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let result = match ttl {
            Some(ttl) => {
                let seconds = ttl.as_secs().max(1).to_string();
                self.command(&["SET", key, value, "EX", &seconds]).await?
            }
            None => self.command(&["SET", key, value]).await?,
        };
        match result {
            Value::String(reply) if reply == "OK" => Ok(()),
            other => Err(StoreError::Protocol(format!("SET replied {other}"))),
        }
    }

    pub async fn increment(&self, key: &str) -> StoreResult<i64> {
        decode_integer(&self.command(&["INCR", key]).await?)
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let seconds = ttl.as_secs().max(1).to_string();
        let reply = decode_integer(&self.command(&["EXPIRE", key, &seconds]).await?)?;
        Ok(reply == 1)
    }

    pub async fn expire_if_unset(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let seconds = ttl.as_secs().max(1).to_string();
        let reply = decode_integer(&self.command(&["EXPIRE", key, &seconds, "NX"]).await?)?;
        Ok(reply == 1)
    }

    pub async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let seconds = ttl.as_secs().max(1).to_string();
        match self
            .command(&["SET", key, value, "NX", "EX", &seconds])
            .await?
        {
            Value::String(reply) if reply == "OK" => Ok(true),
            Value::Null => Ok(false),
            other => Err(StoreError::Protocol(format!("SET NX replied {other}"))),
        }
    }

    pub async fn scan(&self, cursor: &str, pattern: &str, count: usize) -> StoreResult<ScanPage> {
        let count = count.to_string();
        let reply = self
            .command(&["SCAN", cursor, "MATCH", pattern, "COUNT", &count])
            .await?;
        decode_scan_page(reply)
    }
}

fn decode_optional_string(value: Value) -> StoreResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        other => Err(StoreError::Protocol(format!("expected string, got {other}"))),
    }
}

fn decode_integer(value: &Value) -> StoreResult<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| StoreError::Protocol(format!("expected integer, got {number}"))),
        Value::String(text) => text
            .parse::<i64>()
            .map_err(|_| StoreError::Protocol(format!("expected integer, got {text:?}"))),
        other => Err(StoreError::Protocol(format!("expected integer, got {other}"))),
    }
}

fn decode_scan_page(value: Value) -> StoreResult<ScanPage> {
    let Value::Array(mut parts) = value else {
        return Err(StoreError::Protocol("SCAN reply is not an array".to_string()));
    };
    if parts.len() != 2 {
        return Err(StoreError::Protocol(format!(
            "SCAN reply has {} elements",
            parts.len()
        )));
    }

    let keys = match parts.pop() {
        Some(Value::Array(keys)) => keys
            .into_iter()
            .map(|key| match key {
                Value::String(key) => Ok(key),
                other => Err(StoreError::Protocol(format!("SCAN key is {other}"))),
            })
            .collect::<StoreResult<Vec<_>>>()?,
        _ => return Err(StoreError::Protocol("SCAN keys are not an array".to_string())),
    };
    let cursor = match parts.pop() {
        Some(Value::String(cursor)) => cursor,
        Some(Value::Number(cursor)) => cursor.to_string(),
        _ => return Err(StoreError::Protocol("SCAN cursor is missing".to_string())),
    };

    Ok(ScanPage { cursor, keys })
}

fn sanitize(error: &impl std::fmt::Display) -> String {
    error.to_string().replace('\n', " ").trim().to_string()
}
