//! JSON bodies exchanged between clients and the watchlist service.
//!
//! Request fields are optional so the service can answer a missing field with
//! its own `invalid_request` error instead of a generic decode failure.

use serde::{Deserialize, Serialize};

use super::Watchlist;

/// Where a `GET /api/watchlist` answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchlistSource {
    /// Read from the key-value store (an unknown user reads as empty).
    Store,
    /// The service has no store configured.
    Unconfigured,
    /// The store failed; the empty list is a degraded answer.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistResponse {
    pub watchlist: Watchlist,
    pub source: WatchlistSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationAction {
    Add,
    Remove,
    Sync,
}

impl MutationAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "sync" => Some(Self::Sync),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Sync => "sync",
        }
    }
}

/// Body of `POST /api/watchlist`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistMutation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watchlist: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl WatchlistMutation {
    pub fn film(user_id: &str, film_id: &str, action: MutationAction) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            film_id: Some(film_id.to_string()),
            watchlist: None,
            action: Some(action.as_str().to_string()),
        }
    }

    pub fn sync(user_id: &str, watchlist: &Watchlist) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            film_id: None,
            watchlist: Some(watchlist.as_slice().to_vec()),
            action: Some(MutationAction::Sync.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub watchlist: Watchlist,
}

/// Body of `POST /api/watchlist/sync`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCodeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCodeCreated {
    pub success: bool,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCodeResolved {
    pub watchlist: Watchlist,
    pub code: String,
}

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mutation_uses_camel_case_fields() {
        let body = WatchlistMutation::film("u1", "f1", MutationAction::Add);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"userId": "u1", "filmId": "f1", "action": "add"})
        );
    }

    #[test]
    fn mutation_tolerates_missing_fields() {
        let body: WatchlistMutation = serde_json::from_str(r#"{"action":"add"}"#).unwrap();
        assert_eq!(body.user_id, None);
        assert_eq!(body.film_id, None);
    }

    #[test]
    fn action_parse_rejects_unknown() {
        assert_eq!(MutationAction::parse("add"), Some(MutationAction::Add));
        assert_eq!(MutationAction::parse("sync"), Some(MutationAction::Sync));
        assert_eq!(MutationAction::parse("clear"), None);
    }

    #[test]
    fn source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WatchlistSource::Unconfigured).unwrap(),
            "\"unconfigured\""
        );
    }
}
