use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::{ApiError, ApiResult, WatchlistApi};
use crate::config::normalize_api_base_url;
use crate::models::wire::{
    ErrorBody, MutationAction, MutationResponse, SyncCodeCreated, SyncCodeRequest,
    SyncCodeResolved, WatchlistMutation, WatchlistResponse,
};
use crate::models::{SyncCode, UserId, Watchlist};
use crate::util::compact_text;

const HTTP_TIMEOUT_SECS: u64 = 10;

/// [`WatchlistApi`] over the service's JSON endpoints.
#[derive(Debug, Clone)]
pub struct HttpWatchlistApi {
    base_url: String,
    client: Client,
}

impl HttpWatchlistApi {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = normalize_api_base_url(base_url)
            .map_err(|error| ApiError::InvalidConfiguration(error.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn watchlist_url(&self) -> String {
        format!("{}/api/watchlist", self.base_url)
    }

    fn sync_url(&self) -> String {
        format!("{}/api/watchlist/sync", self.base_url)
    }

    async fn mutate(&self, body: &WatchlistMutation) -> ApiResult<Watchlist> {
        let request = self.client.post(self.watchlist_url()).json(body);
        let response: MutationResponse = send_json(request).await?;
        if !response.success {
            return Err(ApiError::Api("service reported an unsuccessful write".to_string()));
        }
        Ok(response.watchlist)
    }
}

impl WatchlistApi for HttpWatchlistApi {
    async fn fetch_watchlist(&self, user_id: &UserId) -> ApiResult<Watchlist> {
        let request = self
            .client
            .get(self.watchlist_url())
            .query(&[("userId", user_id.as_str())]);
        let response: WatchlistResponse = send_json(request).await?;
        Ok(response.watchlist)
    }

    async fn add_film(&self, user_id: &UserId, film_id: &str) -> ApiResult<Watchlist> {
        self.mutate(&WatchlistMutation::film(
            user_id.as_str(),
            film_id,
            MutationAction::Add,
        ))
        .await
    }

    async fn remove_film(&self, user_id: &UserId, film_id: &str) -> ApiResult<Watchlist> {
        self.mutate(&WatchlistMutation::film(
            user_id.as_str(),
            film_id,
            MutationAction::Remove,
        ))
        .await
    }

    async fn sync_watchlist(&self, user_id: &UserId, watchlist: &Watchlist) -> ApiResult<Watchlist> {
        self.mutate(&WatchlistMutation::sync(user_id.as_str(), watchlist))
            .await
    }

    async fn create_sync_code(&self, user_id: &UserId, code: &SyncCode) -> ApiResult<SyncCode> {
        let body = SyncCodeRequest {
            user_id: Some(user_id.to_string()),
            code: Some(code.to_string()),
            action: Some("create".to_string()),
        };
        let request = self.client.post(self.sync_url()).json(&body);
        let response: SyncCodeCreated = send_json(request).await?;
        SyncCode::parse(&response.code)
            .map_err(|error| ApiError::Api(format!("service returned an invalid code: {error}")))
    }

    async fn resolve_sync_code(&self, code: &SyncCode) -> ApiResult<Watchlist> {
        let request = self
            .client
            .get(self.sync_url())
            .query(&[("code", code.as_str())]);
        let response: SyncCodeResolved = send_json(request).await?;
        Ok(response.watchlist)
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<T> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_response(status, &body));
    }

    Ok(response.json::<T>().await?)
}

fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let message = parsed.as_ref().map_or_else(
        || {
            let trimmed = compact_text(body);
            if trimmed.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                format!("{} ({})", trimmed, status.as_u16())
            }
        },
        |payload| format!("{} ({})", payload.error.trim(), status.as_u16()),
    );

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
            remaining: parsed.and_then(|payload| payload.remaining).unwrap_or(0),
        },
        _ => ApiError::Api(message),
    }
}
