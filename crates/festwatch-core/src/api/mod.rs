//! Client side of the watchlist service.
//!
//! [`WatchlistApi`] is the seam the sync manager talks through;
//! [`HttpWatchlistApi`] is the production implementation.

mod http;

pub use http::HttpWatchlistApi;

use std::future::Future;

use thiserror::Error;

use crate::models::{SyncCode, UserId, Watchlist};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Rate limited, {remaining} requests remaining in window")]
    RateLimited { remaining: u32 },
    #[error("API error: {0}")]
    Api(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Remote operations on a user's watchlist and on sync codes.
pub trait WatchlistApi: Send + Sync + 'static {
    /// Read the stored watchlist; unknown users read as empty.
    fn fetch_watchlist(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = ApiResult<Watchlist>> + Send;

    fn add_film(
        &self,
        user_id: &UserId,
        film_id: &str,
    ) -> impl Future<Output = ApiResult<Watchlist>> + Send;

    fn remove_film(
        &self,
        user_id: &UserId,
        film_id: &str,
    ) -> impl Future<Output = ApiResult<Watchlist>> + Send;

    /// Overwrite the stored watchlist with `watchlist`.
    fn sync_watchlist(
        &self,
        user_id: &UserId,
        watchlist: &Watchlist,
    ) -> impl Future<Output = ApiResult<Watchlist>> + Send;

    /// Register `code` for `user_id`. Fails with [`ApiError::Conflict`] when the
    /// code already belongs to someone else.
    fn create_sync_code(
        &self,
        user_id: &UserId,
        code: &SyncCode,
    ) -> impl Future<Output = ApiResult<SyncCode>> + Send;

    /// Look up the watchlist behind `code`; [`ApiError::NotFound`] when the code
    /// is unknown or expired.
    fn resolve_sync_code(&self, code: &SyncCode)
        -> impl Future<Output = ApiResult<Watchlist>> + Send;
}
