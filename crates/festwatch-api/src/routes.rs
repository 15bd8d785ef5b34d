use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use festwatch_core::models::wire::{
    MutationAction, MutationResponse, SyncCodeCreated, SyncCodeRequest, SyncCodeResolved,
    WatchlistMutation, WatchlistResponse,
};
use festwatch_core::util::{fingerprint, normalize_text_option};
use festwatch_core::Watchlist;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::rate_limit::{RateDecision, RateLimitMetricsSnapshot, RateLimiter};
use crate::store::{RemoteStore, StoreError, StoreKeys};
use crate::sync_code::SyncCodeService;
use crate::watchlist::{FilmChange, WatchlistService};

const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    store: RemoteStore,
    keys: StoreKeys,
    watchlists: WatchlistService,
    sync_codes: SyncCodeService,
    rate_limiter: RateLimiter,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, StoreError> {
        let store = RemoteStore::from_config(&config)?;
        Ok(Self::new(config, store))
    }

    pub fn new(config: Arc<AppConfig>, store: RemoteStore) -> Self {
        let keys = StoreKeys::new(config.namespace.clone());
        let watchlists = WatchlistService::new(store.clone(), keys.clone());
        let sync_codes = SyncCodeService::new(
            store.clone(),
            keys.clone(),
            config.sync_code_ttl,
            watchlists.clone(),
        );
        let rate_limiter = RateLimiter::from_config(&config, store.clone());
        Self {
            config,
            store,
            keys,
            watchlists,
            sync_codes,
            rate_limiter,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let watchlist_routes = Router::new()
        .route("/api/watchlist", get(read_watchlist).post(write_watchlist))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/status", get(status))
        .route("/api/debug", get(debug))
        .route(
            "/api/watchlist/sync",
            get(resolve_sync_code).post(create_sync_code),
        )
        .merge(watchlist_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let source = client_source(&request);
    let decision = state.rate_limiter.check(&source).await?;

    let mut response = next.run(request).await;
    if let RateDecision::Allowed { remaining } = decision {
        let headers = response.headers_mut();
        headers.insert(
            RATE_LIMIT_LIMIT_HEADER,
            HeaderValue::from(state.rate_limiter.max_requests()),
        );
        headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(remaining));
    }
    Ok(response)
}

/// First forwarded hop, then the proxy's real-ip header, then the socket peer.
fn client_source(request: &Request) -> String {
    forwarded_source(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_source(headers: &HeaderMap) -> Option<String> {
    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    header_text("x-forwarded-for")
        .and_then(|value| value.split(',').next().map(str::to_string))
        .and_then(|value| normalize_text_option(Some(value)))
        .or_else(|| normalize_text_option(header_text("x-real-ip")))
}

#[derive(Debug, Deserialize)]
struct WatchlistQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

async fn read_watchlist(
    State(state): State<AppState>,
    query: Result<Query<WatchlistQuery>, QueryRejection>,
) -> Result<Json<WatchlistResponse>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let user_id = required(query.user_id, "userId")?;
    Ok(Json(state.watchlists.read(&user_id).await))
}

async fn write_watchlist(
    State(state): State<AppState>,
    body: Result<Json<WatchlistMutation>, JsonRejection>,
) -> Result<Json<MutationResponse>, AppError> {
    let Json(mutation) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let user_id = required(mutation.user_id, "userId")?;
    let raw_action = required(mutation.action, "action")?;
    let action = MutationAction::parse(&raw_action)
        .ok_or_else(|| AppError::bad_request(format!("Invalid action: {raw_action}")))?;

    let watchlist = match action {
        MutationAction::Add | MutationAction::Remove => {
            let film_id = required(mutation.film_id, "filmId")?;
            let change = if action == MutationAction::Add {
                FilmChange::Add
            } else {
                FilmChange::Remove
            };
            state.watchlists.apply(&user_id, &film_id, change).await?
        }
        MutationAction::Sync => {
            let ids = mutation
                .watchlist
                .ok_or_else(|| AppError::bad_request("Missing required field: watchlist"))?;
            state
                .watchlists
                .replace(&user_id, &Watchlist::from_ids(ids))
                .await?
        }
    };

    tracing::info!(
        endpoint = "watchlist_write",
        user = fingerprint(&user_id),
        action = action.as_str(),
        films = watchlist.len(),
        "Updated watchlist"
    );
    Ok(Json(MutationResponse {
        success: true,
        watchlist,
    }))
}

async fn create_sync_code(
    State(state): State<AppState>,
    body: Result<Json<SyncCodeRequest>, JsonRejection>,
) -> Result<Json<SyncCodeCreated>, AppError> {
    let Json(request) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let user_id = required(request.user_id, "userId")?;
    let code = required(request.code, "code")?;
    let action = required(request.action, "action")?;
    if action != "create" {
        return Err(AppError::bad_request(format!("Invalid action: {action}")));
    }

    let code = state.sync_codes.create(&user_id, &code).await?;
    tracing::info!(
        endpoint = "sync_code_create",
        user = fingerprint(&user_id),
        "Registered sync code"
    );
    Ok(Json(SyncCodeCreated {
        success: true,
        code,
    }))
}

#[derive(Debug, Deserialize)]
struct SyncCodeQuery {
    code: Option<String>,
}

async fn resolve_sync_code(
    State(state): State<AppState>,
    query: Result<Query<SyncCodeQuery>, QueryRejection>,
) -> Result<Json<SyncCodeResolved>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let code = required(query.code, "code")?;
    let (code, watchlist) = state.sync_codes.resolve(&code).await?;
    Ok(Json(SyncCodeResolved { watchlist, code }))
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    normalize_text_option(value)
        .ok_or_else(|| AppError::bad_request(format!("Missing required field: {field}")))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    status: &'static str,
    store_configured: bool,
    backend: &'static str,
    watchlists: usize,
    sync_codes: usize,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugResponse {
    #[serde(flatten)]
    status: StatusResponse,
    namespace: String,
    rate_limit_keys: usize,
    rate_limit: RateLimitMetricsSnapshot,
    rate_limit_window_secs: u64,
    rate_limit_max_requests: u32,
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(store_status(&state).await?))
}

async fn debug(State(state): State<AppState>) -> Result<Json<DebugResponse>, AppError> {
    let status = store_status(&state).await?;
    let rate_limit_keys = count_keys(&state, &state.keys.rate_limit_prefix()).await?;
    Ok(Json(DebugResponse {
        status,
        namespace: state.keys.namespace().to_string(),
        rate_limit_keys,
        rate_limit: state.rate_limiter.metrics_snapshot(),
        rate_limit_window_secs: state.rate_limiter.window().as_secs(),
        rate_limit_max_requests: state.rate_limiter.max_requests(),
    }))
}

async fn store_status(state: &AppState) -> Result<StatusResponse, AppError> {
    let store_configured = state.store.is_configured();
    Ok(StatusResponse {
        status: if store_configured { "ok" } else { "degraded" },
        store_configured,
        backend: state.store.backend_label(),
        watchlists: count_keys(state, &state.keys.watchlist_prefix()).await?,
        sync_codes: count_keys(state, &state.keys.sync_prefix()).await?,
        timestamp: Utc::now().timestamp(),
    })
}

async fn count_keys(state: &AppState, prefix: &str) -> Result<usize, AppError> {
    if !state.store.is_configured() {
        return Ok(0);
    }
    Ok(state.store.scan_prefix(prefix).await?.len())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{self, header, Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use festwatch_core::api::{ApiError, HttpWatchlistApi, WatchlistApi};
    use festwatch_core::storage::MemoryLocalStore;
    use festwatch_core::{MutationOutcome, SyncCode, UserId, WatchlistManager};

    use super::*;
    use crate::store::MemoryKv;

    fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig::from_lookup(|_| None).unwrap())
    }

    fn router_with(store: RemoteStore) -> Router {
        app_router(AppState::new(test_config(), store))
    }

    fn memory_router() -> (Router, MemoryKv) {
        let kv = MemoryKv::default();
        (router_with(RemoteStore::memory(kv.clone())), kv)
    }

    fn post_json(uri: &str, body: &Value) -> http::Request<Body> {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> http::Request<Body> {
        http::Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap()
    }

    async fn send(router: &Router, request: http::Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn add(user: &str, film: &str) -> Value {
        json!({ "userId": user, "filmId": film, "action": "add" })
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (router, _) = memory_router();
        let (status, _, body) = send(&router, get_request("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn add_then_read_round_trips() {
        let (router, _) = memory_router();
        let (status, headers, body) = send(&router, post_json("/api/watchlist", &add("u1", "f1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "watchlist": ["f1"] }));
        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "60");
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "59");

        let (status, _, body) = send(&router, get_request("/api/watchlist?userId=u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "watchlist": ["f1"], "source": "store" }));
    }

    #[tokio::test]
    async fn add_and_remove_are_idempotent() {
        let (router, _) = memory_router();
        send(&router, post_json("/api/watchlist", &add("u1", "f1"))).await;
        let (_, _, body) = send(&router, post_json("/api/watchlist", &add("u1", "f1"))).await;
        assert_eq!(body["watchlist"], json!(["f1"]));

        let remove = json!({ "userId": "u1", "filmId": "f1", "action": "remove" });
        send(&router, post_json("/api/watchlist", &remove)).await;
        let (status, _, body) = send(&router, post_json("/api/watchlist", &remove)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["watchlist"], json!([]));
    }

    #[tokio::test]
    async fn full_sync_overwrites_stored_list() {
        let (router, _) = memory_router();
        send(&router, post_json("/api/watchlist", &add("u1", "old"))).await;

        let sync = json!({ "userId": "u1", "watchlist": ["a", "b", "a"], "action": "sync" });
        let (status, _, body) = send(&router, post_json("/api/watchlist", &sync)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["watchlist"], json!(["a", "b"]));

        let (_, _, body) = send(&router, get_request("/api/watchlist?userId=u1")).await;
        assert_eq!(body["watchlist"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn validation_failures_are_bad_requests() {
        let (router, kv) = memory_router();

        let cases = [
            json!({ "filmId": "f1", "action": "add" }),
            json!({ "userId": "u1", "action": "add" }),
            json!({ "userId": " ", "filmId": "f1", "action": "add" }),
            json!({ "userId": "u1", "filmId": "f1" }),
            json!({ "userId": "u1", "filmId": "f1", "action": "upsert" }),
            json!({ "userId": "u1", "action": "sync" }),
            json!({ "userId": "u1", "watchlist": "f1", "action": "sync" }),
        ];
        for case in cases {
            let (status, _, body) = send(&router, post_json("/api/watchlist", &case)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{case}");
            assert_eq!(body["code"], "invalid_request");
        }

        let (status, _, _) = send(&router, get_request("/api/watchlist")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(kv.get("festwatch:watchlist:u1").await, None);
    }

    #[tokio::test]
    async fn sixty_first_request_in_window_is_rejected() {
        let (router, _) = memory_router();

        for index in 1..=60 {
            let (status, headers, _) =
                send(&router, post_json("/api/watchlist", &add("u1", "f1"))).await;
            assert_eq!(status, StatusCode::OK, "request {index}");
            if index == 60 {
                assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "0");
            }
        }

        let (status, headers, body) = send(&router, post_json("/api/watchlist", &add("u1", "f1"))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], "rate_limited");
        assert_eq!(body["remaining"], 0);
        assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "60");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_window_resets_after_expiry() {
        let (router, _) = memory_router();
        for _ in 0..60 {
            send(&router, get_request("/api/watchlist?userId=u1")).await;
        }
        let (status, _, _) = send(&router, get_request("/api/watchlist?userId=u1")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        tokio::time::advance(Duration::from_secs(61)).await;
        let (status, headers, _) = send(&router, get_request("/api/watchlist?userId=u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "59");
    }

    #[tokio::test(start_paused = true)]
    async fn counter_left_without_expiry_still_resets() {
        let (router, kv) = memory_router();
        kv.set("festwatch:ratelimit:203.0.113.7", "60", None).await;

        let (status, _, _) = send(&router, get_request("/api/watchlist?userId=u1")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        tokio::time::advance(Duration::from_secs(61)).await;
        let (status, headers, _) = send(&router, get_request("/api/watchlist?userId=u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "59");
    }

    #[test]
    fn source_prefers_forwarded_then_real_ip() {
        let mut headers = HeaderMap::new();
        assert_eq!(forwarded_source(&headers), None);

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(forwarded_source(&headers).as_deref(), Some("198.51.100.2"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(forwarded_source(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn unconfigured_store_degrades_reads_and_fails_writes() {
        let router = router_with(RemoteStore::unavailable());

        let (status, headers, body) = send(&router, get_request("/api/watchlist?userId=u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "watchlist": [], "source": "unconfigured" }));
        assert!(headers.get("x-ratelimit-remaining").is_none());

        let (status, _, body) = send(&router, post_json("/api/watchlist", &add("u1", "f1"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "store_unavailable");

        let create = json!({ "userId": "u1", "code": "ABCDEF", "action": "create" });
        let (status, _, body) = send(&router, post_json("/api/watchlist/sync", &create)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "store_unavailable");
    }

    #[tokio::test]
    async fn broken_counter_fails_open() {
        let (router, kv) = memory_router();
        kv.set("festwatch:ratelimit:203.0.113.7", "garbage", None).await;

        for _ in 0..70 {
            let (status, _, _) = send(&router, post_json("/api/watchlist", &add("u1", "f1"))).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn sync_code_round_trip_is_case_insensitive() {
        let (router, _) = memory_router();
        send(&router, post_json("/api/watchlist", &add("owner", "f1"))).await;
        send(&router, post_json("/api/watchlist", &add("owner", "f2"))).await;

        let create = json!({ "userId": "owner", "code": "xk4p9m", "action": "create" });
        let (status, _, body) = send(&router, post_json("/api/watchlist/sync", &create)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "code": "XK4P9M" }));

        let (status, _, body) = send(&router, get_request("/api/watchlist/sync?code=xK4p9M")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "watchlist": ["f1", "f2"], "code": "XK4P9M" }));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_and_unknown_codes_are_not_found() {
        let (router, _) = memory_router();
        let create = json!({ "userId": "owner", "code": "ABCDEF", "action": "create" });
        send(&router, post_json("/api/watchlist/sync", &create)).await;

        tokio::time::advance(Duration::from_secs(30 * 24 * 60 * 60 + 1)).await;
        let (status, _, body) = send(&router, get_request("/api/watchlist/sync?code=ABCDEF")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");

        let (status, _, _) = send(&router, get_request("/api/watchlist/sync?code=ZZZZZZ")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unusual_code_shapes_resolve_to_not_found() {
        let (router, _) = memory_router();

        for uri in [
            "/api/watchlist/sync?code=AB-123",
            "/api/watchlist/sync?code=AB",
            "/api/watchlist/sync?code=ab%21cd",
        ] {
            let (status, _, body) = send(&router, get_request(uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["code"], "not_found");
        }

        let (status, _, _) = send(&router, get_request("/api/watchlist/sync?code=%20%20")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sync_code_validation_and_collision() {
        let (router, _) = memory_router();

        let (status, _, _) = send(&router, get_request("/api/watchlist/sync")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let wrong_action = json!({ "userId": "a", "code": "ABCDEF", "action": "delete" });
        let (status, _, _) = send(&router, post_json("/api/watchlist/sync", &wrong_action)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing_code = json!({ "userId": "a", "action": "create" });
        let (status, _, _) = send(&router, post_json("/api/watchlist/sync", &missing_code)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let first = json!({ "userId": "a", "code": "ABCDEF", "action": "create" });
        let (status, _, _) = send(&router, post_json("/api/watchlist/sync", &first)).await;
        assert_eq!(status, StatusCode::OK);

        let second = json!({ "userId": "b", "code": "abcdef", "action": "create" });
        let (status, _, body) = send(&router, post_json("/api/watchlist/sync", &second)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "code_conflict");
    }

    #[tokio::test]
    async fn status_and_debug_count_records() {
        let (router, _) = memory_router();
        send(&router, post_json("/api/watchlist", &add("u1", "f1"))).await;
        send(&router, post_json("/api/watchlist", &add("u2", "f1"))).await;
        let create = json!({ "userId": "u1", "code": "ABCDEF", "action": "create" });
        send(&router, post_json("/api/watchlist/sync", &create)).await;

        let (status, _, body) = send(&router, get_request("/api/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["storeConfigured"], true);
        assert_eq!(body["backend"], "memory");
        assert_eq!(body["watchlists"], 2);
        assert_eq!(body["syncCodes"], 1);

        let (status, _, body) = send(&router, get_request("/api/debug")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["namespace"], "festwatch");
        assert_eq!(body["rateLimitKeys"], 1);
        assert_eq!(body["rateLimit"]["allowed"], 2);
        assert_eq!(body["rateLimitMaxRequests"], 60);
        assert_eq!(body["watchlists"], 2);
    }

    #[tokio::test]
    async fn status_without_store_reports_zero_counts() {
        let router = router_with(RemoteStore::unavailable());
        let (status, _, body) = send(&router, get_request("/api/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["storeConfigured"], false);
        assert_eq!(body["backend"], "none");
        assert_eq!(body["watchlists"], 0);
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn http_client_round_trips_through_router() {
        let (router, _) = memory_router();
        let api = HttpWatchlistApi::new(&serve(router).await).unwrap();
        let owner = UserId::parse("owner-device").unwrap();
        let other = UserId::parse("other-device").unwrap();

        assert_eq!(
            api.add_film(&owner, "f1").await.unwrap(),
            Watchlist::from_ids(["f1"])
        );
        api.add_film(&owner, "f2").await.unwrap();
        assert_eq!(
            api.remove_film(&owner, "f1").await.unwrap(),
            Watchlist::from_ids(["f2"])
        );
        assert_eq!(
            api.fetch_watchlist(&owner).await.unwrap(),
            Watchlist::from_ids(["f2"])
        );
        assert_eq!(
            api.sync_watchlist(&owner, &Watchlist::from_ids(["a", "b"]))
                .await
                .unwrap(),
            Watchlist::from_ids(["a", "b"])
        );

        let code = SyncCode::parse("xk4p9m").unwrap();
        assert_eq!(api.create_sync_code(&owner, &code).await.unwrap(), code);
        assert_eq!(
            api.resolve_sync_code(&code).await.unwrap(),
            Watchlist::from_ids(["a", "b"])
        );

        assert!(matches!(
            api.create_sync_code(&other, &code).await,
            Err(ApiError::Conflict(_))
        ));
        assert!(matches!(
            api.resolve_sync_code(&SyncCode::parse("ZZZZZZ").unwrap()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn managers_share_a_list_over_http() {
        let (router, _) = memory_router();
        let base_url = serve(router).await;

        let phone = WatchlistManager::new(
            HttpWatchlistApi::new(&base_url).unwrap(),
            MemoryLocalStore::default(),
        );
        phone.initialize().await;
        assert_eq!(phone.add("f1").await, MutationOutcome::Applied);
        assert_eq!(phone.add("f2").await, MutationOutcome::Applied);
        let code = phone.generate_sync_code().await.unwrap();

        let laptop = WatchlistManager::new(
            HttpWatchlistApi::new(&base_url).unwrap(),
            MemoryLocalStore::default(),
        );
        laptop.initialize().await;
        assert!(laptop.load_from_sync_code(&code.as_str().to_lowercase()).await);
        assert_eq!(laptop.watchlist(), Watchlist::from_ids(["f1", "f2"]));
        assert!(!laptop.load_from_sync_code("QQQQQQ").await);
    }
}
