use axum::{
    debug_handler,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use flashload_core::{
    ALREADY_PURCHASED_MARKER, FORCED_FAILURE_SENTINEL, PRECHECK_PATH, SOLD_OUT_MARKER,
    SPOOF_HEADER,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
#[allow(unused)]
use metrics::{counter, gauge, histogram};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Behaviour of the mock precheck endpoint.
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Units available before every purchase answers `SOLD_OUT`.
    pub stock: u64,
    /// Requests per second accepted before answering 429.
    pub max_rps: Option<NonZeroU32>,
    /// Artificial processing time per request.
    pub delay: Duration,
    /// Take the buyer identity from the `X-User-ID` header when present. A correct service
    /// never does this.
    pub trust_client_header: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            stock: 1_000,
            max_rps: None,
            delay: Duration::ZERO,
            trust_client_header: false,
        }
    }
}

struct Inventory {
    stock: u64,
    buyers: HashSet<String>,
}

struct AppState {
    config: MockConfig,
    limiter: Option<DefaultDirectRateLimiter>,
    inventory: Mutex<Inventory>,
}

pub fn router(config: MockConfig) -> Router {
    let state = AppState {
        limiter: config
            .max_rps
            .map(|rps| RateLimiter::direct(Quota::per_second(rps))),
        inventory: Mutex::new(Inventory {
            stock: config.stock,
            buyers: HashSet::new(),
        }),
        config,
    };

    Router::new()
        .route(PRECHECK_PATH, post(precheck))
        .with_state(Arc::new(state))
}

/// Serve on an ephemeral local port in the background.
pub async fn spawn(config: MockConfig) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(config);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Mock service stopped: {e}");
        }
    });
    Ok(addr)
}

#[derive(Deserialize)]
struct PrecheckRequest {
    user_id: Option<String>,
    #[serde(alias = "product")]
    product_id: Option<Value>,
}

type Reply = (StatusCode, Json<Value>);

fn reply(status: StatusCode, code: &str, message: &str) -> Reply {
    counter!("mock_service.precheck", "status" => status.as_str().to_string()).increment(1);
    (status, Json(json!({ "status": code, "message": message })))
}

#[debug_handler]
async fn precheck(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Reply {
    if !state.config.delay.is_zero() {
        tokio::time::sleep(state.config.delay).await;
    }

    let Ok(req) = serde_json::from_slice::<PrecheckRequest>(&body) else {
        return reply(StatusCode::BAD_REQUEST, "BAD_REQUEST", "invalid body");
    };

    let claimed = headers
        .get(SPOOF_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|_| state.config.trust_client_header)
        .map(str::to_string);

    let (Some(user), Some(_product)) = (claimed.or(req.user_id), req.product_id) else {
        return reply(
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            "user_id and product_id are required",
        );
    };

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            return reply(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", "slow down");
        }
    }

    if user == FORCED_FAILURE_SENTINEL {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, "ERROR", "forced failure");
    }

    let mut inventory = state
        .inventory
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if inventory.buyers.contains(&user) {
        debug!("Duplicate purchase by {user}");
        return reply(
            StatusCode::CONFLICT,
            ALREADY_PURCHASED_MARKER,
            "user already purchased",
        );
    }
    if inventory.stock == 0 {
        return reply(StatusCode::CONFLICT, SOLD_OUT_MARKER, "sold out");
    }
    inventory.stock -= 1;
    inventory.buyers.insert(user);

    reply(StatusCode::OK, "OK", "precheck passed")
}
