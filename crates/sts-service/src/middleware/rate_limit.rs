//! Fixed-window rate limiting for `/api/*` routes.
//!
//! Every response carries `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset`. A rejected request gets 429 with `Retry-After`.

use crate::models::RateLimitInfo;
use crate::observability::hash_for_correlation;
use crate::routes::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Address used when neither proxy headers nor the socket peer are known.
const UNKNOWN_ADDRESS: &str = "unknown";

#[derive(Debug, Serialize)]
pub struct RateLimitExceededBody {
    pub error: &'static str,
    pub message: &'static str,
    pub limit: u64,
    pub remaining: u64,
    pub reset_in_seconds: i64,
}

#[tracing::instrument(skip_all, name = "sts.middleware.rate_limit")]
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !state.service.rate_limiting_enabled() {
        return next.run(req).await;
    }

    let address = client_address(&req);
    let limited = state.service.is_rate_limited(&address).await;
    let info = state.service.rate_limit_info(&address).await;

    if limited {
        tracing::info!(
            target: "sts.http",
            address = %hash_for_correlation(&address),
            "Rejected rate-limited request"
        );
        return rejection(&info);
    }

    let mut response = next.run(req).await;
    apply_headers(response.headers_mut(), &info);
    response
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// the socket peer.
pub fn client_address(req: &Request) -> String {
    let headers = req.headers();

    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(address) = forwarded {
        return address.to_string();
    }

    if let Some(address) = header_str(headers, "x-real-ip")
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return address.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| UNKNOWN_ADDRESS.to_string(), |ConnectInfo(addr)| addr.ip().to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn rejection(info: &RateLimitInfo) -> Response {
    let body = RateLimitExceededBody {
        error: "rate_limit_exceeded",
        message: "Too many requests. Please try again later.",
        limit: info.limit,
        remaining: info.remaining,
        reset_in_seconds: info.reset_seconds,
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    apply_headers(headers, info);
    headers.insert(RETRY_AFTER, HeaderValue::from(info.reset_seconds.max(1)));
    response
}

fn apply_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_LIMIT_HEADER),
        HeaderValue::from(info.limit),
    );
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
        HeaderValue::from(info.remaining),
    );
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_RESET_HEADER),
        HeaderValue::from(info.reset_seconds),
    );
}
