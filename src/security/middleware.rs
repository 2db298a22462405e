use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{
    auth::{
        cookies::{read_cookie, TOKEN_COOKIE},
        jwt::JwtKeys,
    },
    error::AppError,
    state::AppState,
};

use super::{Decision, DenyReason, RequestFingerprint, Tier};

/// Rate-limit key for the caller. `X-Forwarded-For` is honored only when
/// `trust_proxy` is set; otherwise the socket peer is used.
fn client_address(req: &Request, trust_proxy: bool) -> String {
    let forwarded = || {
        req.headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    trust_proxy
        .then(forwarded)
        .flatten()
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Tier of the caller if the request already carries a valid session, else guest.
fn caller_tier(state: &AppState, headers: &HeaderMap) -> Tier {
    let role = read_cookie(headers, TOKEN_COOKIE)
        .and_then(|token| JwtKeys::from_ref(state).verify(&token).ok())
        .map(|claims| claims.role);
    Tier::from(role)
}

pub async fn protect(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let tier = caller_tier(&state, req.headers());
    let fingerprint = RequestFingerprint {
        client: client_address(&req, state.config.security.trust_proxy),
        user_agent: req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        method: req.method().to_string(),
        target: req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string()),
    };

    match state.security.protect(&fingerprint, tier).await {
        Ok(Decision::Allow) => next.run(req).await,
        Ok(Decision::Deny(reason)) => {
            let label = match reason {
                DenyReason::Bot => "bot request blocked",
                DenyReason::Shield => "shield request blocked",
                DenyReason::RateLimit => "rate limit exceeded",
            };
            warn!(
                client = %fingerprint.client,
                user_agent = ?fingerprint.user_agent,
                method = %fingerprint.method,
                path = %req.uri().path(),
                tier = tier.as_str(),
                "{label}"
            );
            AppError::Blocked(reason).into_response()
        }
        Err(e) => AppError::SecurityFailure(e).into_response(),
    }
}
