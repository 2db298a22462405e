mod common;

use std::sync::Arc;

use acquisitions::{
    config::SecurityConfig,
    security::{Decision, RequestFingerprint, SecurityClient, Tier},
    state::AppState,
    users::memory::MemoryUserRepository,
};
use async_trait::async_trait;
use axum::http::{header, StatusCode};
use common::TestClient;
use serde_json::json;

#[tokio::test]
async fn health_and_banners() {
    let state = AppState::fake();
    let mut client = TestClient::new(&state, "10.3.0.1");

    let res = client.get("/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert!(res.body.get("timestamp").is_some());
    assert!(res.body.get("uptime").is_some());

    let res = client.get("/api").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Acquisition api is running");

    let res = client.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "Hello from Acquisitions");
    assert_eq!(
        res.headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn unknown_route_is_404() {
    let state = AppState::fake();
    let mut client = TestClient::new(&state, "10.3.1.1");
    let res = client.get("/nonexistent").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "Route not found");
}

#[tokio::test]
async fn sixth_guest_request_is_rate_limited() {
    let state = AppState::fake();
    let mut client = TestClient::new(&state, "10.3.2.1");
    for _ in 0..5 {
        assert_eq!(client.get("/api").await.status, StatusCode::OK);
    }
    let res = client.get("/api").await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["error"], "Forbidden");
    assert_eq!(res.body["message"], "Rate limit exceeded");

    // another caller is unaffected
    let mut other = TestClient::new(&state, "10.3.2.2");
    assert_eq!(other.get("/api").await.status, StatusCode::OK);
}

#[tokio::test]
async fn signed_in_callers_get_the_user_tier() {
    let state = AppState::fake_with(SecurityConfig {
        burst: None,
        ..SecurityConfig::default()
    });
    let mut client = TestClient::new(&state, "10.3.3.1");
    client.sign_up("Ann", "ann@x.com", None).await;

    let allowed = {
        let mut n = 0;
        for _ in 0..12 {
            if client.get("/api").await.status == StatusCode::OK {
                n += 1;
            }
        }
        n
    };
    assert_eq!(allowed, 10);
}

#[tokio::test]
async fn shield_blocks_traversal_probes() {
    let state = AppState::fake();
    let mut client = TestClient::new(&state, "10.3.4.1");
    let res = client.get("/api?file=../../etc/passwd").await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["message"], "Requests blocked by policy");
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_limit() {
    let state = AppState::fake();
    let mut client = TestClient::new(&state, "10.3.5.1");
    let mut allowed = 0;
    for i in 0..10 {
        client.forwarded_for = Some(format!("203.0.113.{i}"));
        if client.get("/api").await.status == StatusCode::OK {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
}

#[tokio::test]
async fn trusted_proxy_keys_on_forwarded_for() {
    let state = AppState::fake_with(SecurityConfig {
        trust_proxy: true,
        ..SecurityConfig::default()
    });
    // one proxy address, many clients behind it
    let mut proxy = TestClient::new(&state, "10.3.6.1");
    for i in 0..3 {
        proxy.forwarded_for = Some(format!("203.0.113.{i}"));
        for _ in 0..5 {
            assert_eq!(proxy.get("/api").await.status, StatusCode::OK);
        }
    }
    proxy.forwarded_for = Some("203.0.113.0".into());
    assert_eq!(proxy.get("/api").await.status, StatusCode::FORBIDDEN);
}

struct BrokenSecurity;

#[async_trait]
impl SecurityClient for BrokenSecurity {
    async fn protect(&self, _: &RequestFingerprint, _: Tier) -> anyhow::Result<Decision> {
        anyhow::bail!("decision service unreachable")
    }

    async fn cleanup_expired(&self) -> anyhow::Result<u64> {
        Ok(0)
    }
}

#[tokio::test]
async fn security_failure_is_500_and_skips_the_handler() {
    let base = AppState::fake();
    let state = AppState::from_parts(
        base.config.clone(),
        Arc::new(MemoryUserRepository::new()),
        Arc::new(BrokenSecurity),
    );
    let mut client = TestClient::new(&state, "10.3.7.1");

    let res = client
        .post(
            "/api/auth/signup",
            json!({ "name": "Ann", "email": "ann@x.com", "password": "password1" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["error"], "Internal Server Error");
    assert_eq!(res.body["message"], "Something went wrong with security middleware");
    assert!(res.set_cookie().is_none());
    assert!(state.users.find_all().await.unwrap().is_empty());
}
