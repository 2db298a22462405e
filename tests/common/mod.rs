use std::net::SocketAddr;

use acquisitions::{app::build_app, state::AppState};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

pub const BROWSER: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    #[allow(dead_code)]
    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// One caller: its own peer address (so rate limits don't bleed across callers)
/// and its own cookie jar of one `token`.
pub struct TestClient {
    app: Router,
    peer: SocketAddr,
    pub token: Option<String>,
    /// Sent as `X-Forwarded-For` when set.
    pub forwarded_for: Option<String>,
}

impl TestClient {
    pub fn new(state: &AppState, ip: &str) -> Self {
        Self {
            app: build_app(state.clone()),
            peer: SocketAddr::new(ip.parse().unwrap(), 40000),
            token: None,
            forwarded_for: None,
        }
    }

    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(self.peer))
            .header(header::USER_AGENT, BROWSER);
        if let Some(xff) = &self.forwarded_for {
            req = req.header("x-forwarded-for", xff);
        }
        if let Some(token) = &self.token {
            req = req.header(header::COOKIE, format!("token={token}"));
        }
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = self.app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        if let Some(cookie) = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let value = cookie
                .split(';')
                .next()
                .and_then(|pair| pair.strip_prefix("token="))
                .unwrap_or_default();
            self.token = (!value.is_empty()).then(|| value.to_string());
        }

        TestResponse {
            status,
            headers,
            body,
        }
    }

    #[allow(dead_code)]
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    #[allow(dead_code)]
    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    #[allow(dead_code)]
    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    #[allow(dead_code)]
    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Signs up and keeps the issued cookie. Returns the new user id.
    #[allow(dead_code)]
    pub async fn sign_up(&mut self, name: &str, email: &str, role: Option<&str>) -> String {
        let mut body = serde_json::json!({
            "name": name,
            "email": email,
            "password": "password1",
        });
        if let Some(role) = role {
            body["role"] = Value::from(role);
        }
        let res = self.post("/api/auth/signup", body).await;
        assert_eq!(res.status, StatusCode::CREATED, "signup failed: {}", res.body);
        res.body["user"]["id"].as_str().unwrap().to_string()
    }
}
