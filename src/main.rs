use std::time::Duration;

use acquisitions::{app, state::AppState};

/// How often idle rate-limit windows are swept.
const SECURITY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "acquisitions=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    let security = app_state.security.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SECURITY_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match security.cleanup_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(removed = n, "rate limit windows swept"),
                Err(e) => tracing::warn!(error = %e, "rate limit sweep failed"),
            }
        }
    });

    app::serve(app::build_app(app_state)).await
}
