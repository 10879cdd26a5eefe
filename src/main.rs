mod admin;
mod app;
mod auth;
mod config;
mod discovery;
mod error;
mod extract;
mod feedback;
mod messages;
mod pagination;
mod skills;
mod state;
mod storage;
mod store;
mod swaps;
mod users;

#[cfg(test)]
mod testing;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "skillswap=debug,axum=info,tower_http=info".to_string());
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

    let state = AppState::init().await?;

    if let Some(admin) = &state.config.bootstrap_admin {
        auth::services::bootstrap_admin(&state, admin).await?;
    }

    app::serve(app::build_app(state)).await
}
