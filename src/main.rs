use anyhow::Context;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;

use flowserver::core::config::AppConfig;
use flowserver::core::shared::state::AppState;
use flowserver::main_module::{bootstrap_store, run_axum_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env();
    info!(
        "Starting flowserver {} ({:?} store)",
        env!("CARGO_PKG_VERSION"),
        config.store.backend
    );

    let store = bootstrap_store(&config.store).context("Failed to initialize document store")?;
    let app_state = Arc::new(AppState::new(config, store));

    run_axum_server(app_state)
        .await
        .context("HTTP server failed")?;

    info!("Document store released");
    Ok(())
}
