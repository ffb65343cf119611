mod config;
mod data;
mod error;
mod pipeline;
mod predictor;
mod server;
mod state;
mod storage;

use std::sync::Arc;

use config::AppConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env()?;
    log::info!(
        "Starting with model {} and uploads in {}",
        config.model_path.display(),
        config.upload_dir.display()
    );

    let state = AppState::load(config)?;
    server::serve(Arc::new(state)).await
}
