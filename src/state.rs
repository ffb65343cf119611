use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::pipeline::UploadPipeline;
use crate::predictor::{LinearPredictor, Predictor};
use crate::server::views::Views;
use crate::storage::UploadStore;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything a request handler needs. Immutable once built and shared
/// between requests behind an `Arc`.
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: UploadPipeline,
    pub views: Views,
}

impl AppState {
    /// Wire up state around an already-loaded predictor.
    pub fn new(config: AppConfig, predictor: Arc<dyn Predictor>) -> Result<Self> {
        let store = UploadStore::new(config.upload_dir.clone());
        let views = Views::new().context("compiling HTML templates")?;
        Ok(Self {
            pipeline: UploadPipeline::new(store, predictor),
            views,
            config,
        })
    }

    /// Load the model artifact named by `config` and create the upload
    /// directory.
    pub fn load(config: AppConfig) -> Result<Self> {
        let predictor = LinearPredictor::load(&config.model_path)?;
        let state = Self::new(config, Arc::new(predictor))?;
        let store = state.pipeline.store();
        store.ensure_dir().context("creating upload directory")?;
        log::info!("Upload directory ready at {}", store.dir().display());
        Ok(state)
    }
}
