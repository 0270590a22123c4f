//! Application state for the HTTP server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::QueryPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pipeline: QueryPipeline,
    ready: RwLock<bool>,
}

impl AppState {
    /// Build the pipeline and every provider from configuration
    pub fn new(config: Arc<RagConfig>) -> Result<Self> {
        tracing::info!("Initializing case-law RAG pipeline...");
        let pipeline = QueryPipeline::from_config(config)?;
        tracing::info!(
            providers = ?pipeline.provider_labels(),
            "Pipeline ready"
        );
        Ok(Self::from_pipeline(pipeline))
    }

    /// Wrap an already assembled pipeline
    pub fn from_pipeline(pipeline: QueryPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pipeline,
                ready: RwLock::new(true),
            }),
        }
    }

    pub fn pipeline(&self) -> &QueryPipeline {
        &self.inner.pipeline
    }

    pub fn config(&self) -> &RagConfig {
        self.inner.pipeline.config()
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
