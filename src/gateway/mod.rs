//! Model gateway: optional, possibly slow inference capabilities.
//!
//! The gateway owns at most one sentiment classifier and one text
//! generator. Both are produced by [`ModelLoader`]s at initialization time
//! and invoked through the [`TextClassifier`] / [`TextGenerator`] traits, so
//! the orchestrator never knows which backend is behind them.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod inference;
mod manager;
pub mod prompt;
mod state;

pub use manager::{GenerationSettings, ModelGateway};
pub use state::{GatewayState, GatewayStatus, ModelHandle};

use crate::config::ModelsConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// One label/score pair from a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f32,
}

/// Sampling parameters passed to a generator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub do_sample: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 75,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.9,
            do_sample: true,
        }
    }
}

impl From<&ModelsConfig> for GenerationParams {
    fn from(config: &ModelsConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            do_sample: config.do_sample,
        }
    }
}

#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classify `text`, best label first.
    async fn classify(&self, text: &str) -> Result<Vec<Classification>>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Continue `prompt`, returning only the newly generated text when the
    /// backend supports it.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

/// A capability produced by a loader
#[derive(Clone)]
pub enum LoadedModel {
    Classifier(Arc<dyn TextClassifier>),
    Generator(Arc<dyn TextGenerator>),
}

/// Produces one model capability, reporting download/warm-up progress.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Human readable model name for status lines and metrics.
    fn name(&self) -> &str;

    async fn load(&self, progress: &LoadProgress<'_>) -> Result<LoadedModel>;
}

/// Loader for a capability that already exists, such as a model the host
/// constructed itself.
pub struct Preloaded {
    name: String,
    model: LoadedModel,
}

impl Preloaded {
    pub fn new(name: impl Into<String>, model: LoadedModel) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }

    pub fn classifier(name: impl Into<String>, classifier: Arc<dyn TextClassifier>) -> Self {
        Self::new(name, LoadedModel::Classifier(classifier))
    }

    pub fn generator(name: impl Into<String>, generator: Arc<dyn TextGenerator>) -> Self {
        Self::new(name, LoadedModel::Generator(generator))
    }
}

#[async_trait]
impl ModelLoader for Preloaded {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, progress: &LoadProgress<'_>) -> Result<LoadedModel> {
        progress.report(100);
        Ok(self.model.clone())
    }
}

/// Progress sink handed to a loader.
///
/// Loaders report their own 0-100 progress; it is folded into the overall
/// gateway percentage according to the loader's stage.
pub struct LoadProgress<'a> {
    status: &'a watch::Sender<GatewayStatus>,
    stage: usize,
    stages: usize,
    name: &'a str,
}

impl<'a> LoadProgress<'a> {
    pub(crate) fn new(
        status: &'a watch::Sender<GatewayStatus>,
        stage: usize,
        stages: usize,
        name: &'a str,
    ) -> Self {
        Self {
            status,
            stage,
            stages: stages.max(1),
            name,
        }
    }

    pub fn report(&self, percent: u8) {
        let percent = usize::from(percent.min(100));
        let overall = (self.stage * 100 + percent) / self.stages;
        self.status.send_replace(GatewayStatus {
            state: GatewayState::Loading,
            percent: overall.min(100) as u8,
            message: format!("Loading {}: {}%", self.name, percent),
        });
    }
}
