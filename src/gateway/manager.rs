// Model gateway - model lifecycle, invocation and fallback signalling
// Author: kelexine (https://github.com/kelexine)

use super::prompt::{format_prompt, postprocess};
use super::state::{GatewayState, GatewayStatus, ModelHandle};
use super::{GenerationParams, LoadProgress, LoadedModel, ModelLoader, TextClassifier, TextGenerator};
use crate::config::{ModelsConfig, PromptFormat};
use crate::conversation::Message;
use crate::metrics;
use crate::responder::advice::{self, Analysis, Sentiment};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How generator calls are shaped and bounded
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub prompt_format: PromptFormat,
    pub params: GenerationParams,
    pub max_sentences: usize,
    pub timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            prompt_format: PromptFormat::Plain,
            params: GenerationParams::default(),
            max_sentences: 4,
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&ModelsConfig> for GenerationSettings {
    fn from(config: &ModelsConfig) -> Self {
        Self {
            prompt_format: config.prompt_format,
            params: GenerationParams::from(config),
            max_sentences: config.max_sentences,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// Mediates access to the optional classifier and generator.
///
/// Nothing here returns an error to the caller: load failures end in the
/// `Failed` state and invocation failures yield `None`, both of which mean
/// "answer without a model".
pub struct ModelGateway {
    loaders: Vec<Arc<dyn ModelLoader>>,
    handle: Mutex<ModelHandle>,
    status: watch::Sender<GatewayStatus>,
    settings: GenerationSettings,
}

impl ModelGateway {
    pub fn new(loaders: Vec<Arc<dyn ModelLoader>>, settings: GenerationSettings) -> Self {
        let (status, _) = watch::channel(GatewayStatus::default());
        metrics::update_gateway_state(GatewayState::Absent.as_str(), &state_labels());
        Self {
            loaders,
            handle: Mutex::new(ModelHandle::Absent),
            status,
            settings,
        }
    }

    /// Gateway with no models; it fails on first initialization.
    pub fn disabled() -> Self {
        Self::new(Vec::new(), GenerationSettings::default())
    }

    /// Load the configured models.
    ///
    /// Returns true once at least one model is ready. A call made while a
    /// load is in flight returns false straight away instead of starting a
    /// second load, and a failed gateway stays failed until [`retry`].
    ///
    /// [`retry`]: ModelGateway::retry
    pub async fn initialize(&self) -> bool {
        {
            let mut handle = self.handle.lock();
            match &*handle {
                ModelHandle::Ready { .. } => return true,
                ModelHandle::Loading => {
                    debug!("Models already loading");
                    return false;
                }
                ModelHandle::Failed(reason) => {
                    debug!("Models unavailable: {}", reason);
                    return false;
                }
                ModelHandle::Absent => *handle = ModelHandle::Loading,
            }
        }

        // Put the gateway back to Absent if this future is dropped mid-load
        let mut guard = LoadingGuard {
            gateway: self,
            armed: true,
        };

        self.publish(GatewayState::Loading, 0, "AI Loading...".to_string());

        let mut classifier: Option<Arc<dyn TextClassifier>> = None;
        let mut generator: Option<Arc<dyn TextGenerator>> = None;
        let mut errors = Vec::new();
        let stages = self.loaders.len();

        for (stage, loader) in self.loaders.iter().enumerate() {
            let name = loader.name().to_string();
            let progress = LoadProgress::new(&self.status, stage, stages, &name);

            match loader.load(&progress).await {
                Ok(LoadedModel::Classifier(model)) => {
                    info!("Classifier {} loaded", name);
                    metrics::record_model_load(&name, true);
                    classifier = Some(model);
                }
                Ok(LoadedModel::Generator(model)) => {
                    info!("Generator {} loaded", name);
                    metrics::record_model_load(&name, true);
                    generator = Some(model);
                }
                Err(e) => {
                    warn!("Model {} failed to load: {}", name, e);
                    metrics::record_model_load(&name, false);
                    errors.push(format!("{}: {}", name, e));
                }
            }
        }

        guard.armed = false;

        let next = if classifier.is_some() || generator.is_some() {
            ModelHandle::Ready {
                classifier,
                generator,
            }
        } else if errors.is_empty() {
            ModelHandle::Failed("no models configured".to_string())
        } else {
            ModelHandle::Failed(errors.join("; "))
        };

        let ready = matches!(next, ModelHandle::Ready { .. });
        match &next {
            ModelHandle::Failed(reason) => {
                info!("Model gateway unavailable: {}", reason);
                self.publish(GatewayState::Failed, 100, "AI Limited".to_string());
            }
            _ => {
                info!("Model gateway ready");
                self.publish(GatewayState::Ready, 100, "AI Ready".to_string());
            }
        }
        *self.handle.lock() = next;

        ready
    }

    /// Manual retry after a failed load.
    pub async fn retry(&self) -> bool {
        {
            let mut handle = self.handle.lock();
            if matches!(*handle, ModelHandle::Failed(_)) {
                *handle = ModelHandle::Absent;
            }
        }
        self.initialize().await
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.handle.lock(), ModelHandle::Ready { .. })
    }

    pub fn state(&self) -> GatewayState {
        self.handle.lock().state()
    }

    pub fn status(&self) -> GatewayStatus {
        self.status.borrow().clone()
    }

    /// Observe status changes, e.g. to drive a progress bar.
    pub fn subscribe(&self) -> watch::Receiver<GatewayStatus> {
        self.status.subscribe()
    }

    /// Produce a model-derived reply for `prompt`, or `None` to signal that
    /// the caller should fall back.
    ///
    /// The generator is preferred; when it is absent or yields nothing the
    /// classifier-driven advice is used instead.
    pub async fn generate(&self, prompt: &str, context: &[Message]) -> Option<String> {
        let handle = self.handle.lock().clone();
        let (classifier, generator) = match handle {
            ModelHandle::Ready {
                classifier,
                generator,
            } => (classifier, generator),
            _ => return None,
        };

        if let Some(generator) = generator {
            if let Some(reply) = self.generate_text(generator.as_ref(), prompt, context).await {
                return Some(reply);
            }
        }

        match classifier {
            Some(classifier) => Some(self.generate_advice(classifier.as_ref(), prompt).await),
            None => None,
        }
    }

    async fn generate_text(
        &self,
        generator: &dyn TextGenerator,
        input: &str,
        context: &[Message],
    ) -> Option<String> {
        let prompt = format_prompt(self.settings.prompt_format, context, input);
        let started = Instant::now();

        let outcome = tokio::time::timeout(
            self.settings.timeout,
            generator.generate(&prompt, &self.settings.params),
        )
        .await;
        let elapsed = started.elapsed().as_secs_f64();

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!("Generator approach failed: {}", e);
                metrics::record_generation("generator", "error", elapsed);
                return None;
            }
            Err(_) => {
                warn!(
                    "Generator timed out after {}s",
                    self.settings.timeout.as_secs_f64()
                );
                metrics::record_generation("generator", "timeout", elapsed);
                return None;
            }
        };

        match postprocess(&raw, &prompt, self.settings.max_sentences) {
            Some(reply) => {
                metrics::record_generation("generator", "ok", elapsed);
                Some(reply)
            }
            None => {
                debug!("Generator produced nothing usable");
                metrics::record_generation("generator", "empty", elapsed);
                None
            }
        }
    }

    async fn generate_advice(&self, classifier: &dyn TextClassifier, input: &str) -> String {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.settings.timeout, classifier.classify(input)).await;
        let elapsed = started.elapsed().as_secs_f64();

        let (sentiment, confidence) = match outcome {
            Ok(Ok(labels)) => {
                metrics::record_generation("classifier", "ok", elapsed);
                labels
                    .first()
                    .map(|best| (Sentiment::from_label(&best.label), best.score))
                    .unwrap_or((Sentiment::Neutral, 0.5))
            }
            Ok(Err(e)) => {
                warn!("Sentiment analysis error: {}", e);
                metrics::record_generation("classifier", "error", elapsed);
                (Sentiment::Neutral, 0.5)
            }
            Err(_) => {
                warn!("Sentiment analysis timed out");
                metrics::record_generation("classifier", "timeout", elapsed);
                (Sentiment::Neutral, 0.5)
            }
        };

        let analysis = Analysis {
            topics: advice::detect_topics(input),
            sentiment,
            confidence,
        };
        debug!(
            "Advice analysis: topics={:?} sentiment={:?} ({:.2})",
            analysis.topics, analysis.sentiment, analysis.confidence
        );

        advice::advise(&analysis, &mut rand::thread_rng())
    }

    fn publish(&self, state: GatewayState, percent: u8, message: String) {
        metrics::update_gateway_state(state.as_str(), &state_labels());
        self.status.send_replace(GatewayStatus {
            state,
            percent,
            message,
        });
    }
}

fn state_labels() -> [&'static str; 4] {
    GatewayState::ALL.map(|state| state.as_str())
}

/// Resets an interrupted load so a later call can start over
struct LoadingGuard<'a> {
    gateway: &'a ModelGateway,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut handle = self.gateway.handle.lock();
            if matches!(*handle, ModelHandle::Loading) {
                *handle = ModelHandle::Absent;
            }
            drop(handle);
            self.gateway
                .publish(GatewayState::Absent, 0, "AI Limited".to_string());
        }
    }
}
