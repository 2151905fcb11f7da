// Inference API client (Hugging Face Inference API compatible)
// Author: kelexine (https://github.com/kelexine)

use super::{
    Classification, GenerationParams, LoadProgress, LoadedModel, ModelLoader, TextClassifier,
    TextGenerator,
};
use crate::config::ModelsConfig;
use crate::error::{PicksyError, Result};
use crate::utils::logging::sanitize;
use crate::utils::retry::with_retry;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Input used to warm a model up during loading
const WARM_UP_INPUT: &str = "I practiced my rhythm today.";

/// Client for a Hugging Face Inference API compatible server.
///
/// Both capabilities use the same endpoint shape: `POST {base}/{model}` with
/// an `inputs` field, optional `parameters` and `options`.
pub struct InferenceClient {
    http_client: Client,
    base_url: String,
    api_token: Option<String>,
    max_attempts: u32,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<TextGenerationParameters<'a>>,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct TextGenerationParameters<'a> {
    #[serde(flatten)]
    sampling: &'a GenerationParams,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
    use_cache: bool,
}

/// Classification output comes either nested per input or flat
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<Classification>>),
    Flat(Vec<Classification>),
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    List(Vec<GeneratedText>),
    Single(GeneratedText),
}

impl InferenceClient {
    /// Create a new inference client
    pub fn new(config: &ModelsConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1).saturating_mul(4)))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .use_rustls_tls()
            .build()
            .map_err(|e| PicksyError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            max_attempts: config.max_retries.saturating_add(1),
        })
    }

    /// Classify `text` with `model`, best label first
    pub async fn classify(&self, model: &str, text: &str, wait_for_model: bool) -> Result<Vec<Classification>> {
        let request = InferenceRequest {
            inputs: text,
            parameters: None,
            options: InferenceOptions {
                wait_for_model,
                use_cache: true,
            },
        };

        let body = self.post(model, &request).await?;
        let parsed: ClassificationResponse = serde_json::from_value(body)?;
        let mut labels = match parsed {
            ClassificationResponse::Nested(mut outer) => {
                if outer.is_empty() {
                    Vec::new()
                } else {
                    outer.swap_remove(0)
                }
            }
            ClassificationResponse::Flat(labels) => labels,
        };

        if labels.is_empty() {
            return Err(PicksyError::ModelInvocation(format!(
                "{} returned no labels",
                model
            )));
        }

        labels.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(labels)
    }

    /// Continue `prompt` with `model`, returning only the new text
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
        wait_for_model: bool,
    ) -> Result<String> {
        let request = InferenceRequest {
            inputs: prompt,
            parameters: Some(TextGenerationParameters {
                sampling: params,
                return_full_text: false,
            }),
            options: InferenceOptions {
                wait_for_model,
                use_cache: !params.do_sample,
            },
        };

        let body = self.post(model, &request).await?;
        let parsed: GenerationResponse = serde_json::from_value(body)?;
        match parsed {
            GenerationResponse::List(list) => list
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| PicksyError::ModelInvocation(format!("{} returned no text", model))),
            GenerationResponse::Single(g) => Ok(g.generated_text),
        }
    }

    async fn post<B: Serialize + Sync>(&self, model: &str, request: &B) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, model);
        debug!("POST {}", url);

        let outcome = with_retry(model, self.max_attempts, || async {
            let mut builder = self.http_client.post(&url).json(request);
            if let Some(token) = &self.api_token {
                builder = builder.bearer_auth(token);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| (transport_status(&e), format!("HTTP error: {}", e)))?;

            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err((status.as_u16(), text));
            }

            serde_json::from_str::<Value>(&text)
                .map_err(|e| (500, format!("Invalid response: {}", e)))
        })
        .await;

        outcome.map_err(|(status, body)| {
            let message = extract_error_message(&body).unwrap_or(body);
            warn!("Inference call to {} failed ({}): {}", model, status, sanitize(&message));
            if status == 503 && message.to_lowercase().contains("loading") {
                PicksyError::ModelLoading(message)
            } else {
                PicksyError::ModelInvocation(format!("{} ({}): {}", model, status, message))
            }
        })
    }
}

/// Connection problems are retried like a gateway error
fn transport_status(e: &reqwest::Error) -> u16 {
    if e.is_timeout() || e.is_connect() {
        503
    } else {
        500
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    match parsed.get("error")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        other => Some(other.to_string()),
    }
}

/// Sentiment classifier served by an [`InferenceClient`]
pub struct InferenceClassifier {
    client: Arc<InferenceClient>,
    model: String,
}

#[async_trait]
impl TextClassifier for InferenceClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<Classification>> {
        self.client.classify(&self.model, text, false).await
    }
}

/// Text generator served by an [`InferenceClient`]
pub struct InferenceGenerator {
    client: Arc<InferenceClient>,
    model: String,
}

#[async_trait]
impl TextGenerator for InferenceGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.client.generate(&self.model, prompt, params, false).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Classifier,
    Generator,
}

/// Loads a model by sending it a warm-up request that waits until the server
/// has the model in memory.
pub struct InferenceLoader {
    client: Arc<InferenceClient>,
    model: String,
    kind: ModelKind,
}

impl InferenceLoader {
    pub fn new(client: Arc<InferenceClient>, model: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            client,
            model: model.into(),
            kind,
        }
    }
}

#[async_trait]
impl ModelLoader for InferenceLoader {
    fn name(&self) -> &str {
        &self.model
    }

    async fn load(&self, progress: &LoadProgress<'_>) -> Result<LoadedModel> {
        progress.report(0);
        info!("Loading {:?} model {}", self.kind, self.model);

        let loaded = match self.kind {
            ModelKind::Classifier => {
                self.client.classify(&self.model, WARM_UP_INPUT, true).await?;
                LoadedModel::Classifier(Arc::new(InferenceClassifier {
                    client: self.client.clone(),
                    model: self.model.clone(),
                }))
            }
            ModelKind::Generator => {
                let params = GenerationParams {
                    max_new_tokens: 1,
                    ..GenerationParams::default()
                };
                self.client
                    .generate(&self.model, WARM_UP_INPUT, &params, true)
                    .await?;
                LoadedModel::Generator(Arc::new(InferenceGenerator {
                    client: self.client.clone(),
                    model: self.model.clone(),
                }))
            }
        };

        progress.report(100);
        Ok(loaded)
    }
}

/// Loaders for every model named in `config`, classifier first.
pub fn loaders_from_config(config: &ModelsConfig) -> Result<Vec<Arc<dyn ModelLoader>>> {
    if !config.enabled {
        return Ok(Vec::new());
    }

    let client = Arc::new(InferenceClient::new(config)?);
    let mut loaders: Vec<Arc<dyn ModelLoader>> = Vec::new();

    if !config.classifier_model.is_empty() {
        loaders.push(Arc::new(InferenceLoader::new(
            client.clone(),
            &config.classifier_model,
            ModelKind::Classifier,
        )));
    }
    if !config.generator_model.is_empty() {
        loaders.push(Arc::new(InferenceLoader::new(
            client,
            &config.generator_model,
            ModelKind::Generator,
        )));
    }

    Ok(loaders)
}
