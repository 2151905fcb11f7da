//! Configuration data structures for picksy.
//!
//! This module defines the schema for the application settings: where the
//! key-value store lives, how long replies are cached, how much conversation
//! is kept, which inference models back the mascot, and the practice tutor.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Key-value store settings (the local-storage stand-in).
    #[serde(default)]
    pub storage: StorageConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheSettings,

    /// Conversation history settings.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Inference model settings.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Rhythm practice tutor settings.
    #[serde(default)]
    pub practice: PracticeConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which key-value store backs the cache and the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file on disk, survives restarts.
    File,
    /// Process memory only.
    Memory,
}

/// Settings for the persistent key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend kind.
    /// Default: `file`
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Path of the JSON store file (file backend only).
    /// Default: `~/.picksy/storage.json`
    #[serde(default = "default_storage_path")]
    pub path: String,

    /// Upper bound on the total stored bytes; writes beyond it fail with a
    /// quota error. `0` disables the limit.
    /// Default: `5242880` (5 MiB, the usual browser local-storage quota)
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: usize,
}

/// Settings for the response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether replies are cached at all.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime in hours.
    /// Default: `24`
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

/// Settings for the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum number of user/assistant exchanges kept after the persona.
    /// Default: `10`
    #[serde(default = "default_max_history_length")]
    pub max_history_length: usize,

    /// System persona message placed at the head of every conversation.
    #[serde(default = "default_persona")]
    pub persona: String,
}

/// How the conversation is rendered into a generator prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptFormat {
    /// The user input alone, for small completion models.
    Plain,
    /// `<|system|>`/`<|user|>`/`<|assistant|>` chat template with history.
    Chat,
}

/// Settings for the inference backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Whether to load models at all. When false the mascot answers from
    /// the keyword responder only.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of a Hugging Face Inference API compatible server.
    /// Default: `https://api-inference.huggingface.co/models`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token sent with every inference request.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Sentiment classifier model id. Empty disables the classifier.
    /// Default: `distilbert/distilbert-base-uncased-finetuned-sst-2-english`
    #[serde(default = "default_classifier_model")]
    pub classifier_model: String,

    /// Text generation model id. Empty disables the generator.
    /// Default: `distilbert/distilgpt2`
    #[serde(default = "default_generator_model")]
    pub generator_model: String,

    /// Prompt layout used for the generator.
    /// Default: `plain`
    #[serde(default = "default_prompt_format")]
    pub prompt_format: PromptFormat,

    /// Maximum new tokens per generation.
    /// Default: `75`
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Sampling temperature.
    /// Default: `0.7`
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-k sampling cutoff.
    /// Default: `50`
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Nucleus sampling cutoff.
    /// Default: `0.9`
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Whether to sample at all (greedy decoding otherwise).
    /// Default: `true`
    #[serde(default = "default_true")]
    pub do_sample: bool,

    /// Maximum sentences kept from a generated reply.
    /// Default: `4`
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,

    /// Caller-side timeout around a single model invocation, in seconds.
    /// Default: `30`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of times to retry a failed inference request.
    /// Default: `3`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Settings for the rhythm practice tutor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeConfig {
    /// Multiplier applied to every beat interval of the base patterns.
    /// Default: `1.0`
    #[serde(default = "default_slow_factor")]
    pub slow_factor: f64,

    /// Score (percent) needed to advance a level.
    /// Default: `60`
    #[serde(default = "default_pass_score")]
    pub pass_score: f64,

    /// Multiplier applied to the raw interval score before the pass check.
    /// Default: `1.2`
    #[serde(default = "default_generosity")]
    pub generosity: f64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `warn`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
            quota_bytes: default_quota_bytes(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history_length: default_max_history_length(),
            persona: default_persona(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base_url: default_api_base_url(),
            api_token: None,
            classifier_model: default_classifier_model(),
            generator_model: default_generator_model(),
            prompt_format: default_prompt_format(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            do_sample: true,
            max_sentences: default_max_sentences(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            slow_factor: default_slow_factor(),
            pass_score: default_pass_score(),
            generosity: default_generosity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_storage_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".picksy")
        .join("storage.json")
        .to_string_lossy()
        .to_string()
}

fn default_quota_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_max_history_length() -> usize {
    10
}

fn default_persona() -> String {
    "You are Picksy, a cheerful rhythm practice mascot. You help music students \
     improve their timing, counting and coordination. Keep answers short, \
     encouraging and practical."
        .to_string()
}

fn default_api_base_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_classifier_model() -> String {
    "distilbert/distilbert-base-uncased-finetuned-sst-2-english".to_string()
}

fn default_generator_model() -> String {
    "distilbert/distilgpt2".to_string()
}

fn default_prompt_format() -> PromptFormat {
    PromptFormat::Plain
}

fn default_max_new_tokens() -> u32 {
    75
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    50
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_sentences() -> usize {
    4
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_slow_factor() -> f64 {
    1.0
}

fn default_pass_score() -> f64 {
    60.0
}

fn default_generosity() -> f64 {
    1.2
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
