//! Response orchestration.
//!
//! A [`PicksySession`] owns one conversation and answers one message at a
//! time: reset commands first, then the reply cache, then the model gateway,
//! and finally the keyword responder.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::cache::{CacheConfig, CacheStats, ResponseCache};
use crate::config::AppConfig;
use crate::conversation::{ConversationHistory, Message};
use crate::error::{PicksyError, Result};
use crate::gateway::{inference, GatewayStatus, GenerationSettings, ModelGateway};
use crate::metrics;
use crate::responder::keywords::{self, RESET_ACKNOWLEDGEMENT};
use crate::storage::{self, KeyValueStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Which layer produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Reset,
    Cache,
    Model,
    Keyword,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Reset => "reset",
            ReplySource::Cache => "cache",
            ReplySource::Model => "model",
            ReplySource::Keyword => "keyword",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    fn new(text: impl Into<String>, source: ReplySource) -> Self {
        metrics::record_response(source.as_str());
        Self {
            text: text.into(),
            source,
        }
    }
}

/// One conversation with the mascot.
///
/// Constructed once per conversation. `respond` takes `&self`, so the
/// session can be shared behind an `Arc` with background tasks; only one
/// `respond` call runs at a time.
pub struct PicksySession {
    cache: ResponseCache,
    history: Mutex<ConversationHistory>,
    gateway: Arc<ModelGateway>,
    busy: AtomicBool,
    /// Bumped on every reset; replies computed under an older epoch are not
    /// recorded
    epoch: AtomicU64,
}

impl PicksySession {
    pub fn new(cache: ResponseCache, history: ConversationHistory, gateway: Arc<ModelGateway>) -> Self {
        Self {
            cache,
            history: Mutex::new(history),
            gateway,
            busy: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Build a session from configuration: open the store, restore the
    /// conversation and prepare (but not load) the configured models.
    pub fn from_config(config: &AppConfig, offline: bool) -> Result<Self> {
        let store = storage::open(&config.storage)?;
        let loaders = if offline {
            Vec::new()
        } else {
            inference::loaders_from_config(&config.models)?
        };
        let gateway = ModelGateway::new(loaders, GenerationSettings::from(&config.models));
        Ok(Self::with_store(config, store, Arc::new(gateway)))
    }

    /// Build a session over an existing store and gateway.
    pub fn with_store(config: &AppConfig, store: Arc<dyn KeyValueStore>, gateway: Arc<ModelGateway>) -> Self {
        let cache = ResponseCache::new(CacheConfig::from(&config.cache), store.clone());
        let history = ConversationHistory::load(
            config.conversation.persona.clone(),
            config.conversation.max_history_length,
            store,
        );
        Self::new(cache, history, gateway)
    }

    /// Answer one message.
    ///
    /// Fails only with [`PicksyError::Busy`] when another call is still in
    /// flight; every other failure degrades to a keyword reply.
    pub async fn respond(&self, input: &str) -> Result<Reply> {
        let _busy = BusyGuard::acquire(&self.busy).ok_or_else(|| {
            metrics::record_busy_rejection();
            PicksyError::Busy
        })?;

        if keywords::is_reset_command(input) {
            self.reset_conversation();
            return Ok(Reply::new(RESET_ACKNOWLEDGEMENT, ReplySource::Reset));
        }

        if let Some(cached) = self.cache.get(input) {
            return Ok(Reply::new(cached, ReplySource::Cache));
        }

        let epoch = self.epoch.load(Ordering::SeqCst);

        // Best effort; a failed or in-flight load just means no model
        if !self.gateway.initialize().await {
            debug!("Answering without models ({})", self.gateway.state().as_str());
        }

        if self.gateway.is_ready() {
            let context = self.history.lock().snapshot();
            if let Some(text) = self.gateway.generate(input, &context).await {
                self.record(epoch, input, &text, true);
                return Ok(Reply::new(text, ReplySource::Model));
            }
        }

        let text = keywords::reply_text(input);
        // Fallback replies are not cached so a later model answer can replace them
        self.record(epoch, input, text, false);
        Ok(Reply::new(text, ReplySource::Keyword))
    }

    /// Clear the conversation back to the persona message.
    ///
    /// Replies still being computed when this runs are returned to their
    /// caller but not recorded.
    pub fn reset_conversation(&self) {
        let mut history = self.history.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        history.reset();
        drop(history);
        info!("Conversation reset");
    }

    /// Start loading models in the background, as the UI does when idle.
    pub fn start_background_init(&self) -> JoinHandle<bool> {
        let gateway = self.gateway.clone();
        tokio::spawn(async move { gateway.initialize().await })
    }

    /// Manual retry affordance for a failed model load.
    pub async fn retry_models(&self) -> bool {
        self.gateway.retry().await
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> Vec<Message> {
        self.history.lock().snapshot()
    }

    pub fn status(&self) -> GatewayStatus {
        self.gateway.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<GatewayStatus> {
        self.gateway.subscribe()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached reply.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Append an exchange, and optionally cache the reply, unless a reset
    /// happened since `epoch`.
    fn record(&self, epoch: u64, input: &str, reply: &str, cache: bool) -> bool {
        // Resets bump the epoch under this lock, so none can land before the
        // cache write below
        let mut history = self.history.lock();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("Discarding reply computed before a reset");
            return false;
        }
        history.append(input, reply);
        if cache {
            self.cache.put(input, reply);
        }
        true
    }
}

/// Holds the busy flag for the duration of one `respond` call
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
