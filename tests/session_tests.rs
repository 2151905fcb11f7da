// Response orchestration tests
// Author: kelexine (https://github.com/kelexine)

use async_trait::async_trait;
use picksy::config::AppConfig;
use picksy::error::{PicksyError, Result};
use picksy::gateway::{
    GatewayState, GenerationParams, GenerationSettings, LoadProgress, LoadedModel, ModelGateway,
    ModelLoader, Preloaded, TextGenerator,
};
use picksy::responder::keywords::RESET_ACKNOWLEDGEMENT;
use picksy::session::{PicksySession, ReplySource};
use picksy::storage::{KeyValueStore, MemoryStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const RHYTHM_REPLY: &str =
    "Rhythm is the pattern of sounds and silences in music. It's like the heartbeat that keeps everything together!";

struct FixedGenerator(&'static str);

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Signals when a call starts and answers only once released
struct GatedGenerator {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl TextGenerator for GatedGenerator {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
        self.started.notify_one();
        self.release.notified().await;
        Ok("Keep counting".to_string())
    }
}

struct SlowGenerator;

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok("too late".to_string())
    }
}

/// Holds its load until released
#[derive(Default)]
struct GatedLoader {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl ModelLoader for GatedLoader {
    fn name(&self) -> &str {
        "gated"
    }

    async fn load(&self, progress: &LoadProgress<'_>) -> Result<LoadedModel> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        progress.report(10);
        self.started.notify_one();
        self.release.notified().await;
        Ok(LoadedModel::Generator(Arc::new(FixedGenerator("Loaded and ready"))))
    }
}

fn session_with(gateway: ModelGateway) -> (PicksySession, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = PicksySession::with_store(&AppConfig::default(), store.clone(), Arc::new(gateway));
    (session, store)
}

fn generator_gateway(generator: Arc<dyn TextGenerator>, settings: GenerationSettings) -> ModelGateway {
    ModelGateway::new(vec![Arc::new(Preloaded::generator("test", generator))], settings)
}

#[tokio::test]
async fn test_without_models_answers_from_keywords() {
    let (session, _) = session_with(ModelGateway::disabled());

    let reply = session.respond("what is rhythm").await.unwrap();
    assert_eq!(reply.text, RHYTHM_REPLY);
    assert_eq!(reply.source, ReplySource::Keyword);

    let history = session.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].content, "what is rhythm");
    assert_eq!(history[2].content, RHYTHM_REPLY);
}

#[tokio::test]
async fn test_clear_resets_history_but_keeps_cache() {
    let (session, _) = session_with(generator_gateway(
        Arc::new(FixedGenerator("Count one two three four.")),
        GenerationSettings::default(),
    ));

    session.respond("how do I count").await.unwrap();
    assert_eq!(session.history().len(), 3);

    let reply = session.respond("clear").await.unwrap();
    assert_eq!(reply.text, RESET_ACKNOWLEDGEMENT);
    assert_eq!(reply.source, ReplySource::Reset);
    assert_eq!(session.history().len(), 1);

    let cached = session.respond("how do I count").await.unwrap();
    assert_eq!(cached.source, ReplySource::Cache);
    assert_eq!(cached.text, "Count one two three four.");
}

#[tokio::test]
async fn test_generated_reply_is_cleaned_and_cached() {
    let (session, store) = session_with(generator_gateway(
        Arc::new(FixedGenerator("Great job")),
        GenerationSettings::default(),
    ));

    let reply = session.respond("I played it!").await.unwrap();
    assert_eq!(reply.text, "Great job.");
    assert_eq!(reply.source, ReplySource::Model);
    assert_eq!(session.cache_stats().writes, 1);
    assert!(store.keys().unwrap().len() >= 2);

    // A cache hit does not touch the history
    let again = session.respond("I played it!").await.unwrap();
    assert_eq!(again.source, ReplySource::Cache);
    assert_eq!(again.text, "Great job.");
    assert_eq!(session.history().len(), 3);
}

#[tokio::test]
async fn test_second_message_while_busy_is_rejected() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let gateway = generator_gateway(
        Arc::new(GatedGenerator {
            started: started.clone(),
            release: release.clone(),
        }),
        GenerationSettings::default(),
    );
    assert!(gateway.initialize().await);

    let (session, _) = session_with(gateway);
    let session = Arc::new(session);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.respond("first").await }
    });

    started.notified().await;
    assert!(session.is_busy());
    assert!(matches!(session.respond("second").await, Err(PicksyError::Busy)));

    release.notify_one();
    let reply = first.await.unwrap().unwrap();
    assert_eq!(reply.text, "Keep counting.");
    assert!(!session.is_busy());

    // Only the first exchange was recorded
    assert_eq!(session.history().len(), 3);

    // Permit for the next call
    release.notify_one();
    assert!(session.respond("third").await.is_ok());
}

#[tokio::test]
async fn test_reply_after_reset_is_not_recorded() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let (session, _) = session_with(generator_gateway(
        Arc::new(GatedGenerator {
            started: started.clone(),
            release: release.clone(),
        }),
        GenerationSettings::default(),
    ));
    let session = Arc::new(session);

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.respond("slow question").await }
    });

    started.notified().await;
    session.reset_conversation();
    release.notify_one();

    // The caller still gets the reply
    let reply = pending.await.unwrap().unwrap();
    assert_eq!(reply.source, ReplySource::Model);

    // But neither the history nor the cache saw it
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.cache_stats().writes, 0);
}

#[tokio::test]
async fn test_slow_generator_falls_back_to_keywords() {
    let settings = GenerationSettings {
        timeout: Duration::from_millis(50),
        ..GenerationSettings::default()
    };
    let (session, _) = session_with(generator_gateway(Arc::new(SlowGenerator), settings));

    let reply = session.respond("what is a beat").await.unwrap();
    assert_eq!(reply.source, ReplySource::Keyword);
    assert_eq!(reply.text, RHYTHM_REPLY);
    assert_eq!(session.cache_stats().writes, 0);
    assert_eq!(session.history().len(), 3);
}

#[tokio::test]
async fn test_background_init_makes_models_ready() {
    let (session, _) = session_with(generator_gateway(
        Arc::new(FixedGenerator("Hi")),
        GenerationSettings::default(),
    ));

    assert!(session.start_background_init().await.unwrap());
    assert_eq!(session.status().message, "AI Ready");
}

#[tokio::test]
async fn test_history_persists_across_sessions() {
    let store = Arc::new(MemoryStore::new());
    let config = AppConfig::default();
    {
        let session = PicksySession::with_store(
            &config,
            store.clone(),
            Arc::new(ModelGateway::disabled()),
        );
        session.respond("what is rhythm").await.unwrap();
    }

    let session = PicksySession::with_store(&config, store, Arc::new(ModelGateway::disabled()));
    assert_eq!(session.history().len(), 3);
}

#[tokio::test]
async fn test_message_during_model_load_uses_keywords() {
    let loader = Arc::new(GatedLoader::default());
    let gateway = ModelGateway::new(vec![loader.clone()], GenerationSettings::default());
    let (session, _) = session_with(gateway);

    let loading = session.start_background_init();
    loader.started.notified().await;
    assert_eq!(session.status().state, GatewayState::Loading);

    // Does not wait for the load and does not start another one
    let reply = session.respond("what is rhythm").await.unwrap();
    assert_eq!(reply.source, ReplySource::Keyword);
    assert_eq!(reply.text, RHYTHM_REPLY);

    loader.release.notify_one();
    assert!(loading.await.unwrap());

    let reply = session.respond("how do I start").await.unwrap();
    assert_eq!(reply.source, ReplySource::Model);
    assert_eq!(reply.text, "Loaded and ready.");
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
}
