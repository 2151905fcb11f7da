// Inference backend tests against a mock HTTP server
// Author: kelexine (https://github.com/kelexine)

use mockito::Matcher;
use picksy::config::ModelsConfig;
use picksy::error::PicksyError;
use picksy::gateway::inference::{loaders_from_config, InferenceClient};
use picksy::gateway::{GatewayState, GenerationParams, GenerationSettings, ModelGateway};
use serde_json::json;

fn config_for(server: &mockito::Server) -> ModelsConfig {
    ModelsConfig {
        api_base_url: server.url(),
        api_token: Some("hf_test_token".to_string()),
        classifier_model: "cls".to_string(),
        generator_model: "gen".to_string(),
        max_retries: 1,
        ..ModelsConfig::default()
    }
}

#[tokio::test]
async fn test_classify_sorts_labels() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cls")
        .match_header("authorization", "Bearer hf_test_token")
        .match_body(Matcher::PartialJson(json!({"inputs": "I nailed it"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[[{"label": "NEGATIVE", "score": 0.1}, {"label": "POSITIVE", "score": 0.9}]]"#)
        .create_async()
        .await;

    let client = InferenceClient::new(&config_for(&server)).unwrap();
    let labels = client.classify("cls", "I nailed it", false).await.unwrap();

    assert_eq!(labels[0].label, "POSITIVE");
    assert_eq!(labels.len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_generate_sends_sampling_parameters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/gen")
        .match_body(Matcher::PartialJson(json!({
            "inputs": "How do I keep time?",
            "parameters": {"max_new_tokens": 75, "top_k": 50, "return_full_text": false}
        })))
        .with_status(200)
        .with_body(r#"[{"generated_text": "Use a metronome"}]"#)
        .create_async()
        .await;

    let client = InferenceClient::new(&config_for(&server)).unwrap();
    let text = client
        .generate("gen", "How do I keep time?", &GenerationParams::default(), false)
        .await
        .unwrap();

    assert_eq!(text, "Use a metronome");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/gen")
        .with_status(400)
        .with_body(r#"{"error": "Input is too long"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = InferenceClient::new(&config_for(&server)).unwrap();
    let err = client
        .generate("gen", "hi", &GenerationParams::default(), false)
        .await
        .unwrap_err();

    match err {
        PicksyError::ModelInvocation(message) => assert!(message.contains("Input is too long")),
        other => panic!("unexpected error {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_loading_model_is_retried_then_reported() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cls")
        .with_status(503)
        .with_body(r#"{"error": "Model cls is currently loading", "estimated_time": 0.01}"#)
        .expect(2)
        .create_async()
        .await;

    let client = InferenceClient::new(&config_for(&server)).unwrap();
    let err = client.classify("cls", "hi", false).await.unwrap_err();

    assert!(matches!(err, PicksyError::ModelLoading(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gateway_loads_and_generates_over_http() {
    let mut server = mockito::Server::new_async().await;
    let warm_up = server
        .mock("POST", "/cls")
        .match_body(Matcher::PartialJson(json!({"options": {"wait_for_model": true}})))
        .with_status(200)
        .with_body(r#"[{"label": "POSITIVE", "score": 0.99}]"#)
        .create_async()
        .await;
    let generate = server
        .mock("POST", "/gen")
        .with_status(200)
        .with_body(r#"[{"generated_text": "Count slowly"}]"#)
        .expect_at_least(2)
        .create_async()
        .await;

    let config = config_for(&server);
    let gateway = ModelGateway::new(
        loaders_from_config(&config).unwrap(),
        GenerationSettings::from(&config),
    );

    assert!(gateway.initialize().await);
    assert_eq!(gateway.state(), GatewayState::Ready);
    assert_eq!(
        gateway.generate("help me count", &[]).await.as_deref(),
        Some("Count slowly.")
    );

    warm_up.assert_async().await;
    generate.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_server_fails_gateway() {
    let config = ModelsConfig {
        api_base_url: "http://127.0.0.1:9".to_string(),
        max_retries: 0,
        ..ModelsConfig::default()
    };
    let gateway = ModelGateway::new(
        loaders_from_config(&config).unwrap(),
        GenerationSettings::from(&config),
    );

    assert!(!gateway.initialize().await);
    assert_eq!(gateway.state(), GatewayState::Failed);
    assert_eq!(gateway.status().message, "AI Limited");
}
