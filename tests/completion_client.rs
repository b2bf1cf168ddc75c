use std::sync::Arc;

use pretty_assertions::assert_eq;
use review_responder::CompletionConfig;
use review_responder::drafter::{
    ChatMessage, CompletionClient, CompletionError, CompletionRequest, Drafter, DrafterConfig,
    FALLBACK_RESPONSE, OpenAiClient, SYSTEM_PROMPT,
};
use review_responder::utils::ConfigError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> CompletionConfig {
    CompletionConfig {
        api_key: Some("sk-test".into()),
        model: "gpt-4o-mini".into(),
        base_url: format!("{}/v1/", server.uri()),
        request_timeout_secs: 5,
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user("Great coffee")],
        max_tokens: 200,
        temperature: 0.4,
    }
}

#[tokio::test]
async fn sends_model_sampling_and_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 200,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": "Great coffee" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Thank you!  \n")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&config_for(&server)).unwrap();
    let reply = client.complete(&request()).await.unwrap();
    assert_eq!(reply, "Thank you!");
}

#[tokio::test]
async fn non_success_status_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&config_for(&server)).unwrap();
    match client.complete(&request()).await {
        Err(CompletionError::Server { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_content_is_an_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&config_for(&server)).unwrap();
    assert!(matches!(
        client.complete(&request()).await,
        Err(CompletionError::EmptyResponse)
    ));
}

#[test]
fn missing_api_key_is_rejected() {
    let config = CompletionConfig {
        api_key: Some("   ".into()),
        ..CompletionConfig::default()
    };
    assert!(matches!(
        OpenAiClient::new(&config),
        Err(ConfigError::MissingApiKey)
    ));
}

#[tokio::test]
async fn drafter_recovers_from_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Gracias, Ana")))
        .mount(&server)
        .await;

    let client = Arc::new(OpenAiClient::new(&config_for(&server)).unwrap());
    let drafter = Drafter::new(
        client,
        DrafterConfig {
            backoff_base_ms: 10,
            ..DrafterConfig::default()
        },
    );

    assert_eq!(drafter.draft("Ana", "Muy rico", "").await, "Gracias, Ana");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn drafter_falls_back_when_service_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = Arc::new(OpenAiClient::new(&config_for(&server)).unwrap());
    let drafter = Drafter::new(
        client,
        DrafterConfig {
            backoff_base_ms: 10,
            ..DrafterConfig::default()
        },
    );

    assert_eq!(drafter.draft("Ana", "Muy rico", "").await, FALLBACK_RESPONSE);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
