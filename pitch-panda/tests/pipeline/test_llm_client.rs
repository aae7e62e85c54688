//! OpenAI client against a local mock of the chat-completions endpoint

use pitch_panda::llm::{
    complete_json, complete_text, ChatMessage, ChatRequest, LlmClient, LlmError, OpenAiClient,
    OpenAiConfig,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, max_retries: u32) -> OpenAiClient {
    let mut config = OpenAiConfig::new("sk-test");
    config.base_url = format!("{}/v1", server.uri());
    config.max_retries = max_retries;
    config.base_delay = Duration::from_millis(10);
    config.timeout_secs = 5;
    OpenAiClient::new(config).unwrap()
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "gpt-4o",
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
}

fn request() -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::system("Reply with JSON."),
        ChatMessage::user("Say hi"),
    ])
}

#[derive(Debug, Deserialize)]
struct Greeting {
    greeting: String,
}

#[tokio::test]
async fn test_server_error_then_success_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(r#"{"greeting": "hi"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 3);
    let greeting: Greeting = complete_json(&client, request()).await.unwrap();
    assert_eq!(greeting.greeting, "hi");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 3);
    let err = client.complete(request()).await.unwrap_err();

    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "bad request");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retries_give_up_after_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server, 2);
    let err = client.complete(request()).await.unwrap_err();
    assert!(matches!(err, LlmError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_json_mode_and_auth_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(completion("```json\n{\"greeting\": \"hello\"}\n```"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let greeting: Greeting = complete_json(&client, request().with_model("gpt-4o-mini"))
        .await
        .unwrap();
    assert_eq!(greeting.greeting, "hello");
}

#[tokio::test]
async fn test_empty_completion_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("   "))
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let err = complete_text(&client, request()).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn test_prose_wrapped_json_is_extracted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(
            "Here is the result: {\"greeting\": \"hey\"} Let me know if you need more.",
        ))
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let greeting: Greeting = complete_json(&client, request()).await.unwrap();
    assert_eq!(greeting.greeting, "hey");
}
