use prompt_lab_core::{GenerationRequest, LabError, ModelClient, ModelSettings};
use prompt_lab_workflow::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(case_id: &str, strategy: &str) -> GenerationRequest {
    GenerationRequest::new(case_id, strategy, "prompt text")
}

fn live_settings(server: &MockServer) -> ModelSettings {
    ModelSettings {
        api_base: server.uri(),
        api_key: Some("test-key".to_string()),
        rate_limit_backoff_secs: 0,
        max_retries: 3,
        ..ModelSettings::default()
    }
}

fn candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ], "role": "model" } }
        ]
    })
}

const ENDPOINT: &str = "/models/gemini-2.5-flash:generateContent";

// ===== Stub Client Tests =====

#[tokio::test]
async fn test_stub_answers_by_case_id() {
    let client = StubModelClient::for_builtin_tasks();
    assert_eq!(
        client.generate(&request("sentiment-meeting", "few_shot")).await.unwrap(),
        "Nötr"
    );
    let solution = client
        .generate(&request("equations-tickets", "vanilla"))
        .await
        .unwrap();
    assert!(solution.ends_with("Yetişkin bileti: 12 TL"));
}

#[tokio::test]
async fn test_stub_strategy_override_wins() {
    let client = StubModelClient::new()
        .with_response("a", "generic")
        .with_strategy_response("a", "few_shot", "specific");

    assert_eq!(client.generate(&request("a", "few_shot")).await.unwrap(), "specific");
    assert_eq!(client.generate(&request("a", "zero_shot")).await.unwrap(), "generic");
}

#[tokio::test]
async fn test_stub_unknown_case_uses_fallback() {
    let client = StubModelClient::new();
    assert_eq!(
        client.generate(&request("nope", "vanilla")).await.unwrap(),
        STUB_FALLBACK_RESPONSE
    );

    let client = StubModelClient::new().with_fallback("custom");
    assert_eq!(client.generate(&request("nope", "vanilla")).await.unwrap(), "custom");
}

#[tokio::test]
async fn test_stub_failure_and_call_recording() {
    let client = StubModelClient::new().with_failure("bad", None);
    let err = client.generate(&request("bad", "vanilla")).await.unwrap_err();
    assert!(matches!(err, LabError::ModelGeneration(_)));
    assert!(err.is_trial_scoped());

    client.generate(&request("good", "vanilla")).await.unwrap();
    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].case_id, "good");
}

// ===== Client Selection Tests =====

#[test]
fn test_mock_mode_selects_stub() {
    let settings = ModelSettings {
        mock_mode: true,
        ..ModelSettings::default()
    };
    let client = client_from_settings(&settings).unwrap();
    assert_eq!(client.name(), "stub");
}

#[test]
fn test_live_mode_without_key_is_configuration_error() {
    let settings = ModelSettings {
        api_key: None,
        ..ModelSettings::default()
    };
    let err = client_from_settings(&settings).err().unwrap();
    assert!(matches!(err, LabError::Configuration(_)));
}

// ===== Gemini Client Tests =====

#[tokio::test]
async fn test_gemini_returns_trimmed_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [ { "parts": [ { "text": "prompt text" } ] } ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("  Olumlu \n")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(live_settings(&server)).unwrap();
    let text = client.generate(&request("c", "zero_shot")).await.unwrap();
    assert_eq!(text, "Olumlu");
    assert_eq!(client.name(), "gemini-2.5-flash");
}

#[tokio::test]
async fn test_gemini_retries_after_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("Nötr")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(live_settings(&server)).unwrap();
    assert_eq!(client.generate(&request("c", "zero_shot")).await.unwrap(), "Nötr");
}

#[tokio::test]
async fn test_gemini_gives_up_after_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let client = GeminiClient::new(live_settings(&server)).unwrap();
    let err = client.generate(&request("c", "zero_shot")).await.unwrap_err();
    assert!(matches!(err, LabError::ModelGeneration(_)));
}

#[tokio::test]
async fn test_gemini_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(live_settings(&server)).unwrap();
    let err = client.generate(&request("c", "zero_shot")).await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_gemini_empty_candidates_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(live_settings(&server)).unwrap();
    let err = client.generate(&request("c", "zero_shot")).await.unwrap_err();
    assert!(matches!(err, LabError::ModelGeneration(_)));
}
