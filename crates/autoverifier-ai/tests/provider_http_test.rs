use autoverifier_ai::{GeminiConfig, GeminiProvider, GenerationConfig, LLMProvider, Message};
use httpmock::prelude::*;
use serde_json::json;

fn gemini_for(server: &MockServer, max_retries: u32) -> GeminiProvider {
    GeminiProvider::new(GeminiConfig {
        api_key: "test-key".to_string(),
        base_url: server.base_url(),
        model: "gemini-1.5-flash".to_string(),
        context_window: 1_000_000,
        timeout_secs: 5,
        max_retries,
    })
    .unwrap()
}

#[tokio::test]
async fn test_gemini_generate_concatenates_parts() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-1.5-flash:generateContent")
                .header("x-goog-api-key", "test-key")
                .json_body_includes(
                    json!({
                        "systemInstruction": {
                            "parts": [{"text": "You are a professional fact-checker."}]
                        },
                        "contents": [{"role": "user", "parts": [{"text": "Verify this."}]}],
                        "generationConfig": {"responseMimeType": "application/json"}
                    })
                    .to_string(),
                );
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [
                                {"text": "{\"label\": \"SUPPORTED\", "},
                                {"text": "\"confidence\": 0.9, \"explanation\": \"ok\"}"}
                            ]
                        },
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": {
                        "promptTokenCount": 120,
                        "candidatesTokenCount": 20,
                        "totalTokenCount": 140
                    }
                }));
        })
        .await;

    let provider = gemini_for(&server, 0);
    let response = provider
        .generate_chat(
            &[
                Message::system("You are a professional fact-checker."),
                Message::user("Verify this."),
            ],
            &GenerationConfig::default().json(),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        response.content,
        "{\"label\": \"SUPPORTED\", \"confidence\": 0.9, \"explanation\": \"ok\"}"
    );
    assert_eq!(response.total_tokens, Some(140));
    assert_eq!(response.prompt_tokens, Some(120));
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    assert_eq!(response.model, "gemini-1.5-flash");
}

#[tokio::test]
async fn test_gemini_error_status_is_reported() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-1.5-flash:generateContent");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(json!({"error": {"message": "API key not valid"}}));
        })
        .await;

    let provider = gemini_for(&server, 0);
    let err = provider.generate("hello").await.unwrap_err();

    mock.assert_hits_async(1).await;
    let message = err.to_string();
    assert!(message.contains("Gemini API error"));
    assert!(message.contains("API key not valid"));
}

#[tokio::test]
async fn test_gemini_retries_failed_requests() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-1.5-flash:generateContent");
            then.status(503).body("overloaded");
        })
        .await;

    let provider = gemini_for(&server, 1);
    assert!(provider.generate("hello").await.is_err());

    // One initial attempt plus one retry
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_gemini_empty_candidates_is_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-1.5-flash:generateContent");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"candidates": []}));
        })
        .await;

    let provider = gemini_for(&server, 0);
    let err = provider.generate("hello").await.unwrap_err();
    assert!(err.to_string().contains("No candidates"));
}

#[tokio::test]
async fn test_gemini_available_when_model_endpoint_answers() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/models/gemini-1.5-flash");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"name": "models/gemini-1.5-flash"}));
        })
        .await;

    let provider = gemini_for(&server, 0);
    assert!(provider.is_available().await);
}

#[cfg(feature = "openai-compatible")]
mod openai_compatible {
    use super::*;
    use autoverifier_ai::openai_compatible_provider::{
        OpenAICompatibleConfig, OpenAICompatibleProvider,
    };

    #[tokio::test]
    async fn test_chat_completion_with_bearer_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("Authorization", "Bearer sk-test");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "id": "chatcmpl-1",
                        "object": "chat.completion",
                        "model": "llama3.1:8b",
                        "choices": [{
                            "index": 0,
                            "message": {"role": "assistant", "content": "reuters resignation statement"},
                            "finish_reason": "stop"
                        }],
                        "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
                    }));
            })
            .await;

        let provider = OpenAICompatibleProvider::new(OpenAICompatibleConfig {
            base_url: server.url("/v1"),
            model: "llama3.1:8b".to_string(),
            api_key: Some("sk-test".to_string()),
            max_retries: 0,
            ..Default::default()
        })
        .unwrap();

        let response = provider.generate("next query?").await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.content, "reuters resignation statement");
        assert_eq!(response.total_tokens, Some(14));
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    fn local_provider(server: &MockServer) -> OpenAICompatibleProvider {
        OpenAICompatibleProvider::new(OpenAICompatibleConfig {
            max_retries: 0,
            ..OpenAICompatibleConfig::local_server("lmstudio", &server.base_url(), "qwen2.5-7b")
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_json_mode_sends_response_format() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .json_body_includes(
                        json!({
                            "model": "qwen2.5-7b",
                            "messages": [
                                {"role": "system", "content": "You are a professional fact-checker."},
                                {"role": "user", "content": "Verify this."}
                            ],
                            "response_format": {"type": "json_object"}
                        })
                        .to_string(),
                    );
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "choices": [{
                            "message": {"role": "assistant", "content": "{\"label\": \"REFUTED\"}"},
                            "finish_reason": "stop"
                        }]
                    }));
            })
            .await;

        let provider = local_provider(&server);
        let response = provider
            .generate_chat(
                &[
                    Message::system("You are a professional fact-checker."),
                    Message::user("Verify this."),
                ],
                &GenerationConfig::default().json(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "{\"label\": \"REFUTED\"}");
        assert_eq!(response.model, "qwen2.5-7b");
        assert_eq!(response.total_tokens, None);
    }

    #[tokio::test]
    async fn test_unauthorized_models_endpoint_is_unavailable() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/models");
                then.status(401)
                    .header("content-type", "application/json")
                    .json_body(json!({"error": {"message": "Invalid API key"}}));
            })
            .await;

        let provider = local_provider(&server);
        assert!(!provider.is_available().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_models_endpoint_success_is_available() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/models");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"object": "list", "data": [{"id": "qwen2.5-7b"}]}));
            })
            .await;

        assert!(local_provider(&server).is_available().await);
    }
}
