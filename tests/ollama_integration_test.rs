//! Ollama adapter end to end against a mock server

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use genadapt::config::env::{OLLAMA_HOST, OLLAMA_MODEL};
use genadapt::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "support/stream_fixture.rs"]
mod support;

fn ollama_env(server: &MockServer) -> EnvSnapshot {
    EnvSnapshot::from_pairs([(OLLAMA_HOST, server.uri())])
}

fn generator(
    server: &MockServer,
    config: ProviderConfig,
    extra_env: &[(&str, &str)],
) -> Box<dyn ContentGenerator> {
    let mut pairs = vec![(OLLAMA_HOST.to_string(), server.uri())];
    pairs.extend(extra_env.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    let env = EnvSnapshot::from_pairs(pairs);
    create_content_generator(Arc::new(config), AuthMode::UseOpenAi, &env).unwrap()
}

fn chat_reply(text: &str) -> serde_json::Value {
    json!({
        "model": "qwen3-coder",
        "created_at": "2025-06-01T10:00:00Z",
        "message": {"role": "assistant", "content": text},
        "done": true,
        "prompt_eval_count": 3,
        "eval_count": 1
    })
}

#[tokio::test]
async fn generate_content_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let generator = generator(&server, ProviderConfig::new("qwen3-coder"), &[]);
    assert_eq!(generator.backend(), "ollama");

    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let response = generator.generate_content(request).await.unwrap();

    assert_eq!(response.text().as_deref(), Some("hello"));
    assert_eq!(response.finish_reason(), Some(FinishReason::Stop));
    assert_eq!(response.candidates[0].content.role, Role::Model);
    let usage = response.usage_metadata.unwrap();
    assert_eq!(usage.prompt_token_count, Some(3));
    assert_eq!(usage.total_token_count, Some(4));
}

#[tokio::test]
async fn request_body_carries_defaults_and_env_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("ok")))
        .mount(&server)
        .await;

    let generator = generator(
        &server,
        ProviderConfig::new("ignored"),
        &[(OLLAMA_MODEL, "llama3.2")],
    );
    let request = GenerateContentRequest::new(
        "request-model",
        vec![Content::user(""), Content::user("hi")],
    )
    .with_system_instruction(Content::system("be brief"))
    .with_config(GenerationConfig::default().with_temperature(0.2))
    .with_tools(vec![Tool::functions(vec![FunctionDeclaration {
        name: "lookup".into(),
        description: None,
        parameters: None,
    }])]);
    generator.generate_content(request).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["model"], "llama3.2");
    assert_eq!(body["stream"], false);
    assert!(body.get("tools").is_none());

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2, "empty turns are dropped");
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["content"], "hi");

    let options = &body["options"];
    assert!((options["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    assert_eq!(options["top_p"], 1.0);
    assert_eq!(options["max_tokens"], 4096);

    let auth = received[0].headers.get("authorization").unwrap();
    assert_eq!(auth.to_str().unwrap(), "Bearer ollama");
}

#[tokio::test]
async fn configured_model_is_used_when_the_request_names_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("ok")))
        .mount(&server)
        .await;

    let generator = generator(&server, ProviderConfig::new("llama3.2"), &[]);
    let request = GenerateContentRequest::new("", vec![Content::user("hi")]);
    generator.generate_content(request).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["model"], "llama3.2");
}

/// Read one HTTP/1.1 request, headers and body, off the socket.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the request was complete");
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map_or(0, |v| v.trim().parse::<usize>().unwrap());
        while buf.len() < end + 4 + length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-body");
            buf.extend_from_slice(&chunk[..n]);
        }
        return;
    }
}

/// Local server answering one request with a chunked body, waiting `gap`
/// before each chunk. Returns the base URL.
async fn slow_chunked_server(
    content_type: &'static str,
    chunks: Vec<String>,
    gap: Duration,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\n\
             Transfer-Encoding: chunked\r\n\r\n"
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        for chunk in chunks {
            tokio::time::sleep(gap).await;
            let framed = format!("{:x}\r\n{chunk}\r\n", chunk.len());
            // The client may already have given up.
            if socket.write_all(framed.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
        }
        let _ = socket.write_all(b"0\r\n\r\n").await;
        let _ = socket.flush().await;
    });
    base_url
}

fn slow_generator(base_url: String) -> Box<dyn ContentGenerator> {
    let env = EnvSnapshot::from_pairs([(OLLAMA_HOST, base_url)]);
    let config = ProviderConfig::new("qwen3-coder")
        .with_timeout(Duration::from_secs(1))
        .with_max_retries(0);
    create_content_generator(Arc::new(config), AuthMode::UseOpenAi, &env).unwrap()
}

#[tokio::test]
async fn stream_outlives_the_request_timeout_while_frames_keep_coming() {
    let frames: Vec<String> = ["Hel", "lo", ""]
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let done = i == 2;
            let mut frame = json!({
                "model": "qwen3-coder",
                "message": {"role": "assistant", "content": text},
                "done": done
            });
            if done {
                frame["prompt_eval_count"] = json!(3);
                frame["eval_count"] = json!(2);
            }
            format!("{frame}\n")
        })
        .collect();
    // Three 600 ms gaps: each under the 1 s timeout, together well over it.
    let base_url =
        slow_chunked_server("application/x-ndjson", frames, Duration::from_millis(600)).await;

    let generator = slow_generator(base_url);
    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let started = std::time::Instant::now();
    let items: Vec<_> = generator
        .generate_content_stream(request)
        .await
        .unwrap()
        .collect()
        .await;

    assert!(started.elapsed() > Duration::from_secs(1));
    assert!(items.iter().all(|r| r.is_ok()), "{items:?}");
    let increments: Vec<_> = items.into_iter().map(|r| r.unwrap()).collect();
    let text: String = increments.iter().filter_map(|i| i.text()).collect();
    assert_eq!(text, "Hello");
    let last = increments.last().unwrap();
    assert_eq!(last.finish_reason(), Some(FinishReason::Stop));
    assert_eq!(last.usage_metadata.as_ref().unwrap().total_token_count, Some(5));
}

#[tokio::test]
async fn single_shot_response_is_bounded_by_the_request_timeout() {
    let body = chat_reply("slow").to_string();
    let third = body.len() / 3;
    let chunks = vec![
        body[..third].to_string(),
        body[third..2 * third].to_string(),
        body[2 * third..].to_string(),
    ];
    let base_url =
        slow_chunked_server("application/json", chunks, Duration::from_millis(600)).await;

    let generator = slow_generator(base_url);
    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let err = generator.generate_content(request).await.unwrap_err();
    assert!(matches!(err, LlmError::TransportError { .. }), "{err:?}");
}

#[tokio::test]
async fn streams_ndjson_fixture() {
    let server = MockServer::start().await;
    let body = support::fixture_bytes("tests/fixtures/ollama/chat_stream_stop.ndjson");
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let generator = generator(&server, ProviderConfig::new("qwen3-coder"), &[]);
    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let increments: Vec<_> = generator
        .generate_content_stream(request)
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;

    let text: String = increments.iter().filter_map(|i| i.text()).collect();
    assert_eq!(text, "Hello, wörld ✓");
    let last = increments.last().unwrap();
    assert_eq!(last.finish_reason(), Some(FinishReason::Stop));
    assert_eq!(last.usage_metadata.as_ref().unwrap().total_token_count, Some(17));
    assert!(
        increments[..increments.len() - 1]
            .iter()
            .all(|i| i.finish_reason().is_none())
    );

    let sent: serde_json::Value =
        serde_json::from_slice(&server.received_requests().await.unwrap()[0].body).unwrap();
    assert_eq!(sent["stream"], true);
}

#[tokio::test]
async fn malformed_stream_line_is_skipped() {
    let server = MockServer::start().await;
    let body = support::fixture_bytes("tests/fixtures/ollama/chat_stream_with_garbage.ndjson");
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let generator = generator(&server, ProviderConfig::new("qwen3-coder"), &[]);
    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let increments: Vec<_> = generator
        .generate_content_stream(request)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(increments.len(), 2);
    let texts: Vec<_> = increments
        .iter()
        .map(|r| r.as_ref().unwrap().text().unwrap_or_default())
        .collect();
    assert_eq!(texts, ["first", " second"]);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "model not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let generator = generator(&server, ProviderConfig::new("qwen3-coder"), &[]);
    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let err = generator.generate_content(request).await.unwrap_err();

    match err {
        LlmError::ApiError {
            code,
            message,
            details,
        } => {
            assert_eq!(code, 400);
            assert!(message.contains("ollama"));
            assert!(message.contains("/api/chat"));
            assert_eq!(details.unwrap()["error"], "model not found");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("recovered")))
        .mount(&server)
        .await;

    let generator = generator(
        &server,
        ProviderConfig::new("qwen3-coder").with_max_retries(1),
        &[],
    );
    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let response = generator.generate_content(request).await.unwrap();

    assert_eq!(response.text().as_deref(), Some("recovered"));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn retries_stop_at_the_configured_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let generator = generator(
        &server,
        ProviderConfig::new("qwen3-coder").with_max_retries(2),
        &[],
    );
    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let err = generator.generate_content(request).await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let server = MockServer::start().await;
    let env = ollama_env(&server);
    let config = ProviderConfig::new("qwen3-coder")
        .with_base_url("http://127.0.0.1:1")
        .with_max_retries(0);
    let generator = create_content_generator(Arc::new(config), AuthMode::UseOpenAi, &env).unwrap();

    let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("hi")]);
    let err = generator.generate_content(request).await.unwrap_err();

    match &err {
        LlmError::TransportError { backend, url, .. } => {
            assert_eq!(*backend, "ollama");
            assert_eq!(url, "http://127.0.0.1:1/api/chat");
        }
        other => panic!("unexpected error {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("ollama") && msg.contains("127.0.0.1:1"));
}

#[tokio::test]
async fn count_and_embed_degrade_locally() {
    let server = MockServer::start().await;
    let generator = generator(&server, ProviderConfig::new("qwen3-coder"), &[]);

    let counted = generator
        .count_tokens(CountTokensRequest {
            model: "qwen3-coder".into(),
            contents: vec![Content::user("a".repeat(400))],
        })
        .await
        .unwrap();
    assert_eq!(counted.total_tokens, 100);

    let embedded = generator
        .embed_content(EmbedContentRequest {
            model: "qwen3-coder".into(),
            contents: vec![Content::user("a"), Content::user("b")],
        })
        .await
        .unwrap();
    assert_eq!(embedded.embeddings.len(), 2);
    assert!(embedded.embeddings.iter().all(|e| e.is_unsupported()));
    assert!(server.received_requests().await.unwrap().is_empty());
}
