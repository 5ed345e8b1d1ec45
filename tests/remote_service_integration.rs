//! Chat-completions client integration tests.
//!
//! A one-shot HTTP responder on 127.0.0.1 stands in for the reasoning
//! service, so the real `OpenAiClient` request and status mapping run
//! without network access.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use intellitab::Error;
use intellitab::llm::{ChatMessage, CompletionRequest, LlmProvider, OpenAiClient};
use secrecy::SecretString;

/// A request as received by the responder.
struct CapturedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Serves exactly one response, then hands back what it received.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/openai/v1", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (key, value) = line.split_once(':').unwrap();
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }

        let length: usize = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .map_or(0, |(_, value)| value.parse().unwrap());
        let mut raw = vec![0; length];
        reader.read_exact(&mut raw).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();

        CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(raw).unwrap(),
        }
    });

    (endpoint, handle)
}

fn grouping_request() -> CompletionRequest {
    CompletionRequest::json(
        vec![ChatMessage::system("sys"), ChatMessage::user("tabs")],
        0.0,
    )
}

#[test]
fn test_unauthorized_status_maps_to_remote_transport() {
    let error_body = r#"{"error":{"message":"Invalid API Key"}}"#;
    let (endpoint, server) = serve_once("HTTP/1.1 401 Unauthorized", error_body);
    let client = OpenAiClient::new().with_endpoint(endpoint);

    let err = client
        .complete(&SecretString::from("gsk_test"), &grouping_request())
        .unwrap_err();

    match err {
        Error::RemoteTransport { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, error_body);
        },
        other => panic!("expected RemoteTransport, got {other:?}"),
    }

    let captured = server.join().unwrap();
    assert_eq!(
        captured.request_line,
        "POST /openai/v1/chat/completions HTTP/1.1"
    );
    assert_eq!(captured.header("authorization"), Some("Bearer gsk_test"));

    let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent["response_format"]["type"], "json_object");
    assert_eq!(sent["model"], OpenAiClient::DEFAULT_MODEL);
    assert_eq!(sent["messages"][1]["content"], "tabs");
}

#[test]
fn test_server_error_keeps_status_and_body() {
    let (endpoint, server) = serve_once("HTTP/1.1 500 Internal Server Error", "upstream overloaded");
    let client = OpenAiClient::new().with_endpoint(endpoint);

    let err = client
        .complete(&SecretString::from("gsk_test"), &grouping_request())
        .unwrap_err();
    server.join().unwrap();

    assert!(
        matches!(&err, Error::RemoteTransport { status: 500, body } if body == "upstream overloaded"),
        "got {err:?}"
    );
}

#[test]
fn test_success_returns_completion_content() {
    let (endpoint, server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"{\"groups\":[]}"}}]}"#,
    );
    let client = OpenAiClient::new().with_endpoint(endpoint);

    let completion = client
        .complete(&SecretString::from("gsk_test"), &grouping_request())
        .unwrap();
    server.join().unwrap();

    assert_eq!(completion, r#"{"groups":[]}"#);
}
