//! Classification pipeline integration tests.
//!
//! Drives `TabOrganizer` end to end over an in-memory window and a scripted
//! reasoning service:
//! - Rules resolve first and are never second-guessed
//! - Unresolved tabs are re-indexed densely and mapped back
//! - Invalid remote partitions are rejected before anything is applied
//! - Remote failures propagate unchanged
//!
//! These tests do NOT require an API key or network access, apart from one
//! connection attempt to a closed local port.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use intellitab::host::{HostTab, SnapshotHost, WindowSnapshot};
use intellitab::llm::{CompletionRequest, LlmHttpConfig, LlmProvider, OpenAiClient};
use intellitab::{
    ClassificationResult, Error, MemoryStore, Rule, StateStore, TabGroup, TabId, TabOrganizer,
};
use secrecy::SecretString;

/// Reasoning service double that replays canned answers in order.
struct ScriptedService {
    answers: Mutex<Vec<intellitab::Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedService {
    fn new(answers: Vec<intellitab::Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn answering(json: &str) -> Arc<Self> {
        Self::new(vec![Ok(json.to_string())])
    }

    fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl LlmProvider for ScriptedService {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn complete(&self, _: &SecretString, request: &CompletionRequest) -> intellitab::Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.answers
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| panic!("unexpected remote call"))
    }
}

fn tab(id: i64, url: &str, title: &str) -> HostTab {
    HostTab {
        id: TabId::new(id),
        url: Some(url.to_string()),
        title: Some(title.to_string()),
        last_accessed: Some(1_700_000_000_000),
        group_id: None,
    }
}

fn window(tabs: Vec<HostTab>) -> Arc<SnapshotHost> {
    Arc::new(SnapshotHost::in_memory(WindowSnapshot {
        tabs,
        groups: Vec::new(),
    }))
}

fn organizer(host: Arc<SnapshotHost>, service: Arc<ScriptedService>) -> TabOrganizer {
    let state = StateStore::new(Arc::new(MemoryStore::new()));
    state.set_credential("gsk_test").unwrap();
    TabOrganizer::new(state, host, service)
}

#[test]
fn test_rules_then_remote_example() {
    let host = window(vec![
        tab(4101, "https://github.com/rust-lang/rust", "rust-lang/rust"),
        tab(4102, "https://reddit.com/r/programming", "r/programming"),
        tab(4103, "https://news.ycombinator.com/item?id=1", "Hacker News"),
    ]);
    let service = ScriptedService::answering(
        r#"{"groups":[{"groupName":"Read Later","tabIds":[0,1]}],"closeRecommendations":[]}"#,
    );
    let organizer = organizer(host, service.clone());

    let result = organizer.analyze_tabs().unwrap();

    assert_eq!(
        result,
        ClassificationResult {
            groups: vec![
                TabGroup::new("Dev", vec![TabId::new(4101)]),
                TabGroup::new("Read Later", vec![TabId::new(4102), TabId::new(4103)]),
            ],
            close_recommendations: Vec::new(),
        }
    );
    assert_eq!(service.call_count(), 1);
}

#[test]
fn test_rules_only_window_never_calls_remote() {
    let host = window(vec![
        tab(1, "https://mail.google.com/mail/u/0", "Inbox"),
        tab(2, "https://chatgpt.com/c/abc", "ChatGPT"),
        tab(3, "https://web.whatsapp.com/", "WhatsApp"),
    ]);
    let service = ScriptedService::new(Vec::new());
    let organizer = organizer(host, service.clone());

    let result = organizer.analyze_tabs().unwrap();

    assert_eq!(service.call_count(), 0);
    assert_eq!(
        result.groups,
        vec![
            TabGroup::new("Communication", vec![TabId::new(1), TabId::new(3)]),
            TabGroup::new("AI", vec![TabId::new(2)]),
        ]
    );
}

#[test]
fn test_empty_window() {
    let service = ScriptedService::new(Vec::new());
    let organizer = organizer(window(Vec::new()), service.clone());

    assert_eq!(
        organizer.analyze_tabs().unwrap(),
        ClassificationResult::default()
    );
    assert_eq!(service.call_count(), 0);
}

#[test]
fn test_custom_rules_take_priority() {
    let host = window(vec![
        tab(1, "https://github.com/acme/infra", "infra"),
        tab(2, "https://github.com/me/dotfiles", "dotfiles"),
    ]);
    let organizer = organizer(host, ScriptedService::new(Vec::new()));
    organizer
        .state()
        .save_rules(&[
            Rule::group("w", "github.com/acme", "Work"),
            Rule::group("d", "github.com", "Dev"),
        ])
        .unwrap();

    let result = organizer.analyze_tabs().unwrap();
    assert_eq!(
        result.groups,
        vec![
            TabGroup::new("Work", vec![TabId::new(1)]),
            TabGroup::new("Dev", vec![TabId::new(2)]),
        ]
    );
}

#[test]
fn test_invalid_partition_is_rejected_and_nothing_applied() {
    let host = window(vec![
        tab(1, "https://reddit.com/", "reddit"),
        tab(2, "https://example.org/", "example"),
    ]);
    let service = ScriptedService::answering(
        r#"{"groups":[{"groupName":"A","tabIds":[0,1]},{"groupName":"B","tabIds":[1]}]}"#,
    );
    let organizer = organizer(host.clone(), service);

    let err = organizer.analyze_tabs().unwrap_err();

    assert!(matches!(err, Error::RemoteSchema(_)), "got {err:?}");
    assert!(host.snapshot().unwrap().groups.is_empty());
    assert!(organizer.state().last_action().unwrap().is_none());
}

#[test]
fn test_remote_transport_error_propagates() {
    let host = window(vec![tab(1, "https://reddit.com/", "reddit")]);
    let service = ScriptedService::new(vec![Err(Error::RemoteTransport {
        status: 401,
        body: r#"{"error":{"message":"Invalid API Key"}}"#.to_string(),
    })]);
    let organizer = organizer(host, service);

    let err = organizer.analyze_tabs().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("401"));
    assert!(message.contains("Invalid API Key"));
}

#[test]
fn test_missing_credential_is_checked_before_anything_else() {
    let host = window(vec![tab(1, "https://github.com/", "GitHub")]);
    let service = ScriptedService::new(Vec::new());
    let state = StateStore::new(Arc::new(MemoryStore::new()));
    let organizer = TabOrganizer::new(state, host, service.clone());

    let err = organizer.analyze_tabs().unwrap_err();
    assert!(err.is_missing_credential());
    assert_eq!(service.call_count(), 0);
}

#[test]
fn test_analyze_then_apply_records_last_action() {
    let host = window(vec![
        tab(1, "https://github.com/", "GitHub"),
        tab(2, "https://arxiv.org/abs/1", "Paper"),
        tab(3, "https://old.example.com/", "Stale"),
    ]);
    let service = ScriptedService::answering(
        r#"{"groups":[{"groupName":"Study","tabIds":[0]}],"closeRecommendations":[1]}"#,
    );
    let organizer = organizer(host.clone(), service);

    let result = organizer.analyze_tabs().unwrap();
    assert_eq!(result.close_recommendations, vec![TabId::new(3)]);

    let action = organizer.apply_result(&result).unwrap();
    assert_eq!(action.tabs_organized, 2);
    assert_eq!(action.close_recommendations, 1);

    let window = host.snapshot().unwrap();
    assert_eq!(window.groups.len(), 2);
    let stale = window.tabs.iter().find(|t| t.id == TabId::new(3)).unwrap();
    assert!(stale.group_id.is_none());

    let stored = organizer.state().last_action().unwrap().unwrap();
    assert_eq!(stored, action);
}

#[test]
fn test_unreachable_endpoint_is_operation_failure() {
    let client = OpenAiClient::new()
        .with_endpoint("http://127.0.0.1:1/v1")
        .with_http_config(LlmHttpConfig {
            timeout_ms: 2_000,
            connect_timeout_ms: 500,
        });
    let request = CompletionRequest::json(Vec::new(), 0.0);

    let err = client
        .complete(&SecretString::from("gsk_test"), &request)
        .unwrap_err();
    assert!(matches!(err, Error::OperationFailed { .. }), "got {err:?}");
}
