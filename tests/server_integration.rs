//! Integration tests that drive the snippet-ls binary over stdio.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Tests use expect/unwrap for clear failure messages"
)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};
use snippet_ls::event_log::{EventKind, read_events};
use snippet_ls::lsp::FrameReader;

const URI: &str = "file:///tmp/Screen.tsx";

fn frame(value: &Value) -> Vec<u8> {
    let body = value.to_string();
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body).into_bytes()
}

fn request(id: i64, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

fn notification(method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "method": method, "params": params })
}

fn did_change(text: &str) -> Value {
    notification(
        "textDocument/didChange",
        json!({
            "textDocument": { "uri": URI, "version": 1 },
            "contentChanges": [{ "text": text }]
        }),
    )
}

fn completion(id: i64, line: u32, character: u32) -> Value {
    request(
        id,
        "textDocument/completion",
        json!({
            "textDocument": { "uri": URI },
            "position": { "line": line, "character": character }
        }),
    )
}

/// Spawn the server, write `chunks` to stdin (pausing between them), close
/// stdin and collect the output.
fn run(log_file: &Path, chunks: &[Vec<u8>]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_snippet-ls"))
        .arg("--stdio")
        .arg("--log-file")
        .arg(log_file)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn snippet-ls");

    {
        let mut stdin = child.stdin.take().expect("Failed to get stdin");
        for chunk in chunks {
            // The server may already have exited; a broken pipe is expected then.
            if stdin.write_all(chunk).is_err() || stdin.flush().is_err() {
                break;
            }
            if chunks.len() > 1 {
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    child.wait_with_output().expect("Failed to wait for snippet-ls")
}

fn responses(output: &Output) -> Vec<Value> {
    FrameReader::new()
        .feed(&output.stdout)
        .iter()
        .map(|body| serde_json::from_str(body).unwrap())
        .collect()
}

#[test]
fn test_full_session() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("events.jsonl");

    let mut input = frame(&request(1, "initialize", json!({ "capabilities": {} })));
    input.extend(frame(&notification("initialized", json!({}))));
    input.extend(frame(&did_change("export default () => (\n  Pressable0onPress(go)\n);")));
    input.extend(frame(&completion(2, 1, 23)));
    input.extend(frame(&request(3, "shutdown", Value::Null)));
    input.extend(frame(&notification("exit", Value::Null)));

    let output = run(&log, &[input]);
    assert_eq!(output.status.code(), Some(0));

    let out = responses(&output);
    assert_eq!(out.len(), 3);
    assert_eq!(out[0]["id"], 1);
    assert_eq!(out[0]["result"]["capabilities"]["textDocumentSync"], 1);

    assert_eq!(out[1]["id"], 2);
    let first = &out[1]["result"]["items"][0];
    assert_eq!(first["label"], "dynamic snippet");
    assert_eq!(
        first["textEdit"]["newText"],
        "<Pressable onPress={${1:go}}>\n  ${2}\n</Pressable>"
    );
    assert_eq!(first["textEdit"]["range"]["start"]["character"], 0);
    assert_eq!(first["textEdit"]["range"]["end"]["character"], 23);

    assert_eq!(out[2]["id"], 3);
    assert!(out[2]["result"].is_null());

    let events = read_events(&log).unwrap();
    assert!(matches!(events[0].kind, EventKind::Started { .. }));
    assert!(events.iter().any(|e| e.kind
        == EventKind::Completion {
            line: 1,
            input: "Pressable0onPress(go)".to_string(),
            dynamic: true,
        }));
    assert!(events.iter().any(|e| e.kind == EventKind::Shutdown));
    assert_eq!(events.last().unwrap().kind, EventKind::Exit { code: 0 });
}

#[test]
fn test_exit_without_shutdown_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &dir.path().join("events.jsonl"),
        &[frame(&notification("exit", Value::Null))],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_closed_input_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("events.jsonl");
    let output = run(&log, &[frame(&request(1, "initialize", json!({})))]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(responses(&output).len(), 1);

    let events = read_events(&log).unwrap();
    assert_eq!(events.last().unwrap().kind, EventKind::InputClosed);
}

#[test]
fn test_split_writes() {
    let dir = tempfile::tempdir().unwrap();

    let mut input = frame(&did_change("View0style"));
    input.extend(frame(&completion(7, 0, 10)));
    input.extend(frame(&request(8, "shutdown", Value::Null)));
    input.extend(frame(&notification("exit", Value::Null)));

    // Split inside headers and bodies alike.
    let chunks: Vec<Vec<u8>> = input.chunks(11).map(<[u8]>::to_vec).collect();
    let output = run(&dir.path().join("events.jsonl"), &chunks);

    assert_eq!(output.status.code(), Some(0));
    let out = responses(&output);
    assert_eq!(out.len(), 2);
    assert_eq!(
        out[0]["result"]["items"][0]["textEdit"]["newText"],
        "<View style={${1:value}}>\n  ${2}\n</View>"
    );
    assert_eq!(out[1]["id"], 8);
}

#[test]
fn test_unknown_and_malformed_messages_are_skipped() {
    let dir = tempfile::tempdir().unwrap();

    let mut input = frame(&request(1, "textDocument/hover", json!({})));
    input.extend(b"Content-Length: 9\r\n\r\n{not json");
    input.extend(frame(&request(2, "shutdown", Value::Null)));
    input.extend(frame(&notification("exit", Value::Null)));

    let output = run(&dir.path().join("events.jsonl"), &[input]);

    assert_eq!(output.status.code(), Some(0));
    let out = responses(&output);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["id"], 2);
}

#[test]
fn test_invalid_shorthand_falls_back_to_catalog() {
    let dir = tempfile::tempdir().unwrap();

    let mut input = frame(&did_change("9lives0x"));
    input.extend(frame(&completion(1, 0, 8)));

    let output = run(&dir.path().join("events.jsonl"), &[input]);
    let out = responses(&output);

    let items = out[0]["result"]["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|i| i["label"] != "dynamic snippet"));
}
