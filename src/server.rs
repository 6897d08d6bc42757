// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Language server dispatch loop.
//!
//! Reads `Content-Length` framed JSON-RPC from an input stream, routes each
//! message to its handler in arrival order and writes framed responses.
//! Each message is fully handled, response included, before the next one is
//! looked at.

use anyhow::{Context, Result};
use lsp_types::{
    CompletionOptions, CompletionParams, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, InitializeResult, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, trace, warn};

use crate::completion::CompletionProvider;
use crate::config::Config;
use crate::document::DocumentStore;
use crate::event_log::{EventKind, EventLog};
use crate::lsp::{Envelope, FrameReader, ResponseMessage, encode_frame};

/// Connection lifecycle: `shutdown` then `exit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lifecycle {
    shutdown_requested: bool,
    exit_code: Option<i32>,
}

impl Lifecycle {
    /// Record that the client sent `shutdown`.
    pub const fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    /// Whether `shutdown` has been received.
    #[must_use]
    pub const fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Record `exit`: 0 after a clean shutdown, 1 otherwise.
    pub const fn exit(&mut self) -> i32 {
        let code = if self.shutdown_requested { 0 } else { 1 };
        self.exit_code = Some(code);
        code
    }

    /// The exit code, once `exit` has been received.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

/// Why [`Server::serve`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// The client sent `exit`.
    Exit(i32),
    /// The input stream ended without `exit`.
    InputClosed,
}

impl Stop {
    /// The process exit code for this outcome.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Exit(code) => code,
            Self::InputClosed => 0,
        }
    }
}

/// Single-client language server state.
pub struct Server {
    documents: DocumentStore,
    lifecycle: Lifecycle,
    completion: CompletionProvider,
    events: EventLog,
}

impl Server {
    /// Create a server with the given completion sources.
    #[must_use]
    pub fn new(completion: CompletionProvider, events: EventLog) -> Self {
        Self {
            documents: DocumentStore::new(),
            lifecycle: Lifecycle::default(),
            completion,
            events,
        }
    }

    /// Create a server from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config, events: EventLog) -> Self {
        Self::new(
            CompletionProvider::new(config.static_snippets, config.dynamic_tags),
            events,
        )
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Documents received so far.
    #[must_use]
    pub const fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Serve until `exit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the input or writing a response fails.
    pub async fn serve<R, W>(&mut self, reader: &mut R, writer: &mut W) -> Result<Stop>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut frames = FrameReader::new();
        let mut chunk = [0u8; 4096];

        self.events.record(EventKind::Started {
            version: crate::VERSION.to_string(),
        });
        info!("Language server started, waiting for initialize");

        loop {
            let n = reader
                .read(&mut chunk)
                .await
                .context("Failed to read from input")?;

            if n == 0 {
                info!("Input closed");
                self.events.record(EventKind::InputClosed);
                return Ok(Stop::InputClosed);
            }

            for body in frames.feed(&chunk[..n]) {
                trace!("Received: {}", body);

                if let Some(frame) = self.dispatch(&body) {
                    writer
                        .write_all(frame.as_bytes())
                        .await
                        .context("Failed to write response")?;
                    writer.flush().await.context("Failed to flush response")?;
                }

                if let Some(code) = self.lifecycle.exit_code() {
                    return Ok(Stop::Exit(code));
                }
            }
        }
    }

    /// Handle one message body, returning the framed response if any.
    pub fn dispatch(&mut self, body: &str) -> Option<String> {
        self.events.message("in", body);

        let envelope: Envelope = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping malformed message: {}", e);
                self.events.record(EventKind::Malformed {
                    error: e.to_string(),
                });
                return None;
            }
        };

        debug!("Handling {} (id={:?})", envelope.method, envelope.id);

        let result = match envelope.method.as_str() {
            "initialize" => Some(Self::handle_initialize()),
            "initialized" => {
                info!("Client initialized");
                None
            }
            "textDocument/didOpen" => {
                self.handle_did_open(envelope.params);
                None
            }
            "textDocument/didChange" => {
                self.handle_did_change(envelope.params);
                None
            }
            "textDocument/didClose" => {
                self.handle_did_close(envelope.params);
                None
            }
            "textDocument/completion" => Some(self.handle_completion(envelope.params)),
            "shutdown" => Some(self.handle_shutdown()),
            "exit" => {
                self.handle_exit();
                None
            }
            _ => {
                debug!("Ignoring unknown method: {}", envelope.method);
                None
            }
        };

        let (Some(result), Some(id)) = (result, envelope.id) else {
            return None;
        };

        let body = match serde_json::to_string(&ResponseMessage::new(id, result)) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                return None;
            }
        };

        trace!("Sending: {}", body);
        self.events.message("out", &body);
        Some(encode_frame(&body))
    }

    fn handle_initialize() -> Value {
        info!("Client connecting");

        to_result(&InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions::default()),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "snippet-ls".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    fn handle_did_open(&mut self, params: Value) {
        let Some(params) = parse_params::<DidOpenTextDocumentParams>("didOpen", params) else {
            return;
        };
        let doc = params.text_document;
        debug!("Opened {}", doc.uri.as_str());
        self.documents.set(doc.uri.as_str(), doc.text);
    }

    fn handle_did_change(&mut self, params: Value) {
        let Some(params) = parse_params::<DidChangeTextDocumentParams>("didChange", params) else {
            return;
        };
        let uri = params.text_document.uri;

        // Full sync: the last change carries the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.set(uri.as_str(), change.text);
        }
    }

    fn handle_did_close(&mut self, params: Value) {
        let Some(params) = parse_params::<DidCloseTextDocumentParams>("didClose", params) else {
            return;
        };
        debug!("Closed {}", params.text_document.uri.as_str());
        self.documents.remove(params.text_document.uri.as_str());
    }

    fn handle_completion(&self, params: Value) -> Value {
        let Some(params) = parse_params::<CompletionParams>("completion", params) else {
            return Value::Null;
        };
        let position = params.text_document_position.position;
        let uri = params.text_document_position.text_document.uri;

        let Some(text) = self.documents.get(uri.as_str()) else {
            error!("No content found for document {}", uri.as_str());
            self.events.record(EventKind::MissingDocument {
                uri: uri.as_str().to_string(),
            });
            return Value::Null;
        };

        let completion = self.completion.complete(text, position);
        debug!(
            "Completion at {}:{} input={:?} signals={:?}",
            position.line, position.character, completion.input, completion.classification
        );
        self.events.record(EventKind::Completion {
            line: position.line,
            input: completion.input,
            dynamic: completion.dynamic,
        });

        to_result(&completion.list)
    }

    fn handle_shutdown(&mut self) -> Value {
        info!("Received shutdown request");
        self.lifecycle.request_shutdown();
        self.events.record(EventKind::Shutdown);
        Value::Null
    }

    fn handle_exit(&mut self) {
        let code = self.lifecycle.exit();
        info!("Received exit notification, exiting with code {}", code);
        self.events.record(EventKind::Exit { code });
        self.events.flush();
    }
}

fn parse_params<T: DeserializeOwned>(method: &str, params: Value) -> Option<T> {
    match serde_json::from_value(params) {
        Ok(params) => Some(params),
        Err(e) => {
            warn!("Invalid {} params: {}", method, e);
            None
        }
    }
}

fn to_result<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        error!("Failed to serialize result: {}", e);
        Value::Null
    })
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Tests use expect/unwrap for clear failure messages"
)]
mod tests {
    use super::*;
    use serde_json::json;

    const URI: &str = "file:///tmp/App.tsx";

    fn server() -> Server {
        Server::new(CompletionProvider::default(), EventLog::disabled())
    }

    fn frame(value: &Value) -> Vec<u8> {
        encode_frame(&value.to_string()).into_bytes()
    }

    fn responses(data: &[u8]) -> Vec<Value> {
        let mut reader = FrameReader::new();
        reader
            .feed(data)
            .iter()
            .map(|body| serde_json::from_str(body).unwrap())
            .collect()
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
                "textDocument": { "uri": URI, "version": 2 },
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

    fn dispatch(server: &mut Server, message: &Value) -> Option<Value> {
        server.dispatch(&message.to_string()).map(|framed| {
            let mut out = responses(framed.as_bytes());
            assert_eq!(out.len(), 1);
            out.remove(0)
        })
    }

    #[test]
    fn test_initialize_capabilities() {
        let mut server = server();
        let resp = dispatch(&mut server, &request(1, "initialize", json!({}))).unwrap();

        assert_eq!(resp["id"], 1);
        assert_eq!(resp["jsonrpc"], "2.0");
        let caps = &resp["result"]["capabilities"];
        assert_eq!(caps["textDocumentSync"], 1);
        assert!(caps["completionProvider"].is_object());
        assert_eq!(resp["result"]["serverInfo"]["name"], "snippet-ls");
    }

    #[test]
    fn test_string_id_is_echoed() {
        let mut server = server();
        let message = json!({ "jsonrpc": "2.0", "id": "req-7", "method": "shutdown" });
        let resp = dispatch(&mut server, &message).unwrap();

        assert_eq!(resp["id"], "req-7");
        assert!(resp["result"].is_null());
        assert!(resp.as_object().unwrap().contains_key("result"));
    }

    #[test]
    fn test_unknown_method_is_ignored() {
        let mut server = server();
        assert!(dispatch(&mut server, &request(1, "textDocument/hover", json!({}))).is_none());
        assert!(dispatch(&mut server, &notification("$/cancelRequest", json!({}))).is_none());
    }

    #[test]
    fn test_malformed_body_is_dropped() {
        let mut server = server();
        assert!(server.dispatch("{not json").is_none());
        assert!(server.dispatch(r#"{"id":1}"#).is_none());
        assert_eq!(server.lifecycle().exit_code(), None);
    }

    #[test]
    fn test_notifications_never_respond() {
        let mut server = server();
        assert!(dispatch(&mut server, &notification("initialize", json!({}))).is_none());
        assert!(dispatch(&mut server, &did_change("View")).is_none());
    }

    #[test]
    fn test_did_change_stores_latest_text() {
        let mut server = server();
        dispatch(&mut server, &did_change("first"));
        dispatch(&mut server, &did_change("second"));

        assert_eq!(server.documents().get(URI), Some("second"));
    }

    #[test]
    fn test_did_open_and_close() {
        let mut server = server();
        let open = notification(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": URI,
                    "languageId": "typescriptreact",
                    "version": 1,
                    "text": "View"
                }
            }),
        );
        dispatch(&mut server, &open);
        assert_eq!(server.documents().get(URI), Some("View"));

        let close = notification(
            "textDocument/didClose",
            json!({ "textDocument": { "uri": URI } }),
        );
        dispatch(&mut server, &close);
        assert!(server.documents().is_empty());
    }

    #[test]
    fn test_completion_with_dynamic_tag() {
        let mut server = server();
        dispatch(&mut server, &did_change("const a = 1;\nView0style\n"));

        let resp = dispatch(&mut server, &completion(5, 1, 10)).unwrap();
        let items = resp["result"]["items"].as_array().unwrap();

        assert_eq!(resp["result"]["isIncomplete"], false);
        assert_eq!(items[0]["label"], "dynamic snippet");
        assert_eq!(
            items[0]["textEdit"]["newText"],
            "<View style={${1:value}}>\n  ${2}\n</View>"
        );
        assert_eq!(items[0]["insertTextFormat"], 2);
        assert_eq!(items[1]["label"], "rnf");
    }

    #[test]
    fn test_completion_static_only() {
        let mut server = server();
        dispatch(&mut server, &did_change("<div>"));

        let resp = dispatch(&mut server, &completion(2, 0, 5)).unwrap();
        let items = resp["result"]["items"].as_array().unwrap();
        assert!(items.iter().all(|i| i["label"] != "dynamic snippet"));
        assert_eq!(items.len(), 19);
    }

    #[test]
    fn test_completion_unknown_document() {
        let mut server = server();
        let resp = dispatch(&mut server, &completion(3, 0, 0)).unwrap();
        assert_eq!(resp["id"], 3);
        assert!(resp["result"].is_null());
    }

    #[test]
    fn test_completion_bad_params_still_answers() {
        let mut server = server();
        let resp = dispatch(
            &mut server,
            &request(4, "textDocument/completion", json!({ "bogus": true })),
        )
        .unwrap();
        assert!(resp["result"].is_null());
    }

    #[test]
    fn test_lifecycle_exit_codes() {
        let mut clean = server();
        dispatch(&mut clean, &request(1, "shutdown", Value::Null));
        assert!(clean.lifecycle().shutdown_requested());
        dispatch(&mut clean, &notification("exit", Value::Null));
        assert_eq!(clean.lifecycle().exit_code(), Some(0));

        let mut abrupt = server();
        dispatch(&mut abrupt, &notification("exit", Value::Null));
        assert_eq!(abrupt.lifecycle().exit_code(), Some(1));
    }

    #[tokio::test]
    async fn test_pipelined_requests_answer_in_order() {
        let mut input = frame(&request(1, "initialize", json!({})));
        input.extend(frame(&request(2, "shutdown", Value::Null)));
        input.extend(frame(&request(3, "textDocument/completion", json!({}))));

        let mut server = server();
        let mut out = Vec::new();
        let stop = server.serve(&mut input.as_slice(), &mut out).await.unwrap();

        assert_eq!(stop, Stop::InputClosed);
        let ids: Vec<Value> = responses(&out).iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    }

    #[tokio::test]
    async fn test_serve_stops_at_exit() {
        let mut input = frame(&request(1, "shutdown", Value::Null));
        input.extend(frame(&notification("exit", Value::Null)));
        input.extend(frame(&request(2, "initialize", json!({}))));

        let mut server = server();
        let mut out = Vec::new();
        let stop = server.serve(&mut input.as_slice(), &mut out).await.unwrap();

        assert_eq!(stop, Stop::Exit(0));
        assert_eq!(stop.code(), 0);
        assert_eq!(responses(&out).len(), 1, "nothing is handled after exit");
    }

    #[tokio::test]
    async fn test_serve_small_chunks() {
        let mut input = frame(&did_change("Outer0a>Inner"));
        input.extend(frame(&completion(1, 0, 13)));
        input.extend(frame(&request(2, "shutdown", Value::Null)));
        input.extend(frame(&notification("exit", Value::Null)));

        let (mut client, mut pipe) = tokio::io::duplex(7);
        let writer = tokio::spawn(async move {
            client.write_all(&input).await.unwrap();
            client.shutdown().await.unwrap();
            client
        });

        let mut server = server();
        let mut out = Vec::new();
        let stop = server.serve(&mut pipe, &mut out).await.unwrap();
        drop(writer.await.unwrap());

        assert_eq!(stop, Stop::Exit(0));
        let out = responses(&out);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0]["result"]["items"][0]["textEdit"]["newText"],
            "<Outer a={${1:value}}>\n  <Inner>${0}</Inner>\n</Outer>"
        );
    }
}
