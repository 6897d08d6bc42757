/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH: &[u8] = b"content-length:";

fn default_null() -> serde_json::Value {
    serde_json::Value::Null
}

/// An inbound request or notification. `id` is present only on requests.
#[derive(Debug, Deserialize, Clone)]
pub struct Envelope {
    /// Request id; `None` for notifications.
    #[serde(default)]
    pub id: Option<RequestId>,
    /// Method name, e.g. `textDocument/completion`.
    pub method: String,
    /// Raw params, `null` when absent.
    #[serde(default = "default_null")]
    pub params: serde_json::Value,
}

/// A successful response. `result` is always serialized, `null` included.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseMessage {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Id of the request being answered.
    pub id: RequestId,
    /// Method result.
    pub result: serde_json::Value,
}

impl ResponseMessage {
    /// Build a JSON-RPC 2.0 response to `id`.
    #[must_use]
    pub fn new(id: RequestId, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result,
        }
    }
}

/// JSON-RPC request id, echoed back verbatim in the response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Number(i64),
    /// String id.
    String(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

/// Prefix a body with its `Content-Length` header.
pub fn encode_frame(body: &str) -> String {
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
}

/// Reassembles `Content-Length` framed messages from a chunked byte stream.
///
/// The buffer only ever holds bytes that have not yet been emitted: each
/// complete message removes exactly its header and body from the front.
/// Bytes that cannot belong to a frame are dropped up to the next
/// `Content-Length` header, so one bad frame never swallows the ones after
/// it.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: BytesMut,
}

enum Frame {
    Body(String),
    Discarded,
    Incomplete,
}

impl FrameReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Append a chunk and return every message body it completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut bodies = Vec::new();
        loop {
            match next_frame(&mut self.buffer) {
                Frame::Body(body) => bodies.push(body),
                Frame::Discarded => {}
                Frame::Incomplete => break,
            }
        }
        bodies
    }

    /// Number of buffered bytes not yet emitted.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

fn next_frame(buffer: &mut BytesMut) -> Frame {
    // Anything in front of the first length header can never start a frame.
    let Some(start) = find(buffer, CONTENT_LENGTH) else {
        let keep = CONTENT_LENGTH.len() - 1;
        if buffer.len() > keep {
            let junk = buffer.len() - keep;
            warn!("Discarding {} bytes without a Content-Length header", junk);
            buffer.advance(junk);
        }
        return Frame::Incomplete;
    };
    if start > 0 {
        // Also reached for headers a client sends ahead of Content-Length.
        debug!(
            "Discarding {} bytes before Content-Length: {:?}",
            start,
            String::from_utf8_lossy(&buffer[..start])
        );
        buffer.advance(start);
        return Frame::Discarded;
    }

    let Some(header_end) = find(buffer, HEADER_TERMINATOR) else {
        return Frame::Incomplete;
    };
    let body_start = header_end + HEADER_TERMINATOR.len();

    let Some(content_length) = parse_content_length(&buffer[..header_end]) else {
        warn!(
            "Discarding header block without a valid Content-Length: {:?}",
            String::from_utf8_lossy(&buffer[..header_end])
        );
        buffer.advance(CONTENT_LENGTH.len());
        return Frame::Discarded;
    };

    let Some(body_end) = body_start.checked_add(content_length) else {
        warn!("Content-Length {} overflows, discarding header", content_length);
        buffer.advance(CONTENT_LENGTH.len());
        return Frame::Discarded;
    };

    if buffer.len() < body_end {
        return Frame::Incomplete;
    }

    buffer.advance(body_start);
    let body = buffer.split_to(content_length);

    match String::from_utf8(body.to_vec()) {
        Ok(body) => Frame::Body(body),
        Err(e) => {
            warn!("Discarding message body that is not UTF-8: {}", e);
            Frame::Discarded
        }
    }
}

/// Value of the `Content-Length` line a header block starts with.
fn parse_content_length(headers: &[u8]) -> Option<usize> {
    let value = headers.get(CONTENT_LENGTH.len()..)?;
    let line_end = find(value, b"\r\n").unwrap_or(value.len());

    std::str::from_utf8(&value[..line_end])
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Tests use expect/unwrap for clear failure messages"
)]
mod tests {
    use super::*;

    fn frame(body: &str) -> Vec<u8> {
        encode_frame(body).into_bytes()
    }

    fn stream() -> (Vec<u8>, Vec<String>) {
        let bodies = vec![
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#.to_string(),
            r#"{"jsonrpc":"2.0","method":"textDocument/didChange","params":{"text":"Café ☕"}}"#
                .to_string(),
            r#"{"jsonrpc":"2.0","id":"abc","method":"shutdown"}"#.to_string(),
        ];
        let mut raw = Vec::new();
        for body in &bodies {
            raw.extend(frame(body));
        }
        (raw, bodies)
    }

    #[test]
    fn test_parse_complete_message() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#;
        let mut reader = FrameReader::new();

        assert_eq!(reader.feed(&frame(body)), vec![body.to_string()]);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_parse_incomplete_header() {
        let mut reader = FrameReader::new();
        assert!(reader.feed(b"Content-Length: 10\r\n").is_empty());
        assert_eq!(reader.pending(), 20);
    }

    #[test]
    fn test_parse_incomplete_body() {
        let mut reader = FrameReader::new();
        assert!(
            reader
                .feed(b"Content-Length: 100\r\n\r\n{\"partial\":")
                .is_empty()
        );
    }

    #[test]
    fn test_single_chunk_yields_all_messages() {
        let (raw, bodies) = stream();
        let mut reader = FrameReader::new();

        assert_eq!(reader.feed(&raw), bodies);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let (raw, bodies) = stream();
        let mut reader = FrameReader::new();

        let mut out = Vec::new();
        for byte in &raw {
            out.extend(reader.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(out, bodies);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_every_two_way_split() {
        let (raw, bodies) = stream();

        for split in 0..=raw.len() {
            let mut reader = FrameReader::new();
            let mut out = reader.feed(&raw[..split]);
            out.extend(reader.feed(&raw[split..]));
            assert_eq!(out, bodies, "split at {split}");
        }
    }

    #[test]
    fn test_body_length_is_bytes_not_chars() {
        let body = r#"{"text":"héllo wörld"}"#;
        let raw = frame(body);
        let mut reader = FrameReader::new();

        let out = reader.feed(&raw);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), body.len());
        assert_ne!(body.len(), body.chars().count());
    }

    #[test]
    fn test_leftover_retained_after_complete_message() {
        let first = r#"{"id":1}"#;
        let second = r#"{"id":2}"#;
        let mut raw = frame(first);
        let second_frame = frame(second);
        raw.extend_from_slice(&second_frame[..10]);

        let mut reader = FrameReader::new();
        assert_eq!(reader.feed(&raw), vec![first.to_string()]);
        assert_eq!(reader.pending(), 10);

        assert_eq!(reader.feed(&second_frame[10..]), vec![second.to_string()]);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_parse_case_insensitive_header() {
        let body = r#"{"test":true}"#;
        let raw = format!("content-length: {}\r\n\r\n{}", body.len(), body);
        let mut reader = FrameReader::new();

        assert_eq!(reader.feed(raw.as_bytes()), vec![body.to_string()]);
    }

    #[test]
    fn test_extra_headers_are_ignored() {
        let body = r#"{"test":true}"#;
        let raw = format!(
            "Content-Length: {}\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{}",
            body.len(),
            body
        );
        let mut reader = FrameReader::new();

        assert_eq!(reader.feed(raw.as_bytes()), vec![body.to_string()]);
    }

    #[test]
    fn test_length_after_other_header() {
        let body = r#"{"test":true}"#;
        let raw = format!(
            "Content-Type: application/vscode-jsonrpc\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let mut reader = FrameReader::new();

        assert_eq!(reader.feed(raw.as_bytes()), vec![body.to_string()]);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_header_without_length_is_skipped() {
        let body = r#"{"id":7}"#;
        let mut raw = b"X-Garbage: yes\r\n\r\n".to_vec();
        raw.extend(frame(body));

        let mut reader = FrameReader::new();
        assert_eq!(reader.feed(&raw), vec![body.to_string()]);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_non_numeric_length_is_skipped() {
        let body = r#"{"id":8}"#;
        let mut raw = b"Content-Length: many\r\n\r\n".to_vec();
        raw.extend(frame(body));

        let mut reader = FrameReader::new();
        assert_eq!(reader.feed(&raw), vec![body.to_string()]);
    }

    #[test]
    fn test_body_after_bad_header_does_not_poison_stream() {
        let mut raw = b"Content-Type: x\r\n\r\n{\"id\":0}".to_vec();
        let bodies: Vec<String> = (1..=3).map(|id| format!(r#"{{"id":{id}}}"#)).collect();
        for body in &bodies {
            raw.extend(frame(body));
        }

        let mut reader = FrameReader::new();
        assert_eq!(reader.feed(&raw), bodies);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_bad_header_recovers_byte_at_a_time() {
        let mut raw = b"Content-Length: nope\r\n\r\n{\"stray\":true}\r\n".to_vec();
        raw.extend(frame(r#"{"id":1}"#));
        raw.extend(frame(r#"{"id":2}"#));

        let mut reader = FrameReader::new();
        let mut out = Vec::new();
        for byte in &raw {
            out.extend(reader.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(out, vec![r#"{"id":1}"#.to_string(), r#"{"id":2}"#.to_string()]);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_junk_without_header_is_bounded() {
        let mut reader = FrameReader::new();
        assert!(reader.feed(&[b'x'; 4096]).is_empty());
        assert!(reader.pending() < CONTENT_LENGTH.len());

        let body = r#"{"id":5}"#;
        assert_eq!(reader.feed(&frame(body)), vec![body.to_string()]);
    }

    #[test]
    fn test_invalid_utf8_body_is_dropped() {
        let mut raw = b"Content-Length: 2\r\n\r\n".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe]);
        raw.extend(frame(r#"{"id":9}"#));

        let mut reader = FrameReader::new();
        assert_eq!(reader.feed(&raw), vec![r#"{"id":9}"#.to_string()]);
    }

    #[test]
    fn test_encode_frame_uses_byte_length() {
        let framed = encode_frame(r#"{"a":"é"}"#);
        assert!(framed.starts_with("Content-Length: 10\r\n\r\n"));
    }

    #[test]
    fn test_request_id_number() {
        let json = r#"{"jsonrpc":"2.0","id":42,"method":"test"}"#;
        let msg: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, Some(RequestId::Number(42)));
    }

    #[test]
    fn test_request_id_string() {
        let json = r#"{"jsonrpc":"2.0","id":"abc-123","method":"test"}"#;
        let msg: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, Some(RequestId::String("abc-123".to_string())));
    }

    #[test]
    fn test_notification_no_id() {
        let json = r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#;
        let msg: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(msg.method, "initialized");
        assert!(msg.id.is_none());
    }

    #[test]
    fn test_response_serializes_null_result() {
        let response = ResponseMessage::new(RequestId::Number(3), serde_json::Value::Null);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":3,"result":null}"#);
    }
}
