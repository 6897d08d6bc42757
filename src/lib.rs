// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! snippet-ls is a small language server for React and React Native code.
//!
//! Besides a fixed snippet catalog it expands a compact tag shorthand typed
//! on a single line, such as `Pressable0onPress(handlePress)>Text`, into
//! indented JSX with numbered placeholders.

/// Completion requests and the static snippet catalog.
pub mod completion;
/// Configuration loading.
pub mod config;
/// Per-document text cache.
pub mod document;
/// Append-only event log.
pub mod event_log;
/// Tag shorthand parsing and JSX rendering.
pub mod expand;
/// LSP framing and message types.
pub mod lsp;
/// Message dispatch and the serve loop.
pub mod server;

/// Version string embedded at build time.
pub const VERSION: &str = env!("SNIPPET_LS_VERSION");
