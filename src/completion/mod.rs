// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! `textDocument/completion` support.
//!
//! The line before the cursor is run through the dynamic tag classifier.
//! Lines that look like shorthand get one extra item whose text edit
//! replaces the whole line with the expansion of that same line; every
//! response also carries the static catalog.

/// Static snippet catalog.
pub mod catalog;

use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionTextEdit, Documentation,
    InsertTextFormat, Position, Range, TextEdit,
};
use tracing::debug;

use crate::expand::{self, Classification};

/// Label of the dynamic tag item.
pub const DYNAMIC_LABEL: &str = "dynamic snippet";

/// Builds completion lists for a document position.
#[derive(Debug, Clone, Copy)]
pub struct CompletionProvider {
    static_snippets: bool,
    dynamic_tags: bool,
}

impl Default for CompletionProvider {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// A computed completion response plus what led to it.
#[derive(Debug)]
pub struct Completion {
    /// The list to send to the client.
    pub list: CompletionList,
    /// Trimmed text before the cursor, the classifier's input.
    pub input: String,
    /// Classifier signals for `input`.
    pub classification: Classification,
    /// Whether the list starts with a dynamic tag item.
    pub dynamic: bool,
}

impl CompletionProvider {
    /// Create a provider with the given sources enabled.
    #[must_use]
    pub const fn new(static_snippets: bool, dynamic_tags: bool) -> Self {
        Self {
            static_snippets,
            dynamic_tags,
        }
    }

    /// Compute completions for `position` in `text`.
    #[must_use]
    pub fn complete(&self, text: &str, position: Position) -> Completion {
        let line_text = line_at(text, position.line);
        let input = utf16_prefix(line_text, position.character).trim().to_string();
        let classification = expand::classify(&input);

        let mut items = Vec::new();

        if self.dynamic_tags && classification.is_dynamic {
            // The edit replaces the whole line, so the whole line is expanded.
            let shorthand = line_text.trim();
            match expand::expand(shorthand) {
                Ok(new_text) => {
                    items.push(dynamic_item(shorthand, new_text, position.line, line_text));
                }
                Err(e) => debug!("No expansion for {:?}: {}", shorthand, e),
            }
        }
        let dynamic = !items.is_empty();

        if self.static_snippets {
            items.extend(catalog::items());
        }

        Completion {
            list: CompletionList {
                is_incomplete: false,
                items,
            },
            input,
            classification,
            dynamic,
        }
    }
}

fn dynamic_item(shorthand: &str, new_text: String, line: u32, line_text: &str) -> CompletionItem {
    CompletionItem {
        label: DYNAMIC_LABEL.to_string(),
        kind: Some(CompletionItemKind::SNIPPET),
        documentation: Some(Documentation::String(format!(
            "React Dynamic Component\nInput: \"{shorthand}\""
        ))),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        sort_text: Some("0000".to_string()),
        filter_text: Some(shorthand.to_string()),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: Range {
                start: Position { line, character: 0 },
                end: Position {
                    line,
                    character: utf16_len(line_text),
                },
            },
            new_text,
        })),
        ..CompletionItem::default()
    }
}

/// The text of line `line` without its terminator; empty past the end.
fn line_at(text: &str, line: u32) -> &str {
    let Ok(line) = usize::try_from(line) else {
        return "";
    };
    text.split('\n')
        .nth(line)
        .map_or("", |l| l.strip_suffix('\r').unwrap_or(l))
}

/// The prefix of `line` spanning `character` UTF-16 code units, clamped to
/// the line.
fn utf16_prefix(line: &str, character: u32) -> &str {
    let mut units = 0usize;
    let limit = usize::try_from(character).unwrap_or(usize::MAX);

    for (idx, ch) in line.char_indices() {
        if units >= limit {
            return &line[..idx];
        }
        units += ch.len_utf16();
    }
    line
}

fn utf16_len(line: &str) -> u32 {
    u32::try_from(line.encode_utf16().count()).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Tests use expect/unwrap for clear failure messages"
)]
mod tests {
    use super::*;

    fn pos(line: u32, character: u32) -> Position {
        Position { line, character }
    }

    fn edit(item: &CompletionItem) -> &TextEdit {
        match item.text_edit.as_ref().expect("text edit") {
            CompletionTextEdit::Edit(edit) => edit,
            CompletionTextEdit::InsertAndReplace(_) => unreachable!("plain edits only"),
        }
    }

    #[test]
    fn test_dynamic_item_comes_first() {
        let text = "import React from 'react';\n  Greet0onPress(handlePress)\n";
        let completion = CompletionProvider::default().complete(text, pos(1, 28));

        assert!(completion.dynamic);
        assert_eq!(completion.input, "Greet0onPress(handlePress)");

        let items = &completion.list.items;
        assert_eq!(items.len(), 1 + catalog::items().len());
        assert_eq!(items[0].label, DYNAMIC_LABEL);
        assert_eq!(items[0].sort_text.as_deref(), Some("0000"));
        assert_eq!(
            items[0].filter_text.as_deref(),
            Some("Greet0onPress(handlePress)")
        );

        let edit = edit(&items[0]);
        assert_eq!(
            edit.new_text,
            "<Greet onPress={${1:handlePress}}>\n  ${2}\n</Greet>"
        );
        assert_eq!(edit.range.start, pos(1, 0));
        assert_eq!(edit.range.end, pos(1, 28));
    }

    #[test]
    fn test_text_after_cursor_is_kept_in_expansion() {
        let text = "View0style0testID";
        let completion = CompletionProvider::default().complete(text, pos(0, 10));

        assert_eq!(completion.input, "View0style");
        assert!(completion.dynamic);
        let edit = edit(&completion.list.items[0]);
        assert_eq!(edit.range.start, pos(0, 0));
        assert_eq!(edit.range.end, pos(0, 17));
        assert_eq!(
            edit.new_text,
            "<View style={${1:value}} testID={${2:value}}>\n  ${3}\n</View>"
        );
        assert_eq!(
            completion.list.items[0].filter_text.as_deref(),
            Some("View0style0testID")
        );
    }

    #[test]
    fn test_prefix_decides_classification() {
        // Only the full line is shorthand; the text before the cursor is not.
        let text = "<div> View0style";
        let completion = CompletionProvider::default().complete(text, pos(0, 5));

        assert!(!completion.classification.is_dynamic);
        assert!(!completion.dynamic);
    }

    #[test]
    fn test_deep_nesting_falls_back_to_catalog() {
        let text = format!("a{}0", ">".repeat(2_000));
        let completion = CompletionProvider::default().complete(&text, pos(0, 2_002));

        assert!(completion.classification.is_dynamic);
        assert!(!completion.dynamic);
        assert_eq!(completion.list.items.len(), catalog::items().len());
    }

    #[test]
    fn test_static_line_gets_catalog_only() {
        let text = "<div>";
        let completion = CompletionProvider::default().complete(text, pos(0, 5));

        assert!(!completion.dynamic);
        assert!(!completion.classification.is_dynamic);
        assert_eq!(completion.list.items.len(), catalog::items().len());
        assert!(!completion.list.is_incomplete);
    }

    #[test]
    fn test_classified_but_unparseable_falls_back() {
        // Starts with an identifier and contains the separator, but the
        // nested child is not a valid tag.
        let text = "Row0a>9";
        let completion = CompletionProvider::default().complete(text, pos(0, 7));

        assert!(completion.classification.is_dynamic);
        assert!(!completion.dynamic);
        assert!(
            completion
                .list
                .items
                .iter()
                .all(|item| item.label != DYNAMIC_LABEL)
        );
    }

    #[test]
    fn test_empty_line_and_line_past_end() {
        let provider = CompletionProvider::default();

        let completion = provider.complete("\n\n", pos(1, 0));
        assert!(!completion.dynamic);

        let completion = provider.complete("View", pos(10, 4));
        assert_eq!(completion.input, "");
        assert!(!completion.dynamic);
    }

    #[test]
    fn test_cursor_past_line_end_is_clamped() {
        let completion = CompletionProvider::default().complete("Text", pos(0, 99));
        assert_eq!(completion.input, "Text");
        assert!(completion.dynamic);
    }

    #[test]
    fn test_utf16_columns() {
        // "é" is one UTF-16 unit, "😀" is two.
        assert_eq!(utf16_prefix("é😀x", 1), "é");
        assert_eq!(utf16_prefix("é😀x", 3), "é😀");
        assert_eq!(utf16_len("é😀x"), 4);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "first\r\nView0style\r\n";
        let completion = CompletionProvider::default().complete(text, pos(1, 10));

        assert!(completion.dynamic);
        assert_eq!(edit(&completion.list.items[0]).range.end, pos(1, 10));
    }

    #[test]
    fn test_sources_can_be_disabled() {
        let completion = CompletionProvider::new(false, true).complete("View", pos(0, 4));
        assert_eq!(completion.list.items.len(), 1);

        let completion = CompletionProvider::new(true, false).complete("View", pos(0, 4));
        assert!(!completion.dynamic);
        assert_eq!(completion.list.items.len(), catalog::items().len());

        let completion = CompletionProvider::new(false, false).complete("View", pos(0, 4));
        assert!(completion.list.items.is_empty());
    }
}
