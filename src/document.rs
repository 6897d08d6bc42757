// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Latest full text of every document the client has told us about.

use std::collections::HashMap;
use tracing::trace;

/// Full-text document cache keyed by URI.
///
/// The server advertises full document sync, so every change replaces the
/// whole text.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, String>,
}

impl DocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text for `uri`.
    pub fn set(&mut self, uri: &str, text: String) {
        trace!("Storing {} bytes for {}", text.len(), uri);
        self.documents.insert(uri.to_string(), text);
    }

    /// Current text for `uri`.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&str> {
        self.documents.get(uri).map(String::as_str)
    }

    /// Forget `uri`.
    pub fn remove(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    /// Whether no documents are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_text() {
        let mut store = DocumentStore::new();
        store.set("file:///a.tsx", "one".to_string());
        store.set("file:///a.tsx", "two".to_string());

        assert_eq!(store.get("file:///a.tsx"), Some("two"));
        store.remove("file:///a.tsx");
        assert!(store.is_empty(), "one URI holds one entry");
    }

    #[test]
    fn test_remove() {
        let mut store = DocumentStore::new();
        store.set("file:///a.tsx", "one".to_string());
        store.remove("file:///a.tsx");

        assert!(store.get("file:///a.tsx").is_none());
        assert!(store.is_empty());
    }
}
