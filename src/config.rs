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

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Event log location (default: `<temp dir>/snippet-ls.log`)
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Offer the static React / React Native snippet catalog
    #[serde(default = "default_true")]
    pub static_snippets: bool,

    /// Offer expansions of tag shorthand such as `View0style`
    #[serde(default = "default_true")]
    pub dynamic_tags: bool,
}

fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("snippet-ls.log")
}

const fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            static_snippets: true,
            dynamic_tags: true,
        }
    }
}

impl Config {
    /// Load configuration from standard paths or a specific file.
    pub fn load(explicit_file: Option<PathBuf>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // 1. Start with defaults
        builder = builder
            .set_default("log_file", default_log_file().to_string_lossy().into_owned())?
            .set_default("static_snippets", true)?
            .set_default("dynamic_tags", true)?;

        // 2. Load from user config directory (~/.config/snippet-ls/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("snippet-ls").join("config.toml");
            if config_path.exists() {
                builder = builder.add_source(config::File::from(config_path));
            }
        }

        // 3. Load from explicit file if provided
        if let Some(path) = explicit_file {
            builder = builder.add_source(config::File::from(path));
        }

        // 4. Load from environment variables (SNIPPET_LS_LOG_FILE, etc.)
        builder = builder.add_source(config::Environment::with_prefix("SNIPPET_LS"));

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        config.try_deserialize().context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Tests use expect/unwrap for clear failure messages"
)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.static_snippets);
        assert!(config.dynamic_tags);
        assert!(config.log_file.ends_with("snippet-ls.log"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut table = toml::Table::new();
        table.insert("static_snippets".into(), toml::Value::Boolean(false));
        table.insert(
            "log_file".into(),
            toml::Value::String("/var/tmp/custom.log".into()),
        );
        std::fs::write(&path, toml::to_string(&table).unwrap()).unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert!(!config.static_snippets);
        assert!(config.dynamic_tags);
        assert_eq!(config.log_file, PathBuf::from("/var/tmp/custom.log"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(dir.path().join("absent.toml")));
        assert!(result.is_err());
    }
}
