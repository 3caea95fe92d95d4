// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Repository configuration
//!
//! Loaded from TOML and/or environment variables:
//!
//! ```toml
//! access_matching = "exact"
//! serialize_writes = true
//!
//! [bridge]
//! request_timeout_ms = 5000
//! ```

use crate::access::AccessMatching;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ACCESS_MATCHING: &str = "DOCSHARE_ACCESS_MATCHING";
pub const ENV_SERIALIZE_WRITES: &str = "DOCSHARE_SERIALIZE_WRITES";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "DOCSHARE_REQUEST_TIMEOUT_MS";

/// Settings for the callback-to-future bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Give up on a store request after this many milliseconds.
    /// None = wait for the store indefinitely.
    ///
    /// A timed-out read fails with `StoreTransient`. A timed-out write fails
    /// with `OutcomeUnknown`: the store still holds the request and may apply
    /// it later.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl BridgeConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Settings for the document repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// How user ids are matched against access chains.
    #[serde(default)]
    pub access_matching: AccessMatching,

    /// Serialize uploads/shares/deletes per `(network, title)` in this process.
    #[serde(default = "default_serialize_writes")]
    pub serialize_writes: bool,

    #[serde(default)]
    pub bridge: BridgeConfig,
}

fn default_serialize_writes() -> bool {
    true
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            access_matching: AccessMatching::default(),
            serialize_writes: default_serialize_writes(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl RepositoryConfig {
    /// Set the access matching rule.
    pub fn access_matching(mut self, matching: AccessMatching) -> Self {
        self.access_matching = matching;
        self
    }

    /// Enable or disable per-title write serialization.
    pub fn serialize_writes(mut self, enabled: bool) -> Self {
        self.serialize_writes = enabled;
        self
    }

    /// Set the store request timeout.
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.bridge.request_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Defaults overridden by any `DOCSHARE_*` variables that are set and parse.
    pub fn from_env() -> Self {
        Self::default().merge_with_env()
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let config = match config_file {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            }
            Some(path) => {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        Ok(config.merge_with_env())
    }

    fn merge_with_env(mut self) -> Self {
        if let Ok(raw) = std::env::var(ENV_ACCESS_MATCHING) {
            match raw.parse() {
                Ok(matching) => self.access_matching = matching,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_ACCESS_MATCHING, e),
            }
        }

        if let Ok(raw) = std::env::var(ENV_SERIALIZE_WRITES) {
            match raw.parse() {
                Ok(enabled) => self.serialize_writes = enabled,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_SERIALIZE_WRITES, e),
            }
        }

        if let Ok(raw) = std::env::var(ENV_REQUEST_TIMEOUT_MS) {
            match raw.parse() {
                Ok(ms) => self.bridge.request_timeout_ms = Some(ms),
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_REQUEST_TIMEOUT_MS, e),
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Tests touching DOCSHARE_* variables take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        std::env::remove_var(ENV_ACCESS_MATCHING);
        std::env::remove_var(ENV_SERIALIZE_WRITES);
        std::env::remove_var(ENV_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn test_default_config() {
        let config = RepositoryConfig::default();
        assert_eq!(config.access_matching, AccessMatching::Substring);
        assert!(config.serialize_writes);
        assert_eq!(config.bridge.request_timeout(), None);
    }

    #[test]
    fn test_builder_pattern() {
        let config = RepositoryConfig::default()
            .access_matching(AccessMatching::Exact)
            .serialize_writes(false)
            .request_timeout(Some(Duration::from_millis(250)));

        assert_eq!(config.access_matching, AccessMatching::Exact);
        assert!(!config.serialize_writes);
        assert_eq!(config.bridge.request_timeout_ms, Some(250));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "access_matching = \"exact\"\n\n[bridge]\nrequest_timeout_ms = 5000"
        )
        .unwrap();

        let config = RepositoryConfig::from_file(file.path()).unwrap();
        assert_eq!(config.access_matching, AccessMatching::Exact);
        assert!(config.serialize_writes);
        assert_eq!(config.bridge.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "access_matching = \"fuzzy\"").unwrap();
        assert!(RepositoryConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let loaded = RepositoryConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loaded, RepositoryConfig::default());
    }

    #[test]
    fn test_from_env() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var(ENV_ACCESS_MATCHING, "exact");
        std::env::set_var(ENV_SERIALIZE_WRITES, "false");
        std::env::set_var(ENV_REQUEST_TIMEOUT_MS, "750");

        let config = RepositoryConfig::from_env();
        assert_eq!(config.access_matching, AccessMatching::Exact);
        assert!(!config.serialize_writes);
        assert_eq!(config.bridge.request_timeout(), Some(Duration::from_millis(750)));

        clear_env();
    }

    #[test]
    fn test_env_overrides_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "serialize_writes = true\n\n[bridge]\nrequest_timeout_ms = 5000").unwrap();
        std::env::set_var(ENV_REQUEST_TIMEOUT_MS, "100");

        let config = RepositoryConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert!(config.serialize_writes);
        assert_eq!(config.bridge.request_timeout_ms, Some(100));

        clear_env();
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var(ENV_ACCESS_MATCHING, "fuzzy");
        std::env::set_var(ENV_SERIALIZE_WRITES, "sometimes");
        std::env::set_var(ENV_REQUEST_TIMEOUT_MS, "soon");

        assert_eq!(RepositoryConfig::from_env(), RepositoryConfig::default());

        clear_env();
    }
}
