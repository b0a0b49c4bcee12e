// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration of resource managers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How a [`ResourceManager`](crate::ResourceManager) reclaims unused resources.
///
/// Missing fields in a settings file take their default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    /// Whether resources without handlers are removed by sweeps.
    pub unload_unused: bool,
    /// Minimum time between two sweeps run by `tick`, in milliseconds.
    pub sweep_interval_ms: u64,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            unload_unused: false,
            sweep_interval_ms: 1_000,
        }
    }
}

impl ResourceSettings {
    /// The sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Parses settings from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid resource settings")
    }

    /// Loads settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resource settings from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Writes settings to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write resource settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = ResourceSettings::from_json(r#"{ "unload_unused": true }"#).unwrap();
        assert!(settings.unload_unused);
        assert_eq!(settings.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(ResourceSettings::from_json("{ unload_unused: yes }").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources.json");
        let settings = ResourceSettings {
            unload_unused: true,
            sweep_interval_ms: 250,
        };
        settings.to_file(&path).unwrap();
        assert_eq!(ResourceSettings::from_file(&path).unwrap(), settings);
        assert!(ResourceSettings::from_file(dir.path().join("missing.json")).is_err());
    }
}
