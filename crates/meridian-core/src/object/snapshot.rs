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

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The restorable state of an object: its class and stored attribute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    /// The class the snapshot was taken from.
    pub class: String,
    /// Attribute values by name.
    pub values: BTreeMap<String, Value>,
}

impl ObjectSnapshot {
    /// Serializes the snapshot to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a snapshot from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_value_tags() {
        let snapshot = ObjectSnapshot {
            class: "Lamp".to_owned(),
            values: BTreeMap::from([
                ("Intensity".to_owned(), Value::Float(0.5)),
                ("Mode".to_owned(), Value::Enum("Spot".to_owned())),
            ]),
        };
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"enum\""));
        assert_eq!(ObjectSnapshot::from_json(&json).unwrap(), snapshot);
    }
}
