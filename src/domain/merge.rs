//! Merging content fragments into stored page documents.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DomainError;

/// How a fragment is combined with the stored document.
///
/// `Shallow` replaces every top-level key the fragment names wholesale, so
/// siblings inside an addressed section are dropped unless re-sent. `Deep`
/// merges nested objects recursively; arrays and scalars still replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    #[default]
    Shallow,
    Deep,
}

impl MergeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeStrategy::Shallow => "shallow",
            MergeStrategy::Deep => "deep",
        }
    }

    pub fn apply(self, stored: &Map<String, Value>, fragment: Map<String, Value>) -> Map<String, Value> {
        let mut merged = stored.clone();
        match self {
            MergeStrategy::Shallow => merged.extend(fragment),
            MergeStrategy::Deep => merge_deep(&mut merged, fragment),
        }
        merged
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shallow" => Ok(MergeStrategy::Shallow),
            "deep" => Ok(MergeStrategy::Deep),
            other => Err(DomainError::validation(format!(
                "unknown merge strategy `{other}`"
            ))),
        }
    }
}

fn merge_deep(target: &mut Map<String, Value>, fragment: Map<String, Value>) {
    for (key, incoming) in fragment {
        match (target.get_mut(&key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge_deep(existing, nested),
            (_, incoming) => {
                target.insert(key, incoming);
            }
        }
    }
}
