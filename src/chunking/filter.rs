//! Denylist of pagination, hypermedia and metadata keys.
//!
//! Applies to the structural views only (schema and chunks). The flattening
//! pass never consults it.

use serde_json::{Map, Value};

/// Key fragments skipped by default.
pub const DEFAULT_SKIP_FIELDS: [&str; 5] = ["_links", "_embedded", "links", "meta", "@odata"];

/// Case-insensitive substring denylist for object keys.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    patterns: Vec<String>,
}

impl Default for FieldFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_FIELDS.iter().map(|s| s.to_string()).collect())
    }
}

impl FieldFilter {
    /// Create a filter from raw patterns.
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// A filter that keeps every key.
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Whether `key` contains any denylisted fragment.
    pub fn is_skipped(&self, key: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let key = key.to_lowercase();
        self.patterns.iter().any(|p| key.contains(p.as_str()))
    }

    /// Deep copy of `value` without denylisted keys.
    pub fn clean(&self, value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().map(|v| self.clean(v)).collect()),
            Value::Object(map) => {
                let mut cleaned = Map::new();
                for (key, child) in map {
                    if !self.is_skipped(key) {
                        cleaned.insert(key.clone(), self.clean(child));
                    }
                }
                Value::Object(cleaned)
            }
            other => other.clone(),
        }
    }

    /// All key paths inside `value`, intermediate objects included.
    ///
    /// Arrays contribute the paths of their first element under `[]`.
    pub fn field_paths(&self, value: &Value) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(value, "", &mut paths);
        paths
    }

    fn collect_paths(&self, value: &Value, parent: &str, out: &mut Vec<String>) {
        match value {
            Value::Array(items) => {
                if let Some(first) = items.first() {
                    self.collect_paths(first, &format!("{}[]", parent), out);
                }
            }
            Value::Object(map) => {
                for (key, child) in map {
                    if self.is_skipped(key) {
                        continue;
                    }
                    let path = if parent.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", parent, key)
                    };
                    out.push(path.clone());
                    if child.is_object() || child.is_array() {
                        self.collect_paths(child, &path, out);
                    }
                }
            }
            _ => {}
        }
    }
}
