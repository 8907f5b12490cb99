//! Path flattening of nested JSON documents.
//!
//! Every scalar or null leaf becomes one [`FlatField`]. Arrays are assumed
//! element-homogeneous: only element 0 is visited, and a synthetic `meta`
//! field records the real length at `<array>._length`.

use serde_json::Value;

use super::types::{
    FieldType, FlatField, FlattenResult, FlattenStats, ELLIPSIS, LENGTH_SUFFIX, MAX_VALUE_LENGTH,
    ROOT_PATH,
};

/// Flatten a document into its leaf fields in pre-order.
pub fn flatten(value: &Value) -> Vec<FlatField> {
    flatten_at(value, "")
}

/// Flatten a fragment located at `parent_path`.
pub fn flatten_at(value: &Value, parent_path: &str) -> Vec<FlatField> {
    let mut out = Vec::new();
    walk(value, parent_path, &mut out);
    out
}

fn walk(value: &Value, path: &str, out: &mut Vec<FlatField>) {
    match value {
        Value::Array(items) => match items.first() {
            None => out.push(leaf(path, "[]".to_string(), FieldType::EmptyArray)),
            Some(first) => {
                walk(first, &format!("{}[]", path), out);
                let meta_path = format!("{}{}", path, LENGTH_SUFFIX);
                out.push(leaf(&meta_path, items.len().to_string(), FieldType::Meta));
            }
        },
        Value::Object(map) => {
            for (key, child) in map {
                if path.is_empty() {
                    walk(child, key, out);
                } else {
                    walk(child, &format!("{}.{}", path, key), out);
                }
            }
        }
        Value::Null => out.push(leaf(path, "null".to_string(), FieldType::Null)),
        Value::Bool(b) => out.push(leaf(path, b.to_string(), FieldType::Boolean)),
        Value::Number(n) => out.push(leaf(path, truncate_value(&n.to_string()), FieldType::Number)),
        Value::String(s) => out.push(leaf(path, truncate_value(s), FieldType::String)),
    }
}

fn leaf(raw_path: &str, value: String, field_type: FieldType) -> FlatField {
    let depth = raw_path.matches('.').count();
    let path = if raw_path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        raw_path.to_string()
    };
    FlatField {
        path,
        value,
        field_type,
        depth,
    }
}

/// Cut a value to [`MAX_VALUE_LENGTH`] characters, marking the cut.
pub fn truncate_value(s: &str) -> String {
    match s.char_indices().nth(MAX_VALUE_LENGTH) {
        Some((byte_idx, _)) => format!("{}{}", &s[..byte_idx], ELLIPSIS),
        None => s.to_string(),
    }
}

/// Flatten a document and report how much smaller the field list is.
pub fn flatten_with_stats(value: &Value) -> FlattenResult {
    let items = flatten(value);
    let original_size = serialized_len(value);
    let flattened_size = serde_json::to_string(&items).map(|s| s.len()).unwrap_or(0);
    let stats = FlattenStats {
        original_size,
        flattened_count: items.len(),
        compression_ratio: compression_ratio(original_size, flattened_size),
    };
    FlattenResult { items, stats }
}

/// Compact serialized byte length of a JSON value.
pub fn serialized_len(value: &Value) -> usize {
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(0)
}

/// Format `1 - flattened/original` as a percentage with one decimal.
pub fn compression_ratio(original_size: usize, flattened_size: usize) -> String {
    if original_size == 0 {
        return "0.0%".to_string();
    }
    let ratio = (1.0 - flattened_size as f64 / original_size as f64) * 100.0;
    format!("{:.1}%", ratio)
}
