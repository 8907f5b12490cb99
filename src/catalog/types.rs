//! Data structures produced by the flattening pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum characters kept from a stringified scalar.
pub const MAX_VALUE_LENGTH: usize = 100;

/// Marker appended to values cut at [`MAX_VALUE_LENGTH`].
pub const ELLIPSIS: &str = "...";

/// Path suffix of the synthetic array-length field.
pub const LENGTH_SUFFIX: &str = "._length";

/// Path used for a scalar document with no keys at all.
pub const ROOT_PATH: &str = "root";

/// Primitive type tag of a flattened field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Null,
    Object,
    Array,
    /// An array with no elements to sample.
    EmptyArray,
    /// Synthetic field recording an array's length.
    Meta,
}

impl FieldType {
    /// Wire name of this type (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Null => "null",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::EmptyArray => "emptyArray",
            FieldType::Meta => "meta",
        }
    }

    /// Type tag of a JSON value.
    pub fn of(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
            Value::Array(items) if items.is_empty() => FieldType::EmptyArray,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One addressable leaf of a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatField {
    /// Dotted path with `[]` marking the sampled array element.
    pub path: String,
    /// Stringified value, truncated to [`MAX_VALUE_LENGTH`] characters.
    pub value: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Number of `.` separators in the raw path.
    pub depth: usize,
}

impl FlatField {
    /// Whether this is the synthetic `._length` entry of an array.
    pub fn is_length_meta(&self) -> bool {
        self.path.ends_with(LENGTH_SUFFIX)
    }

    /// Whether the field should be sent for analysis.
    pub fn is_analyzable(&self) -> bool {
        !self.is_length_meta()
    }
}

/// Fields sharing the same top-level key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub root_key: String,
    pub items: Vec<FlatField>,
}

impl Group {
    /// Number of fields in this group that are sent for analysis.
    pub fn analyzable_count(&self) -> usize {
        self.items.iter().filter(|f| f.is_analyzable()).count()
    }
}

/// Size statistics of a flattening pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenStats {
    /// Serialized byte length of the source document.
    pub original_size: usize,
    /// Number of fields considered for analysis.
    pub flattened_count: usize,
    /// `1 - serialized(fields) / original_size`, formatted as `"12.3%"`.
    pub compression_ratio: String,
}

/// Flattened fields together with their statistics.
#[derive(Debug, Clone, Serialize)]
pub struct FlattenResult {
    pub items: Vec<FlatField>,
    pub stats: FlattenStats,
}
