//! Data structures for structural chunking and schema description.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default byte ceiling for a single chunk.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4000;

/// Default number of array elements sampled into their own chunks.
pub const DEFAULT_ARRAY_SAMPLE_SIZE: usize = 3;

/// Role of a chunk within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// The top-level object.
    Root,
    /// One sampled element of an array.
    ArrayItem,
    /// A nested object.
    ObjectGroup,
    /// A slice of a larger chunk produced by splitting.
    FieldGroup,
}

/// Shape information about a chunk's data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_length: Option<usize>,
    pub field_count: usize,
    pub has_nested_objects: bool,
    pub has_nested_arrays: bool,
}

/// A byte-bounded fragment of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub path: String,
    pub name: String,
    pub description: String,
    /// Fragment with denylisted keys removed.
    pub data: Value,
    /// Every key path inside `data`, intermediate objects included.
    pub fields: Vec<String>,
    /// Serialized byte length of `data`.
    pub size: usize,
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub metadata: ChunkMetadata,
}

/// One structural position in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub is_array: bool,
    pub is_object: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SchemaNode>>,
}

/// Structural synopsis of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub root_type: String,
    pub structure: Vec<SchemaNode>,
    pub top_level_keys: Vec<String>,
    pub array_paths: Vec<String>,
    pub object_paths: Vec<String>,
}

/// Aggregate numbers of a chunking pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_fields: usize,
    pub max_depth: usize,
    pub original_size: usize,
    pub processed_size: usize,
}

/// Output of [`SemanticChunker::chunk`](super::SemanticChunker::chunk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingResult {
    pub chunks: Vec<Chunk>,
    pub schema: SchemaInfo,
    pub stats: ChunkingStats,
}

/// JSON type name as used in schema descriptions.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
