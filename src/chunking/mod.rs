//! Byte-bounded chunking and structural description of JSON documents.
//!
//! This view is independent of field analysis: chunks are sized in bytes
//! for structural context, while the analyzer batches flattened fields by
//! count.
//!
//! # Module Structure
//!
//! - [`filter`] - denylist of pagination/hypermedia keys
//! - [`schema`] - `SchemaNode` extraction and the text overview
//! - [`splitter`] - greedy byte-bounded splitting
//! - [`semantic`] - whole-document chunking
//! - [`types`] - shared data structures

pub mod filter;
pub mod schema;
pub mod semantic;
pub mod splitter;
pub mod types;

pub use filter::{FieldFilter, DEFAULT_SKIP_FIELDS};
pub use schema::{schema_overview, SchemaExtractor};
pub use semantic::SemanticChunker;
pub use splitter::{ChunkDraft, ChunkSplitter};
pub use types::{
    json_type_name, Chunk, ChunkKind, ChunkMetadata, ChunkingResult, ChunkingStats, SchemaInfo,
    SchemaNode, DEFAULT_ARRAY_SAMPLE_SIZE, DEFAULT_MAX_CHUNK_SIZE,
};
