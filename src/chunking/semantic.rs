//! Structural chunking of whole documents.
//!
//! Objects become `root`/`object_group` chunks, the first few object
//! elements of every array become `array_item` chunks, and nested
//! containers are visited recursively. Every chunk goes through the
//! splitter so nothing leaves above the ceiling unless it is a single
//! oversized entry.

use serde_json::Value;

use super::filter::FieldFilter;
use super::schema::SchemaExtractor;
use super::splitter::{ChunkDraft, ChunkSplitter};
use super::types::{
    json_type_name, Chunk, ChunkKind, ChunkingResult, ChunkingStats, SchemaInfo,
    DEFAULT_ARRAY_SAMPLE_SIZE, DEFAULT_MAX_CHUNK_SIZE,
};
use crate::catalog::serialized_len;

/// Document-level chunker built on [`ChunkSplitter`] and [`SchemaExtractor`].
#[derive(Debug, Clone)]
pub struct SemanticChunker {
    splitter: ChunkSplitter,
    extractor: SchemaExtractor,
    array_sample_size: usize,
}

impl Default for SemanticChunker {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_CHUNK_SIZE,
            FieldFilter::default(),
            DEFAULT_ARRAY_SAMPLE_SIZE,
        )
    }
}

impl SemanticChunker {
    pub fn new(max_chunk_size: usize, filter: FieldFilter, array_sample_size: usize) -> Self {
        Self {
            splitter: ChunkSplitter::new(max_chunk_size, filter.clone()),
            extractor: SchemaExtractor::new(filter),
            array_sample_size,
        }
    }

    /// Schema synopsis of a document without chunking it.
    pub fn schema(&self, value: &Value) -> SchemaInfo {
        self.chunk(value).schema
    }

    /// Chunk a document and describe its structure.
    pub fn chunk(&self, value: &Value) -> ChunkingResult {
        let mut walk = Walk {
            chunker: self,
            chunks: Vec::new(),
            schema: SchemaInfo {
                root_type: json_type_name(value).to_string(),
                structure: self.extractor.extract(value),
                ..Default::default()
            },
            next_id: 0,
            max_depth: 0,
        };
        walk.visit(value, "", "root", 0, None);

        let Walk {
            chunks,
            schema,
            max_depth,
            ..
        } = walk;

        let stats = ChunkingStats {
            total_chunks: chunks.len(),
            total_fields: chunks.iter().map(|c| c.metadata.field_count).sum(),
            max_depth,
            original_size: serialized_len(value),
            processed_size: chunks.iter().map(|c| c.size).sum(),
        };

        ChunkingResult {
            chunks,
            schema,
            stats,
        }
    }
}

/// Mutable state of one chunking pass.
struct Walk<'a> {
    chunker: &'a SemanticChunker,
    chunks: Vec<Chunk>,
    schema: SchemaInfo,
    next_id: usize,
    max_depth: usize,
}

impl Walk<'_> {
    fn next_id(&mut self) -> String {
        let id = format!("chunk_{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, chunk: Chunk) {
        let parts = self.chunker.splitter.split(chunk);
        self.chunks.extend(parts);
    }

    fn visit(&mut self, value: &Value, path: &str, name: &str, depth: usize, parent: Option<&str>) {
        self.max_depth = self.max_depth.max(depth);
        let chunker = self.chunker;
        let filter = chunker.splitter.filter();

        match value {
            Value::Array(items) => {
                self.schema.array_paths.push(path.to_string());

                let sampled = items.iter().take(chunker.array_sample_size).enumerate();
                for (i, item) in sampled {
                    let Value::Object(map) = item else {
                        continue;
                    };
                    let item_path = format!("{}[{}]", path, i);
                    let item_id = self.next_id();
                    let chunk = chunker.splitter.build(ChunkDraft {
                        id: item_id.clone(),
                        kind: ChunkKind::ArrayItem,
                        path: item_path.clone(),
                        name: name.to_string(),
                        data: item,
                        depth,
                        parent_id: parent.map(str::to_string),
                        array_position: Some((i, items.len())),
                    });
                    self.push(chunk);

                    for (key, child) in map {
                        if filter.is_skipped(key) || !is_container(child) {
                            continue;
                        }
                        let child_path = format!("{}.{}", item_path, key);
                        self.visit(child, &child_path, key, depth + 1, Some(item_id.as_str()));
                    }
                }
            }
            Value::Object(map) => {
                self.schema.object_paths.push(path.to_string());
                if depth == 0 {
                    self.schema.top_level_keys = map
                        .keys()
                        .filter(|k| !filter.is_skipped(k))
                        .cloned()
                        .collect();
                }

                let obj_id = self.next_id();
                let chunk = chunker.splitter.build(ChunkDraft {
                    id: obj_id.clone(),
                    kind: if depth == 0 {
                        ChunkKind::Root
                    } else {
                        ChunkKind::ObjectGroup
                    },
                    path: path.to_string(),
                    name: name.to_string(),
                    data: value,
                    depth,
                    parent_id: parent.map(str::to_string),
                    array_position: None,
                });
                self.push(chunk);

                for (key, child) in map {
                    if filter.is_skipped(key) || !is_container(child) {
                        continue;
                    }
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    self.visit(child, &child_path, key, depth + 1, Some(obj_id.as_str()));
                }
            }
            _ => {}
        }
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}
