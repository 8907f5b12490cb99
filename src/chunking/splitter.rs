//! Byte-bounded splitting of object and array fragments.
//!
//! Packing is greedy and left to right. Sizes are tracked exactly as the
//! compact serialization would produce them, so a part holding more than
//! one entry never exceeds the ceiling. A lone entry larger than the
//! ceiling becomes its own part and is never cut.

use std::ops::Range;

use serde_json::{Map, Value};

use super::filter::FieldFilter;
use super::types::{Chunk, ChunkKind, ChunkMetadata, DEFAULT_MAX_CHUNK_SIZE};
use crate::catalog::serialized_len;

/// Everything needed to materialize a [`Chunk`].
#[derive(Debug, Clone)]
pub struct ChunkDraft<'a> {
    pub id: String,
    pub kind: ChunkKind,
    pub path: String,
    pub name: String,
    pub data: &'a Value,
    pub depth: usize,
    pub parent_id: Option<String>,
    /// `(index, length)` when the chunk is a sampled array element.
    pub array_position: Option<(usize, usize)>,
}

/// Builds chunks and splits those above a byte ceiling.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    max_size: usize,
    filter: FieldFilter,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_SIZE, FieldFilter::default())
    }
}

impl ChunkSplitter {
    pub fn new(max_size: usize, filter: FieldFilter) -> Self {
        Self { max_size, filter }
    }

    pub fn filter(&self) -> &FieldFilter {
        &self.filter
    }

    /// Materialize a chunk: clean its data and compute fields, size and shape.
    pub fn build(&self, draft: ChunkDraft<'_>) -> Chunk {
        let data = self.filter.clean(draft.data);
        let fields = self.filter.field_paths(&data);
        let size = serialized_len(&data);

        let children: Vec<&Value> = match &data {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            _ => Vec::new(),
        };
        let has_nested_objects = children.iter().any(|v| v.is_object());
        let has_nested_arrays = children.iter().any(|v| v.is_array());

        let description = describe(
            draft.kind,
            &draft.name,
            fields.len(),
            draft.array_position,
        );

        Chunk {
            id: draft.id,
            kind: draft.kind,
            path: draft.path,
            name: draft.name,
            description,
            data,
            size,
            depth: draft.depth,
            parent_id: draft.parent_id,
            metadata: ChunkMetadata {
                array_index: draft.array_position.map(|(i, _)| i),
                array_length: draft.array_position.map(|(_, len)| len),
                field_count: fields.len(),
                has_nested_objects,
                has_nested_arrays,
            },
            fields,
        }
    }

    /// Split a chunk whose serialized size exceeds the ceiling.
    ///
    /// Chunks within the ceiling and scalar chunks are returned unchanged.
    /// Parts are `field_group` chunks named `<id>_part<i>` with the original
    /// chunk as parent, in entry order.
    pub fn split(&self, chunk: Chunk) -> Vec<Chunk> {
        if chunk.size <= self.max_size {
            return vec![chunk];
        }

        let parts: Vec<Value> = match &chunk.data {
            Value::Object(map) => {
                let entries: Vec<(&String, &Value)> = map.iter().collect();
                let sizes = entries
                    .iter()
                    .map(|(k, v)| key_len(k) + 1 + serialized_len(v));
                pack_ranges(sizes, self.max_size)
                    .into_iter()
                    .map(|range| {
                        let part: Map<String, Value> = entries[range]
                            .iter()
                            .map(|(k, v)| ((*k).clone(), (*v).clone()))
                            .collect();
                        Value::Object(part)
                    })
                    .collect()
            }
            Value::Array(items) => {
                let sizes = items.iter().map(serialized_len);
                pack_ranges(sizes, self.max_size)
                    .into_iter()
                    .map(|range| Value::Array(items[range].to_vec()))
                    .collect()
            }
            _ => return vec![chunk],
        };

        tracing::debug!(
            chunk = %chunk.id,
            size = chunk.size,
            parts = parts.len(),
            "split oversized chunk"
        );

        parts
            .iter()
            .enumerate()
            .map(|(i, data)| {
                self.build(ChunkDraft {
                    id: format!("{}_part{}", chunk.id, i),
                    kind: ChunkKind::FieldGroup,
                    path: format!("{}.part{}", chunk.path, i),
                    name: format!("{} (part {})", chunk.name, i + 1),
                    data,
                    depth: chunk.depth,
                    parent_id: Some(chunk.id.clone()),
                    array_position: None,
                })
            })
            .collect()
    }
}

/// Serialized length of an object key including its quotes.
fn key_len(key: &str) -> usize {
    serde_json::to_string(key).map(|s| s.len()).unwrap_or(key.len() + 2)
}

/// Greedy grouping of entries by serialized size.
///
/// A group of `n` entries serializes to `2 + sum(sizes) + (n - 1)` bytes
/// (brackets plus separators). A group is closed when the next entry would
/// push it past `max` and it already holds something.
fn pack_ranges(sizes: impl IntoIterator<Item = usize>, max: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut current = 0;
    let mut idx = 0;

    for size in sizes {
        let grown = if idx == start {
            2 + size
        } else {
            current + 1 + size
        };
        if grown > max && idx > start {
            ranges.push(start..idx);
            start = idx;
            current = 2 + size;
        } else {
            current = grown;
        }
        idx += 1;
    }

    if idx > start {
        ranges.push(start..idx);
    }
    ranges
}

fn describe(
    kind: ChunkKind,
    name: &str,
    field_count: usize,
    array_position: Option<(usize, usize)>,
) -> String {
    match kind {
        ChunkKind::Root => format!("Root object ({} fields)", field_count),
        ChunkKind::ArrayItem => match array_position {
            Some((index, len)) => format!("Item {} of {} in {}", index + 1, len, name),
            None => format!("Item in {}", name),
        },
        ChunkKind::ObjectGroup => format!("{} object group ({} fields)", name, field_count),
        ChunkKind::FieldGroup => format!("Field group of {}", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root_chunk(splitter: &ChunkSplitter, data: &Value) -> Chunk {
        splitter.build(ChunkDraft {
            id: "chunk_0".to_string(),
            kind: ChunkKind::Root,
            path: "doc".to_string(),
            name: "root".to_string(),
            data,
            depth: 0,
            parent_id: None,
            array_position: None,
        })
    }

    #[test]
    fn build_computes_size_and_shape() {
        let splitter = ChunkSplitter::default();
        let chunk = root_chunk(&splitter, &json!({"a": {"b": 1}, "c": [1], "_links": {}}));
        assert_eq!(chunk.data, json!({"a": {"b": 1}, "c": [1]}));
        assert_eq!(chunk.size, serialized_len(&chunk.data));
        assert_eq!(chunk.fields, vec!["a", "a.b", "c"]);
        assert_eq!(chunk.metadata.field_count, 3);
        assert!(chunk.metadata.has_nested_objects);
        assert!(chunk.metadata.has_nested_arrays);
        assert_eq!(chunk.description, "Root object (3 fields)");
    }

    #[test]
    fn split_small_chunk_is_identity() {
        let splitter = ChunkSplitter::default();
        let chunk = root_chunk(&splitter, &json!({"a": 1}));
        let parts = splitter.split(chunk.clone());
        assert_eq!(parts, vec![chunk]);
    }

    #[test]
    fn split_respects_ceiling_and_order() {
        let splitter = ChunkSplitter::new(40, FieldFilter::none());
        let data = json!({
            "alpha": "aaaaaaaaaa",
            "beta": "bbbbbbbbbb",
            "gamma": "cccccccccc",
            "delta": "dddddddddd",
        });
        let chunk = root_chunk(&splitter, &data);
        assert!(chunk.size > 40);

        let parts = splitter.split(chunk);
        assert!(parts.len() > 1);
        for part in &parts {
            assert!(part.size <= 40, "part {} has size {}", part.id, part.size);
            assert_eq!(part.size, serialized_len(&part.data));
            assert_eq!(part.kind, ChunkKind::FieldGroup);
            assert_eq!(part.parent_id.as_deref(), Some("chunk_0"));
        }

        let keys: Vec<String> = parts
            .iter()
            .flat_map(|p| p.data.as_object().unwrap().keys().cloned().collect::<Vec<_>>())
            .collect();
        assert_eq!(keys, vec!["alpha", "beta", "gamma", "delta"]);
        assert_eq!(parts[0].id, "chunk_0_part0");
        assert_eq!(parts[1].path, "doc.part1");
        assert_eq!(parts[1].name, "root (part 2)");
    }

    #[test]
    fn split_keeps_oversized_entry_whole() {
        let splitter = ChunkSplitter::new(30, FieldFilter::none());
        let big = "x".repeat(100);
        let data = json!({"a": 1, "big": big, "b": 2});
        let parts = splitter.split(root_chunk(&splitter, &data));
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].data, json!({ "big": "x".repeat(100) }));
        assert!(parts[1].size > 30);
        assert_eq!(parts[0].data, json!({"a": 1}));
        assert_eq!(parts[2].data, json!({"b": 2}));
    }

    #[test]
    fn split_arrays_by_element() {
        let splitter = ChunkSplitter::new(20, FieldFilter::none());
        let data = json!(["aaaaaa", "bbbbbb", "cccccc"]);
        let parts = splitter.split(root_chunk(&splitter, &data));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].data, json!(["aaaaaa", "bbbbbb"]));
        assert_eq!(parts[1].data, json!(["cccccc"]));
        assert!(parts.iter().all(|p| p.size <= 20));
    }

    #[test]
    fn split_scalar_passes_through() {
        let splitter = ChunkSplitter::new(3, FieldFilter::none());
        let chunk = root_chunk(&splitter, &json!("a long string value"));
        assert_eq!(splitter.split(chunk).len(), 1);
    }

    #[test]
    fn pack_ranges_exact_boundary() {
        // {"a":1} is 7 bytes; two entries: {"a":1,"b":2} is 13
        assert_eq!(pack_ranges([5, 5], 13), vec![0..2]);
        assert_eq!(pack_ranges([5, 5], 12), vec![0..1, 1..2]);
    }

    #[test]
    fn pack_ranges_empty() {
        assert!(pack_ranges(Vec::new(), 10).is_empty());
    }
}
