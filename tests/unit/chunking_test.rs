//! Unit tests for structural chunking

use fieldcat::chunking::{schema_overview, ChunkKind, FieldFilter, SemanticChunker};

use crate::helpers::load_json_fixture;

#[test]
fn fixture_chunks_skip_links() {
    let doc = load_json_fixture("quote_response.json");
    let result = SemanticChunker::default().chunk(&doc);

    assert_eq!(result.chunks[0].kind, ChunkKind::Root);
    assert!(result
        .chunks
        .iter()
        .all(|c| !c.path.starts_with("_links")));
    assert!(!result.schema.top_level_keys.contains(&"_links".to_string()));
    assert_eq!(result.stats.total_chunks, result.chunks.len());
}

#[test]
fn fixture_history_items_become_array_chunks() {
    let doc = load_json_fixture("quote_response.json");
    let result = SemanticChunker::default().chunk(&doc);

    let items: Vec<&str> = result
        .chunks
        .iter()
        .filter(|c| c.kind == ChunkKind::ArrayItem)
        .map(|c| c.path.as_str())
        .collect();
    assert_eq!(items, ["history[0]", "history[1]"]);
    assert!(result.schema.array_paths.contains(&"history".to_string()));
}

#[test]
fn overview_mentions_top_level_keys() {
    let doc = load_json_fixture("quote_response.json");
    let chunker = SemanticChunker::new(4000, FieldFilter::none(), 3);
    let overview = schema_overview(&chunker.schema(&doc));

    assert!(overview.starts_with("Root Type: object"));
    assert!(overview.contains("_links"));
    assert!(overview.contains("quote"));
}
