//! Unit tests for flattening and grouping

use fieldcat::catalog::{flatten, flatten_with_stats, group_by_root, FieldType};

use crate::helpers::load_json_fixture;

#[test]
fn fixture_flattens_in_document_order() {
    let doc = load_json_fixture("quote_response.json");
    let paths: Vec<String> = flatten(&doc).into_iter().map(|f| f.path).collect();

    assert_eq!(
        paths,
        [
            "status",
            "symbol",
            "quote.price",
            "quote.currency",
            "quote.change",
            "quote.marketOpen",
            "quote.exchange.code",
            "quote.exchange.timezone",
            "history[].date",
            "history[].open",
            "history[].close",
            "history[].volume",
            "history._length",
            "_links.self",
            "_links.next",
            "dividend",
        ]
    );
}

#[test]
fn fixture_types_and_depths() {
    let doc = load_json_fixture("quote_response.json");
    let fields = flatten(&doc);
    let find = |path: &str| fields.iter().find(|f| f.path == path).unwrap();

    assert_eq!(find("quote.marketOpen").field_type, FieldType::Boolean);
    assert_eq!(find("quote.exchange.code").depth, 2);
    assert_eq!(find("history._length").field_type, FieldType::Meta);
    assert_eq!(find("history._length").value, "2");
    assert_eq!(find("dividend").field_type, FieldType::Null);
    assert_eq!(find("_links.next").value, "null");
}

#[test]
fn fixture_groups_by_top_level_key() {
    let doc = load_json_fixture("quote_response.json");
    let groups = group_by_root(&flatten(&doc));

    let summary: Vec<(String, usize)> = groups
        .iter()
        .map(|g| (g.root_key.clone(), g.analyzable_count()))
        .collect();
    assert_eq!(
        summary,
        [
            ("status".to_string(), 1),
            ("symbol".to_string(), 1),
            ("quote".to_string(), 6),
            ("history".to_string(), 4),
            ("_links".to_string(), 2),
            ("dividend".to_string(), 1),
        ]
    );
}

#[test]
fn stats_report_original_size() {
    let doc = load_json_fixture("quote_response.json");
    let result = flatten_with_stats(&doc);

    assert_eq!(result.stats.flattened_count, 16);
    assert_eq!(
        result.stats.original_size,
        serde_json::to_string(&doc).unwrap().len()
    );
    assert!(result.stats.compression_ratio.ends_with('%'));
}
