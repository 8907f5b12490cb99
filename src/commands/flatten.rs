//! Flatten command handler

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use fieldcat::catalog::{flatten_with_stats, group_by_root, FlatField, FlattenStats, Group};

use super::{print_json, read_document};

/// Output of `fieldcat flatten --grouped`.
#[derive(Debug, Serialize)]
struct GroupedOutput {
    groups: Vec<Group>,
    stats: FlattenStats,
}

/// Output of `fieldcat flatten`.
#[derive(Debug, Serialize)]
struct FlatOutput {
    items: Vec<FlatField>,
    stats: FlattenStats,
}

/// Print the flattened fields of a document as JSON.
#[cfg(not(tarpaulin_include))]
pub fn handle(file: &str, grouped: bool, include_meta: bool) -> Result<()> {
    let document = read_document(file)?;
    let output = render(&document, grouped, include_meta)?;
    print_json(&output)
}

/// Build the JSON printed by the flatten command.
pub(crate) fn render(document: &Value, grouped: bool, include_meta: bool) -> Result<Value> {
    let result = flatten_with_stats(document);
    let items: Vec<FlatField> = result
        .items
        .into_iter()
        .filter(|f| include_meta || f.is_analyzable())
        .collect();

    let value = if grouped {
        serde_json::to_value(GroupedOutput {
            groups: group_by_root(&items),
            stats: result.stats,
        })?
    } else {
        serde_json::to_value(FlatOutput {
            items,
            stats: result.stats,
        })?
    };
    Ok(value)
}
