//! Structural synopsis of JSON fragments.
//!
//! The schema view describes types, array cardinalities and nested paths
//! without leaf values (scalars keep a sample). It is meant for people and
//! for prompts that need to explain a fragment's shape.

use serde_json::Value;

use super::filter::FieldFilter;
use super::types::{json_type_name, SchemaInfo, SchemaNode};

/// Top-level nodes printed by [`schema_overview`].
const OVERVIEW_TOP_NODES: usize = 10;
/// Children printed per node.
const OVERVIEW_CHILDREN: usize = 5;
/// Array paths listed in the overview header.
const OVERVIEW_ARRAYS: usize = 5;
/// Nesting below which children are no longer printed.
const OVERVIEW_MAX_INDENT: usize = 2;

/// Walks a fragment and produces [`SchemaNode`] trees.
#[derive(Debug, Clone, Default)]
pub struct SchemaExtractor {
    filter: FieldFilter,
}

impl SchemaExtractor {
    pub fn new(filter: FieldFilter) -> Self {
        Self { filter }
    }

    /// Schema nodes for the top level of `value`.
    pub fn extract(&self, value: &Value) -> Vec<SchemaNode> {
        self.extract_at(value, "")
    }

    /// Schema nodes for a fragment located at `path`.
    pub fn extract_at(&self, value: &Value, path: &str) -> Vec<SchemaNode> {
        match value {
            Value::Array(items) => {
                let name = path
                    .rsplit('.')
                    .next()
                    .filter(|s| !s.is_empty())
                    .unwrap_or("root");
                let sample = if items.is_empty() {
                    "[]".to_string()
                } else {
                    format!("[{} items]", items.len())
                };
                vec![SchemaNode {
                    path: if path.is_empty() {
                        "root".to_string()
                    } else {
                        path.to_string()
                    },
                    name: name.to_string(),
                    node_type: "array".to_string(),
                    is_array: true,
                    is_object: false,
                    child_count: Some(items.len()),
                    sample_value: Some(Value::String(sample)),
                    children: self.element_children(items, path),
                }]
            }
            Value::Object(map) => map
                .iter()
                .filter(|(key, _)| !self.filter.is_skipped(key))
                .map(|(key, child)| {
                    let field_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    self.field_node(key, child, field_path)
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn field_node(&self, key: &str, value: &Value, path: String) -> SchemaNode {
        let mut node = SchemaNode {
            path: path.clone(),
            name: key.to_string(),
            node_type: json_type_name(value).to_string(),
            is_array: value.is_array(),
            is_object: value.is_object(),
            child_count: None,
            sample_value: None,
            children: None,
        };

        match value {
            Value::Array(items) => {
                node.child_count = Some(items.len());
                node.sample_value = Some(Value::String(format!("[{} items]", items.len())));
                node.children = self.element_children(items, &path);
            }
            Value::Object(map) => {
                node.children = Some(self.extract_at(value, &path));
                node.child_count = Some(map.len());
            }
            scalar => node.sample_value = Some(scalar.clone()),
        }

        node
    }

    /// Children described by the first element, when it is a container.
    fn element_children(&self, items: &[Value], path: &str) -> Option<Vec<SchemaNode>> {
        items
            .first()
            .filter(|first| first.is_object() || first.is_array())
            .map(|first| self.extract_at(first, &format!("{}[]", path)))
    }
}

/// Render a schema as an indented outline.
///
/// ```text
/// Root Type: object
/// Top-level Keys: data, status
/// Arrays: data
///
/// Structure:
/// - data: array[2]
///   - id: number
/// - status: string
/// ```
pub fn schema_overview(schema: &SchemaInfo) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Root Type: {}", schema.root_type));
    lines.push(format!("Top-level Keys: {}", schema.top_level_keys.join(", ")));

    if !schema.array_paths.is_empty() {
        let shown: Vec<&str> = schema
            .array_paths
            .iter()
            .take(OVERVIEW_ARRAYS)
            .map(String::as_str)
            .collect();
        let more = if schema.array_paths.len() > OVERVIEW_ARRAYS {
            "..."
        } else {
            ""
        };
        lines.push(format!("Arrays: {}{}", shown.join(", "), more));
    }

    lines.push("\nStructure:".to_string());
    for node in schema.structure.iter().take(OVERVIEW_TOP_NODES) {
        push_node(node, 0, &mut lines);
    }

    lines.join("\n")
}

fn push_node(node: &SchemaNode, indent: usize, lines: &mut Vec<String>) {
    let prefix = "  ".repeat(indent);
    let count = node.child_count.unwrap_or(0);
    let type_str = if node.is_array {
        format!("array[{}]", count)
    } else if node.is_object {
        format!("object{{{}}}", count)
    } else {
        node.node_type.clone()
    };
    lines.push(format!("{}- {}: {}", prefix, node.name, type_str));

    if let Some(children) = &node.children {
        if indent < OVERVIEW_MAX_INDENT {
            for child in children.iter().take(OVERVIEW_CHILDREN) {
                push_node(child, indent + 1, lines);
            }
            if children.len() > OVERVIEW_CHILDREN {
                lines.push(format!(
                    "{}  ... and {} more",
                    prefix,
                    children.len() - OVERVIEW_CHILDREN
                ));
            }
        }
    }
}
