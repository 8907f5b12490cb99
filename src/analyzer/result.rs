//! Catalogue entries and their reconciliation with local descriptors.
//!
//! Every analyzable field ends up as exactly one [`FieldAnalysis`]: either
//! a collaborator record merged with the descriptor it answers, or a
//! templated fallback built from the descriptor alone.

use serde::{Deserialize, Serialize};

use super::batch::FieldDescriptor;
use super::parse::RawFieldMetadata;

/// Final metadata for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnalysis {
    pub path: String,
    pub field_name: String,
    /// Human-readable name
    pub data_name: String,
    pub description: String,
    pub sample_value: String,
    pub data_type: String,
    pub depth: usize,
    pub is_important: bool,
}

/// Last `.` segment of a path with array markers removed.
///
/// Falls back to the whole path when nothing is left, e.g. for the element
/// marker of a root array.
pub fn fallback_name(path: &str) -> String {
    let last = path.rsplit('.').next().unwrap_or(path);
    let name = last.trim_end_matches("[]");
    if name.is_empty() {
        path.to_string()
    } else {
        name.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl FieldAnalysis {
    /// Templated metadata for a field the collaborator could not describe.
    pub fn fallback(desc: &FieldDescriptor) -> Self {
        let name = fallback_name(&desc.path);
        Self {
            path: desc.path.clone(),
            field_name: name.clone(),
            data_name: name,
            description: format!("{} field", desc.field_type),
            sample_value: desc.value.clone(),
            data_type: desc.field_type.to_string(),
            depth: desc.depth,
            is_important: false,
        }
    }

    /// Merge a collaborator record with the descriptor it answers.
    ///
    /// Path and depth always come from the descriptor. Missing or blank
    /// fields are filled the same way [`fallback`](Self::fallback) would
    /// fill them.
    pub fn reconcile(raw: RawFieldMetadata, desc: &FieldDescriptor) -> Self {
        let base = Self::fallback(desc);

        if let Some(path) = raw.path.as_deref() {
            if path != desc.path {
                tracing::debug!(expected = %desc.path, got = %path, "agent renamed field path");
            }
        }

        let field_name = non_empty(raw.field_name).unwrap_or(base.field_name);
        let data_name = non_empty(raw.data_name).unwrap_or_else(|| field_name.clone());

        Self {
            path: base.path,
            field_name,
            data_name,
            description: non_empty(raw.description).unwrap_or(base.description),
            sample_value: raw.sample_value.unwrap_or(base.sample_value),
            data_type: non_empty(raw.data_type).unwrap_or(base.data_type),
            depth: base.depth,
            is_important: raw.is_important.unwrap_or(false),
        }
    }
}
