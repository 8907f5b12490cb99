//! Batch planning for field analysis.
//!
//! Groups are cut into consecutive batches of analyzable fields. Array
//! length meta-fields never leave the process.

use serde::{Deserialize, Serialize};

use crate::catalog::{FieldType, FlatField, Group};

/// Default number of fields per collaborator call.
pub const DEFAULT_BATCH_SIZE: usize = 40;

/// What the collaborator sees for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub path: String,
    pub value: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub depth: usize,
}

impl From<&FlatField> for FieldDescriptor {
    fn from(field: &FlatField) -> Self {
        Self {
            path: field.path.clone(),
            value: field.value.clone(),
            field_type: field.field_type,
            depth: field.depth,
        }
    }
}

/// A run of consecutive analyzable fields from one section.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Root key of the section the fields come from.
    pub section: String,
    /// 1-based index within the section.
    pub index: usize,
    /// Number of batches the section was cut into.
    pub count: usize,
    pub descriptors: Vec<FieldDescriptor>,
}

impl Batch {
    /// `Section "k"` or `Section "k" part i/n`.
    pub fn label(&self) -> String {
        if self.count > 1 {
            format!(
                "Section \"{}\" part {}/{}",
                self.section, self.index, self.count
            )
        } else {
            format!("Section \"{}\"", self.section)
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Cut every group into batches of at most `batch_size` analyzable fields.
///
/// Sections without analyzable fields produce no batch. Batch order follows
/// group order, so concatenating batch descriptors reproduces the
/// analyzable subsequence of the flattened input.
pub fn plan_batches(groups: &[Group], batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::new();

    for group in groups {
        let descriptors: Vec<FieldDescriptor> = group
            .items
            .iter()
            .filter(|f| f.is_analyzable())
            .map(FieldDescriptor::from)
            .collect();
        if descriptors.is_empty() {
            continue;
        }

        let count = descriptors.len().div_ceil(batch_size);
        for (i, slice) in descriptors.chunks(batch_size).enumerate() {
            batches.push(Batch {
                section: group.root_key.clone(),
                index: i + 1,
                count,
                descriptors: slice.to_vec(),
            });
        }
    }

    batches
}
