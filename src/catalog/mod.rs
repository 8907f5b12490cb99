//! Field catalogue: flattening JSON documents into addressable leaves.
//!
//! # Module Structure
//!
//! - `flatten` - pre-order path flattening with array sampling
//! - `group` - partitioning of fields by top-level key
//! - `types` - `FlatField`, `FieldType`, `Group` and statistics

mod flatten;
mod group;
mod types;

pub use flatten::{
    compression_ratio, flatten, flatten_at, flatten_with_stats, serialized_len, truncate_value,
};
pub use group::{group_by_root, root_key};
pub use types::{
    FieldType, FlatField, FlattenResult, FlattenStats, Group, ELLIPSIS, LENGTH_SUFFIX,
    MAX_VALUE_LENGTH, ROOT_PATH,
};
