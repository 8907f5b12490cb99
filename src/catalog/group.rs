//! Partitioning of flattened fields by top-level key.

use std::collections::HashMap;

use super::types::{FlatField, Group, ROOT_PATH};

/// Top-level key of a path: text before the first `.`, then before any `[`.
///
/// Fields of a root-level array have no key of their own and are filed
/// under `root`.
pub fn root_key(path: &str) -> &str {
    let head = path.split('.').next().unwrap_or(path);
    let key = head.split('[').next().unwrap_or(head);
    if key.is_empty() {
        ROOT_PATH
    } else {
        key
    }
}

/// Group fields by root key in first-seen order.
///
/// Order inside each group follows the input. Synthetic `._length` entries
/// are kept; filtering them is up to the caller.
pub fn group_by_root(items: &[FlatField]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let key = root_key(&item.path);
        match index.get(key) {
            Some(&i) => groups[i].items.push(item.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(Group {
                    root_key: key.to_string(),
                    items: vec![item.clone()],
                });
            }
        }
    }

    groups
}
