// ── Grouping ──
//
// Single left-to-right pass that folds items sharing a group key into
// the group opened by the key's first occurrence. Ungrouped items keep
// their position.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

/// One entry of a grouped listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderEntry<T, K> {
    Item { value: T },
    Group { key: K, items: Vec<T> },
}

impl<T, K> RenderEntry<T, K> {
    /// Items held by this entry, in order.
    pub fn items(&self) -> &[T] {
        match self {
            Self::Item { value } => std::slice::from_ref(value),
            Self::Group { items, .. } => items,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }
}

/// Group `items` by `key_of`, preserving first-seen key order.
pub fn group<T, K, I, F>(items: I, mut key_of: F) -> Vec<RenderEntry<T, K>>
where
    I: IntoIterator<Item = T>,
    K: Hash + Eq + Clone,
    F: FnMut(&T) -> Option<K>,
{
    let mut entries: Vec<RenderEntry<T, K>> = Vec::new();
    let mut open: HashMap<K, usize> = HashMap::new();

    for item in items {
        let Some(key) = key_of(&item) else {
            entries.push(RenderEntry::Item { value: item });
            continue;
        };
        if let Some(&at) = open.get(&key) {
            if let RenderEntry::Group { items, .. } = &mut entries[at] {
                items.push(item);
            }
        } else {
            open.insert(key.clone(), entries.len());
            entries.push(RenderEntry::Group {
                key,
                items: vec![item],
            });
        }
    }
    entries
}

/// Flatten entries back into item order.
pub fn flatten<T, K>(entries: &[RenderEntry<T, K>]) -> impl Iterator<Item = &T> {
    entries.iter().flat_map(RenderEntry::items)
}
