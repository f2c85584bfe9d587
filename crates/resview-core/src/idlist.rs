use std::collections::HashSet;
use std::sync::Arc;

use crate::item::ItemId;

/// Ordered, immutable list of result item ids.
///
/// Clones share storage. Lists are never mutated in place; operations
/// like [`IdList::union_with`] return a new list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdList {
    ids: Arc<[ItemId]>,
}

impl IdList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ItemId> {
        self.ids.get(index).copied()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[ItemId] {
        &self.ids
    }

    /// Set union preserving order: `self` first, then the ids of `other`
    /// not seen yet. Duplicates within either list collapse too.
    pub fn union_with(&self, other: &IdList) -> IdList {
        let mut seen = HashSet::with_capacity(self.len() + other.len());
        self.iter()
            .chain(other.iter())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Ids at the given row indices, in the order of `indices`. Out-of-range
    /// indices are skipped.
    pub fn subset(&self, indices: &[usize]) -> IdList {
        indices.iter().filter_map(|&i| self.get(i)).collect()
    }
}

impl FromIterator<ItemId> for IdList {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<ItemId>> for IdList {
    fn from(ids: Vec<ItemId>) -> Self {
        Self { ids: ids.into() }
    }
}
