//! Map from an identifier to an [`IdSet`], creating sets on demand.

use std::collections::HashMap;
use std::collections::hash_map::{Entry, Iter, Keys};

use super::{Id, IdSet};

/// Identifier → set of identifiers.
///
/// Used for the document → ranges partition of every definition and
/// reference result, and as the adjacency map behind
/// [`DisjointIdSet`](super::DisjointIdSet).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSetMap {
    inner: HashMap<Id, IdSet>,
}

impl IdSetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: Id) -> Option<&IdSet> {
        self.inner.get(&key)
    }

    pub fn get_or_create(&mut self, key: Id) -> &mut IdSet {
        self.inner.entry(key).or_default()
    }

    /// Add `value` to the set stored under `key`.
    pub fn add(&mut self, key: Id, value: Id) {
        self.get_or_create(key).add(value);
    }

    /// Union `values` into the set stored under `key`.
    pub fn union_into(&mut self, key: Id, values: &IdSet) {
        match self.inner.entry(key) {
            Entry::Occupied(mut entry) => entry.get_mut().union(values),
            Entry::Vacant(entry) => {
                entry.insert(values.clone());
            }
        }
    }

    pub fn remove(&mut self, key: Id) -> Option<IdSet> {
        self.inner.remove(&key)
    }

    pub fn contains_key(&self, key: Id) -> bool {
        self.inner.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn keys(&self) -> Keys<'_, Id, IdSet> {
        self.inner.keys()
    }

    pub fn iter(&self) -> Iter<'_, Id, IdSet> {
        self.inner.iter()
    }

    /// Keys in ascending order.
    pub fn sorted_keys(&self) -> Vec<Id> {
        let mut keys: Vec<Id> = self.inner.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

impl<'a> IntoIterator for &'a IdSetMap {
    type Item = (&'a Id, &'a IdSet);
    type IntoIter = Iter<'a, Id, IdSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create() {
        let mut map = IdSetMap::new();
        assert!(map.get(1).is_none());

        map.add(1, 10);
        map.add(1, 11);
        map.add(2, 20);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(1).map(IdSet::len), Some(2));
        assert!(map.get_or_create(3).is_empty());
        assert_eq!(map.sorted_keys(), vec![1, 2, 3]);
    }

    #[test]
    fn test_union_into_merges_instead_of_overwriting() {
        let mut map = IdSetMap::new();
        map.union_into(7, &IdSet::from_ids([1, 2]));
        map.union_into(7, &IdSet::from_ids([2, 3]));

        assert_eq!(map.get(7), Some(&IdSet::from_ids([1, 2, 3])));
    }
}
