//! Equivalence links between identifiers.
//!
//! Links are stored as an adjacency map and components are found by flood
//! fill. Linked groups in a dump are tiny: an import/export moniker pair, or
//! the reference results of one symbol split across compilation units.

use super::{Id, IdSet, IdSetMap};

#[derive(Debug, Clone, Default)]
pub struct DisjointIdSet {
    links: IdSetMap,
}

impl DisjointIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `a` and `b`. Symmetric.
    pub fn union(&mut self, a: Id, b: Id) {
        self.links.add(a, b);
        self.links.add(b, a);
    }

    /// Whether `id` has been linked to anything.
    pub fn contains(&self, id: Id) -> bool {
        self.links.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Every identifier that appears in at least one link, ascending.
    pub fn ids(&self) -> Vec<Id> {
        self.links.sorted_keys()
    }

    /// The connected component containing `id`, including `id` itself.
    ///
    /// The result does not depend on which member of the component is asked.
    pub fn extract_set(&self, id: Id) -> IdSet {
        let mut visited = IdSet::new();
        let mut frontier = IdSet::from_ids([id]);

        while let Some(next) = frontier.pop() {
            if !visited.add(next) {
                continue;
            }
            if let Some(neighbors) = self.links.get(next) {
                for neighbor in neighbors.iter() {
                    if !visited.contains(neighbor) {
                        frontier.add(neighbor);
                    }
                }
            }
        }

        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_set() {
        let mut links = DisjointIdSet::new();
        links.union(1, 2);
        links.union(3, 4);
        links.union(1, 3);
        links.union(5, 6);

        let group = IdSet::from_ids([1, 2, 3, 4]);
        for id in [1, 2, 3, 4] {
            assert_eq!(links.extract_set(id), group, "querying {id}");
        }

        let pair = IdSet::from_ids([5, 6]);
        for id in [5, 6] {
            assert_eq!(links.extract_set(id), pair, "querying {id}");
        }
    }

    #[test]
    fn test_union_is_symmetric() {
        let mut forward = DisjointIdSet::new();
        forward.union(10, 20);

        assert_eq!(forward.extract_set(10), forward.extract_set(20));
        assert!(forward.contains(10));
        assert!(forward.contains(20));
    }

    #[test]
    fn test_unlinked_id_is_its_own_component() {
        let links = DisjointIdSet::new();
        assert_eq!(links.extract_set(9), IdSet::from_ids([9]));
        assert!(!links.contains(9));
    }

    #[test]
    fn test_long_chain() {
        let mut links = DisjointIdSet::new();
        for id in 1..200 {
            links.union(id, id + 1);
        }

        let component = links.extract_set(100);
        assert_eq!(component.len(), 200);
        assert_eq!(component.min(), Some(1));
        assert_eq!(links.ids().len(), 200);
    }
}
