//! Compact set of graph identifiers.
//!
//! Most sets in a correlated dump are tiny (a range belongs to one or two
//! monikers, a document holds a handful of diagnostics), while a few are huge
//! (the ranges of a large document, the locations of a popular reference
//! result). `IdSet` keeps small sets in a sorted `Vec` and switches to a
//! `HashSet` once it grows past [`SMALL_SET_THRESHOLD`]. The switch is one-way
//! and invisible to callers: every operation answers identically in both
//! representations.

use std::collections::HashSet;

use super::Id;

/// Largest size kept in the sorted-vector representation.
pub const SMALL_SET_THRESHOLD: usize = 16;

#[derive(Debug, Clone)]
enum Repr {
    Small(Vec<Id>),
    Large(HashSet<Id>),
}

/// Unordered set of non-zero identifiers.
#[derive(Debug, Clone)]
pub struct IdSet {
    repr: Repr,
}

impl IdSet {
    pub fn new() -> Self {
        Self {
            repr: Repr::Small(Vec::new()),
        }
    }

    /// Create a set holding the given identifiers.
    pub fn from_ids(ids: impl IntoIterator<Item = Id>) -> Self {
        let mut set = Self::new();
        for id in ids {
            set.add(id);
        }
        set
    }

    /// Insert `id`. Returns `false` if it was already present.
    pub fn add(&mut self, id: Id) -> bool {
        match &mut self.repr {
            Repr::Small(ids) => match ids.binary_search(&id) {
                Ok(_) => false,
                Err(pos) => {
                    if ids.len() < SMALL_SET_THRESHOLD {
                        ids.insert(pos, id);
                    } else {
                        let mut large: HashSet<Id> = ids.drain(..).collect();
                        large.insert(id);
                        self.repr = Repr::Large(large);
                    }
                    true
                }
            },
            Repr::Large(ids) => ids.insert(id),
        }
    }

    pub fn contains(&self, id: Id) -> bool {
        match &self.repr {
            Repr::Small(ids) => ids.binary_search(&id).is_ok(),
            Repr::Large(ids) => ids.contains(&id),
        }
    }

    /// Remove `id`. Returns `true` if it was present.
    pub fn remove(&mut self, id: Id) -> bool {
        match &mut self.repr {
            Repr::Small(ids) => match ids.binary_search(&id) {
                Ok(pos) => {
                    ids.remove(pos);
                    true
                }
                Err(_) => false,
            },
            Repr::Large(ids) => ids.remove(&id),
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Small(ids) => ids.len(),
            Repr::Large(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every member. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        let (small, large) = match &self.repr {
            Repr::Small(ids) => (Some(ids.iter().copied()), None),
            Repr::Large(ids) => (None, Some(ids.iter().copied())),
        };
        small.into_iter().flatten().chain(large.into_iter().flatten())
    }

    /// Absorb every member of `other`.
    pub fn union(&mut self, other: &IdSet) {
        for id in other.iter() {
            self.add(id);
        }
    }

    /// Smallest member, or `None` for an empty set.
    pub fn min(&self) -> Option<Id> {
        match &self.repr {
            Repr::Small(ids) => ids.first().copied(),
            Repr::Large(ids) => ids.iter().min().copied(),
        }
    }

    /// Remove and return an arbitrary member.
    pub fn pop(&mut self) -> Option<Id> {
        match &mut self.repr {
            Repr::Small(ids) => ids.pop(),
            Repr::Large(ids) => {
                let id = *ids.iter().next()?;
                ids.remove(&id);
                Some(id)
            }
        }
    }

    /// Members in ascending order.
    pub fn to_sorted_vec(&self) -> Vec<Id> {
        match &self.repr {
            Repr::Small(ids) => ids.clone(),
            Repr::Large(ids) => {
                let mut sorted: Vec<Id> = ids.iter().copied().collect();
                sorted.sort_unstable();
                sorted
            }
        }
    }

    #[cfg(test)]
    fn is_large(&self) -> bool {
        matches!(self.repr, Repr::Large(_))
    }
}

impl Default for IdSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for IdSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }
}

impl Eq for IdSet {}

impl FromIterator<Id> for IdSet {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

impl Extend<Id> for IdSet {
    fn extend<I: IntoIterator<Item = Id>>(&mut self, iter: I) {
        for id in iter {
            self.add(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_set(count: u64) {
        let mut set = IdSet::new();
        for i in 1..=count {
            assert!(set.add(i));
        }
        // Re-adding is a no-op in either representation
        for i in 1..=count {
            assert!(!set.add(i));
        }

        assert_eq!(set.len(), count as usize);
        for i in 1..=count {
            assert!(set.contains(i), "missing {i}");
        }
        assert!(!set.contains(0));
        assert!(!set.contains(count + 1));

        let mut seen: Vec<u64> = set.iter().collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=count).collect::<Vec<_>>());
        assert_eq!(set.to_sorted_vec(), seen);
    }

    #[test]
    fn test_small_set() {
        check_set(SMALL_SET_THRESHOLD as u64);
    }

    #[test]
    fn test_large_set() {
        check_set(10_000);
    }

    #[test]
    fn test_transition_is_one_way() {
        let mut set: IdSet = (1..=SMALL_SET_THRESHOLD as u64).collect();
        assert!(!set.is_large());

        set.add(100);
        assert!(set.is_large());

        while set.len() > 2 {
            set.pop();
        }
        assert!(set.is_large());
    }

    #[test]
    fn test_min() {
        assert_eq!(IdSet::new().min(), None);

        let small = IdSet::from_ids([42, 7, 19]);
        assert_eq!(small.min(), Some(7));

        let large: IdSet = (50..150).rev().collect();
        assert!(large.is_large());
        assert_eq!(large.min(), Some(50));
    }

    #[test]
    fn test_pop_drains_everything() {
        for count in [5u64, 500] {
            let mut set: IdSet = (1..=count).collect();
            let mut popped = Vec::new();
            while let Some(id) = set.pop() {
                popped.push(id);
            }
            popped.sort_unstable();
            assert_eq!(popped, (1..=count).collect::<Vec<_>>());
            assert!(set.is_empty());
        }
    }

    #[test]
    fn test_union_across_representations() {
        let mut small = IdSet::from_ids([1, 2, 3]);
        let large: IdSet = (3..=40).collect();

        small.union(&large);
        assert_eq!(small.len(), 40);
        assert!(small.contains(1));
        assert!(small.contains(40));

        let mut large = large;
        large.union(&IdSet::from_ids([1, 2]));
        assert_eq!(large, small);
    }

    #[test]
    fn test_remove() {
        let mut set = IdSet::from_ids([4, 5, 6]);
        assert!(set.remove(5));
        assert!(!set.remove(5));
        assert_eq!(set.to_sorted_vec(), vec![4, 6]);

        let mut large: IdSet = (1..=30).collect();
        assert!(large.remove(30));
        assert!(!large.contains(30));
        assert_eq!(large.len(), 29);
    }
}
