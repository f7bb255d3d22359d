//! In-memory graph of one dump.
//!
//! Relationships are identifier lookups into the owning maps; nothing holds a
//! reference to another vertex. The graph is built out of order, so every
//! cross-link is resolved by id when it is needed.

use std::collections::HashMap;

use crate::correlation::element::MonikerKind;
use crate::datastructures::{DisjointIdSet, Id, IdSet, IdSetMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentData {
    pub uri: String,
    /// Range ids.
    pub contains: IdSet,
    /// Diagnostic-result ids.
    pub diagnostics: IdSet,
}

/// Result links shared by ranges and result sets. `0` means absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultLinks {
    pub definition_result_id: Id,
    pub reference_result_id: Id,
    pub hover_result_id: Id,
    pub moniker_ids: IdSet,
}

impl ResultLinks {
    /// Fill unset result ids from `next` and absorb its monikers.
    pub fn inherit_from(&mut self, next: &ResultLinks) {
        if self.definition_result_id == 0 {
            self.definition_result_id = next.definition_result_id;
        }
        if self.reference_result_id == 0 {
            self.reference_result_id = next.reference_result_id;
        }
        if self.hover_result_id == 0 {
            self.hover_result_id = next.hover_result_id;
        }
        self.moniker_ids.union(&next.moniker_ids);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeData {
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
    pub links: ResultLinks,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonikerData {
    pub kind: MonikerKind,
    pub scheme: String,
    pub identifier: String,
    pub package_information_id: Id,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageInformationData {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticData {
    pub severity: i32,
    pub code: String,
    pub message: String,
    pub source: String,
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
}

/// The whole graph of one dump, mutated in place by every pass.
#[derive(Debug, Default)]
pub struct State {
    pub lsif_version: String,
    pub project_root: String,
    pub document_data: HashMap<Id, DocumentData>,
    pub range_data: HashMap<Id, RangeData>,
    pub result_set_data: HashMap<Id, ResultLinks>,
    /// Definition result → document → range ids.
    pub definition_data: HashMap<Id, IdSetMap>,
    /// Reference result → document → range ids.
    pub reference_data: HashMap<Id, IdSetMap>,
    pub hover_data: HashMap<Id, String>,
    pub moniker_data: HashMap<Id, MonikerData>,
    pub package_information_data: HashMap<Id, PackageInformationData>,
    pub diagnostic_data: HashMap<Id, Vec<DiagnosticData>>,
    /// Pending "inherits from" edges, emptied by canonicalization.
    pub next_data: HashMap<Id, Id>,
    pub imported_monikers: IdSet,
    pub exported_monikers: IdSet,
    pub linked_monikers: DisjointIdSet,
    pub linked_reference_results: DisjointIdSet,
}

/// Entity counts, logged between passes and returned by `correlate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StateCounts {
    pub documents: usize,
    pub ranges: usize,
    pub result_sets: usize,
    pub definition_results: usize,
    pub reference_results: usize,
    pub monikers: usize,
    pub pending_next: usize,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> StateCounts {
        StateCounts {
            documents: self.document_data.len(),
            ranges: self.range_data.len(),
            result_sets: self.result_set_data.len(),
            definition_results: self.definition_data.len(),
            reference_results: self.reference_data.len(),
            monikers: self.moniker_data.len(),
            pending_next: self.next_data.len(),
        }
    }

    /// Expand a set of monikers with every moniker linked to any of them.
    pub fn gather_monikers(&self, source: &IdSet) -> IdSet {
        let mut monikers = IdSet::new();
        for id in source.iter() {
            if self.linked_monikers.contains(id) {
                monikers.union(&self.linked_monikers.extract_set(id));
            } else {
                monikers.add(id);
            }
        }
        monikers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherit_from_keeps_own_values() {
        let mut own = ResultLinks {
            definition_result_id: 10,
            moniker_ids: IdSet::from_ids([1]),
            ..Default::default()
        };
        let next = ResultLinks {
            definition_result_id: 20,
            reference_result_id: 21,
            hover_result_id: 22,
            moniker_ids: IdSet::from_ids([2]),
        };

        own.inherit_from(&next);

        assert_eq!(own.definition_result_id, 10);
        assert_eq!(own.reference_result_id, 21);
        assert_eq!(own.hover_result_id, 22);
        assert_eq!(own.moniker_ids, IdSet::from_ids([1, 2]));
    }

    #[test]
    fn test_gather_monikers() {
        let mut state = State::new();
        state.linked_monikers.union(1, 2);
        state.linked_monikers.union(2, 3);

        let gathered = state.gather_monikers(&IdSet::from_ids([1, 9]));
        assert_eq!(gathered, IdSet::from_ids([1, 2, 3, 9]));
    }
}
