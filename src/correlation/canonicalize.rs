//! Canonicalization passes.
//!
//! The passes must run in the order [`canonicalize`] runs them: reference
//! results are merged before result sets copy their ids, and ranges inherit
//! from result sets that are already fully resolved.
//!
//! # Panics
//!
//! Ingestion guarantees that every id reachable from the state exists. A
//! missing vertex here is a bug in an earlier pass and panics.

use std::collections::HashMap;

use tracing::debug;

use super::state::{ResultLinks, State};
use crate::datastructures::{Id, IdSet, IdSetMap};

/// Run every pass in order.
pub fn canonicalize(state: &mut State) {
    canonicalize_documents(state);
    canonicalize_reference_results(state);
    canonicalize_result_sets(state);
    canonicalize_ranges(state);
}

/// Collapse documents that share a URI into the one with the smallest id.
pub fn canonicalize_documents(state: &mut State) {
    let mut ids_by_uri: HashMap<&str, Vec<Id>> = HashMap::new();
    for (&id, document) in &state.document_data {
        ids_by_uri.entry(document.uri.as_str()).or_default().push(id);
    }

    let mut canonical_ids: HashMap<Id, Id> = HashMap::new();
    for ids in ids_by_uri.values() {
        if let Some(&canonical) = ids.iter().min() {
            for &id in ids {
                if id != canonical {
                    canonical_ids.insert(id, canonical);
                }
            }
        }
    }

    if canonical_ids.is_empty() {
        return;
    }

    for (&duplicate, &canonical) in &canonical_ids {
        let Some(removed) = state.document_data.remove(&duplicate) else {
            continue;
        };
        let document = state
            .document_data
            .get_mut(&canonical)
            .unwrap_or_else(|| panic!("canonical document {canonical} missing"));
        document.contains.union(&removed.contains);
        document.diagnostics.union(&removed.diagnostics);
    }

    for results in state
        .definition_data
        .values_mut()
        .chain(state.reference_data.values_mut())
    {
        rekey_documents(results, &canonical_ids);
    }

    debug!(merged = canonical_ids.len(), "canonicalized documents");
}

fn rekey_documents(results: &mut IdSetMap, canonical_ids: &HashMap<Id, Id>) {
    let stale: Vec<Id> = results
        .keys()
        .copied()
        .filter(|id| canonical_ids.contains_key(id))
        .collect();

    for id in stale {
        if let Some(ranges) = results.remove(id) {
            results.union_into(canonical_ids[&id], &ranges);
        }
    }
}

/// Merge each group of linked reference results into its smallest id.
pub fn canonicalize_reference_results(state: &mut State) {
    let mut canonical_ids: HashMap<Id, Id> = HashMap::new();
    let mut visited = IdSet::new();

    for id in state.linked_reference_results.ids() {
        if visited.contains(id) {
            continue;
        }

        let linked = state.linked_reference_results.extract_set(id);
        visited.union(&linked);
        let Some(canonical) = linked.min() else {
            continue;
        };

        let mut merged = state.reference_data.remove(&canonical).unwrap_or_default();
        for linked_id in linked.to_sorted_vec() {
            if linked_id == canonical {
                continue;
            }
            if let Some(results) = state.reference_data.remove(&linked_id) {
                for (&document, ranges) in &results {
                    merged.union_into(document, ranges);
                }
            }
            canonical_ids.insert(linked_id, canonical);
        }
        state.reference_data.insert(canonical, merged);
    }

    if canonical_ids.is_empty() {
        return;
    }

    let links = state
        .result_set_data
        .values_mut()
        .chain(state.range_data.values_mut().map(|range| &mut range.links));
    for links in links {
        if let Some(&canonical) = canonical_ids.get(&links.reference_result_id) {
            links.reference_result_id = canonical;
        }
    }

    debug!(merged = canonical_ids.len(), "canonicalized reference results");
}

/// Resolve the next chain of every result set.
///
/// Unset result ids take the nearest non-zero value along the chain; moniker
/// sets collect every chain member's monikers plus their linked aliases.
pub fn canonicalize_result_sets(state: &mut State) {
    let mut ids: Vec<Id> = state.result_set_data.keys().copied().collect();
    ids.sort_unstable();

    for &id in &ids {
        resolve_result_set(state, id);
    }

    for id in ids {
        let gathered = state.gather_monikers(&state.result_set_data[&id].moniker_ids);
        if let Some(links) = state.result_set_data.get_mut(&id) {
            links.moniker_ids = gathered;
        }
    }

    debug!(pending_next = state.next_data.len(), "canonicalized result sets");
}

/// Fold the chain starting at result set `id` into it, innermost first.
fn resolve_result_set(state: &mut State, id: Id) {
    let mut chain = vec![id];
    let mut current = id;
    while let Some(&next) = state.next_data.get(&current) {
        if !state.result_set_data.contains_key(&current) {
            break;
        }
        chain.push(next);
        current = next;
    }

    // Walk back from the chain's end so each node folds an already-resolved
    // successor.
    for pair in chain.windows(2).rev() {
        let (node, next) = (pair[0], pair[1]);
        if state.next_data.remove(&node).is_none() {
            continue;
        }
        let resolved = state
            .result_set_data
            .get(&next)
            .cloned()
            .unwrap_or_else(|| panic!("next chain targets missing result set {next}"));
        let links = state
            .result_set_data
            .get_mut(&node)
            .unwrap_or_else(|| panic!("result set {node} missing"));
        links.inherit_from(&resolved);
    }
}

/// Resolve every range against the (already resolved) result set it points to.
pub fn canonicalize_ranges(state: &mut State) {
    let ids: Vec<Id> = state.range_data.keys().copied().collect();

    for id in ids {
        let resolved: Option<ResultLinks> = state.next_data.remove(&id).map(|next| {
            state
                .result_set_data
                .get(&next)
                .cloned()
                .unwrap_or_else(|| panic!("range {id} points at missing result set {next}"))
        });

        let Some(range) = state.range_data.get(&id) else {
            continue;
        };
        let mut links = range.links.clone();
        if let Some(resolved) = &resolved {
            links.inherit_from(resolved);
        }
        links.moniker_ids = state.gather_monikers(&links.moniker_ids);

        if let Some(range) = state.range_data.get_mut(&id) {
            range.links = links;
        }
    }

    debug_assert!(state.next_data.is_empty(), "next data left after ranges");
    debug!("canonicalized ranges");
}
