//! Drops documents that do not exist in the repository.

use tracing::{debug, info};

use super::error::CorrelateResult;
use super::existence::{ChildrenSource, ExistenceChecker};
use super::state::State;
use crate::datastructures::Id;

/// Remove every document whose path is not in the repository tree, along with
/// the definition/reference entries keyed by it. Returns the number removed.
///
/// Result ids stay in place even when all their documents are gone, so later
/// lookups by result id keep succeeding.
pub fn prune(state: &mut State, root: &str, source: &dyn ChildrenSource) -> CorrelateResult<usize> {
    let checker = ExistenceChecker::new(
        root,
        state.document_data.values().map(|document| document.uri.as_str()),
        source,
    )?;

    let mut removed: Vec<Id> = state
        .document_data
        .iter()
        .filter(|(_, document)| !checker.should_include(&document.uri))
        .map(|(&id, _)| id)
        .collect();
    removed.sort_unstable();

    for id in &removed {
        if let Some(document) = state.document_data.remove(id) {
            debug!(id, uri = %document.uri, "pruned document");
        }
    }

    for results in state
        .definition_data
        .values_mut()
        .chain(state.reference_data.values_mut())
    {
        for &id in &removed {
            results.remove(id);
        }
    }

    info!(
        removed = removed.len(),
        remaining = state.document_data.len(),
        "pruned documents"
    );
    Ok(removed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::state::DocumentData;
    use crate::datastructures::{IdSet, IdSetMap};
    use std::collections::HashMap;

    #[test]
    fn test_prune() {
        let mut state = State::new();
        for (id, uri) in [(1, "foo.go"), (2, "bar.go"), (3, "sub/baz.go"), (4, "sub/gen.go")] {
            state.document_data.insert(
                id,
                DocumentData {
                    uri: uri.to_string(),
                    ..Default::default()
                },
            );
        }
        let mut locations = IdSetMap::new();
        locations.union_into(1, &IdSet::from_ids([10]));
        locations.union_into(2, &IdSet::from_ids([20]));
        state.definition_data.insert(100, locations.clone());
        let mut only_removed = IdSetMap::new();
        only_removed.union_into(4, &IdSet::from_ids([40]));
        state.reference_data.insert(200, only_removed);

        let source = |dirs: &[String]| -> CorrelateResult<HashMap<String, Vec<String>>> {
            Ok(dirs
                .iter()
                .map(|dir| {
                    let children = match dir.as_str() {
                        "" => vec!["foo.go".to_string(), "sub".to_string()],
                        "sub" => vec!["sub/baz.go".to_string()],
                        _ => vec![],
                    };
                    (dir.clone(), children)
                })
                .collect())
        };

        let removed = prune(&mut state, "", &source).unwrap();

        assert_eq!(removed, 2);
        let mut remaining: Vec<_> = state.document_data.keys().copied().collect();
        remaining.sort_unstable();
        assert_eq!(remaining, vec![1, 3]);

        assert!(state.definition_data[&100].contains_key(1));
        assert!(!state.definition_data[&100].contains_key(2));
        // Outer result key survives even when emptied
        assert!(state.reference_data[&200].is_empty());
    }
}
