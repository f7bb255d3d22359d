//! Reshapes a canonical, pruned [`State`] into [`GroupedBundleData`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::bloom::create_filter;
use super::hash::hash_key;
use super::types::{
    BundleDiagnostic, BundleDocument, BundleMeta, BundleMoniker, BundlePackageInformation,
    BundleRange, DocumentIdRangeId, GroupedBundleData, Location, MonikerLocations, Package,
    PackageReference, ResultChunkData,
};
use crate::config::GroupingConfig;
use crate::correlation::error::{CorrelateError, CorrelateResult};
use crate::correlation::state::{DocumentData, ResultLinks, State};
use crate::datastructures::{Id, IdSet, IdSetMap};

/// Group the state into bundle parts that can be stored and read separately.
pub fn group_bundle_data(
    state: &State,
    dump_id: i64,
    config: &GroupingConfig,
) -> CorrelateResult<GroupedBundleData> {
    let num_result_chunks = num_result_chunks(
        state.definition_data.len() + state.reference_data.len(),
        config,
    );

    let documents = serialize_documents(state)?;
    let result_chunks = serialize_result_chunks(state, num_result_chunks)?;
    let definitions =
        gather_moniker_locations(state, &state.definition_data, |l| l.definition_result_id)?;
    let references =
        gather_moniker_locations(state, &state.reference_data, |l| l.reference_result_id)?;
    let packages = gather_packages(state, dump_id)?;
    let package_references =
        gather_package_references(state, dump_id, config.bloom_false_positive_rate)?;

    debug!(
        num_result_chunks,
        documents = documents.len(),
        definitions = definitions.len(),
        references = references.len(),
        packages = packages.len(),
        package_references = package_references.len(),
        "grouped bundle data"
    );

    Ok(GroupedBundleData {
        meta: BundleMeta { num_result_chunks },
        documents,
        result_chunks,
        definitions,
        references,
        packages,
        package_references,
    })
}

/// `floor(results / per_chunk)` clamped to `[1, max]`.
pub fn num_result_chunks(num_results: usize, config: &GroupingConfig) -> usize {
    let per_chunk = config.results_per_result_chunk.max(1);
    (num_results / per_chunk).clamp(1, config.max_num_result_chunks.max(1))
}

/// Whether a project-relative path escapes the project root.
fn is_external(uri: &str) -> bool {
    uri == ".." || uri.starts_with("../")
}

fn id_string(id: Id) -> String {
    if id == 0 { String::new() } else { id.to_string() }
}

fn lookup<'a, T>(map: &'a HashMap<Id, T>, id: Id, kind: &'static str) -> CorrelateResult<&'a T> {
    map.get(&id)
        .ok_or(CorrelateError::DanglingReference { kind, id })
}

fn serialize_documents(state: &State) -> CorrelateResult<BTreeMap<String, BundleDocument>> {
    let mut documents = BTreeMap::new();
    for document in state.document_data.values() {
        if is_external(&document.uri) {
            continue;
        }
        documents.insert(document.uri.clone(), serialize_document(state, document)?);
    }
    Ok(documents)
}

fn serialize_document(state: &State, document: &DocumentData) -> CorrelateResult<BundleDocument> {
    let mut output = BundleDocument::default();

    for range_id in document.contains.iter() {
        let range = lookup(&state.range_data, range_id, "range")?;
        let links = &range.links;

        output.ranges.insert(
            range_id.to_string(),
            BundleRange {
                start_line: range.start_line,
                start_character: range.start_character,
                end_line: range.end_line,
                end_character: range.end_character,
                definition_result_id: id_string(links.definition_result_id),
                reference_result_id: id_string(links.reference_result_id),
                hover_result_id: id_string(links.hover_result_id),
                moniker_ids: links.moniker_ids.to_sorted_vec().into_iter().map(id_string).collect(),
            },
        );

        if links.hover_result_id != 0 {
            let hover = lookup(&state.hover_data, links.hover_result_id, "hoverResult")?;
            output
                .hover_results
                .insert(links.hover_result_id.to_string(), hover.clone());
        }

        for moniker_id in links.moniker_ids.iter() {
            let moniker = lookup(&state.moniker_data, moniker_id, "moniker")?;
            output.monikers.insert(
                moniker_id.to_string(),
                BundleMoniker {
                    kind: moniker.kind,
                    scheme: moniker.scheme.clone(),
                    identifier: moniker.identifier.clone(),
                    package_information_id: id_string(moniker.package_information_id),
                },
            );

            if moniker.package_information_id != 0 {
                let info = lookup(
                    &state.package_information_data,
                    moniker.package_information_id,
                    "packageInformation",
                )?;
                output.package_information.insert(
                    moniker.package_information_id.to_string(),
                    BundlePackageInformation {
                        name: info.name.clone(),
                        version: info.version.clone(),
                    },
                );
            }
        }
    }

    for diagnostic_id in document.diagnostics.to_sorted_vec() {
        let diagnostics = lookup(&state.diagnostic_data, diagnostic_id, "diagnosticResult")?;
        output
            .diagnostics
            .extend(diagnostics.iter().map(|d| BundleDiagnostic {
                severity: d.severity,
                code: d.code.clone(),
                message: d.message.clone(),
                source: d.source.clone(),
                start_line: d.start_line,
                start_character: d.start_character,
                end_line: d.end_line,
                end_character: d.end_character,
            }));
    }

    Ok(output)
}

fn serialize_result_chunks(
    state: &State,
    num_result_chunks: usize,
) -> CorrelateResult<BTreeMap<usize, ResultChunkData>> {
    let mut chunks = vec![ResultChunkData::default(); num_result_chunks];

    for data in [&state.definition_data, &state.reference_data] {
        let mut ids: Vec<Id> = data.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            add_to_chunk(state, &mut chunks, id, &data[&id])?;
        }
    }

    Ok(chunks
        .into_iter()
        .enumerate()
        .filter(|(_, chunk)| !chunk.is_empty())
        .collect())
}

fn add_to_chunk(
    state: &State,
    chunks: &mut [ResultChunkData],
    id: Id,
    documents: &IdSetMap,
) -> CorrelateResult<()> {
    let key = id.to_string();
    let index = hash_key(&key, chunks.len());
    let chunk = &mut chunks[index];

    let mut pairs = Vec::new();
    for document_id in documents.sorted_keys() {
        let document = lookup(&state.document_data, document_id, "document")?;
        chunk
            .document_paths
            .insert(document_id.to_string(), document.uri.clone());

        if let Some(ranges) = documents.get(document_id) {
            pairs.extend(ranges.to_sorted_vec().into_iter().map(|range_id| DocumentIdRangeId {
                document_id: document_id.to_string(),
                range_id: range_id.to_string(),
            }));
        }
    }

    chunk.document_id_range_ids.insert(key, pairs);
    Ok(())
}

/// One record per distinct (scheme, identifier) attached to a result in
/// `data`, listing every location of every result sharing that moniker.
fn gather_moniker_locations(
    state: &State,
    data: &HashMap<Id, IdSetMap>,
    result_id: impl Fn(&ResultLinks) -> Id,
) -> CorrelateResult<Vec<MonikerLocations>> {
    let mut monikers = IdSetMap::new();
    for range in state.range_data.values() {
        let id = result_id(&range.links);
        if id != 0 && !range.links.moniker_ids.is_empty() {
            monikers.union_into(id, &range.links.moniker_ids);
        }
    }

    let mut ids_by_moniker: BTreeMap<(&str, &str), IdSet> = BTreeMap::new();
    for &id in data.keys() {
        let Some(moniker_ids) = monikers.get(id) else {
            continue;
        };
        for moniker_id in moniker_ids.iter() {
            let moniker = lookup(&state.moniker_data, moniker_id, "moniker")?;
            ids_by_moniker
                .entry((moniker.scheme.as_str(), moniker.identifier.as_str()))
                .or_default()
                .add(id);
        }
    }

    let mut records = Vec::new();
    for ((scheme, identifier), ids) in ids_by_moniker {
        let mut locations = BTreeSet::new();
        for id in ids.iter() {
            let Some(documents) = data.get(&id) else {
                continue;
            };
            for (&document_id, range_ids) in documents {
                let document = lookup(&state.document_data, document_id, "document")?;
                if is_external(&document.uri) {
                    continue;
                }
                for range_id in range_ids.iter() {
                    let range = lookup(&state.range_data, range_id, "range")?;
                    locations.insert(Location {
                        uri: document.uri.clone(),
                        start_line: range.start_line,
                        start_character: range.start_character,
                        end_line: range.end_line,
                        end_character: range.end_character,
                    });
                }
            }
        }

        if locations.is_empty() {
            continue;
        }
        records.push(MonikerLocations {
            scheme: scheme.to_string(),
            identifier: identifier.to_string(),
            locations: locations.into_iter().collect(),
        });
    }

    Ok(records)
}

/// Scheme, package name and version of a moniker with package information.
fn package_key(state: &State, moniker_id: Id) -> CorrelateResult<(String, String, String)> {
    let moniker = lookup(&state.moniker_data, moniker_id, "moniker")?;
    let info = lookup(
        &state.package_information_data,
        moniker.package_information_id,
        "packageInformation",
    )?;
    Ok((moniker.scheme.clone(), info.name.clone(), info.version.clone()))
}

fn gather_packages(state: &State, dump_id: i64) -> CorrelateResult<Vec<Package>> {
    let mut keys = BTreeSet::new();
    for moniker_id in state.exported_monikers.iter() {
        keys.insert(package_key(state, moniker_id)?);
    }

    Ok(keys
        .into_iter()
        .map(|(scheme, name, version)| Package {
            dump_id,
            scheme,
            name,
            version,
        })
        .collect())
}

fn gather_package_references(
    state: &State,
    dump_id: i64,
    false_positive_rate: f64,
) -> CorrelateResult<Vec<PackageReference>> {
    let mut identifiers_by_key: BTreeMap<(String, String, String), BTreeSet<String>> =
        BTreeMap::new();
    for moniker_id in state.imported_monikers.iter() {
        let key = package_key(state, moniker_id)?;
        let identifier = lookup(&state.moniker_data, moniker_id, "moniker")?
            .identifier
            .clone();
        identifiers_by_key.entry(key).or_default().insert(identifier);
    }

    let mut references = Vec::with_capacity(identifiers_by_key.len());
    for ((scheme, name, version), identifiers) in identifiers_by_key {
        let identifiers: Vec<String> = identifiers.into_iter().collect();
        let filter = create_filter(&identifiers, false_positive_rate)?;
        references.push(PackageReference {
            dump_id,
            scheme,
            name,
            version,
            filter,
        });
    }

    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GroupingConfig {
        GroupingConfig::default()
    }

    #[test]
    fn test_num_result_chunks() {
        let config = config();
        assert_eq!(num_result_chunks(0, &config), 1);
        assert_eq!(num_result_chunks(499, &config), 1);
        assert_eq!(num_result_chunks(1_000, &config), 2);
        assert_eq!(num_result_chunks(1_499, &config), 2);
        assert_eq!(num_result_chunks(10_000_000, &config), 1000);
    }

    #[test]
    fn test_is_external() {
        assert!(is_external(".."));
        assert!(is_external("../vendor/lib.go"));
        assert!(!is_external("..hidden.go"));
        assert!(!is_external("src/..gen.go"));
        assert!(!is_external("main.go"));
    }

    #[test]
    fn test_dotted_file_name_is_kept() {
        let mut state = State::new();
        for (id, uri) in [(1, "..hidden.go"), (2, "../outside.go")] {
            state.document_data.insert(
                id,
                DocumentData {
                    uri: uri.to_string(),
                    ..Default::default()
                },
            );
        }

        let bundle = group_bundle_data(&state, 1, &config()).unwrap();
        let paths: Vec<_> = bundle.documents.keys().cloned().collect();
        assert_eq!(paths, vec!["..hidden.go"]);
    }

    #[test]
    fn test_id_string() {
        assert_eq!(id_string(0), "");
        assert_eq!(id_string(42), "42");
    }

    #[test]
    fn test_dangling_reference_is_reported() {
        let mut state = State::new();
        state.document_data.insert(
            1,
            DocumentData {
                uri: "a.go".to_string(),
                contains: IdSet::from_ids([99]),
                ..Default::default()
            },
        );

        let err = group_bundle_data(&state, 1, &config()).unwrap_err();
        assert!(matches!(
            err,
            CorrelateError::DanglingReference { kind: "range", id: 99 }
        ));
    }
}
