//! Builds a [`State`] from a stream of LSIF elements.
//!
//! Vertices populate the state maps; edges mutate the vertices they connect.
//! Every id an edge mentions must already be known. A malformed or dangling
//! element aborts ingestion: later passes assume a complete graph.

use std::collections::HashMap;
use std::io::BufRead;

use tracing::{debug, info};

use super::element::{
    DiagnosticResultPayload, DocumentPayload, EdgePayload, ElementKind, HoverResultPayload,
    MetaDataPayload, MonikerKind, MonikerPayload, PackageInformationPayload, RangePayload,
    RawElement, relative_uri,
};
use super::error::{CorrelateError, CorrelateResult};
use super::state::{
    DiagnosticData, DocumentData, MonikerData, PackageInformationData, RangeData, ResultLinks,
    State,
};
use crate::datastructures::{Id, IdSet};

/// Read an entire dump, one JSON element per line.
pub fn ingest<R: BufRead>(reader: R) -> CorrelateResult<State> {
    let mut ingester = Ingester::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        ingester.process(index + 1, &line)?;
    }

    ingester.finish()
}

/// Incremental ingestion state.
#[derive(Debug, Default)]
pub struct Ingester {
    state: State,
    has_metadata: bool,
    vertices: usize,
    edges: usize,
    skipped: HashMap<String, usize>,
    /// Ids of vertices with labels we do not model (`project`, `$event`, ...).
    opaque_vertices: IdSet,
}

impl Ingester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one line of input. `line` is 1-based and used in errors.
    pub fn process(&mut self, line: usize, text: &str) -> CorrelateResult<()> {
        let element = RawElement::parse(line, text)?;
        match element.element_kind(line)? {
            ElementKind::Vertex => {
                self.vertices += 1;
                self.vertex(line, element)
            }
            ElementKind::Edge => {
                self.edges += 1;
                self.edge(line, element)
            }
        }
    }

    /// Validate what can only be checked once the stream has ended.
    pub fn finish(self) -> CorrelateResult<State> {
        ensure_acyclic_next(&self.state.next_data)?;

        for (label, count) in &self.skipped {
            debug!("skipped {count} elements labeled {label}");
        }
        let counts = self.state.counts();
        info!(
            vertices = self.vertices,
            edges = self.edges,
            documents = counts.documents,
            ranges = counts.ranges,
            result_sets = counts.result_sets,
            "ingested dump"
        );

        Ok(self.state)
    }

    fn skip(&mut self, label: &str) {
        *self.skipped.entry(label.to_string()).or_default() += 1;
    }

    fn vertex(&mut self, line: usize, element: RawElement) -> CorrelateResult<()> {
        let id = element.id.resolve(line)?;
        let label = element.label.clone();

        match label.as_str() {
            "metaData" => {
                let payload: MetaDataPayload = element.decode(line)?;
                self.state.lsif_version = payload.version;
                self.state.project_root = payload.project_root;
                self.has_metadata = true;
            }
            "document" => {
                if !self.has_metadata {
                    return Err(CorrelateError::MissingMetaData { line });
                }
                let payload: DocumentPayload = element.decode(line)?;
                let uri = relative_uri(&self.state.project_root, &payload.uri);
                self.state.document_data.insert(
                    id,
                    DocumentData {
                        uri,
                        ..Default::default()
                    },
                );
            }
            "range" => {
                let payload: RangePayload = element.decode(line)?;
                self.state.range_data.insert(
                    id,
                    RangeData {
                        start_line: payload.start.line,
                        start_character: payload.start.character,
                        end_line: payload.end.line,
                        end_character: payload.end.character,
                        links: ResultLinks::default(),
                    },
                );
            }
            "resultSet" => {
                self.state.result_set_data.insert(id, ResultLinks::default());
            }
            "definitionResult" => {
                self.state.definition_data.insert(id, Default::default());
            }
            "referenceResult" => {
                self.state.reference_data.insert(id, Default::default());
            }
            "hoverResult" => {
                let payload: HoverResultPayload = element.decode(line)?;
                self.state
                    .hover_data
                    .insert(id, payload.result.contents.render());
            }
            "moniker" => {
                let payload: MonikerPayload = element.decode(line)?;
                self.state.moniker_data.insert(
                    id,
                    MonikerData {
                        kind: payload.kind,
                        scheme: payload.scheme,
                        identifier: payload.identifier,
                        package_information_id: 0,
                    },
                );
            }
            "packageInformation" => {
                let payload: PackageInformationPayload = element.decode(line)?;
                self.state.package_information_data.insert(
                    id,
                    PackageInformationData {
                        name: payload.name,
                        version: payload.version,
                    },
                );
            }
            "diagnosticResult" => {
                let payload: DiagnosticResultPayload = element.decode(line)?;
                let diagnostics = payload
                    .result
                    .into_iter()
                    .map(|d| DiagnosticData {
                        severity: d.severity,
                        code: d.code.map(|c| c.render()).unwrap_or_default(),
                        message: d.message,
                        source: d.source,
                        start_line: d.range.start.line,
                        start_character: d.range.start.character,
                        end_line: d.range.end.line,
                        end_character: d.range.end.character,
                    })
                    .collect();
                self.state.diagnostic_data.insert(id, diagnostics);
            }
            _ => {
                self.opaque_vertices.add(id);
                self.skip(&label);
            }
        }

        Ok(())
    }

    fn edge(&mut self, line: usize, element: RawElement) -> CorrelateResult<()> {
        // Edge ids are validated but otherwise unused
        element.id.resolve(line)?;
        let label = element.label.clone();

        match label.as_str() {
            "contains" => self.contains_edge(line, element.decode(line)?),
            "item" => self.item_edge(line, element.decode(line)?),
            "next" => self.next_edge(line, element.decode(line)?),
            "textDocument/definition" => {
                let edge: EdgePayload = element.decode(line)?;
                let target = edge.in_v(line, &label)?;
                self.require(line, target, "definitionResult", |s| {
                    s.definition_data.contains_key(&target)
                })?;
                result_links_mut(&mut self.state, line, edge.out_v(line)?)?.definition_result_id =
                    target;
                Ok(())
            }
            "textDocument/references" => {
                let edge: EdgePayload = element.decode(line)?;
                let target = edge.in_v(line, &label)?;
                self.require(line, target, "referenceResult", |s| {
                    s.reference_data.contains_key(&target)
                })?;
                result_links_mut(&mut self.state, line, edge.out_v(line)?)?.reference_result_id =
                    target;
                Ok(())
            }
            "textDocument/hover" => {
                let edge: EdgePayload = element.decode(line)?;
                let target = edge.in_v(line, &label)?;
                self.require(line, target, "hoverResult", |s| {
                    s.hover_data.contains_key(&target)
                })?;
                result_links_mut(&mut self.state, line, edge.out_v(line)?)?.hover_result_id =
                    target;
                Ok(())
            }
            "moniker" => {
                let edge: EdgePayload = element.decode(line)?;
                let target = edge.in_v(line, &label)?;
                self.require(line, target, "moniker", |s| {
                    s.moniker_data.contains_key(&target)
                })?;
                result_links_mut(&mut self.state, line, edge.out_v(line)?)?
                    .moniker_ids
                    .add(target);
                Ok(())
            }
            "nextMoniker" => {
                let edge: EdgePayload = element.decode(line)?;
                let source = edge.out_v(line)?;
                let target = edge.in_v(line, &label)?;
                for id in [source, target] {
                    self.require(line, id, "moniker", |s| s.moniker_data.contains_key(&id))?;
                }
                self.state.linked_monikers.union(source, target);
                Ok(())
            }
            "packageInformation" => self.package_information_edge(line, element.decode(line)?),
            "textDocument/diagnostic" => {
                let edge: EdgePayload = element.decode(line)?;
                let source = edge.out_v(line)?;
                let target = edge.in_v(line, &label)?;
                self.require(line, target, "diagnosticResult", |s| {
                    s.diagnostic_data.contains_key(&target)
                })?;
                document_mut(&mut self.state, line, source)?
                    .diagnostics
                    .add(target);
                Ok(())
            }
            _ => {
                self.skip(&label);
                Ok(())
            }
        }
    }

    fn contains_edge(&mut self, line: usize, edge: EdgePayload) -> CorrelateResult<()> {
        let source = edge.out_v(line)?;
        let targets = edge.targets(line)?;

        // Project → document containment carries nothing we keep
        if self.opaque_vertices.contains(source) {
            self.skip("contains(non-document)");
            return Ok(());
        }
        self.require(line, source, "document", |s| {
            s.document_data.contains_key(&source)
        })?;

        for &target in &targets {
            self.require(line, target, "range", |s| s.range_data.contains_key(&target))?;
        }
        document_mut(&mut self.state, line, source)?
            .contains
            .extend(targets);
        Ok(())
    }

    fn item_edge(&mut self, line: usize, edge: EdgePayload) -> CorrelateResult<()> {
        let source = edge.out_v(line)?;
        let targets = edge.targets(line)?;
        let document = self.item_document(line, &edge)?;

        if self.state.reference_data.contains_key(&source) {
            let mut ranges = Vec::with_capacity(targets.len());
            for target in targets {
                if self.state.reference_data.contains_key(&target) {
                    self.state.linked_reference_results.union(source, target);
                } else {
                    self.require(line, target, "range", |s| s.range_data.contains_key(&target))?;
                    ranges.push(target);
                }
            }
            if !ranges.is_empty() {
                if let Some(results) = self.state.reference_data.get_mut(&source) {
                    results.get_or_create(document).extend(ranges);
                }
            }
            return Ok(());
        }

        if self.state.definition_data.contains_key(&source) {
            for &target in &targets {
                self.require(line, target, "range", |s| s.range_data.contains_key(&target))?;
            }
            if let Some(results) = self.state.definition_data.get_mut(&source) {
                results.get_or_create(document).extend(targets);
            }
            return Ok(());
        }

        Err(CorrelateError::UnknownReference {
            line,
            id: source,
            expected: "definitionResult or referenceResult",
        })
    }

    fn item_document(&self, line: usize, edge: &EdgePayload) -> CorrelateResult<Id> {
        let document = edge.document(line, "item")?;
        self.require(line, document, "document", |s| {
            s.document_data.contains_key(&document)
        })?;
        Ok(document)
    }

    fn next_edge(&mut self, line: usize, edge: EdgePayload) -> CorrelateResult<()> {
        let source = edge.out_v(line)?;
        let target = edge.in_v(line, "next")?;

        self.require(line, source, "range or resultSet", |s| {
            s.range_data.contains_key(&source) || s.result_set_data.contains_key(&source)
        })?;
        self.require(line, target, "resultSet", |s| {
            s.result_set_data.contains_key(&target)
        })?;

        self.state.next_data.insert(source, target);
        Ok(())
    }

    fn package_information_edge(&mut self, line: usize, edge: EdgePayload) -> CorrelateResult<()> {
        let source = edge.out_v(line)?;
        let target = edge.in_v(line, "packageInformation")?;

        self.require(line, target, "packageInformation", |s| {
            s.package_information_data.contains_key(&target)
        })?;
        let moniker = self.state.moniker_data.get_mut(&source).ok_or(
            CorrelateError::UnknownReference {
                line,
                id: source,
                expected: "moniker",
            },
        )?;
        moniker.package_information_id = target;

        match moniker.kind {
            MonikerKind::Import => {
                self.state.imported_monikers.add(source);
            }
            MonikerKind::Export => {
                self.state.exported_monikers.add(source);
            }
            MonikerKind::Local => {}
        }
        Ok(())
    }

    fn require(
        &self,
        line: usize,
        id: Id,
        expected: &'static str,
        exists: impl Fn(&State) -> bool,
    ) -> CorrelateResult<()> {
        if exists(&self.state) {
            Ok(())
        } else {
            Err(CorrelateError::UnknownReference { line, id, expected })
        }
    }
}

fn result_links_mut(state: &mut State, line: usize, id: Id) -> CorrelateResult<&mut ResultLinks> {
    if let Some(range) = state.range_data.get_mut(&id) {
        return Ok(&mut range.links);
    }
    state
        .result_set_data
        .get_mut(&id)
        .ok_or(CorrelateError::UnknownReference {
            line,
            id,
            expected: "range or resultSet",
        })
}

fn document_mut(state: &mut State, line: usize, id: Id) -> CorrelateResult<&mut DocumentData> {
    state
        .document_data
        .get_mut(&id)
        .ok_or(CorrelateError::UnknownReference {
            line,
            id,
            expected: "document",
        })
}

/// Reject next chains that loop back on themselves.
fn ensure_acyclic_next(next_data: &HashMap<Id, Id>) -> CorrelateResult<()> {
    let mut acyclic = IdSet::new();

    for &start in next_data.keys() {
        let mut path = IdSet::new();
        let mut current = start;

        while let Some(&next) = next_data.get(&current) {
            if acyclic.contains(current) {
                break;
            }
            if !path.add(current) {
                return Err(CorrelateError::NextCycle { id: current });
            }
            current = next;
        }

        acyclic.union(&path);
    }

    Ok(())
}
