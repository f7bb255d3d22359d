//! Shape of a correlated bundle, as handed to persistence.
//!
//! Identifiers are rendered as opaque strings; the empty string means absent.
//! Every map is ordered so that serializing the same bundle twice yields the
//! same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::correlation::element::MonikerKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedBundleData {
    pub meta: BundleMeta,
    /// Keyed by document path, relative to the project root.
    pub documents: BTreeMap<String, BundleDocument>,
    /// Sparse: only non-empty buckets are present.
    pub result_chunks: BTreeMap<usize, ResultChunkData>,
    pub definitions: Vec<MonikerLocations>,
    pub references: Vec<MonikerLocations>,
    pub packages: Vec<Package>,
    pub package_references: Vec<PackageReference>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMeta {
    pub num_result_chunks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleDocument {
    pub ranges: BTreeMap<String, BundleRange>,
    pub hover_results: BTreeMap<String, String>,
    pub monikers: BTreeMap<String, BundleMoniker>,
    pub package_information: BTreeMap<String, BundlePackageInformation>,
    pub diagnostics: Vec<BundleDiagnostic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleRange {
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
    pub definition_result_id: String,
    pub reference_result_id: String,
    pub hover_result_id: String,
    pub moniker_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMoniker {
    pub kind: MonikerKind,
    pub scheme: String,
    pub identifier: String,
    pub package_information_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlePackageInformation {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDiagnostic {
    pub severity: i32,
    pub code: String,
    pub message: String,
    pub source: String,
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultChunkData {
    /// Document id → document path.
    pub document_paths: BTreeMap<String, String>,
    /// Result id → every (document, range) pair of that result.
    pub document_id_range_ids: BTreeMap<String, Vec<DocumentIdRangeId>>,
}

impl ResultChunkData {
    pub fn is_empty(&self) -> bool {
        self.document_paths.is_empty() && self.document_id_range_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdRangeId {
    pub document_id: String,
    pub range_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonikerLocations {
    pub scheme: String,
    pub identifier: String,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub dump_id: i64,
    pub scheme: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReference {
    pub dump_id: i64,
    pub scheme: String,
    pub name: String,
    pub version: String,
    /// Serialized bloom filter over the referenced identifiers.
    pub filter: Vec<u8>,
}
