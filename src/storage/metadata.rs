//! Metadata written next to a persisted bundle

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::error::{StorageError, StorageResult};
use crate::correlation::CorrelationStats;
use crate::grouping::GroupedBundleData;

const METADATA_FILE: &str = "bundle.meta";

/// Current bundle layout version
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Summary of a persisted bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// Version of the bundle layout
    pub version: u32,

    pub dump_id: i64,

    pub document_count: usize,

    pub num_result_chunks: usize,

    pub package_count: usize,

    pub package_reference_count: usize,

    /// Documents dropped because they are missing from the repository
    pub pruned_documents: usize,

    /// Seconds since the Unix epoch, UTC
    pub created_at: i64,
}

impl BundleMetadata {
    pub fn new(dump_id: i64, bundle: &GroupedBundleData, stats: &CorrelationStats) -> Self {
        Self {
            version: BUNDLE_FORMAT_VERSION,
            dump_id,
            document_count: bundle.documents.len(),
            num_result_chunks: bundle.meta.num_result_chunks,
            package_count: bundle.packages.len(),
            package_reference_count: bundle.package_references.len(),
            pruned_documents: stats.pruned_documents,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Save metadata into `base_path`
    pub fn save(&self, base_path: &Path) -> StorageResult<()> {
        let metadata_path = base_path.join(METADATA_FILE);
        let json = serde_json::to_string_pretty(self)?;

        fs::write(&metadata_path, json).map_err(|source| StorageError::Io {
            path: metadata_path,
            source,
        })
    }

    /// Load metadata from `base_path`
    pub fn load(base_path: &Path) -> StorageResult<Self> {
        let metadata_path = base_path.join(METADATA_FILE);

        if !metadata_path.exists() {
            return Err(StorageError::NotFound(base_path.to_path_buf()));
        }

        let json = fs::read_to_string(&metadata_path).map_err(|source| StorageError::Io {
            path: metadata_path.clone(),
            source,
        })?;

        Ok(serde_json::from_str(&json)?)
    }
}
