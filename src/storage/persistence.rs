//! File persistence for grouped bundles.
//!
//! Writes the bundle as a single JSON document plus a small metadata file.
//! This is the collaborator the CLI hands correlated bundles to; services
//! embedding the library are expected to bring their own store.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::error::{StorageError, StorageResult};
use super::metadata::BundleMetadata;
use crate::correlation::CorrelationStats;
use crate::grouping::GroupedBundleData;

const BUNDLE_FILE: &str = "bundle.json";

/// Manages the persisted bundle of one dump
#[derive(Debug)]
pub struct BundlePersistence {
    base_path: PathBuf,
}

impl BundlePersistence {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write the bundle and its metadata, replacing any previous bundle
    #[must_use = "Save errors should be handled to ensure data is persisted"]
    pub fn save(
        &self,
        dump_id: i64,
        bundle: &GroupedBundleData,
        stats: &CorrelationStats,
    ) -> StorageResult<BundleMetadata> {
        fs::create_dir_all(&self.base_path).map_err(|source| StorageError::Io {
            path: self.base_path.clone(),
            source,
        })?;

        let bundle_path = self.base_path.join(BUNDLE_FILE);
        let file = fs::File::create(&bundle_path).map_err(|source| StorageError::Io {
            path: bundle_path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, bundle)?;
        writer.flush().map_err(|source| StorageError::Io {
            path: bundle_path.clone(),
            source,
        })?;

        let metadata = BundleMetadata::new(dump_id, bundle, stats);
        metadata.save(&self.base_path)?;

        info!(
            path = %bundle_path.display(),
            documents = metadata.document_count,
            "saved bundle"
        );
        Ok(metadata)
    }

    /// Read a previously saved bundle
    #[must_use = "Load errors should be handled appropriately"]
    pub fn load(&self) -> StorageResult<GroupedBundleData> {
        let bundle_path = self.base_path.join(BUNDLE_FILE);
        if !bundle_path.exists() {
            return Err(StorageError::NotFound(self.base_path.clone()));
        }

        let file = fs::File::open(&bundle_path).map_err(|source| StorageError::Io {
            path: bundle_path,
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Check if a bundle exists
    pub fn exists(&self) -> bool {
        self.base_path.join(BUNDLE_FILE).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{BundleDocument, BundleMeta};
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = BundlePersistence::new(temp_dir.path().join("dump-3"));
        assert!(!persistence.exists());

        let mut bundle = GroupedBundleData {
            meta: BundleMeta {
                num_result_chunks: 1,
            },
            ..Default::default()
        };
        bundle
            .documents
            .insert("main.go".to_string(), BundleDocument::default());

        let stats = CorrelationStats {
            pruned_documents: 2,
            ..Default::default()
        };
        let metadata = persistence.save(3, &bundle, &stats).unwrap();
        assert_eq!(metadata.document_count, 1);
        assert_eq!(metadata.pruned_documents, 2);

        assert!(persistence.exists());
        assert_eq!(persistence.load().unwrap(), bundle);
        assert_eq!(BundleMetadata::load(persistence.base_path()).unwrap(), metadata);
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = BundlePersistence::new(temp_dir.path().to_path_buf());
        assert!(matches!(persistence.load(), Err(StorageError::NotFound(_))));
    }
}
