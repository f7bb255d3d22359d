pub mod error;
pub mod metadata;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use metadata::BundleMetadata;
pub use persistence::BundlePersistence;
