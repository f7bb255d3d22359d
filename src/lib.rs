pub mod config;
pub mod correlation;
pub mod datastructures;
pub mod grouping;
pub mod logging;
pub mod storage;

pub use config::Settings;
pub use correlation::{
    ChildrenSource, CorrelateError, CorrelateResult, CorrelationStats, State, WorkingTree,
    correlate,
};
pub use datastructures::{DisjointIdSet, Id, IdSet, IdSetMap};
pub use grouping::{GroupedBundleData, IdentifierFilter};
pub use storage::{BundlePersistence, StorageError};
