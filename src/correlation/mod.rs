//! Turns a raw LSIF dump into grouped bundle data.
//!
//! The pipeline is strictly linear and single-owner:
//! ingest → canonicalize (documents, reference results, result sets, ranges)
//! → prune → group.

pub mod canonicalize;
pub mod element;
pub mod error;
pub mod existence;
pub mod fs_tree;
pub mod ingest;
pub mod prune;
pub mod state;

use std::io::BufRead;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::config::{CorrelationConfig, GroupingConfig};
use crate::grouping::{GroupedBundleData, group_bundle_data};

pub use canonicalize::canonicalize;
pub use error::{CorrelateError, CorrelateResult};
pub use existence::{ChildrenSource, ExistenceChecker};
pub use fs_tree::WorkingTree;
pub use ingest::{Ingester, ingest};
pub use prune::prune;
pub use state::{State, StateCounts};

/// Summary of one correlation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorrelationStats {
    pub ingested: StateCounts,
    pub canonical: StateCounts,
    pub pruned_documents: usize,
    pub result_chunks: usize,
    pub elapsed_ms: u64,
}

/// Correlate one dump end to end.
pub fn correlate<R: BufRead>(
    reader: R,
    correlation: &CorrelationConfig,
    grouping: &GroupingConfig,
    source: &dyn ChildrenSource,
) -> CorrelateResult<(GroupedBundleData, CorrelationStats)> {
    let started = Instant::now();

    let mut state = ingest(reader)?;
    let ingested = state.counts();

    canonicalize(&mut state);
    let canonical = state.counts();

    let pruned_documents = if correlation.prune {
        prune(&mut state, &correlation.root, source)?
    } else {
        0
    };

    let bundle = group_bundle_data(&state, correlation.dump_id, grouping)?;

    let stats = CorrelationStats {
        ingested,
        canonical,
        pruned_documents,
        result_chunks: bundle.result_chunks.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        documents = bundle.documents.len(),
        result_chunks = stats.result_chunks,
        pruned = pruned_documents,
        elapsed_ms = stats.elapsed_ms,
        "correlated dump {}",
        correlation.dump_id
    );

    Ok((bundle, stats))
}
