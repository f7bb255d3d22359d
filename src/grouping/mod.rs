pub mod bloom;
pub mod group;
pub mod hash;
pub mod types;

pub use bloom::{IdentifierFilter, create_filter};
pub use group::{group_bundle_data, num_result_chunks};
pub use hash::hash_key;
pub use types::*;
