//! ragdb-vector
//!
//! Vector indexes behind the [`VectorIndex`] contract: the exact
//! [`FlatIndex`] baseline and the partitioned [`IvfIndex`]. Also hosts the
//! JSON Lines snapshot format and the embedding cache.

use ragdb_core::config::{IndexKind, IngestSettings};
use ragdb_core::traits::VectorIndex;

pub mod cache;
pub mod flat;
pub mod ivf;
pub mod math;
pub mod persist;

pub use cache::{hash_content, EmbeddingCache};
pub use flat::FlatIndex;
pub use ivf::{compute_nlist, IvfIndex, IvfParams};
pub use persist::{read_records, write_records, PersistedRecord};

/// Fresh, empty index of the configured kind.
pub fn new_index(settings: &IngestSettings) -> Box<dyn VectorIndex> {
    match settings.index_kind {
        IndexKind::Flat => Box::new(FlatIndex::new()),
        IndexKind::Ivf => Box::new(IvfIndex::new(IvfParams { max_nlist: settings.nlist, nprobe: settings.nprobe })),
    }
}
