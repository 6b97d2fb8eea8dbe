//! raiden - split a file across N disks and merge it back
//!
//! `split` writes N-1 data shards and one XOR parity shard next to the
//! source file. `merge` rebuilds the source byte-for-byte from those
//! shards, tolerating any single missing shard file.

pub mod config;
pub mod error;
pub mod ops;
pub mod raid;
pub mod shard;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use ops::{merge, split, MergeReport, SplitReport};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::raid::{Geometry, StripeCodec};
    pub use crate::shard::{Shard, ShardSet};
    pub use crate::store::ShardStore;
}
