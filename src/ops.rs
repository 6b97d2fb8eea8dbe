//! Split and merge operations
//!
//! Each operation runs to completion or fails without leaving output
//! behind. The CLI maps one subcommand to each function here.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::raid::StripeCodec;
use crate::store::ShardStore;

/// Outcome of a successful split
#[derive(Debug, Clone)]
pub struct SplitReport {
    /// Length of the source file
    pub original_len: usize,
    /// Padded payload length of every shard
    pub block_size: usize,
    /// Written shard files in index order
    pub shard_paths: Vec<PathBuf>,
}

/// Outcome of a successful merge
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Where the merged file was written
    pub restored_path: PathBuf,
    /// Length of the merged file
    pub original_len: usize,
    /// Index of the shard that was absent, if any
    pub missing: Option<usize>,
}

/// Split `source` into `disks` shard files next to it
///
/// # Errors
/// * `InvalidArgument` if `disks < 2` or the source does not exist
/// * `Io` if reading the source or writing a shard fails
pub fn split(source: &Path, disks: usize, config: &Config) -> Result<SplitReport> {
    let codec = StripeCodec::new(disks)?;
    let data = read_source(source)?;

    let stripe = codec.encode(&data)?;
    let store = ShardStore::new(&config.store);
    let shard_paths = store.write_shards(source, &stripe.shards)?;

    info!(
        "Split {} ({} bytes) into {} shards of {} bytes",
        source.display(),
        data.len(),
        shard_paths.len(),
        stripe.block_size()
    );

    Ok(SplitReport {
        original_len: data.len(),
        block_size: stripe.block_size(),
        shard_paths,
    })
}

/// Rebuild `source` from its `disks` shard files into `res__<name>`
///
/// Succeeds when at most one shard file is absent.
///
/// # Errors
/// * `InvalidArgument` if `disks < 2` or `source` has no file name
/// * `MissingShards` if two or more shard files are absent
/// * `CorruptShard` if the present shards are inconsistent
/// * `Io` if the merged file cannot be written
pub fn merge(source: &Path, disks: usize, config: &Config) -> Result<MergeReport> {
    let codec = StripeCodec::new(disks)?.with_parity_check(config.codec.verify_parity);
    let store = ShardStore::new(&config.store);

    let restored_path = ShardStore::restored_path(source)?;
    info!("Restoring the file to {}", restored_path.display());

    let set = store.locate(source, disks)?;
    let missing = set.missing().first().copied();
    let data = codec.reconstruct(set)?;

    let restored_path = store.write_restored(source, &data)?;
    info!(
        "Restored {} bytes from {} of {} shards",
        data.len(),
        disks - usize::from(missing.is_some()),
        disks
    );

    Ok(MergeReport {
        restored_path,
        original_len: data.len(),
        missing,
    })
}

fn read_source(source: &Path) -> Result<Vec<u8>> {
    std::fs::read(source).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::InvalidArgument(format!(
            "source file {} not found",
            source.display()
        )),
        _ => Error::Io(e),
    })
}
