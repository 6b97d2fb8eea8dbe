//! File-backed shard storage
//!
//! Shard `i` of `<dir>/<name>` lives at `<dir>/<name>_<i>`; a merged file
//! is written to `<dir>/res__<name>`. Both names are part of the external
//! contract and must not change.
//!
//! Writes are atomic: each file is written to a `.tmp` sibling first and
//! renamed into place, so a failed run never leaves a half-written shard
//! or restored file behind.

use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::raid::geometry::validate_disks;
use crate::shard::{Shard, ShardSet};

/// File name prefix of a merged file
pub const RESTORED_PREFIX: &str = "res__";

/// Reads and writes the shard files of a source path
#[derive(Debug, Clone, Default)]
pub struct ShardStore {
    sync_writes: bool,
}

impl ShardStore {
    /// Create a store with the given configuration
    pub fn new(config: &StoreConfig) -> Self {
        ShardStore {
            sync_writes: config.sync_writes,
        }
    }

    /// Path of shard `index` for `source`: the source path with `_<index>` appended
    pub fn shard_path(source: &Path, index: usize) -> PathBuf {
        let mut path = OsString::from(source.as_os_str());
        path.push(format!("_{}", index));
        PathBuf::from(path)
    }

    /// Path the merged file is written to: `res__<basename>` next to the source
    pub fn restored_path(source: &Path) -> Result<PathBuf> {
        let name = source.file_name().ok_or_else(|| {
            Error::InvalidArgument(format!("{} has no file name", source.display()))
        })?;

        let mut restored = OsString::from(RESTORED_PREFIX);
        restored.push(name);
        Ok(source.with_file_name(restored))
    }

    /// Write every shard of a stripe next to `source`
    ///
    /// All shards are staged as temporary files first and only renamed once
    /// every write succeeded. On failure the staged files are removed.
    ///
    /// # Returns
    /// Final shard paths in index order
    pub fn write_shards(&self, source: &Path, shards: &[Shard]) -> Result<Vec<PathBuf>> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(shards.len());

        if let Err(e) = self.stage_shards(source, shards, &mut staged) {
            discard(staged.iter().map(|(tmp, _)| tmp));
            return Err(e);
        }

        for (position, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = std::fs::rename(tmp, path) {
                discard(staged[position..].iter().map(|(tmp, _)| tmp));
                return Err(e.into());
            }
        }

        Ok(staged.into_iter().map(|(_, path)| path).collect())
    }

    fn stage_shards(
        &self,
        source: &Path,
        shards: &[Shard],
        staged: &mut Vec<(PathBuf, PathBuf)>,
    ) -> Result<()> {
        for shard in shards {
            let path = Self::shard_path(source, shard.index());
            let tmp = tmp_path(&path);
            // Record before writing so a partial temp file is cleaned up too
            staged.push((tmp.clone(), path));

            let bytes = shard.to_bytes()?;
            self.write_file(&tmp, &bytes)?;
            debug!(
                "Staged shard {} ({} bytes) at {}",
                shard.index(),
                bytes.len(),
                tmp.display()
            );
        }
        Ok(())
    }

    /// Load every expected shard of `source`
    ///
    /// A shard is absent when its file cannot be opened or read, or does
    /// not parse as a valid shard. Absence is not an error here; the codec
    /// decides whether the remaining shards are enough.
    pub fn locate(&self, source: &Path, disks: usize) -> Result<ShardSet> {
        validate_disks(disks)?;
        let mut set = ShardSet::with_disks(disks);

        for index in 0..disks {
            let path = Self::shard_path(source, index);
            if let Some(shard) = Self::read_shard(&path)? {
                set.insert(index, shard)?;
            }
        }

        debug!(
            "Located {} of {} shards for {}",
            disks - set.missing().len(),
            disks,
            source.display()
        );
        Ok(set)
    }

    /// Read one shard file; `None` if it is unavailable
    pub fn read_shard(path: &Path) -> Result<Option<Shard>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot open {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        match Shard::from_bytes(&bytes) {
            Ok(shard) => Ok(Some(shard)),
            Err(e) if e.is_shard_local() => {
                warn!("Ignoring unreadable shard {}: {}", path.display(), e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Atomically write the merged file for `source`
    pub fn write_restored(&self, source: &Path, data: &[u8]) -> Result<PathBuf> {
        let path = Self::restored_path(source)?;
        let tmp = tmp_path(&path);

        let written = self
            .write_file(&tmp, data)
            .and_then(|_| std::fs::rename(&tmp, &path).map_err(Error::from));
        if let Err(e) = written {
            discard([&tmp]);
            return Err(e);
        }

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        if self.sync_writes {
            file.sync_all()?;
        }
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Best-effort removal of temporary files after a failure
fn discard<'a, I>(paths: I)
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}
