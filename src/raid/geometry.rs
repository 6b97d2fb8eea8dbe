//! Shard set geometry
//!
//! Derives the block size and every shard's true payload length from the
//! disk count and the original file length.

use std::ops::Range;

use crate::error::{Error, Result};

/// Smallest disk count with a data shard and a parity shard
pub const MIN_DISKS: usize = 2;

/// Layout of one shard set
///
/// Indices `0..disks-1` are data shards holding consecutive blocks of the
/// source; index `disks-1` is the parity shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    disks: usize,
    original_len: usize,
}

impl Geometry {
    /// Create the geometry for `original_len` bytes spread over `disks` disks
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `disks < 2`
    pub fn new(disks: usize, original_len: usize) -> Result<Self> {
        validate_disks(disks)?;
        Ok(Geometry {
            disks,
            original_len,
        })
    }

    /// Geometry from the fixed-width fields of a shard header
    pub fn from_header(disks: u32, original_len: u64) -> Result<Self> {
        let original_len = usize::try_from(original_len).map_err(|_| {
            Error::Format(format!(
                "original length {} does not fit in memory",
                original_len
            ))
        })?;
        Self::new(disks as usize, original_len)
    }

    /// Total number of shards (N)
    pub fn disks(&self) -> usize {
        self.disks
    }

    /// Number of data shards (N - 1)
    pub fn data_shards(&self) -> usize {
        self.disks - 1
    }

    /// Index of the parity shard (always the last one)
    pub fn parity_index(&self) -> usize {
        self.disks - 1
    }

    pub fn is_parity(&self, index: usize) -> bool {
        index == self.parity_index()
    }

    /// Length of the source stream
    pub fn original_len(&self) -> usize {
        self.original_len
    }

    /// Common padded length of every shard payload: `ceil(L / (N - 1))`
    pub fn block_size(&self) -> usize {
        self.original_len.div_ceil(self.data_shards())
    }

    /// Byte range of the source held by data shard `index`
    ///
    /// Blocks past the end of the source are empty ranges.
    pub fn block_range(&self, index: usize) -> Range<usize> {
        let block_size = self.block_size();
        let start = index
            .saturating_mul(block_size)
            .min(self.original_len);
        let end = start.saturating_add(block_size).min(self.original_len);
        start..end
    }

    /// True (unpadded) payload length of shard `index`
    ///
    /// Only the last non-empty data block can be shorter than the block
    /// size. The parity shard always spans the full block.
    pub fn payload_len(&self, index: usize) -> usize {
        if self.is_parity(index) {
            self.block_size()
        } else {
            self.block_range(index).len()
        }
    }
}

/// Check a caller-supplied disk count
pub fn validate_disks(disks: usize) -> Result<()> {
    if disks < MIN_DISKS {
        return Err(Error::InvalidArgument(format!(
            "number of disks must be at least {}, got {}",
            MIN_DISKS, disks
        )));
    }
    if disks > u32::MAX as usize {
        return Err(Error::InvalidArgument(format!(
            "number of disks {} is too large",
            disks
        )));
    }
    Ok(())
}
