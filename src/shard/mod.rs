//! Shard files and shard sets
//!
//! A shard set is the N shards produced from one source file. On the
//! read side any of them may be absent.

mod header;

pub use header::{
    set_id_of, SetId, Shard, ShardHeader, HEADER_LEN, SHARD_MAGIC, SHARD_VERSION,
};

use crate::error::{Error, Result};

/// Index-ordered view of a shard set with absent slots
#[derive(Debug, Clone, Default)]
pub struct ShardSet {
    slots: Vec<Option<Shard>>,
}

impl ShardSet {
    /// Create a set of `disks` slots, all absent
    pub fn with_disks(disks: usize) -> Self {
        ShardSet {
            slots: vec![None; disks],
        }
    }

    /// Build a set from every shard of a freshly encoded stripe
    pub fn complete(shards: Vec<Shard>) -> Self {
        ShardSet {
            slots: shards.into_iter().map(Some).collect(),
        }
    }

    /// Put a shard into slot `index`
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `index` is not a slot of this set
    pub fn insert(&mut self, index: usize, shard: Shard) -> Result<()> {
        let disks = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            Error::InvalidArgument(format!("slot {} out of range for {} disks", index, disks))
        })?;
        *slot = Some(shard);
        Ok(())
    }

    /// Mark slot `index` as absent, returning what was there
    pub fn remove(&mut self, index: usize) -> Option<Shard> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Number of slots (N)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Shard in slot `index`, if present
    pub fn get(&self, index: usize) -> Option<&Shard> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn is_present(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Indices of absent slots, ascending
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Present shards with their slot index
    pub fn present(&self) -> impl Iterator<Item = (usize, &Shard)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|shard| (index, shard)))
    }
}
