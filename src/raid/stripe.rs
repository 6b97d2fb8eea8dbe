//! Stripe encoding and reconstruction
//!
//! Splits a source buffer into N-1 contiguous data blocks plus one XOR
//! parity block, and rebuilds the source from any N-1 of the N shards.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::shard::{set_id_of, SetId, Shard, ShardSet};

use super::geometry::{validate_disks, Geometry};
use super::parity::{parity_of, xor_into};

/// All N shards of one encoded source
pub struct Stripe {
    /// Layout the shards were produced with
    pub geometry: Geometry,
    /// Fingerprint of the encoded source, stamped on every shard
    pub set_id: SetId,
    /// Shards in index order; the last one is parity
    pub shards: Vec<Shard>,
}

impl Stripe {
    /// Get the number of data shards (N - 1)
    pub fn data_count(&self) -> usize {
        self.geometry.data_shards()
    }

    /// Get the total number of shards (N)
    pub fn total_shards(&self) -> usize {
        self.shards.len()
    }

    /// Get the block size (all payloads have the same size)
    pub fn block_size(&self) -> usize {
        self.geometry.block_size()
    }

    /// Get the parity shard
    pub fn parity(&self) -> &Shard {
        &self.shards[self.geometry.parity_index()]
    }

    /// Turn the stripe into a complete shard set
    pub fn into_set(self) -> ShardSet {
        ShardSet::complete(self.shards)
    }
}

/// Encodes sources into stripes and reconstructs them
#[derive(Debug, Clone)]
pub struct StripeCodec {
    disks: usize,
    verify_parity: bool,
}

impl StripeCodec {
    /// Create a codec for `disks` disks
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `disks < 2`
    pub fn new(disks: usize) -> Result<Self> {
        validate_disks(disks)?;
        Ok(StripeCodec {
            disks,
            verify_parity: true,
        })
    }

    /// Enable or disable the parity check run when no shard is missing
    pub fn with_parity_check(mut self, verify_parity: bool) -> Self {
        self.verify_parity = verify_parity;
        self
    }

    /// Get the number of disks (N)
    pub fn disks(&self) -> usize {
        self.disks
    }

    /// Encode a source buffer into N shards
    ///
    /// Data block `i` is `source[i*B .. (i+1)*B]` (shorter or empty at the
    /// end), stored zero-padded to `B`. The parity block is the XOR of all
    /// padded data blocks. Output depends only on `source` and N.
    pub fn encode(&self, source: &[u8]) -> Result<Stripe> {
        let geometry = Geometry::new(self.disks, source.len())?;
        let block_size = geometry.block_size();
        let set_id = set_id_of(source);

        let mut shards = Vec::with_capacity(self.disks);
        let mut parity = vec![0u8; block_size];

        for index in 0..geometry.data_shards() {
            let block = &source[geometry.block_range(index)];
            xor_into(&mut parity, block);

            let mut payload = Vec::with_capacity(block_size);
            payload.extend_from_slice(block);
            payload.resize(block_size, 0);
            shards.push(Shard::new(index, &geometry, set_id, payload));
        }
        shards.push(Shard::new(geometry.parity_index(), &geometry, set_id, parity));

        debug!(
            "Encoded {} bytes into {} shards of {} bytes",
            source.len(),
            shards.len(),
            block_size
        );

        Ok(Stripe {
            geometry,
            set_id,
            shards,
        })
    }

    /// Reconstruct the original source from a shard set
    ///
    /// # Arguments
    /// * `set` - N slots, at most one of them absent
    ///
    /// # Returns
    /// The original bytes, exactly as passed to [`StripeCodec::encode`]
    ///
    /// # Errors
    /// * `MissingShards` if two or more slots are absent
    /// * `CorruptShard` if the present shards disagree on the layout or
    ///   come from different splits, or if parity does not match the data
    ///   when it can be checked
    pub fn reconstruct(&self, set: ShardSet) -> Result<Vec<u8>> {
        if set.len() != self.disks {
            return Err(Error::InvalidArgument(format!(
                "shard set has {} slots, expected {}",
                set.len(),
                self.disks
            )));
        }

        let missing = set.missing();
        if missing.len() > 1 {
            return Err(Error::MissingShards {
                missing,
                disks: self.disks,
            });
        }

        let geometry = self.agreed_geometry(&set)?;
        let missing = missing.first().copied();

        match missing {
            None if self.verify_parity => self.verify(&set, &geometry)?,
            None => {}
            Some(index) if geometry.is_parity(index) => {
                debug!("Parity shard {} missing, data shards are complete", index);
            }
            Some(index) => {
                info!("Reconstructing data shard {} from parity", index);
            }
        }

        let recovered = match missing.filter(|&i| !geometry.is_parity(i)) {
            Some(index) => Some((index, recover_block(&set, index, &geometry)?)),
            None => None,
        };

        let mut output = Vec::with_capacity(geometry.original_len());
        for index in 0..geometry.data_shards() {
            match (&recovered, set.get(index)) {
                (Some((lost, block)), _) if *lost == index => {
                    output.extend_from_slice(&block[..geometry.payload_len(index)]);
                }
                (_, Some(shard)) => output.extend_from_slice(shard.data()),
                (_, None) => {
                    return Err(Error::CorruptShard(format!(
                        "data shard {} unavailable after recovery",
                        index
                    )));
                }
            }
        }

        if output.len() != geometry.original_len() {
            return Err(Error::CorruptShard(format!(
                "reconstructed {} bytes, headers declare {}",
                output.len(),
                geometry.original_len()
            )));
        }

        Ok(output)
    }

    /// Check every present shard against the others and the requested N
    ///
    /// The original length may come from any shard; all must agree, and
    /// all must carry the same set id.
    fn agreed_geometry(&self, set: &ShardSet) -> Result<Geometry> {
        let mut geometry: Option<Geometry> = None;
        let mut set_id: Option<SetId> = None;

        for (index, shard) in set.present() {
            let header = &shard.header;

            if header.disks as usize != self.disks {
                return Err(Error::CorruptShard(format!(
                    "shard {} belongs to a set of {} disks, expected {}",
                    index, header.disks, self.disks
                )));
            }
            if shard.index() != index {
                return Err(Error::CorruptShard(format!(
                    "shard file {} declares index {}",
                    index,
                    shard.index()
                )));
            }

            let own = Geometry::new(self.disks, header.original_len as usize)?;
            match geometry {
                Some(ref agreed) if agreed.original_len() != own.original_len() => {
                    return Err(Error::CorruptShard(format!(
                        "inconsistent file lengths: {} and {}",
                        agreed.original_len(),
                        own.original_len()
                    )));
                }
                Some(_) => {}
                None => geometry = Some(own),
            }

            match set_id {
                Some(agreed) if agreed != header.set_id => {
                    return Err(Error::CorruptShard(format!(
                        "shard {} belongs to a different split (set {}, expected {})",
                        index,
                        hex::encode(header.set_id),
                        hex::encode(agreed)
                    )));
                }
                Some(_) => {}
                None => set_id = Some(header.set_id),
            }

            let expected = own.payload_len(index) as u64;
            if header.payload_len != expected || shard.payload.len() != own.block_size() {
                return Err(Error::CorruptShard(format!(
                    "shard {} has payload {}/{} bytes, expected {}/{}",
                    index,
                    header.payload_len,
                    shard.payload.len(),
                    expected,
                    own.block_size()
                )));
            }
        }

        geometry.ok_or_else(|| Error::MissingShards {
            missing: set.missing(),
            disks: self.disks,
        })
    }

    /// Recompute parity from the data shards and compare with the stored one
    fn verify(&self, set: &ShardSet, geometry: &Geometry) -> Result<()> {
        let parity_index = geometry.parity_index();
        let computed = parity_of(
            set.present()
                .filter(|(index, _)| *index != parity_index)
                .map(|(_, shard)| shard.payload.as_slice()),
            geometry.block_size(),
        );

        let stored = set
            .get(parity_index)
            .map(|shard| shard.payload.as_slice())
            .unwrap_or_default();

        if computed != stored {
            return Err(Error::CorruptShard(
                "parity does not match data shards".to_string(),
            ));
        }

        debug!("Parity verified over {} data shards", geometry.data_shards());
        Ok(())
    }
}

/// Rebuild the padded block of data shard `missing` from all other shards
fn recover_block(set: &ShardSet, missing: usize, geometry: &Geometry) -> Result<Vec<u8>> {
    let blocks = (0..set.len())
        .filter(|index| *index != missing)
        .map(|index| {
            set.get(index)
                .map(|shard| shard.payload.as_slice())
                .ok_or_else(|| Error::MissingShards {
                    missing: vec![missing, index],
                    disks: geometry.disks(),
                })
        })
        .collect::<Result<Vec<&[u8]>>>()?;

    let block = parity_of(blocks, geometry.block_size());

    let true_len = geometry.payload_len(missing);
    if block[true_len..].iter().any(|&b| b != 0) {
        return Err(Error::CorruptShard(format!(
            "recovered block {} has non-zero padding",
            missing
        )));
    }

    Ok(block)
}
