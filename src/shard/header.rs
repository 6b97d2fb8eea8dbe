//! On-disk shard format
//!
//! Every shard file is a fixed-size header followed by exactly one block
//! of payload. The header is a bincode (fixed-int, little-endian) encoding
//! of [`ShardHeader`], so every field has a fixed width and offset.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raid::Geometry;

/// Magic bytes at the start of every shard file
pub const SHARD_MAGIC: [u8; 4] = *b"RDNS";

/// Current shard format version
pub const SHARD_VERSION: u16 = 1;

/// Serialized header size: magic + version + index + disks + two lengths + set id + digest
pub const HEADER_LEN: usize = 4 + 2 + 4 + 4 + 8 + 8 + 16 + 32;

/// Identifier shared by every shard written by one split
pub type SetId = [u8; 16];

/// Set identifier of a source: the leading bytes of its BLAKE3 hash
pub fn set_id_of(source: &[u8]) -> SetId {
    let mut id = SetId::default();
    let len = id.len();
    id.copy_from_slice(&blake3::hash(source).as_bytes()[..len]);
    id
}

/// Self-describing header stored at the start of each shard file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardHeader {
    /// Format identification
    pub magic: [u8; 4],
    /// Format version
    pub version: u16,
    /// Position of this shard within the set (0..disks)
    pub index: u32,
    /// Number of shards in the set
    pub disks: u32,
    /// Length of the original file
    pub original_len: u64,
    /// Bytes of real data in the payload, before padding
    pub payload_len: u64,
    /// Source fingerprint, equal across the set
    pub set_id: SetId,
    /// BLAKE3 digest of this header (with the checksum zeroed) and the padded payload
    pub checksum: [u8; 32],
}

impl ShardHeader {
    /// Geometry of the set this shard claims to belong to
    pub fn geometry(&self) -> Result<Geometry> {
        Geometry::from_header(self.disks, self.original_len).map_err(|e| match e {
            Error::InvalidArgument(msg) => Error::Format(msg),
            other => other,
        })
    }

    /// Digest binding this header to `payload`
    ///
    /// Fields are hashed in their fixed-int little-endian wire form with
    /// `checksum` zeroed, so this equals BLAKE3 over the serialized header
    /// followed by the payload.
    pub fn digest(&self, payload: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.magic);
        hasher.update(&self.version.to_le_bytes());
        hasher.update(&self.index.to_le_bytes());
        hasher.update(&self.disks.to_le_bytes());
        hasher.update(&self.original_len.to_le_bytes());
        hasher.update(&self.payload_len.to_le_bytes());
        hasher.update(&self.set_id);
        hasher.update(&[0u8; 32]);
        hasher.update(payload);
        *hasher.finalize().as_bytes()
    }

    /// Serialize the header to its fixed-size byte form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse a header from the first [`HEADER_LEN`] bytes of `data`
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::Format(format!(
                "file is {} bytes, shorter than the {} byte header",
                data.len(),
                HEADER_LEN
            )));
        }

        let header: ShardHeader = bincode::deserialize(&data[..HEADER_LEN])
            .map_err(|e| Error::Deserialization(e.to_string()))?;

        if header.magic != SHARD_MAGIC {
            return Err(Error::Format(format!(
                "bad magic {}, expected {}",
                hex::encode(header.magic),
                hex::encode(SHARD_MAGIC)
            )));
        }
        if header.version != SHARD_VERSION {
            return Err(Error::Format(format!(
                "unsupported format version {}, this build supports version {}",
                header.version, SHARD_VERSION
            )));
        }

        Ok(header)
    }
}

/// One shard: its header and its padded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub header: ShardHeader,
    /// Payload bytes, always exactly one block long
    pub payload: Vec<u8>,
}

impl Shard {
    /// Build shard `index` of `geometry` around a payload of one block
    ///
    /// The true length is derived from the geometry, so callers only pass
    /// the padded block.
    pub fn new(index: usize, geometry: &Geometry, set_id: SetId, payload: Vec<u8>) -> Self {
        debug_assert_eq!(payload.len(), geometry.block_size());

        let mut header = ShardHeader {
            magic: SHARD_MAGIC,
            version: SHARD_VERSION,
            index: index as u32,
            disks: geometry.disks() as u32,
            original_len: geometry.original_len() as u64,
            payload_len: geometry.payload_len(index) as u64,
            set_id,
            checksum: [0u8; 32],
        };
        header.checksum = header.digest(&payload);

        Shard { header, payload }
    }

    /// Position of this shard within its set
    pub fn index(&self) -> usize {
        self.header.index as usize
    }

    /// Payload without its zero padding
    pub fn data(&self) -> &[u8] {
        let len = (self.header.payload_len as usize).min(self.payload.len());
        &self.payload[..len]
    }

    /// Full serialized shard file: header then payload
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = self.header.to_bytes()?;
        bytes.reserve(self.payload.len());
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }

    /// Parse and validate a complete shard file
    ///
    /// Only checks the file against its own header. Whether it agrees with
    /// the rest of its set is decided by the decoder.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = ShardHeader::from_bytes(data)?;
        let payload = &data[HEADER_LEN..];

        let checksum = header.digest(payload);
        if checksum != header.checksum {
            return Err(Error::Format(format!(
                "checksum mismatch: stored {}, computed {}",
                hex::encode(header.checksum),
                hex::encode(checksum)
            )));
        }

        let geometry = header.geometry()?;

        let index = header.index as usize;
        if index >= geometry.disks() {
            return Err(Error::Format(format!(
                "index {} out of range for {} disks",
                index,
                geometry.disks()
            )));
        }

        let block_size = geometry.block_size();
        if payload.len() != block_size {
            return Err(Error::Format(format!(
                "payload is {} bytes, expected block size {}",
                payload.len(),
                block_size
            )));
        }

        let expected_len = geometry.payload_len(index);
        if header.payload_len != expected_len as u64 {
            return Err(Error::Format(format!(
                "declared payload length {} does not match {} derived for index {}",
                header.payload_len, expected_len, index
            )));
        }

        if payload[expected_len..].iter().any(|&b| b != 0) {
            return Err(Error::Format("non-zero bytes in block padding".to_string()));
        }

        Ok(Shard {
            header,
            payload: payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: SetId = [0xA5; 16];

    fn sample_shard() -> Shard {
        let geometry = Geometry::new(3, 10).unwrap();
        let mut payload = b"hello".to_vec();
        payload.resize(geometry.block_size(), 0);
        Shard::new(0, &geometry, SET, payload)
    }

    #[test]
    fn test_header_is_fixed_size() {
        let shard = sample_shard();
        assert_eq!(shard.header.to_bytes().unwrap().len(), HEADER_LEN);
        assert_eq!(shard.to_bytes().unwrap().len(), HEADER_LEN + 5);
    }

    #[test]
    fn test_header_layout_is_little_endian() {
        let bytes = sample_shard().to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"RDNS");
        assert_eq!(&bytes[4..6], &SHARD_VERSION.to_le_bytes());
        assert_eq!(&bytes[6..10], &0u32.to_le_bytes());
        assert_eq!(&bytes[10..14], &3u32.to_le_bytes());
        assert_eq!(&bytes[14..22], &10u64.to_le_bytes());
        assert_eq!(&bytes[22..30], &5u64.to_le_bytes());
        assert_eq!(&bytes[30..46], &SET);
    }

    #[test]
    fn test_digest_covers_serialized_header() {
        let shard = sample_shard();
        let mut zeroed = shard.header.clone();
        zeroed.checksum = [0u8; 32];

        let mut hasher = blake3::Hasher::new();
        hasher.update(&zeroed.to_bytes().unwrap());
        hasher.update(&shard.payload);
        assert_eq!(hasher.finalize().as_bytes(), &shard.header.checksum);
    }

    #[test]
    fn test_set_id_follows_content() {
        assert_eq!(set_id_of(b"same"), set_id_of(b"same"));
        assert_ne!(set_id_of(b"same"), set_id_of(b"sane"));
    }

    #[test]
    fn test_parse_written_shard() {
        let shard = sample_shard();
        let parsed = Shard::from_bytes(&shard.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, shard);
        assert_eq!(parsed.data(), b"hello");
    }

    #[test]
    fn test_rejects_truncated_file() {
        let bytes = sample_shard().to_bytes().unwrap();
        let err = Shard::from_bytes(&bytes[..HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        let err = Shard::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = sample_shard().to_bytes().unwrap();
        bytes[0] = b'X';
        let err = Shard::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_rejects_flipped_payload_bit() {
        let mut bytes = sample_shard().to_bytes().unwrap();
        bytes[HEADER_LEN] ^= 0x01;
        let err = Shard::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_rejects_flipped_header_bit() {
        // Low byte of original_len
        let mut bytes = sample_shard().to_bytes().unwrap();
        bytes[14] ^= 0x01;
        let err = Shard::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("checksum mismatch"));
        assert!(err.is_shard_local());
    }

    #[test]
    fn test_rejects_dirty_padding() {
        // 9 bytes over 2 data shards: block 5, second block holds 4 bytes
        let geometry = Geometry::new(3, 9).unwrap();
        let mut shard = Shard::new(1, &geometry, SET, b"abcd\0".to_vec());
        shard.payload[4] = 0xFF;
        shard.header.checksum = shard.header.digest(&shard.payload);

        let err = Shard::from_bytes(&shard.to_bytes().unwrap()).unwrap_err();
        assert!(err.to_string().contains("padding"));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let mut shard = sample_shard();
        shard.header.index = 7;
        shard.header.checksum = shard.header.digest(&shard.payload);
        let err = Shard::from_bytes(&shard.to_bytes().unwrap()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_empty_shard() {
        let geometry = Geometry::new(4, 0).unwrap();
        let shard = Shard::new(3, &geometry, SET, Vec::new());
        let bytes = shard.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(Shard::from_bytes(&bytes).unwrap().data(), b"");
    }
}
