//! Error types for raiden

use thiserror::Error;

/// Result type alias using raiden's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while splitting or merging a shard set
#[derive(Error, Debug)]
pub enum Error {
    /// Bad disk count, missing source file, unusable path
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// More shards are absent than a single parity block can recover
    #[error("Too many missing disks: {} of {disks} absent ({missing:?}), at most one can be recovered", .missing.len())]
    MissingShards {
        /// Indices of the absent shards
        missing: Vec<usize>,
        /// Number of disks in the set
        disks: usize,
    },

    /// Present shards disagree with each other or with their parity
    #[error("Corrupt shard set: {0}")]
    CorruptShard(String),

    /// A single shard file is not a valid shard
    #[error("Invalid shard format: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code reported by the CLI for this error kind.
    ///
    /// Argument errors share code 2 with clap's own usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) | Error::Config(_) => 2,
            Error::MissingShards { .. } => 3,
            Error::CorruptShard(_) | Error::Format(_) | Error::Deserialization(_) => 4,
            Error::Io(_) => 5,
            Error::Serialization(_) => 1,
        }
    }

    /// Check if this error is recoverable by a caller holding other shards
    pub fn is_shard_local(&self) -> bool {
        matches!(self, Error::Format(_) | Error::Deserialization(_))
    }
}
