//! RAID-4 style striping with a single XOR parity disk
//!
//! A source is split into N-1 data shards and one parity shard (the last
//! index). Any single shard can be lost and the source still rebuilt.

pub mod geometry;
pub mod parity;
pub mod stripe;

pub use geometry::{Geometry, MIN_DISKS};
pub use stripe::{Stripe, StripeCodec};
