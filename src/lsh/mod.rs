//! Locality sensitive hashing over MinHash signatures.
//!
//! [`LshBuckets`] splits signatures into bands and indexes each band in a bucket table. A row
//! count `r` per band makes a band match only when all of its rows agree (AND-amplification),
//! and `b` bands make a pair a candidate when any band matches (OR-amplification). The resulting
//! collision probability `1 - (1 - s^r)^b` is tuned with [`find_optimal_bands`].

mod buckets;
mod shared;
mod tuning;

pub use self::buckets::{LshBuckets, LshConfig, LshStats, SearchOptions, SearchResult};
pub use self::shared::SharedLshBuckets;
pub use self::tuning::{find_optimal_bands, BandConfig};
