use log::debug;
use rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use siphasher::sip::SipHasher;
use std::hash::BuildHasher;
use std::hash::{Hash, Hasher};
use std::{cmp, fmt};

/// The default hash builder of the hashers and the LSH index. Two builders with the same keys
/// produce the same hashes.
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy)]
pub struct SipHasherBuilder {
    k0: u64,
    k1: u64,
    hasher: SipHasher,
}

impl SipHasherBuilder {
    /// Constructs a new `SipHasherBuilder` that uses the thread-local RNG to seed itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::SipHasherBuilder;
    ///
    /// let hash_builder = SipHasherBuilder::from_entropy();
    /// ```
    pub fn from_entropy() -> Self {
        let mut rng = rand::thread_rng();
        Self::from_seed(rng.gen(), rng.gen())
    }

    /// Constructs a new `SipHasherBuilder` that is seeded with the given keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::SipHasherBuilder;
    ///
    /// let hash_builder = SipHasherBuilder::from_seed(0, 0);
    /// ```
    pub fn from_seed(k0: u64, k1: u64) -> Self {
        SipHasherBuilder {
            k0,
            k1,
            hasher: SipHasher::new_with_keys(k0, k1),
        }
    }
}

impl fmt::Debug for SipHasherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SipHasherBuilder")
            .field("k0", &self.k0)
            .field("k1", &self.k1)
            .finish()
    }
}

impl cmp::PartialEq for SipHasherBuilder {
    fn eq(&self, other: &SipHasherBuilder) -> bool {
        self.k0 == other.k0 && self.k1 == other.k1
    }
}

impl BuildHasher for SipHasherBuilder {
    type Hasher = SipHasher;

    #[inline]
    fn build_hasher(&self) -> SipHasher {
        self.hasher
    }
}

pub fn hash(hash_builder: &impl BuildHasher, item: &impl Hash) -> u64 {
    let mut hasher = hash_builder.build_hasher();
    item.hash(&mut hasher);
    hasher.finish()
}

/// Keeps the `Some` elements of a batch and drops the rest, logging how many were dropped.
/// Malformed elements inside a batch are skipped rather than failing the whole batch.
pub(crate) fn collect_valid<T, I>(iter: I, element: &str) -> Vec<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    let mut skipped = 0;
    let valid: Vec<T> = iter
        .into_iter()
        .filter_map(|item| {
            if item.is_none() {
                skipped += 1;
            }
            item
        })
        .collect();
    if skipped > 0 {
        debug!("skipped {} malformed {} entries", skipped, element);
    }
    valid
}
