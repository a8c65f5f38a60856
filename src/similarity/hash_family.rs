use crate::error::{Error, Result};
use crate::util;
use crate::SipHasherBuilder;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// The Mersenne prime `2^61 - 1` used as the modulus of every hash function in a
/// [`HashFamily`].
pub const MERSENNE_PRIME: u64 = (1 << 61) - 1;

/// An immutable family of universal hash functions `h_i(x) = (a_i * x + b_i) mod p` over a
/// seeded SipHash of the item, where `p` is [`MERSENNE_PRIME`].
///
/// The coefficients are drawn once from a seeded `XorShiftRng`, and every multiplier `a_i` is
/// distinct, so two families built from the same seed and size are identical. Signatures are
/// only comparable when produced by the same family.
///
/// # Examples
///
/// ```
/// use text_sketch::similarity::HashFamily;
///
/// let family = HashFamily::from_seed(16, 42).unwrap();
/// assert_eq!(family.len(), 16);
/// assert_eq!(family, HashFamily::from_seed(16, 42).unwrap());
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct HashFamily {
    seed: u64,
    hash_builder: SipHasherBuilder,
    coefficients: Vec<(u64, u64)>,
}

impl HashFamily {
    /// Constructs a family of `hasher_count` hash functions derived from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `hasher_count` is zero.
    pub fn from_seed(hasher_count: usize, seed: u64) -> Result<Self> {
        if hasher_count == 0 {
            return Err(Error::InvalidConfig(
                "number of hash functions must be at least 1".to_string(),
            ));
        }

        let mut rng = XorShiftRng::seed_from_u64(seed);
        let hash_builder = SipHasherBuilder::from_seed(rng.gen(), rng.gen());
        let mut multipliers = HashSet::with_capacity(hasher_count);
        let mut coefficients = Vec::with_capacity(hasher_count);
        while coefficients.len() < hasher_count {
            let a = rng.gen_range(1, MERSENNE_PRIME);
            if !multipliers.insert(a) {
                continue;
            }
            let b = rng.gen_range(0, MERSENNE_PRIME);
            coefficients.push((a, b));
        }

        Ok(HashFamily {
            seed,
            hash_builder,
            coefficients,
        })
    }

    /// Returns the base hash of `item`, reduced modulo [`MERSENNE_PRIME`]. Every function of
    /// the family is applied to this value.
    pub fn base_hash<U>(&self, item: &U) -> u64
    where
        U: Hash + ?Sized,
    {
        util::hash(&self.hash_builder, &item) % MERSENNE_PRIME
    }

    /// Applies hash function `index` to a base hash.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn apply(&self, index: usize, base_hash: u64) -> u64 {
        let (a, b) = self.coefficients[index];
        let value = (u128::from(a) * u128::from(base_hash) + u128::from(b))
            % u128::from(MERSENNE_PRIME);
        value as u64
    }

    /// Returns the number of hash functions in the family.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Always `false`; a family holds at least one function.
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Returns the seed the family was generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}
