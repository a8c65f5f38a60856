use crate::error::{Error, Result};
use crate::similarity::{HashFamily, ShingleConfig, Shingler};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

/// The value of every signature slot for an empty set. No hash function of a [`HashFamily`]
/// can produce it, so it acts as positive infinity.
pub const EMPTY_SLOT: u64 = u64::MAX;

/// Configuration for a [`MinHasher`].
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinHashConfig {
    /// Number of hash functions, and therefore the signature length.
    pub num_hashes: usize,
    /// Seed of the [`HashFamily`].
    pub seed: u64,
    /// How text is turned into shingles by the text-level methods.
    pub shingle: ShingleConfig,
}

impl Default for MinHashConfig {
    fn default() -> Self {
        MinHashConfig {
            num_hashes: 128,
            seed: MinHasher::DEFAULT_SEED,
            shingle: ShingleConfig::default(),
        }
    }
}

/// `MinHasher` is a locality sensitive hashing scheme that can estimate the Jaccard Similarity
/// measure between two sets `s1` and `s2`. It uses multiple hash functions and for each hash
/// function `h`, finds the minimum hash value obtained from hashing every item of a set with
/// `h`. The estimate for the Jaccard Similarity is the number of equal minimum hash values
/// divided by the number of hash functions used. The estimator is unbiased and its variance
/// shrinks as the number of hash functions grows.
///
/// A `MinHasher` is immutable after construction and can be shared between threads.
///
/// # Examples
///
/// ```
/// use text_sketch::similarity::MinHasher;
///
/// let min_hasher = MinHasher::new(128).unwrap();
///
/// let signature_1 = min_hasher.compute_text_signature("the cat sat on a mat");
/// let signature_2 = min_hasher.compute_text_signature("the cat sat on a mat");
///
/// assert_eq!(signature_1.len(), 128);
/// assert_eq!(
///     min_hasher.estimate_similarity(&signature_1, &signature_2).unwrap(),
///     1.0,
/// );
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct MinHasher {
    family: HashFamily,
    shingler: Shingler,
}

impl MinHasher {
    /// Seed used by [`MinHasher::new`]. Signatures from any two hashers built with `new` and the
    /// same number of hashes are comparable.
    pub const DEFAULT_SEED: u64 = 0x6d69_6e68_6173_6821;

    /// Constructs a new `MinHasher` with `num_hashes` hash functions derived from
    /// [`MinHasher::DEFAULT_SEED`] and the default shingle configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `num_hashes` is zero.
    pub fn new(num_hashes: usize) -> Result<Self> {
        Self::with_seed(num_hashes, Self::DEFAULT_SEED)
    }

    /// Constructs a new `MinHasher` with `num_hashes` hash functions derived from `seed`.
    pub fn with_seed(num_hashes: usize, seed: u64) -> Result<Self> {
        Ok(Self::with_family(HashFamily::from_seed(num_hashes, seed)?))
    }

    /// Constructs a new `MinHasher` that uses an existing hash family.
    pub fn with_family(family: HashFamily) -> Self {
        MinHasher {
            family,
            shingler: Shingler::default(),
        }
    }

    /// Constructs a new `MinHasher` from a [`MinHashConfig`].
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::{MinHashConfig, MinHasher};
    ///
    /// let min_hasher = MinHasher::from_config(MinHashConfig {
    ///     num_hashes: 64,
    ///     ..MinHashConfig::default()
    /// })
    /// .unwrap();
    /// assert_eq!(min_hasher.num_hashes(), 64);
    /// ```
    pub fn from_config(config: MinHashConfig) -> Result<Self> {
        Ok(MinHasher {
            family: HashFamily::from_seed(config.num_hashes, config.seed)?,
            shingler: Shingler::new(config.shingle)?,
        })
    }

    /// Returns the minimum hash values of the items yielded by `iter`. Duplicate items do not
    /// change the result. An empty iterator yields a signature made of [`EMPTY_SLOT`], so two
    /// empty sets compare as identical.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::{MinHasher, EMPTY_SLOT};
    ///
    /// let min_hasher = MinHasher::new(4).unwrap();
    ///
    /// let signature = min_hasher.compute_signature(vec!["a", "b", "c"]);
    /// assert_eq!(signature.len(), 4);
    ///
    /// let empty = min_hasher.compute_signature(Vec::<&str>::new());
    /// assert_eq!(empty, vec![EMPTY_SLOT; 4]);
    /// ```
    pub fn compute_signature<I>(&self, iter: I) -> Vec<u64>
    where
        I: IntoIterator,
        I::Item: Hash,
    {
        let base_hashes: Vec<u64> = iter
            .into_iter()
            .map(|item| self.family.base_hash(&item))
            .collect();

        (0..self.family.len())
            .map(|index| {
                base_hashes
                    .iter()
                    .map(|&base_hash| self.family.apply(index, base_hash))
                    .min()
                    .unwrap_or(EMPTY_SLOT)
            })
            .collect()
    }

    /// Returns the signature of the shingles of `text`.
    pub fn compute_text_signature(&self, text: &str) -> Vec<u64> {
        self.compute_signature(self.shingler.shingles(text))
    }

    /// Returns the signature of every text in `texts`, in order.
    pub fn compute_batch<I, S>(&self, texts: I) -> Vec<Vec<u64>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .map(|text| self.compute_text_signature(text.as_ref()))
            .collect()
    }

    /// Returns the estimated Jaccard Similarity measure from two signatures: the fraction of
    /// positions whose values are equal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the signatures differ in length, and
    /// [`Error::InvalidInput`] if they are empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::MinHasher;
    ///
    /// let min_hasher = MinHasher::new(4).unwrap();
    ///
    /// assert_eq!(
    ///     min_hasher.estimate_similarity(&[1, 2, 3, 4], &[1, 2, 0, 0]).unwrap(),
    ///     0.5,
    /// );
    /// assert!(min_hasher.estimate_similarity(&[1, 2, 3, 4], &[1, 2]).is_err());
    /// ```
    pub fn estimate_similarity(&self, signature_1: &[u64], signature_2: &[u64]) -> Result<f64> {
        signature_similarity(signature_1, signature_2)
    }

    /// Returns the estimated Jaccard Similarity measure between the shingle sets of two texts.
    pub fn estimate_text_similarity(&self, text_1: &str, text_2: &str) -> f64 {
        let signature_1 = self.compute_text_signature(text_1);
        let signature_2 = self.compute_text_signature(text_2);
        let matches = count_matches(&signature_1, &signature_2);
        (matches as f64) / (self.family.len() as f64)
    }

    /// Returns the exact Jaccard Similarity `|A ∩ B| / |A ∪ B|` of two sets. Two empty sets have
    /// a similarity of `1.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashSet;
    /// use text_sketch::similarity::MinHasher;
    ///
    /// let set_1: HashSet<_> = vec!["a", "b", "c"].into_iter().collect();
    /// let set_2: HashSet<_> = vec!["b", "c", "d"].into_iter().collect();
    ///
    /// assert_eq!(MinHasher::compute_jaccard_similarity(&set_1, &set_2), 0.5);
    /// ```
    pub fn compute_jaccard_similarity<U, S>(set_1: &HashSet<U, S>, set_2: &HashSet<U, S>) -> f64
    where
        U: Hash + Eq,
        S: BuildHasher,
    {
        let intersection = set_1.intersection(set_2).count();
        let union = set_1.len() + set_2.len() - intersection;
        if union == 0 {
            return 1.0;
        }
        (intersection as f64) / (union as f64)
    }

    /// Returns the standard error of the similarity estimate at its worst case (`J = 0.5`),
    /// `sqrt(J * (1 - J) / k)` for `k` hash functions.
    pub fn standard_error(&self) -> f64 {
        (0.25 / self.family.len() as f64).sqrt()
    }

    /// Returns the number of hash functions being used in `MinHasher`.
    pub fn num_hashes(&self) -> usize {
        self.family.len()
    }

    /// Returns a reference to the hash family.
    pub fn family(&self) -> &HashFamily {
        &self.family
    }

    /// Returns a reference to the shingler used by the text-level methods.
    pub fn shingler(&self) -> &Shingler {
        &self.shingler
    }
}

fn count_matches(signature_1: &[u64], signature_2: &[u64]) -> usize {
    signature_1
        .iter()
        .zip(signature_2.iter())
        .filter(|(min_hash_1, min_hash_2)| min_hash_1 == min_hash_2)
        .count()
}

/// Equal-position fraction of two signatures. Shared by [`MinHasher`] and the LSH index so both
/// report the same estimate.
pub(crate) fn signature_similarity(signature_1: &[u64], signature_2: &[u64]) -> Result<f64> {
    if signature_1.len() != signature_2.len() {
        return Err(Error::LengthMismatch {
            expected: signature_1.len(),
            got: signature_2.len(),
        });
    }
    if signature_1.is_empty() {
        return Err(Error::InvalidInput("signatures are empty".to_string()));
    }
    Ok((count_matches(signature_1, signature_2) as f64) / (signature_1.len() as f64))
}
