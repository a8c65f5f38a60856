use crate::error::{Error, Result};
use crate::similarity::{ShingleConfig, Shingler};
use crate::util;
use crate::SipHasherBuilder;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
#[cfg(feature = "serde")]
use std::convert::TryFrom;
use std::hash::{BuildHasher, Hash};

/// Configuration for a [`SimHasher`].
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHashConfig {
    /// Width of a fingerprint in bits, within `1..=64`.
    pub hash_bits: u32,
    /// How text is turned into features by the text-level methods.
    pub shingle: ShingleConfig,
}

impl Default for SimHashConfig {
    fn default() -> Self {
        SimHashConfig {
            hash_bits: 64,
            shingle: ShingleConfig::default(),
        }
    }
}

/// Options for [`SimHasher::find_similar`] and [`SimHasher::find_similar_texts`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FindOptions {
    /// Largest Hamming distance a match may have.
    pub max_distance: u32,
    /// Maximum number of matches returned, all of them if `None`.
    pub max_results: Option<usize>,
}

impl Default for FindOptions {
    fn default() -> Self {
        FindOptions {
            max_distance: 3,
            max_results: None,
        }
    }
}

/// A candidate that lies within the requested Hamming distance of a query.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarMatch<K> {
    /// The key the candidate was supplied with. For text searches this is the text's index.
    pub key: K,
    /// The candidate's fingerprint.
    pub fingerprint: u64,
    /// Hamming distance to the query.
    pub distance: u32,
    /// `1 - distance / hash_bits`.
    pub similarity: f64,
}

/// Pairwise Hamming distance statistics over a collection of fingerprints.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionStats {
    /// Number of fingerprints.
    pub count: usize,
    /// Number of unordered pairs compared.
    pub pairs: usize,
    /// Smallest pairwise distance.
    pub min: u32,
    /// Largest pairwise distance.
    pub max: u32,
    /// Mean pairwise distance.
    pub mean: f64,
    /// Median pairwise distance.
    pub median: f64,
    /// Population standard deviation of the pairwise distances.
    pub std_dev: f64,
    /// `histogram[d]` is the number of pairs at distance `d`, for `d` in `0..=hash_bits`.
    pub histogram: Vec<usize>,
}

/// `SimHasher` is a locality sensitive hashing scheme. If two weighted feature sets are similar,
/// `SimHasher` generates fingerprints for them that have a small Hamming Distance between them.
///
/// Every bit of a fingerprint is a weighted vote: each feature adds its weight to the bit's
/// counter if the feature's hash has that bit set and subtracts it otherwise, and the bit is set
/// when the counter is non-negative. Ties resolve to 1. Fingerprints are `u64` values masked to
/// `hash_bits` bits.
///
/// Searching is a linear scan. There is no index; the fingerprint is small enough that
/// comparing against every candidate is cheap.
///
/// # Examples
///
/// ```
/// use text_sketch::similarity::SimHasher;
///
/// let sim_hasher = SimHasher::new(64).unwrap();
///
/// let fingerprint_1 = sim_hasher.compute_from_text("the cat sat on a mat and looked around");
/// let fingerprint_2 = sim_hasher.compute_from_text("the cat sat on a mat and looked about");
/// let fingerprint_3 = sim_hasher.compute_from_text("we all scream for ice cream every day");
///
/// assert!(
///     sim_hasher.hamming_distance(fingerprint_1, fingerprint_2)
///         < sim_hasher.hamming_distance(fingerprint_1, fingerprint_3)
/// );
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate", try_from = "SimHasherData<B>")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct SimHasher<B = SipHasherBuilder> {
    hash_bits: u32,
    mask: u64,
    hash_builder: B,
    shingler: Shingler,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(crate = "serde_crate")]
struct SimHasherData<B> {
    hash_bits: u32,
    mask: u64,
    hash_builder: B,
    shingler: Shingler,
}

#[cfg(feature = "serde")]
impl<B> TryFrom<SimHasherData<B>> for SimHasher<B> {
    type Error = Error;

    fn try_from(data: SimHasherData<B>) -> Result<Self> {
        check_hash_bits(data.hash_bits)?;
        if data.mask != width_mask(data.hash_bits) {
            return Err(Error::InvalidConfig(format!(
                "mask {:#x} does not match a width of {} bits",
                data.mask, data.hash_bits
            )));
        }
        Ok(SimHasher {
            hash_bits: data.hash_bits,
            mask: data.mask,
            hash_builder: data.hash_builder,
            shingler: data.shingler,
        })
    }
}

impl SimHasher {
    /// Keys of the hasher used by [`SimHasher::new`], so fingerprints from separate instances of
    /// the same width are comparable.
    pub const DEFAULT_KEYS: (u64, u64) = (0x7369_6d68_6173_6830, 0x7369_6d68_6173_6831);

    /// Constructs a new `SimHasher` producing `hash_bits`-bit fingerprints with the default hasher
    /// and shingle configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `hash_bits` is not within `1..=64`.
    pub fn new(hash_bits: u32) -> Result<Self> {
        let (k0, k1) = Self::DEFAULT_KEYS;
        Self::with_hasher(hash_bits, SipHasherBuilder::from_seed(k0, k1))
    }

    /// Constructs a new `SimHasher` from a [`SimHashConfig`].
    pub fn from_config(config: SimHashConfig) -> Result<Self> {
        Ok(Self::new(config.hash_bits)?.with_shingler(Shingler::new(config.shingle)?))
    }
}

impl<B> SimHasher<B>
where
    B: BuildHasher,
{
    /// Constructs a new `SimHasher` with a specified hasher builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::SimHasher;
    /// use text_sketch::SipHasherBuilder;
    ///
    /// let sim_hasher = SimHasher::with_hasher(32, SipHasherBuilder::from_seed(0, 0)).unwrap();
    /// assert_eq!(sim_hasher.hash_bits(), 32);
    /// ```
    pub fn with_hasher(hash_bits: u32, hash_builder: B) -> Result<Self> {
        check_hash_bits(hash_bits)?;
        Ok(SimHasher {
            hash_bits,
            mask: width_mask(hash_bits),
            hash_builder,
            shingler: Shingler::default(),
        })
    }

    /// Replaces the shingler used by the text-level methods.
    pub fn with_shingler(mut self, shingler: Shingler) -> Self {
        self.shingler = shingler;
        self
    }

    /// Returns every feature of `text` mapped to its frequency.
    pub fn extract_features(&self, text: &str) -> HashMap<String, f64> {
        self.shingler.frequencies(text)
    }

    /// Returns the fingerprint of weighted features. Features whose weight is not finite are
    /// skipped. An empty feature set produces a fingerprint with every bit set.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use text_sketch::similarity::SimHasher;
    ///
    /// let sim_hasher = SimHasher::new(16).unwrap();
    ///
    /// let mut features = HashMap::new();
    /// features.insert("cat".to_string(), 2.0);
    /// features.insert("mat".to_string(), 1.0);
    ///
    /// let fingerprint = sim_hasher.compute_from_features(&features);
    /// assert!(fingerprint < 1 << 16);
    /// assert_eq!(sim_hasher.compute_from_features(Vec::<(&str, f64)>::new()), 0xFFFF);
    /// ```
    pub fn compute_from_features<I, K, W>(&self, features: I) -> u64
    where
        I: IntoIterator<Item = (K, W)>,
        K: Hash,
        W: Borrow<f64>,
    {
        let weighted_hashes = util::collect_valid(
            features.into_iter().map(|(feature, weight)| {
                let weight = *weight.borrow();
                if weight.is_finite() {
                    Some((util::hash(&self.hash_builder, &feature), weight))
                } else {
                    None
                }
            }),
            "simhash feature",
        );

        let mut counts = [0f64; 64];
        for (hash, weight) in weighted_hashes {
            for (i, count) in counts.iter_mut().take(self.hash_bits as usize).enumerate() {
                if (hash >> i) & 1 == 1 {
                    *count += weight;
                } else {
                    *count -= weight;
                }
            }
        }

        counts
            .iter()
            .take(self.hash_bits as usize)
            .enumerate()
            .fold(0, |acc, (i, count)| {
                if *count >= 0.0 {
                    acc | (1 << i)
                } else {
                    acc
                }
            })
    }

    /// Returns the fingerprint of the features of `text`.
    pub fn compute_from_text(&self, text: &str) -> u64 {
        self.compute_from_features(&self.extract_features(text))
    }

    /// Returns the fingerprint of every text in `texts`, in order.
    pub fn compute_batch<I, S>(&self, texts: I) -> Vec<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .map(|text| self.compute_from_text(text.as_ref()))
            .collect()
    }

    /// Returns the number of differing bits between two fingerprints, within the configured
    /// width.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::SimHasher;
    ///
    /// let sim_hasher = SimHasher::new(8).unwrap();
    ///
    /// assert_eq!(sim_hasher.hamming_distance(0b1111_0000, 0b1111_1111), 4);
    /// assert_eq!(sim_hasher.similarity(0b1111_0000, 0b1111_1111), 0.5);
    /// ```
    #[inline]
    pub fn hamming_distance(&self, fingerprint_1: u64, fingerprint_2: u64) -> u32 {
        ((fingerprint_1 ^ fingerprint_2) & self.mask).count_ones()
    }

    /// Returns `1 - distance / hash_bits` for two fingerprints.
    pub fn similarity(&self, fingerprint_1: u64, fingerprint_2: u64) -> f64 {
        self.similarity_from_distance(self.hamming_distance(fingerprint_1, fingerprint_2))
    }

    fn similarity_from_distance(&self, distance: u32) -> f64 {
        1.0 - f64::from(distance) / f64::from(self.hash_bits)
    }

    /// Returns every candidate within `options.max_distance` of `query`, closest first. Candidates
    /// at the same distance keep their input order. Query and candidates are masked to the
    /// configured width, so bits above it never count towards the distance.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::{FindOptions, SimHasher};
    ///
    /// let sim_hasher = SimHasher::new(8).unwrap();
    /// let candidates = vec![("a", 0b0000_0011), ("b", 0b0000_0001), ("c", 0b1111_1111)];
    ///
    /// let matches = sim_hasher.find_similar(
    ///     0b0000_0000,
    ///     candidates,
    ///     FindOptions {
    ///         max_distance: 2,
    ///         max_results: None,
    ///     },
    /// );
    ///
    /// assert_eq!(matches.len(), 2);
    /// assert_eq!(matches[0].key, "b");
    /// assert_eq!(matches[1].key, "a");
    /// ```
    pub fn find_similar<K, I>(
        &self,
        query: u64,
        candidates: I,
        options: FindOptions,
    ) -> Vec<SimilarMatch<K>>
    where
        I: IntoIterator<Item = (K, u64)>,
    {
        let query = query & self.mask;
        let mut matches: Vec<SimilarMatch<K>> = candidates
            .into_iter()
            .filter_map(|(key, fingerprint)| {
                let fingerprint = fingerprint & self.mask;
                let distance = self.hamming_distance(query, fingerprint);
                if distance > options.max_distance {
                    return None;
                }
                Some(SimilarMatch {
                    key,
                    fingerprint,
                    distance,
                    similarity: self.similarity_from_distance(distance),
                })
            })
            .collect();

        matches.sort_by_key(|similar_match| similar_match.distance);
        if let Some(max_results) = options.max_results {
            matches.truncate(max_results);
        }
        matches
    }

    /// Returns the texts whose fingerprints lie within `options.max_distance` of the fingerprint of
    /// `query`, closest first. The key of each match is the index of the text in `texts`.
    pub fn find_similar_texts<S>(
        &self,
        query: &str,
        texts: &[S],
        options: FindOptions,
    ) -> Vec<SimilarMatch<usize>>
    where
        S: AsRef<str>,
    {
        let query = self.compute_from_text(query);
        self.find_similar(
            query,
            self.compute_batch(texts).into_iter().enumerate(),
            options,
        )
    }

    /// Groups fingerprints with greedy seed-based single linkage and returns clusters of indexes.
    ///
    /// Fingerprints are visited in input order. Each one not yet assigned seeds a new cluster,
    /// which absorbs every later unassigned fingerprint within `max_distance` of the seed. Distance
    /// to other members of the cluster is not considered, so the result depends on input order.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::SimHasher;
    ///
    /// let sim_hasher = SimHasher::new(8).unwrap();
    /// let clusters = sim_hasher.cluster_fingerprints(&[0b0000, 0b0001, 0b1111_0000, 0b0011], 1);
    ///
    /// assert_eq!(clusters, vec![vec![0, 1], vec![2], vec![3]]);
    /// ```
    pub fn cluster_fingerprints(&self, fingerprints: &[u64], max_distance: u32) -> Vec<Vec<usize>> {
        let mut assigned = vec![false; fingerprints.len()];
        let mut clusters = Vec::new();

        for seed in 0..fingerprints.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut cluster = vec![seed];
            for other in seed + 1..fingerprints.len() {
                let distance = self.hamming_distance(fingerprints[seed], fingerprints[other]);
                if !assigned[other] && distance <= max_distance {
                    assigned[other] = true;
                    cluster.push(other);
                }
            }
            clusters.push(cluster);
        }

        clusters
    }

    /// Fingerprints every text and groups them with [`SimHasher::cluster_fingerprints`].
    pub fn cluster_similar<S>(&self, texts: &[S], max_distance: u32) -> Vec<Vec<usize>>
    where
        S: AsRef<str>,
    {
        self.cluster_fingerprints(&self.compute_batch(texts), max_distance)
    }

    /// Returns statistics over the Hamming distances of every pair of fingerprints, or `None` if
    /// there are fewer than two. This compares all pairs and is meant for diagnosing small
    /// collections.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::SimHasher;
    ///
    /// let sim_hasher = SimHasher::new(4).unwrap();
    /// let stats = sim_hasher.analyze_distribution(&[0b0000, 0b0001, 0b0011]).unwrap();
    ///
    /// assert_eq!(stats.pairs, 3);
    /// assert_eq!(stats.min, 1);
    /// assert_eq!(stats.max, 2);
    /// assert_eq!(stats.histogram, vec![0, 2, 1, 0, 0]);
    /// ```
    pub fn analyze_distribution(&self, fingerprints: &[u64]) -> Option<DistributionStats> {
        if fingerprints.len() < 2 {
            return None;
        }

        let mut distances = Vec::with_capacity(fingerprints.len() * (fingerprints.len() - 1) / 2);
        for (i, &fingerprint_1) in fingerprints.iter().enumerate() {
            for &fingerprint_2 in &fingerprints[i + 1..] {
                distances.push(self.hamming_distance(fingerprint_1, fingerprint_2));
            }
        }
        distances.sort_unstable();

        let pairs = distances.len();
        let mut histogram = vec![0; self.hash_bits as usize + 1];
        for &distance in &distances {
            histogram[distance as usize] += 1;
        }

        let mean = distances.iter().map(|&d| f64::from(d)).sum::<f64>() / pairs as f64;
        let variance = distances
            .iter()
            .map(|&d| (f64::from(d) - mean).powi(2))
            .sum::<f64>()
            / pairs as f64;
        let median = if pairs % 2 == 0 {
            f64::from(distances[pairs / 2 - 1] + distances[pairs / 2]) / 2.0
        } else {
            f64::from(distances[pairs / 2])
        };

        Some(DistributionStats {
            count: fingerprints.len(),
            pairs,
            min: distances[0],
            max: distances[pairs - 1],
            mean,
            median,
            std_dev: variance.sqrt(),
            histogram,
        })
    }

    /// Returns the fingerprint as exactly `hash_bits` binary digits, most significant first.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::SimHasher;
    ///
    /// let sim_hasher = SimHasher::new(8).unwrap();
    ///
    /// assert_eq!(sim_hasher.to_binary_string(0b101), "00000101");
    /// assert_eq!(sim_hasher.from_binary_string("00000101").unwrap(), 0b101);
    /// assert!(sim_hasher.from_binary_string("101").is_err());
    /// ```
    pub fn to_binary_string(&self, fingerprint: u64) -> String {
        format!(
            "{:0width$b}",
            fingerprint & self.mask,
            width = self.hash_bits as usize
        )
    }

    /// Parses a fingerprint from exactly `hash_bits` binary digits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEncoding`] on a wrong length or a character other than `0` or `1`.
    pub fn from_binary_string(&self, encoded: &str) -> Result<u64> {
        let expected = self.hash_bits as usize;
        if encoded.len() != expected {
            return Err(Error::InvalidEncoding(format!(
                "expected {} binary digits, got {}",
                expected,
                encoded.len()
            )));
        }
        if let Some(c) = encoded.chars().find(|&c| c != '0' && c != '1') {
            return Err(Error::InvalidEncoding(format!(
                "invalid binary digit {:?}",
                c
            )));
        }
        u64::from_str_radix(encoded, 2).map_err(|err| Error::InvalidEncoding(err.to_string()))
    }

    /// Returns the fingerprint as exactly `ceil(hash_bits / 4)` lowercase hexadecimal digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::SimHasher;
    ///
    /// let sim_hasher = SimHasher::new(12).unwrap();
    ///
    /// assert_eq!(sim_hasher.to_hex_string(0xab), "0ab");
    /// assert_eq!(sim_hasher.from_hex_string("0AB").unwrap(), 0xab);
    /// assert!(sim_hasher.from_hex_string("ab").is_err());
    /// ```
    pub fn to_hex_string(&self, fingerprint: u64) -> String {
        format!(
            "{:0width$x}",
            fingerprint & self.mask,
            width = self.hex_digits()
        )
    }

    /// Parses a fingerprint from exactly `ceil(hash_bits / 4)` hexadecimal digits of either case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEncoding`] on a wrong length, a non-hexadecimal character, or a
    /// value wider than `hash_bits`.
    pub fn from_hex_string(&self, encoded: &str) -> Result<u64> {
        let expected = self.hex_digits();
        if encoded.len() != expected {
            return Err(Error::InvalidEncoding(format!(
                "expected {} hexadecimal digits, got {}",
                expected,
                encoded.len()
            )));
        }
        if let Some(c) = encoded.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidEncoding(format!(
                "invalid hexadecimal digit {:?}",
                c
            )));
        }
        let fingerprint = u64::from_str_radix(encoded, 16)
            .map_err(|err| Error::InvalidEncoding(err.to_string()))?;
        if fingerprint & !self.mask != 0 {
            return Err(Error::InvalidEncoding(format!(
                "{} does not fit in {} bits",
                encoded, self.hash_bits
            )));
        }
        Ok(fingerprint)
    }

    fn hex_digits(&self) -> usize {
        ((self.hash_bits + 3) / 4) as usize
    }

    /// Returns the width of a fingerprint in bits.
    pub fn hash_bits(&self) -> u32 {
        self.hash_bits
    }

    /// Returns the mask that keeps the low `hash_bits` bits.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Returns a reference to the `SimHasher`'s hasher builder.
    pub fn hasher(&self) -> &B {
        &self.hash_builder
    }

    /// Returns a reference to the shingler used by the text-level methods.
    pub fn shingler(&self) -> &Shingler {
        &self.shingler
    }
}

fn check_hash_bits(hash_bits: u32) -> Result<()> {
    if hash_bits < 1 || hash_bits > 64 {
        return Err(Error::InvalidConfig(format!(
            "hash bits must be within [1, 64], got {}",
            hash_bits
        )));
    }
    Ok(())
}

fn width_mask(hash_bits: u32) -> u64 {
    if hash_bits >= 64 {
        u64::MAX
    } else {
        (1 << hash_bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::{FindOptions, SimHashConfig, SimHasher};
    use crate::similarity::tests::{S1, S2, S3};
    use crate::similarity::{ShingleConfig, ShingleKind};
    use crate::util::tests::hash_builder_1;
    use std::collections::HashMap;

    #[test]
    fn test_hash_bits_range() {
        assert!(SimHasher::new(0).is_err());
        assert!(SimHasher::new(65).is_err());
        assert!(SimHasher::new(1).is_ok());
        assert!(SimHasher::new(64).is_ok());
    }

    #[test]
    fn test_hamming_distance() {
        let sim_hasher = SimHasher::new(8).unwrap();

        assert_eq!(sim_hasher.hamming_distance(0b1111_0000, 0b1111_1111), 4);
        assert_eq!(sim_hasher.similarity(0b1111_0000, 0b1111_1111), 0.5);
        assert_eq!(sim_hasher.hamming_distance(0xAB, 0xAB), 0);
        assert_eq!(
            sim_hasher.hamming_distance(0x12, 0x34),
            sim_hasher.hamming_distance(0x34, 0x12),
        );
        // bits above the width are ignored
        assert_eq!(sim_hasher.hamming_distance(0x100, 0x000), 0);
    }

    #[test]
    fn test_deterministic() {
        let sim_hasher = SimHasher::with_hasher(64, hash_builder_1()).unwrap();

        assert_eq!(
            sim_hasher.compute_from_text(S1),
            sim_hasher.compute_from_text(S1),
        );
        assert_eq!(
            SimHasher::new(64).unwrap().compute_from_text(S3),
            SimHasher::new(64).unwrap().compute_from_text(S3),
        );
    }

    #[test]
    fn test_similar_texts_are_closer() {
        let sim_hasher = SimHasher::from_config(SimHashConfig {
            hash_bits: 64,
            shingle: ShingleConfig {
                kind: ShingleKind::Char,
                size: 3,
                normalize: true,
            },
        })
        .unwrap();

        let fingerprint_1 = sim_hasher.compute_from_text(S1);
        let fingerprint_2 = sim_hasher.compute_from_text(S2);
        let fingerprint_3 = sim_hasher.compute_from_text(S3);

        assert!(
            sim_hasher.hamming_distance(fingerprint_1, fingerprint_2)
                < sim_hasher.hamming_distance(fingerprint_1, fingerprint_3)
        );
    }

    #[test]
    fn test_single_feature() {
        let sim_hasher = SimHasher::with_hasher(64, hash_builder_1()).unwrap();
        let hash = crate::util::hash(sim_hasher.hasher(), &"cat");

        assert_eq!(sim_hasher.compute_from_features(vec![("cat", 1.0)]), hash);
    }

    #[test]
    fn test_tie_resolves_to_one() {
        let sim_hasher = SimHasher::new(8).unwrap();

        assert_eq!(sim_hasher.compute_from_features(Vec::<(&str, f64)>::new()), 0xFF);
        // equal and opposite weights on the same feature cancel out
        assert_eq!(
            sim_hasher.compute_from_features(vec![("cat", 1.0), ("cat", -1.0)]),
            0xFF
        );
    }

    #[test]
    fn test_weights() {
        let sim_hasher = SimHasher::with_hasher(64, hash_builder_1()).unwrap();
        let heavy = crate::util::hash(sim_hasher.hasher(), &"heavy");

        let mut features = HashMap::new();
        features.insert("heavy".to_string(), 10.0);
        features.insert("light".to_string(), 1.0);
        features.insert("lighter".to_string(), 1.0);

        assert_eq!(sim_hasher.compute_from_features(&features), heavy);
    }

    #[test]
    fn test_non_finite_weights_skipped() {
        let sim_hasher = SimHasher::new(32).unwrap();

        assert_eq!(
            sim_hasher.compute_from_features(vec![("cat", 1.0), ("dog", f64::NAN)]),
            sim_hasher.compute_from_features(vec![("cat", 1.0)]),
        );
    }

    #[test]
    fn test_masked_to_width() {
        let sim_hasher = SimHasher::new(5).unwrap();

        for text in &[S1, S2, S3] {
            assert!(sim_hasher.compute_from_text(text) < 1 << 5);
        }
    }

    #[test]
    fn test_find_similar() {
        let sim_hasher = SimHasher::new(8).unwrap();
        let candidates = vec![
            (0, 0b0000_0111),
            (1, 0b0000_0001),
            (2, 0b1_0000_0000),
            (3, 0b0000_0011),
            (4, 0b0000_0010),
        ];

        let matches = sim_hasher.find_similar(
            0,
            candidates.clone(),
            FindOptions {
                max_distance: 2,
                max_results: None,
            },
        );
        let keys: Vec<_> = matches.iter().map(|m| m.key).collect();
        assert_eq!(keys, vec![2, 1, 4, 3]);
        assert_eq!(matches[0].fingerprint, 0);
        assert_eq!(matches[0].distance, 0);
        assert_eq!(matches[1].similarity, 1.0 - 1.0 / 8.0);

        let matches = sim_hasher.find_similar(
            0,
            candidates,
            FindOptions {
                max_distance: 8,
                max_results: Some(2),
            },
        );
        let keys: Vec<_> = matches.iter().map(|m| m.key).collect();
        assert_eq!(keys, vec![2, 1]);
    }

    #[test]
    fn test_find_similar_masks_candidates() {
        let sim_hasher = SimHasher::new(8).unwrap();
        assert_eq!(sim_hasher.hamming_distance(0, 0x100), 0);

        let matches = sim_hasher.find_similar(
            0,
            vec![("high", 0x100), ("low", 0x01), ("both", 0xFF01)],
            FindOptions {
                max_distance: 0,
                max_results: None,
            },
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, "high");
        assert_eq!(matches[0].fingerprint, 0);
        assert_eq!(matches[0].similarity, 1.0);

        let matches = sim_hasher.find_similar(
            0x300,
            vec![("both", 0xFF01)],
            FindOptions {
                max_distance: 1,
                max_results: None,
            },
        );
        assert_eq!(matches[0].fingerprint, 0x01);
        assert_eq!(matches[0].distance, 1);
    }

    #[test]
    fn test_find_similar_texts() {
        let sim_hasher = SimHasher::new(64).unwrap();
        let texts = vec![S3, S1, S2];

        let matches = sim_hasher.find_similar_texts(
            S1,
            &texts,
            FindOptions {
                max_distance: 0,
                max_results: None,
            },
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, 1);
        assert_eq!(matches[0].distance, 0);
    }

    #[test]
    fn test_cluster_seed_based() {
        let sim_hasher = SimHasher::new(8).unwrap();

        // 0b011 is within 1 of 0b001 but 2 away from the seed 0b000
        let clusters = sim_hasher.cluster_fingerprints(&[0b000, 0b001, 0b011], 1);
        assert_eq!(clusters, vec![vec![0, 1], vec![2]]);

        let clusters = sim_hasher.cluster_fingerprints(&[0b001, 0b000, 0b011], 1);
        assert_eq!(clusters, vec![vec![0, 1, 2]]);

        assert!(sim_hasher.cluster_fingerprints(&[], 1).is_empty());
    }

    #[test]
    fn test_cluster_similar() {
        let sim_hasher = SimHasher::new(64).unwrap();
        let clusters = sim_hasher.cluster_similar(&[S1, S3, S1], 0);

        assert_eq!(clusters, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_analyze_distribution() {
        let sim_hasher = SimHasher::new(8).unwrap();

        assert!(sim_hasher.analyze_distribution(&[0]).is_none());

        let stats = sim_hasher
            .analyze_distribution(&[0b0000, 0b0011, 0b1111, 0b1111_1111])
            .unwrap();
        // distances: 2, 4, 8, 2, 6, 4
        assert_eq!(stats.count, 4);
        assert_eq!(stats.pairs, 6);
        assert_eq!(stats.min, 2);
        assert_eq!(stats.max, 8);
        assert!((stats.mean - 26.0 / 6.0).abs() < 1e-12);
        assert_eq!(stats.median, 4.0);
        assert_eq!(stats.histogram.len(), 9);
        assert_eq!(stats.histogram[2], 2);
        assert_eq!(stats.histogram[4], 2);
    }

    #[test]
    fn test_binary_round_trip() {
        for &hash_bits in &[1, 7, 8, 33, 64] {
            let sim_hasher = SimHasher::new(hash_bits).unwrap();
            for &fingerprint in &[0, 1, u64::MAX, 0xDEAD_BEEF_0123_4567] {
                let fingerprint = fingerprint & sim_hasher.mask();
                let encoded = sim_hasher.to_binary_string(fingerprint);

                assert_eq!(encoded.len(), hash_bits as usize);
                assert_eq!(sim_hasher.from_binary_string(&encoded).unwrap(), fingerprint);
            }
        }
    }

    #[test]
    fn test_hex_round_trip() {
        for &hash_bits in &[1, 7, 8, 33, 64] {
            let sim_hasher = SimHasher::new(hash_bits).unwrap();
            for &fingerprint in &[0, 1, u64::MAX, 0xDEAD_BEEF_0123_4567] {
                let fingerprint = fingerprint & sim_hasher.mask();
                let encoded = sim_hasher.to_hex_string(fingerprint);

                assert_eq!(encoded.len(), ((hash_bits + 3) / 4) as usize);
                assert_eq!(sim_hasher.from_hex_string(&encoded).unwrap(), fingerprint);
            }
        }
    }

    #[test]
    fn test_malformed_encodings() {
        let sim_hasher = SimHasher::new(6).unwrap();

        assert!(sim_hasher.from_binary_string("00000").is_err());
        assert!(sim_hasher.from_binary_string("0000001").is_err());
        assert!(sim_hasher.from_binary_string("00002a").is_err());
        assert!(sim_hasher.from_binary_string("+00001").is_err());
        assert!(sim_hasher.from_hex_string("3f").is_ok());
        assert!(sim_hasher.from_hex_string("40").is_err());
        assert!(sim_hasher.from_hex_string("f").is_err());
        assert!(sim_hasher.from_hex_string("0g").is_err());
        assert!(sim_hasher.from_hex_string("+f").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_ser_de() {
        let sim_hasher = SimHasher::new(32).unwrap();
        let serialized_sim_hasher = bincode::serialize(&sim_hasher).unwrap();
        let de_sim_hasher: SimHasher = bincode::deserialize(&serialized_sim_hasher).unwrap();

        assert_eq!(
            sim_hasher.compute_from_text(S1),
            de_sim_hasher.compute_from_text(S1),
        );
        assert_eq!(sim_hasher.hasher(), de_sim_hasher.hasher());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_de_rejects_invalid_width() {
        let sim_hasher = SimHasher::new(32).unwrap();
        let serialized_sim_hasher = bincode::serialize(&sim_hasher).unwrap();

        // hash_bits is the leading little-endian u32, mask the u64 after it
        let mut zero_width = serialized_sim_hasher.clone();
        zero_width[0..4].copy_from_slice(&0u32.to_le_bytes());
        assert!(bincode::deserialize::<SimHasher>(&zero_width).is_err());

        let mut wrong_mask = serialized_sim_hasher.clone();
        wrong_mask[4..12].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(bincode::deserialize::<SimHasher>(&wrong_mask).is_err());

        let mut narrower = serialized_sim_hasher;
        narrower[0..4].copy_from_slice(&16u32.to_le_bytes());
        narrower[4..12].copy_from_slice(&0xFFFFu64.to_le_bytes());
        let de_sim_hasher: SimHasher = bincode::deserialize(&narrower).unwrap();
        assert_eq!(de_sim_hasher.hash_bits(), 16);
        assert!(de_sim_hasher.compute_from_text(S1) <= 0xFFFF);
    }
}
