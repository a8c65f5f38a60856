//! Module for measuring similarities between sets and texts.
//!
//! Two strategies live here: [`MinHasher`] produces integer signatures whose equal-position
//! fraction estimates Jaccard similarity, and [`SimHasher`] produces fixed-width bit
//! fingerprints compared by Hamming distance. Both consume shingles produced by a [`Shingler`].

mod hash_family;
mod min_hash;
mod sim_hash;

pub use self::hash_family::{HashFamily, MERSENNE_PRIME};
pub use self::min_hash::{MinHashConfig, MinHasher, EMPTY_SLOT};
pub(crate) use self::min_hash::signature_similarity;
pub use self::sim_hash::{DistributionStats, FindOptions, SimHashConfig, SimHasher, SimilarMatch};

use crate::error::{Error, Result};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::hash::Hash;
use std::iter::FromIterator;

/// A w-shingle iterator for an list of items.
///
/// # Examples
///
/// ```
/// use text_sketch::similarity::ShingleIterator;
///
/// let mut shingle_iter = ShingleIterator::new(2, "the cat sat on a mat".split(' ').collect());
///
/// assert_eq!(shingle_iter.next(), Some(vec!["the", "cat"]));
/// assert_eq!(shingle_iter.next(), Some(vec!["cat", "sat"]));
/// assert_eq!(shingle_iter.next(), Some(vec!["sat", "on"]));
/// assert_eq!(shingle_iter.next(), Some(vec!["on", "a"]));
/// assert_eq!(shingle_iter.next(), Some(vec!["a", "mat"]));
/// assert_eq!(shingle_iter.next(), None);
/// ```
pub struct ShingleIterator<'a, T>
where
    T: 'a + ?Sized,
{
    token_count: usize,
    index: usize,
    tokens: Vec<&'a T>,
}

impl<'a, T> ShingleIterator<'a, T>
where
    T: ?Sized,
{
    /// Constructs a new `ShingleIterator` that contains shingles of `token_count` tokens from
    /// `tokens`. Yields nothing if there are fewer than `token_count` tokens.
    pub fn new(token_count: usize, tokens: Vec<&'a T>) -> Self {
        ShingleIterator {
            token_count,
            index: 0,
            tokens,
        }
    }
}

impl<'a, T> Iterator for ShingleIterator<'a, T>
where
    T: ?Sized,
{
    type Item = Vec<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.token_count == 0 || self.index + self.token_count > self.tokens.len() {
            return None;
        }
        self.index += 1;
        Some(self.tokens[self.index - 1..self.index + self.token_count - 1].to_vec())
    }
}

/// The unit a [`Shingler`] slides its window over.
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShingleKind {
    /// Whitespace-separated words, joined by a single space.
    Word,
    /// Unicode scalar values.
    Char,
}

/// Configuration for a [`Shingler`].
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShingleConfig {
    /// Word or character n-grams.
    pub kind: ShingleKind,
    /// Number of units per shingle. Must be at least 1.
    pub size: usize,
    /// Whether to run [`normalize`] before shingling.
    pub normalize: bool,
}

impl Default for ShingleConfig {
    fn default() -> Self {
        ShingleConfig {
            kind: ShingleKind::Word,
            size: 3,
            normalize: true,
        }
    }
}

/// Lowercases `text`, replaces every non-alphanumeric character with a space, and collapses
/// runs of whitespace.
///
/// # Examples
///
/// ```
/// use text_sketch::similarity::normalize;
///
/// assert_eq!(normalize("  The Cat,  sat!"), "the cat sat");
/// ```
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Converts text into word or character n-gram shingles.
///
/// Text with fewer units than the shingle size produces a single shingle containing all of
/// them, so short texts still have a non-empty feature set. Empty text produces nothing.
///
/// # Examples
///
/// ```
/// use text_sketch::similarity::{ShingleConfig, ShingleKind, Shingler};
///
/// let shingler = Shingler::new(ShingleConfig {
///     kind: ShingleKind::Word,
///     size: 2,
///     normalize: true,
/// })
/// .unwrap();
///
/// let shingles = shingler.shingles("The cat sat.");
/// assert_eq!(shingles.len(), 2);
/// assert!(shingles.contains("the cat"));
/// assert!(shingles.contains("cat sat"));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate", try_from = "ShingleConfig", into = "ShingleConfig")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shingler {
    config: ShingleConfig,
}

impl TryFrom<ShingleConfig> for Shingler {
    type Error = Error;

    fn try_from(config: ShingleConfig) -> Result<Self> {
        Shingler::new(config)
    }
}

impl From<Shingler> for ShingleConfig {
    fn from(shingler: Shingler) -> Self {
        shingler.config
    }
}

impl Shingler {
    /// Constructs a new `Shingler`. Fails if `config.size` is zero.
    pub fn new(config: ShingleConfig) -> Result<Self> {
        if config.size == 0 {
            return Err(Error::InvalidConfig(
                "shingle size must be at least 1".to_string(),
            ));
        }
        Ok(Shingler { config })
    }

    /// Returns the configuration of the `Shingler`.
    pub fn config(&self) -> &ShingleConfig {
        &self.config
    }

    /// Returns the shingles of `text` in order of appearance, duplicates included.
    pub fn shingle_list(&self, text: &str) -> Vec<String> {
        let prepared = if self.config.normalize {
            normalize(text)
        } else {
            text.to_string()
        };

        match self.config.kind {
            ShingleKind::Word => {
                let words: Vec<&str> = prepared.split_whitespace().collect();
                if words.is_empty() {
                    return Vec::new();
                }
                if words.len() < self.config.size {
                    return vec![words.join(" ")];
                }
                ShingleIterator::new(self.config.size, words)
                    .map(|shingle| shingle.join(" "))
                    .collect()
            }
            ShingleKind::Char => {
                let chars: Vec<char> = prepared.chars().collect();
                if chars.is_empty() {
                    return Vec::new();
                }
                if chars.len() < self.config.size {
                    return vec![prepared];
                }
                chars
                    .windows(self.config.size)
                    .map(|window| window.iter().collect())
                    .collect()
            }
        }
    }

    /// Returns the deduplicated shingle set of `text`.
    pub fn shingles(&self, text: &str) -> HashSet<String> {
        HashSet::from_iter(self.shingle_list(text))
    }

    /// Returns every shingle of `text` mapped to the number of times it occurs.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::similarity::{ShingleConfig, ShingleKind, Shingler};
    ///
    /// let shingler = Shingler::new(ShingleConfig {
    ///     kind: ShingleKind::Word,
    ///     size: 1,
    ///     normalize: true,
    /// })
    /// .unwrap();
    ///
    /// let frequencies = shingler.frequencies("to be or not to be");
    /// assert_eq!(frequencies["to"], 2.0);
    /// assert_eq!(frequencies["or"], 1.0);
    /// ```
    pub fn frequencies(&self, text: &str) -> HashMap<String, f64> {
        let mut frequencies = HashMap::new();
        for shingle in self.shingle_list(text) {
            *frequencies.entry(shingle).or_insert(0.0) += 1.0;
        }
        frequencies
    }
}

impl Default for Shingler {
    fn default() -> Self {
        Shingler {
            config: ShingleConfig::default(),
        }
    }
}

/// Computes the Jaccard Similarity between two iterators. The Jaccard Similarity is the quotient
/// between the intersection and the union. Two empty inputs are considered identical.
///
/// # Examples
///
/// ```
/// use text_sketch::similarity::{get_jaccard_similarity, ShingleIterator};
///
/// assert_eq!(
///     get_jaccard_similarity(
///         ShingleIterator::new(2, "the cat sat on a mat".split(' ').collect()),
///         ShingleIterator::new(2, "the cat sat on the mat".split(' ').collect()),
///     ),
///     3.0 / 7.0,
/// );
/// ```
pub fn get_jaccard_similarity<T, U>(iter_1: T, iter_2: T) -> f64
where
    T: Iterator<Item = U>,
    U: Hash + Eq,
{
    let h1 = HashSet::<U>::from_iter(iter_1);
    let h2 = HashSet::<U>::from_iter(iter_2);

    let union = h1.union(&h2).count();
    if union == 0 {
        return 1.0;
    }
    (h1.intersection(&h2).count() as f64) / (union as f64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{get_jaccard_similarity, normalize, ShingleConfig, ShingleIterator, ShingleKind};
    use super::Shingler;
    use std::iter;

    pub static S1: &str = "the cat sat on a mat";
    pub static S2: &str = "the cat sat on the mat";
    pub static S3: &str = "we all scream for ice cream";

    #[test]
    fn test_jaccard_similarity() {
        assert_eq!(
            get_jaccard_similarity(
                ShingleIterator::new(2, S1.split(' ').collect()),
                ShingleIterator::new(2, S2.split(' ').collect()),
            ),
            3.0 / 7.0,
        );

        assert_eq!(
            get_jaccard_similarity(
                ShingleIterator::new(2, S1.split(' ').collect()),
                ShingleIterator::new(2, S3.split(' ').collect()),
            ),
            0.0 / 7.0,
        );
    }

    #[test]
    fn test_jaccard_similarity_empty() {
        assert_eq!(
            get_jaccard_similarity(iter::empty::<u32>(), iter::empty::<u32>()),
            1.0
        );
    }

    #[test]
    fn test_shingle_iterator_short_input() {
        let mut shingle_iter = ShingleIterator::new(3, vec!["a", "b"]);
        assert_eq!(shingle_iter.next(), None);

        let mut shingle_iter = ShingleIterator::<str>::new(1, Vec::new());
        assert_eq!(shingle_iter.next(), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Hello,   WORLD!\n"), "hello world");
        assert_eq!(normalize("  "), "");
    }

    #[test]
    fn test_word_shingles() {
        let shingler = Shingler::default();
        let shingles = shingler.shingles(S1);

        assert_eq!(shingles.len(), 4);
        assert!(shingles.contains("the cat sat"));
        assert!(shingles.contains("on a mat"));
    }

    #[test]
    fn test_word_shingles_short_text() {
        let shingler = Shingler::default();
        let shingles = shingler.shingles("Hello there");

        assert_eq!(shingles.len(), 1);
        assert!(shingles.contains("hello there"));
        assert!(shingler.shingles("").is_empty());
    }

    #[test]
    fn test_char_shingles() {
        let shingler = Shingler::new(ShingleConfig {
            kind: ShingleKind::Char,
            size: 3,
            normalize: false,
        })
        .unwrap();

        assert_eq!(shingler.shingle_list("abcd"), vec!["abc", "bcd"]);
        assert_eq!(shingler.shingle_list("ab"), vec!["ab"]);
    }

    #[test]
    fn test_frequencies() {
        let shingler = Shingler::new(ShingleConfig {
            kind: ShingleKind::Char,
            size: 2,
            normalize: true,
        })
        .unwrap();

        let frequencies = shingler.frequencies("abab");
        assert_eq!(frequencies.len(), 2);
        assert_eq!(frequencies["ab"], 2.0);
        assert_eq!(frequencies["ba"], 1.0);
    }

    #[test]
    fn test_zero_size() {
        assert!(Shingler::new(ShingleConfig {
            kind: ShingleKind::Word,
            size: 0,
            normalize: true,
        })
        .is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_ser_de() {
        let shingler = Shingler::new(ShingleConfig {
            kind: ShingleKind::Char,
            size: 2,
            normalize: false,
        })
        .unwrap();
        let serialized_shingler = bincode::serialize(&shingler).unwrap();
        let de_shingler: Shingler = bincode::deserialize(&serialized_shingler).unwrap();
        assert_eq!(shingler, de_shingler);

        let serialized_config = bincode::serialize(&ShingleConfig {
            kind: ShingleKind::Word,
            size: 0,
            normalize: true,
        })
        .unwrap();
        assert!(bincode::deserialize::<Shingler>(&serialized_config).is_err());
    }
}
