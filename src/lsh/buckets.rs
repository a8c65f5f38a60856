use crate::error::{self, Error, Result};
use crate::lsh::{find_optimal_bands, BandConfig};
use crate::similarity::signature_similarity;
use crate::util;
use crate::SipHasherBuilder;
use log::{debug, trace};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
#[cfg(feature = "serde")]
use std::convert::TryFrom;
use std::hash::BuildHasher;

/// Configuration for an [`LshBuckets`] index.
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LshConfig {
    /// Number of bands each signature is split into.
    pub num_bands: usize,
    /// Length of every indexed signature. Must match the `MinHasher`'s number of hashes.
    pub signature_length: usize,
}

impl Default for LshConfig {
    fn default() -> Self {
        LshConfig {
            num_bands: 16,
            signature_length: 128,
        }
    }
}

/// Options for [`LshBuckets::search`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchOptions {
    /// Smallest estimated similarity a result may have, within `[0, 1]`.
    pub threshold: f64,
    /// Maximum number of results, all of them if `None`.
    pub max_results: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            threshold: 0.5,
            max_results: None,
        }
    }
}

/// A ranked result of [`LshBuckets::search`].
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult<I> {
    /// Id assigned to the item when it was added.
    pub id: usize,
    /// The indexed item.
    pub item: I,
    /// MinHash estimate of the Jaccard similarity to the query. This is the equal-position
    /// fraction of the two signatures, not an exact Jaccard similarity.
    pub similarity: f64,
}

/// Occupancy statistics of an [`LshBuckets`] index.
#[derive(Clone, Debug, PartialEq)]
pub struct LshStats {
    /// Number of indexed items.
    pub items: usize,
    /// Number of non-empty buckets over all bands.
    pub buckets: usize,
    /// Number of ids in the fullest bucket.
    pub max_bucket_size: usize,
    /// Mean number of ids per non-empty bucket.
    pub mean_bucket_size: f64,
}

#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
struct Record<T> {
    item: T,
    signature: Vec<u64>,
}

/// An index of MinHash signatures that retrieves similar items in sub-linear time.
///
/// Every signature is split into `num_bands` bands of `rows_per_band` rows. Each band is hashed
/// into that band's bucket table, and a query's candidates are the items sharing at least one
/// bucket with it. Two signatures with Jaccard similarity `s` become candidates with probability
/// `1 - (1 - s^r)^b`, an S-curve whose steepest point is tuned with [`find_optimal_bands`].
/// Candidates may include false positives, and an item added with the exact query signature is
/// always a candidate.
///
/// Items are stored by id and bucket tables hold ids only. Removing an item frees its storage.
/// Ids are assigned sequentially and are not reused until the index is cleared. To update an
/// item, remove it and add it again.
///
/// # Examples
///
/// ```
/// use text_sketch::lsh::{LshBuckets, SearchOptions};
/// use text_sketch::similarity::MinHasher;
///
/// let min_hasher = MinHasher::new(128).unwrap();
/// let mut index = LshBuckets::with_threshold(0.5, 128).unwrap();
///
/// let texts = vec![
///     "the quick brown fox jumps over the lazy dog",
///     "the quick brown fox jumps over the lazy cat",
///     "lorem ipsum dolor sit amet consectetur adipiscing elit",
/// ];
/// for text in &texts {
///     index.add(*text, min_hasher.compute_text_signature(text)).unwrap();
/// }
///
/// let query = min_hasher.compute_text_signature("the quick brown fox jumps over the lazy dog");
/// let results = index.search(&query, SearchOptions::default()).unwrap();
///
/// assert_eq!(results[0].id, 0);
/// assert_eq!(results[0].similarity, 1.0);
/// assert!(results.iter().all(|result| result.id != 2));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate", try_from = "LshBucketsData<T, B>")
)]
#[derive(Clone, Debug)]
pub struct LshBuckets<T, B = SipHasherBuilder> {
    num_bands: usize,
    rows_per_band: usize,
    signature_length: usize,
    hash_builder: B,
    buckets: Vec<HashMap<u64, HashSet<usize>>>,
    records: HashMap<usize, Record<T>>,
    next_id: usize,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(crate = "serde_crate")]
struct LshBucketsData<T, B> {
    num_bands: usize,
    rows_per_band: usize,
    signature_length: usize,
    hash_builder: B,
    buckets: Vec<HashMap<u64, HashSet<usize>>>,
    records: HashMap<usize, Record<T>>,
    next_id: usize,
}

#[cfg(feature = "serde")]
impl<T, B> TryFrom<LshBucketsData<T, B>> for LshBuckets<T, B> {
    type Error = Error;

    fn try_from(data: LshBucketsData<T, B>) -> Result<Self> {
        if data.num_bands == 0
            || data.rows_per_band == 0
            || data.rows_per_band != data.signature_length / data.num_bands
            || data.buckets.len() != data.num_bands
        {
            return Err(Error::InvalidConfig(format!(
                "inconsistent banding: {} bands of {} rows over signatures of length {}",
                data.num_bands, data.rows_per_band, data.signature_length
            )));
        }
        for (&id, record) in &data.records {
            if id >= data.next_id {
                return Err(Error::InvalidInput(format!(
                    "record id {} is not below the next id {}",
                    id, data.next_id
                )));
            }
            if record.signature.len() != data.signature_length {
                return Err(Error::LengthMismatch {
                    expected: data.signature_length,
                    got: record.signature.len(),
                });
            }
        }

        Ok(LshBuckets {
            num_bands: data.num_bands,
            rows_per_band: data.rows_per_band,
            signature_length: data.signature_length,
            hash_builder: data.hash_builder,
            buckets: data.buckets,
            records: data.records,
            next_id: data.next_id,
        })
    }
}

impl<T> LshBuckets<T> {
    /// Keys of the band hasher used by [`LshBuckets::new`].
    pub const DEFAULT_KEYS: (u64, u64) = (0x6c73_6862_616e_6430, 0x6c73_6862_616e_6431);

    /// Constructs a new, empty index of `signature_length` signatures split into `num_bands`
    /// bands of `signature_length / num_bands` rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `num_bands` is zero or larger than
    /// `signature_length`.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::lsh::LshBuckets;
    ///
    /// let index = LshBuckets::<String>::new(4, 10).unwrap();
    /// assert_eq!(index.rows_per_band(), 2);
    ///
    /// assert!(LshBuckets::<String>::new(11, 10).is_err());
    /// ```
    pub fn new(num_bands: usize, signature_length: usize) -> Result<Self> {
        let (k0, k1) = Self::DEFAULT_KEYS;
        Self::with_hasher(
            num_bands,
            signature_length,
            SipHasherBuilder::from_seed(k0, k1),
        )
    }

    /// Constructs a new, empty index from an [`LshConfig`].
    pub fn from_config(config: LshConfig) -> Result<Self> {
        Self::new(config.num_bands, config.signature_length)
    }

    /// Constructs a new, empty index whose banding is tuned so that pairs above `threshold`
    /// similarity are likely candidates.
    pub fn with_threshold(threshold: f64, signature_length: usize) -> Result<Self> {
        let config = find_optimal_bands(threshold, signature_length)?;
        Self::new(config.num_bands, signature_length)
    }

    /// Finds the banding whose S-curve threshold is closest to `threshold`. See
    /// [`find_optimal_bands`].
    pub fn find_optimal_bands(threshold: f64, signature_length: usize) -> Result<BandConfig> {
        find_optimal_bands(threshold, signature_length)
    }
}

impl<T, B> LshBuckets<T, B>
where
    B: BuildHasher,
{
    /// Constructs a new, empty index with a specified hasher builder for band keys.
    pub fn with_hasher(num_bands: usize, signature_length: usize, hash_builder: B) -> Result<Self> {
        if num_bands == 0 {
            return Err(Error::InvalidConfig(
                "number of bands must be at least 1".to_string(),
            ));
        }
        let rows_per_band = signature_length / num_bands;
        if rows_per_band < 1 {
            return Err(Error::InvalidConfig(format!(
                "{} bands do not fit in a signature of length {}",
                num_bands, signature_length
            )));
        }

        Ok(LshBuckets {
            num_bands,
            rows_per_band,
            signature_length,
            hash_builder,
            buckets: (0..num_bands).map(|_| HashMap::new()).collect(),
            records: HashMap::new(),
            next_id: 0,
        })
    }

    fn check_signature(&self, signature: &[u64]) -> Result<()> {
        if signature.len() != self.signature_length {
            return Err(Error::LengthMismatch {
                expected: self.signature_length,
                got: signature.len(),
            });
        }
        Ok(())
    }

    fn band_keys<'a>(&'a self, signature: &'a [u64]) -> impl Iterator<Item = u64> + 'a {
        signature
            .chunks_exact(self.rows_per_band)
            .take(self.num_bands)
            .map(move |band| util::hash(&self.hash_builder, &band))
    }

    /// Adds `item` with its MinHash signature and returns the id assigned to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the signature length differs from the index's.
    pub fn add(&mut self, item: T, signature: Vec<u64>) -> Result<usize> {
        self.check_signature(&signature)?;

        let id = self.next_id;
        let keys: Vec<u64> = self.band_keys(&signature).collect();
        for (band, key) in keys.into_iter().enumerate() {
            self.buckets[band].entry(key).or_default().insert(id);
        }
        self.records.insert(id, Record { item, signature });
        self.next_id += 1;

        trace!("added id {} to {} bands", id, self.num_bands);
        Ok(id)
    }

    /// Returns the ids of every item sharing at least one band bucket with `signature`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the signature length differs from the index's.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::lsh::LshBuckets;
    ///
    /// let mut index = LshBuckets::new(4, 8).unwrap();
    /// let id = index.add("item", vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    ///
    /// let candidates = index.get_candidates(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    /// assert!(candidates.contains(&id));
    ///
    /// let candidates = index.get_candidates(&[0, 2, 0, 4, 0, 6, 0, 8]).unwrap();
    /// assert!(candidates.is_empty());
    /// ```
    pub fn get_candidates(&self, signature: &[u64]) -> Result<HashSet<usize>> {
        self.check_signature(signature)?;

        let mut candidates = HashSet::new();
        for (band, key) in self.band_keys(signature).enumerate() {
            if let Some(ids) = self.buckets[band].get(&key) {
                candidates.extend(ids.iter().copied());
            }
        }
        Ok(candidates)
    }

    /// Returns the candidates of `signature` whose estimated similarity is at least
    /// `options.threshold`, most similar first, ties broken by ascending id.
    ///
    /// Band collisions only nominate candidates; each one is rescored with the MinHash estimator,
    /// which removes band false positives. The reported similarity is therefore itself an
    /// estimate of the Jaccard similarity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the signature length differs from the index's, and
    /// [`Error::InvalidConfig`] if the threshold is outside `[0, 1]`.
    pub fn search(
        &self,
        signature: &[u64],
        options: SearchOptions,
    ) -> Result<Vec<SearchResult<&T>>> {
        error::check_threshold("search threshold", options.threshold)?;
        let candidates = self.get_candidates(signature)?;

        let records = util::collect_valid(
            candidates.into_iter().map(|id| {
                self.records.get(&id).map(|record| (id, record))
            }),
            "lsh candidate",
        );

        let mut results = Vec::with_capacity(records.len());
        for (id, record) in records {
            let similarity = signature_similarity(signature, &record.signature)?;
            if similarity >= options.threshold {
                results.push(SearchResult {
                    id,
                    item: &record.item,
                    similarity,
                });
            }
        }

        results.sort_by(|result_1, result_2| {
            result_2
                .similarity
                .partial_cmp(&result_1.similarity)
                .unwrap_or(Ordering::Equal)
                .then(result_1.id.cmp(&result_2.id))
        });
        if let Some(max_results) = options.max_results {
            results.truncate(max_results);
        }
        Ok(results)
    }

    /// Removes the item with id `id` from the index and returns it, or `None` if no such item
    /// exists. Buckets left empty are deleted.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::lsh::LshBuckets;
    ///
    /// let mut index = LshBuckets::new(4, 8).unwrap();
    /// let id = index.add("item", vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    ///
    /// assert_eq!(index.remove(id), Some("item"));
    /// assert_eq!(index.remove(id), None);
    /// assert!(index.get_candidates(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap().is_empty());
    /// ```
    pub fn remove(&mut self, id: usize) -> Option<T> {
        let record = self.records.remove(&id)?;

        let keys: Vec<u64> = self.band_keys(&record.signature).collect();
        for (band, key) in keys.into_iter().enumerate() {
            let table = &mut self.buckets[band];
            if let Some(ids) = table.get_mut(&key) {
                ids.remove(&id);
                if ids.is_empty() {
                    table.remove(&key);
                }
            }
        }

        trace!("removed id {}", id);
        Some(record.item)
    }

    /// Removes every item and resets id assignment.
    pub fn clear(&mut self) {
        for table in &mut self.buckets {
            table.clear();
        }
        debug!("cleared index of {} items", self.records.len());
        self.records.clear();
        self.next_id = 0;
    }

    /// Returns a reference to the item with id `id`.
    pub fn get(&self, id: usize) -> Option<&T> {
        self.records.get(&id).map(|record| &record.item)
    }

    /// Returns the stored signature of the item with id `id`.
    pub fn signature(&self, id: usize) -> Option<&[u64]> {
        self.records
            .get(&id)
            .map(|record| record.signature.as_slice())
    }

    /// Returns an iterator over the ids and items of the index, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        let mut ids: Vec<usize> = self.records.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(move |id| self.records.get(&id).map(|record| (id, &record.item)))
    }

    /// Returns the probability that a signature with Jaccard similarity `similarity` to an
    /// indexed one becomes its candidate under this index's banding.
    pub fn estimate_collision_probability(&self, similarity: f64) -> f64 {
        self.band_config().collision_probability(similarity)
    }

    /// Returns occupancy statistics of the bucket tables.
    pub fn stats(&self) -> LshStats {
        let sizes = self.buckets.iter().flat_map(|table| table.values().map(HashSet::len));
        let (buckets, total, max_bucket_size) = sizes.fold((0, 0, 0), |(count, total, max), size| {
            (count + 1, total + size, usize::max(max, size))
        });

        LshStats {
            items: self.records.len(),
            buckets,
            max_bucket_size,
            mean_bucket_size: if buckets == 0 {
                0.0
            } else {
                total as f64 / buckets as f64
            },
        }
    }

    /// Returns the banding of the index.
    pub fn band_config(&self) -> BandConfig {
        BandConfig {
            num_bands: self.num_bands,
            rows_per_band: self.rows_per_band,
        }
    }

    /// Returns the number of items in the index.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the index contains no items.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of bands.
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Returns the number of rows in every band.
    pub fn rows_per_band(&self) -> usize {
        self.rows_per_band
    }

    /// Returns the signature length the index accepts.
    pub fn signature_length(&self) -> usize {
        self.signature_length
    }

    /// Returns a reference to the hasher builder of band keys.
    pub fn hasher(&self) -> &B {
        &self.hash_builder
    }
}
