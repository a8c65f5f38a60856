use crate::error::Result;
use crate::lsh::{LshBuckets, LshStats, SearchOptions, SearchResult};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::HashSet;
use std::sync::Arc;

/// A cloneable handle to an [`LshBuckets`] index shared between threads.
///
/// Mutations (`add`, `remove`, `clear`) take the write lock; queries take the read lock and
/// return owned data so no guard outlives the call.
///
/// # Examples
///
/// ```
/// use std::thread;
/// use text_sketch::lsh::SharedLshBuckets;
///
/// let index = SharedLshBuckets::new(4, 8).unwrap();
///
/// let handles: Vec<_> = (0..4u64)
///     .map(|i| {
///         let index = index.clone();
///         thread::spawn(move || index.add(i, vec![i; 8]).unwrap())
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(index.len(), 4);
/// ```
pub struct SharedLshBuckets<T> {
    inner: Arc<RwLock<LshBuckets<T>>>,
}

impl<T> SharedLshBuckets<T> {
    /// Constructs a new, empty shared index. See [`LshBuckets::new`].
    pub fn new(num_bands: usize, signature_length: usize) -> Result<Self> {
        Ok(Self::from_buckets(LshBuckets::new(num_bands, signature_length)?))
    }

    /// Wraps an existing index.
    pub fn from_buckets(buckets: LshBuckets<T>) -> Self {
        SharedLshBuckets {
            inner: Arc::new(RwLock::new(buckets)),
        }
    }

    /// Adds `item` with its signature and returns its id. See [`LshBuckets::add`].
    pub fn add(&self, item: T, signature: Vec<u64>) -> Result<usize> {
        self.inner.write().add(item, signature)
    }

    /// Removes and returns the item with id `id`. See [`LshBuckets::remove`].
    pub fn remove(&self, id: usize) -> Option<T> {
        self.inner.write().remove(id)
    }

    /// Removes every item. See [`LshBuckets::clear`].
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Returns the candidate ids of `signature`. See [`LshBuckets::get_candidates`].
    pub fn get_candidates(&self, signature: &[u64]) -> Result<HashSet<usize>> {
        self.inner.read().get_candidates(signature)
    }

    /// Returns the ranked matches of `signature` with cloned items. See [`LshBuckets::search`].
    pub fn search(&self, signature: &[u64], options: SearchOptions) -> Result<Vec<SearchResult<T>>>
    where
        T: Clone,
    {
        let buckets = self.inner.read();
        let results = buckets.search(signature, options)?;
        Ok(results
            .into_iter()
            .map(|result| SearchResult {
                id: result.id,
                item: result.item.clone(),
                similarity: result.similarity,
            })
            .collect())
    }

    /// Returns the number of items in the index.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if the index contains no items.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns occupancy statistics of the index.
    pub fn stats(&self) -> LshStats {
        self.inner.read().stats()
    }

    /// Locks the index for reading. Writers block until the guard is dropped.
    pub fn read(&self) -> RwLockReadGuard<'_, LshBuckets<T>> {
        self.inner.read()
    }
}

impl<T> Clone for SharedLshBuckets<T> {
    fn clone(&self) -> Self {
        SharedLshBuckets {
            inner: Arc::clone(&self.inner),
        }
    }
}
