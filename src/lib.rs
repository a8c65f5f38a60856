//! # text-sketch
//!
//! `text-sketch` estimates and indexes text similarity without comparing full documents
//! pairwise. It provides two alternative strategies for deduplication, clustering and
//! approximate nearest neighbor retrieval:
//!
//!  - [`similarity::MinHasher`] produces fixed-length integer signatures whose equal-position
//!    fraction estimates the Jaccard similarity of two shingle sets, and [`lsh::LshBuckets`]
//!    indexes those signatures by band for sub-linear candidate retrieval.
//!  - [`similarity::SimHasher`] produces fixed-width bit fingerprints by weighted bit voting,
//!    compared by Hamming distance with linear search and greedy clustering.
//!
//! Hashers are immutable after construction and can be shared between threads. The LSH index is
//! the only mutable structure; [`lsh::SharedLshBuckets`] wraps it in a readers-writer lock.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! text-sketch = "*"
//! ```
//!
//! ```rust
//! use text_sketch::lsh::{LshBuckets, SearchOptions};
//! use text_sketch::similarity::{MinHasher, SimHasher};
//!
//! let min_hasher = MinHasher::new(128).unwrap();
//! let mut index = LshBuckets::with_threshold(0.6, min_hasher.num_hashes()).unwrap();
//! index
//!     .add("doc-1", min_hasher.compute_text_signature("the cat sat on the mat today"))
//!     .unwrap();
//!
//! let query = min_hasher.compute_text_signature("the cat sat on the mat today");
//! let results = index.search(&query, SearchOptions::default()).unwrap();
//! assert_eq!(results[0].item, &"doc-1");
//!
//! let sim_hasher = SimHasher::new(64).unwrap();
//! let fingerprint = sim_hasher.compute_from_text("the cat sat on the mat today");
//! let encoded = sim_hasher.to_hex_string(fingerprint);
//! assert_eq!(sim_hasher.from_hex_string(&encoded).unwrap(), fingerprint);
//! ```
//!
//! ## References
//!
//!  - [On the resemblance and containment of documents](https://doi.org/10.1109/SEQUEN.1997.666900)
//!  > Broder, Andrei Z. 1997. “On the Resemblance and Containment of Documents.” In *Proceedings of Compression and Complexity of Sequences 1997*, 21–29. IEEE.
//!  - [Similarity estimation techniques from rounding algorithms](https://dl.acm.org/citation.cfm?id=509965)
//!  > Charikar, Moses S. 2002. “Similarity Estimation Techniques from Rounding Algorithms.” In *Proceedings of the Thiry-Fourth Annual ACM Symposium on Theory of Computing*, 380–88. STOC ’02. New York, NY, USA: ACM. doi:[10.1145/509907.509965](https://doi.org/10.1145/509907.509965).
//!  - [Mining of Massive Datasets, chapter 3](http://www.mmds.org/)
//!  > Leskovec, Jure, Anand Rajaraman, and Jeffrey D. Ullman. 2014. *Mining of Massive Datasets*. 2nd ed. Cambridge University Press.
//!  - [Detecting near-duplicates for web crawling](https://dl.acm.org/citation.cfm?id=1242592)
//!  > Manku, Gurmeet Singh, Arvind Jain, and Anish Das Sarma. 2007. “Detecting Near-Duplicates for Web Crawling.” In *Proceedings of the 16th International Conference on World Wide Web*, 141–50. WWW ’07. New York, NY, USA: ACM. doi:[10.1145/1242572.1242592](https://doi.org/10.1145/1242572.1242592).

#![warn(missing_docs)]

pub mod error;
pub mod lsh;
pub mod similarity;
mod util;

pub use crate::error::{Error, Result};
pub use crate::util::SipHasherBuilder;
