//! # Similarity Crate
//!
//! Content-based "more like this" recommendations over a [`Catalog`].
//!
//! ## Components
//!
//! - **corpus**: one feature blob per item (keywords, actors, director, genres)
//! - **vectorizer**: bag-of-words count vectors over the corpus vocabulary
//! - **neighbors**: cosine distance and exact brute-force kNN
//! - **engine**: `resolve_title` / `recommend`, plus the precomputed `FeatureIndex`
//! - **cache**: `IndexCache`, one shared index per catalog snapshot
//!
//! ## Example Usage
//!
//! ```ignore
//! use similarity::{FeatureCorpus, IndexCache, recommend, recommend_with_index};
//!
//! // Literal contract: vectorize on every call
//! let corpus = FeatureCorpus::from_catalog(&catalog);
//! let titles = recommend(&catalog, &corpus, "Heat", 5)?;
//!
//! // Same output, vectorized once per snapshot
//! let cache = IndexCache::new();
//! let index = cache.get_or_build(&catalog);
//! let titles = recommend_with_index(&index, &catalog, "Heat", 5)?;
//! ```
//!
//! [`Catalog`]: data_loader::Catalog

pub mod cache;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod neighbors;
pub mod vectorizer;

// Re-export commonly used types
pub use cache::IndexCache;
pub use corpus::{FeatureCorpus, feature_blob};
pub use engine::{
    DEFAULT_K, FeatureIndex, Recommendation, recommend, recommend_neighbors,
    recommend_neighbors_with_index, recommend_with_index, resolve_title,
};
pub use error::{RecommendError, Result};
pub use neighbors::{BruteForceNeighbors, MAX_COSINE_DISTANCE, Neighbor, cosine_distance};
pub use vectorizer::{CountVectorizer, FeatureMatrix, SparseVector, Vocabulary};
