//! Title resolution and recommendation queries.
//!
//! ## Algorithm
//! 1. Resolve the seed title to its catalog index (exact match)
//! 2. Vectorize every item's feature blob (bag of words)
//! 3. Cosine distance from the seed to every other item
//! 4. Rank by ascending distance, ties in catalog index order
//! 5. Return the first `k` titles
//!
//! Steps 2 and 3's matrix can be precomputed once per catalog snapshot as a
//! [`FeatureIndex`]; `recommend` (fresh vectorization) and
//! `recommend_with_index` (precomputed) share the same query path and return
//! identical results.

use crate::corpus::FeatureCorpus;
use crate::error::{RecommendError, Result};
use crate::neighbors::{BruteForceNeighbors, Neighbor};
use crate::vectorizer::{CountVectorizer, FeatureMatrix};
use data_loader::{Catalog, CatalogFingerprint, ItemIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default number of recommendations
pub const DEFAULT_K: usize = 5;

/// One recommended item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub index: ItemIndex,
    pub title: String,
    /// Cosine distance to the seed item (0 = same tokens, 1 = nothing shared)
    pub distance: f64,
}

/// Vectorized features of one catalog snapshot, ready for queries.
#[derive(Debug, Clone)]
pub struct FeatureIndex {
    fingerprint: CatalogFingerprint,
    neighbors: BruteForceNeighbors,
}

impl FeatureIndex {
    /// Build the corpus and vectorize it
    pub fn build(catalog: &Catalog) -> Self {
        Self::from_corpus(&FeatureCorpus::from_catalog(catalog))
    }

    /// Vectorize an existing corpus
    pub fn from_corpus(corpus: &FeatureCorpus) -> Self {
        let matrix = CountVectorizer::new().fit_transform(corpus);
        Self {
            fingerprint: corpus.fingerprint(),
            neighbors: BruteForceNeighbors::new(Arc::new(matrix)),
        }
    }

    /// Fingerprint of the catalog this index was built from
    pub fn fingerprint(&self) -> CatalogFingerprint {
        self.fingerprint
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        self.neighbors.matrix()
    }

    pub fn neighbors(&self) -> &BruteForceNeighbors {
        &self.neighbors
    }

    /// Fail unless this index was built from `catalog`
    pub fn ensure_matches(&self, catalog: &Catalog) -> Result<()> {
        if self.fingerprint != catalog.fingerprint() {
            return Err(RecommendError::StaleIndex {
                expected: catalog.fingerprint(),
                found: self.fingerprint,
            });
        }
        Ok(())
    }
}

/// Title -> catalog index, exact match only
pub fn resolve_title(catalog: &Catalog, title: &str) -> Result<ItemIndex> {
    catalog
        .get_index(title)
        .ok_or_else(|| RecommendError::TitleNotFound {
            title: title.to_string(),
        })
}

/// The `k` titles most similar to `title`, most similar first.
///
/// Vectorizes `corpus` from scratch. Fails with `TitleNotFound` if `title` is
/// not in `catalog`, `InsufficientData` if `k >= catalog.len()`, and
/// `StaleIndex` if `corpus` was built from another catalog.
pub fn recommend(
    catalog: &Catalog,
    corpus: &FeatureCorpus,
    title: &str,
    k: usize,
) -> Result<Vec<String>> {
    let neighbors = recommend_neighbors(catalog, corpus, title, k)?;
    Ok(neighbors.into_iter().map(|r| r.title).collect())
}

/// [`recommend`] with item indices and distances
pub fn recommend_neighbors(
    catalog: &Catalog,
    corpus: &FeatureCorpus,
    title: &str,
    k: usize,
) -> Result<Vec<Recommendation>> {
    if corpus.fingerprint() != catalog.fingerprint() {
        return Err(RecommendError::StaleIndex {
            expected: catalog.fingerprint(),
            found: corpus.fingerprint(),
        });
    }
    let index = FeatureIndex::from_corpus(corpus);
    query(&index, catalog, title, k)
}

/// [`recommend`] against a precomputed [`FeatureIndex`]
pub fn recommend_with_index(
    index: &FeatureIndex,
    catalog: &Catalog,
    title: &str,
    k: usize,
) -> Result<Vec<String>> {
    let neighbors = recommend_neighbors_with_index(index, catalog, title, k)?;
    Ok(neighbors.into_iter().map(|r| r.title).collect())
}

/// [`recommend_with_index`] with item indices and distances
pub fn recommend_neighbors_with_index(
    index: &FeatureIndex,
    catalog: &Catalog,
    title: &str,
    k: usize,
) -> Result<Vec<Recommendation>> {
    index.ensure_matches(catalog)?;
    query(index, catalog, title, k)
}

#[instrument(skip(index, catalog), fields(catalog_size = catalog.len()))]
fn query(index: &FeatureIndex, catalog: &Catalog, title: &str, k: usize) -> Result<Vec<Recommendation>> {
    let seed = resolve_title(catalog, title)?;

    if k >= catalog.len() {
        return Err(RecommendError::InsufficientData {
            requested: k,
            available: catalog.len().saturating_sub(1),
        });
    }

    // Fingerprints matched, so the seed is a row of the matrix
    let neighbors: Vec<Neighbor> = index
        .neighbors()
        .kneighbors(seed, k)
        .ok_or(RecommendError::StaleIndex {
            expected: catalog.fingerprint(),
            found: index.fingerprint(),
        })?;

    let recommendations: Vec<Recommendation> = neighbors
        .into_iter()
        .filter_map(|neighbor| {
            let title = catalog.get_title(neighbor.index)?;
            Some(Recommendation {
                index: neighbor.index,
                title: title.to_string(),
                distance: neighbor.distance,
            })
        })
        .collect();

    debug!(
        "Seed #{} -> {} recommendations",
        seed,
        recommendations.len()
    );
    Ok(recommendations)
}
