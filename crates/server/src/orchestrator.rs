//! # Recommendation Orchestrator
//!
//! Coordinates one "more like this" query over the current catalog snapshot:
//! 1. Take the current `Arc<Catalog>`
//! 2. Fetch (or build) the feature index for it from the shared cache
//! 3. Resolve the seed title and rank its nearest neighbors
//! 4. Attach display metadata and an explanation to each result
//!
//! The orchestrator is cheap to clone; clones share the catalog slot and the
//! index cache, so a `replace_catalog` on one is seen by all.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use data_loader::{Catalog, CatalogItem, ItemIndex};
use similarity::{
    DEFAULT_K, FeatureIndex, IndexCache, Recommendation, recommend_neighbors_with_index,
};

/// Most shared tokens listed in an explanation
const MAX_EXPLAINED_TOKENS: usize = 5;

/// Final recommendation returned to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecommendation {
    /// 1-based position in the result list
    pub rank: usize,
    pub index: ItemIndex,
    pub title: String,
    pub release_date: String,
    pub genres: Vec<String>,
    pub image_url: String,
    pub distance: f64,
    /// `1 - distance`
    pub similarity: f64,
    pub explanation: String,
}

/// Shared entry point for recommendation queries
#[derive(Debug, Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<RwLock<Arc<Catalog>>>,
    cache: Arc<IndexCache>,
    default_k: usize,
}

impl RecommendationOrchestrator {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(Arc::new(catalog))),
            cache: Arc::new(IndexCache::new()),
            default_k: DEFAULT_K,
        }
    }

    /// Override the number of results used when a caller has no preference
    pub fn with_default_k(mut self, default_k: usize) -> Self {
        self.default_k = default_k;
        self
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// The current catalog snapshot
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new catalog snapshot.
    ///
    /// Queries already running keep the snapshot they started with. The next
    /// query rebuilds the index because the fingerprint changed.
    pub fn replace_catalog(&self, catalog: Catalog) {
        let fingerprint = catalog.fingerprint();
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        info!("Catalog replaced, new snapshot {}", fingerprint);
    }

    /// Exact title lookup in the current snapshot
    pub fn resolve_title(&self, title: &str) -> Result<ItemIndex> {
        Ok(similarity::resolve_title(&self.catalog(), title)?)
    }

    /// Titles only, most similar first
    pub fn recommend_titles(&self, title: &str, k: usize) -> Result<Vec<String>> {
        let (_, _, neighbors) = self.query(title, k)?;
        Ok(neighbors.into_iter().map(|r| r.title).collect())
    }

    /// Main entry point: the `k` items most similar to `title`
    ///
    /// # Returns
    /// Vector of MovieRecommendation, most similar first. Errors are
    /// `similarity::RecommendError` values and can be downcast.
    pub fn get_recommendations(&self, title: &str, k: usize) -> Result<Vec<MovieRecommendation>> {
        let start_time = Instant::now();

        let (catalog, index, neighbors) = self.query(title, k)?;
        let seed = similarity::resolve_title(&catalog, title)?;

        let recommendations: Vec<MovieRecommendation> = neighbors
            .into_iter()
            .enumerate()
            .filter_map(|(position, neighbor)| {
                let item = catalog.get_item(neighbor.index)?;
                Some(to_recommendation(position + 1, item, &neighbor, &index, seed))
            })
            .collect();

        info!(
            "Total time to get {} recommendations for '{}': {:.2?}",
            recommendations.len(),
            title,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    fn query(
        &self,
        title: &str,
        k: usize,
    ) -> Result<(Arc<Catalog>, Arc<FeatureIndex>, Vec<Recommendation>)> {
        self.query_on(self.catalog(), title, k)
    }

    /// Query a given snapshot. If `replace_catalog` ran meanwhile, the index
    /// built for `catalog` serves this query only and is not cached.
    fn query_on(
        &self,
        catalog: Arc<Catalog>,
        title: &str,
        k: usize,
    ) -> Result<(Arc<Catalog>, Arc<FeatureIndex>, Vec<Recommendation>)> {
        let start = Instant::now();
        let index = self
            .cache
            .get_or_build_if_current(&catalog, || Arc::ptr_eq(&catalog, &self.catalog()));
        debug!("Feature index ready in {:.2?}", start.elapsed());

        let neighbors = recommend_neighbors_with_index(&index, &catalog, title, k)?;
        Ok((catalog, index, neighbors))
    }
}

fn to_recommendation(
    rank: usize,
    item: &CatalogItem,
    neighbor: &Recommendation,
    index: &FeatureIndex,
    seed: ItemIndex,
) -> MovieRecommendation {
    MovieRecommendation {
        rank,
        index: item.index,
        title: item.title.clone(),
        release_date: item.release_date.clone(),
        genres: item.genre_list().map(str::to_string).collect(),
        image_url: item.image_url.clone(),
        distance: neighbor.distance,
        similarity: 1.0 - neighbor.distance,
        explanation: explain(index, seed, item.index),
    }
}

/// Feature tokens the seed and the candidate have in common
fn shared_tokens(index: &FeatureIndex, seed: ItemIndex, other: ItemIndex) -> Vec<String> {
    let matrix = index.matrix();
    let (Some(seed_row), Some(other_row)) = (matrix.row(seed), matrix.row(other)) else {
        return Vec::new();
    };

    let seed_columns: BTreeSet<usize> = seed_row.entries().iter().map(|&(c, _)| c).collect();
    other_row
        .entries()
        .iter()
        .filter(|(column, _)| seed_columns.contains(column))
        .filter_map(|&(column, _)| matrix.vocabulary().token_at(column))
        .map(str::to_string)
        .collect()
}

fn explain(index: &FeatureIndex, seed: ItemIndex, other: ItemIndex) -> String {
    let shared = shared_tokens(index, seed, other);
    if shared.is_empty() {
        return "No shared keywords, cast, director or genres".to_string();
    }

    let mut listed: Vec<&str> = shared
        .iter()
        .take(MAX_EXPLAINED_TOKENS)
        .map(String::as_str)
        .collect();
    if shared.len() > MAX_EXPLAINED_TOKENS {
        listed.push("...");
    }
    format!("Shares {} terms: {}", shared.len(), listed.join(", "))
}
