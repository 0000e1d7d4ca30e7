//! Exact k-nearest-neighbor search under cosine distance.

use crate::vectorizer::{FeatureMatrix, SparseVector};
use data_loader::ItemIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Distance assigned when either vector has no tokens.
///
/// Count vectors are non-negative, so cosine distance never exceeds 1.0;
/// an empty blob is as far from everything as an orthogonal one.
pub const MAX_COSINE_DISTANCE: f64 = 1.0;

/// `1 - u·v / (|u| |v|)`, or [`MAX_COSINE_DISTANCE`] if either norm is zero.
///
/// Never NaN. Clamped to `[0, MAX_COSINE_DISTANCE]` so rounding cannot push
/// identical vectors below zero.
pub fn cosine_distance(u: &SparseVector, v: &SparseVector) -> f64 {
    if u.is_zero() || v.is_zero() {
        return MAX_COSINE_DISTANCE;
    }
    // sqrt(|u|²|v|²) rather than |u|·|v|: exact for identical vectors
    let denominator = (u.squared_norm() as f64 * v.squared_norm() as f64).sqrt();
    let similarity = u.dot(v) as f64 / denominator;
    (1.0 - similarity).clamp(0.0, MAX_COSINE_DISTANCE)
}

/// A catalog item and its distance to the query item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub index: ItemIndex,
    pub distance: f64,
}

/// Ascending distance, then ascending index.
///
/// Total order (indices are unique), so ranking is deterministic.
fn rank(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.index.cmp(&b.index))
}

/// Brute-force neighbor search over every row of a feature matrix.
///
/// O(rows × average non-zeros) per query; distances are computed in parallel.
#[derive(Debug, Clone)]
pub struct BruteForceNeighbors {
    matrix: Arc<FeatureMatrix>,
}

impl BruteForceNeighbors {
    pub fn new(matrix: Arc<FeatureMatrix>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    /// Distance from `seed` to every other row, in index order.
    ///
    /// `None` if `seed` is not a row of the matrix.
    pub fn distances(&self, seed: ItemIndex) -> Option<Vec<Neighbor>> {
        let query = self.matrix.row(seed)?;
        let neighbors = self
            .matrix
            .rows()
            .par_iter()
            .enumerate()
            .filter(|(index, _)| *index != seed)
            .map(|(index, row)| Neighbor {
                index,
                distance: cosine_distance(query, row),
            })
            .collect();
        Some(neighbors)
    }

    /// The `k` rows closest to `seed`, closest first, never `seed` itself.
    ///
    /// Ties on distance keep catalog index order. Returns fewer than `k`
    /// only when the matrix has fewer than `k + 1` rows; `None` if `seed` is
    /// not a row of the matrix.
    pub fn kneighbors(&self, seed: ItemIndex, k: usize) -> Option<Vec<Neighbor>> {
        let mut neighbors = self.distances(seed)?;

        if k == 0 {
            return Some(Vec::new());
        }
        if k < neighbors.len() {
            // Partition around the k-th element, then only sort the head
            neighbors.select_nth_unstable_by(k - 1, rank);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(rank);
        Some(neighbors)
    }
}
