//! Errors returned by recommendation queries.

use data_loader::CatalogFingerprint;
use thiserror::Error;

/// Failures of a recommendation query.
///
/// `TitleNotFound` and `InsufficientData` are recoverable by the caller
/// (re-prompt, or ask for fewer neighbors). The core never substitutes a
/// best-guess title or returns a short list instead of failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    /// The seed title is not in the catalog (exact match only)
    #[error("Title not found in catalog: '{title}'")]
    TitleNotFound { title: String },

    /// `k` neighbors were requested from a catalog with too few items
    #[error("Cannot recommend {requested} movies, only {available} other movies in the catalog")]
    InsufficientData { requested: usize, available: usize },

    /// Precomputed features belong to a different catalog snapshot
    #[error("Feature index built for catalog {found}, queried with catalog {expected}")]
    StaleIndex {
        expected: CatalogFingerprint,
        found: CatalogFingerprint,
    },
}

pub type Result<T> = std::result::Result<T, RecommendError>;
