//! Core domain types for the movie catalog.
//!
//! - `RawRecord`: one dataset row as read, before any validation
//! - `CatalogItem`: one validated, deduplicated movie with a stable index
//! - `Catalog`: the ordered item set plus its lookup indices
//! - `CatalogFingerprint`: identifies a catalog snapshot for cache keys

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

// =============================================================================
// Type Aliases
// =============================================================================

/// Position of an item in the catalog (source row order, starting at 0)
pub type ItemIndex = usize;

// =============================================================================
// Raw rows
// =============================================================================

/// A dataset row exactly as read from the snapshot.
///
/// Every field is optional text at this stage; `load_and_normalize` decides
/// what is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub keywords: Option<String>,
    pub actors: Option<String>,
    pub director: Option<String>,
    pub genres: Option<String>,
    pub image_url: Option<String>,
    pub overview: Option<String>,
    pub trailer_url: Option<String>,
    pub tagline: Option<String>,
    pub runtime: Option<u32>,
    pub rating_avg: Option<f32>,
    pub rating_vote: Option<u32>,
    pub popularity: Option<f32>,
    /// Columns the loader does not know about, passed through untouched
    pub extra: BTreeMap<String, String>,
}

impl RawRecord {
    /// Start a record with the two identifying fields set
    pub fn new(title: impl Into<String>, release_date: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            release_date: Some(release_date.into()),
            ..Self::default()
        }
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn with_actors(mut self, actors: impl Into<String>) -> Self {
        self.actors = Some(actors.into());
        self
    }

    pub fn with_director(mut self, director: impl Into<String>) -> Self {
        self.director = Some(director.into());
        self
    }

    pub fn with_genres(mut self, genres: impl Into<String>) -> Self {
        self.genres = Some(genres.into());
        self
    }

    pub fn with_popularity(mut self, popularity: f32) -> Self {
        self.popularity = Some(popularity);
        self
    }

    pub fn with_rating(mut self, rating_avg: f32, rating_vote: u32) -> Self {
        self.rating_avg = Some(rating_avg);
        self.rating_vote = Some(rating_vote);
        self
    }
}

// =============================================================================
// Catalog items
// =============================================================================

/// One movie of the catalog.
///
/// `keywords`, `actors`, `director` and `genres` feed the similarity features;
/// everything else is display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub index: ItemIndex,
    /// Display title, unique within the catalog
    pub title: String,
    pub release_date: String,
    pub keywords: String,
    pub actors: String,
    pub director: String,
    pub genres: String,
    pub image_url: String,
    pub overview: String,
    pub trailer_url: String,
    pub tagline: String,
    pub runtime: Option<u32>,
    pub rating_avg: Option<f32>,
    pub rating_vote: Option<u32>,
    pub popularity: Option<f32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl CatalogItem {
    /// Genre names of this item ("Drame, Comédie" -> ["Drame", "Comédie"])
    pub fn genre_list(&self) -> impl Iterator<Item = &str> {
        self.genres
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }

    /// Title without the " (date)" suffix added by deduplication
    pub fn base_title(&self) -> &str {
        if self.release_date.is_empty() {
            return &self.title;
        }
        let suffix = format!(" ({})", self.release_date);
        self.title
            .strip_suffix(suffix.as_str())
            .unwrap_or(self.title.as_str())
    }
}

// =============================================================================
// Fingerprint
// =============================================================================

/// Identifies the content of a catalog snapshot.
///
/// Covers the item count, the term-folding policy and a hash of every title
/// and feature field in index order, so any change that could alter a
/// recommendation changes the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogFingerprint {
    pub item_count: usize,
    pub content_hash: u64,
}

impl CatalogFingerprint {
    pub fn of_items(items: &[CatalogItem], fold_terms: bool) -> Self {
        let mut hasher = DefaultHasher::new();
        fold_terms.hash(&mut hasher);
        for item in items {
            item.index.hash(&mut hasher);
            item.title.hash(&mut hasher);
            item.keywords.hash(&mut hasher);
            item.actors.hash(&mut hasher);
            item.director.hash(&mut hasher);
            item.genres.hash(&mut hasher);
        }
        Self {
            item_count: items.len(),
            content_hash: hasher.finish(),
        }
    }
}

impl std::fmt::Display for CatalogFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:016x}", self.item_count, self.content_hash)
    }
}

// =============================================================================
// Catalog - the in-memory snapshot
// =============================================================================

/// The deduplicated, indexed set of movies available for recommendation.
///
/// Immutable once built. `items[i].index == i` always holds, and
/// `title_index` is the exact inverse of `items[i].title`.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) items: Vec<CatalogItem>,
    /// Display title -> index
    pub(crate) title_index: HashMap<String, ItemIndex>,
    /// Genre name -> items carrying it, in index order
    pub(crate) genre_index: BTreeMap<String, Vec<ItemIndex>>,
    /// Whether feature text is folded (see `normalize::fold_terms`)
    pub(crate) fold_terms: bool,
    pub(crate) fingerprint: CatalogFingerprint,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in index order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get_item(&self, index: ItemIndex) -> Option<&CatalogItem> {
        self.items.get(index)
    }

    /// Index -> title
    pub fn get_title(&self, index: ItemIndex) -> Option<&str> {
        self.items.get(index).map(|item| item.title.as_str())
    }

    /// Title -> index (exact match only)
    pub fn get_index(&self, title: &str) -> Option<ItemIndex> {
        self.title_index.get(title).copied()
    }

    pub fn get_by_title(&self, title: &str) -> Option<&CatalogItem> {
        self.get_index(title).and_then(|index| self.items.get(index))
    }

    /// Items listing `genre` among their genres
    pub fn get_items_by_genre(&self, genre: &str) -> &[ItemIndex] {
        self.genre_index
            .get(genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Distinct genre names, sorted
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre_index.keys().map(String::as_str)
    }

    pub fn folds_terms(&self) -> bool {
        self.fold_terms
    }

    pub fn fingerprint(&self) -> CatalogFingerprint {
        self.fingerprint
    }
}
