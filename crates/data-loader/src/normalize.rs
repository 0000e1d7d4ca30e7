//! Turning raw rows into a catalog.
//!
//! The only rewrite applied to display data is title deduplication: every
//! member of a group of identical titles becomes `"{title} ({release_date})"`,
//! so a title always resolves to exactly one index.

use crate::config::LoaderConfig;
use crate::error::DataIntegrityError;
use crate::types::{Catalog, CatalogItem, RawRecord};
use std::collections::HashMap;

/// Validate, deduplicate and index raw rows with the default configuration.
///
/// `index` of each item is its position in `raw`. Fails if any record has no
/// title, or if two records still collide after date-suffixing.
pub fn load_and_normalize(raw: Vec<RawRecord>) -> Result<Catalog, DataIntegrityError> {
    load_and_normalize_with(raw, &LoaderConfig::default())
}

/// Same as [`load_and_normalize`], recording `config.fold_terms` on the catalog.
pub fn load_and_normalize_with(
    raw: Vec<RawRecord>,
    config: &LoaderConfig,
) -> Result<Catalog, DataIntegrityError> {
    // Titles are required before anything else is looked at
    for (row, record) in raw.iter().enumerate() {
        let has_title = record
            .title
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty());
        if !has_title {
            return Err(DataIntegrityError::MissingField {
                row,
                field: "title".to_string(),
            });
        }
    }

    let pairs: Vec<(&str, &str)> = raw
        .iter()
        .map(|record| {
            (
                record.title.as_deref().unwrap_or_default(),
                record.release_date.as_deref().unwrap_or_default(),
            )
        })
        .collect();
    let titles = deduplicate_titles(&pairs);

    let items = raw
        .into_iter()
        .zip(titles)
        .enumerate()
        .map(|(index, (record, title))| to_item(index, title, record))
        .collect();

    Catalog::from_items(items, config.fold_terms)
}

/// Deduplicated display titles for `(title, release_date)` pairs, in input order.
pub fn deduplicate_titles(pairs: &[(&str, &str)]) -> Vec<String> {
    let mut group_sizes: HashMap<&str, usize> = HashMap::new();
    for (title, _) in pairs {
        *group_sizes.entry(*title).or_insert(0) += 1;
    }

    pairs
        .iter()
        .map(|(title, release_date)| {
            if group_sizes.get(title).copied().unwrap_or(0) >= 2 {
                format!("{} ({})", title, release_date)
            } else {
                title.to_string()
            }
        })
        .collect()
}

fn to_item(index: usize, title: String, record: RawRecord) -> CatalogItem {
    CatalogItem {
        index,
        title,
        release_date: record.release_date.unwrap_or_default(),
        keywords: record.keywords.unwrap_or_default(),
        actors: record.actors.unwrap_or_default(),
        director: record.director.unwrap_or_default(),
        genres: record.genres.unwrap_or_default(),
        image_url: record.image_url.unwrap_or_default(),
        overview: record.overview.unwrap_or_default(),
        trailer_url: record.trailer_url.unwrap_or_default(),
        tagline: record.tagline.unwrap_or_default(),
        runtime: record.runtime,
        rating_avg: record.rating_avg,
        rating_vote: record.rating_vote,
        popularity: record.popularity,
        extra: record.extra,
    }
}

/// Lowercase and replace every non-alphanumeric character with a space.
///
/// Applied to feature text only (never to display fields) when the catalog
/// was loaded with `fold_terms`:
/// "Science-Fiction, Drame" -> "science fiction  drame"
pub fn fold_terms(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
}
