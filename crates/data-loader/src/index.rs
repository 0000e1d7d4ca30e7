//! Catalog building and indexing logic.
//!
//! - Load a snapshot file end to end (parse, normalize, validate)
//! - Build the lookup indices (title -> index, genre -> items)
//! - Catalog-level queries used by the UI layer (search, top by genre)

use crate::config::LoaderConfig;
use crate::error::{DataIntegrityError, Result};
use crate::normalize::load_and_normalize_with;
use crate::parser;
use crate::types::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Genre excluded from every other genre's top list
const ANIMATION: &str = "Animation";

impl Catalog {
    /// Load a catalog snapshot from a delimited file.
    ///
    /// Steps:
    /// 1. Parse the file into raw records
    /// 2. Validate titles and deduplicate them
    /// 3. Build lookup indices and validate the result
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_from_file(path: &Path, config: &LoaderConfig) -> Result<Self> {
        info!("Loading catalog snapshot from {:?}", path);

        let raw = parser::parse_catalog_file(path, config)?;
        debug!("Parsed {} raw records", raw.len());

        let catalog = load_and_normalize_with(raw, config)?;
        info!(
            "Catalog ready: {} movies, {} genres (fingerprint {})",
            catalog.len(),
            catalog.genre_index.len(),
            catalog.fingerprint
        );
        Ok(catalog)
    }

    /// Index items whose `index` and `title` are final.
    pub(crate) fn from_items(
        items: Vec<CatalogItem>,
        fold_terms: bool,
    ) -> std::result::Result<Self, DataIntegrityError> {
        let fingerprint = CatalogFingerprint::of_items(&items, fold_terms);
        let mut catalog = Catalog {
            items,
            title_index: HashMap::new(),
            genre_index: BTreeMap::new(),
            fold_terms,
            fingerprint,
        };
        catalog.build_title_index()?;
        catalog.build_secondary_indices();
        catalog.validate()?;
        Ok(catalog)
    }

    /// Build title -> index, rejecting any title that is still shared
    fn build_title_index(&mut self) -> std::result::Result<(), DataIntegrityError> {
        self.title_index.reserve(self.items.len());
        for item in &self.items {
            if let Some(&first) = self.title_index.get(&item.title) {
                return Err(DataIntegrityError::DuplicateTitle {
                    title: item.title.clone(),
                    first,
                    second: item.index,
                });
            }
            self.title_index.insert(item.title.clone(), item.index);
        }
        Ok(())
    }

    /// Build the genre index (one item can appear in several genre lists)
    fn build_secondary_indices(&mut self) {
        for item in &self.items {
            for genre in item.genre_list() {
                let members = self.genre_index.entry(genre.to_string()).or_default();
                // "Drame, Drame" must not list the item twice
                if members.last() != Some(&item.index) {
                    members.push(item.index);
                }
            }
        }
    }

    /// Check that:
    /// - every item sits at its own index
    /// - title -> index and index -> title are inverses
    fn validate(&self) -> std::result::Result<(), DataIntegrityError> {
        for (position, item) in self.items.iter().enumerate() {
            if item.index != position {
                return Err(DataIntegrityError::IndexMismatch {
                    position,
                    index: item.index,
                });
            }
            if item.title.trim().is_empty() {
                return Err(DataIntegrityError::MissingField {
                    row: position,
                    field: "title".to_string(),
                });
            }
            if self.title_index.get(&item.title) != Some(&position) {
                let first = self.title_index.get(&item.title).copied().unwrap_or(position);
                return Err(DataIntegrityError::DuplicateTitle {
                    title: item.title.clone(),
                    first,
                    second: position,
                });
            }
        }
        Ok(())
    }

    /// Case-insensitive title search.
    ///
    /// Exact matches come first, then substring matches; each group in index
    /// order.
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<&CatalogItem> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut exact = Vec::new();
        let mut partial = Vec::new();
        for item in &self.items {
            let title = item.title.to_lowercase();
            if title == query || item.base_title().to_lowercase() == query {
                exact.push(item);
            } else if title.contains(&query) {
                partial.push(item);
            }
        }

        exact.extend(partial);
        exact.truncate(limit);
        exact
    }

    /// Most recent, most popular, best rated movies of a genre.
    ///
    /// Animation movies only show up in the Animation list. Ordering keys,
    /// all descending: release date, popularity, rating average, vote count;
    /// catalog index breaks the remaining ties.
    pub fn top_by_genre(&self, genre: &str, limit: usize) -> Vec<&CatalogItem> {
        let keep_animation = genre == ANIMATION;

        let mut matches: Vec<&CatalogItem> = self
            .get_items_by_genre(genre)
            .iter()
            .filter_map(|&index| self.items.get(index))
            .filter(|item| keep_animation || !item.genre_list().any(|g| g == ANIMATION))
            .collect();

        matches.sort_by(|a, b| {
            b.release_date
                .cmp(&a.release_date)
                .then_with(|| cmp_desc(a.popularity, b.popularity))
                .then_with(|| cmp_desc(a.rating_avg, b.rating_avg))
                .then_with(|| b.rating_vote.cmp(&a.rating_vote))
                .then_with(|| a.index.cmp(&b.index))
        });
        matches.truncate(limit);
        matches
    }
}

/// Descending order for optional floats, missing values last
fn cmp_desc(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::load_and_normalize;
    use std::io::Write;

    fn build_catalog() -> Catalog {
        load_and_normalize(vec![
            RawRecord::new("Heat", "1995")
                .with_genres("Action, Crime")
                .with_popularity(40.0),
            RawRecord::new("Toy Story", "1995")
                .with_genres("Animation, Action")
                .with_popularity(90.0),
            RawRecord::new("Ronin", "1998")
                .with_genres("Action")
                .with_popularity(20.0),
            RawRecord::new("Collateral", "1995")
                .with_genres("Action, Drame")
                .with_popularity(40.0)
                .with_rating(7.5, 900),
            RawRecord::new("Heat", "1986").with_genres("Action"),
        ])
        .unwrap()
    }

    #[test]
    fn test_title_index_is_inverse() {
        let catalog = build_catalog();
        for item in catalog.items() {
            assert_eq!(catalog.get_index(&item.title), Some(item.index));
            assert_eq!(catalog.get_title(item.index), Some(item.title.as_str()));
        }
        assert!(catalog.get_title(99).is_none());
    }

    #[test]
    fn test_misplaced_item_is_index_mismatch() {
        let mut items = build_catalog().items;
        items[1].index = 7;

        let err = Catalog::from_items(items, false).unwrap_err();
        assert_eq!(
            err,
            DataIntegrityError::IndexMismatch {
                position: 1,
                index: 7
            }
        );
    }

    #[test]
    fn test_genre_index() {
        let catalog = build_catalog();
        assert_eq!(catalog.get_items_by_genre("Action"), &[0, 1, 2, 3, 4]);
        assert_eq!(catalog.get_items_by_genre("Crime"), &[0]);
        assert!(catalog.get_items_by_genre("Western").is_empty());

        let genres: Vec<&str> = catalog.genres().collect();
        assert_eq!(genres, vec!["Action", "Animation", "Crime", "Drame"]);
    }

    #[test]
    fn test_top_by_genre_ordering() {
        let catalog = build_catalog();
        let top: Vec<&str> = catalog
            .top_by_genre("Action", 10)
            .iter()
            .map(|item| item.title.as_str())
            .collect();

        // Toy Story is Animation and is left out; 1998 first, then the 1995
        // pair tied on popularity is split by rating
        assert_eq!(top, vec!["Ronin", "Collateral", "Heat (1995)", "Heat (1986)"]);

        let animation = catalog.top_by_genre("Animation", 10);
        assert_eq!(animation.len(), 1);
        assert_eq!(animation[0].title, "Toy Story");

        assert_eq!(catalog.top_by_genre("Action", 2).len(), 2);
    }

    #[test]
    fn test_search_titles() {
        let catalog = build_catalog();

        let hits: Vec<&str> = catalog
            .search_titles("heat", 10)
            .iter()
            .map(|item| item.title.as_str())
            .collect();
        assert_eq!(hits, vec!["Heat (1995)", "Heat (1986)"]);

        let hits = catalog.search_titles("o", 2);
        assert_eq!(hits.len(), 2);
        assert!(catalog.search_titles("   ", 10).is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = build_catalog();
        let b = build_catalog();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = load_and_normalize(vec![RawRecord::new("Heat", "1995").with_keywords("heist")])
            .unwrap();
        let d = load_and_normalize(vec![RawRecord::new("Heat", "1995").with_keywords("robbery")])
            .unwrap();
        assert_eq!(c.fingerprint().item_count, d.fingerprint().item_count);
        assert_ne!(c.fingerprint(), d.fingerprint());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "titre_str,date,keywords,titre_genres").unwrap();
        writeln!(file, "Heat,1995,heist,\"Action, Crime\"").unwrap();
        writeln!(file, "Heat,1986,revenge,Action").unwrap();
        writeln!(file, "Ronin,1998,heist,Action").unwrap();
        file.flush().unwrap();

        let catalog = Catalog::load_from_file(file.path(), &LoaderConfig::new()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get_title(0), Some("Heat (1995)"));
        assert_eq!(catalog.get_title(1), Some("Heat (1986)"));
        assert_eq!(catalog.get_index("Ronin"), Some(2));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load_from_file(Path::new("no/such/snapshot.csv"), &LoaderConfig::new());
        assert!(matches!(result, Err(crate::DataLoadError::IoError(_))));
    }
}
