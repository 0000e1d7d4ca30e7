//! # Data Loader Crate
//!
//! Loads a movie catalog snapshot and turns it into a deduplicated, indexed
//! [`Catalog`].
//!
//! ## Main Components
//!
//! - **types**: Core domain types (RawRecord, CatalogItem, Catalog)
//! - **parser**: Parse the delimited snapshot file into raw records
//! - **normalize**: Title validation and deduplication
//! - **index**: Build lookup indices, catalog-level queries
//! - **config**: Loader options
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Catalog, LoaderConfig};
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_file(Path::new("data/movies.csv"), &LoaderConfig::new())?;
//!
//! let index = catalog.get_index("Heat").unwrap();
//! println!("{} is movie #{}", catalog.get_title(index).unwrap(), index);
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod normalize;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use config::LoaderConfig;
pub use error::{DataIntegrityError, DataLoadError, Result};
pub use normalize::{deduplicate_titles, fold_terms, load_and_normalize, load_and_normalize_with};
pub use types::{Catalog, CatalogFingerprint, CatalogItem, ItemIndex, RawRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog() {
        let catalog = load_and_normalize(Vec::new()).unwrap();

        assert_eq!(catalog.len(), 0);
        assert!(catalog.is_empty());
        assert!(catalog.get_item(0).is_none());
        assert_eq!(catalog.genres().count(), 0);
    }

    #[test]
    fn test_item_fields_pass_through() {
        let mut raw = RawRecord::new("Heat", "1995")
            .with_keywords("heist los angeles")
            .with_actors("Al Pacino, Robert De Niro")
            .with_director("Michael Mann")
            .with_genres("Action, Crime");
        raw.image_url = Some("http://img/heat.jpg".to_string());
        raw.trailer_url = Some("https://www.youtube.com/watch?v=abc".to_string());
        raw.extra.insert("budget".to_string(), "60000000".to_string());

        let catalog = load_and_normalize(vec![raw]).unwrap();
        let item = catalog.get_by_title("Heat").unwrap();

        assert_eq!(item.index, 0);
        assert_eq!(item.director, "Michael Mann");
        assert_eq!(item.image_url, "http://img/heat.jpg");
        assert_eq!(item.trailer_url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(item.extra.get("budget").map(String::as_str), Some("60000000"));
        assert_eq!(item.genre_list().collect::<Vec<_>>(), vec!["Action", "Crime"]);
    }

    #[test]
    fn test_base_title() {
        let catalog = load_and_normalize(vec![
            RawRecord::new("Heat", "1995"),
            RawRecord::new("Heat", "1986"),
            RawRecord::new("Ronin", "1998"),
        ])
        .unwrap();

        assert_eq!(catalog.get_item(0).unwrap().base_title(), "Heat");
        assert_eq!(catalog.get_item(1).unwrap().base_title(), "Heat");
        assert_eq!(catalog.get_item(2).unwrap().base_title(), "Ronin");
    }
}
