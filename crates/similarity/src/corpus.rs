//! Feature corpus: one text blob per catalog item.
//!
//! The blob is `keywords actors director genres`, in that order, joined by a
//! single space and unweighted. It is the only input of vectorization.

use data_loader::{Catalog, CatalogFingerprint, CatalogItem, ItemIndex, fold_terms};
use rayon::prelude::*;

/// Feature blobs for every item of one catalog snapshot, in index order.
#[derive(Debug, Clone)]
pub struct FeatureCorpus {
    fingerprint: CatalogFingerprint,
    blobs: Vec<String>,
}

impl FeatureCorpus {
    /// Build the blobs for every item of `catalog`.
    ///
    /// Honours the catalog's term-folding policy.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let fold = catalog.folds_terms();
        let blobs = catalog
            .items()
            .par_iter()
            .map(|item| {
                let blob = feature_blob(item);
                if fold { fold_terms(&blob) } else { blob }
            })
            .collect();

        Self {
            fingerprint: catalog.fingerprint(),
            blobs,
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn blob(&self, index: ItemIndex) -> Option<&str> {
        self.blobs.get(index).map(String::as_str)
    }

    pub fn blobs(&self) -> &[String] {
        &self.blobs
    }

    /// Fingerprint of the catalog these blobs were built from
    pub fn fingerprint(&self) -> CatalogFingerprint {
        self.fingerprint
    }
}

/// `keywords + " " + actors + " " + director + " " + genres`
pub fn feature_blob(item: &CatalogItem) -> String {
    [
        item.keywords.as_str(),
        item.actors.as_str(),
        item.director.as_str(),
        item.genres.as_str(),
    ]
    .join(" ")
}
