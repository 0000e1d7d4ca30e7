//! Bag-of-words vectorization.
//!
//! The vocabulary is every distinct whitespace-delimited token of the corpus,
//! with columns assigned in sorted token order. Each blob becomes a sparse
//! vector of token counts over that vocabulary. No stemming, no stop words,
//! no case folding here: text clean-up belongs to the loader.

use crate::corpus::FeatureCorpus;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Token <-> column mapping learned from one corpus
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    columns: HashMap<String, usize>,
    tokens: Vec<String>,
}

impl Vocabulary {
    /// Collect the distinct tokens of every blob; columns follow sorted order
    pub fn fit(corpus: &FeatureCorpus) -> Self {
        let distinct: BTreeSet<&str> = corpus
            .blobs()
            .par_iter()
            .fold(BTreeSet::new, |mut acc, blob| {
                acc.extend(blob.split_whitespace());
                acc
            })
            .reduce(BTreeSet::new, |mut a, b| {
                a.extend(b);
                a
            });

        let tokens: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let columns = tokens
            .iter()
            .enumerate()
            .map(|(column, token)| (token.clone(), column))
            .collect();

        Self { columns, tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn column_of(&self, token: &str) -> Option<usize> {
        self.columns.get(token).copied()
    }

    pub fn token_at(&self, column: usize) -> Option<&str> {
        self.tokens.get(column).map(String::as_str)
    }

    /// Count vector of `text` over this vocabulary; unknown tokens are dropped
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for token in text.split_whitespace() {
            if let Some(column) = self.column_of(token) {
                *counts.entry(column).or_insert(0) += 1;
            }
        }
        SparseVector::from_sorted(counts.into_iter().collect())
    }
}

/// Sparse vector of token counts.
///
/// Entries are sorted by column with no zero counts. Counts are integers, so
/// dot products and squared norms are exact and two identical blobs always
/// produce bit-identical distances.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVector {
    entries: Vec<(usize, u32)>,
    squared_norm: u64,
}

impl SparseVector {
    fn from_sorted(entries: Vec<(usize, u32)>) -> Self {
        let squared_norm = entries.iter().map(|&(_, c)| c as u64 * c as u64).sum();
        Self {
            entries,
            squared_norm,
        }
    }

    /// `(column, count)` pairs in column order
    pub fn entries(&self) -> &[(usize, u32)] {
        &self.entries
    }

    /// Number of non-zero columns
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        (self.squared_norm as f64).sqrt()
    }

    /// Sum of squared counts (exact)
    pub fn squared_norm(&self) -> u64 {
        self.squared_norm
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact integer dot product (sorted merge of both entry lists)
    pub fn dot(&self, other: &SparseVector) -> u64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0u64;
        while i < self.entries.len() && j < other.entries.len() {
            let (col_a, count_a) = self.entries[i];
            let (col_b, count_b) = other.entries[j];
            if col_a == col_b {
                sum += count_a as u64 * count_b as u64;
                i += 1;
                j += 1;
            } else if col_a < col_b {
                i += 1;
            } else {
                j += 1;
            }
        }
        sum
    }
}

/// One count vector per corpus blob, plus the vocabulary they share
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    vocabulary: Vocabulary,
    rows: Vec<SparseVector>,
}

impl FeatureMatrix {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&SparseVector> {
        self.rows.get(index)
    }

    /// Number of rows (catalog items)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Learns a vocabulary from a corpus and counts tokens per blob.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountVectorizer;

impl CountVectorizer {
    pub fn new() -> Self {
        Self
    }

    /// Fit the vocabulary on `corpus` and vectorize every blob.
    ///
    /// Rows are computed in parallel; `collect` keeps them in index order.
    pub fn fit_transform(&self, corpus: &FeatureCorpus) -> FeatureMatrix {
        let vocabulary = Vocabulary::fit(corpus);
        let rows: Vec<SparseVector> = corpus
            .blobs()
            .par_iter()
            .map(|blob| vocabulary.transform(blob))
            .collect();

        debug!(
            "Vectorized {} blobs over a vocabulary of {} tokens",
            rows.len(),
            vocabulary.len()
        );
        FeatureMatrix { vocabulary, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{RawRecord, load_and_normalize};

    fn corpus(keywords: &[&str]) -> FeatureCorpus {
        let records = keywords
            .iter()
            .enumerate()
            .map(|(i, kw)| RawRecord::new(format!("Movie {}", i), "2000").with_keywords(*kw))
            .collect();
        FeatureCorpus::from_catalog(&load_and_normalize(records).unwrap())
    }

    #[test]
    fn test_vocabulary_is_sorted_and_distinct() {
        let corpus = corpus(&["spy action", "action spy spy", "cooking"]);
        let vocabulary = Vocabulary::fit(&corpus);

        assert_eq!(vocabulary.len(), 3);
        assert_eq!(vocabulary.token_at(0), Some("action"));
        assert_eq!(vocabulary.token_at(1), Some("cooking"));
        assert_eq!(vocabulary.token_at(2), Some("spy"));
        assert_eq!(vocabulary.column_of("spy"), Some(2));
        assert_eq!(vocabulary.column_of("Spy"), None);
    }

    #[test]
    fn test_counts() {
        let corpus = corpus(&["spy action", "action spy spy", "cooking"]);
        let matrix = CountVectorizer::new().fit_transform(&corpus);

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.row(1).unwrap().entries(), &[(0, 1), (2, 2)]);
        assert_eq!(matrix.row(2).unwrap().entries(), &[(1, 1)]);
        assert!((matrix.row(1).unwrap().norm() - 5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_dot() {
        let corpus = corpus(&["a b b c", "b c c d", "e"]);
        let matrix = CountVectorizer::new().fit_transform(&corpus);
        let (u, v, w) = (
            matrix.row(0).unwrap(),
            matrix.row(1).unwrap(),
            matrix.row(2).unwrap(),
        );

        // b: 2*1, c: 1*2
        assert_eq!(u.dot(v), 4);
        assert_eq!(v.dot(u), 4);
        assert_eq!(u.dot(w), 0);
    }

    #[test]
    fn test_blank_blob_is_zero_vector() {
        let corpus = corpus(&["", "spy"]);
        let matrix = CountVectorizer::new().fit_transform(&corpus);

        let blank = matrix.row(0).unwrap();
        assert!(blank.is_zero());
        assert_eq!(blank.nnz(), 0);
        assert_eq!(blank.norm(), 0.0);
    }
}
