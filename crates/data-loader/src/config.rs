//! Loader configuration.

/// Options controlling how a dataset snapshot is read and cleaned.
///
/// Built with the usual `with_*` chain:
///
/// ```ignore
/// let config = LoaderConfig::new().with_delimiter(b';').with_fold_terms(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Field separator of the snapshot file (default: `,`)
    pub delimiter: u8,

    /// Lowercase the feature fields and turn punctuation into spaces
    /// before they reach the similarity engine (default: off)
    pub fold_terms: bool,
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            fold_terms: false,
        }
    }

    /// Configure the field separator (default: `,`)
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Configure feature-term folding (default: false)
    pub fn with_fold_terms(mut self, fold_terms: bool) -> Self {
        self.fold_terms = fold_terms;
        self
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}
