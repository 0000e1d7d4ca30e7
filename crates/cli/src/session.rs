//! Interactive browsing state.
//!
//! One `SessionContext` per `browse` run, passed explicitly to every step.

use data_loader::ItemIndex;
use server::MovieRecommendation;

/// What the user has selected so far and what they were last shown.
#[derive(Debug, Default)]
pub struct SessionContext {
    selected: Option<ItemIndex>,
    history: Vec<ItemIndex>,
    last_results: Vec<MovieRecommendation>,
    steps: usize,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<ItemIndex> {
        self.selected
    }

    /// Previously selected items, oldest first
    pub fn history(&self) -> &[ItemIndex] {
        &self.history
    }

    /// Number of selections made, including ones undone with `back`
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn last_results(&self) -> &[MovieRecommendation] {
        &self.last_results
    }

    /// Make `index` the current selection
    pub fn select(&mut self, index: ItemIndex) {
        if let Some(previous) = self.selected.replace(index) {
            self.history.push(previous);
        }
        self.last_results.clear();
        self.steps += 1;
    }

    /// Select the `number`-th (1-based) item of the last result list
    pub fn pick(&mut self, number: usize) -> Option<ItemIndex> {
        let index = self.last_results.get(number.checked_sub(1)?)?.index;
        self.select(index);
        Some(index)
    }

    /// Return to the previous selection
    pub fn back(&mut self) -> Option<ItemIndex> {
        let previous = self.history.pop()?;
        self.selected = Some(previous);
        self.last_results.clear();
        Some(previous)
    }

    pub fn set_results(&mut self, results: Vec<MovieRecommendation>) {
        self.last_results = results;
    }
}
