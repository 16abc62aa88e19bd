use std::sync::Arc;

use flare_plugin::{SearchResult, kind};

use crate::detect;
use crate::filetype::{file_type_label, format_file_size};
use crate::fuzzy;
use crate::indexer::Indexer;
use crate::item::IndexedItem;

/// Weights of the ranking function.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    /// Added when the case-folded query equals the case-folded name.
    pub exact_match: f64,
    /// Multiplier for the 0–100 fuzzy ratio.
    pub fuzzy_ratio: f64,
    /// Multiplier for `ln(use_count + 1)`.
    pub recent_boost: f64,
    pub type_app: f64,
    pub type_file: f64,
    pub type_web: f64,
    /// Never applied while calculator results short-circuit the search.
    pub type_calc: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            exact_match: 30.0,
            fuzzy_ratio: 0.6,
            recent_boost: 0.4,
            type_app: 10.0,
            type_file: 5.0,
            type_web: 2.0,
            type_calc: 50.0,
        }
    }
}

impl Weights {
    pub fn type_bonus(&self, kind: &str) -> f64 {
        match kind {
            kind::APPLICATION => self.type_app,
            kind::FILE => self.type_file,
            kind::WEB => self.type_web,
            kind::CALCULATOR => self.type_calc,
            _ => 0.0,
        }
    }
}

pub const APP_THRESHOLD: f64 = 30.0;
pub const FILE_THRESHOLD: f64 = 20.0;
pub const DEFAULT_MAX_RESULTS: usize = 12;

/// Ranks the indexer's current snapshot against a query.
pub struct SearchEngine {
    indexer: Arc<Indexer>,
    weights: Weights,
    max_results: usize,
}

impl SearchEngine {
    pub fn new(indexer: Arc<Indexer>) -> Self {
        Self {
            indexer,
            weights: Weights::default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    pub fn indexer(&self) -> &Arc<Indexer> {
        &self.indexer
    }

    pub fn calculate_score(&self, item: &IndexedItem, query: &str) -> f64 {
        let name = item.sort_key();
        let query = query.to_lowercase();
        let usage = self.indexer.get_usage(item.identity());
        let kind = match item {
            IndexedItem::Application(_) => kind::APPLICATION,
            IndexedItem::File(_) => kind::FILE,
        };
        self.score(&query, &name, usage.count, kind)
    }

    fn score(&self, query: &str, name: &str, use_count: u64, kind: &str) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;
        if query == name {
            score += w.exact_match;
        }
        score += fuzzy::ratio(query, name) * w.fuzzy_ratio;
        if use_count > 0 {
            score += w.recent_boost * ((use_count + 1) as f64).ln();
        }
        score + w.type_bonus(kind)
    }

    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if let Some(result) = detect::calculator(query) {
            return vec![result];
        }

        let mut results: Vec<SearchResult> = detect::url(query)
            .into_iter()
            .chain(detect::web_shortcut(query))
            .collect();

        for item in self.indexer.apps().iter() {
            let IndexedItem::Application(app) = item else {
                continue;
            };
            let score = self.calculate_score(item, query);
            if score > APP_THRESHOLD {
                let subtitle = app.comment.as_deref().unwrap_or("Application");
                results.push(
                    SearchResult::new(kind::APPLICATION, &app.name, &app.exec)
                        .with_subtitle(subtitle)
                        .with_icon(&app.icon)
                        .with_score(score)
                        .with_path(&app.path),
                );
            }
        }

        for item in self.indexer.files().iter() {
            let IndexedItem::File(file) = item else {
                continue;
            };
            let score = self.calculate_score(item, query);
            if score > FILE_THRESHOLD {
                let subtitle = format!(
                    "{} · {} · {}",
                    file_type_label(&file.path),
                    format_file_size(file.size),
                    file.path
                );
                results.push(
                    SearchResult::new(kind::FILE, &file.name, &file.path)
                        .with_subtitle(subtitle)
                        .with_icon("text-x-generic")
                        .with_score(score)
                        .with_path(&file.path),
                );
            }
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(self.max_results);
        results
    }
}
