use crate::document::DocId;
use crate::error::SearchError;
use crate::index::InvertedIndex;
use crate::tokenizer::Field;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-field score multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBoosts {
    pub title: f64,
    pub excerpt: f64,
    pub categories: f64,
    pub tags: f64,
}

impl Default for FieldBoosts {
    fn default() -> Self {
        Self {
            title: 10.0,
            tags: 5.0,
            categories: 5.0,
            excerpt: 1.0,
        }
    }
}

impl FieldBoosts {
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.title,
            Field::Excerpt => self.excerpt,
            Field::Categories => self.categories,
            Field::Tags => self.tags,
        }
    }

    pub fn set(&mut self, field: Field, boost: f64) {
        match field {
            Field::Title => self.title = boost,
            Field::Excerpt => self.excerpt = boost,
            Field::Categories => self.categories = boost,
            Field::Tags => self.tags = boost,
        }
    }

    /// Apply overrides keyed by field name. Unknown names and invalid weights are skipped.
    pub fn with_overrides(mut self, overrides: &HashMap<String, f64>) -> Self {
        // Sorted so the debug output is stable
        let mut names: Vec<&String> = overrides.keys().collect();
        names.sort();

        for name in names {
            let boost = overrides[name];
            match name.parse::<Field>() {
                Ok(field) if boost.is_finite() && boost >= 0.0 => self.set(field, boost),
                Ok(field) => tracing::debug!(%field, boost, "Ignoring invalid boost"),
                Err(_) => tracing::debug!(name = %name, "Ignoring boost for unknown field"),
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        for field in Field::ALL {
            let boost = self.get(field);
            if !boost.is_finite() || boost < 0.0 {
                return Err(SearchError::Config(format!(
                    "boost for {} must be a non-negative number, got {}",
                    field, boost
                )));
            }
        }
        Ok(())
    }
}

/// Scoring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Term frequency saturation parameter
    pub k1: f64,
    /// Length normalization parameter
    pub b: f64,
    /// Upper bound the field length to average length ratio approaches. Keeps a single title hit
    /// ahead of any excerpt-only hit under the default boosts.
    pub max_length_ratio: f64,
    /// Power applied to the fraction of query clauses a document matches
    pub coordination_exponent: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            max_length_ratio: 4.0,
            coordination_exponent: 2.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        // k1 = 0 makes tf irrelevant and b = 0 makes length irrelevant
        if !self.k1.is_finite() || self.k1 <= 0.0 {
            return Err(SearchError::Config(format!("k1 must be positive, got {}", self.k1)));
        }
        if !(self.b > 0.0 && self.b <= 1.0) {
            return Err(SearchError::Config(format!("b must be within (0, 1], got {}", self.b)));
        }
        if !self.max_length_ratio.is_finite() || self.max_length_ratio <= 1.0 {
            return Err(SearchError::Config(format!(
                "max_length_ratio must be greater than 1, got {}",
                self.max_length_ratio
            )));
        }
        if !self.coordination_exponent.is_finite() || self.coordination_exponent < 0.0 {
            return Err(SearchError::Config(format!(
                "coordination_exponent must be non-negative, got {}",
                self.coordination_exponent
            )));
        }
        Ok(())
    }
}

/// Field-aware tf-idf scorer with saturating, length-normalized term frequency
pub struct Scorer<'a> {
    index: &'a InvertedIndex,
    config: ScoringConfig,
    boosts: FieldBoosts,
}

impl<'a> Scorer<'a> {
    pub fn new(index: &'a InvertedIndex, config: ScoringConfig, boosts: FieldBoosts) -> Self {
        Self { index, config, boosts }
    }

    /// Saturating term frequency weight. Grows with `tf`, shrinks as the field gets longer.
    pub fn tf_weight(&self, tf: u32, field_length: u32, avg_field_length: f64) -> f64 {
        if tf == 0 {
            return 0.0;
        }
        let tf = f64::from(tf);
        let norm = 1.0 - self.config.b + self.config.b * self.relative_length(field_length, avg_field_length);
        tf * (self.config.k1 + 1.0) / (tf + self.config.k1 * norm)
    }

    /// `len / avg`, squashed so it is still increasing but never reaches `max_length_ratio`.
    /// Average-length fields map to 1.
    fn relative_length(&self, field_length: u32, avg_field_length: f64) -> f64 {
        if avg_field_length <= 0.0 {
            return 1.0;
        }
        let ratio = f64::from(field_length) / avg_field_length;
        let cap = self.config.max_length_ratio;
        cap * ratio / (cap - 1.0 + ratio)
    }

    /// ln(N / df). Zero for terms every document contains.
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.index.doc_frequency(term) as f64;
        let n = self.index.total_documents() as f64;
        if df == 0.0 || n == 0.0 {
            return 0.0;
        }
        (n / df).ln().max(0.0)
    }

    /// Score contribution of one posting
    pub fn contribution(&self, doc_id: DocId, field: Field, term_frequency: u32, idf: f64) -> f64 {
        let length = self.index.field_length(doc_id, field);
        let avg = self.index.avg_field_length(field);
        self.tf_weight(term_frequency, length, avg) * idf * self.boosts.get(field)
    }

    /// Multiplier rewarding documents that match more of the query
    pub fn coordination(&self, matched_clauses: usize, total_clauses: usize) -> f64 {
        if total_clauses == 0 {
            return 0.0;
        }
        (matched_clauses as f64 / total_clauses as f64).powf(self.config.coordination_exponent)
    }
}

/// A document id with its final score, before the url is resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f64,
}

impl ScoredDocument {
    pub fn new(doc_id: DocId, score: f64) -> Self {
        Self { doc_id, score }
    }
}

/// Descending score, ties by corpus order
pub fn compare_ranked(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Sort scored documents into their final order
pub fn rank_documents(mut scored: Vec<ScoredDocument>) -> Vec<ScoredDocument> {
    scored.sort_by(compare_ranked);
    scored
}
