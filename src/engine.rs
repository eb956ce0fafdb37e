use crate::config::EngineConfig;
use crate::document::{CorpusEntry, DocId, Document, DocumentStore, RejectedRecord};
use crate::error::{Result, SearchError};
use crate::index::{IndexStats, InvertedIndex};
use crate::query::{parse, Clause};
use crate::ranking::{rank_documents, ScoredDocument, Scorer};
use crate::tokenizer::{Field, Tokenizer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Advisory limits on one query. Exceeding them yields partial results, never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    /// Stop scoring after this many candidates
    pub max_candidates: Option<usize>,
    /// Stop scoring once this much time has passed
    pub time_limit: Option<Duration>,
}

/// Search options
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Field names to search. `None` searches every indexable field; unknown names are ignored.
    pub fields: Option<Vec<String>>,
    /// Per-field boost overrides, keyed by field name
    pub boosts: HashMap<String, f64>,
    pub limit: Option<usize>,
    /// Treat a trailing `*` on a query word as a prefix match
    pub prefix_match: bool,
    pub budget: SearchBudget,
}

impl SearchOptions {
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_prefix_match(mut self, prefix_match: bool) -> Self {
        self.prefix_match = prefix_match;
        self
    }

    pub fn with_boost(mut self, field: impl Into<String>, boost: f64) -> Self {
        self.boosts.insert(field.into(), boost);
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Resolve the field filter into a per-field mask
    fn field_mask(&self) -> [bool; Field::COUNT] {
        let Some(names) = &self.fields else {
            return [true; Field::COUNT];
        };

        let mut mask = [false; Field::COUNT];
        for name in names {
            match name.parse::<Field>() {
                Ok(field) => mask[field.index()] = true,
                Err(_) => tracing::debug!(name = %name, "Ignoring unknown search field"),
            }
        }
        mask
    }
}

/// One ranked hit. `reference` is the document url.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    #[serde(rename = "ref")]
    pub reference: String,
    pub score: f64,
}

/// Search result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub hits: Vec<ScoredResult>,
    /// Size of the candidate set before budget and limit
    pub total_candidates: usize,
    /// Set when the budget stopped scoring early
    pub truncated: bool,
}

impl SearchResults {
    pub fn refs(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.reference.as_str()).collect()
    }
}

/// Outcome of one index build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub indexed: usize,
    pub rejected: Vec<RejectedRecord>,
    pub terms: usize,
    pub elapsed_ms: u64,
}

/// An immutable snapshot: corpus, inverted index and the analysis settings used to build it
pub struct SearchIndex {
    store: DocumentStore,
    index: InvertedIndex,
    tokenizer: Tokenizer,
    config: EngineConfig,
}

impl SearchIndex {
    /// Build a snapshot in one pass. Unreadable records and records without a url are skipped
    /// and reported.
    pub fn build<I>(records: I, config: EngineConfig) -> (Self, BuildReport)
    where
        I: IntoIterator,
        I::Item: Into<CorpusEntry>,
    {
        let start = Instant::now();
        let tokenizer = Tokenizer::with_config(config.tokenizer);
        let (store, rejected) = DocumentStore::load(records);
        let index = InvertedIndex::build(&store, &tokenizer);

        let report = BuildReport {
            indexed: store.len(),
            rejected,
            terms: index.stats().total_terms,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            documents = report.indexed,
            terms = report.terms,
            rejected = report.rejected.len(),
            elapsed_ms = report.elapsed_ms,
            "Built search index"
        );

        (
            Self {
                store,
                index,
                tokenizer,
                config,
            },
            report,
        )
    }

    /// Search for documents
    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchResults {
        let start = Instant::now();
        let clauses = parse(query, &self.tokenizer, options.prefix_match);
        tracing::debug!(query, clauses = ?clauses, "Parsed query");

        if clauses.is_empty() {
            return SearchResults::default();
        }

        let mask = options.field_mask();
        let boosts = self.config.boosts.with_overrides(&options.boosts);
        let scorer = Scorer::new(&self.index, self.config.scoring, boosts);

        // Each clause with the indexed terms it matches and their idf
        let expanded: Vec<Vec<(&str, f64)>> = clauses
            .iter()
            .map(|clause| {
                clause
                    .expand(&self.index, self.config.max_prefix_expansions)
                    .into_iter()
                    .map(|term| (term, scorer.idf(term)))
                    .collect()
            })
            .collect();

        let candidates: BTreeSet<DocId> = expanded
            .iter()
            .flatten()
            .flat_map(|(term, _)| self.index.postings(term))
            .filter(|p| mask[p.field.index()])
            .map(|p| p.doc_id)
            .collect();

        let total_candidates = candidates.len();
        let mut truncated = false;
        let mut scored = Vec::with_capacity(total_candidates);

        for (scanned, doc_id) in candidates.into_iter().enumerate() {
            if self.budget_exhausted(&options.budget, scanned, start) {
                truncated = true;
                tracing::debug!(query, scanned, total_candidates, "Search budget exhausted");
                break;
            }
            scored.push(self.score_document(doc_id, &clauses, &expanded, &mask, &scorer));
        }

        let mut ranked = rank_documents(scored);
        if let Some(limit) = options.limit {
            ranked.truncate(limit);
        }

        let hits = ranked
            .into_iter()
            .filter_map(|sd| {
                self.store.get(sd.doc_id).map(|doc| ScoredResult {
                    reference: doc.url.clone(),
                    score: sd.score,
                })
            })
            .collect();

        SearchResults {
            hits,
            total_candidates,
            truncated,
        }
    }

    fn budget_exhausted(&self, budget: &SearchBudget, scanned: usize, start: Instant) -> bool {
        if budget.max_candidates.is_some_and(|max| scanned >= max) {
            return true;
        }
        budget.time_limit.is_some_and(|limit| start.elapsed() >= limit)
    }

    /// Sum field contributions over every clause the document matches, then apply coordination
    fn score_document(
        &self,
        doc_id: DocId,
        clauses: &[Clause],
        expanded: &[Vec<(&str, f64)>],
        mask: &[bool; Field::COUNT],
        scorer: &Scorer<'_>,
    ) -> ScoredDocument {
        let mut score = 0.0;
        let mut matched_clauses = 0;

        for terms in expanded {
            let mut matched = false;
            for &(term, idf) in terms {
                let postings = self.index.postings(term);
                let from = postings.partition_point(|p| p.doc_id < doc_id);
                for posting in postings[from..].iter().take_while(|p| p.doc_id == doc_id) {
                    if !mask[posting.field.index()] {
                        continue;
                    }
                    matched = true;
                    score += scorer.contribution(doc_id, posting.field, posting.term_frequency, idf);
                }
            }
            if matched {
                matched_clauses += 1;
            }
        }

        ScoredDocument::new(doc_id, score * scorer.coordination(matched_clauses, clauses.len()))
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}

/// Main search engine: owns the current snapshot and swaps it on rebuild
pub struct SearchEngine {
    config: EngineConfig,
    current: RwLock<Option<Arc<SearchIndex>>>,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            current: RwLock::new(None),
        }
    }

    /// Build a fresh snapshot from `records` and swap it in.
    ///
    /// The new index is built completely before the swap; on error the previous snapshot stays.
    pub fn build<I>(&self, records: I) -> Result<BuildReport>
    where
        I: IntoIterator,
        I::Item: Into<CorpusEntry>,
    {
        self.config.validate()?;
        let (index, report) = SearchIndex::build(records, self.config.clone());
        self.swap(Arc::new(index));
        Ok(report)
    }

    /// Replace the current snapshot. Queries already running keep the one they started with.
    pub fn swap(&self, index: Arc<SearchIndex>) -> Option<Arc<SearchIndex>> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.replace(index)
    }

    /// The snapshot new queries run against
    pub fn snapshot(&self) -> Result<Arc<SearchIndex>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SearchError::NotBuilt)
    }

    pub fn is_built(&self) -> bool {
        self.snapshot().is_ok()
    }

    /// Search for documents
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResults> {
        Ok(self.snapshot()?.search(query, options))
    }

    /// Get a document by url
    pub fn get_document(&self, url: &str) -> Result<Option<Document>> {
        Ok(self.snapshot()?.store().get_by_url(url).cloned())
    }

    /// Get index statistics
    pub fn stats(&self) -> Result<IndexStats> {
        Ok(self.snapshot()?.stats())
    }

    /// Get total document count
    pub fn document_count(&self) -> Result<usize> {
        Ok(self.snapshot()?.store().len())
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
