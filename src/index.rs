use crate::document::{DocId, DocStats, Document, DocumentStore};
use crate::tokenizer::{Field, Token, Tokenizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Occurrences of one term in one field of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub field: Field,
    pub term_frequency: u32,
}

/// Postings list of a term, sorted by (doc_id, field)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    /// Distinct documents containing the term in any field
    pub doc_frequency: u32,
    pub postings: Vec<Posting>,
}

/// Per-document output of the analysis phase, merged into the index afterwards.
#[derive(Debug, Clone)]
struct DocAnalysis {
    doc_id: DocId,
    stats: DocStats,
    frequencies: BTreeMap<(String, Field), u32>,
}

/// Inverted index: term -> postings, plus the statistics needed for scoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    terms: BTreeMap<String, TermEntry>,
    doc_stats: Vec<DocStats>,
    avg_field_length: [f64; Field::COUNT],
    doc_count: usize,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index over every document in the store
    pub fn build(store: &DocumentStore, tokenizer: &Tokenizer) -> Self {
        #[cfg(feature = "parallel")]
        let analyses: Vec<DocAnalysis> = store
            .documents()
            .par_iter()
            .map(|doc| analyze_document(doc, tokenizer))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let analyses: Vec<DocAnalysis> = store
            .documents()
            .iter()
            .map(|doc| analyze_document(doc, tokenizer))
            .collect();

        Self::merge(analyses)
    }

    /// Fold per-document analyses into one index. Input order does not matter.
    fn merge(mut analyses: Vec<DocAnalysis>) -> Self {
        analyses.sort_by_key(|a| a.doc_id);

        let mut index = Self::new();
        index.doc_count = analyses.len();
        index.doc_stats = Vec::with_capacity(analyses.len());

        for analysis in analyses {
            let mut last_term: Option<&str> = None;

            for ((term, field), term_frequency) in &analysis.frequencies {
                let entry = index.terms.entry(term.clone()).or_default();
                // Keys are sorted by term first, so a new term means a new document hit
                if last_term != Some(term.as_str()) {
                    entry.doc_frequency += 1;
                    last_term = Some(term.as_str());
                }
                entry.postings.push(Posting {
                    doc_id: analysis.doc_id,
                    field: *field,
                    term_frequency: *term_frequency,
                });
            }

            index.doc_stats.push(analysis.stats);
        }

        if index.doc_count > 0 {
            for field in Field::ALL {
                let total: u64 = index.doc_stats.iter().map(|s| u64::from(s.length(field))).sum();
                index.avg_field_length[field.index()] = total as f64 / index.doc_count as f64;
            }
        }

        index
    }

    /// The index's own copy of `term`, if present
    pub fn lookup_term(&self, term: &str) -> Option<&str> {
        self.terms.get_key_value(term).map(|(k, _)| k.as_str())
    }

    /// Get postings for a term, empty when the term is unknown
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.terms.get(term).map(|e| e.postings.as_slice()).unwrap_or(&[])
    }

    /// Get number of documents containing a term (for IDF calculation)
    pub fn doc_frequency(&self, term: &str) -> usize {
        self.terms.get(term).map(|e| e.doc_frequency as usize).unwrap_or(0)
    }

    /// Indexed terms starting with `prefix`, in lexicographic order, at most `limit` of them
    pub fn terms_with_prefix(&self, prefix: &str, limit: usize) -> Vec<&str> {
        if prefix.is_empty() {
            return Vec::new();
        }

        self.terms
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(|(term, _)| term.starts_with(prefix))
            .take(limit)
            .map(|(term, _)| term.as_str())
            .collect()
    }

    /// Token count of one field of one document
    pub fn field_length(&self, doc_id: DocId, field: Field) -> u32 {
        self.doc_stats
            .get(doc_id as usize)
            .map(|s| s.length(field))
            .unwrap_or(0)
    }

    /// Mean token count of a field across the corpus
    pub fn avg_field_length(&self, field: Field) -> f64 {
        self.avg_field_length[field.index()]
    }

    /// Get total number of indexed documents
    pub fn total_documents(&self) -> usize {
        self.doc_count
    }

    /// Get index statistics
    pub fn stats(&self) -> IndexStats {
        let total_postings: usize = self.terms.values().map(|e| e.postings.len()).sum();
        let total_tokens: u64 = self.doc_stats.iter().map(|s| u64::from(s.total())).sum();

        IndexStats {
            total_documents: self.doc_count,
            total_terms: self.terms.len(),
            total_postings,
            total_tokens,
            avg_docs_per_term: if self.terms.is_empty() {
                0.0
            } else {
                self.terms.values().map(|e| e.doc_frequency as usize).sum::<usize>() as f64
                    / self.terms.len() as f64
            },
            avg_field_length: Field::ALL
                .iter()
                .map(|&f| (f, self.avg_field_length(f)))
                .collect(),
        }
    }
}

/// Tokenize every indexable field of a document and count term occurrences
fn analyze_document(doc: &Document, tokenizer: &Tokenizer) -> DocAnalysis {
    let fields: [Vec<Token>; Field::COUNT] = [
        tokenizer.tokenize(Some(&doc.title), Field::Title),
        tokenizer.tokenize(Some(&doc.excerpt), Field::Excerpt),
        tokenizer.tokenize_list(&doc.categories, Field::Categories),
        tokenizer.tokenize_list(&doc.tags, Field::Tags),
    ];

    let mut stats = DocStats::default();
    let mut frequencies = BTreeMap::new();

    for tokens in fields {
        if let Some(first) = tokens.first() {
            stats.set_length(first.field, tokens.len() as u32);
        }
        for token in tokens {
            *frequencies.entry((token.term, token.field)).or_insert(0) += 1;
        }
    }

    DocAnalysis {
        doc_id: doc.id,
        stats,
        frequencies,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_terms: usize,
    pub total_postings: usize,
    pub total_tokens: u64,
    pub avg_docs_per_term: f64,
    pub avg_field_length: BTreeMap<Field, f64>,
}
