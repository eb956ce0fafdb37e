use crate::error::SearchError;
use crate::tokenizer::Field;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Build-local document identifier, assigned in corpus order.
pub type DocId = u32;

/// A corpus record as the site generator emits it. Everything but `url` may be
/// missing or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub teaser: Option<String>,
}

impl RawRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// One element of a corpus array. Elements that do not have the record shape are kept so the
/// store can reject them individually.
#[derive(Debug, Clone)]
pub enum CorpusEntry {
    Record(RawRecord),
    Unreadable(String),
}

impl CorpusEntry {
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value::<RawRecord>(value) {
            Ok(record) => CorpusEntry::Record(record),
            Err(e) => CorpusEntry::Unreadable(e.to_string()),
        }
    }

    pub fn record(&self) -> Option<&RawRecord> {
        match self {
            CorpusEntry::Record(record) => Some(record),
            CorpusEntry::Unreadable(_) => None,
        }
    }
}

impl From<RawRecord> for CorpusEntry {
    fn from(record: RawRecord) -> Self {
        CorpusEntry::Record(record)
    }
}

impl<'de> Deserialize<'de> for CorpusEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Document represents a validated, searchable blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub teaser: Option<String>,
}

impl Document {
    /// Validate a raw record. Absent text fields become empty; a missing url is fatal.
    pub fn from_record(id: DocId, position: usize, record: RawRecord) -> Result<Self, SearchError> {
        let url = match record.url {
            Some(url) if !url.trim().is_empty() => url,
            Some(_) => {
                return Err(SearchError::MalformedDocument {
                    position,
                    reason: "url is empty".to_string(),
                })
            }
            None => {
                return Err(SearchError::MalformedDocument {
                    position,
                    reason: "url is missing".to_string(),
                })
            }
        };

        Ok(Self {
            id,
            url,
            title: record.title.unwrap_or_default(),
            excerpt: record.excerpt.unwrap_or_default(),
            categories: record.categories.unwrap_or_default(),
            tags: record.tags.unwrap_or_default(),
            teaser: record.teaser,
        })
    }
}

/// Per-field token counts of one document, used for length normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocStats {
    lengths: [u32; Field::COUNT],
}

impl DocStats {
    pub fn length(&self, field: Field) -> u32 {
        self.lengths[field.index()]
    }

    pub fn set_length(&mut self, field: Field, length: u32) {
        self.lengths[field.index()] = length;
    }

    /// Total token count over all indexable fields
    pub fn total(&self) -> u32 {
        self.lengths.iter().sum()
    }
}

/// A record the store refused, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub position: usize,
    pub reason: String,
}

/// Immutable corpus snapshot. Ids are dense indexes into `documents`.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    by_url: HashMap<String, DocId>,
}

impl DocumentStore {
    /// Validate records in corpus order. Bad records are skipped and reported.
    pub fn load<I>(entries: I) -> (Self, Vec<RejectedRecord>)
    where
        I: IntoIterator,
        I::Item: Into<CorpusEntry>,
    {
        let mut store = Self::default();
        let mut rejected = Vec::new();

        for (position, entry) in entries.into_iter().enumerate() {
            let id = store.documents.len() as DocId;
            let record = match entry.into() {
                CorpusEntry::Record(record) => Ok(record),
                CorpusEntry::Unreadable(reason) => Err(SearchError::MalformedDocument { position, reason }),
            };
            let result = record.and_then(|record| Document::from_record(id, position, record)).and_then(|doc| {
                if store.by_url.contains_key(&doc.url) {
                    Err(SearchError::MalformedDocument {
                        position,
                        reason: format!("duplicate url {}", doc.url),
                    })
                } else {
                    Ok(doc)
                }
            });

            match result {
                Ok(doc) => {
                    store.by_url.insert(doc.url.clone(), id);
                    store.documents.push(doc);
                }
                Err(SearchError::MalformedDocument { position, reason }) => {
                    tracing::warn!(position, %reason, "Rejecting corpus record");
                    rejected.push(RejectedRecord { position, reason });
                }
                Err(other) => {
                    tracing::warn!(position, error = %other, "Rejecting corpus record");
                    rejected.push(RejectedRecord {
                        position,
                        reason: other.to_string(),
                    });
                }
            }
        }

        (store, rejected)
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    pub fn get_by_url(&self, url: &str) -> Option<&Document> {
        self.by_url.get(url).and_then(|&id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
