use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

lazy_static::lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = {
        [
            "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
            "any", "are", "as", "at", "be", "because", "been", "before", "being",
            "below", "between", "both", "but", "by", "cannot", "could",
            "did", "do", "does", "doing", "down", "during",
            "each", "few", "for", "from", "further", "had", "has",
            "have", "having", "he", "her", "here",
            "hers", "herself", "him", "himself", "his", "how", "i",
            "if", "in", "into", "is", "it",
            "its", "itself", "me", "more", "most", "my", "myself",
            "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "ought",
            "our", "ours", "ourselves", "out", "over", "own", "same", "she",
            "should", "so", "some", "such",
            "than", "that", "the", "their", "theirs", "them", "themselves",
            "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
            "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
            "while", "who", "whom", "why", "with", "would", "you", "your", "yours",
            "yourself", "yourselves",
        ]
        .iter()
        .copied()
        .collect()
    };
}

/// Indexable document fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Excerpt,
    Categories,
    Tags,
}

impl Field {
    pub const COUNT: usize = 4;

    /// All indexable fields, in the order scores are accumulated
    pub const ALL: [Field; Field::COUNT] = [Field::Title, Field::Excerpt, Field::Categories, Field::Tags];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Excerpt => "excerpt",
            Field::Categories => "categories",
            Field::Tags => "tags",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Field::Title),
            "excerpt" => Ok(Field::Excerpt),
            "categories" | "category" => Ok(Field::Categories),
            "tags" | "tag" => Ok(Field::Tags),
            other => Err(format!("unknown field '{}'", other)),
        }
    }
}

/// A normalized term and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub field: Field,
    /// Zero-based ordinal within the field's token stream
    pub position: usize,
}

/// Optional post-processing stages. Both off by default so every surface word stays findable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub stopwords: bool,
    pub stemming: bool,
}

pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Stemmer,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::with_config(TokenizerConfig::default())
    }

    pub fn with_config(config: TokenizerConfig) -> Self {
        Self {
            config,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Split text into alphanumeric runs
    fn split(&self, text: &str) -> Vec<String> {
        text.chars()
            .fold(vec![String::new()], |mut tokens, c| {
                if c.is_alphanumeric() {
                    if let Some(last) = tokens.last_mut() {
                        last.push(c);
                    }
                } else if tokens.last().map_or(false, |s| !s.is_empty()) {
                    tokens.push(String::new());
                }
                tokens
            })
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Convert tokens to lowercase
    fn lowercase_filter(&self, tokens: Vec<(usize, String)>) -> Vec<(usize, String)> {
        tokens
            .into_iter()
            .map(|(pos, t)| (pos, t.to_lowercase()))
            .filter(|(_, t)| !t.is_empty())
            .collect()
    }

    /// Remove stopwords
    fn stopword_filter(&self, tokens: Vec<(usize, String)>) -> Vec<(usize, String)> {
        tokens
            .into_iter()
            .filter(|(_, t)| !STOPWORDS.contains(t.as_str()))
            .collect()
    }

    /// Apply stemming
    fn stemmer_filter(&self, tokens: Vec<(usize, String)>) -> Vec<(usize, String)> {
        tokens
            .into_iter()
            .map(|(pos, t)| (pos, self.stemmer.stem(&t).to_string()))
            .collect()
    }

    /// Full analysis pipeline over one run of text. Positions start at `offset`.
    fn analyze_from(&self, text: &str, offset: usize) -> Vec<(usize, String)> {
        let tokens: Vec<(usize, String)> = self
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(i, t)| (offset + i, t))
            .collect();
        let mut tokens = self.lowercase_filter(tokens);
        if self.config.stopwords {
            tokens = self.stopword_filter(tokens);
        }
        if self.config.stemming {
            tokens = self.stemmer_filter(tokens);
        }
        tokens
    }

    /// Normalized terms of `text`, in order
    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.analyze_from(text, 0).into_iter().map(|(_, t)| t).collect()
    }

    /// Tokenize one text field. Absent text is the same as empty text.
    pub fn tokenize(&self, text: Option<&str>, field: Field) -> Vec<Token> {
        let Some(text) = text else {
            return Vec::new();
        };

        self.analyze_from(text, 0)
            .into_iter()
            .map(|(position, term)| Token { term, field, position })
            .collect()
    }

    /// Tokenize a list field. Elements form one stream; positions continue across them.
    pub fn tokenize_list(&self, items: &[String], field: Field) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut offset = 0;

        for item in items {
            let words = self.split(item).len();
            tokens.extend(
                self.analyze_from(item, offset)
                    .into_iter()
                    .map(|(position, term)| Token { term, field, position }),
            );
            offset += words;
        }

        tokens
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}
