use crate::index::InvertedIndex;
use crate::tokenizer::Tokenizer;

/// One term of a parsed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub term: String,
    /// Match every indexed term starting with `term`
    pub prefix: bool,
}

impl Clause {
    pub fn exact(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            prefix: false,
        }
    }

    pub fn prefix(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            prefix: true,
        }
    }

    /// Indexed terms this clause matches. Prefix clauses expand to at most `max_expansions` terms.
    pub fn expand<'i>(&self, index: &'i InvertedIndex, max_expansions: usize) -> Vec<&'i str> {
        if self.prefix {
            index.terms_with_prefix(&self.term, max_expansions)
        } else {
            index.lookup_term(&self.term).into_iter().collect()
        }
    }
}

/// Parse a free-text query with the same tokenizer the index was built with.
///
/// With `prefix_match`, a raw word ending in `*` turns its last term into a prefix clause;
/// otherwise the `*` is ordinary punctuation. Repeated clauses collapse into one, and a prefix
/// clause absorbs an exact clause on the same term.
pub fn parse(query: &str, tokenizer: &Tokenizer, prefix_match: bool) -> Vec<Clause> {
    let mut clauses: Vec<Clause> = Vec::new();

    for word in query.split_whitespace() {
        let wants_prefix = prefix_match && word.ends_with('*');
        let mut terms = tokenizer.analyze(word);

        let last = if wants_prefix { terms.pop().map(Clause::prefix) } else { None };
        for clause in terms.into_iter().map(Clause::exact).chain(last) {
            if clauses.iter().any(|c| c.term == clause.term && (c.prefix || !clause.prefix)) {
                continue;
            }
            if clause.prefix {
                clauses.retain(|c| c.term != clause.term);
            }
            clauses.push(clause);
        }
    }

    clauses
}
