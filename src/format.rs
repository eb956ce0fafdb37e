use crate::document::DocumentStore;
use crate::engine::ScoredResult;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// A ranked hit joined with the fields a results page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedResult {
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub score: f64,
}

/// Attach store records to ranked hits. Hits whose url is not in the store are dropped.
pub fn format_results(
    results: &[ScoredResult],
    store: &DocumentStore,
    snippet_len: Option<usize>,
) -> Vec<FormattedResult> {
    results
        .iter()
        .filter_map(|hit| {
            let Some(doc) = store.get_by_url(&hit.reference) else {
                tracing::debug!(url = %hit.reference, "Dropping result missing from store");
                return None;
            };
            Some(FormattedResult {
                url: doc.url.clone(),
                title: doc.title.clone(),
                excerpt: match snippet_len {
                    Some(len) => snippet(&doc.excerpt, len),
                    None => doc.excerpt.clone(),
                },
                categories: doc.categories.clone(),
                tags: doc.tags.clone(),
                score: hit.score,
            })
        })
        .collect()
}

/// First `max_graphemes` user-perceived characters of `text`, with an ellipsis when cut
pub fn snippet(text: &str, max_graphemes: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max_graphemes).collect();
    if graphemes.next().is_none() {
        return head;
    }
    format!("{}…", head.trim_end())
}
