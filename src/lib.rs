// Re-export main components
pub mod api;
pub mod config;
pub mod corpus;
pub mod document;
pub mod engine;
pub mod error;
pub mod format;
pub mod index;
pub mod query;
pub mod ranking;
pub mod tokenizer;

// Re-export commonly used types
pub use config::EngineConfig;
pub use corpus::{load_corpus, parse_corpus};
pub use document::{CorpusEntry, DocId, Document, DocumentStore, RawRecord};
pub use engine::{BuildReport, ScoredResult, SearchBudget, SearchEngine, SearchIndex, SearchOptions, SearchResults};
pub use error::SearchError;
pub use format::{format_results, FormattedResult};
pub use index::InvertedIndex;
pub use ranking::FieldBoosts;
pub use tokenizer::{Field, Tokenizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The blog corpus shipped with the crate
pub const BUNDLED_CORPUS: &str = include_str!("../data/posts.json");

#[cfg(test)]
mod tests {
    use super::*;

    const SPRING_REST_I: &str = "https://matsev.github.io/blog/2012/09/16/improve-your-spring-rest-api-part-i/";

    fn corpus_engine() -> anyhow::Result<SearchEngine> {
        let engine = SearchEngine::default();
        let report = engine.build(parse_corpus(BUNDLED_CORPUS)?)?;
        assert!(report.rejected.is_empty());
        Ok(engine)
    }

    fn titles(engine: &SearchEngine, results: &SearchResults) -> anyhow::Result<Vec<String>> {
        let snapshot = engine.snapshot()?;
        Ok(results
            .hits
            .iter()
            .filter_map(|h| snapshot.store().get_by_url(&h.reference))
            .map(|d| d.title.clone())
            .collect())
    }

    fn position(titles: &[String], title: &str) -> usize {
        titles
            .iter()
            .position(|t| t == title)
            .unwrap_or_else(|| panic!("{title} not in results"))
    }

    #[test]
    fn test_basic_workflow() -> anyhow::Result<()> {
        let engine = SearchEngine::default();

        engine.build(vec![RawRecord::new("https://example.com/rust")
            .with_title("Rust Programming Language")
            .with_excerpt("Rust is a blazingly fast and memory-efficient language")])?;

        let results = engine.search("rust programming", &SearchOptions::default())?;

        assert_eq!(results.total_candidates, 1);
        assert_eq!(results.refs(), vec!["https://example.com/rust"]);

        Ok(())
    }

    #[test]
    fn test_deterministic_across_builds() -> anyhow::Result<()> {
        let first = corpus_engine()?;
        let second = corpus_engine()?;

        for query in ["Spring", "AWS Lambda", "mock testing", "java", "conference 2013"] {
            let a = first.search(query, &SearchOptions::default())?;
            let b = second.search(query, &SearchOptions::default())?;
            assert_eq!(serde_json::to_string(&a)?, serde_json::to_string(&b)?, "query {query}");
        }
        Ok(())
    }

    #[test]
    fn test_every_indexed_term_is_retrievable() -> anyhow::Result<()> {
        let engine = corpus_engine()?;
        let snapshot = engine.snapshot()?;
        let tokenizer = Tokenizer::new();

        for doc in snapshot.store().iter() {
            let mut terms = tokenizer.analyze(&doc.title);
            terms.extend(tokenizer.analyze(&doc.excerpt));
            terms.extend(doc.categories.iter().chain(&doc.tags).flat_map(|s| tokenizer.analyze(s)));

            for term in terms {
                let results = snapshot.search(&term.to_uppercase(), &SearchOptions::default());
                assert!(
                    results.hits.iter().any(|h| h.reference == doc.url),
                    "{} not found for {}",
                    doc.url,
                    term
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_case_insensitive() -> anyhow::Result<()> {
        let engine = corpus_engine()?;
        let upper = engine.search("Spring", &SearchOptions::default())?;
        let lower = engine.search("spring", &SearchOptions::default())?;

        assert!(!upper.hits.is_empty());
        assert_eq!(upper, lower);
        Ok(())
    }

    #[test]
    fn test_empty_and_unknown_queries() -> anyhow::Result<()> {
        let engine = corpus_engine()?;
        assert!(engine.search("", &SearchOptions::default())?.hits.is_empty());
        assert!(engine.search("zzzznotaterm", &SearchOptions::default())?.hits.is_empty());
        Ok(())
    }

    #[test]
    fn test_limit_is_prefix_of_full_results() -> anyhow::Result<()> {
        let engine = corpus_engine()?;

        for query in ["spring", "aws lambda", "java testing", "conference"] {
            let full = engine.search(query, &SearchOptions::default())?;
            for k in [0, 1, 3, 10, 100] {
                let limited = engine.search(query, &SearchOptions::default().with_limit(k))?;
                let n = k.min(full.hits.len());
                assert_eq!(limited.hits, full.hits[..n], "query {query} limit {k}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_spring_ranks_title_matches_first() -> anyhow::Result<()> {
        let engine = corpus_engine()?;
        let results = engine.search("Spring", &SearchOptions::default())?;
        let titles = titles(&engine, &results)?;

        for tagged in [
            "Mockito and Dependency Injection",
            "Spring Controller Tests 2.0",
            "Improve Your Spring REST API, Part I",
            "Improve Your Spring REST API, Part IV",
        ] {
            position(&titles, tagged);
        }

        let property_source = position(&titles, "Spring @PropertySource");
        let integration = position(&titles, "Spring Integration Tests, Part I, Creating Mock Objects");
        let mockito = position(&titles, "Mockito and Dependency Injection");
        assert_eq!(property_source, 0);
        assert!(integration < mockito);
        Ok(())
    }

    #[test]
    fn test_aws_lambda_prefers_documents_matching_both() -> anyhow::Result<()> {
        let engine = corpus_engine()?;
        let snapshot = engine.snapshot()?;
        let results = engine.search("AWS Lambda", &SearchOptions::default())?;

        let has_both: Vec<bool> = results
            .hits
            .iter()
            .filter_map(|h| snapshot.store().get_by_url(&h.reference))
            .map(|d| {
                let tags: Vec<String> = d.tags.iter().map(|t| t.to_lowercase()).collect();
                tags.contains(&"aws".to_string()) && tags.contains(&"lambda".to_string())
            })
            .collect();

        let first_partial = has_both.iter().position(|b| !b).unwrap_or(has_both.len());
        assert!(first_partial >= 2);
        assert!(has_both[first_partial..].iter().all(|b| !b));

        let titles = titles(&engine, &results)?;
        assert!(
            position(&titles, "Custom Resource for Generating Lambdas")
                < position(&titles, "AWS CLI MFA")
        );
        assert!(position(&titles, "Continuous Deployment on AWS Lambda") < first_partial);
        Ok(())
    }

    #[test]
    fn test_gradle_title_only() -> anyhow::Result<()> {
        let engine = corpus_engine()?;
        let results = engine.search("gradle", &SearchOptions::default().with_fields(["title"]))?;
        let mut titles = titles(&engine, &results)?;
        titles.sort();

        assert_eq!(
            titles,
            vec!["Getting Started with Gradle", "Working Efficiently with Gradle Modules"]
        );

        let all_fields = engine.search("gradle", &SearchOptions::default())?;
        assert!(all_fields.hits.len() > results.hits.len());
        Ok(())
    }

    #[test]
    fn test_field_boost_ordering() -> anyhow::Result<()> {
        let engine = SearchEngine::default();
        engine.build(vec![
            RawRecord::new("https://example.com/b")
                .with_title("Something else")
                .with_excerpt("All about kotlin coroutines, kotlin flows and more"),
            RawRecord::new("https://example.com/a")
                .with_title("Kotlin for Java developers, a long and winding introduction")
                .with_excerpt("Notes from a migration"),
            RawRecord::new("https://example.com/c").with_title("Unrelated"),
        ])?;

        let results = engine.search("kotlin", &SearchOptions::default())?;
        assert_eq!(results.refs(), vec!["https://example.com/a", "https://example.com/b"]);
        Ok(())
    }

    #[test]
    fn test_prefix_search_on_corpus() -> anyhow::Result<()> {
        let engine = corpus_engine()?;
        let options = SearchOptions::default().with_prefix_match(true);

        let prefix = engine.search("spring*", &options)?;
        let exact = engine.search("spring", &SearchOptions::default())?;
        let titles = titles(&engine, &prefix)?;

        assert!(prefix.hits.len() >= exact.hits.len());
        position(&titles, "SpringOne 2GX 2013");
        assert!(prefix.refs().contains(&SPRING_REST_I));
        Ok(())
    }

    #[test]
    fn test_stemming_is_symmetric() -> anyhow::Result<()> {
        let config = EngineConfig::from_json(r#"{"tokenizer": {"stemming": true, "stopwords": true}}"#)?;
        let engine = SearchEngine::new(config);
        engine.build(parse_corpus(BUNDLED_CORPUS)?)?;

        let results = engine.search("mocking", &SearchOptions::default())?;
        let titles = titles(&engine, &results)?;
        position(&titles, "How to mock MIDP RecordStore");
        Ok(())
    }
}
