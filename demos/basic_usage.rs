use postsearch::{format_results, parse_corpus, SearchEngine, SearchOptions, BUNDLED_CORPUS};

fn main() -> anyhow::Result<()> {
    println!("=== postsearch basic usage ===\n");

    let engine = SearchEngine::default();
    let report = engine.build(parse_corpus(BUNDLED_CORPUS)?)?;
    println!(
        "Indexed {} posts ({} terms, {} rejected)\n",
        report.indexed,
        report.terms,
        report.rejected.len()
    );

    // Example 1: Plain ranked search
    println!("--- Example 1: 'Spring' ---");
    let snapshot = engine.snapshot()?;
    let results = snapshot.search("Spring", &SearchOptions::default().with_limit(5));
    for hit in format_results(&results.hits, snapshot.store(), None) {
        println!("  {:7.3}  {}", hit.score, hit.title);
    }
    println!("  ({} matching posts)\n", results.total_candidates);

    // Example 2: Multi-term query, posts matching both terms come first
    println!("--- Example 2: 'AWS Lambda' ---");
    let results = snapshot.search("AWS Lambda", &SearchOptions::default().with_limit(5));
    for hit in format_results(&results.hits, snapshot.store(), Some(60)) {
        println!("  {:7.3}  {}\n           {}", hit.score, hit.title, hit.excerpt);
    }
    println!();

    // Example 3: Restrict to titles
    println!("--- Example 3: 'gradle' in titles only ---");
    let results = engine.search("gradle", &SearchOptions::default().with_fields(["title"]))?;
    for hit in &results.hits {
        println!("  {:7.3}  {}", hit.score, hit.reference);
    }
    println!();

    // Example 4: Prefix match
    println!("--- Example 4: 'cloud*' with prefix matching ---");
    let options = SearchOptions::default().with_prefix_match(true).with_limit(5);
    let results = snapshot.search("cloud*", &options);
    for hit in format_results(&results.hits, snapshot.store(), None) {
        println!("  {:7.3}  {}", hit.score, hit.title);
    }

    Ok(())
}
