use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use postsearch::{
    api, format_results, load_corpus, parse_corpus, CorpusEntry, EngineConfig, SearchEngine, SearchOptions,
    BUNDLED_CORPUS,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Full-text search over the blog post corpus", long_about = None)]
struct Cli {
    /// JSON engine configuration (boosts, tokenizer stages, scoring parameters)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CorpusArgs {
    /// Corpus file (.json, lunr-store .js, optionally .gz). Defaults to the bundled posts.
    #[arg(short, long)]
    corpus: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single query and print ranked results
    Search {
        query: String,

        #[command(flatten)]
        corpus: CorpusArgs,

        /// Comma-separated fields to search (title, excerpt, categories, tags)
        #[arg(short, long, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Treat a trailing '*' as a prefix match
        #[arg(short, long)]
        prefix: bool,

        /// Truncate excerpts to this many characters
        #[arg(short, long)]
        snippet: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print index statistics
    Stats {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Serve the HTTP search API
    Serve {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(short, long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

fn read_records(args: &CorpusArgs) -> Result<Vec<CorpusEntry>> {
    match &args.corpus {
        Some(path) => load_corpus(path).with_context(|| format!("Failed to load corpus {}", path.display())),
        None => parse_corpus(BUNDLED_CORPUS).context("Bundled corpus is invalid"),
    }
}

fn build_engine(config: EngineConfig, args: &CorpusArgs) -> Result<SearchEngine> {
    let engine = SearchEngine::new(config);
    engine.build(read_records(args)?)?;
    Ok(engine)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("postsearch=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Search {
            query,
            corpus,
            fields,
            limit,
            prefix,
            snippet,
            json,
        } => {
            let engine = build_engine(config, &corpus)?;
            let options = SearchOptions {
                fields,
                limit,
                prefix_match: prefix,
                ..SearchOptions::default()
            };

            let start = Instant::now();
            let snapshot = engine.snapshot()?;
            let results = snapshot.search(&query, &options);
            let duration = start.elapsed();
            let formatted = format_results(&results.hits, snapshot.store(), snippet);

            if json {
                println!("{}", serde_json::to_string_pretty(&formatted)?);
            } else {
                println!(
                    "Search found {} documents in {:?}",
                    results.total_candidates, duration
                );
                println!();
                for (rank, hit) in formatted.iter().enumerate() {
                    println!("{:>3}. {:8.3}  {}", rank + 1, hit.score, hit.title);
                    println!("               {}", hit.url);
                    if snippet.is_some() {
                        println!("               {}", hit.excerpt);
                    }
                }
            }
        }
        Command::Stats { corpus } => {
            let engine = build_engine(config, &corpus)?;
            println!("{}", serde_json::to_string_pretty(&engine.stats()?)?);
        }
        Command::Serve { corpus, addr } => {
            let engine = Arc::new(build_engine(config, &corpus)?);
            let app = api::create_router(engine)
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive());

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!(%addr, "Serving search API");
            axum::serve(listener, app).await.context("Server error")?;
        }
    }

    Ok(())
}
