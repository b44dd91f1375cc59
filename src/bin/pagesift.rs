//! CLI binary for pagesift.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagesift::config::ServerConfig;
use pagesift::memory_index::{CONTENT_FIELD, FIELDS};
use pagesift::{AppConfig, SearchServer, load_corpus};
use pagesift_rank::{SearchOutcome, SearchRequest, WeightConfig, WeightStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// pagesift: page-level document search with tunable relevance ranking.
#[derive(Parser)]
#[command(name = "pagesift", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Additional JSON Lines corpus file (repeatable).
    #[arg(long = "corpus", global = true)]
    corpora: Vec<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search the corpus.
    Search {
        /// Query text. Several words are searched as one phrase.
        query: String,

        /// Maximum number of documents to show.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Only show documents by this author ("Unknown" for none).
        #[arg(short, long)]
        author: Option<String>,

        /// Print the full outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the distinct authors in the corpus.
    Authors,

    /// Show corpus size, indexed fields, common terms, sample pages and
    /// import problems.
    Inspect {
        /// Number of sample pages to print.
        #[arg(long, default_value_t = 3)]
        sample: usize,

        /// Number of most common content terms to list.
        #[arg(long, default_value_t = 10)]
        top_terms: usize,
    },

    /// Show or change the ranking weights.
    Weights {
        #[command(subcommand)]
        action: WeightsAction,
    },

    /// Run the HTTP search service.
    Serve {
        /// Interface to bind (overrides the config file).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides the config file).
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum WeightsAction {
    /// Print the current weights.
    Show,

    /// Replace all three weights.
    Set {
        /// Proximity weight.
        #[arg(allow_hyphen_values = true)]
        proximity: String,
        /// Position weight.
        #[arg(allow_hyphen_values = true)]
        position: String,
        /// Rarity (IDF) weight.
        #[arg(allow_hyphen_values = true)]
        idf: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pagesift=info,pagesift_rank=info")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let config = AppConfig::load_or_default(&config_path)?;

    match cli.command {
        Command::Search {
            query,
            top_k,
            author,
            json,
        } => run_search(&config, &cli.corpora, query, top_k, author, json),
        Command::Authors => list_authors(&config, &cli.corpora),
        Command::Inspect { sample, top_terms } => inspect(&config, &cli.corpora, sample, top_terms),
        Command::Weights { action } => run_weights(&config, action),
        Command::Serve { host, port } => serve(&config, &cli.corpora, host, port).await,
    }
}

fn run_search(
    config: &AppConfig,
    corpora: &[PathBuf],
    query: String,
    top_k: Option<usize>,
    author: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let loaded = load_corpus(config, corpora)?;
    let top_k = top_k.unwrap_or(config.search.default_top_k);
    let mut request = SearchRequest::new(query, top_k);
    request.author = author;

    let outcome = loaded.searcher.search_request(&request)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome {
        SearchOutcome::Success { results, metrics } => {
            for (rank, result) in results.iter().enumerate() {
                println!(
                    "{}. {} (pages {})  score {:.3}",
                    rank + 1,
                    result.path,
                    result.pages,
                    result.score
                );
                println!("   author: {}  created: {}", result.author, result.created);
                println!("   {}", result.snippet);
            }
            eprintln!(
                "{} documents from {} raw hits over {} pages in {} ms",
                results.len(),
                metrics.raw_hits,
                metrics.document_count,
                metrics.duration_ms
            );
        }
        SearchOutcome::Empty { reason, .. } => println!("No results: {reason}"),
    }
    Ok(())
}

fn list_authors(config: &AppConfig, corpora: &[PathBuf]) -> anyhow::Result<()> {
    let loaded = load_corpus(config, corpora)?;
    for author in loaded.searcher.authors() {
        println!("{author}");
    }
    Ok(())
}

fn inspect(
    config: &AppConfig,
    corpora: &[PathBuf],
    sample: usize,
    top_terms: usize,
) -> anyhow::Result<()> {
    let loaded = load_corpus(config, corpora)?;
    println!("Pages: {}", loaded.index.len());
    println!("Stored fields: {}", FIELDS.join(", "));
    let searched: Vec<String> = config
        .search
        .fields
        .iter()
        .map(|f| format!("{} x{}", f.name, f.boost))
        .collect();
    println!("Searched fields: {}", searched.join(", "));

    if top_terms > 0 {
        println!("\nMost common terms ({CONTENT_FIELD}):");
        for (term, count) in loaded.index.top_terms(CONTENT_FIELD, top_terms)? {
            println!("  {term}: {count}");
        }
    }

    for page in loaded.index.sample(sample) {
        println!("\n{} (page {})", page.path, page.page);
        println!("{}", serde_json::to_string_pretty(page)?);
    }

    if loaded.report.has_issues() {
        println!("\nImport problems ({}):", loaded.report.issues.len());
        for issue in &loaded.report.issues {
            println!("  {issue}");
        }
    }
    Ok(())
}

fn run_weights(config: &AppConfig, action: WeightsAction) -> anyhow::Result<()> {
    let store = WeightStore::open(config.weights.resolved_path())?;
    match action {
        WeightsAction::Show => {}
        WeightsAction::Set {
            proximity,
            position,
            idf,
        } => {
            let candidate = WeightConfig::parse(&proximity, &position, &idf)?;
            store.update(candidate)?;
        }
    }
    let current = store.current();
    println!("proximity_weight = {}", current.proximity_weight);
    println!("position_weight = {}", current.position_weight);
    println!("idf_weight = {}", current.idf_weight);
    if let Some(path) = store.path() {
        eprintln!("({})", path.display());
    }
    Ok(())
}

async fn serve(
    config: &AppConfig,
    corpora: &[PathBuf],
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let loaded = load_corpus(config, corpora)?;
    let server_config = ServerConfig {
        host: host.unwrap_or_else(|| config.server.host.clone()),
        port: port.unwrap_or(config.server.port),
    };

    let server = SearchServer::start(loaded.searcher, &server_config).await?;
    println!("pagesift v{} serving on http://{}", env!("CARGO_PKG_VERSION"), server.addr());

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C, shutting down...");
    server.shutdown();
    Ok(())
}
