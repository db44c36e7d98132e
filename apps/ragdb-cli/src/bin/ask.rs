use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ragdb_core::config::expand_path;
use ragdb_core::traits::GenerationProvider;
use ragdb_embed::get_default_embedder;
use ragdb_query::{Assistant, Corpus, OllamaGenerator, Snapshot};

#[derive(Parser)]
#[command(name = "ragdb-ask", version, about = "Answer a question from an indexed corpus")]
struct Cli {
    query: String,

    /// Number of chunks to retrieve (default: query.top_k)
    #[arg(short, long)]
    k: Option<usize>,

    /// Index file written by ragdb-indexer (default: data.index_path)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Print the retrieved chunks without calling the generator
    #[arg(long)]
    retrieve_only: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ragdb_cli::init_logging(cli.verbose);
    let settings = ragdb_cli::load_settings()?;

    let index_path = cli.index.unwrap_or_else(|| expand_path(&settings.data.index_path));
    let snapshot = Snapshot::load(&index_path, &settings.ingest, 1)?;
    tracing::debug!("Loaded {} entries from {}", snapshot.len(), index_path.display());
    let corpus = Arc::new(Corpus::from_snapshot(snapshot));

    let embedder = get_default_embedder(&settings.embedding)?;
    let generator: Arc<dyn GenerationProvider> = Arc::new(OllamaGenerator::from_settings(&settings.generation));
    let assistant = Assistant::from_settings(&settings, corpus, embedder, generator);
    let k = cli.k.unwrap_or(settings.query.top_k);

    if cli.retrieve_only {
        let results = assistant.retrieve(&cli.query, k).await?;
        println!("🔍 {} results for: \"{}\"", results.len(), cli.query);
        for r in &results {
            println!("\n  {}. distance={:.4}  id={}  offsets={}..{}", r.rank + 1, r.score, r.chunk.id, r.chunk.start_offset, r.chunk.end_offset);
            println!("     {}", r.chunk.text.replace('\n', " "));
        }
        return Ok(());
    }

    let answer = assistant.ask_with_k(&cli.query, k).await?;
    println!("{}", answer.text);
    println!("\n📎 Source: {} (distance {:.4})", answer.provenance.chunk.id, answer.provenance.score);
    Ok(())
}
