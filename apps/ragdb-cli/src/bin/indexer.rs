use std::path::PathBuf;

use clap::Parser;
use ragdb_core::config::expand_path;
use ragdb_core::data_processor::DataProcessor;
use ragdb_embed::get_default_embedder;
use ragdb_query::{Corpus, IngestPipeline};

#[derive(Parser)]
#[command(name = "ragdb-indexer", version, about = "Chunk, embed and index a text corpus")]
struct Cli {
    /// Directory of .txt files (default: data.raw_txt_dir)
    data_dir: Option<PathBuf>,

    /// Q&A JSON file ({"qa_data": [{"question", "answer"}]}) to index alongside
    #[arg(long)]
    qa: Option<PathBuf>,

    /// Where to write the index (default: data.index_path)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Only read the first N text files
    #[arg(long)]
    limit: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ragdb_cli::init_logging(cli.verbose);
    let settings = ragdb_cli::load_settings()?;

    let data_dir = cli.data_dir.unwrap_or_else(|| expand_path(&settings.data.raw_txt_dir));
    let qa_path = cli.qa.or_else(|| settings.data.qa_json.as_deref().map(expand_path));
    let out = cli.out.unwrap_or_else(|| expand_path(&settings.data.index_path));

    println!("ragdb indexer\n=============");
    println!("Data directory: {}", data_dir.display());

    let processor = cli.limit.map(DataProcessor::with_limit).unwrap_or_default();
    let mut documents = processor.load_directory(&data_dir)?;
    if let Some(path) = &qa_path {
        println!("Q&A file: {}", path.display());
        documents.extend(processor.load_qa_json(path)?);
    }
    if documents.is_empty() {
        println!("⚠️  No documents found; the index will be empty");
    }

    let embedder = get_default_embedder(&settings.embedding)?;
    let pipeline = IngestPipeline::from_settings(&settings, embedder)?.with_progress(true);
    let corpus = Corpus::new();
    let report = pipeline.ingest(&corpus, &documents).await?;
    let written = corpus.snapshot().save(&out)?;
    tracing::info!("Saved snapshot v{} to {}", corpus.snapshot().version(), out.display());

    println!("\n✅ Indexing completed");
    println!("📊 {} documents, {} chunks, {} indexed, {} skipped", report.documents, report.chunks, report.indexed, report.skipped.len());
    for skipped in &report.skipped {
        tracing::warn!(chunk = %skipped.chunk_id, "skipped: {}", skipped.reason);
    }
    println!("💾 Wrote {} records to {}", written, out.display());
    println!("\n💡 To ask a question, use: cargo run --bin ragdb-ask -- '<question>'");
    Ok(())
}
