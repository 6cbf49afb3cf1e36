//! docqa: build a vector index over a folder of documents and ask questions
//! against it.

use std::env;
use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use docqa_core::config::{resolve_with_base, Config, Settings};
use docqa_embed::get_default_embedder;
use docqa_rag::{render_answer, RagContext};
use docqa_vector::IndexBuilder;

#[derive(Parser, Debug)]
#[command(name = "docqa", version, about = "Question answering over local documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, chunk and embed every document, then write the index.
    Build {
        /// Source directory (default: data.docs_dir).
        #[arg(long)]
        docs: Option<String>,
        /// Index directory (default: data.index_dir).
        #[arg(long)]
        index: Option<String>,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
        /// Hide the progress bar.
        #[arg(long, short)]
        quiet: bool,
    },
    /// Answer a question, or read questions from stdin until EOF.
    Ask {
        question: Vec<String>,
        #[arg(long)]
        index: Option<String>,
        #[arg(long)]
        top_k: Option<usize>,
        /// Print the retrieved chunks before the answer.
        #[arg(long)]
        show_context: bool,
    },
    /// Describe the persisted index.
    Status {
        #[arg(long)]
        index: Option<String>,
        /// Load both artifacts and cross-check them.
        #[arg(long)]
        verify: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to read .env: {}", e);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    let base = env::current_dir()?;

    match cli.command {
        Command::Build { docs, index, chunk_size, overlap, quiet } => {
            if let Some(size) = chunk_size { settings.chunking.chunk_size = size; }
            if let Some(overlap) = overlap { settings.chunking.overlap = overlap; }
            settings.validate()?;
            let docs_dir = resolve_with_base(&base, docs.unwrap_or_else(|| settings.data.docs_dir.clone()));
            let index_dir = resolve_with_base(&base, index.unwrap_or_else(|| settings.data.index_dir.clone()));
            build(&settings, &docs_dir, &index_dir, quiet)
        }
        Command::Ask { question, index, top_k, show_context } => {
            if let Some(k) = top_k { settings.retrieval.top_k = k; }
            settings.validate()?;
            let index_dir = resolve_with_base(&base, index.unwrap_or_else(|| settings.data.index_dir.clone()));
            ask(settings, &index_dir, question.join(" "), show_context).await
        }
        Command::Status { index, verify } => {
            let index_dir = resolve_with_base(&base, index.unwrap_or_else(|| settings.data.index_dir.clone()));
            status(&index_dir, verify)
        }
    }
}

fn build(settings: &Settings, docs_dir: &Path, index_dir: &Path, quiet: bool) -> anyhow::Result<()> {
    println!("Building index\n==============");
    println!("Documents: {}", docs_dir.display());
    println!("Index:     {}", index_dir.display());

    let embedder = get_default_embedder(&settings.embedding)?;
    let (index, report) = IndexBuilder::new(embedder.as_ref())
        .with_chunking(settings.chunking)
        .with_progress(!quiet)
        .build_with_report(docs_dir)?;

    for skipped in &report.skipped {
        println!("⚠️  Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    let header = docqa_vector::persist(&index, index_dir)
        .with_context(|| format!("writing index to {}", index_dir.display()))?;

    println!(
        "\n✅ Indexed {} chunks from {} documents in {} ms ({})",
        header.count, report.documents_indexed, report.elapsed_ms, header.embedder_id
    );
    Ok(())
}

async fn ask(settings: Settings, index_dir: &Path, question: String, show_context: bool) -> anyhow::Result<()> {
    print_credential_status(&settings.generation.token_env);
    let ctx = RagContext::open(settings, index_dir)?;

    if !question.trim().is_empty() {
        answer_one(&ctx, &question, show_context).await?;
        return Ok(());
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"\nAsk a question about your documents: ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim();
        if line.is_empty() { continue; }
        answer_one(&ctx, line, show_context).await?;
    }
    Ok(())
}

async fn answer_one(ctx: &RagContext, question: &str, show_context: bool) -> anyhow::Result<()> {
    info!(question, "answering");
    let answer = if show_context {
        let hits = ctx.retrieval().search(question, ctx.settings().retrieval.top_k)?;
        for hit in &hits {
            println!(
                "[{} #{} d={:.4}] {}",
                hit.chunk.source_id.as_deref().unwrap_or("?"),
                hit.chunk.index,
                hit.distance,
                hit.chunk.text
            );
        }
        let texts: Vec<String> = hits.into_iter().map(|h| h.chunk.text).collect();
        render_answer(ctx.generator().answer(question, &texts).await)
    } else {
        ctx.answer_text(question).await?
    };
    println!("\n✅ Answer:\n{}", answer);
    Ok(())
}

fn print_credential_status(token_env: &str) {
    match env::var(token_env) {
        Ok(v) if !v.trim().is_empty() => println!("✅ {} loaded.", token_env),
        _ => println!("❌ {} not found. Set it in your environment or .env file.", token_env),
    }
}

fn status(index_dir: &Path, verify: bool) -> anyhow::Result<()> {
    if !docqa_vector::index_exists(index_dir) {
        println!("No index at {}. Run `docqa build` first.", index_dir.display());
        return Ok(());
    }
    let header = docqa_vector::read_header(index_dir)?;
    println!("Index:     {}", index_dir.display());
    println!("Embedder:  {}", header.embedder_id);
    println!("Dimension: {}", header.dim);
    println!("Entries:   {}", header.count);
    println!("Built at:  {}", header.built_at.to_rfc3339());
    if verify {
        let index = docqa_vector::load(index_dir)?;
        println!("✅ Artifacts consistent ({} entries)", index.chunks().len());
    }
    Ok(())
}
