use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engine::text::{lemmatizer_for, TextNormalizer};
use engine::{IndexBuilder, IndexPaths, IndexStorage, MetaFile, Representation};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build an inverted index from a line-delimited JSON corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a JSONL file or a directory of them
    Build(BuildArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct BuildArgs {
    /// Input path (file or directory)
    #[arg(long)]
    input: PathBuf,
    /// Output index directory
    #[arg(long)]
    output: PathBuf,
    /// Posting layout: positional, doc-set or bitset
    #[arg(long, default_value = "positional")]
    representation: Representation,
    /// Term table path, defaults to <output>/words.dic
    #[arg(long)]
    words: Option<PathBuf>,
    /// Document table path, defaults to <output>/docs.dic
    #[arg(long)]
    docs: Option<PathBuf>,
    /// Posting file path, defaults to <output>/idx.idx
    #[arg(long)]
    index: Option<PathBuf>,
    /// Stemmer language, or `none`
    #[arg(long, default_value = "english")]
    language: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => build_index(&args),
    }
}

fn index_paths(args: &BuildArgs) -> IndexPaths {
    let mut paths = IndexPaths::new(&args.output);
    if let Some(words) = &args.words {
        paths = paths.with_words(words);
    }
    if let Some(docs) = &args.docs {
        paths = paths.with_docs(docs);
    }
    if let Some(index) = &args.index {
        paths = paths.with_postings(index);
    }
    paths
}

fn corpus_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }
    Ok(files)
}

fn build_index(args: &BuildArgs) -> Result<()> {
    let lemmatizer = lemmatizer_for(&args.language)
        .with_context(|| format!("no stemmer for language '{}'", args.language))?;
    let normalizer = TextNormalizer;
    let mut builder = IndexBuilder::new(args.representation, &normalizer, lemmatizer.as_ref());

    for file in corpus_files(&args.input)? {
        let reader = BufReader::new(File::open(&file).with_context(|| format!("opening {}", file.display()))?);
        let added = builder
            .add_jsonl(reader)
            .with_context(|| format!("reading corpus {}", file.display()))?;
        tracing::info!(file = %file.display(), added, "ingested corpus file");
    }
    let index = builder.finish();

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let meta = MetaFile::describe(&index, created_at).with_language(&args.language);
    let storage = IndexStorage::new(index_paths(args));
    storage.save(&index, &meta)?;

    tracing::info!(output = %args.output.display(), representation = %args.representation, "index build complete");
    Ok(())
}
