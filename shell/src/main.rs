use anyhow::{Context, Result};
use clap::Parser;
use engine::text::lemmatizer_for;
use engine::{IndexPaths, IndexStorage, SearchMode, SearchOutcome, Searcher};
use percent_encoding::percent_decode_str;
use tracing_subscriber::{fmt, EnvFilter};

use std::borrow::Cow;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shell", about = "Interactive query shell over a built index")]
struct Args {
    /// Directory holding the index artifacts
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// boolean or ranked
    #[arg(long, default_value_t = SearchMode::Boolean)]
    mode: SearchMode,
    /// Stemmer language, defaults to the one the index was built with
    #[arg(long)]
    language: Option<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let args = Args::parse();

    let (index, meta) = IndexStorage::new(IndexPaths::new(&args.index))
        .load()
        .with_context(|| format!("loading index from {}", args.index.display()))?;
    let language = meta.query_language(args.language.as_deref());
    let lemmatizer = lemmatizer_for(language).with_context(|| format!("no stemmer for language '{language}'"))?;
    tracing::info!(num_docs = meta.num_docs, representation = %meta.representation, language, "index loaded");

    let searcher = Searcher::new(&index, lemmatizer.as_ref());
    let stdin = io::stdin();
    run(&searcher, args.mode, stdin.lock(), io::stdout().lock())
}

/// Reads one query per line until `quit` or end of input.
fn run<R: BufRead, W: Write>(searcher: &Searcher<'_>, mode: SearchMode, input: R, mut out: W) -> Result<()> {
    let mut lines = input.lines();
    loop {
        write!(out, ">> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;
        if line.trim() == "quit" {
            break;
        }
        answer(searcher, mode, &line, &mut out)?;
    }
    Ok(())
}

fn answer<W: Write>(searcher: &Searcher<'_>, mode: SearchMode, query: &str, out: &mut W) -> Result<()> {
    let outcome = match searcher.search(query, mode) {
        Ok(outcome) => outcome,
        Err(e) if e.is_query_error() => {
            writeln!(out, "Sorry, I cannot execute your query: {e}")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    match outcome {
        SearchOutcome::EmptyQuery => writeln!(out, "Nothing to search")?,
        SearchOutcome::Matches(found) => {
            writeln!(out, "Total: {} doc(s) found", found.total)?;
            for hit in &found.hits {
                let url = readable_url(&hit.url);
                match hit.score {
                    Some(score) => writeln!(out, "r = {score} {url}")?,
                    None => writeln!(out, "{url}")?,
                }
            }
        }
    }
    Ok(())
}

/// Percent-decodes a stored url for display. Invalid UTF-8 is replaced.
fn readable_url(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}
