use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use okapi_core::{Document, SearchEngine, SearchHit, SearchOptions};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "okapi")]
#[command(about = "Index JSON documents in memory and rank them with BM25", long_about = None)]
struct Cli {
    /// JSON options file (k1, b, min_length, stop_words, stemming, custom_stem_rules, field_boosts)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    k1: Option<f64>,
    #[arg(long, global = true)]
    b: Option<f64>,
    #[arg(long, global = true)]
    min_length: Option<usize>,
    /// Enable the Porter-style stemmer
    #[arg(long, global = true, default_value_t = false)]
    stemming: bool,
    /// Stop word, may be repeated
    #[arg(long = "stop-word", global = true)]
    stop_words: Vec<String>,
    /// Field boost as field=weight, may be repeated
    #[arg(long = "boost", global = true, value_parser = parse_boost)]
    boosts: Vec<(String, f64)>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index input documents and run a query
    Search {
        /// Input path (JSON/JSONL file or directory)
        #[arg(long)]
        input: String,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 10)]
        top_k: usize,
        /// Match the query as an exact phrase
        #[arg(long, default_value_t = false)]
        phrase: bool,
        /// Build the index on worker threads
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Show how a piece of text is tokenized
    Tokenize {
        text: String,
        #[arg(long, default_value_t = false)]
        stats: bool,
    },
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    num_docs: usize,
    took_s: f64,
    results: Vec<Hit>,
}

#[derive(Serialize)]
struct Hit {
    index: u32,
    score: f64,
    document: Document,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let options = load_options(&cli)?;

    match cli.command {
        Commands::Search { input, query, top_k, phrase, parallel } => {
            search(&input, &query, top_k, phrase, parallel, options)
        }
        Commands::Tokenize { text, stats } => tokenize(&text, stats, options),
    }
}

fn parse_boost(s: &str) -> std::result::Result<(String, f64), String> {
    let (field, weight) =
        s.split_once('=').ok_or_else(|| format!("expected field=weight, got '{s}'"))?;
    let weight: f64 = weight.parse().map_err(|e| format!("bad weight '{weight}': {e}"))?;
    Ok((field.to_string(), weight))
}

fn load_options(cli: &Cli) -> Result<SearchOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let json =
                fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            SearchOptions::from_json(&json)?
        }
        None => SearchOptions::default(),
    };
    if let Some(k1) = cli.k1 { options.k1 = k1; }
    if let Some(b) = cli.b { options.b = b; }
    if let Some(min_length) = cli.min_length { options.tokenizer.min_length = min_length; }
    if cli.stemming { options.tokenizer.stemming = true; }
    options.tokenizer.stop_words.extend(cli.stop_words.iter().cloned());
    for (field, weight) in &cli.boosts {
        options.field_boosts.insert(field.clone(), *weight);
    }
    options.validate()?;
    Ok(options)
}

fn search(
    input: &str,
    query: &str,
    top_k: usize,
    phrase: bool,
    parallel: bool,
    options: SearchOptions,
) -> Result<()> {
    let docs = read_documents(Path::new(input))?;
    let start = std::time::Instant::now();
    let mut engine = SearchEngine::with_options(options)?;
    if parallel {
        engine.add_documents_parallel(docs)?;
    } else {
        engine.add_documents(docs);
    }
    tracing::info!(
        num_docs = engine.document_count(),
        num_terms = engine.index().vocabulary_size(),
        "ingested documents"
    );

    let hits: Vec<SearchHit> =
        if phrase { engine.search_phrase(query, top_k) } else { engine.search(query, top_k) };
    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        let document = engine.document(hit.index as usize)?.clone();
        results.push(Hit { index: hit.index, score: hit.score, document });
    }
    let took_s = start.elapsed().as_secs_f64();
    let out = SearchOutput { query, num_docs: engine.document_count(), took_s, results };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn tokenize(text: &str, stats: bool, options: SearchOptions) -> Result<()> {
    let engine = SearchEngine::with_options(options)?;
    let (tokens, s) = engine.tokenize(text, stats)?;
    let mut out = serde_json::json!({ "tokens": tokens });
    if stats {
        out["stats"] = serde_json::json!({
            "original_count": s.original_count,
            "removed_count": s.removed_count,
            "stemmed_count": s.stemmed_count,
            "elapsed_s": s.elapsed.as_secs_f64(),
        });
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn read_documents(input_path: &Path) -> Result<Vec<Document>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        let entries = WalkDir::new(input_path).sort_by_file_name().into_iter();
        for entry in entries.filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input path {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let at = || format!("{}:{}", file.display(), lineno + 1);
        let value: serde_json::Value = serde_json::from_str(&line).with_context(at)?;
        docs.push(Document::from_json(&value).with_context(at)?);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(Document::from_json(&v)?);
            }
        }
        other => docs.push(Document::from_json(&other)?),
    }
    Ok(())
}
