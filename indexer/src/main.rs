use anyhow::{bail, Result};
use catalog::persist::{read_corpus, save_index, save_meta, IndexPaths, MetaFile};
use catalog::{FeatureIndex, InvertedIndex, ProductRecord, ProductRef, ReviewIndex, Tokenizer, TokenizerConfig};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build positional, review and feature indices from a product corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every index from a JSONL corpus file or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long, default_value = "./output/products.jsonl")]
        input: String,
        /// Output index directory
        #[arg(long, default_value = "./index")]
        output: String,
        /// Feature index to build, as NAME or NAME=KEY (e.g. origin=made in)
        #[arg(long = "feature", default_values_t = default_features())]
        features: Vec<FeatureSpec>,
        /// Apply English stemming to tokens
        #[arg(long, default_value_t = false)]
        stem: bool,
    },
}

/// A feature index: `name` picks the output file, `key` the product feature read.
#[derive(Debug, Clone, PartialEq)]
struct FeatureSpec {
    name: String,
    key: String,
}

impl FromStr for FeatureSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, key) = match s.split_once('=') {
            Some((name, key)) => (name.trim(), key.trim()),
            None => (s.trim(), s.trim()),
        };
        if name.is_empty() || key.is_empty() {
            return Err(format!("invalid feature spec {s:?}, expected NAME or NAME=KEY"));
        }
        Ok(Self { name: name.to_string(), key: key.to_string() })
    }
}

impl std::fmt::Display for FeatureSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name == self.key { write!(f, "{}", self.name) } else { write!(f, "{}={}", self.name, self.key) }
    }
}

fn default_features() -> Vec<FeatureSpec> {
    ["brand", "origin=made in", "material"]
        .iter()
        .map(|s| s.parse().expect("valid default feature"))
        .collect()
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, features, stem } => {
            let tokenizer = Tokenizer::new(TokenizerConfig { stem });
            build_indices(Path::new(&input), Path::new(&output), &features, &tokenizer)
        }
    }
}

fn corpus_files(input_path: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input {} does not exist", input_path.display());
    }
    Ok(files)
}

fn load_corpus(input_path: &Path) -> Result<Vec<ProductRecord>> {
    let mut corpus = Vec::new();
    for file in corpus_files(input_path)? {
        let records = read_corpus(&file)?;
        tracing::info!(file = %file.display(), records = records.len(), "corpus file loaded");
        corpus.extend(records);
    }
    Ok(dedup_by_url(corpus))
}

/// One record per url: the last one read wins, at the first one's position.
fn dedup_by_url(records: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut slot: HashMap<String, usize> = HashMap::new();
    let mut corpus: Vec<ProductRecord> = Vec::with_capacity(records.len());
    for record in records {
        match slot.get(&record.url) {
            Some(&i) => {
                tracing::warn!(url = %record.url, "duplicate url in corpus, keeping the later record");
                corpus[i] = record;
            }
            None => {
                slot.insert(record.url.clone(), corpus.len());
                corpus.push(record);
            }
        }
    }
    corpus
}

fn build_indices(input: &Path, output: &Path, features: &[FeatureSpec], tokenizer: &Tokenizer) -> Result<()> {
    let corpus = load_corpus(input)?;
    tracing::info!(num_docs = corpus.len(), "ingested products");

    let out_paths = IndexPaths::new(output);
    fs::create_dir_all(&out_paths.root)?;

    save_index(&out_paths.title(), &InvertedIndex::build(&corpus, "title", tokenizer))?;
    save_index(&out_paths.description(), &InvertedIndex::build(&corpus, "description", tokenizer))?;
    save_index(&out_paths.reviews(), &ReviewIndex::build(&corpus))?;
    for spec in features {
        let index = FeatureIndex::build(&corpus, &spec.key, tokenizer);
        save_index(&out_paths.feature(&spec.name), &index)?;
    }
    let products: Vec<ProductRef> = corpus.iter().map(|r| ProductRef::from_url(&r.url)).collect();
    save_index(&out_paths.products(), &products)?;

    let meta = MetaFile {
        num_docs: corpus.len() as u32,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_default(),
        version: 1,
        features: features.iter().map(|f| f.name.clone()).collect(),
    };
    save_meta(&out_paths, &meta)?;

    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}
