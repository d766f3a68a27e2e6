use crate::model::ProductRecord;
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    /// Feature index names written alongside the text and review indices.
    #[serde(default)]
    pub features: Vec<String>,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn title(&self) -> PathBuf { self.root.join("index_title.json") }
    pub fn description(&self) -> PathBuf { self.root.join("index_description.json") }
    pub fn reviews(&self) -> PathBuf { self.root.join("index_reviews.json") }
    pub fn feature(&self, name: &str) -> PathBuf {
        self.root.join(format!("index_{}.json", file_slug(name)))
    }
    /// Product id and variant per corpus url.
    pub fn products(&self) -> PathBuf { self.root.join("products.json") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Lowercased name with anything outside `[a-z0-9]` collapsed to `_`.
fn file_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

fn replace_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    if path.exists() {
        tracing::info!(path = %path.display(), "removing previous output");
        fs::remove_file(path)?;
    }
    File::create(path).with_context(|| format!("creating {}", path.display()))
}

/// Write the corpus as NDJSON, one record per line, replacing any previous file.
pub fn write_corpus(path: &Path, corpus: &[ProductRecord]) -> Result<()> {
    let mut out = BufWriter::new(replace_file(path)?);
    for record in corpus {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

pub fn read_corpus(path: &Path) -> Result<Vec<ProductRecord>> {
    let f = File::open(path).with_context(|| format!("opening corpus {}", path.display()))?;
    let mut corpus = Vec::new();
    for (n, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let record: ProductRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid product record", path.display(), n + 1))?;
        corpus.push(record);
    }
    Ok(corpus)
}

/// Pretty-printed JSON document, replacing any previous file.
pub fn save_index<T: Serialize>(path: &Path, index: &T) -> Result<()> {
    let mut f = replace_file(path)?;
    let json = serde_json::to_string_pretty(index)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_index<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    save_index(&paths.meta(), meta)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    load_index(&paths.meta())
}
