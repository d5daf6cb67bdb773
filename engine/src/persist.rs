use std::fs::{self, create_dir_all, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::error::{Result, SearchError};
use crate::index::Index;
use crate::postings::{PostingStore, Representation};
use crate::symbols::{SymbolMode, SymbolTable};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub representation: Representation,
    pub created_at: String,
    pub version: u32,
    /// Stemmer the index was built with; queries must be lemmatized alike.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "english".to_string()
}

impl MetaFile {
    pub fn describe(index: &Index, created_at: impl Into<String>) -> Self {
        MetaFile {
            num_docs: index.num_docs() as u32,
            num_terms: index.num_terms() as u32,
            representation: index.representation(),
            created_at: created_at.into(),
            version: FORMAT_VERSION,
            language: default_language(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// The stemmer language to query with: `requested` when given, the
    /// recorded build language otherwise.
    pub fn query_language<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(language) => {
                if !language.eq_ignore_ascii_case(&self.language) {
                    tracing::warn!(
                        requested = language,
                        built_with = %self.language,
                        "query language differs from the one the index was built with"
                    );
                }
                language
            }
            None => &self.language,
        }
    }
}

/// Locations of the four index artifacts. Each can be overridden on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub words: PathBuf,
    pub docs: PathBuf,
    pub postings: PathBuf,
    pub meta: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        IndexPaths {
            words: root.join("words.dic"),
            docs: root.join("docs.dic"),
            postings: root.join("idx.idx"),
            meta: root.join("meta.json"),
        }
    }

    pub fn with_words<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.words = path.into();
        self
    }

    pub fn with_docs<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.docs = path.into();
        self
    }

    pub fn with_postings<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.postings = path.into();
        self
    }

    pub fn with_meta<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.meta = path.into();
        self
    }

    fn all(&self) -> [&Path; 4] {
        [self.words.as_path(), self.docs.as_path(), self.postings.as_path(), self.meta.as_path()]
    }
}

/// Saves and loads a whole index. Either every artifact is written and
/// read back, or the operation fails as a unit.
pub struct IndexStorage {
    paths: IndexPaths,
    span: Span,
}

impl IndexStorage {
    pub fn new(paths: IndexPaths) -> Self {
        IndexStorage { paths, span: tracing::info_span!("index_storage") }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    /// Encodes everything in memory first, then writes each artifact to a
    /// temporary sibling and renames it into place.
    pub fn save(&self, index: &Index, meta: &MetaFile) -> Result<()> {
        let words = index.terms().serialize()?;
        let docs = index.docs().serialize()?;
        let postings = index.postings().serialize()?;
        let meta_json = serde_json::to_string_pretty(meta)?;

        let artifacts: [(&Path, &[u8]); 4] = [
            (self.paths.words.as_path(), words.as_slice()),
            (self.paths.docs.as_path(), docs.as_slice()),
            (self.paths.postings.as_path(), postings.as_slice()),
            (self.paths.meta.as_path(), meta_json.as_bytes()),
        ];
        let mut staged = Vec::with_capacity(artifacts.len());
        for (path, bytes) in artifacts {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                create_dir_all(dir)?;
            }
            let tmp = staging_path(path);
            let mut f = BufWriter::new(File::create(&tmp)?);
            f.write_all(bytes)?;
            f.flush()?;
            staged.push((tmp, path));
        }
        for (tmp, path) in staged {
            fs::rename(&tmp, path)?;
        }

        tracing::info!(parent: &self.span, path = %self.paths.words.display(), elements = index.num_terms(), "saved term table");
        tracing::info!(parent: &self.span, path = %self.paths.docs.display(), elements = index.num_docs(), "saved document table");
        tracing::info!(
            parent: &self.span,
            path = %self.paths.postings.display(),
            elements = index.postings().term_count(),
            representation = %index.representation(),
            "saved postings"
        );
        Ok(())
    }

    pub fn load_meta(&self) -> Result<MetaFile> {
        let mut f = File::open(&self.paths.meta)?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        let meta: MetaFile = serde_json::from_str(&buf)?;
        if meta.version != FORMAT_VERSION {
            return Err(SearchError::decode(format!(
                "index format version {} is not supported (expected {FORMAT_VERSION})",
                meta.version
            )));
        }
        Ok(meta)
    }

    pub fn load(&self) -> Result<(Index, MetaFile)> {
        let meta = self.load_meta()?;

        let terms = SymbolTable::deserialize(&read_bytes(&self.paths.words)?, SymbolMode::Forward)?;
        tracing::info!(parent: &self.span, path = %self.paths.words.display(), elements = terms.len(), "loaded term table");

        let docs = SymbolTable::deserialize(&read_bytes(&self.paths.docs)?, SymbolMode::Reversible)?;
        tracing::info!(parent: &self.span, path = %self.paths.docs.display(), elements = docs.len(), "loaded document table");

        let postings = PostingStore::deserialize_with_documents(
            &read_bytes(&self.paths.postings)?,
            meta.representation,
            docs.iter_by_id().map(|(id, _)| id),
        )?;
        tracing::info!(
            parent: &self.span,
            path = %self.paths.postings.display(),
            elements = postings.term_count(),
            representation = %meta.representation,
            "loaded postings"
        );

        if docs.len() != meta.num_docs as usize || terms.len() != meta.num_terms as usize {
            return Err(SearchError::decode(format!(
                "metadata expects {} docs and {} terms, artifacts hold {} and {}",
                meta.num_docs,
                meta.num_terms,
                docs.len(),
                terms.len()
            )));
        }
        let index = Index::from_parts(terms, docs, postings)?;
        Ok((index, meta))
    }

    pub fn exists(&self) -> bool {
        self.paths.all().iter().all(|p| p.exists())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_without_language_means_english() {
        let meta: MetaFile = serde_json::from_str(
            r#"{"num_docs": 2, "num_terms": 5, "representation": "doc_set", "created_at": "now", "version": 1}"#,
        )
        .unwrap();
        assert_eq!(meta.language, "english");
        assert_eq!(meta.representation, Representation::DocSet);
    }

    #[test]
    fn query_language_defaults_to_build_language() {
        let meta = MetaFile::describe(&Index::new(Representation::Positional), "now").with_language("none");
        assert_eq!(meta.query_language(None), "none");
        assert_eq!(meta.query_language(Some("russian")), "russian");
    }

    #[test]
    fn staging_path_is_a_sibling() {
        assert_eq!(staging_path(Path::new("/idx/words.dic")), PathBuf::from("/idx/words.dic.tmp"));
    }
}
