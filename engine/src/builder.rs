//! One-pass index construction from a line-delimited JSON corpus.

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::Deserialize;
use tracing::Span;

use crate::error::{Result, SearchError};
use crate::index::Index;
use crate::postings::Representation;
use crate::text::{Lemmatizer, Normalizer};
use crate::{DocId, Position, TermId};

/// One corpus record. Any other fields on the line are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    pub url: String,
    pub content: String,
}

pub struct IndexBuilder<'a> {
    normalizer: &'a dyn Normalizer,
    lemmatizer: &'a dyn Lemmatizer,
    index: Index,
    next_doc_id: DocId,
    next_term_id: TermId,
    skipped: usize,
    span: Span,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        representation: Representation,
        normalizer: &'a dyn Normalizer,
        lemmatizer: &'a dyn Lemmatizer,
    ) -> Self {
        IndexBuilder {
            normalizer,
            lemmatizer,
            index: Index::new(representation),
            next_doc_id: 1,
            next_term_id: 1,
            skipped: 0,
            span: tracing::info_span!("index_builder", %representation),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Indexes one document and returns its id, or `None` when the URL was
    /// already indexed (the record is skipped).
    pub fn add_document(&mut self, url: &str, content: &str) -> Option<DocId> {
        let proposed = self.next_doc_id;
        self.next_doc_id += 1;

        let (terms, docs, postings) = self.index.parts_mut();
        if docs.lookup(url).is_some() {
            tracing::warn!(parent: &self.span, url, "duplicate document url, skipping");
            self.skipped += 1;
            return None;
        }
        let doc_id = docs.insert(url, proposed);
        postings.register_document(doc_id);

        let mut occurrences: BTreeMap<TermId, Vec<Position>> = BTreeMap::new();
        for (offset, token) in self.normalizer.normalize(content).iter().enumerate() {
            let lemma = self.lemmatizer.lemmatize(token);
            if lemma.is_empty() {
                continue;
            }
            let term_id = terms.insert(&lemma, self.next_term_id);
            if term_id >= self.next_term_id {
                self.next_term_id = term_id + 1;
            }
            occurrences.entry(term_id).or_default().push(offset as Position + 1);
        }
        for (term_id, positions) in &occurrences {
            postings.record(*term_id, doc_id, positions);
        }
        tracing::trace!(parent: &self.span, doc_id, url, terms = occurrences.len(), "indexed document");
        Some(doc_id)
    }

    /// Reads `{"url": ..., "content": ...}` records, one per line, and
    /// returns how many were indexed. Blank lines are skipped; a malformed
    /// line aborts the build.
    pub fn add_jsonl<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let mut added = 0;
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: RawDocument = serde_json::from_str(&line).map_err(|e| {
                tracing::error!(parent: &self.span, line = line_no + 1, error = %e, "bad corpus record");
                SearchError::Json(e)
            })?;
            if self.add_document(&doc.url, &doc.content).is_some() {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn finish(self) -> Index {
        tracing::info!(
            parent: &self.span,
            num_docs = self.index.num_docs(),
            num_terms = self.index.num_terms(),
            skipped = self.skipped,
            "index built"
        );
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{IdentityLemmatizer, TextNormalizer};

    #[test]
    fn assigns_ids_from_one_and_records_positions() {
        let mut builder = IndexBuilder::new(Representation::Positional, &TextNormalizer, &IdentityLemmatizer);
        assert_eq!(builder.add_document("http://a", "Red apple, green apple."), Some(1));
        assert_eq!(builder.add_document("http://b", "green tea"), Some(2));
        let index = builder.finish();

        assert_eq!(index.term_id("red"), Some(1));
        assert_eq!(index.term_id("apple"), Some(2));
        assert_eq!(index.term_id("green"), Some(3));
        assert_eq!(index.term_id("tea"), Some(4));
        let positional = index.postings().as_positional().unwrap();
        assert_eq!(positional.positions(2, 1), Some(&[2, 4][..]));
        assert_eq!(positional.positions(3, 2), Some(&[1][..]));
        assert_eq!(index.url(2), Some("http://b"));
    }

    #[test]
    fn duplicate_url_is_skipped() {
        let mut builder = IndexBuilder::new(Representation::DocSet, &TextNormalizer, &IdentityLemmatizer);
        builder.add_document("http://a", "one");
        assert_eq!(builder.add_document("http://a", "two"), None);
        assert_eq!(builder.add_document("http://b", "two"), Some(3));
        assert_eq!(builder.skipped(), 1);
        let index = builder.finish();
        assert_eq!(index.num_docs(), 2);
        assert!(!index.postings().contains(index.term_id("two").unwrap(), 1));
    }

    #[test]
    fn reads_jsonl_records() {
        let corpus = "{\"url\": \"http://a\", \"content\": \"alpha beta\"}\n\n{\"url\": \"http://b\", \"content\": \"beta\", \"title\": \"x\"}\n";
        let mut builder = IndexBuilder::new(Representation::Bitset, &TextNormalizer, &IdentityLemmatizer);
        assert_eq!(builder.add_jsonl(corpus.as_bytes()).unwrap(), 2);
        let index = builder.finish();
        let beta = index.term_id("beta").unwrap();
        assert!(index.postings().contains(beta, 1));
        assert!(index.postings().contains(beta, 2));
    }

    #[test]
    fn malformed_record_aborts() {
        let corpus = "{\"url\": \"http://a\"}\n";
        let mut builder = IndexBuilder::new(Representation::Positional, &TextNormalizer, &IdentityLemmatizer);
        assert!(matches!(builder.add_jsonl(corpus.as_bytes()), Err(SearchError::Json(_))));
    }
}
