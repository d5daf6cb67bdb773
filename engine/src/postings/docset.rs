use std::collections::{BTreeMap, BTreeSet};

use crate::{DocId, TermId};

/// Presence-only postings: the set of documents containing each term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocSetPostings {
    rows: BTreeMap<TermId, BTreeSet<DocId>>,
}

impl DocSetPostings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, term_id: TermId, doc_id: DocId) {
        self.rows.entry(term_id).or_default().insert(doc_id);
    }

    pub fn contains(&self, term_id: TermId, doc_id: DocId) -> bool {
        self.rows.get(&term_id).is_some_and(|docs| docs.contains(&doc_id))
    }

    /// Documents containing `term_id`; `None` reads as the empty set.
    pub fn row(&self, term_id: TermId) -> Option<&BTreeSet<DocId>> {
        self.rows.get(&term_id)
    }

    pub fn term_count(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &BTreeSet<DocId>)> {
        self.rows.iter().map(|(term, docs)| (*term, docs))
    }
}
