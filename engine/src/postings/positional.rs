use std::collections::BTreeMap;

use crate::{DocId, Position, TermId};

/// Per term, the 1-based token positions of every document it occurs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionalPostings {
    rows: BTreeMap<TermId, BTreeMap<DocId, Vec<Position>>>,
}

impl PositionalPostings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `positions` to the (term, doc) list. Callers never repeat a
    /// position for the same pair: each document is scanned exactly once.
    pub fn record(&mut self, term_id: TermId, doc_id: DocId, positions: &[Position]) {
        self.rows
            .entry(term_id)
            .or_default()
            .entry(doc_id)
            .or_default()
            .extend_from_slice(positions);
    }

    pub fn contains(&self, term_id: TermId, doc_id: DocId) -> bool {
        self.rows.get(&term_id).is_some_and(|docs| docs.contains_key(&doc_id))
    }

    pub fn row(&self, term_id: TermId) -> Option<&BTreeMap<DocId, Vec<Position>>> {
        self.rows.get(&term_id)
    }

    pub fn positions(&self, term_id: TermId, doc_id: DocId) -> Option<&[Position]> {
        self.rows.get(&term_id)?.get(&doc_id).map(Vec::as_slice)
    }

    pub fn term_count(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &BTreeMap<DocId, Vec<Position>>)> {
        self.rows.iter().map(|(term, docs)| (*term, docs))
    }
}
