use std::collections::{BTreeMap, BTreeSet};

use bit_vec::BitVec;

use crate::{DocId, TermId};

/// Presence rows as dense bitsets over every registered document.
///
/// Slot `i` of a row belongs to the `i`-th smallest registered doc id, so
/// slot 0 (the earliest document) is the most significant bit when a row is
/// read as one big integer. Rows are stored only as long as their last set
/// bit and padded with zeros on the way out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitsetPostings {
    docs: Vec<DocId>,
    rows: BTreeMap<TermId, BitVec>,
}

impl BitsetPostings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document and returns its slot.
    pub fn register_document(&mut self, doc_id: DocId) -> usize {
        match self.docs.binary_search(&doc_id) {
            Ok(slot) => slot,
            Err(slot) => {
                self.docs.insert(slot, doc_id);
                if slot + 1 < self.docs.len() {
                    // an out-of-order id shifts every later slot by one
                    for row in self.rows.values_mut() {
                        if row.len() > slot {
                            *row = with_bit_inserted(row, slot);
                        }
                    }
                }
                slot
            }
        }
    }

    pub fn record(&mut self, term_id: TermId, doc_id: DocId) {
        let slot = self.register_document(doc_id);
        let row = self.rows.entry(term_id).or_default();
        if row.len() <= slot {
            let missing = slot + 1 - row.len();
            row.grow(missing, false);
        }
        row.set(slot, true);
    }

    pub fn contains(&self, term_id: TermId, doc_id: DocId) -> bool {
        let Ok(slot) = self.docs.binary_search(&doc_id) else {
            return false;
        };
        self.rows
            .get(&term_id)
            .and_then(|row| row.get(slot))
            .unwrap_or(false)
    }

    /// Row for `term_id`, one bit per registered document; all zeros when unknown.
    pub fn row(&self, term_id: TermId) -> BitVec {
        match self.rows.get(&term_id) {
            Some(row) => {
                let mut row = row.clone();
                row.grow(self.docs.len() - row.len(), false);
                row
            }
            None => self.empty_row(),
        }
    }

    pub fn empty_row(&self) -> BitVec {
        BitVec::from_elem(self.docs.len(), false)
    }

    pub fn full_row(&self) -> BitVec {
        BitVec::from_elem(self.docs.len(), true)
    }

    /// Registered documents in slot order.
    pub fn documents(&self) -> &[DocId] {
        &self.docs
    }

    pub fn document_count(&self) -> usize {
        self.docs.len()
    }

    pub fn term_count(&self) -> usize {
        self.rows.len()
    }

    pub fn term_ids(&self) -> impl Iterator<Item = TermId> + '_ {
        self.rows.keys().copied()
    }

    /// Document ids set in `bits`, latest document first.
    pub fn decode(&self, bits: &BitVec) -> Vec<DocId> {
        bits.iter()
            .zip(&self.docs)
            .filter_map(|(set, doc_id)| set.then_some(*doc_id))
            .rev()
            .collect()
    }

    pub fn docs_for(&self, term_id: TermId) -> BTreeSet<DocId> {
        match self.rows.get(&term_id) {
            Some(row) => row
                .iter()
                .zip(&self.docs)
                .filter_map(|(set, doc_id)| set.then_some(*doc_id))
                .collect(),
            None => BTreeSet::new(),
        }
    }
}

fn with_bit_inserted(row: &BitVec, slot: usize) -> BitVec {
    row.iter()
        .take(slot)
        .chain(std::iter::once(false))
        .chain(row.iter().skip(slot))
        .collect()
}
