use std::collections::BTreeSet;

use crate::error::{Result, SearchError};
use crate::postings::{PostingStore, Representation};
use crate::symbols::SymbolTable;
use crate::{DocId, TermId};

/// Term and document symbol tables plus the postings that join them.
///
/// Built once, then only read: every query borrows it immutably.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    terms: SymbolTable,
    docs: SymbolTable,
    postings: PostingStore,
}

impl Index {
    /// An empty index ready for building. Both tables probe on id collisions.
    pub fn new(representation: Representation) -> Self {
        Index {
            terms: SymbolTable::reversible(),
            docs: SymbolTable::reversible(),
            postings: PostingStore::new(representation),
        }
    }

    /// Assembles a loaded index, checking that the parts agree.
    pub fn from_parts(terms: SymbolTable, docs: SymbolTable, mut postings: PostingStore) -> Result<Self> {
        if !docs.is_reversible() {
            return Err(SearchError::decode("document table must be reversible"));
        }
        let known: BTreeSet<DocId> = docs.iter_by_id().map(|(id, _)| id).collect();
        if let Some(orphan) = postings.referenced_docs().difference(&known).next() {
            return Err(SearchError::decode(format!("postings refer to unknown document {orphan}")));
        }
        for doc_id in &known {
            postings.register_document(*doc_id);
        }
        Ok(Index { terms, docs, postings })
    }

    pub fn representation(&self) -> Representation {
        self.postings.representation()
    }

    pub fn terms(&self) -> &SymbolTable {
        &self.terms
    }

    pub fn docs(&self) -> &SymbolTable {
        &self.docs
    }

    pub fn postings(&self) -> &PostingStore {
        &self.postings
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut SymbolTable, &mut SymbolTable, &mut PostingStore) {
        (&mut self.terms, &mut self.docs, &mut self.postings)
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.terms.lookup(term)
    }

    pub fn url(&self, doc_id: DocId) -> Option<&str> {
        self.docs.try_reverse_lookup(doc_id)
    }

    /// All document ids, ascending: the universe negation complements against.
    pub fn doc_ids(&self) -> BTreeSet<DocId> {
        self.docs.iter_by_id().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_postings_for_unknown_documents() {
        let mut docs = SymbolTable::reversible();
        docs.insert("http://a", 1);
        let mut postings = PostingStore::new(Representation::DocSet);
        postings.record(1, 2, &[]);
        let err = Index::from_parts(SymbolTable::forward(), docs, postings).unwrap_err();
        assert!(matches!(err, SearchError::Decode(_)));
    }

    #[test]
    fn registers_every_document_with_the_bitset() {
        let mut docs = SymbolTable::reversible();
        docs.insert("http://a", 1);
        docs.insert("http://b", 2);
        let mut postings = PostingStore::new(Representation::Bitset);
        postings.record(7, 2, &[]);
        let index = Index::from_parts(SymbolTable::forward(), docs, postings).unwrap();
        let bitset = index.postings().as_bitset().unwrap();
        assert_eq!(bitset.document_count(), 2);
        assert_eq!(index.doc_ids().into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }
}
