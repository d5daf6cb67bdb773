//! Term → document occurrence data in one of three interchangeable layouts.
//!
//! Every layout answers "does term occur in document" and hands out a
//! per-term row; which one an index uses is fixed when it is built and
//! recorded in its metadata. All three persist with the same framing:
//!
//! ```text
//! u32 term_count
//!   u32 term_id, u32 doc_count
//!     u32 doc_id, u32 position_count, position_count × u32 position
//! ```
//!
//! Presence-only layouts always write `position_count = 0`.

mod bitset;
mod docset;
mod positional;

use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use bitset::BitsetPostings;
pub use docset::DocSetPostings;
pub use positional::PositionalPostings;

use crate::codec::{FrameReader, FrameWriter};
use crate::error::{Result, SearchError};
use crate::{DocId, Position, TermId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    Bitset,
    DocSet,
    Positional,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::Bitset => "bitset",
            Representation::DocSet => "doc_set",
            Representation::Positional => "positional",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Representation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bitset" => Ok(Representation::Bitset),
            "doc_set" | "doc-set" | "set" => Ok(Representation::DocSet),
            "positional" => Ok(Representation::Positional),
            other => Err(format!("unknown posting representation '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingStore {
    Bitset(BitsetPostings),
    DocSet(DocSetPostings),
    Positional(PositionalPostings),
}

impl PostingStore {
    pub fn new(representation: Representation) -> Self {
        match representation {
            Representation::Bitset => PostingStore::Bitset(BitsetPostings::new()),
            Representation::DocSet => PostingStore::DocSet(DocSetPostings::new()),
            Representation::Positional => PostingStore::Positional(PositionalPostings::new()),
        }
    }

    pub fn representation(&self) -> Representation {
        match self {
            PostingStore::Bitset(_) => Representation::Bitset,
            PostingStore::DocSet(_) => Representation::DocSet,
            PostingStore::Positional(_) => Representation::Positional,
        }
    }

    /// Makes a document known even if it ends up containing no term.
    /// Only the bitset layout needs this, to fix its bit ordering.
    pub fn register_document(&mut self, doc_id: DocId) {
        if let PostingStore::Bitset(store) = self {
            store.register_document(doc_id);
        }
    }

    /// Records that `term_id` occurs in `doc_id`. Positions are ignored by
    /// the presence-only layouts.
    pub fn record(&mut self, term_id: TermId, doc_id: DocId, positions: &[Position]) {
        match self {
            PostingStore::Bitset(store) => store.record(term_id, doc_id),
            PostingStore::DocSet(store) => store.record(term_id, doc_id),
            PostingStore::Positional(store) => store.record(term_id, doc_id, positions),
        }
    }

    pub fn contains(&self, term_id: TermId, doc_id: DocId) -> bool {
        match self {
            PostingStore::Bitset(store) => store.contains(term_id, doc_id),
            PostingStore::DocSet(store) => store.contains(term_id, doc_id),
            PostingStore::Positional(store) => store.contains(term_id, doc_id),
        }
    }

    pub fn term_count(&self) -> usize {
        match self {
            PostingStore::Bitset(store) => store.term_count(),
            PostingStore::DocSet(store) => store.term_count(),
            PostingStore::Positional(store) => store.term_count(),
        }
    }

    /// Documents containing `term_id`, ascending, whatever the layout.
    pub fn docs_for(&self, term_id: TermId) -> BTreeSet<DocId> {
        match self {
            PostingStore::Bitset(store) => store.docs_for(term_id),
            PostingStore::DocSet(store) => store.row(term_id).cloned().unwrap_or_default(),
            PostingStore::Positional(store) => store
                .row(term_id)
                .map(|docs| docs.keys().copied().collect())
                .unwrap_or_default(),
        }
    }

    /// Every document id the store refers to.
    pub fn referenced_docs(&self) -> BTreeSet<DocId> {
        match self {
            PostingStore::Bitset(store) => store.documents().iter().copied().collect(),
            PostingStore::DocSet(store) => store.iter().flat_map(|(_, docs)| docs.iter().copied()).collect(),
            PostingStore::Positional(store) => {
                store.iter().flat_map(|(_, docs)| docs.keys().copied()).collect()
            }
        }
    }

    pub fn as_bitset(&self) -> Option<&BitsetPostings> {
        match self {
            PostingStore::Bitset(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_positional(&self) -> Option<&PositionalPostings> {
        match self {
            PostingStore::Positional(store) => Some(store),
            _ => None,
        }
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<W> {
        let mut frames = FrameWriter::new(writer);
        frames.write_len(self.term_count())?;
        match self {
            PostingStore::Bitset(store) => {
                for term_id in store.term_ids() {
                    write_presence_row(&mut frames, term_id, &store.docs_for(term_id))?;
                }
            }
            PostingStore::DocSet(store) => {
                for (term_id, docs) in store.iter() {
                    write_presence_row(&mut frames, term_id, docs)?;
                }
            }
            PostingStore::Positional(store) => {
                for (term_id, docs) in store.iter() {
                    frames.write_u32(term_id)?;
                    frames.write_len(docs.len())?;
                    for (doc_id, positions) in docs {
                        frames.write_u32(*doc_id)?;
                        frames.write_len(positions.len())?;
                        for position in positions {
                            frames.write_u32(*position)?;
                        }
                    }
                }
            }
        }
        frames.into_inner()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.write_to(Vec::new())
    }

    /// Decodes a store on its own. The framing only carries documents that
    /// hold at least one term, so a bitset store comes back without the
    /// term-less ones; use [`PostingStore::deserialize_with_documents`] to
    /// keep the full universe.
    pub fn deserialize(bytes: &[u8], representation: Representation) -> Result<Self> {
        Self::deserialize_with_documents(bytes, representation, std::iter::empty())
    }

    /// Decodes a store after registering `documents` (ascending) with it, so
    /// bitset rows are laid out once instead of shifting on every late id.
    pub fn deserialize_with_documents<I>(bytes: &[u8], representation: Representation, documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = DocId>,
    {
        let mut reader = FrameReader::new(bytes);
        let mut store = PostingStore::new(representation);
        for doc_id in documents {
            store.register_document(doc_id);
        }
        let term_count = reader.read_count("posting term count", 8)?;
        for _ in 0..term_count {
            let term_id = reader.read_u32("term id")?;
            let doc_count = reader.read_count("posting document count", 8)?;
            for _ in 0..doc_count {
                let doc_id = reader.read_u32("document id")?;
                let position_count = reader.read_count("position count", 4)?;
                if position_count > 0 && representation != Representation::Positional {
                    return Err(SearchError::decode(format!(
                        "term {term_id} carries positions in a {representation} store"
                    )));
                }
                let mut positions = Vec::with_capacity(position_count);
                for _ in 0..position_count {
                    positions.push(reader.read_u32("position")?);
                }
                store.record(term_id, doc_id, &positions);
            }
        }
        reader.finish()?;
        Ok(store)
    }
}

fn write_presence_row<W: Write>(
    frames: &mut FrameWriter<W>,
    term_id: TermId,
    docs: &BTreeSet<DocId>,
) -> Result<()> {
    frames.write_u32(term_id)?;
    frames.write_len(docs.len())?;
    for doc_id in docs {
        frames.write_u32(*doc_id)?;
        frames.write_u32(0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(representation: Representation) -> PostingStore {
        let mut store = PostingStore::new(representation);
        let documents: Vec<(TermId, Vec<(DocId, Vec<Position>)>)> = vec![
            (15, vec![(2, vec![1, 5]), (5, vec![3])]),
            (27, vec![(1, vec![10, 20])]),
            (39, vec![(1, vec![4, 5, 6, 7]), (3, vec![2]), (4, vec![4, 6])]),
            (43, vec![(6, vec![5, 6, 7, 8])]),
            (53, vec![(4, vec![5, 7]), (5, vec![5])]),
        ];
        for (term, docs) in documents {
            for (doc, positions) in docs {
                store.record(term, doc, &positions);
            }
        }
        store
    }

    const ALL: [Representation; 3] =
        [Representation::Bitset, Representation::DocSet, Representation::Positional];

    #[test]
    fn every_layout_answers_membership_alike() {
        for representation in ALL {
            let store = sample(representation);
            for term in [15, 27, 39, 43, 53, 55] {
                for doc in 1..=6 {
                    let expected = match term {
                        15 => [2, 5].contains(&doc),
                        27 => doc == 1,
                        39 => [1, 3, 4].contains(&doc),
                        43 => doc == 6,
                        53 => [4, 5].contains(&doc),
                        _ => false,
                    };
                    assert_eq!(store.contains(term, doc), expected, "{representation} {term}/{doc}");
                }
            }
            assert_eq!(store.docs_for(39).into_iter().collect::<Vec<_>>(), vec![1, 3, 4]);
            assert!(store.docs_for(55).is_empty());
        }
    }

    #[test]
    fn round_trip_is_observationally_equal() {
        for representation in ALL {
            let store = sample(representation);
            let bytes = store.serialize().unwrap();
            let back = PostingStore::deserialize(&bytes, representation).unwrap();
            assert_eq!(back, store, "{representation}");
        }
    }

    fn wide_bitset(docs: DocId) -> PostingStore {
        let mut store = PostingStore::new(Representation::Bitset);
        for doc in 1..=docs {
            store.register_document(doc);
            store.record(1, doc, &[]);
        }
        for term in 2..=20 {
            store.record(term, 1, &[]);
            store.record(term, docs, &[]);
        }
        // registered, but holds no term
        store.register_document(docs + 1);
        store
    }

    #[test]
    fn bitset_decodes_against_known_documents() {
        let store = wide_bitset(2000);
        let bytes = store.serialize().unwrap();

        let back = PostingStore::deserialize_with_documents(&bytes, Representation::Bitset, 1..=2001).unwrap();
        assert_eq!(back, store);
        let bitset = back.as_bitset().unwrap();
        assert_eq!(bitset.document_count(), 2001);
        assert_eq!(bitset.decode(&bitset.row(7)), vec![2000, 1]);
        assert_eq!(bitset.decode(&bitset.row(1)).len(), 2000);
        assert!(!back.contains(1, 2001));
    }

    #[test]
    fn standalone_bitset_decode_drops_termless_documents() {
        let store = wide_bitset(10);
        let back = PostingStore::deserialize(&store.serialize().unwrap(), Representation::Bitset).unwrap();
        assert_eq!(back.as_bitset().unwrap().document_count(), 10);
        assert_eq!(back.docs_for(1), store.docs_for(1));
    }

    #[test]
    fn positional_layout_on_disk() {
        let mut store = PostingStore::new(Representation::Positional);
        store.record(7, 2, &[1, 4]);
        let bytes = store.serialize().unwrap();
        let words: Vec<u32> = bytes
            .chunks(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![1, 7, 1, 2, 2, 1, 4]);
    }

    #[test]
    fn presence_store_rejects_positions() {
        let bytes = sample(Representation::Positional).serialize().unwrap();
        let err = PostingStore::deserialize(&bytes, Representation::DocSet).unwrap_err();
        assert!(matches!(err, SearchError::Decode(_)));
    }

    #[test]
    fn truncated_store_fails_to_decode() {
        let bytes = sample(Representation::Positional).serialize().unwrap();
        let err = PostingStore::deserialize(&bytes[..bytes.len() - 2], Representation::Positional)
            .unwrap_err();
        assert!(matches!(err, SearchError::Decode(_)));
    }

    #[test]
    fn representation_parses_cli_spellings() {
        assert_eq!("doc-set".parse::<Representation>().unwrap(), Representation::DocSet);
        assert_eq!("positional".parse::<Representation>().unwrap(), Representation::Positional);
        assert!("matrix".parse::<Representation>().is_err());
    }
}
