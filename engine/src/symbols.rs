//! Bidirectional string ⇄ id registry used for both terms and documents.

use std::collections::HashMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::codec::{FrameReader, FrameWriter};
use crate::error::Result;

pub type SymbolId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolMode {
    /// Caller-supplied ids are bound as given; no id → key view.
    Forward,
    /// Ids are unique and probed forward on collision; keeps an id-ordered reverse view.
    Reversible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    mode: SymbolMode,
    ids: HashMap<String, SymbolId>,
    /// Keys in insertion order; this is the on-disk order.
    order: Vec<String>,
    /// Sorted by id. Only populated in reversible mode.
    reverse: Vec<(SymbolId, String)>,
}

impl SymbolTable {
    pub fn new(mode: SymbolMode) -> Self {
        SymbolTable { mode, ids: HashMap::new(), order: Vec::new(), reverse: Vec::new() }
    }

    pub fn forward() -> Self {
        Self::new(SymbolMode::Forward)
    }

    pub fn reversible() -> Self {
        Self::new(SymbolMode::Reversible)
    }

    pub fn mode(&self) -> SymbolMode {
        self.mode
    }

    pub fn is_reversible(&self) -> bool {
        self.mode == SymbolMode::Reversible
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Binds `key` and returns its id.
    ///
    /// A key that is already present keeps its id and the table is left
    /// untouched. In reversible mode `proposed` is only a hint: if it is
    /// taken, `proposed + 1`, `proposed + 2`, ... are tried until a free id
    /// is found.
    pub fn insert(&mut self, key: &str, proposed: SymbolId) -> SymbolId {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        let id = match self.mode {
            SymbolMode::Forward => proposed,
            SymbolMode::Reversible => {
                let mut id = proposed;
                let slot = loop {
                    match self.reverse.binary_search_by_key(&id, |(bound, _)| *bound) {
                        Ok(_) => id = id.checked_add(1).expect("symbol id space exhausted"),
                        Err(slot) => break slot,
                    }
                };
                self.reverse.insert(slot, (id, key.to_string()));
                id
            }
        };
        self.ids.insert(key.to_string(), id);
        self.order.push(key.to_string());
        id
    }

    pub fn lookup(&self, key: &str) -> Option<SymbolId> {
        self.ids.get(key).copied()
    }

    /// Returns the key bound to `id`, or `None` when the id is unbound.
    ///
    /// # Panics
    /// Panics on a forward-only table, which keeps no reverse view.
    pub fn try_reverse_lookup(&self, id: SymbolId) -> Option<&str> {
        assert!(self.is_reversible(), "reverse lookup on a forward-only symbol table");
        self.reverse
            .binary_search_by_key(&id, |(bound, _)| *bound)
            .ok()
            .map(|slot| self.reverse[slot].1.as_str())
    }

    /// # Panics
    /// Panics on a forward-only table or when `id` is not bound.
    pub fn reverse_lookup(&self, id: SymbolId) -> &str {
        match self.try_reverse_lookup(id) {
            Some(key) => key,
            None => panic!("symbol id {id} is not bound"),
        }
    }

    /// `(id, key)` pairs in ascending id order. Empty for forward-only tables.
    pub fn iter_by_id(&self) -> impl Iterator<Item = (SymbolId, &str)> {
        self.reverse.iter().map(|(id, key)| (*id, key.as_str()))
    }

    /// `(key, id)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SymbolId)> {
        self.order.iter().map(move |key| (key.as_str(), self.ids[key]))
    }

    /// Smallest id strictly above every bound id, or 0 when empty.
    pub fn next_free_id(&self) -> SymbolId {
        self.ids.values().max().map_or(0, |max| max.saturating_add(1))
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<W> {
        let mut frames = FrameWriter::new(writer);
        frames.write_len(self.len())?;
        for (key, id) in self.iter() {
            frames.write_str(key)?;
            frames.write_u32(id)?;
        }
        frames.into_inner()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.write_to(Vec::new())
    }

    /// Rebuilds a table by replaying the persisted entries through [`insert`](Self::insert).
    pub fn deserialize(bytes: &[u8], mode: SymbolMode) -> Result<Self> {
        let mut reader = FrameReader::new(bytes);
        // key length + id
        let count = reader.read_count("symbol entry count", 8)?;
        let mut table = SymbolTable::new(mode);
        for _ in 0..count {
            let key = reader.read_str("symbol key")?;
            let id = reader.read_u32("symbol id")?;
            table.insert(&key, id);
        }
        reader.finish()?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;

    #[test]
    fn forward_insert_keeps_first_id() {
        let mut t = SymbolTable::forward();
        assert_eq!(t.insert("груша", 42), 42);
        assert_eq!(t.insert("груша", 43), 42);
        assert_eq!(t.lookup("груша"), Some(42));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn forward_binds_proposed_id_even_if_taken() {
        let mut t = SymbolTable::forward();
        t.insert("a", 1);
        assert_eq!(t.insert("b", 1), 1);
    }

    #[test]
    fn reversible_probes_past_taken_ids() {
        let mut t = SymbolTable::reversible();
        t.insert("a", 1);
        t.insert("b", 1);
        t.insert("cd", 5);
        t.insert("bazingaaaaaaa", 4);
        t.insert("a", 5);
        t.insert("b", 6);
        t.insert("cd", 7);
        t.insert("b", 10);
        t.insert("bazingaaaaaaa", 11);

        assert_eq!(t.len(), 4);
        assert_eq!(t.lookup("a"), Some(1));
        assert_eq!(t.lookup("b"), Some(2));
        assert_eq!(t.lookup("cd"), Some(5));
        assert_eq!(t.lookup("bazingaaaaaaa"), Some(4));
        assert_eq!(t.lookup("bazinga"), None);
    }

    #[test]
    fn probing_walks_over_a_run_of_taken_ids() {
        let mut t = SymbolTable::reversible();
        for (i, key) in ["x", "y", "z"].iter().enumerate() {
            t.insert(key, 10 + i as u32);
        }
        assert_eq!(t.insert("w", 10), 13);
        assert_eq!(t.reverse_lookup(13), "w");
    }

    #[test]
    fn reverse_view_is_strictly_increasing() {
        let mut t = SymbolTable::reversible();
        for (key, id) in [("q", 9), ("w", 3), ("e", 3), ("r", 1), ("t", 9), ("y", 2), ("u", 4)] {
            t.insert(key, id);
        }
        let ids: Vec<_> = t.iter_by_id().map(|(id, _)| id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "{ids:?}");
        assert_eq!(ids.len(), t.len());
    }

    #[test]
    fn reverse_lookup_finds_keys() {
        let mut t = SymbolTable::reversible();
        t.insert("http://a", 1);
        t.insert("http://b", 2);
        assert_eq!(t.reverse_lookup(2), "http://b");
        assert_eq!(t.try_reverse_lookup(3), None);
    }

    #[test]
    #[should_panic(expected = "forward-only")]
    fn reverse_lookup_on_forward_table_panics() {
        let mut t = SymbolTable::forward();
        t.insert("a", 1);
        t.reverse_lookup(1);
    }

    #[test]
    fn serialized_layout_matches_format() {
        let mut t = SymbolTable::forward();
        t.insert("ab", 7);
        let bytes = t.serialize().unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 2, 0, 0, 0, b'a', b'b', 7, 0, 0, 0]);
    }

    #[test]
    fn round_trip_preserves_entries_and_order() {
        let mut t = SymbolTable::reversible();
        for (key, id) in [("яблоко", 1), ("груша", 42), ("123", 2), ("c", 5)] {
            t.insert(key, id);
        }
        let bytes = t.serialize().unwrap();
        let back = SymbolTable::deserialize(&bytes, SymbolMode::Reversible).unwrap();
        assert_eq!(back, t);

        let forward = SymbolTable::deserialize(&bytes, SymbolMode::Forward).unwrap();
        assert_eq!(forward.lookup("груша"), Some(42));
        assert_eq!(forward.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["яблоко", "груша", "123", "c"]);
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        let mut t = SymbolTable::forward();
        t.insert("apple", 1);
        let bytes = t.serialize().unwrap();
        for cut in 0..bytes.len() {
            let err = SymbolTable::deserialize(&bytes[..cut], SymbolMode::Forward).unwrap_err();
            assert!(matches!(err, SearchError::Decode(_)), "cut at {cut}: {err}");
        }
    }
}
