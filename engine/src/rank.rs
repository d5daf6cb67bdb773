//! Proximity ranking over positional postings.
//!
//! A document scores higher the earlier and the tighter the shortest span
//! of positions covering every query term is.

use std::cmp::Ordering;

use crate::postings::PositionalPostings;
use crate::{DocId, Position, TermId};

/// Shortest span of positions holding at least one occurrence of every term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Position,
    pub size: u32,
}

impl Window {
    pub fn score(&self) -> f64 {
        1000.0 / (f64::from(self.start) + 1.0) + 100.0 / f64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub doc_id: DocId,
    pub window: Window,
    pub score: f64,
}

/// Two-pointer scan over the merged, position-sorted occurrences.
///
/// `occurrences[t]` holds the positions of term `t`. Returns `None` when
/// there are no terms or some term never occurs.
pub fn min_covering_window(occurrences: &[&[Position]]) -> Option<Window> {
    if occurrences.is_empty() || occurrences.iter().any(|positions| positions.is_empty()) {
        return None;
    }

    let mut merged: Vec<(Position, usize)> = occurrences
        .iter()
        .enumerate()
        .flat_map(|(term, positions)| positions.iter().map(move |&p| (p, term)))
        .collect();
    merged.sort_unstable();

    let mut counts = vec![0usize; occurrences.len()];
    let mut covered = 0;
    let mut start = 0;
    let mut best: Option<Window> = None;

    for end in 0..merged.len() {
        let (end_pos, end_term) = merged[end];
        counts[end_term] += 1;
        if counts[end_term] == 1 {
            covered += 1;
        }
        // drop leading occurrences that are repeated later in the window
        while counts[merged[start].1] > 1 {
            counts[merged[start].1] -= 1;
            start += 1;
        }
        if covered == occurrences.len() {
            let start_pos = merged[start].0;
            let size = end_pos - start_pos + 1;
            if best.map_or(true, |b| size < b.size) {
                best = Some(Window { start: start_pos, size });
            }
        }
    }
    best
}

/// Scores every document containing all of `term_ids`, best first.
///
/// Ties are broken by ascending doc id. Duplicate term ids count once.
pub fn rank_documents(store: &PositionalPostings, term_ids: &[TermId]) -> Vec<Scored> {
    let mut terms: Vec<TermId> = Vec::with_capacity(term_ids.len());
    for id in term_ids {
        if !terms.contains(id) {
            terms.push(*id);
        }
    }

    let mut rows = Vec::with_capacity(terms.len());
    for term in &terms {
        match store.row(*term) {
            Some(row) => rows.push(row),
            None => return Vec::new(),
        }
    }
    let Some(shortest) = rows.iter().min_by_key(|row| row.len()) else {
        return Vec::new();
    };

    let mut scored: Vec<Scored> = shortest
        .keys()
        .filter(|doc| rows.iter().all(|row| row.contains_key(doc)))
        .filter_map(|&doc_id| {
            let occurrences: Vec<&[Position]> = rows.iter().map(|row| row[&doc_id].as_slice()).collect();
            let window = min_covering_window(&occurrences)?;
            Some(Scored { doc_id, window, score: window.score() })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.doc_id.cmp(&b.doc_id))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_term_window_is_its_first_occurrence() {
        let window = min_covering_window(&[&[1, 5, 8]]).unwrap();
        assert_eq!(window, Window { start: 1, size: 1 });
        assert_eq!(window.score(), 600.0);
    }

    #[test]
    fn several_terms_find_tightest_span() {
        let term1: &[Position] = &[1, 3, 10, 45, 47];
        let term2: &[Position] = &[7, 46, 49];
        let term3: &[Position] = &[4, 44, 48];
        let window = min_covering_window(&[term1, term2, term3]).unwrap();
        assert_eq!(window, Window { start: 44, size: 3 });
        assert!((window.score() - 55.55556).abs() < 1e-4);
    }

    #[test]
    fn earliest_of_equal_windows_wins() {
        let a: &[Position] = &[2, 20];
        let b: &[Position] = &[3, 21];
        assert_eq!(min_covering_window(&[a, b]), Some(Window { start: 2, size: 2 }));
    }

    #[test]
    fn missing_term_has_no_window() {
        let a: &[Position] = &[2];
        let b: &[Position] = &[];
        assert_eq!(min_covering_window(&[a, b]), None);
        assert_eq!(min_covering_window(&[]), None);
    }

    #[test]
    fn ranks_intersection_by_score() {
        let mut store = PositionalPostings::new();
        store.record(1, 10, &[1, 2]);
        store.record(2, 10, &[30]);
        store.record(1, 11, &[5]);
        store.record(2, 11, &[6]);
        store.record(1, 12, &[1]);

        let ranked = rank_documents(&store, &[1, 2, 1]);
        let docs: Vec<DocId> = ranked.iter().map(|s| s.doc_id).collect();
        // doc 10 starts earlier, which outweighs doc 11's tighter window
        assert_eq!(docs, vec![10, 11]);
        assert_eq!(ranked[0].window, Window { start: 2, size: 29 });
        assert_eq!(ranked[1].window, Window { start: 5, size: 2 });
    }

    #[test]
    fn unknown_term_yields_no_candidates() {
        let mut store = PositionalPostings::new();
        store.record(1, 10, &[1]);
        assert!(rank_documents(&store, &[1, 99]).is_empty());
    }
}
