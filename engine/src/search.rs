//! Query facade: lex, parse, evaluate and resolve document urls.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bit_vec::BitVec;
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::error::{Result, SearchError};
use crate::index::Index;
use crate::postings::{BitsetPostings, PostingStore};
use crate::query::{distinct_terms, parse, to_postfix, BooleanEvaluator, Expr, QueryLexer, TermSource, Token};
use crate::rank::rank_documents;
use crate::text::Lemmatizer;
use crate::{DocId, TermId};

/// How many ranked hits are returned.
pub const TOP_K: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Boolean,
    Ranked,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Boolean => f.write_str("boolean"),
            SearchMode::Ranked => f.write_str("ranked"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(SearchMode::Boolean),
            "ranked" => Ok(SearchMode::Ranked),
            other => Err(format!("unknown search mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub doc_id: DocId,
    pub url: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchHits {
    /// Matching documents before truncation.
    pub total: usize,
    pub hits: Vec<Hit>,
}

/// `EmptyQuery` means there was nothing to search for, which is not the
/// same as a query that matched zero documents.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    EmptyQuery,
    Matches(SearchHits),
}

impl SearchOutcome {
    pub fn hits(&self) -> Option<&SearchHits> {
        match self {
            SearchOutcome::EmptyQuery => None,
            SearchOutcome::Matches(hits) => Some(hits),
        }
    }
}

pub struct Searcher<'a> {
    index: &'a Index,
    lexer: QueryLexer<'a>,
    evaluator: BooleanEvaluator,
    span: Span,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a Index, lemmatizer: &'a dyn Lemmatizer) -> Self {
        Self::with_span(index, lemmatizer, tracing::debug_span!("searcher"))
    }

    pub fn with_span(index: &'a Index, lemmatizer: &'a dyn Lemmatizer, span: Span) -> Self {
        let evaluator = BooleanEvaluator::with_span(tracing::trace_span!(parent: &span, "boolean_evaluator"));
        Searcher { index, lexer: QueryLexer::new(lemmatizer), evaluator, span }
    }

    pub fn parse(&self, query: &str) -> Result<Option<Expr>> {
        parse(&self.lexer.tokenize(query))
    }

    /// Minimally parenthesized form of `query`; empty for an empty query.
    pub fn canonical(&self, query: &str) -> Result<String> {
        Ok(self.parse(query)?.map(|expr| expr.to_string()).unwrap_or_default())
    }

    pub fn search(&self, query: &str, mode: SearchMode) -> Result<SearchOutcome> {
        let tokens = self.lexer.tokenize(query);
        if tokens.is_empty() {
            tracing::debug!(parent: &self.span, query, "empty query");
            return Ok(SearchOutcome::EmptyQuery);
        }
        let hits = match mode {
            SearchMode::Boolean => match parse(&tokens)? {
                Some(expr) => {
                    tracing::debug!(parent: &self.span, canonical = %expr, "boolean query");
                    self.boolean(&expr)
                }
                None => return Ok(SearchOutcome::EmptyQuery),
            },
            SearchMode::Ranked => match self.ranked(&tokens)? {
                Some(hits) => hits,
                None => return Ok(SearchOutcome::EmptyQuery),
            },
        };
        tracing::debug!(parent: &self.span, %mode, total = hits.total, "query evaluated");
        Ok(SearchOutcome::Matches(hits))
    }

    fn boolean(&self, expr: &Expr) -> SearchHits {
        let docs: Vec<DocId> = match self.index.postings() {
            PostingStore::Bitset(store) => {
                let source = BitsetSource { index: self.index, store };
                let bits: BitVec = self.evaluator.evaluate(expr, &source);
                store.decode(&bits)
            }
            _ => {
                let source = SetSource { index: self.index };
                let set: BTreeSet<DocId> = self.evaluator.evaluate(expr, &source);
                set.into_iter().collect()
            }
        };
        let hits: Vec<Hit> = docs
            .into_iter()
            .map(|doc_id| Hit { doc_id, url: self.url(doc_id), score: None })
            .collect();
        SearchHits { total: hits.len(), hits }
    }

    /// Implicit conjunction of every term; `AND` and grouping are accepted
    /// and ignored, `OR` and negation are refused. `None` when the query
    /// holds no term at all.
    fn ranked(&self, tokens: &[Token]) -> Result<Option<SearchHits>> {
        if let Some(op) = tokens.iter().find(|t| matches!(t, Token::Or | Token::Not)) {
            return Err(SearchError::unsupported(format!(
                "ranked search takes conjunctive queries only, found '{op}'"
            )));
        }
        // parentheses must still balance
        to_postfix(tokens)?;
        let terms = distinct_terms(tokens);
        if terms.is_empty() {
            tracing::debug!(parent: &self.span, "ranked query without terms");
            return Ok(None);
        }
        let store = self.index.postings().as_positional().ok_or_else(|| {
            SearchError::unsupported(format!(
                "ranked search needs positional postings, index has {}",
                self.index.representation()
            ))
        })?;

        let term_ids: Option<Vec<TermId>> = terms.into_iter().map(|term| self.index.term_id(term)).collect();
        let Some(term_ids) = term_ids else {
            return Ok(Some(SearchHits::default()));
        };

        let ranked = rank_documents(store, &term_ids);
        let hits = ranked
            .iter()
            .take(TOP_K)
            .map(|scored| Hit { doc_id: scored.doc_id, url: self.url(scored.doc_id), score: Some(scored.score) })
            .collect();
        Ok(Some(SearchHits { total: ranked.len(), hits }))
    }

    fn url(&self, doc_id: DocId) -> String {
        self.index.docs().reverse_lookup(doc_id).to_string()
    }
}

struct BitsetSource<'i> {
    index: &'i Index,
    store: &'i BitsetPostings,
}

impl TermSource<BitVec> for BitsetSource<'_> {
    fn term_set(&self, term: &str) -> BitVec {
        match self.index.term_id(term) {
            Some(term_id) => self.store.row(term_id),
            None => self.store.empty_row(),
        }
    }

    fn universe(&self) -> BitVec {
        self.store.full_row()
    }
}

struct SetSource<'i> {
    index: &'i Index,
}

impl TermSource<BTreeSet<DocId>> for SetSource<'_> {
    fn term_set(&self, term: &str) -> BTreeSet<DocId> {
        self.index
            .term_id(term)
            .map(|term_id| self.index.postings().docs_for(term_id))
            .unwrap_or_default()
    }

    fn universe(&self) -> BTreeSet<DocId> {
        self.index.doc_ids()
    }
}
