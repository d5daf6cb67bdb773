//! Post-order evaluation of a query tree as set algebra.

use std::collections::BTreeSet;

use bit_vec::BitVec;
use tracing::Span;

use super::expr::Expr;
use crate::DocId;

/// Result sets the boolean evaluator can combine.
pub trait SetAlgebra: Sized {
    fn intersect(self, other: Self) -> Self;
    fn union(self, other: Self) -> Self;
    /// Everything in `universe` that is not in `self`.
    fn complement(self, universe: &Self) -> Self;
    fn cardinality(&self) -> usize;
}

/// Resolves leaves and the document universe for one representation.
pub trait TermSource<S> {
    /// Documents containing `term`; the empty set for unknown terms.
    fn term_set(&self, term: &str) -> S;
    fn universe(&self) -> S;
}

impl SetAlgebra for BitVec {
    fn intersect(mut self, other: Self) -> Self {
        self.and(&other);
        self
    }

    fn union(mut self, other: Self) -> Self {
        self.or(&other);
        self
    }

    fn complement(mut self, universe: &Self) -> Self {
        self.negate();
        self.and(universe);
        self
    }

    fn cardinality(&self) -> usize {
        self.iter().filter(|bit| *bit).count()
    }
}

impl SetAlgebra for BTreeSet<DocId> {
    fn intersect(self, other: Self) -> Self {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.into_iter().filter(|doc| large.contains(doc)).collect()
    }

    fn union(mut self, mut other: Self) -> Self {
        self.append(&mut other);
        self
    }

    fn complement(self, universe: &Self) -> Self {
        universe.difference(&self).copied().collect()
    }

    fn cardinality(&self) -> usize {
        self.len()
    }
}

pub struct BooleanEvaluator {
    span: Span,
}

impl Default for BooleanEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl BooleanEvaluator {
    pub fn new() -> Self {
        BooleanEvaluator { span: tracing::trace_span!("boolean_evaluator") }
    }

    pub fn with_span(span: Span) -> Self {
        BooleanEvaluator { span }
    }

    pub fn evaluate<S, R>(&self, expr: &Expr, source: &R) -> S
    where
        S: SetAlgebra,
        R: TermSource<S> + ?Sized,
    {
        let result = match expr {
            Expr::Term(value) => source.term_set(value),
            Expr::And(left, right) => {
                let left = self.evaluate(left, source);
                left.intersect(self.evaluate(right, source))
            }
            Expr::Or(left, right) => {
                let left = self.evaluate(left, source);
                left.union(self.evaluate(right, source))
            }
            Expr::Not(child) => self.evaluate(child, source).complement(&source.universe()),
        };
        tracing::trace!(parent: &self.span, node = %expr, matches = result.cardinality(), "evaluated");
        result
    }
}
