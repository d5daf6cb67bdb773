//! Boolean query language: `term AND (term OR !term)`.

mod eval;
mod expr;
mod lexer;
mod parser;
mod token;

pub use eval::{BooleanEvaluator, SetAlgebra, TermSource};
pub use expr::Expr;
pub use lexer::{distinct_terms, QueryLexer};
pub use parser::{build_tree, parse, to_postfix};
pub use token::{binding_strength, Token};
