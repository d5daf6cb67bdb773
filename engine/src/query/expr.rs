use std::fmt;

use super::token::{binding_strength, Token};

/// Boolean query tree. Every node owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(String),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn term<S: Into<String>>(value: S) -> Self {
        Expr::Term(value.into())
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    pub fn not(child: Expr) -> Self {
        Expr::Not(Box::new(child))
    }

    /// The operator token at this node, `None` for a leaf.
    pub fn operator(&self) -> Option<Token> {
        match self {
            Expr::Term(_) => None,
            Expr::And(..) => Some(Token::And),
            Expr::Or(..) => Some(Token::Or),
            Expr::Not(_) => Some(Token::Not),
        }
    }

    /// Distinct leaf terms, left to right.
    pub fn terms(&self) -> Vec<&str> {
        let mut terms = Vec::new();
        self.collect_terms(&mut terms);
        terms
    }

    fn collect_terms<'a>(&'a self, terms: &mut Vec<&'a str>) {
        match self {
            Expr::Term(value) => {
                if !terms.contains(&value.as_str()) {
                    terms.push(value);
                }
            }
            Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_terms(terms);
                right.collect_terms(terms);
            }
            Expr::Not(child) => child.collect_terms(terms),
        }
    }

    fn write_binary(&self, f: &mut fmt::Formatter<'_>, left: &Expr, op: &Token, right: &Expr) -> fmt::Result {
        let strength = binding_strength(op);
        self.write_child(f, left, strength)?;
        write!(f, " {op} ")?;
        self.write_child(f, right, strength)
    }

    fn write_child(&self, f: &mut fmt::Formatter<'_>, child: &Expr, strength: u8) -> fmt::Result {
        let needs_parens = match child {
            Expr::And(..) | Expr::Or(..) => child
                .operator()
                .is_some_and(|op| binding_strength(&op) < strength),
            _ => false,
        };
        if needs_parens {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }
}

/// Canonical infix form with only the parentheses precedence requires.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(value) => f.write_str(value),
            Expr::Not(child) => write!(f, "{}({child})", Token::Not),
            Expr::And(left, right) => self.write_binary(f, left, &Token::And, right),
            Expr::Or(left, right) => self.write_binary(f, left, &Token::Or, right),
        }
    }
}
