use lazy_static::lazy_static;
use regex::Regex;

use super::token::Token;
use crate::text::Lemmatizer;

lazy_static! {
    static ref DELIMITER: Regex = Regex::new(r"\bAND\b|\bOR\b|!|\(|\)").expect("valid regex");
}

/// Splits a raw query into typed tokens.
///
/// `AND`, `OR` (whole words, case-sensitive), `!` and parentheses are
/// operators; every whitespace-separated fragment in between is a term,
/// lemmatized and then case-folded. Well-formedness is left to the parser.
pub struct QueryLexer<'a> {
    lemmatizer: &'a dyn Lemmatizer,
}

impl<'a> QueryLexer<'a> {
    pub fn new(lemmatizer: &'a dyn Lemmatizer) -> Self {
        QueryLexer { lemmatizer }
    }

    pub fn tokenize(&self, raw: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut last = 0;
        for delimiter in DELIMITER.find_iter(raw) {
            self.push_terms(&raw[last..delimiter.start()], &mut tokens);
            tokens.push(match delimiter.as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                "!" => Token::Not,
                "(" => Token::LeftParen,
                _ => Token::RightParen,
            });
            last = delimiter.end();
        }
        self.push_terms(&raw[last..], &mut tokens);
        tokens
    }

    fn push_terms(&self, fragment: &str, tokens: &mut Vec<Token>) {
        for word in fragment.split_whitespace() {
            let term = self.lemmatizer.lemmatize(word).to_lowercase();
            if !term.is_empty() {
                tokens.push(Token::Term(term));
            }
        }
    }
}

/// Distinct term values in order of first appearance.
pub fn distinct_terms(tokens: &[Token]) -> Vec<&str> {
    let mut terms: Vec<&str> = Vec::new();
    for token in tokens {
        if let Token::Term(value) = token {
            if !terms.contains(&value.as_str()) {
                terms.push(value);
            }
        }
    }
    terms
}
