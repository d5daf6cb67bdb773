use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Term(String),
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or | Token::Not)
    }
}

/// Relative precedence: `Not` > `And` > `Or`.
///
/// Terms and parentheses get the lowest strength, which lets an open
/// parenthesis sit on the operator stack as a barrier no operator pops past.
pub fn binding_strength(token: &Token) -> u8 {
    match token {
        Token::Not => 3,
        Token::And => 2,
        Token::Or => 1,
        Token::Term(_) | Token::LeftParen | Token::RightParen => 0,
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Term(value) => f.write_str(value),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::Not => f.write_str("!"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strengths_are_totally_ordered() {
        assert!(binding_strength(&Token::Not) > binding_strength(&Token::And));
        assert!(binding_strength(&Token::And) > binding_strength(&Token::Or));
        assert!(binding_strength(&Token::Or) > binding_strength(&Token::LeftParen));
    }
}
