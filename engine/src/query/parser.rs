//! Precedence climbing from infix tokens to postfix, then to a tree.

use super::expr::Expr;
use super::token::{binding_strength, Token};
use crate::error::{Result, SearchError};

/// Reorders infix tokens into postfix with an operator stack.
///
/// Binary operators of equal strength associate to the left. Negation is a
/// prefix operator and associates to the right, so `!!a` is `!(!(a))`.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Term(_) => output.push(token.clone()),
            Token::LeftParen => operators.push(Token::LeftParen),
            Token::RightParen => loop {
                match operators.pop() {
                    Some(Token::LeftParen) => break,
                    Some(op) => output.push(op),
                    None => return Err(SearchError::syntax("unmatched ')'")),
                }
            },
            Token::And | Token::Or | Token::Not => {
                let strength = binding_strength(token);
                let right_assoc = *token == Token::Not;
                while let Some(top) = operators.last() {
                    let top_strength = binding_strength(top);
                    let pops = if right_assoc { top_strength > strength } else { top_strength >= strength };
                    if !pops {
                        break;
                    }
                    if let Some(op) = operators.pop() {
                        output.push(op);
                    }
                }
                operators.push(token.clone());
            }
        }
    }

    while let Some(op) = operators.pop() {
        if op == Token::LeftParen {
            return Err(SearchError::syntax("unmatched '('"));
        }
        output.push(op);
    }
    Ok(output)
}

/// Folds postfix tokens into a tree. `Ok(None)` means there was nothing to parse.
pub fn build_tree(postfix: Vec<Token>) -> Result<Option<Expr>> {
    let mut operands: Vec<Expr> = Vec::new();
    for token in postfix {
        let node = match token {
            Token::Term(value) => Expr::Term(value),
            Token::Not => Expr::not(pop_operand(&mut operands, &token)?),
            Token::And | Token::Or => {
                let right = pop_operand(&mut operands, &token)?;
                let left = pop_operand(&mut operands, &token)?;
                if token == Token::And {
                    Expr::and(left, right)
                } else {
                    Expr::or(left, right)
                }
            }
            Token::LeftParen | Token::RightParen => {
                return Err(SearchError::syntax("parenthesis in postfix input"));
            }
        };
        operands.push(node);
    }
    let root = operands.pop();
    if !operands.is_empty() {
        return Err(SearchError::syntax("operands without an operator between them"));
    }
    Ok(root)
}

fn pop_operand(operands: &mut Vec<Expr>, op: &Token) -> Result<Expr> {
    operands
        .pop()
        .ok_or_else(|| SearchError::syntax(format!("operator '{op}' without operands")))
}

pub fn parse(tokens: &[Token]) -> Result<Option<Expr>> {
    build_tree(to_postfix(tokens)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::lexer::QueryLexer;
    use crate::text::IdentityLemmatizer;

    fn lex(query: &str) -> Vec<Token> {
        QueryLexer::new(&IdentityLemmatizer).tokenize(query)
    }

    fn term(value: &str) -> Token {
        Token::Term(value.to_string())
    }

    fn reprint(query: &str) -> String {
        parse(&lex(query)).unwrap().map(|e| e.to_string()).unwrap_or_default()
    }

    #[test]
    fn single_term_postfix() {
        assert_eq!(to_postfix(&lex("apple")).unwrap(), vec![term("apple")]);
    }

    #[test]
    fn short_postfix() {
        assert_eq!(
            to_postfix(&lex("apple AND grapes")).unwrap(),
            vec![term("apple"), term("grapes"), Token::And]
        );
    }

    #[test]
    fn negation_postfix() {
        assert_eq!(to_postfix(&lex("!apple")).unwrap(), vec![term("apple"), Token::Not]);
        assert_eq!(
            to_postfix(&lex("!(apple AND grapes)")).unwrap(),
            vec![term("apple"), term("grapes"), Token::And, Token::Not]
        );
    }

    #[test]
    fn complex_postfix() {
        let postfix = to_postfix(&lex("meat OR !(apple AND grapes AND (lemon OR ginger))")).unwrap();
        assert_eq!(
            postfix,
            vec![
                term("meat"),
                term("apple"),
                term("grapes"),
                Token::And,
                term("lemon"),
                term("ginger"),
                Token::Or,
                Token::And,
                Token::Not,
                Token::Or,
            ]
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let tree = parse(&lex("a OR b AND c")).unwrap().unwrap();
        assert_eq!(tree, Expr::or(Expr::term("a"), Expr::and(Expr::term("b"), Expr::term("c"))));
    }

    #[test]
    fn equal_strength_is_left_associative() {
        let tree = parse(&lex("a AND b AND c")).unwrap().unwrap();
        assert_eq!(tree, Expr::and(Expr::and(Expr::term("a"), Expr::term("b")), Expr::term("c")));
    }

    #[test]
    fn double_negation_nests() {
        let tree = parse(&lex("!!a")).unwrap().unwrap();
        assert_eq!(tree, Expr::not(Expr::not(Expr::term("a"))));
    }

    #[test]
    fn empty_input_has_no_root() {
        assert_eq!(parse(&[]).unwrap(), None);
    }

    #[test]
    fn malformed_queries_are_syntax_errors() {
        for query in ["(a AND b", "a AND b)", "a AND", "OR b", "!", "a b", ")"] {
            let err = parse(&lex(query)).unwrap_err();
            assert!(matches!(err, SearchError::Syntax(_)), "{query}: {err}");
        }
    }

    #[test]
    fn reprint_uses_minimal_parentheses() {
        assert_eq!(reprint("apple"), "apple");
        assert_eq!(
            reprint("meat OR !(apple AND grapes AND (lemon OR ginger))"),
            "meat OR !(apple AND grapes AND (lemon OR ginger))"
        );
        assert_eq!(
            reprint("meat OR !((apple AND grapes) AND (lemon AND ginger))"),
            "meat OR !(apple AND grapes AND lemon AND ginger)"
        );
        assert_eq!(reprint("((a))"), "a");
        assert_eq!(reprint("(a OR b) AND !c"), "(a OR b) AND !(c)");
    }

    #[test]
    fn reprint_is_idempotent() {
        for query in [
            "a",
            "a OR b AND c",
            "(a OR b) AND (c OR d)",
            "!(a OR b) AND c OR !d",
            "x AND (y AND (z OR w))",
            "!!a OR (b AND !(c OR d))",
        ] {
            let once = reprint(query);
            let twice = reprint(&once);
            assert_eq!(once, twice, "{query}");
        }
    }

    #[test]
    fn reprint_of_left_leaning_tree_parses_back_to_it() {
        let tree = parse(&lex("(a OR b) AND c AND !(d OR e)")).unwrap().unwrap();
        let again = parse(&lex(&tree.to_string())).unwrap().unwrap();
        assert_eq!(again, tree);
    }
}
