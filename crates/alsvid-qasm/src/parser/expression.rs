//! Expression parsing.
//!
//! Recursive descent with constant folding performed as nodes are built:
//!
//! ```text
//! Exp    := ['-'] Term (('+'|'-') Term)*
//! Term   := Factor (('*'|'/') Factor)*
//! Factor := Exponentiation ('^' Exponentiation)*
//! Exponentiation := '-' Exponentiation | number | pi | identifier
//!                 | '(' Exp ')' | unaryFn '(' Exp ')'
//! ```

use super::Parser;
use crate::error::{ParseError, ParseResult};
use crate::expr::{BinaryKind, Expr, UnaryKind};
use crate::scanner::ScannedToken;
use crate::token::Token;

impl Parser {
    /// Parse a full expression.
    pub(crate) fn parse_exp(&mut self) -> ParseResult<Expr> {
        let mut x = if self.consume(&Token::Minus) {
            Expr::neg(self.parse_term()?)
        } else {
            self.parse_term()?
        };

        loop {
            if self.consume(&Token::Plus) {
                x = Expr::binary(BinaryKind::Plus, x, self.parse_term()?);
            } else if self.consume(&Token::Minus) {
                x = Expr::binary(BinaryKind::Minus, x, self.parse_term()?);
            } else {
                break;
            }
        }
        Ok(x)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut x = self.parse_factor()?;
        loop {
            if self.consume(&Token::Times) {
                x = Expr::binary(BinaryKind::Times, x, self.parse_factor()?);
            } else if self.consume(&Token::Div) {
                x = Expr::binary(BinaryKind::Div, x, self.parse_factor()?);
            } else {
                break;
            }
        }
        Ok(x)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let mut x = self.parse_exponentiation()?;
        while self.consume(&Token::Power) {
            let y = self.parse_exponentiation()?;
            x = Expr::binary(BinaryKind::Power, x, y);
        }
        Ok(x)
    }

    fn parse_exponentiation(&mut self) -> ParseResult<Expr> {
        if self.consume(&Token::Minus) {
            return Ok(Expr::neg(self.parse_exponentiation()?));
        }

        match self.advance() {
            Some(ScannedToken {
                token: Token::Real(v),
                ..
            }) => Ok(Expr::Number(v)),
            Some(ScannedToken {
                token: Token::NnInteger(v),
                ..
            }) => Ok(Expr::Number(v as f64)),
            Some(ScannedToken {
                token: Token::Pi, ..
            }) => Ok(Expr::Number(std::f64::consts::PI)),
            Some(ScannedToken {
                token: Token::Identifier(name),
                ..
            }) => Ok(Expr::Id(name)),
            Some(ScannedToken {
                token: Token::LParen,
                ..
            }) => {
                let x = self.parse_exp()?;
                self.expect(&Token::RParen)?;
                Ok(x)
            }
            Some(tok) if tok.token.is_unary_fn() => {
                let op = match tok.token {
                    Token::Sin => UnaryKind::Sin,
                    Token::Cos => UnaryKind::Cos,
                    Token::Tan => UnaryKind::Tan,
                    Token::Exp => UnaryKind::Exp,
                    Token::Ln => UnaryKind::Ln,
                    _ => UnaryKind::Sqrt,
                };
                self.expect(&Token::LParen)?;
                let x = self.parse_exp()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::unary(op, x))
            }
            Some(tok) => Err(ParseError::Syntax {
                line: tok.line,
                col: tok.col,
                message: format!("invalid expression at '{}'", tok.token),
            }),
            None => Err(ParseError::UnexpectedEof("expression".into())),
        }
    }

    /// A comma-separated expression list.
    pub(crate) fn exp_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_exp()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_exp()?);
        }
        Ok(exprs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn parse_expr(text: &str) -> Expr {
        // Wrap in a parser over a bare expression source.
        let mut parser = Parser::new_expression_harness(text).unwrap();
        parser.parse_exp().unwrap()
    }

    impl Parser {
        fn new_expression_harness(text: &str) -> ParseResult<Self> {
            Self::new(text, "expr")
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse_expr("1 + 2 * 3"), Expr::Number(7.0));
        assert_eq!(parse_expr("(1 + 2) * 3"), Expr::Number(9.0));
        assert_eq!(parse_expr("2 ^ 3 ^ 2"), Expr::Number(64.0));
    }

    #[test]
    fn test_leading_minus() {
        assert_eq!(parse_expr("-pi"), Expr::Number(-PI));
        assert_eq!(parse_expr("- 2 + 3"), Expr::Number(1.0));
    }

    #[test]
    fn test_unary_functions() {
        assert_eq!(parse_expr("cos(0)"), Expr::Number(1.0));
        assert_eq!(parse_expr("sqrt(4)"), Expr::Number(2.0));
        let folded = parse_expr("sin(pi/2)");
        match folded {
            Expr::Number(v) => assert!((v - 1.0).abs() < 1e-12),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn test_symbolic_expression() {
        let e = parse_expr("theta / 2");
        assert!(matches!(e, Expr::Div(_, _)));
    }
}
