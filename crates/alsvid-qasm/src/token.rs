//! Lexer for `OpenQASM` 2.

use logos::Logos;

/// Tokens for `OpenQASM` 2.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    Qreg,

    #[token("creg")]
    Creg,

    #[token("gate")]
    Gate,

    #[token("opaque")]
    Opaque,

    #[token("barrier")]
    Barrier,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    #[token("if")]
    If,

    #[token("snapshot")]
    Snapshot,

    #[token("show_probabilities")]
    ShowProbabilities,

    // Built-in gates (higher priority than identifier)
    #[token("U", priority = 3)]
    UGate,

    #[token("CX", priority = 3)]
    CxGate,

    #[token("swap")]
    Swap,

    // Constants and unary functions
    #[token("pi")]
    Pi,

    #[token("sin")]
    Sin,

    #[token("cos")]
    Cos,

    #[token("tan")]
    Tan,

    #[token("exp")]
    Exp,

    #[token("ln")]
    Ln,

    #[token("sqrt")]
    Sqrt,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Real(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    NnInteger(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len() - 1].to_string())
    })]
    Str(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Times,

    #[token("/")]
    Div,

    #[token("^")]
    Power,

    #[token("==")]
    Eq,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(">")]
    Gt,
}

impl Token {
    /// Whether the token is one of the unary function keywords.
    pub fn is_unary_fn(&self) -> bool {
        matches!(
            self,
            Token::Sin | Token::Cos | Token::Tan | Token::Exp | Token::Ln | Token::Sqrt
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::Qreg => write!(f, "qreg"),
            Token::Creg => write!(f, "creg"),
            Token::Gate => write!(f, "gate"),
            Token::Opaque => write!(f, "opaque"),
            Token::Barrier => write!(f, "barrier"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::If => write!(f, "if"),
            Token::Snapshot => write!(f, "snapshot"),
            Token::ShowProbabilities => write!(f, "show_probabilities"),
            Token::UGate => write!(f, "U"),
            Token::CxGate => write!(f, "CX"),
            Token::Swap => write!(f, "swap"),
            Token::Pi => write!(f, "pi"),
            Token::Sin => write!(f, "sin"),
            Token::Cos => write!(f, "cos"),
            Token::Tan => write!(f, "tan"),
            Token::Exp => write!(f, "exp"),
            Token::Ln => write!(f, "ln"),
            Token::Sqrt => write!(f, "sqrt"),
            Token::Real(v) => write!(f, "{v}"),
            Token::NnInteger(v) => write!(f, "{v}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Times => write!(f, "*"),
            Token::Div => write!(f, "/"),
            Token::Power => write!(f, "^"),
            Token::Eq => write!(f, "=="),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Gt => write!(f, ">"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).filter_map(Result::ok).collect()
    }

    #[test]
    fn test_header() {
        let tokens = lex("OPENQASM 2.0;");
        assert_eq!(tokens[0], Token::OpenQasm);
        assert!(matches!(tokens[1], Token::Real(v) if (v - 2.0).abs() < 1e-12));
        assert_eq!(tokens[2], Token::Semicolon);
    }

    #[test]
    fn test_builtin_gates_not_identifiers() {
        let tokens = lex("U CX swap");
        assert_eq!(tokens, vec![Token::UGate, Token::CxGate, Token::Swap]);
    }

    #[test]
    fn test_identifier_starting_like_keyword() {
        let tokens = lex("pivot cxgate");
        assert!(matches!(tokens[0], Token::Identifier(ref s) if s == "pivot"));
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "cxgate"));
    }

    #[test]
    fn test_measure_arrow_is_minus_gt() {
        let tokens = lex("measure q -> c;");
        assert_eq!(tokens[2], Token::Minus);
        assert_eq!(tokens[3], Token::Gt);
    }

    #[test]
    fn test_comment_skipped() {
        let tokens = lex("qreg q[2]; // i 0 1\ncreg c[2];");
        assert_eq!(tokens.len(), 12);
    }

    #[test]
    fn test_equality() {
        let tokens = lex("if (c == 3)");
        assert_eq!(tokens[3], Token::Eq);
    }
}
