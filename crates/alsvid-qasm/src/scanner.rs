//! Token scanner with include-stack handling.
//!
//! The scanner owns a LIFO stack of input sources. An `include` directive
//! pushes a new source; end of input on a pushed source pops it, and the
//! client only sees end of input once the stack is empty. Line and column
//! numbers restart per source. Pushing a path that is already on the stack
//! fails with [`ParseError::IncludeCycle`].

use logos::Logos;

use crate::error::{ParseError, ParseResult};
use crate::token::Token;

/// The embedded `qelib1.inc` standard header.
pub const QELIB1: &str = include_str!("qelib1.inc");

/// A token annotated with its source position.
#[derive(Debug, Clone)]
pub struct ScannedToken {
    /// The token itself.
    pub token: Token,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub col: u32,
}

#[derive(Debug)]
struct Source {
    path: String,
    tokens: Vec<ScannedToken>,
    pos: usize,
}

/// The include-stack scanner.
#[derive(Debug)]
pub struct Scanner {
    stack: Vec<Source>,
}

impl Scanner {
    /// Create a scanner over a single top-level source.
    pub fn new(source: &str) -> ParseResult<Self> {
        let mut scanner = Self { stack: vec![] };
        scanner.push_source("<input>", source)?;
        Ok(scanner)
    }

    /// Push an include target onto the stack.
    ///
    /// `qelib1.inc` resolves to the embedded standard header; any other path
    /// is read from the filesystem.
    pub fn push_include(&mut self, path: &str) -> ParseResult<()> {
        if self.stack.iter().any(|source| source.path == path) {
            return Err(ParseError::IncludeCycle(path.to_string()));
        }
        if path == "qelib1.inc" {
            self.push_source(path, QELIB1)
        } else {
            let text = std::fs::read_to_string(path).map_err(|source| ParseError::Include {
                path: path.to_string(),
                source,
            })?;
            self.push_source(path, &text)
        }
    }

    fn push_source(&mut self, path: &str, text: &str) -> ParseResult<()> {
        let tokens = tokenize(text)?;
        self.stack.push(Source {
            path: path.to_string(),
            tokens,
            pos: 0,
        });
        Ok(())
    }

    /// Produce the next token, or `None` once every source is exhausted.
    pub fn next_token(&mut self) -> Option<ScannedToken> {
        loop {
            let source = self.stack.last_mut()?;
            if source.pos < source.tokens.len() {
                let token = source.tokens[source.pos].clone();
                source.pos += 1;
                return Some(token);
            }
            self.stack.pop();
        }
    }
}

/// Tokenize a whole source, attaching line/column information.
fn tokenize(text: &str) -> ParseResult<Vec<ScannedToken>> {
    let mut lexer = Token::lexer(text);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line, col) = line_col(text, span.start);
        match result {
            Ok(token) => tokens.push(ScannedToken { token, line, col }),
            Err(()) => {
                return Err(ParseError::Lexer {
                    line,
                    col,
                    text: text[span].to_string(),
                });
            }
        }
    }
    Ok(tokens)
}

fn line_col(text: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut col = 1;
    for ch in text[..offset].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
