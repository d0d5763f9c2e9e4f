//! Lexer and recursive descent parser for minx source code.
//!
//! This crate takes source text and produces an AST defined in
//! `minx-ast`. Lexing is streaming: the parser pulls tokens on demand
//! and may push any number back, so the two stages run interleaved
//! over a single pass of the input. Indentation surfaces as synthetic
//! layout tokens, making block structure part of the token stream.

pub mod lexer;
pub mod parser;
pub mod reader;
pub mod token;

use minx_ast::Expr;
use minx_diag::Diagnostic;

pub use lexer::Lexer;
pub use parser::Parser;
pub use reader::Reader;
pub use token::{OPERATOR_PRECEDENCE, Token, TokenKind};

/// Parse a whole source file into its top-level scope.
pub fn parse_source(source: &str) -> Result<Expr, Diagnostic> {
    let lexer = Lexer::new(Reader::new(source))?;
    Parser::new(lexer).parse_file()
}
