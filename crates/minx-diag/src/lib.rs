//! Diagnostics for the minx front end.
//!
//! The front end stops at the first problem it meets, so a failed run
//! produces exactly one [`Diagnostic`] locating the failure by line and
//! column. There is no aggregation and no recovery.

/// Which stage of the front end rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Raised by the lexer: unrecognised characters, inconsistent or
    /// invalid indentation, unterminated strings.
    Lexical,
    /// Raised by the parser: a committed grammar expectation unmet.
    Syntax,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Lexical => "lexical error",
            Category::Syntax => "syntax error",
        }
    }
}

/// A fatal front-end error.
///
/// `line` is 1-based. `col` counts characters since the last line break,
/// where a `\r\n` pair is a single break.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {} (line {}, col {})", .category.as_str(), .message, .line, .col)]
pub struct Diagnostic {
    pub category: Category,
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl Diagnostic {
    pub fn lexical(message: impl Into<String>, line: usize, col: usize) -> Diagnostic {
        Diagnostic {
            category: Category::Lexical,
            message: message.into(),
            line,
            col,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize, col: usize) -> Diagnostic {
        Diagnostic {
            category: Category::Syntax,
            message: message.into(),
            line,
            col,
        }
    }
}
