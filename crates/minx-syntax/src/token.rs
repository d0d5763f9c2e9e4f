//! Token types shared by the lexer and the parser.

/// Infix operator characters in binding order: an earlier character
/// binds tighter. The same set decides which characters the lexer
/// gathers into infix text, so every infix token ranks against this
/// string.
pub const OPERATOR_PRECEDENCE: &str = "^*/%+-:><=&|";

/// A lexed minx token. Layout is part of the stream: indentation
/// changes surface as `Indent`/`Dedent`/`Newline`, and every stream is
/// bracketed by `FileStart`/`FileEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LBrace,      // {
    RBrace,      // }
    LBracket,    // [
    RBracket,    // ]
    LParen,      // (
    RParen,      // )
    Dollar,      // $
    Comma,       // ,
    SingleQuote, // '
    At,          // @
    /// The reserved spelling `=`; longer operators such as `==` stay
    /// ordinary infix tokens.
    Equals,
    /// The reserved spelling `:`.
    Colon,
    /// The reserved spelling `|`.
    Pipe,
    /// Keyword, matched case-insensitively.
    Case,
    /// Keyword, matched case-insensitively.
    Else,
    /// Keyword, matched case-insensitively.
    As,
    /// Raw text between double quotes, backslashes kept verbatim.
    String(String),
    Name {
        text: String,
        has_side_effects: bool,
        is_mutable: bool,
    },
    Infix {
        text: String,
        has_side_effects: bool,
        is_mutable: bool,
    },
    Indent,
    Dedent,
    Newline,
    FileStart,
    FileEnd,
}

/// Discriminant-only view of [`Token`] for kind-based matching while
/// parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Dollar,
    Comma,
    SingleQuote,
    At,
    Equals,
    Colon,
    Pipe,
    Case,
    Else,
    As,
    String,
    Name,
    Infix,
    Indent,
    Dedent,
    Newline,
    FileStart,
    FileEnd,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::LBrace => TokenKind::LBrace,
            Token::RBrace => TokenKind::RBrace,
            Token::LBracket => TokenKind::LBracket,
            Token::RBracket => TokenKind::RBracket,
            Token::LParen => TokenKind::LParen,
            Token::RParen => TokenKind::RParen,
            Token::Dollar => TokenKind::Dollar,
            Token::Comma => TokenKind::Comma,
            Token::SingleQuote => TokenKind::SingleQuote,
            Token::At => TokenKind::At,
            Token::Equals => TokenKind::Equals,
            Token::Colon => TokenKind::Colon,
            Token::Pipe => TokenKind::Pipe,
            Token::Case => TokenKind::Case,
            Token::Else => TokenKind::Else,
            Token::As => TokenKind::As,
            Token::String(_) => TokenKind::String,
            Token::Name { .. } => TokenKind::Name,
            Token::Infix { .. } => TokenKind::Infix,
            Token::Indent => TokenKind::Indent,
            Token::Dedent => TokenKind::Dedent,
            Token::Newline => TokenKind::Newline,
            Token::FileStart => TokenKind::FileStart,
            Token::FileEnd => TokenKind::FileEnd,
        }
    }
}
