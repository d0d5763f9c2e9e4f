//! Streaming lexer for minx source text.
//!
//! Tokens are produced on demand from a [`Reader`]. Indentation is
//! tracked as a stack of whitespace strings, outermost first; crossing
//! a line break compares the new line's leading whitespace against the
//! stack top and turns the difference into synthetic `Indent`,
//! `Dedent`, and `Newline` tokens, so block structure reaches the
//! parser through the token stream alone. The parser may push any
//! number of tokens back with [`Lexer::unget`] while backtracking.

use minx_diag::Diagnostic;

use crate::reader::Reader;
use crate::token::{OPERATOR_PRECEDENCE, Token, TokenKind};

/// Horizontal whitespace: NUL, tab, form-feed, space.
const WHITESPACE: &str = "\0\t\x0C ";

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '?' | '.' | '`')
}

/// Pull lexer with unlimited token push-back.
#[derive(Debug)]
pub struct Lexer {
    reader: Reader,
    /// Indentation strings, outermost first. Every entry is a proper
    /// prefix of the one above it; the root entry "" is never popped.
    indent_stack: Vec<String>,
    /// LIFO push-back buffer; queued layout tokens also land here.
    pending: Vec<Token>,
}

impl Lexer {
    /// Builds a lexer over `reader` and consumes any leading blank
    /// lines and comments, so the first `get` yields `FileStart`
    /// followed by the first real token.
    pub fn new(reader: Reader) -> Result<Lexer, Diagnostic> {
        let mut lexer = Lexer {
            reader,
            indent_stack: vec![String::new()],
            pending: Vec::new(),
        };
        // Whatever layout token the leading capture produces is
        // meaningless before FileStart and is dropped.
        let _ = lexer.capture_indent()?;
        lexer.pending.clear();
        lexer.pending.push(Token::FileStart);
        Ok(lexer)
    }

    /// Next token. Pushed-back and queued tokens drain first; an
    /// exhausted reader yields `FileEnd` forever.
    pub fn get(&mut self) -> Result<Token, Diagnostic> {
        if let Some(token) = self.pending.pop() {
            return Ok(token);
        }
        if self.reader.is_at_end() {
            return Ok(Token::FileEnd);
        }
        if let Some(token) = self.capture_indent()? {
            return Ok(token);
        }
        if let Some(token) = self.capture_symbol() {
            return Ok(token);
        }
        if let Some(token) = self.capture_name() {
            return Ok(token);
        }
        if let Some(token) = self.capture_infix() {
            return Ok(token);
        }
        if let Some(token) = self.capture_string()? {
            return Ok(token);
        }
        Err(self.unrecognised_token())
    }

    /// Restores a token; the next `get` returns it. Depth is unlimited.
    pub fn unget(&mut self, token: Token) {
        self.pending.push(token);
    }

    /// Consumes and returns the next token only when it has the given
    /// kind; otherwise the token is pushed back.
    pub fn get_if_of_type(&mut self, kind: TokenKind) -> Result<Option<Token>, Diagnostic> {
        let token = self.get()?;
        if token.kind() == kind {
            Ok(Some(token))
        } else {
            self.unget(token);
            Ok(None)
        }
    }

    /// Consumes the next token only when it has the given kind.
    pub fn is_next_token(&mut self, kind: TokenKind) -> Result<bool, Diagnostic> {
        Ok(self.get_if_of_type(kind)?.is_some())
    }

    /// Line and column of the most recently consumed character.
    pub fn line_and_col(&self) -> (usize, usize) {
        self.reader.line_and_col()
    }

    /// The layout pass. Consumes horizontal whitespace, comments, and
    /// line breaks; once at least one break was crossed, the last
    /// line's leading whitespace becomes the candidate indentation and
    /// is measured against the stack. Yields nothing mid-line.
    fn capture_indent(&mut self) -> Result<Option<Token>, Diagnostic> {
        self.capture_whitespace();
        let mut candidate: Option<String> = None;
        while self.skip_comments_and_breaks() {
            candidate = Some(self.capture_whitespace());
        }
        if self.reader.is_at_end() {
            // Unwind every open level. No Newline precedes FileEnd.
            self.pending.push(Token::FileEnd);
            self.queue_dedents_to("")?;
            return Ok(self.pending.pop());
        }
        let Some(indent) = candidate else {
            return Ok(None);
        };
        let diff = self.indent_diff(&indent)?;
        if diff > 0 {
            self.indent_stack.push(indent);
            Ok(Some(Token::Indent))
        } else if diff == 0 {
            Ok(Some(Token::Newline))
        } else {
            // Callers observe one Dedent per popped level, then the
            // Newline separating the lines.
            self.indent_stack.pop();
            self.pending.push(Token::Newline);
            self.queue_dedents_to(&indent)?;
            Ok(Some(Token::Dedent))
        }
    }

    /// Pops levels until the stack top equals `target`, queueing one
    /// Dedent per popped level. A target between levels is fatal.
    fn queue_dedents_to(&mut self, target: &str) -> Result<(), Diagnostic> {
        loop {
            let diff = self.indent_diff(target)?;
            if diff > 0 {
                return Err(self.error("cannot unindent to new indentation"));
            }
            if diff == 0 {
                return Ok(());
            }
            self.indent_stack.pop();
            self.pending.push(Token::Dedent);
        }
    }

    /// Length difference between `new` and the stack top: positive
    /// means deeper. A pair that disagrees within the shorter length
    /// cannot be ordered and is fatal.
    fn indent_diff(&self, new: &str) -> Result<isize, Diagnostic> {
        let top = self
            .indent_stack
            .last()
            .expect("indent stack always keeps its root entry");
        for (old_ch, new_ch) in top.chars().zip(new.chars()) {
            if old_ch != new_ch {
                return Err(self.error("indentation inconsistent with previous line"));
            }
        }
        Ok(new.chars().count() as isize - top.chars().count() as isize)
    }

    /// Skips one `#`-to-end-of-line comment and/or a run of line
    /// breaks. True when either was present.
    fn skip_comments_and_breaks(&mut self) -> bool {
        let found_comment = self.reader.match_char('#');
        if found_comment {
            self.reader.get_while(|ch| ch != '\r' && ch != '\n');
        }
        !self.reader.get_from("\r\n").is_empty() || found_comment
    }

    fn capture_whitespace(&mut self) -> String {
        self.reader.get_from(WHITESPACE)
    }

    fn capture_symbol(&mut self) -> Option<Token> {
        let ch = self.reader.get()?;
        let token = match ch {
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '$' => Some(Token::Dollar),
            ',' => Some(Token::Comma),
            '\'' => Some(Token::SingleQuote),
            '@' => Some(Token::At),
            _ => None,
        };
        if token.is_none() {
            self.reader.unget(ch);
        }
        token
    }

    fn capture_name(&mut self) -> Option<Token> {
        let text = self.reader.get_while(is_name_char);
        match text.to_ascii_lowercase().as_str() {
            "case" => return Some(Token::Case),
            "else" => return Some(Token::Else),
            "as" => return Some(Token::As),
            _ => {}
        }
        if text.is_empty() {
            return None;
        }
        let (has_side_effects, is_mutable) = self.capture_effect_suffixes();
        Some(Token::Name {
            text,
            has_side_effects,
            is_mutable,
        })
    }

    fn capture_infix(&mut self) -> Option<Token> {
        let text = self.reader.get_from(OPERATOR_PRECEDENCE);
        match text.as_str() {
            "=" => return Some(Token::Equals),
            "|" => return Some(Token::Pipe),
            ":" => return Some(Token::Colon),
            _ => {}
        }
        if text.is_empty() {
            return None;
        }
        let (has_side_effects, is_mutable) = self.capture_effect_suffixes();
        Some(Token::Infix {
            text,
            has_side_effects,
            is_mutable,
        })
    }

    /// A trailing `~` marks a side-effecting name, a trailing `!` a
    /// mutable one, in that order only.
    fn capture_effect_suffixes(&mut self) -> (bool, bool) {
        let has_side_effects = self.reader.match_char('~');
        let is_mutable = self.reader.match_char('!');
        (has_side_effects, is_mutable)
    }

    /// Text between double quotes, kept verbatim. A backslash stops the
    /// following character from terminating the string; the backslash
    /// itself stays in the payload.
    fn capture_string(&mut self) -> Result<Option<Token>, Diagnostic> {
        if !self.reader.match_char('"') {
            return Ok(None);
        }
        let mut text = String::new();
        let mut escaped = false;
        loop {
            let Some(ch) = self.reader.get() else {
                return Err(self.error("unterminated string"));
            };
            if !escaped && ch == '"' {
                break;
            }
            text.push(ch);
            escaped = !escaped && ch == '\\';
        }
        Ok(Some(Token::String(text)))
    }

    fn error(&self, message: &str) -> Diagnostic {
        let (line, col) = self.reader.line_and_col();
        Diagnostic::lexical(message, line, col)
    }

    fn unrecognised_token(&mut self) -> Diagnostic {
        match self.reader.get() {
            Some(ch) => self.error(&format!("unrecognised token starting at {ch:?}")),
            None => self.error("unrecognised token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer(source: &str) -> Lexer {
        Lexer::new(Reader::new(source)).expect("lexer construction should succeed")
    }

    fn lex_all(source: &str) -> Vec<Token> {
        let mut lexer = lexer(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.get().expect("lexing should succeed");
            let done = token == Token::FileEnd;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn lex_err(source: &str) -> Diagnostic {
        let mut lexer = lexer(source);
        loop {
            match lexer.get() {
                Ok(Token::FileEnd) => panic!("expected a lexical error in {source:?}"),
                Ok(_) => {}
                Err(diagnostic) => return diagnostic,
            }
        }
    }

    fn name(text: &str) -> Token {
        Token::Name {
            text: text.to_string(),
            has_side_effects: false,
            is_mutable: false,
        }
    }

    fn infix(text: &str) -> Token {
        Token::Infix {
            text: text.to_string(),
            has_side_effects: false,
            is_mutable: false,
        }
    }

    // -- Dispatch --

    #[test]
    fn empty_file_is_just_the_sentinels() {
        assert_eq!(lex_all(""), vec![Token::FileStart, Token::FileEnd]);
    }

    #[test]
    fn symbols_map_to_structural_tokens() {
        assert_eq!(
            lex_all("{}[]()$,'@"),
            vec![
                Token::FileStart,
                Token::LBrace,
                Token::RBrace,
                Token::LBracket,
                Token::RBracket,
                Token::LParen,
                Token::RParen,
                Token::Dollar,
                Token::Comma,
                Token::SingleQuote,
                Token::At,
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn names_take_word_characters_dots_and_backticks() {
        assert_eq!(
            lex_all("a.b c? `raw` _x d2"),
            vec![
                Token::FileStart,
                name("a.b"),
                name("c?"),
                name("`raw`"),
                name("_x"),
                name("d2"),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn numbers_lex_as_names() {
        assert_eq!(
            lex_all("12 3.4"),
            vec![Token::FileStart, name("12"), name("3.4"), Token::FileEnd]
        );
    }

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(
            lex_all("Case ELSE as"),
            vec![
                Token::FileStart,
                Token::Case,
                Token::Else,
                Token::As,
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn effect_suffixes_mark_names() {
        assert_eq!(
            lex_all("tick~ state! both~!"),
            vec![
                Token::FileStart,
                Token::Name {
                    text: "tick".to_string(),
                    has_side_effects: true,
                    is_mutable: false,
                },
                Token::Name {
                    text: "state".to_string(),
                    has_side_effects: false,
                    is_mutable: true,
                },
                Token::Name {
                    text: "both".to_string(),
                    has_side_effects: true,
                    is_mutable: true,
                },
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn reserved_operator_spellings_get_their_own_tokens() {
        assert_eq!(
            lex_all("= | :"),
            vec![
                Token::FileStart,
                Token::Equals,
                Token::Pipe,
                Token::Colon,
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn longer_operators_stay_infix() {
        assert_eq!(
            lex_all("== || :="),
            vec![
                Token::FileStart,
                infix("=="),
                infix("||"),
                infix(":="),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn infix_takes_effect_suffixes_too() {
        assert_eq!(
            lex_all("+~"),
            vec![
                Token::FileStart,
                Token::Infix {
                    text: "+".to_string(),
                    has_side_effects: true,
                    is_mutable: false,
                },
                Token::FileEnd,
            ]
        );
    }

    // -- Strings --

    #[test]
    fn strings_keep_their_raw_text() {
        assert_eq!(
            lex_all("\"just text\""),
            vec![
                Token::FileStart,
                Token::String("just text".to_string()),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn escaped_quote_stays_verbatim() {
        assert_eq!(
            lex_all("\"a\\\"b\""),
            vec![
                Token::FileStart,
                Token::String("a\\\"b".to_string()),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn double_backslash_does_not_escape_the_terminator() {
        assert_eq!(
            lex_all("\"\\\\\""),
            vec![
                Token::FileStart,
                Token::String("\\\\".to_string()),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let diagnostic = lex_err("\"abc");
        assert!(diagnostic.message.contains("unterminated"));
    }

    // -- Layout --

    #[test]
    fn indentation_produces_layout_tokens() {
        assert_eq!(
            lex_all("a\n  b\n    c\nd"),
            vec![
                Token::FileStart,
                name("a"),
                Token::Indent,
                name("b"),
                Token::Indent,
                name("c"),
                Token::Dedent,
                Token::Dedent,
                Token::Newline,
                name("d"),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn end_of_file_unwinds_without_a_newline() {
        assert_eq!(
            lex_all("a\n  b\n"),
            vec![
                Token::FileStart,
                name("a"),
                Token::Indent,
                name("b"),
                Token::Dedent,
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn blank_lines_collapse_into_one_newline() {
        assert_eq!(
            lex_all("a\n\n\nb"),
            vec![
                Token::FileStart,
                name("a"),
                Token::Newline,
                name("b"),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn comments_are_invisible_to_the_stream() {
        assert_eq!(
            lex_all("a # note\nb # trailing"),
            vec![
                Token::FileStart,
                name("a"),
                Token::Newline,
                name("b"),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn comment_only_file_is_empty() {
        assert_eq!(
            lex_all("# nothing here\n"),
            vec![Token::FileStart, Token::FileEnd]
        );
        assert_eq!(lex_all("   \n  \n"), vec![Token::FileStart, Token::FileEnd]);
    }

    #[test]
    fn leading_blank_lines_are_consumed_before_file_start() {
        assert_eq!(
            lex_all("\n\nx"),
            vec![Token::FileStart, name("x"), Token::FileEnd]
        );
    }

    #[test]
    fn crlf_is_a_single_break() {
        assert_eq!(
            lex_all("a\r\nb"),
            vec![
                Token::FileStart,
                name("a"),
                Token::Newline,
                name("b"),
                Token::FileEnd,
            ]
        );
    }

    #[test]
    fn inconsistent_indentation_is_fatal() {
        let diagnostic = lex_err("a\n\tb\n  c");
        assert!(diagnostic.message.contains("inconsistent"));
    }

    #[test]
    fn dedent_to_unknown_level_is_fatal() {
        let diagnostic = lex_err("a\n    b\n  c");
        assert!(diagnostic.message.contains("cannot unindent"));
    }

    // -- Errors --

    #[test]
    fn unrecognised_character_is_fatal_and_located() {
        let diagnostic = lex_err("a\n;");
        assert!(diagnostic.message.contains("unrecognised token"));
        assert!(diagnostic.message.contains(';'));
        assert_eq!((diagnostic.line, diagnostic.col), (2, 1));
    }

    // -- Push-back contract --

    #[test]
    fn first_token_is_always_file_start() {
        let mut lexer = lexer("x = 1");
        assert_eq!(lexer.get().unwrap(), Token::FileStart);
    }

    #[test]
    fn pushback_restores_tokens_in_lifo_order() {
        let mut lexer = lexer("a b");
        assert_eq!(lexer.get().unwrap(), Token::FileStart);
        let a = lexer.get().unwrap();
        let b = lexer.get().unwrap();
        lexer.unget(b.clone());
        lexer.unget(a.clone());
        assert_eq!(lexer.get().unwrap(), a);
        assert_eq!(lexer.get().unwrap(), b);
    }

    #[test]
    fn get_if_of_type_consumes_only_on_a_match() {
        let mut lexer = lexer("a");
        assert!(lexer.is_next_token(TokenKind::FileStart).unwrap());
        assert_eq!(lexer.get_if_of_type(TokenKind::Infix).unwrap(), None);
        assert_eq!(
            lexer.get_if_of_type(TokenKind::Name).unwrap(),
            Some(name("a"))
        );
    }

    #[test]
    fn file_end_repeats_once_reached() {
        let mut lexer = lexer("");
        assert_eq!(lexer.get().unwrap(), Token::FileStart);
        assert_eq!(lexer.get().unwrap(), Token::FileEnd);
        assert_eq!(lexer.get().unwrap(), Token::FileEnd);
    }
}
