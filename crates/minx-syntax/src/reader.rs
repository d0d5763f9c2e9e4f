//! Character source feeding the lexer.
//!
//! The whole source text is held in memory, so no file handle outlives
//! construction. Reads are symmetric with push-back: `unget` restores a
//! character so the next `get` returns it, to arbitrary depth. Line and
//! column positions are derived from a record of line breaks in which a
//! `\r` immediately followed by `\n` counts as a single break.

#[derive(Debug, Clone, Copy)]
struct LineBreak {
    /// How many breaks precede this one; the sentinel before the first
    /// character is break 0.
    line: usize,
    /// Character index of the break's last character, -1 for the sentinel.
    pos: isize,
}

/// A pull cursor over source text with LIFO push-back.
#[derive(Debug)]
pub struct Reader {
    chars: Vec<char>,
    breaks: Vec<LineBreak>,
    /// Next fresh character to hand out.
    cursor: usize,
    /// Characters pushed back by `unget`, returned before fresh ones.
    pending: Vec<char>,
    /// Index of the most recently consumed character, -1 before the
    /// first read. Moves backwards on `unget`.
    consumed: isize,
}

impl Reader {
    pub fn new(source: &str) -> Reader {
        let chars: Vec<char> = source.chars().collect();
        let mut breaks = vec![LineBreak { line: 0, pos: -1 }];
        let mut line = 0;
        for (index, &ch) in chars.iter().enumerate() {
            if ch == '\r' {
                line += 1;
                breaks.push(LineBreak {
                    line,
                    pos: index as isize,
                });
            } else if ch == '\n' {
                if index > 0 && chars[index - 1] == '\r' {
                    // Fold the \n into the \r record: one break.
                    if let Some(last) = breaks.last_mut() {
                        last.pos = index as isize;
                    }
                } else {
                    line += 1;
                    breaks.push(LineBreak {
                        line,
                        pos: index as isize,
                    });
                }
            }
        }
        Reader {
            chars,
            breaks,
            cursor: 0,
            pending: Vec::new(),
            consumed: -1,
        }
    }

    /// Next character, or `None` once the source is exhausted.
    pub fn get(&mut self) -> Option<char> {
        if let Some(ch) = self.pending.pop() {
            self.consumed += 1;
            return Some(ch);
        }
        let ch = *self.chars.get(self.cursor)?;
        self.cursor += 1;
        self.consumed += 1;
        Some(ch)
    }

    /// Restores a character; the next `get` returns it.
    pub fn unget(&mut self, ch: char) {
        self.pending.push(ch);
        self.consumed -= 1;
    }

    /// Consumes and returns the next character only when it satisfies
    /// the predicate; otherwise the character stays next.
    pub fn get_if(&mut self, predicate: impl Fn(char) -> bool) -> Option<char> {
        let ch = self.get()?;
        if predicate(ch) {
            Some(ch)
        } else {
            self.unget(ch);
            None
        }
    }

    /// Consumes the next character only when it equals `expected`.
    pub fn match_char(&mut self, expected: char) -> bool {
        self.get_if(|ch| ch == expected).is_some()
    }

    /// The maximal prefix of characters satisfying the predicate.
    pub fn get_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.get_if(&predicate) {
            text.push(ch);
        }
        text
    }

    /// The maximal prefix of characters drawn from `charset`.
    pub fn get_from(&mut self, charset: &str) -> String {
        self.get_while(|ch| charset.contains(ch))
    }

    pub fn is_at_end(&self) -> bool {
        self.pending.is_empty() && self.cursor >= self.chars.len()
    }

    /// 1-based line and column of the most recently consumed character.
    /// The column counts characters since the last line break.
    pub fn line_and_col(&self) -> (usize, usize) {
        for lb in self.breaks.iter().rev() {
            if lb.pos <= self.consumed {
                return (lb.line + 1, (self.consumed - lb.pos) as usize);
            }
        }
        (1, 0)
    }
}
