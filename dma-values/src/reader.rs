//! Whitespace tolerant cursor used by every streaming value reader.
//!
//! Readers never fail loudly: they return `None` (or `false`) and leave the
//! cursor where the attempt started, so callers can try alternatives or report
//! the unread rest of the text.

/// A byte position inside the text being read.
pub type Position = usize;

/// Cursor over a borrowed text.
#[derive(Debug, Clone)]
pub struct ParseReader<'a> {
    text: &'a str,
    pos: Position,
}

impl<'a> ParseReader<'a> {
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Current position; pass it to [`Self::seek`] to undo a failed read.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.pos
    }

    pub fn seek(&mut self, pos: Position) {
        self.pos = pos.min(self.text.len());
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// The text not consumed so far.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// Read a signed integer after optional whitespace. The sign must be
    /// attached to the digits.
    pub fn read_int(&mut self) -> Option<i64> {
        let start = self.pos;
        self.skip_whitespace();
        let rest = self.rest();
        let sign_len = usize::from(rest.starts_with(['+', '-']));
        let digits = rest[sign_len..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            self.seek(start);
            return None;
        }
        let token = &rest[..sign_len + digits];
        match token.parse::<i64>() {
            Ok(value) => {
                self.pos += token.len();
                Some(value)
            }
            Err(_) => {
                self.seek(start);
                None
            }
        }
    }

    /// Consume `expected` after optional whitespace.
    pub fn expect_char(&mut self, expected: char) -> bool {
        let start = self.pos;
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            self.seek(start);
            false
        }
    }

    /// Consume `word` after optional whitespace, provided it is not directly
    /// followed by another letter.
    pub fn expect_word(&mut self, word: &str) -> bool {
        self.expect_any([word]).is_some()
    }

    /// Consume the longest of `candidates` that matches at the cursor (after
    /// optional whitespace) and ends on a word boundary.
    pub fn expect_any<'n, I>(&mut self, candidates: I) -> Option<&'n str>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let start = self.pos;
        self.skip_whitespace();
        let rest = self.rest();
        let best = candidates
            .into_iter()
            .filter(|candidate| !candidate.is_empty() && rest.starts_with(candidate))
            .filter(|candidate| {
                !rest[candidate.len()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_alphabetic)
            })
            .max_by_key(|candidate| candidate.len());
        match best {
            Some(found) => {
                self.pos += found.len();
                Some(found)
            }
            None => {
                self.seek(start);
                None
            }
        }
    }

    /// Read up to the next newline, consuming the newline but not returning it.
    pub fn read_line(&mut self) -> &'a str {
        let rest = self.rest();
        match rest.find('\n') {
            Some(end) => {
                self.pos += end + 1;
                &rest[..end]
            }
            None => {
                self.pos = self.text.len();
                rest
            }
        }
    }
}
