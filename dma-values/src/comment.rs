//! Comment blocks: runs of lines starting with a comment starter, separated
//! by blank lines.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ValueError};
use crate::rational::UNDEFINED;
use crate::reader::ParseReader;

pub const DEFAULT_STARTER: &str = "#";

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([ \t\f]*\n){3,}").expect("valid blank line pattern"));
static DASH_TRAILERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*-{3,}[ \t]*(\n|$)").expect("valid dash pattern"));

/// A block of comment lines read with optional limits.
///
/// `max_comments` counts blocks separated by blank lines, `max_lines` counts
/// comment lines; `None` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    lines: Option<String>,
    max_comments: Option<usize>,
    max_lines: Option<usize>,
    starter: String,
}

impl Default for Comment {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl Comment {
    #[must_use]
    pub fn new(max_comments: Option<usize>, max_lines: Option<usize>) -> Self {
        Self {
            lines: None,
            max_comments,
            max_lines,
            starter: DEFAULT_STARTER.to_string(),
        }
    }

    /// Use a different comment starter; an empty starter is ignored.
    #[must_use]
    pub fn with_starter(mut self, starter: &str) -> Self {
        if !starter.is_empty() {
            self.starter = starter.to_string();
        }
        self
    }

    /// Set the comment text.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidComment`] if a non-blank line does not
    /// start with the starter.
    pub fn with_text(mut self, text: &str) -> Result<Self> {
        if !self.check(text) {
            return Err(ValueError::InvalidComment {
                starter: self.starter,
            });
        }
        self.lines = Some(text.to_string());
        Ok(self)
    }

    /// Same limits with new text; invalid text gives an undefined comment.
    #[must_use]
    pub fn as_text(&self, text: &str) -> Self {
        let empty = Self {
            lines: None,
            ..self.clone()
        };
        empty.clone().with_text(text).unwrap_or(empty)
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.lines.as_deref()
    }

    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.lines.is_some()
    }

    #[must_use]
    pub fn starter(&self) -> &str {
        &self.starter
    }

    /// Whether every non-blank line of `text` starts with the starter.
    #[must_use]
    pub fn check(&self, text: &str) -> bool {
        text.lines().all(|line| {
            let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
            compact.is_empty() || compact.starts_with(&self.starter)
        })
    }

    /// Normalize layout: at most one blank line in a row, shortened rulers
    /// and no trailing dashes.
    #[must_use]
    pub fn fix(&self) -> Self {
        let Some(lines) = &self.lines else {
            return self.clone();
        };
        let starter = regex::escape(&self.starter);
        let mut text = BLANK_RUNS.replace_all(lines, "\n\n").into_owned();
        text = replace_with(
            &text,
            &format!(r"(^|\n)([ \t]*){starter}-{{6,}}"),
            &format!("${{1}}${{2}}{}-----", self.starter),
        );
        text = DASH_TRAILERS.replace_all(&text, "${1}").into_owned();
        text = replace_with(
            &text,
            &format!(r"(^|\n)([ \t]*){starter}\.{{6,}}[ \t]*(\n|$)"),
            &format!("${{1}}${{2}}{}.....\n", self.starter),
        );
        Self {
            lines: Some(text),
            ..self.clone()
        }
    }

    /// Read comment lines until a non-comment line or a limit is reached.
    pub fn read(&self, reader: &mut ParseReader<'_>) -> Option<Self> {
        if self.max_comments == Some(0) {
            return None;
        }

        let mut read = String::new();
        let mut last_was_comment = false;
        let mut comments = self.max_comments;
        let mut lines = self.max_lines;
        while !reader.is_at_end() && comments != Some(0) && lines != Some(0) {
            let start = reader.position();
            let line = reader.read_line();
            let trimmed = line.trim();
            if trimmed.is_empty() {
                read.push('\n');
                if last_was_comment {
                    comments = comments.map(|count| count - 1);
                    last_was_comment = false;
                }
            } else if trimmed.starts_with(&self.starter) {
                lines = lines.map(|count| count - 1);
                read.push_str(line);
                read.push('\n');
                last_was_comment = true;
            } else {
                reader.seek(start);
                break;
            }
        }

        if read.trim().is_empty() {
            return None;
        }
        Some(Self {
            lines: Some(read),
            ..self.clone()
        })
    }
}

fn replace_with(text: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(regex) => regex.replace_all(text, replacement).into_owned(),
        Err(err) => {
            log::warn!("skipping comment rule '{pattern}': {err}");
            text.to_string()
        }
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lines.as_deref().unwrap_or(UNDEFINED))
    }
}
