//! Cutting script text into executable statements.
//!
//! Block comments (`/* ... */`) are removed first. Newlines inside a removed
//! comment are kept so line structure survives. Quote state is tracked so a
//! `/*` or terminator inside a string literal or quoted identifier is left
//! alone, and `--` line comments are passed through untouched.

use crate::config::{ScriptsConfig, SplitPolicy};

/// Lexical position while scanning SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Lexical {
    #[default]
    Code,
    SingleQuoted,
    DoubleQuoted,
}

impl Lexical {
    /// Doubled quotes (`''`) toggle twice and fall out naturally.
    fn advance(self, c: char) -> Self {
        match (self, c) {
            (Lexical::Code, '\'') => Lexical::SingleQuoted,
            (Lexical::Code, '"') => Lexical::DoubleQuoted,
            (Lexical::SingleQuoted, '\'') => Lexical::Code,
            (Lexical::DoubleQuoted, '"') => Lexical::Code,
            (state, _) => state,
        }
    }
}

/// Splits raw script text into trimmed, non-empty statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementSplitter {
    terminator: char,
    policy: SplitPolicy,
}

impl Default for StatementSplitter {
    fn default() -> Self {
        Self::new(';', SplitPolicy::LineAnchored)
    }
}

impl StatementSplitter {
    pub fn new(terminator: char, policy: SplitPolicy) -> Self {
        Self { terminator, policy }
    }

    pub fn from_config(config: &ScriptsConfig) -> Self {
        Self::new(config.terminator, config.split_policy)
    }

    /// Split `raw` into statements in source order.
    ///
    /// Candidates that are empty or hold only `--` comments are dropped.
    pub fn split(&self, raw: &str) -> Vec<String> {
        let text = strip_block_comments(raw);
        let pieces = match self.policy {
            SplitPolicy::LineAnchored => self.split_line_anchored(&text),
            SplitPolicy::Anywhere => self.split_anywhere(&text),
        };

        pieces
            .into_iter()
            .map(str::trim)
            .filter(|s| has_code(s))
            .map(str::to_string)
            .collect()
    }

    fn split_line_anchored<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut offset = 0;
        let mut state = Lexical::Code;

        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            if state == Lexical::Code && self.is_terminator_line(line) {
                pieces.push(&text[start..line_start]);
                start = offset;
                continue;
            }
            state = scan_line(state, line);
        }

        pieces.push(&text[start..]);
        pieces
    }

    fn split_anywhere<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut state = Lexical::Code;
        let mut in_line_comment = false;
        let mut chars = text.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if in_line_comment {
                in_line_comment = c != '\n';
                continue;
            }
            if state == Lexical::Code {
                if c == '-' && matches!(chars.peek(), Some((_, '-'))) {
                    in_line_comment = true;
                    continue;
                }
                if c == self.terminator {
                    pieces.push(&text[start..i]);
                    start = i + c.len_utf8();
                    continue;
                }
            }
            state = state.advance(c);
        }

        pieces.push(&text[start..]);
        pieces
    }

    fn is_terminator_line(&self, line: &str) -> bool {
        let mut chars = line.trim().chars();
        chars.next() == Some(self.terminator) && chars.next().is_none()
    }
}

/// Advance the quote state over one line, stopping at a `--` comment.
fn scan_line(mut state: Lexical, line: &str) -> Lexical {
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if state == Lexical::Code && c == '-' && chars.peek() == Some(&'-') {
            break;
        }
        state = state.advance(c);
    }
    state
}

fn has_code(candidate: &str) -> bool {
    candidate.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("--")
    })
}

/// Remove every `/* ... */` region outside quotes, keeping its newlines.
///
/// An unterminated comment is left in place for the server to reject.
pub fn strip_block_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = Lexical::Code;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if state == Lexical::Code {
            if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => {
                        let comment_len = end + 4;
                        out.extend(rest[..comment_len].chars().filter(|&c| c == '\n'));
                        rest = &rest[comment_len..];
                        continue;
                    }
                    None => {
                        out.push_str(rest);
                        break;
                    }
                }
            }
            if rest.starts_with("--") {
                let end = rest.find('\n').unwrap_or(rest.len());
                out.push_str(&rest[..end]);
                rest = &rest[end..];
                continue;
            }
        }
        state = state.advance(c);
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}
