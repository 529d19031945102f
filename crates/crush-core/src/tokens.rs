//! Placeholder tokens.
//!
//! Comments, strings, parenthesised groups and parsed rules are pulled out of
//! the stream and replaced by labels so that later regex passes never see
//! their content. A label has the form `\x02{kind}{n}\x03`: the STX/ETX
//! sentinels are control characters that cannot appear in CSS identifiers,
//! so labels never collide with document text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rule::Rule;

/// Opening sentinel of a label.
pub const LABEL_OPEN: char = '\u{2}';
/// Closing sentinel of a label.
pub const LABEL_CLOSE: char = '\u{3}';

static COMMENT_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x02c\d+\x03").unwrap());
static STRING_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x02s\d+\x03").unwrap());
static PAREN_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x02p\d+\x03").unwrap());
static RULE_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x02r\d+\x03").unwrap());

/// Upper bound on nested paren restoration rounds.
const MAX_RESTORE_ROUNDS: usize = 32;

/// Kind of extracted content a label stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `/* ... */` comment.
    Comment,
    /// Quoted string literal.
    String,
    /// Parenthesised group, parens included.
    Paren,
    /// Parsed rule block.
    Rule,
}

impl TokenKind {
    fn prefix(self) -> char {
        match self {
            Self::Comment => 'c',
            Self::String => 's',
            Self::Paren => 'p',
            Self::Rule => 'r',
        }
    }

    /// Regex matching any label of this kind.
    pub fn pattern(self) -> &'static Regex {
        match self {
            Self::Comment => &COMMENT_LABEL,
            Self::String => &STRING_LABEL,
            Self::Paren => &PAREN_LABEL,
            Self::Rule => &RULE_LABEL,
        }
    }
}

/// Per-compile mapping from labels to extracted content.
///
/// Labels come from a single monotonically increasing counter, so they are
/// unique across all kinds for the lifetime of the store.
#[derive(Debug, Default)]
pub struct TokenStore {
    next_id: usize,
    comments: HashMap<String, String>,
    strings: HashMap<String, String>,
    parens: HashMap<String, String>,
    rules: HashMap<String, Rule>,
}

impl TokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh label of the given kind.
    pub fn label(&mut self, kind: TokenKind) -> String {
        self.next_id += 1;
        format!("{LABEL_OPEN}{}{}{LABEL_CLOSE}", kind.prefix(), self.next_id)
    }

    /// Store a comment and return its label.
    pub fn add_comment(&mut self, text: impl Into<String>) -> String {
        let label = self.label(TokenKind::Comment);
        self.comments.insert(label.clone(), text.into());
        label
    }

    /// Store a string literal and return its label.
    pub fn add_string(&mut self, text: impl Into<String>) -> String {
        let label = self.label(TokenKind::String);
        self.strings.insert(label.clone(), text.into());
        label
    }

    /// Store a parenthesised group and return its label.
    pub fn add_paren(&mut self, text: impl Into<String>) -> String {
        let label = self.label(TokenKind::Paren);
        self.parens.insert(label.clone(), text.into());
        label
    }

    /// Store a parsed rule and return its label.
    pub fn add_rule(&mut self, rule: Rule) -> String {
        let label = self.label(TokenKind::Rule);
        self.rules.insert(label.clone(), rule);
        label
    }

    #[must_use]
    pub fn comment(&self, label: &str) -> Option<&str> {
        self.comments.get(label).map(String::as_str)
    }

    #[must_use]
    pub fn string(&self, label: &str) -> Option<&str> {
        self.strings.get(label).map(String::as_str)
    }

    #[must_use]
    pub fn paren(&self, label: &str) -> Option<&str> {
        self.parens.get(label).map(String::as_str)
    }

    #[must_use]
    pub fn rule(&self, label: &str) -> Option<&Rule> {
        self.rules.get(label)
    }

    /// Mutable access to every stored string literal.
    pub fn strings_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.strings.values_mut()
    }

    /// Number of stored rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Replace every paren label in `text` with its content.
    ///
    /// Repeats until no known paren label remains, since restored content may
    /// itself reference parens extracted later.
    #[must_use]
    pub fn restore_parens(&self, text: &str) -> String {
        let mut result = text.to_owned();
        for _ in 0..MAX_RESTORE_ROUNDS {
            if !PAREN_LABEL.is_match(&result) {
                break;
            }
            let restored = replace_labels(&result, TokenKind::Paren, |label| {
                self.paren(label).unwrap_or(label).to_owned()
            });
            if restored == result {
                break;
            }
            result = restored;
        }
        result
    }

    /// Replace every string label in `text` with the literal it stands for.
    #[must_use]
    pub fn restore_strings(&self, text: &str) -> String {
        replace_labels(text, TokenKind::String, |label| {
            self.string(label).unwrap_or(label).to_owned()
        })
    }
}

/// Whether a comment is flagged to survive minification (`/*! ... */`).
#[must_use]
pub fn is_flagged_comment(text: &str) -> bool {
    text.starts_with("/*!")
}

/// Replace every label of `kind` in `text` with the output of `replace`.
pub(crate) fn replace_labels(
    text: &str,
    kind: TokenKind,
    mut replace: impl FnMut(&str) -> String,
) -> String {
    kind.pattern()
        .replace_all(text, |caps: &Captures| replace(&caps[0]))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique_across_kinds() {
        let mut tokens = TokenStore::new();
        let a = tokens.add_comment("/* a */");
        let b = tokens.add_string("\"b\"");
        let c = tokens.add_paren("(c)");
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(c, "\u{2}p3\u{3}");
    }

    #[test]
    fn test_label_patterns_match_own_kind_only() {
        let mut tokens = TokenStore::new();
        let comment = tokens.add_comment("/* x */");
        assert!(TokenKind::Comment.pattern().is_match(&comment));
        assert!(!TokenKind::String.pattern().is_match(&comment));
        assert!(!TokenKind::Rule.pattern().is_match(&comment));
    }

    #[test]
    fn test_restore_nested_parens() {
        let mut tokens = TokenStore::new();
        let inner = tokens.add_paren("(1px)");
        let outer = tokens.add_paren(format!("(calc{inner})"));
        let text = format!("width:min{outer}");
        assert_eq!(tokens.restore_parens(&text), "width:min(calc(1px))");
    }

    #[test]
    fn test_restore_unknown_label_is_kept() {
        let tokens = TokenStore::new();
        let text = "a\u{2}p9\u{3}b";
        assert_eq!(tokens.restore_parens(text), text);
    }

    #[test]
    fn test_flagged_comment() {
        assert!(is_flagged_comment("/*! license */"));
        assert!(!is_flagged_comment("/* note */"));
    }
}
