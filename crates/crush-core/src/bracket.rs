//! Balanced-delimiter scanning.
//!
//! Two tools built on plain character scans:
//!
//! - [`match_pair`] finds the balanced span opened by the first opener at or
//!   after an offset (used to capture at-rule blocks).
//! - [`extract_all_top_level`] replaces every top-level span with a paren
//!   label so a later split on `,` or `;` cannot cut through a function call
//!   or a `data:` URI. [`split_delimited`] combines the two steps.

use crate::error::ScanError;
use crate::tokens::TokenStore;

/// Maximum number of delimiter events [`match_pair`] inspects.
pub const MAX_SCAN_STEPS: usize = 50;

/// Length of the excerpt reported with [`ScanError::UnbalancedDelimiters`].
const SAMPLE_LEN: usize = 15;

/// Byte range of a balanced span: `start` is the opener, `end` is one past
/// the matching closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Find the balanced span that starts at the first `opener` at or after `from`.
///
/// Returns `Ok(None)` when there is no opener past `from`. The opener and
/// closer counts of the whole `text` must agree, otherwise the scan is
/// refused with [`ScanError::UnbalancedDelimiters`]. At most
/// [`MAX_SCAN_STEPS`] delimiters are inspected.
pub fn match_pair(
    text: &str,
    opener: char,
    closer: char,
    from: usize,
) -> Result<Option<Span>, ScanError> {
    let Some(start) = text.get(from..).and_then(|rest| rest.find(opener)) else {
        return Ok(None);
    };
    let start = from + start;

    if text.matches(opener).count() != text.matches(closer).count() {
        return Err(unbalanced(text));
    }

    let mut depth = 0usize;
    let mut steps = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        if ch == opener {
            depth += 1;
        } else if ch == closer {
            depth -= 1;
        } else {
            continue;
        }

        steps += 1;
        if steps > MAX_SCAN_STEPS {
            return Err(ScanError::ScanLimitExceeded(MAX_SCAN_STEPS));
        }
        if depth == 0 {
            return Ok(Some(Span {
                start,
                end: start + offset + ch.len_utf8(),
            }));
        }
    }

    // Counts agree globally but the closers sit before the opener.
    Err(unbalanced(text))
}

fn unbalanced(text: &str) -> ScanError {
    ScanError::UnbalancedDelimiters {
        sample: text.chars().take(SAMPLE_LEN).collect(),
    }
}

/// Text with its top-level delimited spans replaced by paren labels.
#[derive(Debug, Default)]
pub struct Protected {
    /// Text with labels in place of the spans.
    pub text: String,
    /// `(label, original span)` pairs, in splice order.
    pub matches: Vec<(String, String)>,
}

impl Protected {
    /// Put the original span content back in place of this extraction's labels.
    #[must_use]
    pub fn fold_in(&self, segment: &str) -> String {
        let mut result = segment.to_owned();
        for (label, content) in &self.matches {
            if result.contains(label.as_str()) {
                result = result.replace(label.as_str(), content);
            }
        }
        result
    }
}

/// Replace every maximal top-level `opener ... closer` span with a paren label.
///
/// A single forward scan records span offsets; splicing then runs from the
/// last span to the first so earlier offsets stay valid. Each label is also
/// registered in `tokens` so the renderer can restore it. Unclosed openers
/// and stray closers are left as literal text.
pub fn extract_all_top_level(
    text: &str,
    opener: char,
    closer: char,
    tokens: &mut TokenStore,
) -> Protected {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut span_start = 0usize;

    for (index, ch) in text.char_indices() {
        if ch == opener {
            if depth == 0 {
                span_start = index;
            }
            depth += 1;
        } else if ch == closer && depth > 0 {
            depth -= 1;
            if depth == 0 {
                spans.push((span_start, index + ch.len_utf8()));
            }
        }
    }

    let mut result = text.to_owned();
    let mut matches = Vec::with_capacity(spans.len());
    for (start, end) in spans.into_iter().rev() {
        let content = text[start..end].to_owned();
        let label = tokens.add_paren(content.clone());
        result.replace_range(start..end, &label);
        matches.push((label, content));
    }

    Protected {
        text: result,
        matches,
    }
}

/// Split `text` on `delim` without cutting through parenthesised groups.
///
/// Blank segments are dropped. With `fold_in` the paren content is restored
/// in each segment; without it the segments keep their paren labels.
pub fn split_delimited(
    text: &str,
    delim: char,
    fold_in: bool,
    tokens: &mut TokenStore,
) -> Vec<String> {
    let protected = extract_all_top_level(text, '(', ')', tokens);
    protected
        .text
        .split(delim)
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            if fold_in {
                protected.fold_in(segment)
            } else {
                segment.to_owned()
            }
        })
        .collect()
}
