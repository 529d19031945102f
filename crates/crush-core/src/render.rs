//! Output rendering.
//!
//! Tokens are put back in a fixed order: rules, then parens, then comments,
//! then strings. String literals go back last and are never transformed.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rule::Rule;
use crate::tokens::{TokenKind, TokenStore, is_flagged_comment, replace_labels};

static BRACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([{}])").unwrap());
static AT_SIGN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@").unwrap());
static ANY_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\x02[a-z]\d+\x03)").unwrap());
static NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());
static LEADING_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s+").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static MINIFY_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+| (\{)").unwrap());
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d*\.\d+").unwrap());
static LEADING_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[: \(,])0(\.\d+)").unwrap());
static ZERO_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[: \(,])\.?0[a-zA-Z]{1,5}\b").unwrap());
static ZERO_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|:) *(?:0 0 0 0|0 0 0) *(;|\})").unwrap());
static ZERO_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(padding|margin) ?: *0 0 *(;|\})").unwrap());
static COMBINATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*([>~+=])\s*").unwrap());
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([:,( ])#([0-9a-fA-F]{6})\b").unwrap());
static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\burl\([^)]*\)").unwrap());
static URL_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x02u(\d+)\x03").unwrap());

/// Render a labelled stream back to CSS.
pub(crate) fn display(stream: &str, tokens: &TokenStore, minify: bool) -> String {
    let mut stream = if minify {
        replace_labels(stream, TokenKind::Comment, |label| {
            match tokens.comment(label) {
                Some(text) if is_flagged_comment(text) => label.to_owned(),
                _ => String::new(),
            }
        })
    } else {
        let spaced = BRACES.replace_all(stream, "$1\n");
        let spaced = AT_SIGN.replace_all(&spaced, "\n@");
        let spaced = ANY_LABEL.replace_all(&spaced, "$1\n");
        NEWLINES
            .replace_all(&spaced, "\n")
            .trim_start()
            .to_owned()
    };
    stream = LEADING_SPACE.replace_all(&stream, "\n").into_owned();

    stream = replace_labels(&stream, TokenKind::Rule, |label| {
        tokens
            .rule(label)
            .map(|rule| print_rule(rule, tokens, minify))
            .unwrap_or_default()
    });
    stream = tokens.restore_parens(&stream);

    if minify {
        stream = minify_css(&stream);
        stream = replace_labels(&stream, TokenKind::Comment, |label| {
            tokens.comment(label).unwrap_or_default().to_owned()
        });
    } else {
        stream = replace_labels(&stream, TokenKind::Comment, |label| {
            format!("{}\n", tokens.comment(label).unwrap_or_default())
        });
        stream = BLANK_LINES.replace_all(&stream, "\n\n").into_owned();
    }

    tokens.restore_strings(&stream).trim().to_owned()
}

fn print_rule(rule: &Rule, tokens: &TokenStore, minify: bool) -> String {
    if minify {
        let comments: String = rule
            .comments
            .iter()
            .filter(|label| tokens.comment(label).is_some_and(is_flagged_comment))
            .map(String::as_str)
            .collect();
        let block: Vec<String> = rule
            .declarations
            .iter()
            .map(|d| format!("{}:{}", d.property, d.value))
            .collect();
        format!("{comments}{}{{{}}}", rule.selectors.join(","), block.join(";"))
    } else {
        let mut out = String::new();
        for label in &rule.comments {
            out.push_str(label);
            out.push('\n');
        }
        out.push_str(&rule.selectors.join(", "));
        out.push_str(" {\n");
        for d in &rule.declarations {
            out.push_str(&format!("\t{}: {};\n", d.property, d.value));
        }
        out.push('}');
        out
    }
}

/// Textual simplifications applied to minified output.
///
/// `url(...)` arguments are set aside first so file names keep their digits.
pub(crate) fn minify_css(css: &str) -> String {
    let mut urls = Vec::new();
    let css = URL.replace_all(css, |caps: &Captures| {
        urls.push(caps[0].to_owned());
        format!("\x02u{}\x03", urls.len() - 1)
    });
    let css = MINIFY_WHITESPACE.replace_all(&css, "$1");
    let css = DECIMAL.replace_all(&css, |caps: &Captures| {
        let Some(m) = caps.get(0) else {
            return String::new();
        };
        let before = css[..m.start()].chars().next_back();
        let after = css[m.end()..].chars().next();
        if before.is_some_and(|c| c.is_alphabetic() || matches!(c, '_' | '-' | '.' | '#' | '/'))
            || after == Some('/')
        {
            return m.as_str().to_owned();
        }
        trim_fraction(m.as_str())
    });
    let css = LEADING_ZERO.replace_all(&css, "${1}${2}");
    let css = ZERO_UNIT.replace_all(&css, "${1}0");
    let css = ZERO_LIST.replace_all(&css, "${1}0${2}");
    let css = ZERO_PAIR.replace_all(&css, "${1}:0${2}");
    let css = COMBINATOR.replace_all(&css, |caps: &Captures| {
        let start = caps.get(0).map_or(0, |m| m.start());
        if in_declaration(&css, start) {
            caps[0].to_owned()
        } else {
            caps[1].to_owned()
        }
    });
    HEX_COLOR
        .replace_all(&css, |caps: &Captures| {
            let hex = caps[2].as_bytes();
            let start = caps.get(2).map_or(0, |m| m.start());
            if in_declaration(&css, start) && hex[0] == hex[1] && hex[2] == hex[3] && hex[4] == hex[5]
            {
                format!(
                    "{}#{}{}{}",
                    &caps[1],
                    char::from(hex[0]),
                    char::from(hex[2]),
                    char::from(hex[4])
                )
            } else {
                caps[0].to_owned()
            }
        });
    URL_LABEL
        .replace_all(&css, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| urls.get(i))
                .map_or_else(|| caps[0].to_owned(), Clone::clone)
        })
        .into_owned()
}

/// Strip trailing zeros from the fraction of a decimal number.
fn trim_fraction(number: &str) -> String {
    let Some((whole, fraction)) = number.split_once('.') else {
        return number.to_owned();
    };
    let fraction = fraction.trim_end_matches('0');
    match (whole.is_empty(), fraction.is_empty()) {
        (true, true) => "0".to_owned(),
        (false, true) => whole.to_owned(),
        _ => format!("{whole}.{fraction}"),
    }
}

/// Whether `pos` lies inside a declaration block rather than a selector.
///
/// The nearest unclosed `{` decides: a block holding no nested `{` before it
/// closes is a declaration block, anything else (top level, an at-rule body)
/// is selector context.
fn in_declaration(css: &str, pos: usize) -> bool {
    let mut depth = 0usize;
    let open = css.as_bytes()[..pos].iter().rposition(|&b| match b {
        b'}' => {
            depth += 1;
            false
        }
        b'{' if depth > 0 => {
            depth -= 1;
            false
        }
        b'{' => true,
        _ => false,
    });
    let Some(open) = open else {
        return false;
    };
    let body = &css[open + 1..];
    body.find(['{', '}'])
        .is_none_or(|i| body.as_bytes()[i] == b'}')
}
