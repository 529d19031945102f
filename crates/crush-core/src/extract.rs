//! Extraction passes.
//!
//! Comments, strings, variable blocks and rule blocks are pulled out of the
//! stream in that order. Each pass is one regex scan over the whole stream.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::bracket::split_delimited;
use crate::compiler::Context;
use crate::error::CompileError;
use crate::hooks::HookPoint;
use crate::rule::{RawRule, Rule};
use crate::tokens::{TokenKind, TokenStore};

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

static STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`[^`]*`"#).unwrap()
});

static VARIABLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)@(?:variables|define)\s*([^\{]*)\{\s*(.*?)\s*\};?").unwrap()
});

/// `@font-face` and `@page` blocks are treated like ordinary rules.
static RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\n(?:[^@{}]+|@(?:font-face|page)[^{]*))\{([^{}]*)\}").unwrap()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static BRACKET_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\[)\s*|\s*(\])|(\()\s*|\s*(\))").unwrap());

static DELIMITER_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([;,/!])\s*").unwrap());

/// Replace every comment with a comment label.
pub(crate) fn extract_comments(stream: &str, tokens: &mut TokenStore) -> String {
    COMMENT
        .replace_all(stream, |caps: &Captures| tokens.add_comment(&caps[0]))
        .into_owned()
}

/// Replace every quoted string with a string label.
pub(crate) fn extract_strings(stream: &str, tokens: &mut TokenStore) -> String {
    STRING
        .replace_all(stream, |caps: &Captures| tokens.add_string(&caps[0]))
        .into_owned()
}

/// Remove `@variables` / `@define` blocks, returning the variables they declare.
///
/// Later declarations of the same name win.
pub(crate) fn extract_variables(
    stream: &str,
    tokens: &mut TokenStore,
) -> (String, BTreeMap<String, String>) {
    let mut variables = BTreeMap::new();
    let stream = VARIABLES
        .replace_all(stream, |caps: &Captures| {
            let block = TokenKind::Comment.pattern().replace_all(&caps[2], "");
            for pair in split_delimited(&block, ';', true, tokens) {
                let Some((name, value)) = pair.split_once(':') else {
                    continue;
                };
                let name = name.trim();
                if !name.is_empty() {
                    variables.insert(name.to_owned(), value.trim().to_owned());
                }
            }
            ""
        })
        .into_owned();
    (stream, variables)
}

/// Collapse whitespace and trim it around brackets and delimiters.
pub(crate) fn normalize(stream: &str) -> String {
    let stream = WHITESPACE.replace_all(stream, " ");
    let stream = BRACKET_SPACE.replace_all(&stream, "${1}${2}${3}${4}");
    DELIMITER_SPACE.replace_all(&stream, "$1").into_owned()
}

/// Put every rule on its own line.
///
/// Breaks before `@` and after `{`, `}` and `;`. Text inside parentheses is
/// left alone so unquoted `data:` URIs stay intact.
pub(crate) fn break_lines(stream: &str) -> String {
    let mut result = String::with_capacity(stream.len() + stream.len() / 8 + 1);
    result.push('\n');
    let mut depth = 0usize;
    for ch in stream.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth > 0 {
            result.push(ch);
            continue;
        }
        match ch {
            '@' => result.push_str("\n@"),
            '{' | '}' | ';' => {
                result.push(ch);
                result.push('\n');
            }
            _ => result.push(ch),
        }
    }
    result
}

/// Replace every rule block with a rule label, or remove it when it has no
/// declarations.
pub(crate) fn extract_rules(stream: &str, ctx: &mut Context<'_>) -> Result<String, CompileError> {
    let mut result = String::with_capacity(stream.len());
    let mut last = 0;
    for caps in RULE.captures_iter(stream) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        result.push_str(&stream[last..whole.start()]);
        let raw = RawRule {
            selector: caps[1].to_owned(),
            declarations: caps[2].to_owned(),
        };
        if let Some(label) = process_rule(raw, ctx)? {
            result.push_str(&label);
            result.push('\n');
        }
        last = whole.end();
    }
    result.push_str(&stream[last..]);
    Ok(result)
}

fn process_rule(mut raw: RawRule, ctx: &mut Context<'_>) -> Result<Option<String>, CompileError> {
    ctx.hooks.run_preprocess(&mut raw)?;

    let mut rule = Rule::parse(&raw, &mut ctx.tokens, ctx.functions);
    if rule.is_empty() {
        return Ok(None);
    }

    ctx.hooks.run(HookPoint::RulePrealias, &mut rule)?;
    if !ctx.aliases.is_empty() {
        rule.apply_aliases(&ctx.aliases);
    }
    ctx.hooks.run(HookPoint::RulePostalias, &mut rule)?;
    rule.expand_selectors(&mut ctx.tokens);
    ctx.hooks.run(HookPoint::RulePostprocess, &mut rule)?;

    if rule.is_empty() {
        return Ok(None);
    }
    Ok(Some(ctx.tokens.add_rule(rule)))
}
