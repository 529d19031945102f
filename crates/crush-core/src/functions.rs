//! Custom CSS functions.
//!
//! A [`FunctionEvaluator`] computes calls such as `math(10px * 2)` at compile
//! time. Calls are located as a function name immediately followed by a
//! paren label, so arguments never need to be re-parsed for nesting: inner
//! calls are evaluated first, then the outer one.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::bracket::extract_all_top_level;
use crate::tokens::TokenStore;

/// Function name followed by a paren label.
static FUNCTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[^a-z0-9_-])([a-z_-]+)(\x02p\d+\x03)").unwrap());

/// Evaluates custom functions.
pub trait FunctionEvaluator: Send + Sync {
    /// Evaluate `name(args)`.
    ///
    /// `args` is the text between the parentheses with nested custom calls
    /// already evaluated. Returns `None` for functions this evaluator does
    /// not handle; the call is then left untouched.
    fn call(&self, name: &str, args: &str) -> Option<String>;
}

/// Evaluator that recognises nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFunctions;

impl FunctionEvaluator for NoFunctions {
    fn call(&self, _name: &str, _args: &str) -> Option<String> {
        None
    }
}

/// Built-in functions.
///
/// - `math(expr)` / `math(expr, unit)`: arithmetic with `+ - * /` and
///   parentheses. The unit is the explicit second argument, or the first
///   unit found in the expression.
/// - `percent(a, b)` / `pc(a, b)`: `a / b` as a percentage.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinFunctions;

impl FunctionEvaluator for BuiltinFunctions {
    fn call(&self, name: &str, args: &str) -> Option<String> {
        match name.to_ascii_lowercase().as_str() {
            "math" => math(args),
            "percent" | "pc" => percent(args),
            _ => None,
        }
    }
}

/// Names of all functions called in `value`, in order of appearance.
pub(crate) fn called_functions(value: &str) -> Vec<String> {
    FUNCTION_CALL
        .captures_iter(value)
        .map(|caps| caps[2].to_owned())
        .collect()
}

/// Rename calls of function `from` to `to` in a paren-labelled value.
pub(crate) fn rename_calls(value: &str, from: &str, to: &str) -> String {
    FUNCTION_CALL
        .replace_all(value, |caps: &Captures| {
            if caps[2].eq_ignore_ascii_case(from) {
                format!("{}{to}{}", &caps[1], &caps[3])
            } else {
                caps[0].to_owned()
            }
        })
        .into_owned()
}

/// Evaluate custom function calls in a paren-labelled value.
///
/// Unrecognised calls keep their name; if their arguments contained
/// recognised calls, the evaluated arguments are stored under a new label.
pub(crate) fn apply(
    value: &str,
    evaluator: &dyn FunctionEvaluator,
    tokens: &mut TokenStore,
) -> String {
    let calls: Vec<(usize, usize, String, String)> = FUNCTION_CALL
        .captures_iter(value)
        .filter_map(|caps| {
            let name = caps.get(2)?;
            let label = caps.get(3)?;
            Some((name.start(), label.end(), name.as_str().to_owned(), label.as_str().to_owned()))
        })
        .collect();
    if calls.is_empty() {
        return value.to_owned();
    }

    let mut result = String::with_capacity(value.len());
    let mut last = 0;
    for (start, end, name, label) in calls {
        let Some(content) = tokens.paren(&label).map(str::to_owned) else {
            continue;
        };
        let inner = content
            .strip_prefix('(')
            .and_then(|c| c.strip_suffix(')'))
            .unwrap_or(&content);
        let args = apply_raw(inner, evaluator, tokens);

        result.push_str(&value[last..start]);
        if let Some(computed) = evaluator.call(&name, args.trim()) {
            result.push_str(&computed);
        } else if args == inner {
            result.push_str(&value[start..end]);
        } else {
            result.push_str(&name);
            result.push_str(&tokens.add_paren(format!("({args})")));
        }
        last = end;
    }
    result.push_str(&value[last..]);
    result
}

/// Evaluate custom function calls in plain text (no paren labels).
pub(crate) fn apply_raw(
    text: &str,
    evaluator: &dyn FunctionEvaluator,
    tokens: &mut TokenStore,
) -> String {
    if !text.contains('(') {
        return text.to_owned();
    }
    let protected = extract_all_top_level(text, '(', ')', tokens);
    let evaluated = apply(&protected.text, evaluator, tokens);
    tokens.restore_parens(&evaluated)
}

fn math(args: &str) -> Option<String> {
    let (expr, explicit_unit) = match args.split_once(',') {
        Some((expr, unit)) => (expr, Some(unit.trim())),
        None => (args, None),
    };
    let mut parser = MathParser::new(expr);
    let value = parser.expression()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return None;
    }
    let unit = explicit_unit.or(parser.unit).unwrap_or_default();
    Some(format!("{}{unit}", format_number(value)))
}

fn percent(args: &str) -> Option<String> {
    let (a, b) = args.split_once(',')?;
    let a: f64 = a.trim().parse().ok()?;
    let b: f64 = b.trim().parse().ok()?;
    if b == 0.0 {
        return None;
    }
    Some(format!("{}%", format_number(a / b * 100.0)))
}

/// Round to five decimals and drop a trailing `.0`.
fn format_number(value: f64) -> String {
    let rounded = (value * 100_000.0).round() / 100_000.0;
    if rounded == 0.0 {
        return "0".to_owned();
    }
    format!("{rounded}")
}

/// Recursive-descent evaluator for `math()` expressions.
struct MathParser<'a> {
    input: &'a str,
    pos: usize,
    unit: Option<&'a str>,
}

impl<'a> MathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            unit: None,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn expression(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('+') => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some('-') => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Some(value),
            }
        }
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                Some('/') => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return None;
                    }
                    value /= divisor;
                }
                _ => return Some(value),
            }
        }
    }

    fn factor(&mut self) -> Option<f64> {
        self.skip_whitespace();
        match self.peek()? {
            '-' => {
                self.pos += 1;
                Some(-self.factor()?)
            }
            '(' => {
                self.pos += 1;
                let value = self.expression()?;
                self.skip_whitespace();
                (self.peek() == Some(')')).then(|| self.pos += 1)?;
                Some(value)
            }
            _ => self.number(),
        }
    }

    fn number(&mut self) -> Option<f64> {
        let rest = &self.input[self.pos..];
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let value: f64 = rest[..digits].parse().ok()?;
        self.pos += digits;

        let rest = &self.input[self.pos..];
        let unit_len = rest
            .find(|c: char| !(c.is_ascii_alphabetic() || c == '%'))
            .unwrap_or(rest.len());
        if unit_len > 0 {
            self.unit.get_or_insert(&rest[..unit_len]);
            self.pos += unit_len;
        }
        Some(value)
    }
}
