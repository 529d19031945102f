//! Variable resolution and substitution.
//!
//! Two reference syntaxes are accepted: `var(name)` and `$(name)`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::functions::{self, FunctionEvaluator};
use crate::tokens::TokenStore;

/// Name to raw value.
pub type Variables = BTreeMap<String, String>;

static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^a-zA-Z0-9_-])var\(\s*([a-zA-Z0-9_-]+)\s*\)|\$\(\s*([a-zA-Z0-9_-]+)\s*\)")
        .unwrap()
});

/// Merge variable sources; later sources override earlier ones.
pub(crate) fn merge(global: &Variables, document: Variables, runtime: &Variables) -> Variables {
    let mut merged = global.clone();
    merged.extend(document);
    merged.extend(runtime.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Resolve references inside values, then evaluate custom functions.
///
/// Every value is resolved against the table as it was before this pass, so
/// chains of references are followed one level only.
pub(crate) fn resolve(
    table: Variables,
    evaluator: &dyn FunctionEvaluator,
    tokens: &mut TokenStore,
) -> Variables {
    let snapshot = table.clone();
    table
        .into_iter()
        .map(|(name, value)| {
            let value = substitute(&value, &snapshot);
            let value = functions::apply_raw(&value, evaluator, tokens);
            (name, value)
        })
        .collect()
}

/// Replace variable references in `text`.
///
/// Unknown references are removed, keeping the character before them.
pub(crate) fn substitute(text: &str, table: &Variables) -> String {
    if !text.contains("var(") && !text.contains("$(") {
        return text.to_owned();
    }
    VAR_REF
        .replace_all(text, |caps: &Captures| {
            let before = caps.get(1).map_or("", |m| m.as_str());
            let name = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            match table.get(name) {
                Some(value) => format!("{before}{value}"),
                None => {
                    tracing::debug!("unknown variable '{name}' removed");
                    before.to_owned()
                }
            }
        })
        .into_owned()
}

/// Substitute variables in the stream and in string literals that use `$`.
pub(crate) fn place(stream: &str, table: &Variables, tokens: &mut TokenStore) -> String {
    for string in tokens.strings_mut() {
        if string.contains('$') {
            *string = substitute(string, table);
        }
    }
    substitute(stream, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::BuiltinFunctions;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_merge_precedence() {
        let global = vars(&[("x", "1"), ("g", "g")]);
        let document = vars(&[("x", "2")]);
        let runtime = vars(&[("x", "3")]);

        assert_eq!(merge(&global, document.clone(), &runtime)["x"], "3");
        assert_eq!(merge(&global, document, &Variables::new())["x"], "2");
        let merged = merge(&global, Variables::new(), &Variables::new());
        assert_eq!(merged["x"], "1");
        assert_eq!(merged["g"], "g");
    }

    #[test]
    fn test_substitute_both_syntaxes() {
        let table = vars(&[("brand", "#c00"), ("gap", "4px")]);
        assert_eq!(substitute("color:var(brand)", &table), "color:#c00");
        assert_eq!(substitute("margin:$(gap) $( gap )", &table), "margin:4px 4px");
        assert_eq!(substitute("var(brand)", &table), "#c00");
    }

    #[test]
    fn test_substitute_unknown_is_removed() {
        let table = Variables::new();
        assert_eq!(substitute("color: var(nope);", &table), "color: ;");
        assert_eq!(substitute("a:$(nope)b", &table), "a:b");
    }

    #[test]
    fn test_substitute_ignores_lookalike_functions() {
        let table = vars(&[("x", "1")]);
        assert_eq!(substitute("my-var(x)", &table), "my-var(x)");
    }

    #[test]
    fn test_resolve_is_single_pass() {
        let mut tokens = TokenStore::new();
        let table = vars(&[("a", "var(b)"), ("b", "var(c)"), ("c", "1px")]);
        let resolved = resolve(table, &BuiltinFunctions, &mut tokens);
        assert_eq!(resolved["b"], "1px");
        assert_eq!(resolved["a"], "var(c)");
    }

    #[test]
    fn test_resolve_evaluates_functions() {
        let mut tokens = TokenStore::new();
        let table = vars(&[("base", "8px"), ("double", "math(var(base) * 2)")]);
        let resolved = resolve(table, &BuiltinFunctions, &mut tokens);
        assert_eq!(resolved["double"], "16px");
    }

    #[test]
    fn test_place_in_strings() {
        let mut tokens = TokenStore::new();
        let with_sigil = tokens.add_string("\"$(name)\"");
        let without = tokens.add_string("\"var(name)\"");
        let table = vars(&[("name", "crush")]);
        let stream = place("a $(name)", &table, &mut tokens);
        assert_eq!(stream, "a crush");
        assert_eq!(tokens.string(&with_sigil), Some("\"crush\""));
        assert_eq!(tokens.string(&without), Some("\"var(name)\""));
    }
}
