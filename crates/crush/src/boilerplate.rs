//! Banner comment prepended to compiled files.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());

/// Render a boilerplate template as a block comment.
///
/// `{{version}}` is replaced by the crate version and any other tag by `?`.
/// Lines are trimmed and prefixed with ` * `.
pub(crate) fn render(template: &str) -> String {
    let text = TAG.replace_all(template, |caps: &Captures<'_>| match caps[1].trim() {
        "version" => env!("CARGO_PKG_VERSION").to_owned(),
        _ => "?".to_owned(),
    });

    let mut out = String::from("/*\n");
    for line in text.trim_end().lines() {
        let line = line.trim();
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            out.push_str(" * ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(" */");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render() {
        let template = "  Built by crush {{version}}\n\nDo not edit {{ author }}\n";
        assert_eq!(
            render(template),
            format!(
                "/*\n * Built by crush {}\n *\n * Do not edit ?\n */",
                env!("CARGO_PKG_VERSION")
            )
        );
    }
}
