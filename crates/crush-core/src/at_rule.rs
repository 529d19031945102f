//! Vendor copies of whole at-rule blocks.

use regex::Regex;

use crate::bracket::match_pair;
use crate::compiler::Context;
use crate::rule::vendor_of;
use crate::tokens::{TokenKind, replace_labels};

/// Insert a vendor copy of every aliased at-rule block ahead of the original.
///
/// Rules inside each copy are cloned under fresh labels and keep only
/// declarations that are unprefixed or match the copy's vendor. The scan
/// resumes after the spliced text, so blocks are never visited twice.
pub(crate) fn alias_at_rules(mut stream: String, ctx: &mut Context<'_>) -> String {
    if ctx.aliases.at_rules.is_empty() {
        return stream;
    }
    let at_rules = ctx.aliases.at_rules.clone();

    for (name, aliases) in &at_rules {
        let Ok(pattern) = Regex::new(&format!(r"@{}[\s{{]", regex::escape(name))) else {
            continue;
        };
        let keyword = format!("@{name}");

        let mut scan = 0;
        while let Some(found) = pattern.find_at(&stream, scan) {
            let start = found.start();
            let span = match match_pair(&stream, '{', '}', start) {
                Ok(Some(span)) => span,
                Ok(None) => break,
                Err(e) => {
                    ctx.warn(format!("@{name} blocks left unaliased: {e}"));
                    break;
                }
            };

            let original = stream[start..span.end].to_owned();
            let mut blocks = Vec::with_capacity(aliases.len() + 1);
            for alias in aliases {
                let vendor = vendor_of(alias).map(|(vendor, _)| vendor);
                let copy = original.replacen(&keyword, &format!("@{alias}"), 1);
                let copy = replace_labels(&copy, TokenKind::Rule, |label| {
                    let clone = ctx.tokens.rule(label).map(|rule| rule.clone_for_vendor(vendor));
                    clone.map_or_else(|| label.to_owned(), |rule| ctx.tokens.add_rule(rule))
                });
                blocks.push(copy);
            }
            blocks.push(original);

            let joined = blocks.join("\n");
            stream.replace_range(start..span.end, &joined);
            scan = start + joined.len();
            tracing::debug!("aliased {keyword} block into {} copies", aliases.len());
        }
    }
    stream
}
