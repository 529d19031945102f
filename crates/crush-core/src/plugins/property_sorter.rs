//! Declaration ordering by a property table.
//!
//! ```text
//! color: red;            display: block;
//! background: #000;  ->  opacity: .5;
//! opacity: .5;           color: red;
//! display: block;        background: #000;
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::hooks::HookRegistry;
use crate::rule::{Declaration, Rule};

/// Default property order: layout, box, then visual properties.
const DEFAULT_ORDER: &[&str] = &[
    "content", "quotes",
    "display", "visibility", "position", "z-index",
    "top", "right", "bottom", "left",
    "box-sizing", "float", "clear", "overflow", "overflow-x", "overflow-y", "clip",
    "flex", "flex-direction", "flex-wrap", "flex-basis", "flex-grow", "flex-shrink",
    "justify-content", "align-items", "align-content", "align-self", "order",
    "width", "min-width", "max-width", "height", "min-height", "max-height",
    "margin", "margin-top", "margin-right", "margin-bottom", "margin-left",
    "padding", "padding-top", "padding-right", "padding-bottom", "padding-left",
    "table-layout", "empty-cells", "caption-side", "border-spacing", "border-collapse",
    "list-style", "list-style-position", "list-style-type", "list-style-image",
    "transform", "transform-origin", "transition", "animation",
    "opacity", "color",
    "font", "font-family", "font-size", "font-style", "font-weight", "font-variant",
    "line-height", "letter-spacing", "word-spacing",
    "text-align", "text-decoration", "text-indent", "text-overflow", "text-shadow",
    "text-transform", "vertical-align", "white-space", "word-wrap",
    "background", "background-color", "background-image", "background-repeat",
    "background-position", "background-size", "background-attachment", "background-clip",
    "border", "border-width", "border-style", "border-color",
    "border-top", "border-right", "border-bottom", "border-left", "border-radius",
    "outline", "outline-width", "outline-style", "outline-color", "outline-offset",
    "box-shadow", "cursor", "zoom",
];

/// Orders declarations by a property table.
///
/// Listed properties come first, in table order; the rest follow
/// alphabetically. Variants of the same canonical property keep prefixed
/// declarations before the unprefixed one (longer vendor names first) and
/// otherwise keep source order.
#[derive(Debug, Clone)]
pub struct PropertySorter {
    table: HashMap<String, usize>,
}

impl Default for PropertySorter {
    fn default() -> Self {
        Self::with_order(DEFAULT_ORDER.iter().copied())
    }
}

impl PropertySorter {
    /// Sorter using the built-in table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorter using a custom table. An empty table sorts alphabetically.
    pub fn with_order<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = HashMap::new();
        for (rank, property) in order.into_iter().enumerate() {
            table.entry(property.into()).or_insert(rank);
        }
        Self { table }
    }

    /// Purely alphabetical sorter.
    #[must_use]
    pub fn alphabetical() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Sort the declarations of `rule` in place.
    pub fn sort(&self, rule: &mut Rule) {
        rule.declarations.sort_by(|a, b| self.compare(a, b));
    }

    /// Register the sorter on the `rule_prealias` point.
    pub fn register(self, hooks: &mut HookRegistry) {
        hooks.on_rule_prealias(move |rule| {
            self.sort(rule);
            Ok(())
        });
    }

    fn compare(&self, a: &Declaration, b: &Declaration) -> Ordering {
        let (pa, pb) = (&a.canonical_property, &b.canonical_property);
        if pa != pb {
            return match (self.table.get(pa), self.table.get(pb)) {
                (Some(ra), Some(rb)) => ra.cmp(rb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => pa.cmp(pb),
            };
        }

        match (&a.vendor, &b.vendor) {
            (None, None) => a.index.cmp(&b.index),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(va), Some(vb)) => vb.len().cmp(&va.len()).then(a.index.cmp(&b.index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rule(properties: &[&str]) -> Rule {
        Rule {
            declarations: properties
                .iter()
                .enumerate()
                .map(|(i, p)| Declaration::new(*p, "x", i))
                .collect(),
            ..Rule::default()
        }
    }

    fn order(rule: &Rule) -> Vec<&str> {
        rule.declarations.iter().map(|d| d.property.as_str()).collect()
    }

    #[test]
    fn test_default_table() {
        let mut r = rule(&["color", "background", "opacity", "display"]);
        PropertySorter::new().sort(&mut r);
        assert_eq!(order(&r), vec!["display", "opacity", "color", "background"]);
    }

    #[test]
    fn test_unlisted_properties_follow_alphabetically() {
        let mut r = rule(&["zeta-prop", "color", "alpha-prop"]);
        PropertySorter::new().sort(&mut r);
        assert_eq!(order(&r), vec!["color", "alpha-prop", "zeta-prop"]);
    }

    #[test]
    fn test_vendor_variants() {
        let mut r = rule(&[
            "border-radius",
            "-o-border-radius",
            "-webkit-border-radius",
            "margin",
        ]);
        PropertySorter::new().sort(&mut r);
        assert_eq!(
            order(&r),
            vec![
                "margin",
                "-webkit-border-radius",
                "-o-border-radius",
                "border-radius"
            ]
        );
    }

    #[test]
    fn test_duplicates_keep_source_order() {
        let mut r = rule(&["color", "margin", "color"]);
        r.declarations[2].value = "y".to_owned();
        PropertySorter::alphabetical().sort(&mut r);
        let values: Vec<&str> = r.declarations.iter().map(|d| d.value.as_str()).collect();
        assert_eq!(order(&r), vec!["color", "color", "margin"]);
        assert_eq!(values, vec!["x", "y", "x"]);
    }

    #[test]
    fn test_custom_table() {
        let mut r = rule(&["a", "b", "c"]);
        PropertySorter::with_order(["c", "a"]).sort(&mut r);
        assert_eq!(order(&r), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_registers_on_prealias() {
        let mut hooks = HookRegistry::new();
        PropertySorter::new().register(&mut hooks);
        assert_eq!(hooks.len(crate::hooks::HookPoint::RulePrealias), 1);
    }
}
