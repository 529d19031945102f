//! Rule and declaration model with vendor alias expansion.

use std::sync::LazyLock;

use regex::Regex;

use crate::aliases::{AliasMap, AliasTable};
use crate::bracket::split_delimited;
use crate::functions::{self, FunctionEvaluator};
use crate::tokens::{TokenKind, TokenStore};

/// `-vendor-name`, capturing the vendor and the unprefixed name.
static VENDOR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-([a-z]+)-([a-z-]+)").unwrap());

/// Split a vendor-prefixed name into `(vendor, canonical name)`.
#[must_use]
pub fn vendor_of(name: &str) -> Option<(&str, &str)> {
    let caps = VENDOR_PREFIX.captures(name)?;
    let vendor = caps.get(1)?.as_str();
    let canonical = &name[vendor.len() + 2..];
    Some((vendor, canonical))
}

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property as written.
    pub property: String,
    /// Property with any vendor prefix stripped.
    pub canonical_property: String,
    /// Value; parenthesised groups are still labelled.
    pub value: String,
    /// Vendor this declaration targets, if any.
    pub vendor: Option<String>,
    /// Position in the source block.
    pub index: usize,
}

impl Declaration {
    /// Create a declaration, deriving the vendor from the property prefix.
    pub fn new(property: impl Into<String>, value: impl Into<String>, index: usize) -> Self {
        let property = property.into();
        let (vendor, canonical_property) = match vendor_of(&property) {
            Some((vendor, canonical)) => (Some(vendor.to_owned()), canonical.to_owned()),
            None => (None, property.clone()),
        };
        Self {
            property,
            canonical_property,
            value: value.into(),
            vendor,
            index,
        }
    }

    /// Copy with a different value, targeting `vendor`.
    fn vendor_copy(&self, value: String, vendor: Option<&str>) -> Self {
        Self {
            value,
            vendor: vendor.map(str::to_owned),
            ..self.clone()
        }
    }
}

/// Selector and declaration text of a rule before it is structured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRule {
    pub selector: String,
    pub declarations: String,
}

/// A parsed rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    /// Selector text as written, comments removed.
    pub selector_raw: String,
    /// Comma-separated selectors, filled in by [`expand_selectors`](Self::expand_selectors).
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
    /// Comment labels found in the selector or block.
    pub comments: Vec<String>,
    /// Vendor of an at-rule clone this rule belongs to.
    pub vendor_context: Option<String>,
}

impl Rule {
    /// Structure a raw rule.
    ///
    /// Comments are moved out of the text into [`comments`](Self::comments).
    /// The block is split on `;` without cutting through parentheses and each
    /// segment on its first `:`. Segments missing a property or a value are
    /// dropped. Custom functions in values are evaluated here.
    pub fn parse(
        raw: &RawRule,
        tokens: &mut TokenStore,
        evaluator: &dyn FunctionEvaluator,
    ) -> Self {
        let mut comments = Vec::new();
        let selector = take_comments(&raw.selector, &mut comments);
        let block = take_comments(&raw.declarations, &mut comments);

        let mut declarations = Vec::new();
        for segment in split_delimited(&block, ';', false, tokens) {
            let Some((property, value)) = segment.split_once(':') else {
                continue;
            };
            let (property, value) = (property.trim(), value.trim());
            if property.is_empty() || value.is_empty() {
                continue;
            }
            let value = functions::apply(value, evaluator, tokens);
            let index = declarations.len();
            declarations.push(Declaration::new(property, value, index));
        }

        Self {
            selector_raw: selector.trim().to_owned(),
            declarations,
            comments,
            ..Self::default()
        }
    }

    /// Whether the rule has no declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Apply property, function and value aliases, in that order.
    pub fn apply_aliases(&mut self, aliases: &AliasTable) {
        self.add_property_aliases(&aliases.properties);
        self.add_function_aliases(&aliases.functions);
        self.add_value_aliases(aliases);
    }

    /// Add a vendor-prefixed copy of each unprefixed declaration per property
    /// alias. Aliases the rule already declares explicitly are skipped.
    pub fn add_property_aliases(&mut self, properties: &AliasMap) {
        let declared: Vec<String> = self
            .declarations
            .iter()
            .map(|d| d.property.clone())
            .collect();
        self.expand(|decl| {
            if decl.vendor.is_some() {
                return Vec::new();
            }
            let Some(names) = properties.get(&decl.property) else {
                return Vec::new();
            };
            names
                .iter()
                .filter(|name| !declared.contains(name))
                .map(|name| Declaration::new(name.as_str(), decl.value.as_str(), decl.index))
                .collect()
        });
    }

    /// Alias function calls in values.
    ///
    /// An unprefixed declaration gains one copy per alias of each aliased
    /// function it calls. A prefixed declaration has its calls rewritten in
    /// place to the alias of its own vendor, when there is one.
    pub fn add_function_aliases(&mut self, aliases: &AliasMap) {
        for decl in &mut self.declarations {
            let Some(vendor) = decl.vendor.as_deref() else {
                continue;
            };
            let prefix = format!("-{vendor}-");
            for name in functions::called_functions(&decl.value) {
                let alias = aliases
                    .get(&name)
                    .and_then(|names| names.iter().find(|alias| alias.starts_with(&prefix)));
                if let Some(alias) = alias {
                    decl.value = functions::rename_calls(&decl.value, &name, alias);
                }
            }
        }

        self.expand(|decl| {
            if decl.vendor.is_some() {
                return Vec::new();
            }
            let mut copies = Vec::new();
            for name in functions::called_functions(&decl.value) {
                let Some(names) = aliases.get(&name) else {
                    continue;
                };
                for alias in names {
                    let value = functions::rename_calls(&decl.value, &name, alias);
                    copies.push(decl.vendor_copy(value, vendor_of(alias).map(|(v, _)| v)));
                }
            }
            copies
        });
    }

    /// Add a copy of each unprefixed declaration per alias of its exact value.
    pub fn add_value_aliases(&mut self, aliases: &AliasTable) {
        self.expand(|decl| {
            if decl.vendor.is_some() {
                return Vec::new();
            }
            let Some(names) = aliases
                .values
                .get(&decl.canonical_property)
                .and_then(|values| values.get(&decl.value))
            else {
                return Vec::new();
            };
            names
                .iter()
                .map(|alias| decl.vendor_copy(alias.clone(), vendor_of(alias).map(|(v, _)| v)))
                .collect()
        });
    }

    /// Insert the copies produced for each declaration right before it.
    fn expand(&mut self, mut copies_of: impl FnMut(&Declaration) -> Vec<Declaration>) {
        let mut expanded = Vec::with_capacity(self.declarations.len());
        for decl in self.declarations.drain(..) {
            expanded.extend(copies_of(&decl));
            expanded.push(decl);
        }
        self.declarations = expanded;
    }

    /// Split the raw selector on top-level commas.
    pub fn expand_selectors(&mut self, tokens: &mut TokenStore) {
        self.selectors = split_delimited(&self.selector_raw, ',', true, tokens)
            .into_iter()
            .map(|selector| selector.trim().to_owned())
            .collect();
    }

    /// Copy of this rule for an at-rule cloned for `vendor`.
    ///
    /// The copy keeps unprefixed declarations and those of `vendor` only.
    #[must_use]
    pub fn clone_for_vendor(&self, vendor: Option<&str>) -> Self {
        let declarations = self
            .declarations
            .iter()
            .filter(|d| d.vendor.is_none() || d.vendor.as_deref() == vendor)
            .cloned()
            .collect();
        Self {
            declarations,
            vendor_context: vendor.map(str::to_owned),
            ..self.clone()
        }
    }
}

/// Remove comment labels from `text`, collecting them in order.
fn take_comments(text: &str, comments: &mut Vec<String>) -> String {
    let pattern = TokenKind::Comment.pattern();
    comments.extend(pattern.find_iter(text).map(|m| m.as_str().to_owned()));
    pattern.replace_all(text, "").into_owned()
}
