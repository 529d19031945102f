//! Vendor alias table.
//!
//! Definitions are a TOML document with four tables:
//!
//! ```toml
//! [at-rules]
//! keyframes = ["-webkit-keyframes", "-moz-keyframes"]
//!
//! [properties]
//! border-radius = ["-webkit-border-radius", "-moz-border-radius"]
//!
//! [functions]
//! linear-gradient = ["-webkit-linear-gradient", "-moz-linear-gradient"]
//!
//! [values]
//! "display:box" = ["-webkit-box", "-moz-box"]
//! ```
//!
//! The loaded table is shared by every compile; each compile works on a
//! [`pruned`](AliasTable::pruned) copy restricted to its vendor target.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::AliasError;
use crate::options::VendorTarget;

/// Alias name lists keyed by the unprefixed name.
pub type AliasMap = BTreeMap<String, Vec<String>>;

/// Alias definitions as written in the source document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AliasSource {
    #[serde(rename = "at-rules")]
    at_rules: AliasMap,
    properties: AliasMap,
    functions: AliasMap,
    values: AliasMap,
}

/// Vendor alias lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    /// At-rule name to vendor-prefixed at-rule names.
    pub at_rules: AliasMap,
    /// Property name to vendor-prefixed property names.
    pub properties: AliasMap,
    /// Function name to vendor-prefixed function names.
    pub functions: AliasMap,
    /// Property, then value, to vendor-specific values.
    pub values: BTreeMap<String, AliasMap>,
}

impl AliasTable {
    /// Parse alias definitions from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, AliasError> {
        let raw: AliasSource = toml::from_str(source)?;

        let mut values: BTreeMap<String, AliasMap> = BTreeMap::new();
        for (key, aliases) in raw.values {
            let Some((property, value)) = key.split_once(':') else {
                tracing::debug!("ignoring value alias without property: {key}");
                continue;
            };
            values
                .entry(property.trim().to_owned())
                .or_default()
                .insert(value.trim().to_owned(), aliases);
        }

        Ok(Self {
            at_rules: raw.at_rules,
            properties: raw.properties,
            functions: raw.functions,
            values,
        })
    }

    /// Load alias definitions from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AliasError> {
        if !path.exists() {
            return Err(AliasError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load alias definitions, falling back to an empty table on failure.
    ///
    /// The failure is logged; compiles then run without vendor expansion.
    #[must_use]
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(e) => {
                tracing::info!("vendor aliasing disabled: {e}");
                Self::default()
            }
        }
    }

    /// Whether no alias of any kind is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.at_rules.is_empty()
            && self.properties.is_empty()
            && self.functions.is_empty()
            && self.values.values().all(BTreeMap::is_empty)
    }

    /// Working copy restricted to `target`.
    ///
    /// `Disabled` yields an empty table and `All` an identical copy. A single
    /// vendor keeps only aliases with that vendor's prefix and drops names
    /// left without any alias. `self` is never modified.
    #[must_use]
    pub fn pruned(&self, target: &VendorTarget) -> Self {
        let prefix = match target {
            VendorTarget::Disabled => return Self::default(),
            VendorTarget::All => return self.clone(),
            VendorTarget::Only(_) => target.prefix().unwrap_or_default(),
        };

        let keep = |map: &AliasMap| -> AliasMap {
            map.iter()
                .filter_map(|(name, aliases)| {
                    let kept: Vec<String> = aliases
                        .iter()
                        .filter(|alias| alias.starts_with(&prefix))
                        .cloned()
                        .collect();
                    (!kept.is_empty()).then(|| (name.clone(), kept))
                })
                .collect()
        };

        Self {
            at_rules: keep(&self.at_rules),
            properties: keep(&self.properties),
            functions: keep(&self.functions),
            values: self
                .values
                .iter()
                .map(|(property, values)| (property.clone(), keep(values)))
                .filter(|(_, values)| !values.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"
[at-rules]
keyframes = ["-webkit-keyframes", "-moz-keyframes"]

[properties]
border-radius = ["-webkit-border-radius", "-moz-border-radius"]
user-select = ["-moz-user-select"]

[functions]
linear-gradient = ["-webkit-linear-gradient", "-moz-linear-gradient"]

[values]
"display:box" = ["-webkit-box", "-moz-box"]
"#;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_parse_alias_source() {
        let table = AliasTable::from_toml_str(SOURCE).unwrap();
        assert_eq!(
            table.at_rules["keyframes"],
            names(&["-webkit-keyframes", "-moz-keyframes"])
        );
        assert_eq!(table.properties.len(), 2);
        assert_eq!(
            table.values["display"]["box"],
            names(&["-webkit-box", "-moz-box"])
        );
        assert!(!table.is_empty());
    }

    #[test]
    fn test_parse_invalid_source() {
        let result = AliasTable::from_toml_str("[properties]\ncolor = 5");
        assert!(matches!(result, Err(AliasError::Unparsable(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("aliases.toml");
        assert!(matches!(AliasTable::load(&path), Err(AliasError::Missing(_))));
        assert!(AliasTable::load_or_empty(&path).is_empty());
    }

    #[test]
    fn test_prune_single_vendor() {
        let table = AliasTable::from_toml_str(SOURCE).unwrap();
        let pruned = table.pruned(&VendorTarget::Only("webkit".to_owned()));

        assert_eq!(pruned.at_rules["keyframes"], names(&["-webkit-keyframes"]));
        assert_eq!(
            pruned.properties["border-radius"],
            names(&["-webkit-border-radius"])
        );
        // Only a -moz- alias existed
        assert!(!pruned.properties.contains_key("user-select"));
        assert_eq!(pruned.values["display"]["box"], names(&["-webkit-box"]));

        // The shared table is untouched
        assert_eq!(table.properties["user-select"], names(&["-moz-user-select"]));
    }

    #[test]
    fn test_prune_none_and_all() {
        let table = AliasTable::from_toml_str(SOURCE).unwrap();
        assert!(table.pruned(&VendorTarget::Disabled).is_empty());
        assert_eq!(table.pruned(&VendorTarget::All), table);
    }
}
