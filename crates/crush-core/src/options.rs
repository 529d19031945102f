//! Compile options.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidVendorTarget;

/// Options for a single compile.
///
/// The full option set is persisted with each cache record, so two compiles
/// only share an output when their options compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Pretty-print and keep comments instead of minifying.
    pub debug: bool,
    /// Append the checksum to the public output reference.
    pub versioning: bool,
    /// Prepend the configured boilerplate comment.
    pub boilerplate: bool,
    /// Runtime variables; override global and in-document variables.
    pub vars: BTreeMap<String, String>,
    /// Reuse a previously compiled output when it is still valid.
    pub cache: bool,
    /// Output file name to use instead of the host file name.
    pub output_file: Option<String>,
    /// Vendor prefixes to generate.
    pub vendor_target: VendorTarget,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            debug: false,
            versioning: true,
            boilerplate: true,
            vars: BTreeMap::new(),
            cache: true,
            output_file: None,
            vendor_target: VendorTarget::All,
        }
    }
}

impl CompileOptions {
    /// Whether the output is minified.
    #[must_use]
    pub fn minify(&self) -> bool {
        !self.debug
    }
}

/// Which vendor aliases are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VendorTarget {
    /// Every alias in the table.
    #[default]
    All,
    /// No aliasing at all.
    Disabled,
    /// Only aliases carrying this vendor's prefix (e.g. `webkit`).
    Only(String),
}

impl VendorTarget {
    /// The `-vendor-` prefix aliases must start with, if restricted.
    #[must_use]
    pub fn prefix(&self) -> Option<String> {
        match self {
            Self::Only(vendor) => Some(format!("-{vendor}-")),
            Self::All | Self::Disabled => None,
        }
    }
}

impl FromStr for VendorTarget {
    type Err = InvalidVendorTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "none" => Ok(Self::Disabled),
            other => {
                let vendor = other.trim_matches('-');
                if vendor.is_empty()
                    || !vendor
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                {
                    return Err(InvalidVendorTarget(s.to_owned()));
                }
                Ok(Self::Only(vendor.to_owned()))
            }
        }
    }
}

impl TryFrom<String> for VendorTarget {
    type Error = InvalidVendorTarget;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VendorTarget> for String {
    fn from(value: VendorTarget) -> Self {
        value.to_string()
    }
}

impl fmt::Display for VendorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Disabled => f.write_str("none"),
            Self::Only(vendor) => f.write_str(vendor),
        }
    }
}
