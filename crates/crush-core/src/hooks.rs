//! Extension points for plugins.
//!
//! Each rule passes through four fixed points while it is built:
//!
//! | Point               | Payload           | When                                   |
//! |---------------------|-------------------|----------------------------------------|
//! | `rule_preprocess`   | [`RawRule`]       | before the block is parsed             |
//! | `rule_prealias`     | [`Rule`]          | after parsing, before vendor aliasing  |
//! | `rule_postalias`    | [`Rule`]          | after vendor aliasing                  |
//! | `rule_postprocess`  | [`Rule`]          | after selector expansion               |
//!
//! Handlers run synchronously in registration order, each seeing the state
//! left by the previous one. A handler error aborts the compile.
//!
//! # Example
//!
//! ```
//! use crush_core::HookRegistry;
//!
//! let mut hooks = HookRegistry::new();
//! hooks.on_rule_prealias(|rule| {
//!     rule.declarations.retain(|d| d.property != "zoom");
//!     Ok(())
//! });
//! ```

use std::fmt;

use crate::error::CompileError;
use crate::rule::{RawRule, Rule};

/// Error type hooks may return.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result type of a hook handler.
pub type HookResult = Result<(), HookError>;

type RawRuleHandler = Box<dyn Fn(&mut RawRule) -> HookResult + Send + Sync>;
type RuleHandler = Box<dyn Fn(&mut Rule) -> HookResult + Send + Sync>;

/// Named extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    RulePreprocess,
    RulePrealias,
    RulePostalias,
    RulePostprocess,
}

impl HookPoint {
    /// Canonical point name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RulePreprocess => "rule_preprocess",
            Self::RulePrealias => "rule_prealias",
            Self::RulePostalias => "rule_postalias",
            Self::RulePostprocess => "rule_postprocess",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered handler lists, one per extension point.
///
/// Handlers can only be added; the registry is filled once before compiling
/// and then shared read-only.
#[derive(Default)]
pub struct HookRegistry {
    preprocess: Vec<RawRuleHandler>,
    prealias: Vec<RuleHandler>,
    postalias: Vec<RuleHandler>,
    postprocess: Vec<RuleHandler>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for the raw selector/declaration text.
    pub fn on_rule_preprocess<F>(&mut self, handler: F)
    where
        F: Fn(&mut RawRule) -> HookResult + Send + Sync + 'static,
    {
        self.preprocess.push(Box::new(handler));
    }

    /// Register a handler that runs before vendor aliasing.
    pub fn on_rule_prealias<F>(&mut self, handler: F)
    where
        F: Fn(&mut Rule) -> HookResult + Send + Sync + 'static,
    {
        self.prealias.push(Box::new(handler));
    }

    /// Register a handler that runs after vendor aliasing.
    pub fn on_rule_postalias<F>(&mut self, handler: F)
    where
        F: Fn(&mut Rule) -> HookResult + Send + Sync + 'static,
    {
        self.postalias.push(Box::new(handler));
    }

    /// Register a handler that runs once the rule is complete.
    pub fn on_rule_postprocess<F>(&mut self, handler: F)
    where
        F: Fn(&mut Rule) -> HookResult + Send + Sync + 'static,
    {
        self.postprocess.push(Box::new(handler));
    }

    /// Number of handlers registered on `point`.
    #[must_use]
    pub fn len(&self, point: HookPoint) -> usize {
        match point {
            HookPoint::RulePreprocess => self.preprocess.len(),
            HookPoint::RulePrealias => self.prealias.len(),
            HookPoint::RulePostalias => self.postalias.len(),
            HookPoint::RulePostprocess => self.postprocess.len(),
        }
    }

    /// Whether no handler is registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.preprocess.is_empty()
            && self.prealias.is_empty()
            && self.postalias.is_empty()
            && self.postprocess.is_empty()
    }

    pub(crate) fn run_preprocess(&self, raw: &mut RawRule) -> Result<(), CompileError> {
        for handler in &self.preprocess {
            handler(raw).map_err(|source| CompileError::Hook {
                point: HookPoint::RulePreprocess,
                source,
            })?;
        }
        Ok(())
    }

    /// Run the rule handlers of `point`. `RulePreprocess` has none.
    pub(crate) fn run(&self, point: HookPoint, rule: &mut Rule) -> Result<(), CompileError> {
        let handlers = match point {
            HookPoint::RulePreprocess => return Ok(()),
            HookPoint::RulePrealias => &self.prealias,
            HookPoint::RulePostalias => &self.postalias,
            HookPoint::RulePostprocess => &self.postprocess,
        };
        for handler in handlers {
            handler(rule).map_err(|source| CompileError::Hook { point, source })?;
        }
        Ok(())
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("rule_preprocess", &self.preprocess.len())
            .field("rule_prealias", &self.prealias.len())
            .field("rule_postalias", &self.postalias.len())
            .field("rule_postprocess", &self.postprocess.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Declaration;

    fn rule_with(property: &str) -> Rule {
        Rule {
            selector_raw: ".a".to_owned(),
            declarations: vec![Declaration::new(property, "1", 0)],
            ..Rule::default()
        }
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut hooks = HookRegistry::new();
        hooks.on_rule_prealias(|rule| {
            rule.declarations.push(Declaration::new("added-by-a", "1", 1));
            Ok(())
        });
        hooks.on_rule_prealias(|rule| {
            // B observes A's mutation
            let seen = rule.declarations.len().to_string();
            rule.declarations.push(Declaration::new("added-by-b", seen, 2));
            Ok(())
        });

        let mut rule = rule_with("color");
        hooks.run(HookPoint::RulePrealias, &mut rule).unwrap();

        let props: Vec<&str> = rule.declarations.iter().map(|d| d.property.as_str()).collect();
        assert_eq!(props, vec!["color", "added-by-a", "added-by-b"]);
        assert_eq!(rule.declarations[2].value, "2");
    }

    #[test]
    fn test_points_are_independent() {
        let mut hooks = HookRegistry::new();
        hooks.on_rule_postalias(|rule| {
            rule.declarations.clear();
            Ok(())
        });

        let mut rule = rule_with("color");
        hooks.run(HookPoint::RulePrealias, &mut rule).unwrap();
        hooks.run(HookPoint::RulePostprocess, &mut rule).unwrap();
        assert_eq!(rule.declarations.len(), 1);

        hooks.run(HookPoint::RulePostalias, &mut rule).unwrap();
        assert!(rule.declarations.is_empty());
        assert_eq!(hooks.len(HookPoint::RulePostalias), 1);
        assert_eq!(hooks.len(HookPoint::RulePrealias), 0);
    }

    #[test]
    fn test_handler_error_stops_the_chain() {
        let mut hooks = HookRegistry::new();
        hooks.on_rule_preprocess(|_| Err("boom".into()));
        hooks.on_rule_preprocess(|raw| {
            raw.selector.push_str("-unreachable");
            Ok(())
        });

        let mut raw = RawRule {
            selector: ".a".to_owned(),
            declarations: "color:red".to_owned(),
        };
        let err = hooks.run_preprocess(&mut raw).unwrap_err();
        assert_eq!(err.to_string(), "rule_preprocess hook failed: boom");
        assert_eq!(raw.selector, ".a");
    }
}
