//! Compile entry point.
//!
//! [`Environment`] holds the state shared by every compile: the alias table,
//! registered hooks, the custom-function evaluator and global variables.
//! Each call to [`Environment::compile`] builds its own [`Context`], so
//! compiles never observe each other's tokens or variables.

use crate::aliases::AliasTable;
use crate::error::CompileError;
use crate::functions::{BuiltinFunctions, FunctionEvaluator};
use crate::hooks::HookRegistry;
use crate::options::CompileOptions;
use crate::tokens::TokenStore;
use crate::variables::{self, Variables};
use crate::{at_rule, extract, render};

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    /// Rendered stylesheet.
    pub css: String,
    /// Non-fatal problems met while compiling, in order.
    pub warnings: Vec<String>,
}

/// Shared, read-mostly compile state.
pub struct Environment {
    aliases: AliasTable,
    hooks: HookRegistry,
    functions: Box<dyn FunctionEvaluator>,
    global_vars: Variables,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            aliases: AliasTable::default(),
            hooks: HookRegistry::new(),
            functions: Box::new(BuiltinFunctions),
            global_vars: Variables::new(),
        }
    }
}

impl Environment {
    /// Environment with no aliases, no hooks and the built-in functions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    #[must_use]
    pub fn with_functions(mut self, functions: impl FunctionEvaluator + 'static) -> Self {
        self.functions = Box::new(functions);
        self
    }

    #[must_use]
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn set_aliases(&mut self, aliases: AliasTable) {
        self.aliases = aliases;
    }

    #[must_use]
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Registry to add plugin hooks to.
    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    #[must_use]
    pub fn global_vars(&self) -> &Variables {
        &self.global_vars
    }

    /// Global variables, lowest in precedence.
    pub fn global_vars_mut(&mut self) -> &mut Variables {
        &mut self.global_vars
    }

    /// Compile a stylesheet.
    ///
    /// Only a failing hook aborts the compile. Structural problems such as
    /// unbalanced braces leave the affected text as-is and are reported in
    /// [`Compiled::warnings`].
    pub fn compile(&self, css: &str, options: &CompileOptions) -> Result<Compiled, CompileError> {
        let aliases = self.aliases.pruned(&options.vendor_target);
        let mut ctx = Context::new(aliases, &self.hooks, self.functions.as_ref());

        let stream = extract::extract_comments(css, &mut ctx.tokens);
        let stream = extract::extract_strings(&stream, &mut ctx.tokens);
        let (stream, document_vars) = extract::extract_variables(&stream, &mut ctx.tokens);

        let merged = variables::merge(&self.global_vars, document_vars, &options.vars);
        ctx.variables = variables::resolve(merged, ctx.functions, &mut ctx.tokens);
        tracing::debug!(count = ctx.variables.len(), "variables resolved");
        let stream = variables::place(&stream, &ctx.variables, &mut ctx.tokens);

        let stream = extract::normalize(&stream);
        let stream = extract::break_lines(&stream);
        let stream = extract::extract_rules(&stream, &mut ctx)?;
        let stream = at_rule::alias_at_rules(stream, &mut ctx);

        let css = render::display(&stream, &ctx.tokens, options.minify());
        tracing::debug!(
            rules = ctx.tokens.rule_count(),
            warnings = ctx.warnings.len(),
            "compiled stylesheet"
        );
        Ok(Compiled {
            css,
            warnings: ctx.warnings,
        })
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("aliases", &self.aliases)
            .field("hooks", &self.hooks)
            .field("global_vars", &self.global_vars)
            .finish_non_exhaustive()
    }
}

/// Mutable state of a single compile.
pub(crate) struct Context<'a> {
    /// Alias table pruned to the compile's vendor target.
    pub(crate) aliases: AliasTable,
    pub(crate) hooks: &'a HookRegistry,
    pub(crate) functions: &'a dyn FunctionEvaluator,
    pub(crate) tokens: TokenStore,
    pub(crate) variables: Variables,
    pub(crate) warnings: Vec<String>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        aliases: AliasTable,
        hooks: &'a HookRegistry,
        functions: &'a dyn FunctionEvaluator,
    ) -> Self {
        Self {
            aliases,
            hooks,
            functions,
            tokens: TokenStore::new(),
            variables: Variables::new(),
            warnings: Vec::new(),
        }
    }

    /// Log a non-fatal problem and keep it for the caller.
    pub(crate) fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::VendorTarget;
    use pretty_assertions::assert_eq;

    const ALIASES: &str = r#"
[at-rules]
keyframes = ["-webkit-keyframes"]

[properties]
color = ["-webkit-color"]
border-radius = ["-webkit-border-radius", "-moz-border-radius"]

[functions]
linear-gradient = ["-webkit-linear-gradient"]

[values]
"display:box" = ["-webkit-box", "-moz-box"]
"#;

    fn env() -> Environment {
        Environment::new().with_aliases(AliasTable::from_toml_str(ALIASES).unwrap())
    }

    fn minified(env: &Environment, css: &str, options: &CompileOptions) -> String {
        env.compile(css, options).unwrap().css
    }

    fn target(value: &str) -> CompileOptions {
        CompileOptions {
            vendor_target: value.parse::<VendorTarget>().unwrap(),
            ..CompileOptions::default()
        }
    }

    #[test]
    fn test_compile_minified() {
        let env = Environment::new();
        let css = "/* header */\n.a ,  .b {\n  color : red ;\n  margin: 0 0;\n}\n\n.c { opacity: 0.500 }";
        assert_eq!(
            minified(&env, css, &CompileOptions::default()),
            ".a,.b{color:red;margin:0}.c{opacity:.5}"
        );
    }

    #[test]
    fn test_compile_pretty() {
        let env = Environment::new();
        let options = CompileOptions {
            debug: true,
            ..CompileOptions::default()
        };
        let css = "/* header */\n.a{color:red}";
        assert_eq!(
            env.compile(css, &options).unwrap().css,
            "/* header */\n\n.a {\n\tcolor: red;\n}"
        );
    }

    #[test]
    fn test_flagged_comment_survives_minification() {
        let env = Environment::new();
        assert_eq!(
            minified(&env, "/*! keep */ /* drop */ .a{b:c}", &CompileOptions::default()),
            "/*! keep */.a{b:c}"
        );
    }

    #[test]
    fn test_strings_are_untouched() {
        let env = Environment::new();
        assert_eq!(
            minified(
                &env,
                ".a:after{content:\"{ 0.50px ; }\"}",
                &CompileOptions::default()
            ),
            ".a:after{content:\"{ 0.50px ; }\"}"
        );
    }

    #[test]
    fn test_empty_rules_are_dropped() {
        let env = Environment::new();
        assert_eq!(minified(&env, ".a{} .b{ ; } .c{d:e}", &CompileOptions::default()), ".c{d:e}");
    }

    #[test]
    fn test_variable_precedence() {
        let mut env = Environment::new();
        env.global_vars_mut().insert("x".to_owned(), "1".to_owned());
        let document = "@define { x: 2 } .a{width:var(x)}";

        let mut options = CompileOptions::default();
        options.vars.insert("x".to_owned(), "3".to_owned());
        assert_eq!(minified(&env, document, &options), ".a{width:3}");
        assert_eq!(minified(&env, document, &CompileOptions::default()), ".a{width:2}");
        assert_eq!(
            minified(&env, ".a{width:var(x)}", &CompileOptions::default()),
            ".a{width:1}"
        );
    }

    #[test]
    fn test_property_alias_order_and_vendor_targets() {
        let env = env();
        let css = ".a{color:red}";
        assert_eq!(minified(&env, css, &target("all")), ".a{-webkit-color:red;color:red}");
        assert_eq!(minified(&env, css, &target("none")), ".a{color:red}");
        assert_eq!(minified(&env, css, &target("webkit")), ".a{-webkit-color:red;color:red}");
        assert_eq!(minified(&env, css, &target("moz")), ".a{color:red}");
    }

    #[test]
    fn test_function_and_value_aliases() {
        let env = env();
        assert_eq!(
            minified(&env, ".a{background:linear-gradient(red,blue)}", &target("all")),
            ".a{background:-webkit-linear-gradient(red,blue);background:linear-gradient(red,blue)}"
        );
        assert_eq!(
            minified(&env, ".a{display:box}", &target("moz")),
            ".a{display:-moz-box;display:box}"
        );
    }

    #[test]
    fn test_at_rule_aliasing() {
        let env = env();
        let css = "@keyframes spin { to { border-radius: 0 } }";
        assert_eq!(
            minified(&env, css, &target("all")),
            "@-webkit-keyframes spin{to{-webkit-border-radius:0;border-radius:0}}\
             @keyframes spin{to{-webkit-border-radius:0;-moz-border-radius:0;border-radius:0}}"
        );
    }

    #[test]
    fn test_custom_functions_in_declarations() {
        let env = Environment::new();
        assert_eq!(
            minified(
                &env,
                "@define{base:8px} .a{padding:math(var(base) * 2) math(var(base) / 2)}",
                &CompileOptions::default()
            ),
            ".a{padding:16px 4px}"
        );
    }

    #[test]
    fn test_math_with_non_ascii_whitespace() {
        let env = Environment::new();
        assert_eq!(
            minified(
                &env,
                "@define { w: math(2\u{a0}* 4px) } .a{width:var(w)}",
                &CompileOptions::default()
            ),
            ".a{width:8px}"
        );
    }

    #[test]
    fn test_unquoted_urls_survive_minification() {
        let env = Environment::new();
        let options = CompileOptions::default();
        assert_eq!(
            minified(&env, ".a{background:url(1.50.png)}", &options),
            ".a{background:url(1.50.png)}"
        );
        assert_eq!(
            minified(&env, ".a{background:url(0px.png)}", &options),
            ".a{background:url(0px.png)}"
        );
    }

    #[test]
    fn test_id_selector_inside_media_block() {
        let env = Environment::new();
        assert_eq!(
            minified(
                &env,
                "@media print{a:hover #aabbcc{color:#aabbcc}}",
                &CompileOptions::default()
            ),
            "@media print{a:hover #aabbcc{color:#abc}}"
        );
    }

    #[test]
    fn test_media_blocks_and_font_face() {
        let env = Environment::new();
        let css = "@media screen { .a { color: red } } @font-face { font-family: x }";
        assert_eq!(
            minified(&env, css, &CompileOptions::default()),
            "@media screen{.a{color:red}}@font-face{font-family:x}"
        );
    }

    #[test]
    fn test_hook_ordering_and_failure() {
        let mut env = Environment::new();
        env.hooks_mut().on_rule_prealias(|rule| {
            rule.declarations.retain(|d| d.property != "zoom");
            Ok(())
        });
        env.hooks_mut().on_rule_postprocess(|rule| {
            rule.selectors.push(".extra".to_owned());
            Ok(())
        });
        assert_eq!(
            minified(&env, ".a{zoom:1;color:red}", &CompileOptions::default()),
            ".a,.extra{color:red}"
        );

        env.hooks_mut().on_rule_preprocess(|raw| {
            if raw.selector.contains(".bad") {
                return Err("bad selector".into());
            }
            Ok(())
        });
        let err = env.compile(".bad{a:b}", &CompileOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "rule_preprocess hook failed: bad selector");
    }

    #[test]
    fn test_unbalanced_at_rule_is_reported() {
        let env = env();
        let compiled = env
            .compile("@keyframes a { to { color: red }", &target("all"))
            .unwrap();
        assert_eq!(compiled.warnings.len(), 1);
        assert!(compiled.css.contains("@keyframes a"));
    }
}
