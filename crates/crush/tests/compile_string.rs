//! End-to-end tests for in-memory compiles through the public API.

use crush::{CompileOptions, Crush, Declaration, VendorTarget};
use pretty_assertions::assert_eq;

fn compile(crush: &Crush, css: &str, options: &CompileOptions) -> String {
    crush.compile_string(css, options).unwrap().css
}

#[test]
fn test_variable_precedence() {
    let mut crush = Crush::default();
    crush.global_vars([("x", "1")]);
    let document = "@define { x: 2; } .a { width: $(x) }";

    let mut runtime = CompileOptions::default();
    runtime.vars.insert("x".to_owned(), "3".to_owned());
    assert_eq!(compile(&crush, document, &runtime), ".a{width:3}");
    assert_eq!(compile(&crush, document, &CompileOptions::default()), ".a{width:2}");
    assert_eq!(
        compile(&crush, ".a { width: $(x) }", &CompileOptions::default()),
        ".a{width:1}"
    );
}

#[test]
fn test_bundled_aliases() {
    let crush = Crush::default();
    assert_eq!(
        compile(&crush, ".a { border-radius: 4px }", &CompileOptions::default()),
        ".a{-webkit-border-radius:4px;-moz-border-radius:4px;border-radius:4px}"
    );

    let webkit = CompileOptions {
        vendor_target: VendorTarget::Only("webkit".to_owned()),
        ..CompileOptions::default()
    };
    assert_eq!(
        compile(&crush, ".a { border-radius: 4px }", &webkit),
        ".a{-webkit-border-radius:4px;border-radius:4px}"
    );

    let none = CompileOptions {
        vendor_target: VendorTarget::Disabled,
        ..CompileOptions::default()
    };
    assert_eq!(compile(&crush, ".a { border-radius: 4px }", &none), ".a{border-radius:4px}");
}

#[test]
fn test_hooks_run_in_registration_order() {
    let mut crush = Crush::default();
    crush.hooks_mut().on_rule_prealias(|rule| {
        rule.declarations
            .push(Declaration::new("order", "a", rule.declarations.len()));
        Ok(())
    });
    crush.hooks_mut().on_rule_prealias(|rule| {
        let seen = rule.declarations.iter().any(|d| d.property == "order");
        rule.declarations.push(Declaration::new(
            "seen",
            if seen { "yes" } else { "no" },
            rule.declarations.len(),
        ));
        Ok(())
    });

    let options = CompileOptions {
        vendor_target: VendorTarget::Disabled,
        ..CompileOptions::default()
    };
    assert_eq!(compile(&crush, ".a{color:red}", &options), ".a{color:red;order:a;seen:yes}");
}

#[test]
fn test_minification() {
    let crush = Crush::default();
    let css = ".a { margin: 0 0; color: #aabbcc; opacity: 0.500; }";
    assert_eq!(
        compile(&crush, css, &CompileOptions::default()),
        ".a{margin:0;color:#abc;opacity:.5}"
    );
}

#[test]
fn test_shared_between_threads() {
    let mut crush = Crush::default();
    crush.global_vars([("gap", "4px")]);
    let crush = &crush;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                scope.spawn(move || {
                    let mut options = CompileOptions::default();
                    options.vars.insert("n".to_owned(), i.to_string());
                    compile(crush, ".a{z-index:$(n);margin:$(gap)}", &options)
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!(".a{{z-index:{i};margin:4px}}"));
        }
    });
}
