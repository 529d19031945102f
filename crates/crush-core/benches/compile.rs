//! Benchmarks for stylesheet compilation.

#![allow(clippy::format_push_string)] // Benchmark setup code, performance not critical

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use crush_core::{AliasTable, CompileOptions, Environment, plugins::PropertySorter};

const ALIASES: &str = r#"
[at-rules]
keyframes = ["-webkit-keyframes", "-moz-keyframes"]

[properties]
border-radius = ["-webkit-border-radius", "-moz-border-radius"]
transition = ["-webkit-transition", "-moz-transition"]

[functions]
linear-gradient = ["-webkit-linear-gradient", "-moz-linear-gradient"]
"#;

/// Generate a stylesheet with the given number of rules.
fn generate_stylesheet(rules: usize) -> String {
    let mut css = String::with_capacity(rules * 160);
    css.push_str("/*! banner */\n@define { brand: #aabbcc; gap: 4px; }\n");
    for i in 0..rules {
        css.push_str(&format!(
            "/* rule {i} */\n.item-{i}, .item-{i}:hover {{\n  color: var(brand);\n  \
             margin: 0 0;\n  padding: math($(gap) * 2);\n  border-radius: 0.50em;\n  \
             background: linear-gradient(#fff, #000) url(\"img/{i}.png\");\n}}\n"
        ));
        if i % 10 == 0 {
            css.push_str(&format!(
                "@keyframes spin-{i} {{ from {{ opacity: 0 }} to {{ opacity: 1 }} }}\n"
            ));
        }
    }
    css
}

fn environment() -> Environment {
    let aliases = AliasTable::from_toml_str(ALIASES).unwrap();
    Environment::new().with_aliases(aliases)
}

fn bench_compile_minified(c: &mut Criterion) {
    let env = environment();
    let css = generate_stylesheet(20);
    let options = CompileOptions::default();

    c.bench_function("compile_minified_20_rules", |b| {
        b.iter(|| env.compile(&css, &options));
    });
}

fn bench_compile_with_sorter(c: &mut Criterion) {
    let mut env = environment();
    PropertySorter::new().register(env.hooks_mut());
    let css = generate_stylesheet(20);
    let options = CompileOptions {
        debug: true,
        ..CompileOptions::default()
    };

    c.bench_function("compile_pretty_sorted_20_rules", |b| {
        b.iter(|| env.compile(&css, &options));
    });
}

fn bench_compile_varying_sizes(c: &mut Criterion) {
    let env = environment();
    let options = CompileOptions::default();
    let mut group = c.benchmark_group("compile_by_size");

    for rules in [10, 100, 500] {
        let css = generate_stylesheet(rules);
        group.throughput(Throughput::Bytes(css.len() as u64));
        group.bench_with_input(BenchmarkId::new("rules", rules), &css, |b, css| {
            b.iter(|| env.compile(css, &options));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compile_minified,
    bench_compile_with_sorter,
    bench_compile_varying_sizes
);
criterion_main!(benches);
