//! Performance benchmarks for helm-cel
//!
//! These benchmarks measure the performance of key operations:
//! - Macro expansion of nested and parameterized references
//! - Compilation of rule expressions
//! - Validation of a rule set against a values document
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench expansion
//! cargo bench validation
//! ```
//!
//! ## Expected Performance Characteristics
//!
//! - Expansion cost grows with nesting depth, one pass per level
//! - Compilation dominates per-rule cost for simple expressions
//! - Validation scales linearly with the number of rules

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use helm_cel::config::values::parse_document;
use helm_cel::engine::Validator;
use helm_cel::expr::Environment;
use helm_cel::rules::{MacroExpander, Rule, RuleSet};
use helm_cel::types::Value;
use std::collections::BTreeMap;

fn document(services: usize) -> Value {
    let mut yaml = String::from("services:\n");
    for i in 0..services {
        yaml.push_str(&format!(
            "  svc{i}:\n    port: {}\n    type: ClusterIP\n    replicas: {}\n",
            8000 + i,
            i % 5 + 1
        ));
    }
    parse_document(&yaml).unwrap_or_default()
}

fn rule_set(services: usize) -> RuleSet {
    let mut rules = RuleSet::new();
    rules.define("inRange", "$0 >= $1 && $0 <= $2");
    rules.define("validPort", "${inRange($0, 1, 65535)}");
    for i in 0..services {
        rules.push(Rule::new(
            format!("${{validPort(values.services.svc{i}.port)}}"),
            format!("svc{i} port must be valid"),
        ));
        rules.push(Rule::new(
            format!("values.services.svc{i}.type in ['ClusterIP', 'NodePort']"),
            format!("svc{i} type must be known"),
        ));
    }
    rules
}

fn bench_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion");

    for depth in [1usize, 4, 16] {
        let mut macros = BTreeMap::new();
        macros.insert("m0".to_string(), "values.a > $0".to_string());
        for level in 1..depth {
            macros.insert(format!("m{level}"), format!("${{m{}($0)}}", level - 1));
        }
        let expression = format!("${{m{}(1)}}", depth - 1);

        group.bench_with_input(BenchmarkId::new("nested", depth), &expression, |b, expr| {
            let expander = MacroExpander::new(&macros);
            b.iter(|| expander.expand(black_box(expr)))
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let env = Environment::new().with_variable("values");
    let expressions = [
        "values.service.port >= 1 && values.service.port <= 65535",
        "values.ingress.hosts.all(h, h.host.endsWith('.example.com'))",
        "has(values.image) ? values.image.tag != 'latest' : true",
    ];

    c.bench_function("compile", |b| {
        b.iter(|| {
            for expression in &expressions {
                let _ = env.compile(black_box(expression));
            }
        })
    });
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    for services in [10usize, 100, 500] {
        let document = document(services);
        let rules = rule_set(services);
        group.throughput(Throughput::Elements(rules.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("rules", rules.len()),
            &(document, rules),
            |b, (document, rules)| {
                let validator = Validator::new();
                b.iter(|| validator.validate(black_box(document), black_box(rules)))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_expansion, bench_compile, bench_validation);
criterion_main!(benches);
