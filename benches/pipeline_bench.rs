use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wireframer::normalize::extract;
use wireframer::reconcile::{GenericValueCatalogue, Reconciler};
use wireframer::static_page::parse_html;
use wireframer::{prompt, style_vars};

const PAGE: &str = include_str!("../tests/fixtures/landing.html");
const CANDIDATE: &str = include_str!("../tests/fixtures/generic_candidate.html");

fn bench_parse_and_extract(c: &mut Criterion) {
    c.bench_function("parse_static_page", |b| {
        b.iter(|| parse_html(black_box(PAGE), "https://acme.test/", 5000))
    });

    let dom = parse_html(PAGE, "https://acme.test/", 5000);
    c.bench_function("extract_snapshot", |b| b.iter(|| extract(black_box(&dom))));
}

fn bench_prompt_and_tokens(c: &mut Criterion) {
    let snapshot = extract(&parse_html(PAGE, "https://acme.test/", 5000));

    c.bench_function("compile_prompt", |b| b.iter(|| prompt::compile(black_box(&snapshot))));
    c.bench_function("synthesize_tokens", |b| {
        b.iter(|| style_vars::synthesize(black_box(&snapshot)).to_css())
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let snapshot = extract(&parse_html(PAGE, "https://acme.test/", 5000));
    let vars = style_vars::synthesize(&snapshot);
    let reconciler = Reconciler::new(GenericValueCatalogue::default()).expect("failed to build reconciler");

    c.bench_function("reconcile_candidate", |b| {
        b.iter(|| reconciler.reconcile(black_box(CANDIDATE), &vars))
    });
}

criterion_group!(benches, bench_parse_and_extract, bench_prompt_and_tokens, bench_reconcile);
criterion_main!(benches);
