use criterion::{Criterion, criterion_group, criterion_main};
use lazylint_engine::{FixInfo, RuleConfig, apply_fixes, lint, parse_tokens};
mod common;

fn bench_parse_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    group.sample_size(10);

    let content = common::generate_list_content(100);
    group.bench_function("parse_tokens", |b| {
        b.iter(|| std::hint::black_box(parse_tokens(std::hint::black_box(&content))));
    });

    group.finish();
}

fn bench_lint(c: &mut Criterion) {
    let mut group = c.benchmark_group("lint");
    group.sample_size(10);

    let config = RuleConfig { admonitions: true };
    for (name, content) in [
        ("mixed", common::generate_list_content(100)),
        ("nested", common::generate_nested_lists(50, 6)),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| std::hint::black_box(lint(std::hint::black_box(&content), &config)));
        });
    }

    group.finish();
}

fn bench_apply_fixes(c: &mut Criterion) {
    let content = common::generate_list_content(100);
    let fixes: Vec<FixInfo> = lint(&content, &RuleConfig::default())
        .into_iter()
        .map(|v| v.fix_info)
        .collect();

    c.bench_function("apply_fixes", |b| {
        b.iter(|| std::hint::black_box(apply_fixes(std::hint::black_box(&content), &fixes)));
    });
}

criterion_group!(benches, bench_parse_tokens, bench_lint, bench_apply_fixes);
criterion_main!(benches);
