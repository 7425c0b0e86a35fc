use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ftpgate::{Acl, Permissions, Rule, Scope, Subject};

const RULES: &[&str] = &[
    "download / *",
    "upload /incoming =uploaders !*",
    "download /private -admin =staff !*",
    "download /private/archive !=interns =staff !*",
    "list /private -admin !*",
    "delete /incoming -admin !*",
    "makedir /incoming =uploaders !*",
];

fn permissions() -> Permissions {
    Permissions::new(RULES.iter().map(|l| Rule::parse(l).unwrap())).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("Acl::parse(5 tokens)", |b| {
        b.iter(|| black_box(Acl::parse(black_box("-alice =staff !=interns !-bob !*")).unwrap()));
    });

    group.bench_function("Rule::parse", |b| {
        b.iter(|| {
            black_box(Rule::parse(black_box("download /private/archive !=interns =staff !*")).unwrap())
        });
    });

    group.bench_function("Permissions::new(7 rules)", |b| {
        b.iter(|| black_box(permissions()));
    });

    group.finish();
}

fn bench_allowed(c: &mut Criterion) {
    let mut group = c.benchmark_group("allowed");
    let permissions = permissions();
    let staff = Subject::new("carol").with_groups(["staff"]);
    let intern = Subject::new("dave").with_groups(["staff", "interns"]);

    group.bench_function("deep path, specific rule", |b| {
        b.iter(|| {
            black_box(permissions.allowed(
                Scope::Download,
                black_box("/private/archive/2024/q1/report.pdf"),
                &staff,
            ))
        });
    });

    group.bench_function("blocked group", |b| {
        b.iter(|| {
            black_box(permissions.allowed(Scope::Download, black_box("/private/archive/x"), &intern))
        });
    });

    group.bench_function("root fallback", |b| {
        b.iter(|| black_box(permissions.allowed(Scope::Download, black_box("/pub/a/b/c"), &intern)));
    });

    group.bench_function("scope without rules", |b| {
        b.iter(|| black_box(permissions.allowed(Scope::HideUser, black_box("/pub"), &staff)));
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_allowed);
criterion_main!(benches);
