use branchver::{BranchMatcher, BranchRule, Template};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn ok_inputs() -> Vec<&'static str> {
    vec![
        "{major}.{minor}.{release}",
        "{major}.{minor}.{release}dev{commit-counter}",
        "{major}.{minor}.{release:03d}rc{rc:02d}",
        r"{branch}-\{literal}-{commit-hash-short}",
        "1.0.0",
    ]
}

fn parse_ok(inputs: &[&str]) {
    for input in inputs {
        let res = Template::parse(input);
        assert!(res.is_ok());
    }
}

fn err_inputs() -> Vec<&'static str> {
    vec![
        r"{branch}-\{literal\}",
        "{major}.{minor",
        "{release:3d}",
        "{}",
    ]
}

fn parse_err(inputs: &[&str]) {
    for input in inputs {
        let res = Template::parse(input);
        assert!(res.is_err());
    }
}

fn render(template: &Template) {
    let res = template.render(|name| Ok(name.len().to_string()));
    assert!(res.is_ok());
}

fn match_branches(matcher: &BranchMatcher, branches: &[&str]) {
    for branch in branches {
        assert!(matcher.match_branch(branch).is_ok());
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("parse_ok", |b| b.iter(|| parse_ok(black_box(&ok_inputs()))));
    c.bench_function("parse_err", |b| b.iter(|| parse_err(black_box(&err_inputs()))));

    let template = Template::parse("{major}.{minor}.{release:03d}rc{rc:02d}").unwrap();
    c.bench_function("render", |b| b.iter(|| render(black_box(&template))));

    let rules = [
        BranchRule::new("master|trunk", "{major}.{minor}.{release}"),
        BranchRule::new(r"release-(?P<rc>\d+)", "{major}.{minor}rc{rc}"),
        BranchRule::new(".*", "{major}.{minor}.dev{commit-counter}"),
    ];
    let matcher = BranchMatcher::new(&rules).unwrap();
    let branches = ["trunk", "release-12", "feature/parser"];
    c.bench_function("match_branch", |b| {
        b.iter(|| match_branches(black_box(&matcher), black_box(&branches)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
