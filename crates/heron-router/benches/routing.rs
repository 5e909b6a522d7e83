//! Routing benchmarks.
//!
//! Run with: `cargo bench -p heron-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use heron_router::Router;
use http::Method;

fn build_router(num_routes: usize) -> Router<usize> {
    let mut router = Router::new();
    let per_kind = num_routes / 3;

    for i in 0..per_kind {
        router
            .insert(Method::GET, &format!("/api/v1/resource{i}"), i)
            .expect("static route");
        router
            .insert(Method::GET, &format!("/api/v1/resource{i}/:id"), per_kind + i)
            .expect("param route");
        router
            .insert(
                Method::GET,
                &format!("/api/v1/org/:orgId/resource{i}/:id"),
                2 * per_kind + i,
            )
            .expect("nested route");
    }

    router
}

fn bench_static_match(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("static_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource20")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("param_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource25/12345")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_match_scaling");
    for size in [30, 300, 3000] {
        let router = build_router(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &router, |b, router| {
            b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/org/acme/resource7/1")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_static_match, bench_param_match, bench_scaling);
criterion_main!(benches);
