//! Router and encoder benchmarks
//!
//! - static, parameterized and catch-all lookups against a GitHub-sized API
//! - direct field encoding against serde_json on an equivalent map
//! - full dispatch through a built app

use std::hint::black_box;
use std::time::Duration;

use bolt::encoder::encode;
use bolt::field::Field;
use bolt::{App, Context, Router};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hyper::{Body, Method, Request, StatusCode};

const ROUTES: &[&str] = &[
    "/authorizations",
    "/authorizations/:id",
    "/applications/:client_id/tokens/:access_token",
    "/events",
    "/repos/:owner/:repo/events",
    "/networks/:owner/:repo/events",
    "/orgs/:org/events",
    "/users/:user/received_events",
    "/users/:user/received_events/public",
    "/users/:user/events",
    "/users/:user/events/public",
    "/users/:user/events/orgs/:org",
    "/feeds",
    "/notifications",
    "/repos/:owner/:repo/notifications",
    "/notifications/threads/:id",
    "/notifications/threads/:id/subscription",
    "/repos/:owner/:repo/stargazers",
    "/users/:user/starred",
    "/user/starred",
    "/user/starred/:owner/:repo",
    "/repos/:owner/:repo/subscribers",
    "/users/:user/subscriptions",
    "/user/subscriptions",
    "/repos/:owner/:repo/subscription",
    "/users/:user/gists",
    "/gists",
    "/gists/:id",
    "/gists/:id/star",
    "/repos/:owner/:repo/git/blobs/:sha",
    "/repos/:owner/:repo/git/commits/:sha",
    "/repos/:owner/:repo/git/refs",
    "/repos/:owner/:repo/git/tags/:sha",
    "/repos/:owner/:repo/git/trees/:sha",
    "/issues",
    "/user/issues",
    "/orgs/:org/issues",
    "/repos/:owner/:repo/issues",
    "/repos/:owner/:repo/issues/:number",
    "/repos/:owner/:repo/assignees",
    "/repos/:owner/:repo/assignees/:assignee",
    "/repos/:owner/:repo/issues/:number/comments",
    "/repos/:owner/:repo/contents/*path",
    "/search/repositories",
    "/search/code",
    "/search/issues",
    "/search/users",
    "/legacy/issues/search/:owner/:repository/:state/:keyword",
    "/users/:user",
    "/user",
    "/users",
    "/user/emails",
    "/users/:user/followers",
    "/user/followers",
    "/users/:user/following",
    "/user/following",
    "/user/following/:user",
    "/users/:user/following/:target_user",
];

fn github() -> Router<usize> {
    ROUTES
        .iter()
        .enumerate()
        .fold(Router::new(), |router, (i, route)| router.get(route, i))
}

fn bench_lookup(c: &mut Criterion) {
    let router = github();
    let mut group = c.benchmark_group("lookup");

    for path in [
        "/user/starred",
        "/repos/rust-lang/rust/issues/1234/comments",
        "/repos/rust-lang/rust/contents/src/lib.rs",
        "/legacy/issues/search/rust-lang/rust/open/router",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(path), path, |b, path| {
            b.iter(|| {
                let matched = router.lookup(&Method::GET, black_box(path)).unwrap();
                black_box(matched.params().len())
            })
        });
    }

    group.bench_function("miss", |b| {
        b.iter(|| router.lookup(&Method::GET, black_box("/repos/rust-lang/rust/unknown")).is_none())
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let mut out = Vec::with_capacity(1024);

    group.bench_function("fields", |b| {
        b.iter(|| {
            out.clear();
            encode(
                &mut out,
                black_box(&[
                    Field::string("name", "Ann"),
                    Field::int("age", 3),
                    Field::bool("ok", true),
                    Field::float64("score", 97.5),
                    Field::duration("elapsed", Duration::from_micros(1_500)),
                ]),
            )
            .unwrap();
        })
    });

    group.bench_function("serde_json", |b| {
        b.iter(|| {
            out.clear();
            let value = serde_json::json!({
                "name": "Ann",
                "age": 3,
                "ok": true,
                "score": 97.5,
                "elapsed": "1.5ms",
            });
            serde_json::to_writer(&mut out, black_box(&value)).unwrap();
        })
    });

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let app = App::default()
        .get("/users/:id", |mut ctx: Context| async move {
            let id = ctx.param("id").unwrap_or_default().to_owned();
            ctx.fields(StatusCode::OK, &[Field::string("id", id)])
        })
        .build();

    c.bench_function("dispatch", |b| {
        b.iter(|| {
            rt.block_on(async {
                let req = Request::get("/users/42").body(Body::empty()).unwrap();
                black_box(app.serve(req).await.unwrap())
            })
        })
    });
}

criterion_group!(benches, bench_lookup, bench_encode, bench_dispatch);
criterion_main!(benches);
