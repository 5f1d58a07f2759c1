//! # Bolt
//!
//! Bolt is a small HTTP request-dispatch layer on top of [hyper](https://hyper.rs).
//!
//! It is built around two pieces that do the actual work on every request:
//!
//! **A radix tree router.** Routes are stored in a compressing dynamic trie, one
//! per request method, so a lookup costs time proportional to the length of the
//! path and not to the number of routes. Matching is a single descent without
//! backtracking, and a request can only match exactly one route or none.
//! Parameter values are never copied: the router records where each one lies in
//! the request path, in a parameter store drawn from a pool.
//!
//! **A direct field encoder.** Responses built from a list of typed [`Field`]s
//! are written straight to the output as JSON through a small fixed staging
//! buffer, without building an intermediate map.
//!
//! Around them sits a thin application layer: an [`App`] builder with route
//! groups and middleware, a per-request [`Context`] with parameter, query and
//! body helpers, and an OpenAPI document generated from the registered routes.
//!
//! ## Usage
//!
//! Here is a simple example:
//!
//! ```rust,no_run
//! use bolt::field::Field;
//! use bolt::{middleware, App, Context, Result};
//! use hyper::{Body, Response, StatusCode};
//!
//! async fn index(mut ctx: Context) -> Result<Response<Body>> {
//!     ctx.text(StatusCode::OK, "Hello, World!")
//! }
//!
//! async fn hello(mut ctx: Context) -> Result<Response<Body>> {
//!     let user = ctx.param("user").unwrap_or_default().to_owned();
//!     ctx.fields(StatusCode::OK, &[Field::string("hello", user)])
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     App::default()
//!         .middleware(middleware::logger())
//!         .get("/", index)
//!         .get("/hello/:user", hello)
//!         .listen(([127, 0, 0, 1], 3000))
//!         .await
//! }
//! ```
//!
//! ### Named parameters
//!
//! As you can see, `:user` is a *named parameter*. The values are accessible via
//! [`Context::param`].
//!
//! Named parameters only match a single, non-empty path segment:
//!
//! ```ignore
//! Pattern: /user/:user
//!
//!  /user/gordon              match
//!  /user/you                 match
//!  /user/gordon/profile      no match
//!  /user/                    no match
//! ```
//!
//! **Note:** Since this router has only explicit matches, you can not register
//! static routes and parameters for the same path segment. For example you can
//! not register the patterns `/user/new` and `/user/:user` for the same request
//! method at the same time; the second registration panics. The routing of
//! different request methods is independent from each other.
//!
//! ### Catch-All parameters
//!
//! The second type are *catch-all* parameters and have the form `*name`. Like
//! the name suggests, they match everything. Therefore they must always be at
//! the **end** of the pattern:
//!
//! ```ignore
//! Pattern: /src/*filepath
//!
//!  /src/                     no match
//!  /src/somefile.rs          match
//!  /src/subdir/somefile.rs   match
//! ```
//!
//! ### Groups and documentation
//!
//! Routes can be grouped under a common prefix. Middleware added inside a group
//! applies only to it, and documentation attached with [`App::doc`] ends up in
//! the OpenAPI document served at `/openapi.json`:
//!
//! ```rust
//! use bolt::docs::{RouteDoc, Schema};
//! use bolt::{App, Context};
//! use hyper::StatusCode;
//!
//! let app = App::default()
//!     .group("/api/users", |users| {
//!         users
//!             .get("/:id", |mut ctx: Context| async move {
//!                 let id = ctx.param("id").map(str::to_owned);
//!                 ctx.json(StatusCode::OK, &id)
//!             })
//!             .doc(RouteDoc::new().summary("Fetch a user").response("User", Schema::object()))
//!     })
//!     .doc(RouteDoc::new().summary("User management"));
//!
//! let spec = app.openapi();
//! assert_eq!(spec.paths["/api/users/{id}"]["get"].tags, ["users"]);
//! ```
//!
//! ### Standalone router
//!
//! The [`Router`] is generic over the value it stores and can be used on its
//! own:
//!
//! ```rust
//! use bolt::Router;
//! use hyper::Method;
//!
//! let router = Router::new()
//!     .get("/users/:id", "user")
//!     .get("/files/*rest", "file");
//!
//! let matched = router.lookup(&Method::GET, "/files/a/b/c").unwrap();
//! assert_eq!(*matched.value, "file");
//! assert_eq!(matched.param("rest"), Some("a/b/c"));
//! ```

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod context;
pub mod docs;
pub mod encoder;
pub mod error;
pub mod field;
pub mod handler;
pub mod middleware;
pub mod params;
pub mod pool;
pub mod router;
pub mod service;

mod tree;

#[doc(inline)]
pub use app::App;
#[doc(inline)]
pub use config::{Config, DocsConfig};
#[doc(inline)]
pub use context::Context;
#[doc(inline)]
pub use error::{Error, InsertError, Result};
#[doc(inline)]
pub use field::Field;
#[doc(inline)]
pub use handler::{BoxHandler, Handler, Middleware};
#[doc(inline)]
pub use router::{RouteMatch, Router};
#[doc(inline)]
pub use service::AppService;

// test the code examples in README.md
#[cfg(doctest)]
mod test_readme {
    macro_rules! doc_comment {
        ($x:expr) => {
            #[doc = $x]
            extern "C" {}
        };
    }

    doc_comment!(include_str!("../README.md"));
}
