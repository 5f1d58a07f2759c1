//! Request handlers and middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::{Body, Response};
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::{Error, Result};

/// The future returned by a [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response<Body>>> + Send>>;

/// A shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// Turns handler errors into responses.
pub type ErrorHandler = Arc<dyn Fn(&Error) -> Response<Body> + Send + Sync>;

/// Represents a HTTP handler function.
/// This trait is implemented for asynchronous functions that take a [`Context`]
/// and return a `Result<Response<Body>, bolt::Error>`.
/// ```rust
/// use bolt::{BoxHandler, Context, Result};
/// use hyper::{Body, Response, StatusCode};
/// use std::sync::Arc;
///
/// async fn hello(mut ctx: Context) -> Result<Response<Body>> {
///     ctx.text(StatusCode::OK, "Hello, World!")
/// }
///
/// let handler: BoxHandler = Arc::new(hello);
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> HandlerFuture;
}

impl<F, R> Handler for F
where
    F: Fn(Context) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Response<Body>>> + Send + 'static,
{
    fn call(&self, ctx: Context) -> HandlerFuture {
        Box::pin(self(ctx))
    }
}

/// Wraps a handler to add functionality.
///
/// Middleware is applied when a route is registered, so the chain is built
/// once and not per request. It is implemented for closures taking and
/// returning a [`BoxHandler`]; [`from_fn`] covers the common case of running
/// code around the next handler.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxHandler) -> BoxHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        self(next)
    }
}

/// Creates middleware from an async function that receives the request
/// context and the next handler in the chain.
///
/// ```rust
/// use bolt::handler::{from_fn, BoxHandler};
/// use bolt::{App, Context, Error};
///
/// let auth = from_fn(|ctx: Context, next: BoxHandler| async move {
///     if ctx.header("authorization").is_none() {
///         return Err(Error::Unauthorized);
///     }
///     next.call(ctx).await
/// });
///
/// let app = App::default().middleware(auth);
/// ```
pub fn from_fn<F, R>(f: F) -> FromFn<F>
where
    F: Fn(Context, BoxHandler) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Response<Body>>> + Send + 'static,
{
    FromFn(Arc::new(f))
}

/// Middleware created by [`from_fn`].
pub struct FromFn<F>(Arc<F>);

impl<F, R> Middleware for FromFn<F>
where
    F: Fn(Context, BoxHandler) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Response<Body>>> + Send + 'static,
{
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        let f = Arc::clone(&self.0);
        Arc::new(move |ctx: Context| f(ctx, Arc::clone(&next)))
    }
}

/// Adapts a handler taking a JSON request body.
///
/// The body is bound with [`Context::bind_json`] before `handler` runs; a
/// body that does not deserialize into `T` fails with [`Error::BadRequest`].
pub fn typed<T, F, R>(handler: F) -> impl Handler
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(Context, T) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Response<Body>>> + Send + 'static,
{
    let handler = Arc::new(handler);
    move |mut ctx: Context| {
        let handler = Arc::clone(&handler);
        async move {
            let body = ctx.bind_json::<T>().await?;
            handler(ctx, body).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Request, StatusCode};
    use parking_lot::Mutex;
    use serde::Deserialize;

    fn request(body: &'static str) -> Context {
        Context::new(Request::post("/").body(Body::from(body)).unwrap())
    }

    fn tagging(tag: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> impl Middleware {
        from_fn(move |ctx: Context, next: BoxHandler| {
            log.lock().push(tag);
            next.call(ctx)
        })
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let handler: BoxHandler =
            Arc::new(|mut ctx: Context| async move { ctx.text(StatusCode::OK, "ok") });
        let res = handler.call(request("")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn middleware_runs_outside_in() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<Box<dyn Middleware>> = vec![
            Box::new(tagging("outer", Arc::clone(&log))),
            Box::new(tagging("inner", Arc::clone(&log))),
        ];

        let inner = Arc::clone(&log);
        let handler: BoxHandler = Arc::new(move |_: Context| {
            inner.lock().push("handler");
            async { Err::<Response<Body>, _>(Error::NotFound) }
        });

        let handler = chain.iter().rev().fold(handler, |next, m| m.wrap(next));
        let result = handler.call(request("")).await;

        assert!(matches!(result, Err(Error::NotFound)));
        assert_eq!(*log.lock(), ["outer", "inner", "handler"]);
    }

    #[tokio::test]
    async fn typed_handlers_bind_the_body() {
        #[derive(Deserialize)]
        struct Greeting {
            name: String,
        }

        let handler = typed(|mut ctx: Context, body: Greeting| async move {
            ctx.text(StatusCode::OK, format!("hello {}", body.name))
        });

        let res = handler.call(request(r#"{"name":"ann"}"#)).await.unwrap();
        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        assert_eq!(body, "hello ann");

        let err = handler.call(request("not json")).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest));
    }
}
