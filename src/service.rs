//! Request dispatch and the hyper service types.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{self, Poll};

use futures_util::{future, ready};
use hyper::header::{self, HeaderValue};
use hyper::service::Service;
use hyper::{Body, Request, Response, StatusCode};
use tracing::error;

use crate::context::{Context, Settings, CONTENT_TYPE_JSON};
use crate::error::Error;
use crate::handler::{BoxHandler, ErrorHandler, HandlerFuture};
use crate::router::{RouteMatch, Router};

pub(crate) struct Shared {
    pub(crate) router: Router<BoxHandler>,
    pub(crate) settings: Arc<Settings>,
    pub(crate) error_handler: ErrorHandler,
    pub(crate) handle_method_not_allowed: bool,
}

/// A built [`App`](crate::App), ready to serve requests.
///
/// Cloning is cheap; all clones share the same routes.
#[derive(Clone)]
pub struct AppService(Arc<Shared>);

impl AppService {
    pub(crate) fn new(shared: Shared) -> Self {
        AppService(Arc::new(shared))
    }

    /// An asynchronous function from a `Request` to a `Response`. You will generally not need to use
    /// this function directly, and instead use
    /// [`App::into_service`](crate::App::into_service). However, it may be useful when
    /// incorporating the app into a larger service, or in tests.
    /// ```rust
    /// use bolt::{App, Context};
    /// use hyper::{Body, Request, StatusCode};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let app = App::default()
    ///     .get("/hello/:name", |mut ctx: Context| async move {
    ///         let greeting = format!("Hello, {}!", ctx.param("name").unwrap_or("stranger"));
    ///         ctx.text(StatusCode::OK, greeting)
    ///     })
    ///     .build();
    ///
    /// let req = Request::get("/hello/ferris").body(Body::empty()).unwrap();
    /// let res = app.serve(req).await.unwrap();
    ///
    /// let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    /// assert_eq!(body, "Hello, ferris!");
    /// # }
    /// ```
    pub fn serve(&self, req: Request<Body>) -> ResponseFut {
        let shared = &*self.0;

        let matched = shared
            .router
            .lookup(req.method(), req.uri().path())
            .map(RouteMatch::into_parts);

        if let Some((handler, params)) = matched {
            let ctx = Context::from_parts(req, params, Arc::clone(&shared.settings));
            return ResponseFutKind::Handler(handler.call(ctx), Arc::clone(&shared.error_handler))
                .into();
        }

        if shared.handle_method_not_allowed {
            let allow = shared.router.allowed(req.uri().path());

            if !allow.is_empty() {
                return ResponseFutKind::Ready(future::ready(method_not_allowed(&allow.join(", "))))
                    .into();
            }
        }

        ResponseFutKind::Ready(future::ready((shared.error_handler)(&Error::NotFound))).into()
    }
}

fn method_not_allowed(allow: &str) -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
    if let Ok(allow) = HeaderValue::from_str(allow) {
        res.headers_mut().insert(header::ALLOW, allow);
    }
    res
}

/// The error handler used unless [`App::error_handler`](crate::App::error_handler)
/// replaces it: a small JSON body with the status text, e.g. `{"error":"Not Found"}`.
pub fn default_error_handler(err: &Error) -> Response<Body> {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }

    let body = match status.as_u16() {
        400 => r#"{"error":"Bad Request"}"#,
        401 => r#"{"error":"Unauthorized"}"#,
        403 => r#"{"error":"Forbidden"}"#,
        404 => r#"{"error":"Not Found"}"#,
        413 => r#"{"error":"Payload Too Large"}"#,
        _ => r#"{"error":"Internal Server Error"}"#,
    };

    let mut res = Response::new(Body::from(body));
    *res.status_mut() = status;
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    res
}

impl Service<Request<Body>> for AppService {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = ResponseFut;

    fn poll_ready(&mut self, _: &mut task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.serve(req)
    }
}

#[doc(hidden)]
pub struct MakeAppService(pub(crate) AppService);

impl<T> Service<T> for MakeAppService {
    type Response = AppService;
    type Error = Infallible;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        future::ok(self.0.clone())
    }
}

/// The response future of [`AppService`]. Handler errors are turned into
/// responses by the app's error handler, so it never fails.
pub struct ResponseFut {
    kind: ResponseFutKind,
}

impl From<ResponseFutKind> for ResponseFut {
    fn from(kind: ResponseFutKind) -> Self {
        Self { kind }
    }
}

enum ResponseFutKind {
    Handler(HandlerFuture, ErrorHandler),
    Ready(future::Ready<Response<Body>>),
}

impl Future for ResponseFut {
    type Output = Result<Response<Body>, Infallible>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let res = match self.kind {
            ResponseFutKind::Handler(ref mut fut, ref on_error) => match ready!(fut.as_mut().poll(cx)) {
                Ok(res) => res,
                Err(err) => on_error(&err),
            },
            ResponseFutKind::Ready(ref mut fut) => ready!(Pin::new(fut).poll(cx)),
        };

        Poll::Ready(Ok(res))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(res: Response<Body>) -> String {
        let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn default_error_bodies() {
        let res = default_error_handler(&Error::NotFound);
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[header::CONTENT_TYPE], CONTENT_TYPE_JSON);
        assert_eq!(body(res).await, r#"{"error":"Not Found"}"#);

        let res = default_error_handler(&Error::BadRequest);
        assert_eq!(body(res).await, r#"{"error":"Bad Request"}"#);

        let res = default_error_handler(&Error::InvalidRedirect(200));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(res).await, r#"{"error":"Internal Server Error"}"#);
    }

    #[test]
    fn method_not_allowed_sets_allow() {
        let res = method_not_allowed("GET, OPTIONS");
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "GET, OPTIONS");
    }
}
