//! The application builder.

use std::future::Future;
use std::mem;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Body, Method, Response, Server};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::context::{Context, Settings, CONTENT_TYPE_JSON};
use crate::docs::{self, OpenApi, RouteDoc};
use crate::error::{Error, Result};
use crate::handler::{self, BoxHandler, ErrorHandler, Handler, Middleware};
use crate::pool::Pool;
use crate::router::Router;
use crate::service::{default_error_handler, AppService, MakeAppService, Shared};

/// A registered route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    pub method: Method,
    /// The full path, including the prefixes of enclosing groups.
    pub path: String,
    pub doc: RouteDoc,
    /// The index of the innermost enclosing group in [`App::groups`].
    pub group: Option<usize>,
}

/// A group of routes sharing a path prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGroup {
    pub prefix: String,
    pub doc: RouteDoc,
}

// What the next call to `doc` documents.
#[derive(Debug, Clone, Copy)]
enum Subject {
    None,
    Route(usize),
    Group(usize),
}

/// An application: routes, middleware and configuration.
///
/// Routes are registered with by-value builder methods. Registration happens
/// once at startup; [`App::build`] then freezes the routes into an
/// [`AppService`].
///
/// ```rust,no_run
/// use bolt::{App, Config, Context};
/// use hyper::StatusCode;
///
/// # async fn run() -> bolt::Result<()> {
/// App::new(Config::default().dev_mode(true))
///     .get("/", |mut ctx: Context| async move {
///         ctx.text(StatusCode::OK, "Hello, World!")
///     })
///     .get("/users/:id", |mut ctx: Context| async move {
///         let id = ctx.param("id").unwrap_or_default().to_owned();
///         ctx.json(StatusCode::OK, &id)
///     })
///     .listen(([127, 0, 0, 1], 3000))
///     .await
/// # }
/// ```
pub struct App {
    router: Router<BoxHandler>,
    config: Config,
    routes: Vec<RouteInfo>,
    groups: Vec<RouteGroup>,
    middleware: Vec<Arc<dyn Middleware>>,
    error_handler: ErrorHandler,
    prefix: String,
    group: Option<usize>,
    subject: Subject,
}

impl App {
    pub fn new(config: Config) -> Self {
        let params = config.enable_pooling.then(|| {
            Arc::new(Pool::new(config.max_pool_size, config.max_retained_params))
        });

        Self {
            router: Router::with_param_pool(params),
            routes: Vec::with_capacity(config.preallocate_routes),
            groups: Vec::new(),
            middleware: Vec::new(),
            error_handler: Arc::new(default_error_handler),
            prefix: String::new(),
            group: None,
            subject: Subject::None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The routes registered so far, in registration order.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// The groups created so far.
    pub fn groups(&self) -> &[RouteGroup] {
        &self.groups
    }

    /// Appends middleware to the chain.
    ///
    /// Middleware applies to routes registered after this call; the first
    /// middleware added runs first. Inside a [`group`](App::group), it only
    /// applies to the group's routes.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Replaces the handler that turns errors into responses.
    pub fn error_handler(
        mut self,
        handler: impl Fn(&Error) -> Response<Body> + Send + Sync + 'static,
    ) -> Self {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Registers a handler for the given method and path.
    ///
    /// # Panics
    ///
    /// Panics if the path does not begin with `/`, is malformed, or conflicts
    /// with a route registered before it.
    pub fn handle(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let path = format!("{}{}", self.prefix, path);
        let handler = self.compile(Arc::new(handler));

        if let Err(err) = self.router.insert(method.clone(), &path, handler) {
            panic!("{}", err);
        }
        debug!(%method, %path, "registered route");

        let route = RouteInfo {
            method,
            path,
            doc: RouteDoc::default(),
            group: self.group,
        };

        // a re-registered route replaces its record along with its handler
        let index = match self
            .routes
            .iter()
            .position(|r| r.method == route.method && r.path == route.path)
        {
            Some(i) => {
                self.routes[i] = route;
                i
            }
            None => {
                self.routes.push(route);
                self.routes.len() - 1
            }
        };
        self.subject = Subject::Route(index);
        self
    }

    fn compile(&self, handler: BoxHandler) -> BoxHandler {
        self.middleware
            .iter()
            .rev()
            .fold(handler, |next, middleware| middleware.wrap(next))
    }

    /// Register a handler for `GET` requests
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::GET, path, handler)
    }

    /// Register a handler for `HEAD` requests
    pub fn head(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::HEAD, path, handler)
    }

    /// Register a handler for `OPTIONS` requests
    pub fn options(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::OPTIONS, path, handler)
    }

    /// Register a handler for `POST` requests
    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::POST, path, handler)
    }

    /// Register a handler for `PUT` requests
    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::PUT, path, handler)
    }

    /// Register a handler for `PATCH` requests
    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::PATCH, path, handler)
    }

    /// Register a handler for `DELETE` requests
    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::DELETE, path, handler)
    }

    /// Register a handler for `POST` requests that receives the request body
    /// deserialized from JSON.
    ///
    /// ```rust
    /// use bolt::{App, Context};
    /// use hyper::StatusCode;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct NewUser {
    ///     name: String,
    /// }
    ///
    /// let app = App::default().post_json("/users", |mut ctx: Context, user: NewUser| async move {
    ///     ctx.json(StatusCode::CREATED, &user.name)
    /// });
    /// ```
    pub fn post_json<T, F, R>(self, path: &str, handler: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(Context, T) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Body>>> + Send + 'static,
    {
        self.handle(Method::POST, path, handler::typed(handler))
    }

    /// Register a handler for `PUT` requests that receives the request body
    /// deserialized from JSON.
    pub fn put_json<T, F, R>(self, path: &str, handler: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(Context, T) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Body>>> + Send + 'static,
    {
        self.handle(Method::PUT, path, handler::typed(handler))
    }

    /// Register a handler for `PATCH` requests that receives the request body
    /// deserialized from JSON.
    pub fn patch_json<T, F, R>(self, path: &str, handler: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(Context, T) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Body>>> + Send + 'static,
    {
        self.handle(Method::PATCH, path, handler::typed(handler))
    }

    /// Registers the routes added by `routes` under `prefix`.
    ///
    /// Middleware added inside the group applies only to the group's routes.
    /// Groups nest, and prefixes are joined as given.
    ///
    /// ```rust
    /// use bolt::{App, Context};
    /// use hyper::StatusCode;
    ///
    /// let app = App::default().group("/api", |api| {
    ///     api.group("/v1", |v1| {
    ///         v1.get("/status", |mut ctx: Context| async move {
    ///             ctx.text(StatusCode::OK, "ok")
    ///         })
    ///     })
    /// });
    ///
    /// assert_eq!(app.routes()[0].path, "/api/v1/status");
    /// ```
    pub fn group(mut self, prefix: &str, routes: impl FnOnce(App) -> App) -> Self {
        let prefix = format!("{}{}", self.prefix, prefix);
        self.groups.push(RouteGroup {
            prefix: prefix.clone(),
            doc: RouteDoc::default(),
        });
        let index = self.groups.len() - 1;

        let outer_prefix = mem::replace(&mut self.prefix, prefix);
        let outer_group = self.group.replace(index);
        let outer_middleware = self.middleware.len();

        let mut app = routes(self);

        app.prefix = outer_prefix;
        app.group = outer_group;
        app.middleware.truncate(outer_middleware);
        app.subject = Subject::Group(index);
        app
    }

    /// Attaches documentation to the route registered last, or to the group
    /// created last if called right after [`group`](App::group).
    pub fn doc(mut self, doc: RouteDoc) -> Self {
        match self.subject {
            Subject::Route(i) => self.routes[i].doc = doc,
            Subject::Group(i) => self.groups[i].doc = doc,
            Subject::None => warn!("documentation added before any route or group was registered"),
        }
        self
    }

    /// Generates the OpenAPI document for the routes registered so far.
    pub fn openapi(&self) -> OpenApi {
        docs::generate(&self.config.docs, &self.routes, &self.groups)
    }

    /// Freezes the app into a service.
    ///
    /// If documentation is enabled, the OpenAPI document is generated here and
    /// served at the configured path.
    pub fn build(mut self) -> AppService {
        if self.config.docs.enabled {
            self = self.serve_docs();
        }

        let buffers = self.config.enable_pooling.then(|| {
            Arc::new(Pool::new(
                self.config.max_pool_size,
                self.config.max_retained_buffer,
            ))
        });

        AppService::new(Shared {
            router: self.router,
            settings: Arc::new(Settings {
                buffers,
                max_body_size: self.config.max_body_size,
                timestamps: self.config.timestamp_format,
            }),
            error_handler: self.error_handler,
            handle_method_not_allowed: self.config.handle_method_not_allowed,
        })
    }

    fn serve_docs(self) -> Self {
        let spec = match serde_json::to_vec(&self.openapi()) {
            Ok(spec) => Bytes::from(spec),
            Err(err) => {
                error!(%err, "failed to serialize the openapi document");
                return self;
            }
        };

        let path = self.config.docs.spec_path.clone();
        self.get(&path, move |_: Context| {
            let mut res = Response::new(Body::from(spec.clone()));
            res.headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
            async move { Ok::<_, Error>(res) }
        })
    }

    /// Converts the app into a make-service which you can serve directly with `Hyper`.
    /// ```rust,no_run
    /// # use bolt::App;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let service = App::default().into_service();
    ///
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(service)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeAppService {
        MakeAppService(self.build())
    }

    /// Serves the app on `addr` until Ctrl-C is received.
    pub async fn listen(self, addr: impl Into<SocketAddr>) -> Result<()> {
        self.listen_with_shutdown(addr, ctrl_c()).await
    }

    /// Serves the app on `addr` until `signal` completes, then finishes the
    /// in-flight requests and returns.
    pub async fn listen_with_shutdown(
        self,
        addr: impl Into<SocketAddr>,
        signal: impl Future<Output = ()>,
    ) -> Result<()> {
        let addr = addr.into();
        let dev_mode = self.config.dev_mode;
        let docs = self
            .config
            .docs
            .enabled
            .then(|| self.config.docs.spec_path.clone());

        let server = Server::try_bind(&addr)?.serve(self.into_service());

        if dev_mode {
            info!(addr = %server.local_addr(), "server starting");
            if let Some(docs) = docs {
                info!("api documentation available at http://{}{}", server.local_addr(), docs);
            }
        }

        server.with_graceful_shutdown(signal).await?;

        if dev_mode {
            info!("server stopped");
        }
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down server"),
        Err(err) => {
            error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await
        }
    }
}
