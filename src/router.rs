//! [`Router`](crate::Router) is a lightweight high performance HTTP request router.
//!
//! This router supports variables in the routing pattern and matches against
//! the request method. It keeps one compressing dynamic trie (radix tree) per
//! method, so lookups cost time proportional to the path length and not to
//! the number of routes.
//!
//! The registered path, against which the router matches incoming requests, can
//! contain two types of parameters:
//! ```ignore
//!  Syntax    Type
//!  :name     named parameter
//!  *name     catch-all parameter
//! ```
//!
//! Named parameters are dynamic path segments. They match anything until the
//! next '/' or the path end:
//! ```ignore
//!  Path: /blog/:category/:post
//! ```
//!
//!  Requests:
//! ```ignore
//!   /blog/rust/request-routers            match: category="rust", post="request-routers"
//!   /blog/rust/request-routers/           no match
//!   /blog/rust/                           no match
//!   /blog/rust/request-routers/comments   no match
//! ```
//!
//! Catch-all parameters match anything until the path end. Since they match
//! anything until the end, catch-all parameters must always be the final path
//! element.
//! ```ignore
//!  Path: /files/*filepath
//! ```
//!
//!  Requests:
//! ```ignore
//!   /files/LICENSE                      match: filepath="LICENSE"
//!   /files/templates/article.html       match: filepath="templates/article.html"
//!   /files/                             no match
//! ```
//!
//! A request can only match one route. Registering a static segment and a
//! parameter at the same position (`/user/new` and `/user/:user`) is rejected
//! with [`InsertError::Conflict`]. The routing of different request methods is
//! independent from each other.
//!
//! Parameter values are never copied: a match records byte ranges into the
//! request path in a pooled [`ParamStore`], and [`RouteMatch::params`] borrows
//! the path to read them back.
use std::collections::HashMap;
use std::sync::Arc;

use hyper::Method;
use tracing::debug;

use crate::error::InsertError;
use crate::params::{ParamStore, ParamView, MAX_RETAINED_PARAMS};
use crate::pool::{Pool, Pooled};
use crate::tree::{Interner, Node};

/// The default number of idle parameter stores kept by a router.
pub const DEFAULT_POOL_SIZE: usize = 1000;

/// Router dispatches paths to values via configurable routes, one tree per
/// request method.
#[derive(Debug)]
pub struct Router<T> {
    trees: HashMap<Method, Node<T>>,
    names: Interner,
    params: Option<Arc<Pool<ParamStore>>>,
}

impl<T> Router<T> {
    /// Creates an empty router with parameter store pooling enabled.
    pub fn new() -> Self {
        Self::with_param_pool(Some(Arc::new(Pool::new(
            DEFAULT_POOL_SIZE,
            MAX_RETAINED_PARAMS,
        ))))
    }

    /// Creates an empty router that hands out parameter stores from `pool`,
    /// or allocates a fresh store per match if `pool` is `None`.
    pub fn with_param_pool(pool: Option<Arc<Pool<ParamStore>>>) -> Self {
        Self {
            trees: HashMap::new(),
            names: Interner::default(),
            params: pool,
        }
    }

    /// The pool parameter stores are drawn from, if pooling is enabled.
    pub fn param_pool(&self) -> Option<&Arc<Pool<ParamStore>>> {
        self.params.as_ref()
    }

    /// Inserts a value into the router for a specific path at the specified method.
    ///
    /// Registering the same method and path twice replaces the earlier value.
    /// Returns an error if the path does not begin with `/`, has an unnamed
    /// or misplaced parameter, or conflicts with an already registered route.
    /// ```rust
    /// use bolt::Router;
    /// use hyper::Method;
    ///
    /// let mut router = Router::new();
    /// router.insert(Method::GET, "/users/:id", "user").unwrap();
    /// assert!(router.insert(Method::GET, "/users/new", "new").is_err());
    ///
    /// // other methods have their own tree
    /// router.insert(Method::POST, "/users/new", "new").unwrap();
    /// ```
    pub fn insert(&mut self, method: Method, path: &str, value: T) -> Result<(), InsertError> {
        let replaced = self
            .trees
            .entry(method.clone())
            .or_default()
            .insert(path, value, &mut self.names)?;

        if replaced.is_some() {
            debug!(%method, path, "replaced existing route");
        }
        Ok(())
    }

    /// Insert a value into the router for a specific path at the specified method.
    ///
    /// # Panics
    ///
    /// Panics if [`Router::insert`] rejects the route. Routes are registered
    /// at startup, so a bad route is a programming error.
    /// ```rust
    /// use bolt::Router;
    /// use hyper::Method;
    ///
    /// let router = Router::new().handle("/teapot", Method::GET, "I am a teapot!");
    /// assert_eq!(*router.lookup(&Method::GET, "/teapot").unwrap().value, "I am a teapot!");
    /// ```
    pub fn handle(mut self, path: &str, method: Method, value: T) -> Self {
        if let Err(err) = self.insert(method, path, value) {
            panic!("{}", err);
        }
        self
    }

    /// Lookup allows the manual lookup of a value for a specific method and path.
    ///
    /// Returns `None` if no route matches; a path registered only for other
    /// methods does not match.
    /// ```rust
    /// use bolt::Router;
    /// use hyper::Method;
    ///
    /// let router = Router::new().get("/home", "Welcome!");
    ///
    /// let res = router.lookup(&Method::GET, "/home").unwrap();
    /// assert!(res.params().is_empty());
    /// assert!(router.lookup(&Method::POST, "/home").is_none());
    /// ```
    pub fn lookup<'r, 'p>(&'r self, method: &Method, path: &'p str) -> Option<RouteMatch<'r, 'p, T>> {
        let root = self.trees.get(method)?;

        let mut params: Option<Pooled<ParamStore>> = None;
        let value = root.at(path.as_bytes(), |name, range| {
            params
                .get_or_insert_with(|| self.acquire_params())
                .push(Arc::clone(name), range)
        })?;

        Some(RouteMatch {
            value,
            params: params.unwrap_or_else(|| Pooled::detached(ParamStore::default())),
            path,
        })
    }

    fn acquire_params(&self) -> Pooled<ParamStore> {
        match &self.params {
            Some(pool) => pool.acquire(),
            None => Pooled::detached(ParamStore::default()),
        }
    }

    /// Register a value for `GET` requests
    pub fn get(self, path: &str, value: T) -> Self {
        self.handle(path, Method::GET, value)
    }

    /// Register a value for `HEAD` requests
    pub fn head(self, path: &str, value: T) -> Self {
        self.handle(path, Method::HEAD, value)
    }

    /// Register a value for `OPTIONS` requests
    pub fn options(self, path: &str, value: T) -> Self {
        self.handle(path, Method::OPTIONS, value)
    }

    /// Register a value for `POST` requests
    pub fn post(self, path: &str, value: T) -> Self {
        self.handle(path, Method::POST, value)
    }

    /// Register a value for `PUT` requests
    pub fn put(self, path: &str, value: T) -> Self {
        self.handle(path, Method::PUT, value)
    }

    /// Register a value for `PATCH` requests
    pub fn patch(self, path: &str, value: T) -> Self {
        self.handle(path, Method::PATCH, value)
    }

    /// Register a value for `DELETE` requests
    pub fn delete(self, path: &str, value: T) -> Self {
        self.handle(path, Method::DELETE, value)
    }

    /// Returns a list of the allowed methods for a specific path
    /// ```rust
    /// use bolt::Router;
    ///
    /// let router = Router::new()
    ///     .get("/home", "get")
    ///     .post("/home", "post");
    ///
    /// let mut allowed = router.allowed("/home");
    /// allowed.sort_unstable();
    /// assert_eq!(allowed, ["GET", "OPTIONS", "POST"]);
    /// ```
    pub fn allowed(&self, path: &str) -> Vec<&str> {
        let mut allowed = self
            .trees
            .iter()
            .filter(|(method, _)| **method != Method::OPTIONS)
            .filter(|(_, root)| root.at(path.as_bytes(), |_, _| {}).is_some())
            .map(|(method, _)| method.as_str())
            .collect::<Vec<_>>();

        if !allowed.is_empty() {
            allowed.push(Method::OPTIONS.as_str())
        }

        allowed
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A successful lookup: the matched value and the parameters it bound.
///
/// The parameter store goes back to the router's pool when the match (or the
/// store taken out of it with [`RouteMatch::into_parts`]) is dropped.
#[derive(Debug)]
pub struct RouteMatch<'r, 'p, T> {
    /// The value registered for the route.
    pub value: &'r T,
    params: Pooled<ParamStore>,
    path: &'p str,
}

impl<'r, 'p, T> RouteMatch<'r, 'p, T> {
    /// The parameters bound by this match.
    pub fn params(&self) -> ParamView<'_, 'p> {
        self.params.view(self.path)
    }

    /// Returns the value bound to the parameter `name`.
    pub fn param(&self, name: &str) -> Option<&'p str> {
        self.params().get(name)
    }

    /// Splits the match into the value and the owned parameter store, which
    /// no longer borrows the request path.
    pub fn into_parts(self) -> (&'r T, Pooled<ParamStore>) {
        (self.value, self.params)
    }
}
