//! Path parameter storage.
//!
//! Matching never copies parameter values. A [`ParamStore`] records the byte
//! range each parameter covers in the request path, and a [`ParamView`]
//! borrows the path to hand those ranges back out as `&str`.

use std::ops::Range;
use std::sync::Arc;

use crate::pool::Recycle;

/// The default number of parameters a store may hold and still be pooled.
pub const MAX_RETAINED_PARAMS: usize = 8;

/// Parameter names and the path ranges they were bound to.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    entries: Vec<(Arc<str>, Range<usize>)>,
}

impl ParamStore {
    pub(crate) fn push(&mut self, name: Arc<str>, range: Range<usize>) {
        self.entries.push((name, range));
    }

    /// The number of bound parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no parameter was bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the stored ranges against the path they were matched on.
    pub fn view<'s, 'p>(&'s self, path: &'p str) -> ParamView<'s, 'p> {
        ParamView { store: self, path }
    }
}

impl Recycle for ParamStore {
    fn recycle(&mut self, limit: usize) -> bool {
        let keep = self.entries.len() <= limit;
        self.entries.clear();
        keep
    }
}

/// A borrowed view of the parameters bound by a route match.
///
/// ```rust
/// use bolt::Router;
/// use hyper::Method;
///
/// let router = Router::new().get("/blog/:category/:post", "post");
///
/// let matched = router.lookup(&Method::GET, "/blog/rust/request-routers").unwrap();
/// let params = matched.params();
/// assert_eq!(params.get("category"), Some("rust"));
/// assert_eq!(params.get("post"), Some("request-routers"));
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParamView<'s, 'p> {
    store: &'s ParamStore,
    path: &'p str,
}

impl<'s, 'p> ParamView<'s, 'p> {
    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&'p str> {
        self.store
            .entries
            .iter()
            .find(|(key, _)| &**key == name)
            .and_then(|(_, range)| self.path.get(range.clone()))
    }

    /// Iterates over `(name, value)` pairs in the order they appear in the path.
    pub fn iter(&self) -> impl Iterator<Item = (&'s str, &'p str)> + '_ {
        let path = self.path;
        self.store
            .entries
            .iter()
            .filter_map(move |(key, range)| Some((&**key, path.get(range.clone())?)))
    }

    /// The number of bound parameters.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no parameter was bound.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
