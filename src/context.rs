//! The per-request [`Context`] handed to handlers.

use std::mem;
use std::sync::Arc;

use hyper::body::HttpBody;
use hyper::header::{self, AsHeaderName, HeaderMap, HeaderValue, IntoHeaderName};
use hyper::{Body, Method, Request, Response, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::encoder::{DirectEncoder, TimestampFormat, STAGING_CAPACITY};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::params::{ParamStore, ParamView};
use crate::pool::{Pool, Pooled};

pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// Request handling settings shared by every context of an app.
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) buffers: Option<Arc<Pool<Vec<u8>>>>,
    pub(crate) max_body_size: usize,
    pub(crate) timestamps: TimestampFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            buffers: None,
            max_body_size: 10 * 1024 * 1024,
            timestamps: TimestampFormat::default(),
        }
    }
}

/// A request together with its path parameters, parsed query and the
/// headers of the response being built.
///
/// ```rust
/// use bolt::Context;
/// use hyper::{Body, Request};
///
/// let request = Request::get("/search?q=rust&page=2&exact=t")
///     .body(Body::empty())
///     .unwrap();
/// let ctx = Context::new(request);
///
/// assert_eq!(ctx.path(), "/search");
/// assert_eq!(ctx.query("q"), Some("rust"));
/// assert_eq!(ctx.query_int("page", 1), 2);
/// assert_eq!(ctx.query_int("limit", 20), 20);
/// assert!(ctx.query_bool("exact", false));
/// ```
#[derive(Debug)]
pub struct Context {
    request: Request<Body>,
    // parameter ranges index into this path, whatever happens to the request
    matched: Uri,
    params: Pooled<ParamStore>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    settings: Arc<Settings>,
}

impl Context {
    /// Creates a context without path parameters, outside of any app.
    pub fn new(request: Request<Body>) -> Self {
        Self::from_parts(
            request,
            Pooled::detached(ParamStore::default()),
            Arc::new(Settings::default()),
        )
    }

    pub(crate) fn from_parts(
        request: Request<Body>,
        params: Pooled<ParamStore>,
        settings: Arc<Settings>,
    ) -> Self {
        let query = match request.uri().query() {
            Some(query) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        };

        Self {
            matched: request.uri().clone(),
            request,
            params,
            query,
            headers: HeaderMap::new(),
            settings,
        }
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    /// Returns a request header, if it is present and valid UTF-8.
    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.request.headers().get(name)?.to_str().ok()
    }

    /// Returns the value of the path parameter `name`, as it appears in the
    /// path (not percent-decoded).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params().get(name)
    }

    /// All path parameters of the matched route.
    ///
    /// Values are taken from the path the route was matched against, even if
    /// the request URI has since been rewritten through
    /// [`request_mut`](Context::request_mut).
    pub fn params(&self) -> ParamView<'_, '_> {
        self.params.view(self.matched.path())
    }

    /// Returns the first value of the query parameter `key`.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the query parameter `key` as an integer, or `default` if it is
    /// missing or malformed.
    pub fn query_int(&self, key: &str, default: i64) -> i64 {
        self.query(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Returns the query parameter `key` as a boolean, or `default` if it is
    /// missing or malformed. Accepts `1`, `t`, `T`, `true`, `TRUE`, `True` and
    /// their false counterparts.
    pub fn query_bool(&self, key: &str, default: bool) -> bool {
        match self.query(key) {
            Some("1" | "t" | "T" | "true" | "TRUE" | "True") => true,
            Some("0" | "f" | "F" | "false" | "FALSE" | "False") => false,
            _ => default,
        }
    }

    /// Sets a header on the response built by this context.
    pub fn set_header(&mut self, name: impl IntoHeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Reads the request body and deserializes it as JSON.
    ///
    /// The body is read into a pooled buffer. Bodies larger than the
    /// configured limit fail with [`Error::PayloadTooLarge`], and bodies that
    /// are not valid JSON for `T` fail with [`Error::BadRequest`].
    pub async fn bind_json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let limit = self.settings.max_body_size;
        let mut buf = match &self.settings.buffers {
            Some(pool) => pool.acquire(),
            None => Pooled::detached(Vec::new()),
        };

        let body = self.request.body_mut();
        while let Some(chunk) = body.data().await {
            let chunk = chunk?;
            if buf.len() + chunk.len() > limit {
                return Err(Error::PayloadTooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&buf).map_err(|err| {
            debug!(%err, "failed to bind request body");
            Error::BadRequest
        })
    }

    /// Responds with `value` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> Result<Response<Body>> {
        let body = serde_json::to_vec(value)?;
        Ok(self.respond(status, Some(CONTENT_TYPE_JSON), body.into()))
    }

    /// Responds with `fields` written by the direct encoder.
    pub fn fields(&mut self, status: StatusCode, fields: &[Field<'_>]) -> Result<Response<Body>> {
        let mut body = Vec::with_capacity(STAGING_CAPACITY);
        DirectEncoder::<_>::new(&mut body)
            .timestamps(self.settings.timestamps)
            .encode(fields)?;
        Ok(self.respond(status, Some(CONTENT_TYPE_JSON), body.into()))
    }

    pub fn text(&mut self, status: StatusCode, text: impl Into<Body>) -> Result<Response<Body>> {
        Ok(self.respond(status, Some(CONTENT_TYPE_TEXT), text.into()))
    }

    pub fn html(&mut self, status: StatusCode, html: impl Into<Body>) -> Result<Response<Body>> {
        Ok(self.respond(status, Some(CONTENT_TYPE_HTML), html.into()))
    }

    /// Responds with raw bytes of the given content type.
    pub fn bytes(
        &mut self,
        status: StatusCode,
        content_type: &str,
        data: impl Into<Body>,
    ) -> Result<Response<Body>> {
        let content_type = HeaderValue::from_str(content_type)?;
        self.headers.insert(header::CONTENT_TYPE, content_type);
        Ok(self.respond(status, None, data.into()))
    }

    pub fn no_content(&mut self) -> Result<Response<Body>> {
        Ok(self.respond(StatusCode::NO_CONTENT, None, Body::empty()))
    }

    /// Redirects to `location`. Only the codes `300` through `308` are
    /// accepted; anything else fails with [`Error::InvalidRedirect`].
    pub fn redirect(&mut self, code: u16, location: &str) -> Result<Response<Body>> {
        if !(300..=308).contains(&code) {
            return Err(Error::InvalidRedirect(code));
        }
        let status = StatusCode::from_u16(code).map_err(|_| Error::InvalidRedirect(code))?;

        self.headers
            .insert(header::LOCATION, HeaderValue::from_str(location)?);
        Ok(self.respond(status, None, Body::empty()))
    }

    fn respond(
        &mut self,
        status: StatusCode,
        content_type: Option<&'static str>,
        body: Body,
    ) -> Response<Body> {
        let mut res = Response::new(body);
        *res.status_mut() = status;
        *res.headers_mut() = mem::take(&mut self.headers);

        if let Some(content_type) = content_type {
            res.headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        res
    }
}
