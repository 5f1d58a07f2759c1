//! Bundled middleware.

use std::time::Instant;

use tracing::{info, warn};

use crate::context::Context;
use crate::handler::{from_fn, BoxHandler, Middleware};

/// Logs one event per request with the method, path, status and elapsed time.
///
/// ```rust
/// use bolt::{middleware, App};
///
/// let app = App::default().middleware(middleware::logger());
/// ```
pub fn logger() -> impl Middleware {
    from_fn(|ctx: Context, next: BoxHandler| async move {
        let method = ctx.method().clone();
        let path = ctx.path().to_owned();
        let start = Instant::now();

        let result = next.call(ctx).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(res) => info!(
                %method,
                %path,
                status = res.status().as_u16(),
                ?elapsed,
                "request"
            ),
            Err(err) => warn!(
                %method,
                %path,
                status = err.status_code().as_u16(),
                error = %err,
                ?elapsed,
                "request failed"
            ),
        }

        result
    })
}
