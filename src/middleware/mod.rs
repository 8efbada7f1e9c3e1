//! Before/after request hooks.
//!
//! A [`Middleware`] observes every request, routed or not: `before` sees the request
//! just ahead of the handler, `after` sees the finished response. Hooks run
//! in registration order before the handler and in reverse order after it.
//! They cannot short-circuit or rewrite anything; that is a handler's job.
//!
//! ```rust,no_run
//! use senda::{middleware, Request, Router};
//!
//! let app = Router::new()
//!     .wrap(middleware::Trace)
//!     .get("/", |_req: Request| async { "Hello, World!" });
//! ```

use std::time::Duration;

use http::Method;

use crate::request::Request;
use crate::response::Response;

mod trace;

pub use trace::Trace;

/// Observes requests before and responses after their handler runs.
pub trait Middleware: Send + Sync + 'static {
    fn before(&self, _req: &Request) {}

    /// `elapsed` covers the handler and every hook that ran before it.
    fn after(&self, _method: &Method, _path: &str, _res: &Response, _elapsed: Duration) {}
}
