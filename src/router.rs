//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a pattern,
//! you get a handler.
//!
//! # Patterns
//!
//! Patterns are `/`-separated segments. A segment starting with `:` binds the
//! incoming segment under that name; every other segment must match exactly
//! (case-sensitive, no trailing-slash folding). `/users/:userId/orders/:orderId`
//! matches `/users/lev/orders/10` with `userId = lev`, `orderId = 10`.
//!
//! # Overlapping patterns
//!
//! When two patterns could match the same path, the one with a literal
//! segment at the first point where they differ wins: `/users/new` beats
//! `/users/:id` for `/users/new`, whichever was registered first. Patterns
//! that differ only in parameter names (`/users/:id` vs `/users/:name`)
//! conflict and the second registration is rejected: [`Router::on`] panics,
//! [`Router::try_on`] returns [`Error::InvalidRoute`]. There is no
//! "first registered wins" rule to fall back on, so the outcome of a match
//! never depends on registration order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{Extensions, Method};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Path parameters bound by a match, name → raw segment value.
pub type Params = HashMap<String, String>;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve)
/// or drive it directly with [`Router::handle`]. Registration methods return
/// `self` so they chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    middleware: Vec<Arc<dyn Middleware>>,
    state: Extensions,
}

/// Generates the per-method shorthands on a type that has an `on` method.
macro_rules! method_shorthands {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Shorthand for `on(Method::", stringify!($method), ", pattern, handler)`.")]
            pub fn $name<Args>(self, pattern: &str, handler: impl Handler<Args>) -> Self {
                self.on(Method::$method, pattern, handler)
            }
        )*
    };
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), middleware: Vec::new(), state: Extensions::new() }
    }

    /// Register a handler for a method + pattern pair. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid or conflicts with an existing route.
    /// Use [`try_on`](Router::try_on) to handle that as an error instead.
    pub fn on<Args>(self, method: Method, pattern: &str, handler: impl Handler<Args>) -> Self {
        self.try_on(method, pattern, handler)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    method_shorthands! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
    }

    /// Fallible form of [`on`](Router::on).
    pub fn try_on<Args>(mut self, method: Method, pattern: &str, handler: impl Handler<Args>) -> Result<Self, Error> {
        let path = to_tree_path(pattern)?;
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .map_err(|e| Error::InvalidRoute { pattern: pattern.to_owned(), reason: e.to_string() })?;
        Ok(self)
    }

    /// Register routes under a shared path prefix.
    ///
    /// ```rust,no_run
    /// # use senda::{Request, Router};
    /// async fn hello(_req: Request) -> &'static str { "Hello, World!" }
    ///
    /// Router::new()
    ///     .group("/api", |api| api.get("/hello", hello).get("/world", hello))
    ///     .group("/web", |web| web.get("/hello", hello).get("/world", hello));
    /// ```
    pub fn group(self, prefix: &str, routes: impl FnOnce(Group) -> Group) -> Self {
        routes(Group { router: self, prefix: normalize_prefix(prefix) }).router
    }

    /// Shares `state` with every handler that takes a
    /// [`State<S>`](crate::State) argument. One value per type; registering
    /// the same type again replaces it.
    pub fn with_state<S: Clone + Send + Sync + 'static>(mut self, state: S) -> Self {
        self.state.insert(state);
        self
    }

    /// Add a before/after hook that sees every request, matched or not.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Finds the handler for `method` and `path`.
    ///
    /// `HEAD` falls back to the `GET` route when no `HEAD` route matches.
    pub fn lookup(&self, method: &Method, path: &str) -> Result<(BoxedHandler, Params), Error> {
        self.find(method, path)
            .or_else(|| (*method == Method::HEAD).then(|| self.find(&Method::GET, path)).flatten())
            .ok_or_else(|| Error::RouteNotFound { method: method.clone(), path: path.to_owned() })
    }

    fn find(&self, method: &Method, path: &str) -> Option<(BoxedHandler, Params)> {
        let matched = self.routes.get(method)?.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Routes one request and produces one response.
    ///
    /// This is the whole request path minus the network: the server calls it
    /// once the body is collected, and tests call it directly.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let started = Instant::now();
        let (mut parts, body) = req.into_parts();
        parts.extensions.extend(self.state.clone());
        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();

        let (route, params) = match self.lookup(&method, &path) {
            Ok((handler, params)) => (Ok(handler), params),
            Err(e) => (Err(e), Params::new()),
        };
        let req = Request::new(parts, body, params);

        for m in &self.middleware {
            m.before(&req);
        }

        let response = match route {
            Ok(handler) => handler.call(req).await,
            Err(e) => {
                debug!(%method, path = %path, "no route matched");
                e.into_response()
            }
        };
        let response = if method == Method::HEAD { response.strip_body() } else { response };

        for m in self.middleware.iter().rev() {
            m.after(&method, &path, &response, started.elapsed());
        }
        response
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Routes registered under a common prefix. Obtained via [`Router::group`].
pub struct Group {
    router: Router,
    prefix: String,
}

impl Group {
    /// Register `prefix + pattern`. Panics like [`Router::on`].
    pub fn on<Args>(mut self, method: Method, pattern: &str, handler: impl Handler<Args>) -> Self {
        self.router = self.router.on(method, &join(&self.prefix, pattern), handler);
        self
    }

    method_shorthands! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
    }

    /// A nested group; its prefix is appended to this one.
    pub fn group(self, prefix: &str, routes: impl FnOnce(Group) -> Group) -> Self {
        let Group { router, prefix: outer } = self;
        let inner = routes(Group { router, prefix: format!("{outer}{}", normalize_prefix(prefix)) });
        Group { router: inner.router, prefix: outer }
    }
}

/// `"/api/"` → `"/api"`, `"api"` → `"/api"`, `"/"` → `""`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}

fn join(prefix: &str, pattern: &str) -> String {
    match pattern {
        "" | "/" if !prefix.is_empty() => prefix.to_owned(),
        _ if pattern.starts_with('/') => format!("{prefix}{pattern}"),
        _ => format!("{prefix}/{pattern}"),
    }
}

/// Rewrites a `:name` pattern into the tree's `{name}` syntax, escaping
/// literal braces. Parameter names are ASCII letters, digits and `_`, so a
/// name can never turn into a catch-all (`{*rest}`) spanning several
/// segments. Empty or repeated names are rejected.
fn to_tree_path(pattern: &str) -> Result<String, Error> {
    let invalid = |reason: String| Error::InvalidRoute { pattern: pattern.to_owned(), reason };

    let rest = pattern
        .strip_prefix('/')
        .ok_or_else(|| invalid("pattern must begin with `/`".into()))?;

    let mut names: Vec<&str> = Vec::new();
    let mut out = String::with_capacity(pattern.len() + 8);

    for segment in rest.split('/') {
        out.push('/');
        match segment.strip_prefix(':') {
            Some(name) => {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid(format!("bad parameter name `{name}`")));
                }
                if names.contains(&name) {
                    return Err(invalid(format!("parameter `{name}` appears twice")));
                }
                names.push(name);
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            None => out.push_str(&segment.replace('{', "{{").replace('}', "}}")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::State;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn ok(_req: Request) -> &'static str { "ok" }

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::get(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn pattern_translation() {
        assert_eq!(to_tree_path("/").unwrap(), "/");
        assert_eq!(to_tree_path("/users/:userId/orders/:orderId").unwrap(), "/users/{userId}/orders/{orderId}");
        assert_eq!(to_tree_path("/a{b}").unwrap(), "/a{{b}}");
    }

    #[test]
    fn invalid_patterns() {
        assert!(matches!(to_tree_path("users"), Err(Error::InvalidRoute { .. })));
        assert!(matches!(to_tree_path("/users/:"), Err(Error::InvalidRoute { .. })));
        assert!(matches!(to_tree_path("/files/:*rest"), Err(Error::InvalidRoute { .. })));
        assert!(matches!(to_tree_path("/files/:{id}"), Err(Error::InvalidRoute { .. })));
        assert!(matches!(to_tree_path("/files/:a-b"), Err(Error::InvalidRoute { .. })));
        assert!(to_tree_path("/files/:file_id2").is_ok());
        let err = to_tree_path("/a/:id/b/:id").unwrap_err();
        assert_eq!(err.to_string(), "invalid route `/a/:id/b/:id`: parameter `id` appears twice");
    }

    #[test]
    fn extracts_params() {
        let router = Router::new().get("/users/:userId/orders/:orderId", ok);
        let (_, params) = router.lookup(&Method::GET, "/users/lev/orders/10").unwrap();
        assert_eq!(params.get("userId").map(String::as_str), Some("lev"));
        assert_eq!(params.get("orderId").map(String::as_str), Some("10"));
    }

    #[test]
    fn catch_all_parameter_is_refused() {
        let err = Router::new().try_on(Method::GET, "/files/:*rest", ok).err().unwrap();
        assert_eq!(err.to_string(), "invalid route `/files/:*rest`: bad parameter name `*rest`");
    }

    #[test]
    fn segment_counts_must_match() {
        let router = Router::new().get("/users/:id", ok);
        assert!(router.lookup(&Method::GET, "/users/1").is_ok());
        assert!(router.lookup(&Method::GET, "/users/1/orders").is_err());
        assert!(router.lookup(&Method::GET, "/users").is_err());
    }

    #[test]
    fn method_must_match() {
        let router = Router::new().post("/hello", ok);
        let err = router.lookup(&Method::GET, "/hello").err().unwrap();
        assert!(matches!(err, Error::RouteNotFound { .. }));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn literal_beats_parameter_regardless_of_order() {
        async fn param(_req: Request) -> &'static str { "param" }
        async fn literal(_req: Request) -> &'static str { "literal" }

        for router in [
            Router::new().get("/users/:id", param).get("/users/new", literal),
            Router::new().get("/users/new", literal).get("/users/:id", param),
        ] {
            assert_eq!(&router.handle(get("/users/new")).await.body()[..], b"literal");
            assert_eq!(&router.handle(get("/users/7")).await.body()[..], b"param");
        }
    }

    #[test]
    fn conflicting_patterns_are_rejected() {
        let err = Router::new()
            .get("/users/:id", ok)
            .try_on(Method::GET, "/users/:name", ok)
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidRoute { .. }));

        let err = Router::new().get("/", ok).try_on(Method::GET, "/", ok).err().unwrap();
        assert!(matches!(err, Error::InvalidRoute { .. }));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn on_panics_for_bad_pattern() {
        let _ = Router::new().get("no-slash", ok);
    }

    #[tokio::test]
    async fn handler_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let router = Router::new().get("/count", move |_req: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { "counted" }
        });

        let res = router.handle(get("/count")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        router.handle(get("/other")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn group_prefixes() {
        assert_eq!(normalize_prefix("/api/"), "/api");
        assert_eq!(normalize_prefix("api"), "/api");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(join("/api", "/hello"), "/api/hello");
        assert_eq!(join("/api", "/"), "/api");
        assert_eq!(join("", "/"), "/");
        assert_eq!(join("/api", "hello"), "/api/hello");
    }

    #[tokio::test]
    async fn nested_groups() {
        let router = Router::new().group("/api", |api| {
            api.group("/v1", |v1| v1.get("/users/:id", ok)).get("/health", ok)
        });
        assert!(router.lookup(&Method::GET, "/api/v1/users/3").is_ok());
        assert!(router.lookup(&Method::GET, "/api/health").is_ok());
        assert!(router.lookup(&Method::GET, "/api/users/3").is_err());
    }

    #[tokio::test]
    async fn state_reaches_handlers() {
        async fn visits(_req: Request, State(counter): State<Arc<AtomicUsize>>) -> String {
            (counter.fetch_add(1, Ordering::SeqCst) + 1).to_string()
        }

        let counter = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .with_state(Arc::clone(&counter))
            .get("/visits", visits)
            .group("/api", |api| api.get("/visits", visits));

        assert_eq!(&router.handle(get("/visits")).await.body()[..], b"1");
        assert_eq!(&router.handle(get("/api/visits")).await.body()[..], b"2");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn head_falls_back_to_get_without_body() {
        let router = Router::new().get("/", |_req: Request| async { "Hello, World!" });
        let res = router
            .handle(http::Request::head("/").body(Bytes::new()).unwrap())
            .await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(res.body().is_empty());
        assert_eq!(res.header("content-length"), Some("13"));
    }

    #[tokio::test]
    async fn middleware_order() {
        use std::sync::Mutex;

        struct Record(&'static str, Arc<Mutex<Vec<String>>>);

        impl Middleware for Record {
            fn before(&self, _req: &Request) {
                self.1.lock().unwrap().push(format!("before {}", self.0));
            }
            fn after(&self, _m: &Method, _p: &str, res: &Response, _e: std::time::Duration) {
                self.1.lock().unwrap().push(format!("after {} {}", self.0, res.status_code().as_u16()));
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .wrap(Record("a", Arc::clone(&log)))
            .wrap(Record("b", Arc::clone(&log)))
            .get("/", ok);

        router.handle(get("/")).await;
        router.handle(get("/missing")).await;

        assert_eq!(*log.lock().unwrap(), [
            "before a", "before b", "after b 200", "after a 200",
            "before a", "before b", "after b 404", "after a 404",
        ]);
    }
}
