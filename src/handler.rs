//! Route handlers.
//!
//! Two handler shapes are accepted:
//!
//! ```text
//! async fn hello(req: Request) -> impl IntoResponse
//! async fn upload(req: Request, State(cfg): State<Arc<AppConfig>>) -> impl IntoResponse
//! ```
//!
//! The second receives a clone of the value registered with
//! [`Router::with_state`](crate::Router::with_state). Both are erased into a
//! [`BoxedHandler`] so that every route of a method shares one tree.

use std::any::type_name;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

#[doc(hidden)]
pub trait ErasedHandler: Send + Sync {
    fn call(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + 'static>;

/// Application state extracted for a handler's second argument.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use senda::{Request, Router, State};
/// struct Greeting(&'static str);
///
/// async fn hello(_req: Request, State(greeting): State<Arc<Greeting>>) -> String {
///     format!("{}, World!", greeting.0)
/// }
///
/// Router::new().with_state(Arc::new(Greeting("Hello"))).get("/", hello);
/// ```
///
/// A handler asking for a type the router holds no value of answers
/// `500 Internal Server Error`.
#[derive(Clone, Copy, Debug, Default)]
pub struct State<S>(pub S);

/// Implemented for every valid route handler. `Args` tells the two shapes
/// apart and is always inferred.
///
/// Sealed: only the impls in this module satisfy it.
pub trait Handler<Args>: private::Sealed<Args> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed<Args> {}
}

impl<F, Fut, R> private::Sealed<(Request,)> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler<(Request,)> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(Plain(self))
    }
}

impl<F, S, Fut, R> private::Sealed<(Request, State<S>)> for F
where
    F: Fn(Request, State<S>) -> Fut + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, S, Fut, R> Handler<(Request, State<S>)> for F
where
    F: Fn(Request, State<S>) -> Fut + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(WithState { handler: self, state: PhantomData })
    }
}

struct Plain<F>(F);

impl<F, Fut, R> ErasedHandler for Plain<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

struct WithState<F, S> {
    handler: F,
    // `fn() -> S` keeps the wrapper Send + Sync whatever `S` is.
    state: PhantomData<fn() -> S>,
}

impl<F, S, Fut, R> ErasedHandler for WithState<F, S>
where
    F: Fn(Request, State<S>) -> Fut + Send + Sync,
    S: Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let Some(state) = req.state::<S>() else {
            let err = Error::MissingState(type_name::<S>());
            return Box::pin(async move { err.into_response() });
        };
        let fut = (self.handler)(req, State(state));
        Box::pin(async move { fut.await.into_response() })
    }
}
