//! Middleware chains.
//!
//! A route is served by an ordered list of [`Handler`]s. Each handler receives
//! the request and a [`Next`] continuation; calling [`Next::run`] passes the
//! request to the following handler, returning early short-circuits the rest
//! of the chain. The last handler of every chain registered by the loader is
//! the bound controller action, which ignores `next`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::HttpError;
use crate::http::{IntoResponse, Request, Response};

/// Boxed future for async handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One link of a middleware chain.
pub type Handler = Arc<dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync>;

/// Continuation handed to each handler of a chain.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Handler]>,
    index: usize,
}

impl Next {
    /// Run the remainder of the chain.
    ///
    /// Running past the last handler yields a 404 JSON response.
    pub async fn run(self, req: Request) -> Response {
        let Some(handler) = self.chain.get(self.index).cloned() else {
            return HttpError::NotFound("No handler produced a response".into()).into_response();
        };
        let next = Next {
            chain: self.chain,
            index: self.index + 1,
        };
        handler(req, next).await
    }
}

/// An immutable, cheaply cloneable handler chain.
#[derive(Clone)]
pub struct HandlerChain {
    handlers: Arc<[Handler]>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Handler>) -> Self {
        Self {
            handlers: handlers.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch a request to the first handler.
    pub fn call(&self, req: Request) -> impl Future<Output = Response> + Send + 'static {
        let next = Next {
            chain: Arc::clone(&self.handlers),
            index: 0,
        };
        next.run(req)
    }
}

/// Build a middleware handler from an async function.
///
/// # Example
///
/// ```ignore
/// async fn require_token(req: Request, next: Next) -> Response {
///     if req.headers().contains_key("authorization") {
///         next.run(req).await
///     } else {
///         HttpError::Unauthorized("Missing token".into()).into_response()
///     }
/// }
///
/// middleware.push(from_fn(require_token));
/// ```
pub fn from_fn<F, Fut, O>(f: F) -> Handler
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: IntoResponse + 'static,
{
    Arc::new(move |req: Request, next: Next| -> BoxFuture<'static, Response> {
        let fut = f(req, next);
        Box::pin(async move { fut.await.into_response() })
    })
}

/// Build a terminal handler that never calls `next`.
pub fn endpoint<F, Fut, O>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: IntoResponse + 'static,
{
    Arc::new(move |req: Request, _next: Next| -> BoxFuture<'static, Response> {
        let fut = f(req);
        Box::pin(async move { fut.await.into_response() })
    })
}
