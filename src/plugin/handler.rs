//! Handler and middleware capability traits.
//!
//! A [`Handler`] is a shared trait object turning a request into a response.
//! Middleware decorates a handler by capturing "the next" link at assembly
//! time and returning a new handler that runs its own logic around it.

use std::future::Future;
use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use futures_util::future::BoxFuture;
use tower::ServiceExt;

/// A unit that accepts a request and produces a response.
pub trait HttpHandler: Send + Sync + 'static {
    fn handle(&self, request: Request<Body>) -> BoxFuture<'static, Response>;
}

/// Shared handle to one link of the processing chain.
pub type Handler = Arc<dyn HttpHandler>;

/// Supplies the terminal (root) handler of the chain.
///
/// Providers are consulted in discovery order; the first one returning
/// `Some` wins and the rest are ignored.
pub trait HandlerProvider: Send + Sync + 'static {
    fn handler(&self) -> Option<Handler>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A handler wrapper that may inspect or modify the request or response,
/// or short-circuit before delegating onward.
pub trait Middleware: Send + Sync + 'static {
    /// Whether this middleware takes part in the chain. Queried once per assembly.
    fn is_enabled(&self) -> bool;

    /// Wrap `next`, returning the new chain head.
    fn wrap(&self, next: Handler) -> Handler;

    /// One-time side effect performed after the middleware joins the chain
    /// (e.g. exposing its own sub-routes).
    fn register(&self) {}

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Adapter turning an async closure into a [`Handler`].
struct FnHandler<F>(F);

impl<F, Fut> HttpHandler for FnHandler<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, request: Request<Body>) -> BoxFuture<'static, Response> {
        Box::pin((self.0)(request))
    }
}

/// Build a handler from an async function of the request.
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Root handler backed by an axum [`Router`].
///
/// Lets application routing be written with the usual axum API and still be
/// plugged in as the terminal link of the chain.
#[derive(Clone)]
pub struct RouterHandler {
    router: Router,
}

impl RouterHandler {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    pub fn into_handler(self) -> Handler {
        Arc::new(self)
    }
}

impl HttpHandler for RouterHandler {
    fn handle(&self, request: Request<Body>) -> BoxFuture<'static, Response> {
        let router = self.router.clone();
        Box::pin(async move {
            match router.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            }
        })
    }
}
