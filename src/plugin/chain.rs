//! Processing chain assembly.
//!
//! # Responsibilities
//! - Resolve exactly one root handler (first provider that yields one)
//! - Query each discovered middleware once for `is_enabled`
//! - Compose enabled middleware around the root in discovery order
//! - Trigger each enabled middleware's one-time registration
//!
//! # Ordering
//! ```text
//! discovered: [A, B]
//! request  → A → B → root
//! response ← A ← B ← root
//! ```
//! The first discovered middleware is the outermost link, so the chain is
//! built by wrapping from the last enabled middleware inwards.

use axum::{body::Body, http::Request, response::Response};

use crate::error::{Result, ServerError};
use crate::plugin::handler::{Handler, HandlerProvider, Middleware};
use crate::plugin::locator::ServiceLocator;

/// An ordered sequence of middleware wrapping one terminal root handler.
///
/// Immutable once assembled and shared read-only by every request.
#[derive(Clone)]
pub struct ProcessingChain {
    head: Handler,
    links: Vec<String>,
}

impl ProcessingChain {
    /// Outermost handler; entry point for every request.
    pub fn head(&self) -> Handler {
        self.head.clone()
    }

    /// Names of the middleware links, outermost first.
    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub async fn handle(&self, request: Request<Body>) -> Response {
        self.head.handle(request).await
    }
}

impl std::fmt::Debug for ProcessingChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingChain")
            .field("links", &self.links)
            .finish()
    }
}

/// Build the processing chain from the plugins registered in `locator`.
pub fn assemble_chain(locator: &ServiceLocator) -> Result<ProcessingChain> {
    let root = resolve_root(&locator.all::<dyn HandlerProvider>())?;

    let discovered = locator.all::<dyn Middleware>();
    tracing::debug!(count = discovered.len(), "Discovered middleware plugins");

    let enabled: Vec<_> = discovered
        .into_iter()
        .filter(|middleware| {
            let enabled = middleware.is_enabled();
            tracing::info!(plugin = middleware.name(), enabled, "Plugin");
            enabled
        })
        .collect();

    let head = enabled
        .iter()
        .rev()
        .fold(root, |next, middleware| middleware.wrap(next));

    for middleware in &enabled {
        middleware.register();
    }

    let links = enabled.iter().map(|m| m.name().to_string()).collect();
    Ok(ProcessingChain { head, links })
}

fn resolve_root(providers: &[std::sync::Arc<dyn HandlerProvider>]) -> Result<Handler> {
    for provider in providers {
        if let Some(handler) = provider.handler() {
            tracing::info!(provider = provider.name(), "Root handler resolved");
            return Ok(handler);
        }
        tracing::debug!(provider = provider.name(), "Handler provider yielded no handler");
    }

    tracing::error!(
        providers = providers.len(),
        "Unable to start the server - no route handler provider available"
    );
    Err(ServerError::NoRouteHandler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::handler::handler_fn;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Static(Option<&'static str>);

    impl HandlerProvider for Static {
        fn handler(&self) -> Option<Handler> {
            let body = self.0?;
            Some(handler_fn(move |_req| async move { body.into_response() }))
        }
    }

    /// Appends its tag to the `x-trail` response header.
    struct Tagging {
        tag: &'static str,
        enabled: bool,
        registrations: AtomicUsize,
    }

    impl Tagging {
        fn new(tag: &'static str, enabled: bool) -> Arc<Self> {
            Arc::new(Self {
                tag,
                enabled,
                registrations: AtomicUsize::new(0),
            })
        }
    }

    impl Middleware for Tagging {
        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn wrap(&self, next: Handler) -> Handler {
            let tag = self.tag;
            handler_fn(move |req| {
                let next = next.clone();
                async move {
                    let mut response = next.handle(req).await;
                    let trail = match response.headers().get("x-trail") {
                        Some(inner) => format!("{},{}", inner.to_str().unwrap_or_default(), tag),
                        None => tag.to_string(),
                    };
                    response
                        .headers_mut()
                        .insert("x-trail", HeaderValue::from_str(&trail).unwrap());
                    response
                }
            })
        }

        fn register(&self) {
            self.registrations.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            self.tag
        }
    }

    #[test]
    fn no_providers_is_fatal() {
        let err = assemble_chain(&ServiceLocator::new()).unwrap_err();
        assert!(matches!(err, ServerError::NoRouteHandler));
    }

    #[test]
    fn providers_without_handler_are_fatal() {
        let locator = ServiceLocator::new().with::<dyn HandlerProvider>(Arc::new(Static(None)));
        assert!(matches!(
            assemble_chain(&locator),
            Err(ServerError::NoRouteHandler)
        ));
    }

    #[tokio::test]
    async fn first_provider_with_handler_wins() {
        let locator = ServiceLocator::new()
            .with::<dyn HandlerProvider>(Arc::new(Static(None)))
            .with::<dyn HandlerProvider>(Arc::new(Static(Some("second"))))
            .with::<dyn HandlerProvider>(Arc::new(Static(Some("third"))));

        let chain = assemble_chain(&locator).unwrap();
        let response = chain.handle(Request::new(Body::empty())).await;
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"second");
    }

    #[tokio::test]
    async fn disabled_middleware_contributes_nothing() {
        let a = Tagging::new("a", true);
        let off = Tagging::new("off", false);
        let b = Tagging::new("b", true);
        let locator = ServiceLocator::new()
            .with::<dyn HandlerProvider>(Arc::new(Static(Some("ok"))))
            .with::<dyn Middleware>(a.clone())
            .with::<dyn Middleware>(off.clone())
            .with::<dyn Middleware>(b.clone());

        let chain = assemble_chain(&locator).unwrap();
        assert_eq!(chain.links(), &["a".to_string(), "b".to_string()]);
        assert_eq!(a.registrations.load(Ordering::SeqCst), 1);
        assert_eq!(b.registrations.load(Ordering::SeqCst), 1);
        assert_eq!(off.registrations.load(Ordering::SeqCst), 0);

        // innermost link tags first on the way out
        let response = chain.handle(Request::new(Body::empty())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-trail"], "b,a");
    }
}
