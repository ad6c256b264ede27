//! Built-in status handler.
//!
//! Used by the binary as the root handler when no application routing is
//! linked in: `GET /` answers "OK", `GET /health` answers "healthy".

use axum::{routing::get, Router};

use crate::plugin::{Handler, HandlerProvider, RouterHandler};

/// Root handler provider serving the status routes.
#[derive(Debug, Default, Clone)]
pub struct StatusHandlerProvider;

impl HandlerProvider for StatusHandlerProvider {
    fn handler(&self) -> Option<Handler> {
        let router = Router::new()
            .route("/", get(|| async { "OK" }))
            .route("/health", get(|| async { "healthy" }));
        Some(RouterHandler::new(router).into_handler())
    }

    fn name(&self) -> &str {
        "status"
    }
}
