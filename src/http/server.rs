//! HTTP service wrapping the processing chain.
//!
//! # Responsibilities
//! - Expose the assembled chain as an axum service
//! - Apply the fixed server posture around it
//!
//! # Server posture (defaults, tunable through `ServerConfig`)
//! - `Server` response header overridden with `serverString`
//! - HTTP/1.1 `Keep-Alive` not advertised (`alwaysSetKeepAlive = false`);
//!   connections are still reused by the transport
//! - `Date` header always set (hyper default)
//! - No per-request start-time tracking (`recordRequestStartTime = false`);
//!   when enabled, a tower-http `TraceLayer` records request latency
//! - At most `workerThreads` (200) requests run the chain concurrently,
//!   independently of the runtime's I/O threads

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::{from_fn_with_state, map_response, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio::sync::Semaphore;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::plugin::ProcessingChain;

const DEFAULT_SERVER_STRING: &str = "service-host";

/// Build the service served by every listener.
pub fn build_service(chain: &ProcessingChain, config: &ServerConfig) -> Router {
    let head = chain.head();
    let mut router = Router::new().fallback(move |request: Request<Body>| {
        let head = head.clone();
        async move { head.handle(request).await }
    });

    if !config.always_set_keep_alive {
        router = router.layer(map_response(strip_keep_alive));
    }

    router = router
        .layer(from_fn_with_state(
            Arc::new(Semaphore::new(config.worker_threads)),
            limit_workers,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            server_header(&config.server_string),
        ));

    if config.record_request_start_time {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn server_header(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| {
        tracing::warn!(server_string = value, "Invalid serverString, using default");
        HeaderValue::from_static(DEFAULT_SERVER_STRING)
    })
}

/// Requests beyond the worker limit wait for a free slot.
async fn limit_workers(
    State(permits): State<Arc<Semaphore>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match permits.acquire().await {
        Ok(_permit) => next.run(request).await,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn strip_keep_alive(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.remove("keep-alive");
    if headers
        .get(header::CONNECTION)
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"keep-alive"))
    {
        headers.remove(header::CONNECTION);
    }
    response
}
