//! HTTP status endpoint
//!
//! Serves the current snapshot as JSON so scoreboards and overlays can poll it:
//!
//! - `GET <path>` (default `/data.json`): snapshot as `application/json`
//! - `GET /health`: `OK`
//! - other methods on `<path>`: 405
//! - anything else: 404
//!
//! Each request reads a fresh snapshot; the server never blocks ingestion.

use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::state::StateReader;
use crate::{BridgeError, Result};

/// Handle to a running status server
pub struct StatusServerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl StatusServerHandle {
    /// Address actually bound, useful when listening on port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the server to finish after its token is cancelled
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            error!("Status server task failed: {}", e);
        }
    }
}

/// Routes shared by every connection
#[derive(Clone)]
struct Routes {
    path: Arc<str>,
    state: StateReader,
}

/// Bind `addr` and serve snapshots until `cancel` fires.
///
/// Binding happens before this returns, so an address in use is reported here
/// rather than from the background task.
pub async fn spawn_status_server(
    addr: SocketAddr,
    path: &str,
    state: StateReader,
    cancel: CancellationToken,
) -> Result<StatusServerHandle> {
    let routes = Routes { path: Arc::from(path), state };

    let make_service = make_service_fn(move |_conn| {
        let routes = routes.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let response = handle_request(&routes.path, &routes.state, &req);
                async move { Ok::<_, Infallible>(response) }
            }))
        }
    });

    let builder = Server::try_bind(&addr)
        .map_err(|e| BridgeError::http(format!("failed to bind {}", addr), Some(Box::new(e))))?;
    let server = builder.serve(make_service);
    let local_addr = server.local_addr();

    let server = server.with_graceful_shutdown(async move {
        cancel.cancelled().await;
        debug!("Status server shutting down");
    });

    info!("Serving snapshot at http://{}{}", local_addr, path);

    let task = tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Status server error: {}", e);
        }
    });

    Ok(StatusServerHandle { local_addr, task })
}

fn handle_request(path: &str, state: &StateReader, req: &Request<Body>) -> Response<Body> {
    let request_path = req.uri().path();

    match (req.method(), request_path) {
        (&Method::GET, p) if p == path => match state.snapshot().to_json() {
            Ok(json) => respond(StatusCode::OK, "application/json", json),
            Err(e) => {
                error!("Failed to serialize snapshot: {}", e);
                respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    format!("Failed to serialize snapshot: {}", e),
                )
            }
        },
        (&Method::GET, "/health") => respond(StatusCode::OK, "text/plain", "OK"),
        (method, p) if p == path => {
            debug!("Rejected {} {}", method, p);
            let mut response = respond(StatusCode::METHOD_NOT_ALLOWED, "text/plain", "Method Not Allowed");
            response.headers_mut().insert(ALLOW, HeaderValue::from_static("GET"));
            response
        }
        _ => respond(StatusCode::NOT_FOUND, "text/plain", "Not Found"),
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
