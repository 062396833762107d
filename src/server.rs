//! HTTP endpoint (`/api/wireframe`) on `tiny_http`.
//!
//! `POST` runs the pipeline on a JSON [`WireframeRequest`]; `GET` returns a
//! static descriptor and never touches the renderer. Requests are served by
//! a fixed pool of worker threads sharing one listener.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use log::{error, info, warn};
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::api::{FailureResponse, WireframeRequest};
use crate::pipeline::Pipeline;
use crate::{Error, Result};

pub const ENDPOINT: &str = "/api/wireframe";

/// Status code and JSON body for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl Reply {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    fn failure(err: &Error, expose_details: bool) -> Self {
        let body = serde_json::to_value(FailureResponse::from_error(err, expose_details))
            .unwrap_or_else(|_| json!({"success": false, "error": err.to_string()}));
        Self::json(err.status(), body)
    }
}

/// Descriptor returned by `GET /api/wireframe`.
pub fn descriptor() -> serde_json::Value {
    json!({
        "endpoint": ENDPOINT,
        "method": "POST",
        "description": "Render a page and return a high-fidelity HTML/CSS wireframe of it",
        "requiredParameters": { "url": "Absolute http(s) URL of the page to replicate" },
        "optionalParameters": {
            "designSystem": "Design system hint (default: microsoft)",
            "includeResponsive": "Ask for responsive breakpoints (default: true)",
            "includeAccessibility": "Run the accessibility check and fixes (default: true)"
        }
    })
}

/// Route one request. Transport-independent so it can be tested directly.
pub fn route(pipeline: &Pipeline, method: &Method, path: &str, body: &str, expose_details: bool) -> Reply {
    let path = path.split('?').next().unwrap_or(path);
    if path.trim_end_matches('/') != ENDPOINT {
        return Reply::json(404, json!({"success": false, "error": "Not found"}));
    }

    match method {
        Method::Get => Reply::json(200, descriptor()),
        Method::Post => {
            let outcome = WireframeRequest::from_json(body).and_then(|req| pipeline.run(&req));
            match outcome {
                Ok(resp) => match serde_json::to_value(&resp) {
                    Ok(v) => Reply::json(200, v),
                    Err(e) => Reply::failure(
                        &Error::Other(format!("Failed to encode response: {}", e)),
                        expose_details,
                    ),
                },
                Err(e) => {
                    if e.status() >= 500 {
                        error!("Wireframe request failed: {}", e);
                    } else {
                        warn!("Rejected wireframe request: {}", e);
                    }
                    Reply::failure(&e, expose_details)
                }
            }
        }
        _ => Reply::json(405, json!({"success": false, "error": "Method not allowed"})),
    }
}

/// Listening endpoint plus the pipeline it serves.
pub struct WireframeServer {
    server: Arc<Server>,
    pipeline: Arc<Pipeline>,
    expose_details: bool,
    workers: AtomicUsize,
}

impl WireframeServer {
    pub fn bind(addr: &str, pipeline: Arc<Pipeline>, expose_details: bool) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| Error::NetworkError(format!("Failed to bind {}: {}", addr, e)))?;
        Ok(Self {
            server: Arc::new(server),
            pipeline,
            expose_details,
            workers: AtomicUsize::new(0),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve forever on `workers` threads (at least one).
    pub fn run(&self, workers: usize) -> Result<()> {
        let workers = workers.max(1);
        self.workers.store(workers, Ordering::SeqCst);
        info!(
            "Serving {} on {} with {} workers ({} backend)",
            ENDPOINT,
            self.server.server_addr(),
            workers,
            self.pipeline.backend_name()
        );

        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let server = Arc::clone(&self.server);
                let pipeline = Arc::clone(&self.pipeline);
                let expose = self.expose_details;
                thread::Builder::new()
                    .name(format!("wireframe-worker-{}", i))
                    .spawn(move || {
                        for request in server.incoming_requests() {
                            handle(&pipeline, request, expose);
                        }
                    })
                    .map_err(|e| Error::Other(format!("Failed to spawn worker: {}", e)))
            })
            .collect::<Result<_>>()?;

        for h in handles {
            if h.join().is_err() {
                error!("Server worker panicked");
            }
        }
        Ok(())
    }

    /// Make `run` return once in-flight requests finish.
    pub fn shutdown(&self) {
        // unblock wakes a single waiting thread
        for _ in 0..self.workers.load(Ordering::SeqCst).max(1) {
            self.server.unblock();
        }
    }
}

fn handle(pipeline: &Pipeline, mut request: Request, expose_details: bool) {
    let mut body = String::new();
    let reply = match request.as_reader().read_to_string(&mut body) {
        Ok(_) => route(pipeline, request.method(), request.url(), &body, expose_details),
        Err(e) => Reply::failure(
            &Error::InvalidInput(format!("Unreadable request body: {}", e)),
            expose_details,
        ),
    };

    let mut response = Response::from_string(reply.body.to_string()).with_status_code(reply.status);
    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(h);
    }
    if let Err(e) = request.respond(response) {
        warn!("Failed to send response: {}", e);
    }
}

/// Bind `addr` and serve with one worker per CPU.
pub fn serve(addr: &str, pipeline: Arc<Pipeline>, expose_details: bool) -> Result<()> {
    WireframeServer::bind(addr, pipeline, expose_details)?.run(num_cpus::get())
}
