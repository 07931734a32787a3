// Per-connection serving
// Admission against `max_connections`, HTTP/1.1 setup and access logging

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::body::{Body as _, Incoming};
use hyper::header::{RANGE, REFERER, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, Version};
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::http::response::Body;
use crate::logger::{self, AccessLogEntry};

/// One counted connection; the count drops with the guard
struct Slot(Arc<AtomicUsize>);

impl Slot {
    /// Take a slot unless `limit` connections are already open
    fn acquire(active: &Arc<AtomicUsize>, limit: Option<u64>) -> Option<Self> {
        // Count first so two racing accepts cannot both slip under the limit
        let open = active.fetch_add(1, Ordering::SeqCst);
        let slot = Self(Arc::clone(active));
        match limit {
            Some(limit) if open >= usize::try_from(limit).unwrap_or(usize::MAX) => None,
            _ => Some(slot),
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Admit `stream` and serve it on its own task.
///
/// Connections beyond `performance.max_connections` are closed straight away.
/// Admitted ones are registered with `graceful` so shutdown can wait for them.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    active: &Arc<AtomicUsize>,
    graceful: &GracefulShutdown,
) {
    let limit = state.config.performance.max_connections;
    let Some(slot) = Slot::acquire(active, limit) else {
        logger::log_warning(&format!(
            "Rejected {peer_addr}: {} connections already open",
            limit.unwrap_or_default()
        ));
        return;
    };

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    let performance = &state.config.performance;
    let mut builder = http1::Builder::new();
    builder.keep_alive(performance.keep_alive_timeout > 0);
    if performance.read_timeout > 0 {
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.read_timeout));
    }

    let service_state = Arc::clone(state);
    let conn = builder.serve_connection(
        TokioIo::new(stream),
        service_fn(move |req| {
            let state = Arc::clone(&service_state);
            async move { Ok::<_, Infallible>(serve(req, peer_addr, &state).await) }
        }),
    );
    let conn = graceful.watch(conn);

    tokio::spawn(async move {
        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
        drop(slot);
    });
}

/// Dispatch one request and write its access line
async fn serve(req: Request<Incoming>, peer_addr: SocketAddr, state: &AppState) -> Response<Body> {
    if !state.config.logging.access_log {
        return handler::handle_request(req, &state.fileman).await;
    }

    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    let header = |name| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };
    entry.range = header(RANGE);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);

    let response = handler::handle_request(req, &state.fileman).await;

    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact();
    entry.elapsed = started.elapsed();
    logger::log_access(&entry, &state.config.logging.access_log_format);

    response
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
