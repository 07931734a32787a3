// Server loop module
// Accepts connections until shutdown, then drains the ones in flight

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Serve `listener` until `shutdown` resolves.
///
/// Once it does, the listener is dropped, open connections are told to
/// finish their current request, and the loop waits up to
/// `performance.shutdown_timeout` seconds for them.
#[allow(clippy::ignored_unit_patterns)]
pub async fn run_server<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &graceful,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = &mut shutdown => {
                break;
            }
        }
    }

    drop(listener);
    logger::log_shutdown(active_connections.load(Ordering::SeqCst));

    let grace = Duration::from_secs(state.config.performance.shutdown_timeout);
    tokio::select! {
        _ = graceful.shutdown() => {
            logger::log_info("[Shutdown] All connections closed");
        }
        _ = tokio::time::sleep(grace) => {
            logger::log_warning(&format!(
                "[Shutdown] {} connection(s) still open after {}s, exiting",
                active_connections.load(Ordering::SeqCst),
                grace.as_secs()
            ));
        }
    }
}
