// Server loop module
// Accepts connections until the shutdown future resolves, then lets
// in-flight connections drain

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// How often the drain wait re-checks the connection counter
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept loop
///
/// Accept errors are logged and the loop keeps going; only `shutdown`
/// ends it.
pub async fn start_server_loop<S>(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: S,
) where
    S: Future<Output = &'static str>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            reason = &mut shutdown => {
                logger::log_shutdown(reason);
                return;
            }
        }
    }
}

/// Wait until every connection task has finished or `timeout` elapses
///
/// Returns the number of connections still open.
pub async fn wait_for_drain(active_connections: &AtomicUsize, timeout: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 || tokio::time::Instant::now() >= deadline {
            return remaining;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
