// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown (sent by orchestrators on redeploy)
// - SIGINT:  Graceful shutdown (Ctrl+C)

/// Resolve once a shutdown signal arrives, returning its name
///
/// If a handler cannot be registered the error is logged and only the
/// remaining signals are awaited.
#[cfg(unix)]
pub async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => Some(s),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
            None
        }
    };

    tokio::select! {
        () = async {
            match sigterm.as_mut() {
                Some(s) => { s.recv().await; }
                None => std::future::pending::<()>().await,
            }
        } => "SIGTERM received",
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => "SIGINT received",
            Err(e) => {
                crate::logger::log_error(&format!("Failed to listen for SIGINT: {e}"));
                std::future::pending::<&'static str>().await
            }
        },
    }
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "Ctrl+C received",
        Err(e) => {
            crate::logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            std::future::pending::<&'static str>().await
        }
    }
}
