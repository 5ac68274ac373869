use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod handler;
mod http;
mod logger;
mod routing;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Tokio runtime sized by server.workers, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg)?);
    let active_connections = Arc::new(AtomicUsize::new(0));

    logger::log_server_start(&listener.local_addr()?, &cfg);
    logger::log_routes_header();
    for route in state.routes.iter() {
        logger::log_route_registered(route.pattern.as_str(), route.endpoint);
    }

    server::start_server_loop(
        listener,
        state,
        Arc::clone(&active_connections),
        server::shutdown_signal(),
    )
    .await;

    let grace = Duration::from_secs(cfg.performance.write_timeout);
    let remaining = server::wait_for_drain(&active_connections, grace).await;
    if remaining > 0 {
        logger::log_warning(&format!(
            "[Shutdown] {remaining} connection(s) still open after {}s, exiting",
            grace.as_secs()
        ));
    }
    logger::log_info("[Shutdown] Server stopped");
    Ok(())
}
