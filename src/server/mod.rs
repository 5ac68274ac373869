// Server module entry
// Listener creation, connection handling, accept loop and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_reusable_listener;
pub use server_loop::{start_server_loop, wait_for_drain};
pub use signal::shutdown_signal;
