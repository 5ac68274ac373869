// Reusable listener module
// Creates TCP listeners with SO_REUSEADDR/SO_REUSEPORT so redeploys can bind
// while the previous process is still draining

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Backlog queue size passed to `listen(2)`
const BACKLOG: i32 = 128;

/// Create a `TcpListener` with `SO_REUSEPORT` and `SO_REUSEADDR` enabled.
///
/// # Arguments
///
/// * `addr` - The socket address to bind to
///
/// # Returns
///
/// * `Ok(TcpListener)` - Successfully created and bound listener
/// * `Err(std::io::Error)` - Failed to create or bind socket
pub fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // Allows binding to a port in TIME_WAIT state
    socket.set_reuse_address(true)?;

    // Required before handing the socket to tokio
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
