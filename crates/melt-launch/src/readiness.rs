//! Startup readiness probing.
//!
//! A role is ready when its bound port accepts a TCP connection. The
//! hosted deployment approximated this with a blind five-second sleep;
//! here the port is polled on a short interval, bounded by the role's
//! startup timeout. What the toolkit serves on the port is opaque, so the
//! probe stops at TCP reachability.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tracing::debug;

/// Lifecycle of a launched role instance during its startup window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleStatus {
    /// Spawned; port not yet accepting connections.
    Starting,
    /// Port accepted a connection within the startup window.
    Ready,
    /// Process exited during startup, or the window elapsed.
    Failed,
}

/// Interval between readiness probes.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One TCP connect attempt against a local port.
///
/// [`RoleInstance::wait_ready`](crate::launcher::RoleInstance::wait_ready)
/// repeats this probe, interleaved with a child liveness check, until the
/// startup window closes.
pub async fn probe_port(port: u16) -> bool {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
    match tokio::time::timeout(POLL_INTERVAL, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(port, error = %e, "readiness probe refused");
            false
        }
        Err(_) => {
            debug!(port, "readiness probe timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn probe_succeeds_against_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(probe_port(port).await);
    }

    #[tokio::test]
    async fn probe_fails_against_closed_port() {
        let port = free_port();
        assert!(!probe_port(port).await);
    }
}
