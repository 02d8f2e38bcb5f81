//! Network reachability probing

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

/// Decides whether a host is reachable.
pub trait ReachabilityProbe {
    fn is_reachable(&self, host: &str) -> bool;
}

impl<F> ReachabilityProbe for F
where
    F: Fn(&str) -> bool,
{
    fn is_reachable(&self, host: &str) -> bool {
        self(host)
    }
}

/// Probes by opening a TCP connection to `host:port`.
///
/// A host that does not resolve counts as unreachable.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

impl ReachabilityProbe for TcpProbe {
    fn is_reachable(&self, host: &str) -> bool {
        let host = host.trim();
        if host.is_empty() {
            return false;
        }

        let addrs = match (host, self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(err) => {
                debug!(host, error = %err, "Host does not resolve");
                return false;
            }
        };

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(_) => {
                    debug!(host, %addr, "Host reachable");
                    return true;
                }
                Err(err) => debug!(host, %addr, error = %err, "Connect failed"),
            }
        }
        false
    }
}
