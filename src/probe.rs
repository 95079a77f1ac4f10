use std::future::Future;
use std::time::Duration;

use log::trace;
use tokio::net::TcpStream;
use tokio::time;

/// Attempt one TCP connect to `host:port`, bounded by `timeout`.
///
/// Returns `true` if the connection was accepted in time. The stream is
/// dropped (closed) before returning. Refused connections, timeouts, unreachable
/// hosts and resolution failures all yield `false`.
///
/// `timeout` covers name resolution as well as the connect itself.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> bool {
    match time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            true
        }
        Ok(Err(e)) => {
            trace!("{host}:{port} closed: {e}");
            false
        }
        Err(_) => {
            trace!("{host}:{port} timed out after {timeout:?}");
            false
        }
    }
}

/// Something that can decide whether a single port is open.
///
/// The scan engine is generic over this so callers can swap the network
/// probe for another strategy.
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, host: &str, port: u16, timeout: Duration)
        -> impl Future<Output = bool> + Send;
}

/// Plain TCP connect probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

impl Prober for TcpProber {
    fn probe(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = bool> + Send {
        probe(host, port, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    #[tokio::test]
    async fn listener_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(probe("127.0.0.1", port, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn dropped_listener_is_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(!probe("127.0.0.1", port, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn unresolvable_host_is_closed() {
        assert!(!probe("no-such-host.invalid", 80, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn non_routable_respects_timeout() {
        // Whether the address answers depends on the network; only the bound matters.
        let started = Instant::now();
        let _ = probe("10.255.255.1", 81, Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_millis(50) * 20);
    }
}
