//! TCP connection establishment.
//!
//! Binding happens synchronously so setup errors reach the caller directly.
//! Waiting for the peer (accept on the host, connect on the client) happens
//! in async tasks that can be cancelled through a stop signal.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::error::{TransportError, TransportResult};

/// Bind a non-blocking listening socket on `addr`.
///
/// The returned listener must be registered with a tokio runtime (via
/// [`TcpListener::from_std`]) before accepting.
pub fn bind_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Resolve when `stop` flips to `true` or its sender goes away.
pub async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

fn progress_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Wait for exactly one inbound connection.
///
/// Returns `Ok(None)` if stopped before a peer arrived. The listener is
/// consumed, so no second peer can ever be accepted.
pub async fn accept_peer(
    listener: TcpListener,
    progress_interval: Duration,
    stop: &mut watch::Receiver<bool>,
) -> TransportResult<Option<(TcpStream, SocketAddr)>> {
    let local = listener.local_addr()?;
    let started = Instant::now();
    let mut ticker = progress_ticker(progress_interval);

    loop {
        tokio::select! {
            biased;
            _ = wait_for_stop(stop) => {
                debug!(%local, "accept cancelled");
                return Ok(None);
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(%peer, "failed to set TCP_NODELAY: {}", e);
                }
                info!(%peer, "client connected");
                return Ok(Some((stream, peer)));
            }
            _ = ticker.tick() => {
                info!(
                    port = local.port(),
                    waited_secs = started.elapsed().as_secs(),
                    "waiting for client connection"
                );
            }
        }
    }
}

/// Resolve `host:port` to the first usable address.
pub async fn resolve(host: &str, port: u16) -> TransportResult<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| TransportError::InvalidAddress(host.to_string()))?
        .next()
        .ok_or_else(|| TransportError::InvalidAddress(host.to_string()))
}

/// Connect to the host, giving up after `timeout`.
///
/// A refused or reset connection fails immediately; only a connect that is
/// still in flight keeps waiting. Returns `Ok(None)` if stopped first.
pub async fn connect_peer(
    addr: SocketAddr,
    timeout: Duration,
    progress_interval: Duration,
    stop: &mut watch::Receiver<bool>,
) -> TransportResult<Option<TcpStream>> {
    let connect = TcpStream::connect(addr);
    await_connect(addr, connect, timeout, progress_interval, stop).await
}

async fn await_connect<F>(
    addr: SocketAddr,
    connect: F,
    timeout: Duration,
    progress_interval: Duration,
    stop: &mut watch::Receiver<bool>,
) -> TransportResult<Option<TcpStream>>
where
    F: Future<Output = io::Result<TcpStream>>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut ticker = progress_ticker(progress_interval);
    tokio::pin!(connect);

    loop {
        tokio::select! {
            biased;
            _ = wait_for_stop(stop) => {
                debug!(%addr, "connect cancelled");
                return Ok(None);
            }
            result = &mut connect => {
                let stream = result?;
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(%addr, "failed to set TCP_NODELAY: {}", e);
                }
                info!(%addr, "connected to host");
                return Ok(Some(stream));
            }
            _ = tokio::time::sleep_until(deadline) => {
                warn!(%addr, ?timeout, "connect timed out");
                return Err(TransportError::ConnectTimeout(timeout));
            }
            _ = ticker.tick() => {
                info!(
                    %addr,
                    waited_secs = started.elapsed().as_secs(),
                    "still connecting"
                );
            }
        }
    }
}

/// Outward-facing IPv4 address of this machine, for display to players.
///
/// Uses a connected UDP socket to let the OS pick the route; no packet is
/// sent. Returns `None` when there is no route.
pub fn local_ip_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn test_accept_and_connect() {
        let listener = TcpListener::from_std(bind_listener(loopback()).unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (_tx, mut host_stop) = watch::channel(false);
        let (_tx2, mut client_stop) = watch::channel(false);

        let host = tokio::spawn(async move {
            accept_peer(listener, Duration::from_secs(5), &mut host_stop).await
        });
        let client = connect_peer(
            addr,
            Duration::from_secs(5),
            Duration::from_secs(5),
            &mut client_stop,
        )
        .await
        .unwrap();

        assert!(client.is_some());
        let (_, peer) = host.await.unwrap().unwrap().unwrap();
        assert_eq!(peer.ip(), addr.ip());
    }

    #[tokio::test]
    async fn test_accept_cancelled() {
        let listener = TcpListener::from_std(bind_listener(loopback()).unwrap()).unwrap();
        let (tx, mut stop) = watch::channel(false);

        let poll = Duration::from_millis(10);
        let waiter = tokio::spawn(async move {
            accept_peer(listener, poll, &mut stop).await
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        assert!(waiter.await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_refused_fails_fast() {
        // Bind then drop to get a port nobody listens on.
        let port = std::net::TcpListener::bind(loopback())
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let (_tx, mut stop) = watch::channel(false);

        let (timeout, progress) = (Duration::from_secs(30), Duration::from_secs(5));
        let started = std::time::Instant::now();
        let result = connect_peer(addr, timeout, progress, &mut stop).await;
        assert!(matches!(result, Err(TransportError::Io(_))));
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_connect_times_out_while_in_flight() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 9));
        let (_tx, mut stop) = watch::channel(false);
        let timeout = Duration::from_millis(50);

        let started = std::time::Instant::now();
        let result = await_connect(
            addr,
            std::future::pending(),
            timeout,
            Duration::from_millis(10),
            &mut stop,
        )
        .await;
        match result {
            Err(TransportError::ConnectTimeout(waited)) => assert_eq!(waited, timeout),
            other => panic!("expected a connect timeout, got {other:?}"),
        }
        assert!(started.elapsed() >= timeout);
    }

    #[tokio::test]
    async fn test_connect_cancelled_while_in_flight() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 9));
        let (tx, mut stop) = watch::channel(false);
        tx.send(true).unwrap();

        let result = await_connect(
            addr,
            std::future::pending(),
            Duration::from_secs(30),
            Duration::from_secs(5),
            &mut stop,
        )
        .await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_resolve_literal() {
        let addr = resolve("127.0.0.1", 4000).await.unwrap();
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 4000)));
    }

    #[test]
    fn test_local_ip_is_specified() {
        if let Some(ip) = local_ip_address() {
            assert!(!ip.is_unspecified());
        }
    }
}
