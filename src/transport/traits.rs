//! Datagram transport abstraction for pluggable socket backends

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;

/// A bound datagram endpoint that can receive and send whole datagrams
///
/// Both methods take `&self` so one endpoint can be shared between a
/// receiving listener task and a sending command channel.
#[async_trait]
pub trait DatagramSocket: Send + Sync + 'static {
    /// Wait for the next datagram, returning its length and sender
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Send one datagram to `target`
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Address this endpoint is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}
