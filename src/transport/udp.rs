//! UDP transport implementation for the device's command and state ports

use crate::transport::traits::DatagramSocket;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// UDP socket wrapper implementing DatagramSocket
#[derive(Debug)]
pub struct UdpTransport {
    inner: UdpSocket,
}

impl UdpTransport {
    /// Bind a new UDP socket on `addr`
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let inner = UdpSocket::bind(addr).await?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl DatagramSocket for UdpTransport {
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, target).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    fn name(&self) -> &'static str {
        "UDP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_loopback() {
        let a = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let b = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert_eq!(a.name(), "UDP");

        let b_addr = b.local_addr().unwrap();
        a.send_to(b"command", b_addr).await.unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"command");
        assert_eq!(from, a.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_bind_conflict_fails() {
        let a = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let taken = a.local_addr().unwrap();
        assert!(UdpTransport::bind(taken).await.is_err());
    }
}
