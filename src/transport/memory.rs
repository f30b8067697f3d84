//! In-memory datagram transport
//!
//! A [`MemorySocket`] behaves like a bound UDP socket; its paired
//! [`MemoryPeer`] plays the remote side: it injects datagrams the socket
//! will receive and observes every datagram the socket sends. Used to run
//! a session without a device or network.

use crate::transport::traits::DatagramSocket;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::net::SocketAddr;
use tokio::sync::{mpsc, Mutex};

/// A datagram and the address it was sent from or to
pub type Datagram = (Bytes, SocketAddr);

/// Socket side of an in-memory pair
#[derive(Debug)]
pub struct MemorySocket {
    local: SocketAddr,
    inbound: Mutex<mpsc::UnboundedReceiver<Datagram>>,
    outbound: mpsc::UnboundedSender<Datagram>,
}

/// Remote side of an in-memory pair
#[derive(Debug)]
pub struct MemoryPeer {
    inject_tx: mpsc::UnboundedSender<Datagram>,
    sent_rx: Mutex<mpsc::UnboundedReceiver<Datagram>>,
}

/// Create a socket bound to `local` together with its peer
pub fn memory_pair(local: SocketAddr) -> (MemorySocket, MemoryPeer) {
    let (inject_tx, inbound) = mpsc::unbounded_channel();
    let (outbound, sent_rx) = mpsc::unbounded_channel();

    let socket = MemorySocket {
        local,
        inbound: Mutex::new(inbound),
        outbound,
    };
    let peer = MemoryPeer {
        inject_tx,
        sent_rx: Mutex::new(sent_rx),
    };
    (socket, peer)
}

impl MemoryPeer {
    /// Deliver a datagram to the socket as if sent from `from`
    ///
    /// Returns false once the socket has been dropped.
    pub fn inject(&self, from: SocketAddr, data: impl AsRef<[u8]>) -> bool {
        self.inject_tx
            .send((Bytes::copy_from_slice(data.as_ref()), from))
            .is_ok()
    }

    /// Wait for the next datagram the socket sends
    ///
    /// Returns `None` once the socket has been dropped and everything it
    /// sent has been drained.
    pub async fn next_sent(&self) -> Option<Datagram> {
        self.sent_rx.lock().await.recv().await
    }

    /// Take a sent datagram if one is already queued
    pub fn try_next_sent(&self) -> Option<Datagram> {
        self.sent_rx.try_lock().ok()?.try_recv().ok()
    }

    /// Whether the socket side still exists
    pub fn is_socket_open(&self) -> bool {
        !self.inject_tx.is_closed()
    }
}

#[async_trait]
impl DatagramSocket for MemorySocket {
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let (data, from) = self.inbound.lock().await.recv().await.ok_or_else(|| {
            io::Error::new(io::ErrorKind::ConnectionAborted, "memory peer dropped")
        })?;

        // Excess bytes are discarded, like a short UDP receive buffer
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok((n, from))
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.outbound
            .send((Bytes::copy_from_slice(buf), target))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "memory peer dropped"))?;
        Ok(buf.len())
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.local)
    }

    fn name(&self) -> &'static str {
        "Memory"
    }
}
