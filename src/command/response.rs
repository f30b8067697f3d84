//! Response slot and listener
//!
//! The device answers each command with one text datagram on the command
//! socket. The latest answer lives in a single [`ResponseSlot`]; the
//! [`ResponseListener`] is its only writer.

use crate::error::{Result, SessionError};
use crate::transport::{self, DatagramSocket};
use std::sync::Arc;
use tello_shared::codec;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Single latest-response holder with change notification
#[derive(Debug, Clone)]
pub struct ResponseSlot {
    inner: Arc<watch::Sender<Option<String>>>,
}

impl Default for ResponseSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSlot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    /// Store a response and wake any waiter
    pub fn publish(&self, response: String) {
        self.inner.send_replace(Some(response));
    }

    /// Empty the slot and return a receiver that sees only later responses
    pub fn clear(&self) -> watch::Receiver<Option<String>> {
        let rx = self.inner.subscribe();
        self.inner.send_replace(None);
        rx
    }

    /// Most recent response, if any
    pub fn latest(&self) -> Option<String> {
        self.inner.borrow().clone()
    }
}

/// Receives responses on the command socket
pub struct ResponseListener {
    socket: Arc<dyn DatagramSocket>,
    slot: ResponseSlot,
    cancel: CancellationToken,
    buffer_size: usize,
}

impl ResponseListener {
    pub fn new(
        socket: Arc<dyn DatagramSocket>,
        slot: ResponseSlot,
        buffer_size: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            socket,
            slot,
            cancel,
            buffer_size,
        }
    }

    /// Decode one datagram and publish it to the slot
    pub fn handle_datagram(&self, datagram: &[u8]) -> Result<()> {
        let response = codec::decode_response(datagram).map_err(SessionError::ResponseDecode)?;
        self.slot.publish(response);
        Ok(())
    }

    /// Receive until cancelled
    pub async fn run(self) {
        let addr = self.socket.local_addr().ok();
        info!(?addr, transport = self.socket.name(), "Response listener started");

        let mut buf = vec![0u8; self.buffer_size];

        loop {
            let result =
                match transport::recv_or_cancel(self.socket.as_ref(), &mut buf, &self.cancel)
                    .await
                {
                    Some(result) => result,
                    None => break,
                };

            match result {
                Ok((n, from)) => match self.handle_datagram(&buf[..n]) {
                    Ok(()) => {
                        debug!(%from, response = %String::from_utf8_lossy(&buf[..n]), "Response received");
                    }
                    Err(e) => {
                        warn!(%from, error = ?e, bytes = n, "Discarding undecodable response");
                    }
                },
                Err(source) => {
                    let e = SessionError::SocketIo {
                        role: "command",
                        source,
                    };
                    warn!(error = ?e, "Response receive failed");
                    if !transport::backoff_or_cancel(&self.cancel).await {
                        break;
                    }
                }
            }
        }

        info!(?addr, "Response listener terminated");
    }
}
