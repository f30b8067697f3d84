//! Telemetry State Listener
//!
//! Owns the state socket, parses every datagram into a complete
//! [`TelemetrySnapshot`] and publishes it by replacing the previous one.
//! A malformed datagram never replaces a good snapshot.

use crate::error::{Result, SessionError};
use crate::transport::{self, DatagramSocket};
use std::sync::Arc;
use tello_shared::{codec, TelemetrySnapshot};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Latest published telemetry; `None` until the first good datagram
pub type TelemetryState = Option<Arc<TelemetrySnapshot>>;

/// Receives and publishes device telemetry
pub struct StateListener {
    socket: Arc<dyn DatagramSocket>,
    publisher: watch::Sender<TelemetryState>,
    cancel: CancellationToken,
    buffer_size: usize,
}

impl StateListener {
    /// Create a listener and the receiver readers use to see its snapshots
    pub fn new(
        socket: Arc<dyn DatagramSocket>,
        buffer_size: usize,
        cancel: CancellationToken,
    ) -> (Self, watch::Receiver<TelemetryState>) {
        let (publisher, receiver) = watch::channel(None);
        let listener = Self {
            socket,
            publisher,
            cancel,
            buffer_size,
        };
        (listener, receiver)
    }

    /// Parse one datagram and publish it if it is well formed
    pub fn handle_datagram(&self, datagram: &[u8]) -> Result<Arc<TelemetrySnapshot>> {
        let snapshot = codec::parse_telemetry(datagram)
            .map(Arc::new)
            .map_err(SessionError::TelemetryParse)?;

        self.publisher.send_replace(Some(snapshot.clone()));
        Ok(snapshot)
    }

    /// Receive until cancelled
    pub async fn run(self) {
        let addr = self.socket.local_addr().ok();
        info!(?addr, transport = self.socket.name(), "State listener started");

        let mut buf = vec![0u8; self.buffer_size];
        let mut received = 0u64;
        let mut rejected = 0u64;

        loop {
            let result =
                match transport::recv_or_cancel(self.socket.as_ref(), &mut buf, &self.cancel)
                    .await
                {
                    Some(result) => result,
                    None => break,
                };

            match result {
                Ok((n, from)) => {
                    received += 1;
                    match self.handle_datagram(&buf[..n]) {
                        Ok(snapshot) => {
                            trace!(%from, fields = snapshot.len(), "Telemetry published");
                        }
                        Err(e) => {
                            rejected += 1;
                            warn!(
                                %from,
                                error = ?e,
                                datagram = %String::from_utf8_lossy(&buf[..n]),
                                "Discarding malformed telemetry, keeping previous snapshot"
                            );
                        }
                    }
                }
                Err(source) => {
                    let e = SessionError::SocketIo {
                        role: "state",
                        source,
                    };
                    warn!(error = ?e, "Telemetry receive failed");
                    if !transport::backoff_or_cancel(&self.cancel).await {
                        break;
                    }
                }
            }
        }

        debug!(received, rejected, "State listener statistics");
        info!(?addr, "State listener terminated");
    }
}
