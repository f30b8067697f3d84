//! Command channel - serialized command/response exchange
//!
//! The wire protocol carries no correlation identifier, so a response can
//! only be attributed to a command if exactly one command is outstanding.
//! Every submission (user or keep-alive) holds the send lock for the whole
//! exchange: clear slot -> send -> wait -> read/timeout -> release.

use super::response::ResponseSlot;
use crate::error::{Result, SessionError};
use crate::transport::DatagramSocket;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tello_shared::codec;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sends commands to the device and waits for their responses
pub struct CommandChannel {
    /// Send half of the command socket; the mutex is the send lock.
    /// `None` once the channel has been shut down.
    send_path: Mutex<Option<Arc<dyn DatagramSocket>>>,
    device_addr: SocketAddr,
    response_timeout: Duration,
    slot: ResponseSlot,
    cancel: CancellationToken,
}

impl CommandChannel {
    /// Create a new command channel
    pub fn new(
        socket: Arc<dyn DatagramSocket>,
        device_addr: SocketAddr,
        response_timeout: Duration,
        slot: ResponseSlot,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            send_path: Mutex::new(Some(socket)),
            device_addr,
            response_timeout,
            slot,
            cancel,
        }
    }

    /// Whether shutdown has been signalled
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Send a command and wait for its response
    ///
    /// Fails fast with [`SessionError::SessionClosed`] after shutdown and
    /// with [`SessionError::InvalidCommand`] before any I/O. A response
    /// arriving after the timeout is not attributed to this command.
    pub async fn send(&self, command: &str) -> Result<String> {
        if self.is_closed() {
            return Err(SessionError::SessionClosed);
        }
        let datagram = codec::encode_command(command).map_err(SessionError::InvalidCommand)?;

        let guard = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SessionError::SessionClosed),
            guard = self.send_path.lock() => guard,
        };
        let socket = match guard.as_ref() {
            Some(socket) if !self.is_closed() => socket,
            _ => return Err(SessionError::SessionClosed),
        };

        let mut response_rx = self.slot.clear();

        debug!(command, device = %self.device_addr, "Sending command");
        if let Err(source) = socket.send_to(&datagram, self.device_addr).await {
            warn!(command, error = %source, "Command send failed");
            return Err(SessionError::CommandSend {
                command: command.to_string(),
                source,
            });
        }

        let started = Instant::now();
        let waited = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SessionError::SessionClosed),
            waited = timeout(self.response_timeout, async {
                response_rx.wait_for(Option::is_some).await.map(|r| r.clone())
            }) => waited,
        };

        match waited {
            Ok(Ok(Some(response))) => {
                debug!(command, response = %response, elapsed = ?started.elapsed(), "Command answered");
                Ok(response)
            }
            // The slot owner went away mid-wait
            Ok(Ok(None)) | Ok(Err(_)) => Err(SessionError::SessionClosed),
            Err(_) => {
                warn!(command, timeout = ?self.response_timeout, "Device did not respond");
                Err(SessionError::CommandTimeout {
                    command: command.to_string(),
                    timeout: self.response_timeout,
                })
            }
        }
    }

    /// Release the send half of the socket
    ///
    /// Call after the shutdown token is cancelled; any in-flight
    /// [`send`](Self::send) returns promptly and frees the lock.
    pub async fn shutdown(&self) {
        if self.send_path.lock().await.take().is_some() {
            info!(device = %self.device_addr, "Command channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{memory_pair, MemoryPeer};

    const TIMEOUT: Duration = Duration::from_millis(2000);

    fn device() -> SocketAddr {
        SocketAddr::from(([192, 168, 10, 1], 8889))
    }

    fn channel() -> (Arc<CommandChannel>, MemoryPeer, ResponseSlot, CancellationToken) {
        let (socket, peer) = memory_pair(SocketAddr::from(([0, 0, 0, 0], 8889)));
        let slot = ResponseSlot::new();
        let cancel = CancellationToken::new();
        let channel = CommandChannel::new(
            Arc::new(socket),
            device(),
            TIMEOUT,
            slot.clone(),
            cancel.clone(),
        );
        (Arc::new(channel), peer, slot, cancel)
    }

    #[tokio::test]
    async fn test_response_is_returned() {
        let (channel, peer, slot, _cancel) = channel();

        let device_side = async {
            let (data, target) = peer.next_sent().await.unwrap();
            assert_eq!(&data[..], b"takeoff");
            assert_eq!(target, device());
            tokio::time::sleep(Duration::from_millis(50)).await;
            slot.publish("ok".into());
        };

        let (result, ()) = tokio::join!(channel.send("takeoff"), device_side);
        assert_eq!(result.unwrap(), "ok");

        // The lock is free again
        assert!(channel.send_path.try_lock().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_response() {
        let (channel, peer, slot, _cancel) = channel();

        let started = Instant::now();
        let err = channel.send("takeoff").await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, SessionError::CommandTimeout { .. }));
        assert!(elapsed >= TIMEOUT);
        assert!(elapsed < TIMEOUT + Duration::from_millis(100));
        assert!(slot.latest().is_none());
        assert_eq!(&peer.try_next_sent().unwrap().0[..], b"takeoff");
    }

    #[tokio::test]
    async fn test_stale_response_is_cleared_before_send() {
        let (channel, _peer, slot, _cancel) = channel();
        slot.publish("error".into());

        let sending = channel.send("land");
        let answer = async {
            tokio::task::yield_now().await;
            slot.publish("ok".into());
        };
        let (result, ()) = tokio::join!(sending, answer);
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_send_failure_returns_immediately() {
        let (channel, peer, _slot, _cancel) = channel();
        drop(peer);

        let started = Instant::now();
        let err = channel.send("takeoff").await.unwrap_err();
        assert!(matches!(err, SessionError::CommandSend { .. }));
        assert!(started.elapsed() < TIMEOUT);
    }

    #[tokio::test]
    async fn test_invalid_command_is_not_sent() {
        let (channel, peer, _slot, _cancel) = channel();

        let err = channel.send("").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidCommand(_)));
        assert!(peer.try_next_sent().is_none());
    }

    #[tokio::test]
    async fn test_closed_channel_fails_fast() {
        let (channel, peer, _slot, cancel) = channel();
        cancel.cancel();
        channel.shutdown().await;

        let err = channel.send("takeoff").await.unwrap_err();
        assert!(matches!(err, SessionError::SessionClosed));
        assert!(peer.try_next_sent().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let (channel, _peer, _slot, cancel) = channel();

        let pending = tokio::spawn({
            let channel = channel.clone();
            async move { channel.send("takeoff").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(SessionError::SessionClosed)));
        channel.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sends_are_serialized() {
        let (channel, peer, slot, _cancel) = channel();

        let first = tokio::spawn({
            let channel = channel.clone();
            async move { channel.send("forward 50").await }
        });
        let (data, _) = peer.next_sent().await.unwrap();
        assert_eq!(&data[..], b"forward 50");

        let second = tokio::spawn({
            let channel = channel.clone();
            async move { channel.send("cw 30").await }
        });

        // The second command stays queued while the first is outstanding
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(peer.try_next_sent().is_none());

        slot.publish("ok".into());
        assert_eq!(first.await.unwrap().unwrap(), "ok");

        let (data, _) = peer.next_sent().await.unwrap();
        assert_eq!(&data[..], b"cw 30");
        slot.publish("ok".into());
        assert_eq!(second.await.unwrap().unwrap(), "ok");
    }
}
