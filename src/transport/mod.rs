pub mod memory;
pub mod traits;
pub mod udp;

pub use memory::{memory_pair, MemoryPeer, MemorySocket};
pub use traits::DatagramSocket;
pub use udp::UdpTransport;

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pause after a failed receive before trying again
pub const IO_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Receive one datagram unless `cancel` fires first
///
/// Returns `None` when cancelled. Cancellation is checked before the
/// receive so an already-signalled shutdown never waits on the socket.
pub(crate) async fn recv_or_cancel(
    socket: &dyn DatagramSocket,
    buf: &mut [u8],
    cancel: &CancellationToken,
) -> Option<io::Result<(usize, SocketAddr)>> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = socket.recv_from(buf) => Some(result),
    }
}

/// Sleep for [`IO_ERROR_BACKOFF`]; returns false if cancelled meanwhile
pub(crate) async fn backoff_or_cancel(cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(IO_ERROR_BACKOFF) => true,
    }
}
