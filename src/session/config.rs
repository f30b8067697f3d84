//! Session configuration

use crate::error::{Result, SessionError};
use std::net::SocketAddr;
use std::time::Duration;
use tello_shared::{codec, protocol};

/// Geometry of the device's video stream, passed through for the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoGeometry {
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for VideoGeometry {
    fn default() -> Self {
        Self {
            frame_rate: protocol::FRAME_RATE,
            width: protocol::FRAME_WIDTH,
            height: protocol::FRAME_HEIGHT,
        }
    }
}

/// Configuration for a session, fixed at start
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Local address receiving telemetry
    pub state_addr: SocketAddr,
    /// Local address of the command socket
    pub command_addr: SocketAddr,
    /// Device command endpoint
    pub device_addr: SocketAddr,
    /// Video stream locator (opaque; used by the video collaborator)
    pub video_stream: String,
    /// How long a command waits for its response
    pub response_timeout: Duration,
    /// Period of the keep-alive command
    pub keepalive_interval: Duration,
    /// Neutral command sent by the keep-alive scheduler
    pub keepalive_command: String,
    /// Video frame geometry (opaque)
    pub video: VideoGeometry,
    /// Receive buffer per datagram
    pub recv_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_addr: SocketAddr::from(([0, 0, 0, 0], protocol::STATE_PORT)),
            command_addr: SocketAddr::from(([0, 0, 0, 0], protocol::COMMAND_PORT)),
            device_addr: SocketAddr::from((protocol::DEVICE_IP, protocol::COMMAND_PORT)),
            video_stream: protocol::VIDEO_STREAM.into(),
            response_timeout: Duration::from_millis(protocol::RESPONSE_TIMEOUT_MS),
            keepalive_interval: Duration::from_millis(protocol::KEEPALIVE_INTERVAL_MS),
            keepalive_command: protocol::KEEPALIVE_COMMAND.into(),
            video: VideoGeometry::default(),
            recv_buffer_size: protocol::MAX_DATAGRAM_SIZE,
        }
    }
}

impl SessionConfig {
    /// Reject settings the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.response_timeout.is_zero() {
            return Err(SessionError::invalid_config("response_timeout must be non-zero"));
        }
        if self.keepalive_interval.is_zero() {
            return Err(SessionError::invalid_config("keepalive_interval must be non-zero"));
        }
        if self.recv_buffer_size == 0 {
            return Err(SessionError::invalid_config("recv_buffer_size must be non-zero"));
        }
        codec::validate_command(&self.keepalive_command).map_err(|e| {
            SessionError::invalid_config(format!("keepalive_command: {}", e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.state_addr.port(), 8890);
        assert_eq!(config.command_addr.port(), 8889);
        assert_eq!(config.device_addr, "192.168.10.1:8889".parse().unwrap());
        assert_eq!(config.video_stream, "udp://@0.0.0.0:11111");
        assert_eq!(config.response_timeout, Duration::from_millis(2000));
        assert_eq!(config.keepalive_interval, Duration::from_secs(10));
        assert_eq!(config.keepalive_command, "command");
        assert_eq!(
            config.video,
            VideoGeometry {
                frame_rate: 30,
                width: 960,
                height: 720
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = SessionConfig {
            response_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SessionError::InvalidConfig { .. })
        ));

        let config = SessionConfig {
            keepalive_command: "cömmand".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
