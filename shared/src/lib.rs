//! Tello Shared Protocol Types
//!
//! This crate provides the protocol-level types and codec for the Tello
//! text protocol: telemetry snapshots, command encoding, response decoding
//! and the session lifecycle state machine. It has no runtime dependency
//! so collaborators (UI, recorders) can use it without pulling in tokio.

pub mod codec;
pub mod command;
pub mod state_machine;
pub mod telemetry;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use codec::CodecError;
pub use command::Command;
pub use state_machine::{SessionEvent, SessionState, SessionStateMachine, TransitionResult};
pub use telemetry::{TelemetryAlert, TelemetryField, TelemetryLimits, TelemetrySnapshot};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Fixed parameters of the device protocol
pub mod protocol {
    /// Local UDP port the device broadcasts telemetry to
    pub const STATE_PORT: u16 = 8890;

    /// UDP port used for commands on both ends
    pub const COMMAND_PORT: u16 = 8889;

    /// Address of the device on its own access point
    pub const DEVICE_IP: [u8; 4] = [192, 168, 10, 1];

    /// Locator of the device's H.264 video stream
    pub const VIDEO_STREAM: &str = "udp://@0.0.0.0:11111";

    /// How long to wait for a command response
    pub const RESPONSE_TIMEOUT_MS: u64 = 2000;

    /// Keep-alive period; the firmware drops SDK mode after ~15 s of silence
    pub const KEEPALIVE_INTERVAL_MS: u64 = 10_000;

    /// Neutral command used for keep-alive (also enters SDK mode)
    pub const KEEPALIVE_COMMAND: &str = "command";

    /// Largest datagram the device sends
    pub const MAX_DATAGRAM_SIZE: usize = 1024;

    pub const FRAME_RATE: u32 = 30;
    pub const FRAME_WIDTH: u32 = 960;
    pub const FRAME_HEIGHT: u32 = 720;
}

/// Warning thresholds used when presenting telemetry
pub mod limits {
    /// Battery percentage below which the pilot should land
    pub const BATTERY_LOW_PERCENT: u8 = 20;

    /// Highest acceptable reading for the low temperature sensor (°C)
    pub const TEMPERATURE_LOW_MAX: i64 = 80;

    /// Highest acceptable reading for the high temperature sensor (°C)
    pub const TEMPERATURE_HIGH_MAX: i64 = 80;
}
