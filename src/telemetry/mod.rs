//! Telemetry ingestion
//!
//! The state socket receives one status datagram per ~100 ms from the
//! device. [`StateListener`] is the only writer of the published snapshot.

mod listener;

pub use listener::{StateListener, TelemetryState};
