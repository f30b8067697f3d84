//! Tello Session Driver
//!
//! Client-side session layer for the Tello UDP protocol: telemetry
//! ingestion, serialized command/response exchange with timeout, and
//! keep-alive traffic, all owned by a [`Session`].
//!
//! ```no_run
//! use tello_link::{Session, SessionConfig};
//!
//! # async fn run() -> tello_link::Result<()> {
//! let session = Session::start(SessionConfig::default()).await?;
//! let response = session.send_command("takeoff").await?;
//! if let Some(state) = session.get_state() {
//!     println!("{} -> battery {:?}%", response, state.battery_percent());
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use error::{Result, SessionError};
pub use session::{Session, SessionConfig, VideoGeometry};
pub use telemetry::TelemetryState;
pub use tello_shared::{
    Command, SessionState, TelemetryAlert, TelemetryField, TelemetryLimits, TelemetrySnapshot,
};
