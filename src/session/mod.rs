//! Session lifecycle
//!
//! A [`Session`] composes the transport, both listeners, the command
//! channel and the keep-alive scheduler, and is the only object
//! collaborators (UI, video, recording) talk to.

mod config;
mod manager;

pub use config::{SessionConfig, VideoGeometry};
pub use manager::Session;
