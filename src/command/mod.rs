//! Command submission
//!
//! This module handles:
//! - Serialized command/response exchange over the command socket
//! - The single-slot response holder and its listener
//! - Periodic keep-alive traffic

mod channel;
mod keepalive;
mod response;

pub use channel::CommandChannel;
pub use keepalive::KeepAliveScheduler;
pub use response::{ResponseListener, ResponseSlot};
