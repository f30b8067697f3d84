//! Keep-alive scheduler
//!
//! The firmware leaves SDK mode after a period without commands. The
//! scheduler submits a neutral command through the shared [`CommandChannel`]
//! every interval; the first tick fires immediately, which also puts the
//! device into SDK mode at session start.

use super::channel::CommandChannel;
use crate::error::SessionError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periodically sends the keep-alive command
pub struct KeepAliveScheduler {
    channel: Arc<CommandChannel>,
    period: Duration,
    command: String,
    cancel: CancellationToken,
}

impl KeepAliveScheduler {
    /// Create a new scheduler
    pub fn new(
        channel: Arc<CommandChannel>,
        period: Duration,
        command: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            channel,
            period,
            command: command.into(),
            cancel,
        }
    }

    /// Tick until cancelled
    pub async fn run(self) {
        info!(period = ?self.period, command = %self.command, "Keep-alive started");

        let mut ticker = interval(self.period);
        // A tick can take up to the response timeout; don't burst afterwards
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.channel.send(&self.command).await {
                Ok(response) => {
                    debug!(response = %response, "Keep-alive acknowledged");
                }
                Err(SessionError::SessionClosed) => break,
                Err(e @ SessionError::CommandTimeout { .. }) => {
                    warn!(error = %e, "Keep-alive unanswered");
                }
                Err(e) => {
                    warn!(error = ?e, "Keep-alive failed");
                }
            }
        }

        info!("Keep-alive terminated");
    }
}
