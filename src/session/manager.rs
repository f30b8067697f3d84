//! Session - owns the sockets and background tasks for one device

use super::config::{SessionConfig, VideoGeometry};
use crate::command::{CommandChannel, KeepAliveScheduler, ResponseListener, ResponseSlot};
use crate::error::{Result, SessionError};
use crate::telemetry::{StateListener, TelemetryState};
use crate::transport::{DatagramSocket, UdpTransport};
use futures::future::join_all;
use std::net::SocketAddr;
use std::sync::Arc;
use tello_shared::{Command, SessionEvent, SessionState, SessionStateMachine, TransitionResult};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A live connection to one device
///
/// Created already running by [`Session::start`]; stopped by
/// [`Session::close`]. All methods take `&self`, so a session can be shared
/// between tasks behind an `Arc`.
pub struct Session {
    config: SessionConfig,
    state_local: SocketAddr,
    command_local: SocketAddr,
    channel: Arc<CommandChannel>,
    responses: ResponseSlot,
    telemetry: watch::Receiver<TelemetryState>,
    lifecycle: watch::Sender<SessionStateMachine>,
    cancel: CancellationToken,
    /// Handles are taken as each task is joined; the lock is held for the
    /// whole join so concurrent closes wait for it
    tasks: Mutex<Vec<(&'static str, Option<JoinHandle<()>>)>>,
}

impl Session {
    /// Bind both UDP sockets and start the session
    pub async fn start(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let state_socket =
            UdpTransport::bind(config.state_addr)
                .await
                .map_err(|source| SessionError::SocketBind {
                    role: "state",
                    addr: config.state_addr,
                    source,
                })?;
        let command_socket =
            UdpTransport::bind(config.command_addr)
                .await
                .map_err(|source| SessionError::SocketBind {
                    role: "command",
                    addr: config.command_addr,
                    source,
                })?;

        Self::start_with(config, Arc::new(state_socket), Arc::new(command_socket))
    }

    /// Start the session on already-bound transports
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_with(
        config: SessionConfig,
        state_socket: Arc<dyn DatagramSocket>,
        command_socket: Arc<dyn DatagramSocket>,
    ) -> Result<Self> {
        config.validate()?;

        let state_local = state_socket.local_addr().unwrap_or(config.state_addr);
        let command_local = command_socket.local_addr().unwrap_or(config.command_addr);

        let cancel = CancellationToken::new();
        let responses = ResponseSlot::new();
        let (lifecycle, _) = watch::channel(SessionStateMachine::new());

        let (state_listener, telemetry) =
            StateListener::new(state_socket, config.recv_buffer_size, cancel.clone());
        let response_listener = ResponseListener::new(
            command_socket.clone(),
            responses.clone(),
            config.recv_buffer_size,
            cancel.clone(),
        );
        let channel = Arc::new(CommandChannel::new(
            command_socket,
            config.device_addr,
            config.response_timeout,
            responses.clone(),
            cancel.clone(),
        ));
        let keepalive = KeepAliveScheduler::new(
            channel.clone(),
            config.keepalive_interval,
            config.keepalive_command.clone(),
            cancel.clone(),
        );

        let tasks = vec![
            ("state-listener", Some(tokio::spawn(state_listener.run()))),
            ("response-listener", Some(tokio::spawn(response_listener.run()))),
            ("keep-alive", Some(tokio::spawn(keepalive.run()))),
        ];

        let session = Self {
            config,
            state_local,
            command_local,
            channel,
            responses,
            telemetry,
            lifecycle,
            cancel,
            tasks: Mutex::new(tasks),
        };
        session.transition(SessionEvent::TasksStarted);

        info!(
            state = %session.state_local,
            command = %session.command_local,
            device = %session.config.device_addr,
            "Session started"
        );
        Ok(session)
    }

    /// Latest telemetry snapshot; `None` before the first datagram
    pub fn get_state(&self) -> TelemetryState {
        self.telemetry.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe_telemetry(&self) -> watch::Receiver<TelemetryState> {
        self.telemetry.clone()
    }

    /// Most recent raw response text; cleared when a command is sent
    pub fn get_last_response(&self) -> Option<String> {
        self.responses.latest()
    }

    /// Send a command and wait for the device's response
    ///
    /// Serialized with every other submission, including keep-alive.
    pub async fn send_command(&self, command: &str) -> Result<String> {
        if !self.lifecycle().accepts_commands() {
            return Err(SessionError::SessionClosed);
        }
        self.channel.send(command).await
    }

    /// Validate a typed command and send it
    pub async fn send(&self, command: &Command) -> Result<String> {
        command.validate().map_err(SessionError::InvalidCommand)?;
        self.send_command(&command.to_string()).await
    }

    /// Ask the device to start streaming video
    ///
    /// Returns the locator the video collaborator should open once the
    /// device has acknowledged.
    pub async fn start_video_stream(&self) -> Result<&str> {
        self.send_acknowledged(&Command::StreamOn).await?;
        Ok(self.video_stream())
    }

    /// Ask the device to stop streaming video
    ///
    /// Returns the locator that no longer receives frames.
    pub async fn stop_video_stream(&self) -> Result<&str> {
        self.send_acknowledged(&Command::StreamOff).await?;
        Ok(self.video_stream())
    }

    async fn send_acknowledged(&self, command: &Command) -> Result<()> {
        let response = self.send(command).await?;
        if response.trim() != "ok" {
            return Err(SessionError::CommandRejected {
                command: command.to_string(),
                response,
            });
        }
        Ok(())
    }

    /// Stop all tasks and close both sockets
    ///
    /// Returns once every task has terminated. A concurrent call waits for
    /// the close in progress; a call after an interrupted close finishes it.
    pub async fn close(&self) {
        match self.transition(SessionEvent::CloseRequested) {
            TransitionResult::Success(_) => info!("Closing session"),
            TransitionResult::Invalid {
                from: SessionState::Closed,
                ..
            } => return,
            TransitionResult::Invalid { from, .. } => {
                debug!(state = %from, "Close already requested; finishing it");
            }
        }

        self.cancel.cancel();
        self.channel.shutdown().await;

        let mut tasks = self.tasks.lock().await;
        let joined = join_all(tasks.iter_mut().map(|(name, slot)| async move {
            let handle = slot.as_mut()?;
            let result = handle.await;
            *slot = None;
            Some((*name, result))
        }))
        .await;

        for (name, result) in joined.into_iter().flatten() {
            match result {
                Ok(()) => debug!(task = name, "Task joined"),
                Err(e) => error!(task = name, error = %e, "Task ended abnormally"),
            }
        }
        tasks.clear();

        if self.transition(SessionEvent::TasksTerminated).is_success() {
            info!("Session closed");
        }
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> SessionState {
        self.lifecycle.borrow().state()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Video stream locator for the video collaborator
    pub fn video_stream(&self) -> &str {
        &self.config.video_stream
    }

    pub fn video_geometry(&self) -> VideoGeometry {
        self.config.video
    }

    /// Address the state socket is bound to
    pub fn state_local_addr(&self) -> SocketAddr {
        self.state_local
    }

    /// Address the command socket is bound to
    pub fn command_local_addr(&self) -> SocketAddr {
        self.command_local
    }

    fn transition(&self, event: SessionEvent) -> TransitionResult {
        let mut result = TransitionResult::Invalid {
            from: self.lifecycle(),
            event,
        };
        self.lifecycle.send_if_modified(|fsm| {
            result = fsm.process_event(event);
            result.is_success()
        });

        if let TransitionResult::Success(state) = &result {
            let transitions = self.lifecycle.borrow().transitions();
            debug!(?event, state = %state, transitions, "Session state changed");
        }
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            warn!("Session dropped without close; cancelling tasks");
            self.cancel.cancel();
        }
    }
}
