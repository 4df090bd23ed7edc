// ── Controller abstraction ──
//
// Full lifecycle for one router: login, background polling, command
// routing, and snapshot streaming. This is the setup/poll/unload surface a
// host drives; the CLI is one such host.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cudy_api::{ActionResponse, LuciClient, SessionState};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::collect::collect_router_data;
use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::RouterConfig;
use crate::entity::{Entity, build_entities};
use crate::error::CoreError;
use crate::model::Snapshot;
use crate::stream::SnapshotStream;

const COMMAND_CHANNEL_SIZE: usize = 16;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
    /// Terminal: the controller was shut down.
    Unloaded,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: RouterConfig,
    connection_state: watch::Sender<ConnectionState>,
    snapshot: watch::Sender<Arc<Snapshot>>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    client: Mutex<Option<Arc<LuciClient>>>,
    /// Serialises polls so a manual refresh never overlaps the timer.
    poll_lock: Mutex<()>,
    poll_count: AtomicU64,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller. Does NOT connect; call [`connect()`](Self::connect).
    pub fn new(config: RouterConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::default()));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                connection_state,
                snapshot,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                client: Mutex::new(None),
                poll_lock: Mutex::new(()),
                poll_count: AtomicU64::new(0),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in, run the first poll, and start the background tasks.
    ///
    /// Bad credentials are [`CoreError::AuthenticationFailed`]; anything else
    /// that stops the login is [`CoreError::ConnectionFailed`].
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.state() == ConnectionState::Unloaded {
            return Err(CoreError::RouterDisconnected);
        }
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        let config = &self.inner.config;
        let base_url = config.base_url()?;
        let client = LuciClient::new(
            base_url.clone(),
            config.username.clone(),
            config.password.clone(),
            &config.transport(),
        )?;

        if let Err(e) = client.login().await {
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(match e {
                cudy_api::Error::Authentication { message } => {
                    CoreError::AuthenticationFailed { message }
                }
                other => CoreError::ConnectionFailed {
                    url: base_url.to_string(),
                    reason: other.to_string(),
                },
            });
        }
        info!(host = %base_url, "logged in to router");

        *self.inner.client.lock().await = Some(Arc::new(client));

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial poll failed");
        }

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx)));
        }

        let interval_secs = config.scan_interval_secs;
        if interval_secs > 0 {
            let ctrl = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(poll_task(ctrl, interval_secs, cancel)));
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        Ok(())
    }

    /// Shut down: stop background tasks and drop the session.
    ///
    /// The controller is unusable afterwards.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        if let Some(client) = self.inner.client.lock().await.take() {
            client.unload();
        }
        let _ = self.inner.connection_state.send(ConnectionState::Unloaded);
        debug!("controller unloaded");
    }

    /// Poll every enabled module and publish the result.
    ///
    /// A failed poll republishes the previous values with `available = false`
    /// and returns the error.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let client = self.client().await?;
        let _guard = self.inner.poll_lock.lock().await;

        match collect_router_data(&client, &self.inner.config).await {
            Ok(data) => {
                let count = self.inner.poll_count.fetch_add(1, Ordering::Relaxed) + 1;
                let snapshot = Arc::new(Snapshot::fresh(data, count));
                self.inner.snapshot.send_replace(snapshot.clone());
                debug!(polls = count, "poll complete");
                Ok(snapshot)
            }
            Err(e) => {
                error!(error = %e, "poll failed");
                let previous = self.inner.snapshot.borrow().clone();
                self.inner
                    .snapshot
                    .send_replace(Arc::new(Snapshot::failed(&previous, e.to_string())));
                Err(e)
            }
        }
    }

    async fn client(&self) -> Result<Arc<LuciClient>, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::RouterDisconnected)
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command through the command task and await its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if self.state() != ConnectionState::Connected {
            return Err(CoreError::RouterDisconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::RouterDisconnected)?;

        rx.await.map_err(|_| CoreError::RouterDisconnected)?
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// Connect, run `f`, disconnect. No background polling.
    pub async fn oneshot<F, Fut, T>(config: RouterConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.scan_interval_secs = 0;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        *self.inner.connection_state.borrow()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Session state of the underlying LuCI client, if connected.
    pub async fn session_state(&self) -> Option<SessionState> {
        self.inner
            .client
            .lock()
            .await
            .as_ref()
            .map(|c| c.session_state())
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.snapshot.subscribe())
    }

    /// Entities for the latest snapshot.
    pub fn entities(&self) -> Vec<Entity> {
        build_entities(&self.inner.config, &self.snapshot())
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Poll on the scan interval until cancelled.
async fn poll_task(controller: Controller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // the initial poll already ran in connect()

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh().await {
                    warn!(error = %e, "periodic poll failed");
                }
            }
        }
    }
}

/// Process commands from the mpsc channel.
async fn command_processor_task(controller: Controller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = controller.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&controller, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

/// Map a non-accepted reply to [`CoreError::Rejected`].
fn accepted(action: &str, response: &ActionResponse) -> Result<u16, CoreError> {
    if response.is_accepted() {
        Ok(response.status)
    } else {
        warn!(action, status = response.status, body = %response.body, "router rejected action");
        Err(CoreError::Rejected {
            action: action.to_owned(),
            status: response.status,
        })
    }
}

async fn route_command(controller: &Controller, cmd: Command) -> Result<CommandResult, CoreError> {
    if cmd == Command::Refresh {
        controller.refresh().await?;
        return Ok(CommandResult::Refreshed);
    }

    let client = controller.client().await?;
    let name = cmd.name();
    info!(action = name, "executing command");

    match cmd {
        Command::Reboot => {
            let status = accepted(name, &client.reboot().await?)?;
            Ok(CommandResult::Accepted { status })
        }
        Command::Restart5gConnection => {
            let status = accepted(name, &client.restart_5g_connection().await?)?;
            Ok(CommandResult::Accepted { status })
        }
        Command::SwitchBand { band } => {
            let status = accepted(name, &client.switch_band(&band).await?)?;
            Ok(CommandResult::Accepted { status })
        }
        Command::SendSms {
            phone_number,
            message,
        } => {
            let status = accepted(name, &client.send_sms(&phone_number, &message).await?)?;
            Ok(CommandResult::Accepted { status })
        }
        Command::SendAtCommand { command } => {
            let response = client.send_at(&command).await?;
            let status = accepted(name, &response)?;
            Ok(CommandResult::AtResponse {
                status,
                output: response.body,
            })
        }
        Command::RebootMeshNode { mac } => {
            let response = client.reboot_mesh_node(&mac).await?;
            Ok(CommandResult::Accepted {
                status: response.status,
            })
        }
        Command::SetMeshLed { mac, enabled } => {
            let response = client.set_mesh_led(&mac, enabled).await?;
            Ok(CommandResult::Accepted {
                status: response.status,
            })
        }
        Command::MeshLedState { mac } => {
            let enabled = client.mesh_led_state(&mac).await?;
            Ok(CommandResult::LedState { mac, enabled })
        }
        Command::Refresh => Ok(CommandResult::Refreshed),
    }
}
