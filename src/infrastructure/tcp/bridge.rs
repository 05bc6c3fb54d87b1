//! Relay between the serial stream and one TCP client.
//!
//! The first client to connect keeps the session; further connections are
//! accepted and closed straight away until it leaves.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::core::broadcast::Broadcaster;
use crate::core::process::ProcessState;
use crate::domain::config::BridgeConfig;
use crate::domain::error::{SerconError, SerconResult};
use crate::infrastructure::serial::SerialLink;

const CLIENT_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Disabled,
    Listening(SocketAddr),
    Connected { local: SocketAddr, peer: SocketAddr },
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeState::Disabled => write!(f, "Bridge: Off"),
            BridgeState::Listening(addr) => write!(f, "Bridge: Listen {}", addr),
            BridgeState::Connected { peer, .. } => write!(f, "Bridge: Connect {}", peer),
        }
    }
}

/// How a client session ended
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    ClientLeft,
    Cancelled,
}

pub struct NetworkBridge {
    listener: TcpListener,
    local_addr: SocketAddr,
    broadcaster: Broadcaster,
    link: SerialLink,
    state: Arc<watch::Sender<BridgeState>>,
    poll_interval: Duration,
}

impl NetworkBridge {
    pub async fn bind(
        bind_addr: &str,
        broadcaster: Broadcaster,
        link: SerialLink,
        state: Arc<watch::Sender<BridgeState>>,
        poll_interval: Duration,
    ) -> SerconResult<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| SerconError::Bridge {
                message: format!("Failed to bind to {}: {}", bind_addr, e),
            })?;

        let local_addr = listener.local_addr().map_err(|e| SerconError::Bridge {
            message: format!("Failed to get local address: {}", e),
        })?;

        info!("Bridge listening on {}", local_addr);
        state.send_replace(BridgeState::Listening(local_addr));

        Ok(Self {
            listener,
            local_addr,
            broadcaster,
            link,
            state,
            poll_interval,
        })
    }

    /// Serve clients one at a time until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("Bridge client connected: {}", peer);
                        self.state.send_replace(BridgeState::Connected {
                            local: self.local_addr,
                            peer,
                        });

                        let end = self.serve(stream, peer, &cancel).await;
                        info!("Bridge client disconnected: {}", peer);
                        if end == SessionEnd::Cancelled {
                            break;
                        }
                        self.state.send_replace(BridgeState::Listening(self.local_addr));
                    }
                    Err(e) => {
                        warn!("Failed to accept bridge connection: {}", e);
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        self.state.send_replace(BridgeState::Disabled);
        info!("Bridge on {} stopped", self.local_addr);
    }

    async fn serve(&self, stream: TcpStream, peer: SocketAddr, cancel: &CancellationToken) -> SessionEnd {
        let mut subscriber = self.broadcaster.subscribe("bridge");
        let (mut reader, mut writer) = stream.into_split();
        let mut buffer = vec![0u8; CLIENT_BUFFER_SIZE];

        let end = loop {
            tokio::select! {
                _ = cancel.cancelled() => break SessionEnd::Cancelled,
                read = reader.read(&mut buffer) => match read {
                    Ok(0) => {
                        debug!("Bridge client {} closed the connection", peer);
                        break SessionEnd::ClientLeft;
                    }
                    Ok(n) => {
                        trace!("{} -> serial: {}", peer, hex::encode(&buffer[..n]));
                        if let Err(e) = self.link.write_bytes(&buffer[..n]) {
                            warn!("Failed to relay {} bytes from {} to serial: {}", n, peer, e);
                        }
                    }
                    Err(e) => {
                        warn!("Read error from bridge client {}: {}", peer, e);
                        break SessionEnd::ClientLeft;
                    }
                },
                chunk = subscriber.get(self.poll_interval) => match chunk {
                    Ok(Some(chunk)) => {
                        if let Err(e) = writer.write_all(&chunk).await {
                            warn!("Write error to bridge client {}: {}", peer, e);
                            break SessionEnd::ClientLeft;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("Bridge lost its subscription: {}", e);
                        break SessionEnd::ClientLeft;
                    }
                },
                extra = self.listener.accept() => {
                    if let Ok((_, other)) = extra {
                        warn!("Rejecting bridge client {}: {} is already connected", other, peer);
                    }
                }
            }
        };

        self.broadcaster.unsubscribe(subscriber.id());
        end
    }
}

struct ActiveBridge {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveBridge {
    /// Running and not asked to stop
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

/// Switches the bridge on and off at runtime.
///
/// Safe to call from blocking threads (the menu runs on one); the bridge
/// task itself lives on the runtime captured at construction.
#[derive(Clone)]
pub struct BridgeController {
    config: BridgeConfig,
    broadcaster: Broadcaster,
    link: SerialLink,
    process: ProcessState,
    runtime: Handle,
    poll_interval: Duration,
    state: Arc<watch::Sender<BridgeState>>,
    active: Arc<Mutex<Option<ActiveBridge>>>,
}

impl BridgeController {
    /// Must be called from within a tokio runtime
    pub fn new(
        config: BridgeConfig,
        broadcaster: Broadcaster,
        link: SerialLink,
        process: ProcessState,
        poll_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(BridgeState::Disabled);
        Self {
            config,
            broadcaster,
            link,
            process,
            runtime: Handle::current(),
            poll_interval,
            state: Arc::new(state),
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<BridgeState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> BridgeState {
        self.state.borrow().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().as_ref().map_or(false, ActiveBridge::is_live)
    }
    /// Start listening. Bind failures are logged and leave the bridge
    /// disabled; nothing else is affected.
    pub fn enable(&self) {
        let mut active = self.lock();
        if active.as_ref().map_or(false, ActiveBridge::is_live) {
            return;
        }
        // A bridge switched off but still closing its sockets.
        let previous = active.take().map(|stale| stale.task);

        let cancel = self.process.child_token();
        let bind_addr = self.config.bind_addr();
        let broadcaster = self.broadcaster.clone();
        let link = self.link.clone();
        let state = Arc::clone(&self.state);
        let poll_interval = self.poll_interval;
        let task_cancel = cancel.clone();

        let task = self.runtime.spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    warn!("Previous bridge task ended abnormally: {}", e);
                }
            }
            match NetworkBridge::bind(&bind_addr, broadcaster, link, Arc::clone(&state), poll_interval).await {
                Ok(bridge) => bridge.run(task_cancel).await,
                Err(e) => {
                    error!("Bridge disabled: {}", e);
                    state.send_replace(BridgeState::Disabled);
                }
            }
        });

        *active = Some(ActiveBridge { cancel, task });
    }

    /// Stop listening and drop any connected client
    pub fn disable(&self) {
        if let Some(active) = self.lock().as_ref() {
            active.cancel.cancel();
        }
    }

    /// Flip the bridge; returns whether it is now switched on
    pub fn toggle(&self) -> bool {
        if self.is_enabled() {
            self.disable();
            false
        } else {
            self.enable();
            true
        }
    }

    /// Stop the bridge and wait for its sockets to close
    pub async fn shutdown(&self) {
        let active = self.lock().take();
        if let Some(active) = active {
            active.cancel.cancel();
            if let Err(e) = active.task.await {
                warn!("Bridge task ended abnormally: {}", e);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActiveBridge>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
