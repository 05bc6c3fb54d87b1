//! Starts every console loop, stops them all when any one ends, and
//! releases the device, sockets and screen in a fixed order.

use ratatui::{backend::Backend, Terminal};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::core::broadcast::Broadcaster;
use crate::core::input::{InputDispatcher, KeySource};
use crate::core::process::ProcessState;
use crate::domain::config::ConsoleConfig;
use crate::domain::error::SerconResult;
use crate::infrastructure::capture::CaptureSink;
use crate::infrastructure::serial::{SerialLink, SerialReader};
use crate::infrastructure::tcp::BridgeController;
use crate::tui::keys::CrosstermKeys;
use crate::tui::menu::MenuController;
use crate::tui::overlay::Overlay;
use crate::tui::renderer::{StatusSources, TerminalRenderer};
use crate::tui::terminal::TerminalGuard;

type LoopOutcome = (&'static str, SerconResult<()>);

pub struct Console {
    config: ConsoleConfig,
    process: ProcessState,
}

impl Console {
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            config,
            process: ProcessState::new(),
        }
    }

    /// Handle for requesting shutdown from outside (e.g. a signal handler)
    pub fn process(&self) -> ProcessState {
        self.process.clone()
    }

    /// Open the device, take over the terminal and run until stopped
    pub async fn run(self) -> SerconResult<()> {
        let (link, reader) = SerialLink::open(&self.config.serial, &self.config.keys)?;

        let guard = TerminalGuard::enter()?;
        let terminal = guard.terminal()?;
        let result = run_with(&self.config, self.process, link, reader, terminal, CrosstermKeys).await;

        // Screen is restored only after every loop has let go of it.
        drop(guard);
        result
    }
}

/// Run the console loops over already opened endpoints.
///
/// Returns once every loop has exited. The first loop error, if any, is
/// returned after all resources are released.
pub async fn run_with<B, K>(
    config: &ConsoleConfig,
    process: ProcessState,
    link: SerialLink,
    reader: SerialReader,
    terminal: Terminal<B>,
    keys: K,
) -> SerconResult<()>
where
    B: Backend + Send + 'static,
    K: KeySource + 'static,
{
    let poll_interval = config.render.poll_interval();
    let broadcaster = Broadcaster::new();
    let overlay = Overlay::default();

    let capture = CaptureSink::new();
    if config.capture.enabled {
        if let Err(e) = capture.enable(&config.capture.path) {
            warn!("Capture not enabled at startup: {}", e);
        }
    }

    let bridge = BridgeController::new(
        config.bridge.clone(),
        broadcaster.clone(),
        link.clone(),
        process.clone(),
        poll_interval,
    );
    if config.bridge.enabled {
        bridge.enable();
    }

    // Subscribe before the reader starts so no chunk is missed.
    let renderer = TerminalRenderer::new(
        terminal,
        broadcaster.subscribe("renderer"),
        StatusSources {
            device: link.device().to_string(),
            baud_rate: link.baud_rate(),
            menu_key: config.keys.menu,
            bridge: bridge.subscribe_state(),
            capture: capture.clone(),
        },
        overlay.clone(),
        process.clone(),
        poll_interval,
        config.render.ignore_carriage_return,
    )?;

    let menu = MenuController::standard(
        &config.capture,
        bridge.clone(),
        capture.clone(),
        overlay,
        poll_interval,
    );
    let dispatcher = InputDispatcher::new(
        keys,
        menu,
        link.clone(),
        config.keys.clone(),
        process.clone(),
        poll_interval,
    );

    info!("Console started on {} at {} baud", link.device(), link.baud_rate());

    let mut loops: JoinSet<LoopOutcome> = JoinSet::new();
    {
        let broadcaster = broadcaster.clone();
        let process = process.clone();
        loops.spawn_blocking(move || ("serial reader", reader.run(&broadcaster, &process)));
    }
    loops.spawn_blocking(move || ("input dispatcher", dispatcher.run()));
    loops.spawn(async move { ("renderer", renderer.run().await.map(|_| ())) });

    let mut first_error = None;
    while let Some(joined) = loops.join_next().await {
        // Whichever loop ends first takes the others down with it.
        process.stop();
        match joined {
            Ok((name, Ok(()))) => info!("{} exited", name),
            Ok((name, Err(e))) => {
                error!("{} failed: {}", name, e);
                first_error.get_or_insert(e);
            }
            Err(e) => error!("Console loop panicked or was aborted: {}", e),
        }
    }

    bridge.shutdown().await;
    if let Err(e) = capture.disable() {
        warn!("Failed to close capture file: {}", e);
    }
    drop(link);
    info!("Console stopped");

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
