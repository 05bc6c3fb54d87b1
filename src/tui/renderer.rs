//! The single consumer that owns what is on screen.

use std::time::Duration;

use ratatui::{backend::Backend, Terminal};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::core::broadcast::Subscriber;
use crate::core::process::ProcessState;
use crate::core::screen::{ScreenBuffer, ScreenEvent, ScrollRegion};
use crate::domain::error::{SerconError, SerconResult};
use crate::infrastructure::capture::CaptureSink;
use crate::infrastructure::tcp::BridgeState;

use super::overlay::Overlay;
use super::ui::draw_console;
use super::widgets::status::StatusLine;

/// Live inputs of the status bar
pub struct StatusSources {
    pub device: String,
    pub baud_rate: u32,
    pub menu_key: char,
    pub bridge: watch::Receiver<BridgeState>,
    pub capture: CaptureSink,
}

impl StatusSources {
    pub fn status_line(&self) -> StatusLine {
        let bridge = self.bridge.borrow().clone();
        StatusLine::compose(
            &self.device,
            self.baud_rate,
            self.menu_key,
            &bridge,
            self.capture.path().as_deref(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub bytes: u64,
    pub scrolls: u64,
    pub captured_lines: u64,
    pub alerts: u64,
}

pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    screen: ScreenBuffer,
    subscriber: Subscriber,
    status: StatusSources,
    overlay: Overlay,
    process: ProcessState,
    poll_interval: Duration,
    flash: bool,
    stats: RenderStats,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(
        terminal: Terminal<B>,
        subscriber: Subscriber,
        status: StatusSources,
        overlay: Overlay,
        process: ProcessState,
        poll_interval: Duration,
        ignore_carriage_return: bool,
    ) -> SerconResult<Self> {
        let size = terminal.size()?;
        let screen = ScreenBuffer::new(
            ScrollRegion::for_terminal(size.width, size.height),
            ignore_carriage_return,
        );
        Ok(Self {
            terminal,
            screen,
            subscriber,
            status,
            overlay,
            process,
            poll_interval,
            flash: false,
            stats: RenderStats::default(),
        })
    }

    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Draw until the process stops or the stream closes
    pub async fn run(mut self) -> SerconResult<RenderStats> {
        info!(
            "Renderer started on subscriber {} ({})",
            self.subscriber.name(),
            self.subscriber.id()
        );

        // First frame before any data, so the status bar shows immediately.
        self.step(None)?;

        loop {
            tokio::select! {
                _ = self.process.stopped() => break,
                received = self.subscriber.get(self.poll_interval) => match received {
                    Ok(chunk) => self.step(chunk.as_deref())?,
                    Err(SerconError::SubscriberClosed) => {
                        debug!("Renderer subscription closed");
                        break;
                    }
                    Err(e) => return Err(e),
                },
            }
        }

        info!(
            "Renderer stopped after {} frames, {} bytes",
            self.stats.frames, self.stats.bytes
        );
        Ok(self.stats)
    }

    /// One iteration: apply `bytes` (if a chunk arrived) and redraw the
    /// whole frame including the status bar.
    pub fn step(&mut self, bytes: Option<&[u8]>) -> SerconResult<()> {
        self.sync_size()?;

        if let Some(bytes) = bytes {
            self.stats.bytes += bytes.len() as u64;
            for event in self.screen.feed(bytes) {
                self.handle_event(event);
            }
        }

        self.draw()
    }

    fn handle_event(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::Committed(line) => match self.status.capture.append(&line) {
                Ok(true) => self.stats.captured_lines += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Capture write failed, disabling capture: {}", e);
                    if let Err(e) = self.status.capture.disable() {
                        warn!("Failed to close capture file: {}", e);
                    }
                }
            },
            ScreenEvent::Scrolled => self.stats.scrolls += 1,
            ScreenEvent::Alert => {
                self.stats.alerts += 1;
                self.flash = true;
            }
        }
    }

    fn sync_size(&mut self) -> SerconResult<()> {
        let size = self.terminal.size()?;
        let region = ScrollRegion::for_terminal(size.width, size.height);
        if region != self.screen.region() {
            debug!("Terminal resized to {}x{}", size.width, size.height);
            self.terminal.resize(size)?;
            self.screen.resize(region);
        }
        Ok(())
    }

    fn draw(&mut self) -> SerconResult<()> {
        let mut status = self.status.status_line();
        status.alert = std::mem::take(&mut self.flash);
        let overlay = self.overlay.current();
        let screen = &self.screen;

        self.terminal
            .draw(|f| draw_console(f, screen, &status, overlay.as_ref()))?;
        self.stats.frames += 1;
        Ok(())
    }
}
