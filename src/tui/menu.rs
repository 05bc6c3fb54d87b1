//! Command menu opened with the reserved menu key.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::input::{Key, KeySource, MenuSession};
use crate::core::process::ProcessState;
use crate::domain::config::CaptureConfig;
use crate::domain::error::SerconResult;
use crate::infrastructure::capture::CaptureSink;
use crate::infrastructure::tcp::BridgeController;

use super::dialog::Dialog;
use super::overlay::{Overlay, OverlayView};

pub const MENU_TITLE: &str = "Command Summary";
const ENTRY_WIDTH: usize = 50;

/// What a menu action gets to work with while the menu holds the keyboard
pub struct MenuContext<'a> {
    pub keys: &'a mut dyn KeySource,
    pub overlay: &'a Overlay,
    pub process: &'a ProcessState,
    pub poll_interval: Duration,
}

impl MenuContext<'_> {
    /// Show `dialog` and collect its result with the menu's keys
    pub fn prompt(&mut self, dialog: Dialog) -> SerconResult<Option<super::dialog::DialogOutcome>> {
        dialog.run(self.keys, self.overlay, self.process, self.poll_interval)
    }
}

pub type MenuAction = Box<dyn FnMut(&mut MenuContext<'_>) -> SerconResult<()> + Send>;

struct MenuEntry {
    key: char,
    description: String,
    action: MenuAction,
    exits_menu: bool,
}

pub struct MenuController {
    entries: Vec<MenuEntry>,
    overlay: Overlay,
    poll_interval: Duration,
}

impl MenuController {
    pub fn new(overlay: Overlay, poll_interval: Duration) -> Self {
        Self {
            entries: Vec::new(),
            overlay,
            poll_interval,
        }
    }

    /// Add an entry. A later registration for the same key replaces it.
    pub fn register(
        &mut self,
        key: char,
        description: impl Into<String>,
        action: MenuAction,
        exits_menu: bool,
    ) {
        let key = key.to_ascii_lowercase();
        self.entries.retain(|entry| entry.key != key);
        self.entries.push(MenuEntry {
            key,
            description: description.into(),
            action,
            exits_menu,
        });
    }

    /// The console's menu: bridge toggle, capture toggle and quit
    pub fn standard(
        capture_config: &CaptureConfig,
        bridge: BridgeController,
        capture: CaptureSink,
        overlay: Overlay,
        poll_interval: Duration,
    ) -> Self {
        let mut menu = Self::new(overlay, poll_interval);

        menu.register(
            't',
            "Toggle network bridge",
            Box::new(move |_| {
                let enabled = bridge.toggle();
                info!("Bridge toggled {}", if enabled { "on" } else { "off" });
                Ok(())
            }),
            true,
        );

        let default_path = capture_config.path.display().to_string();
        menu.register(
            'c',
            "Toggle capture file",
            Box::new(move |ctx| toggle_capture(ctx, &capture, &default_path)),
            true,
        );

        menu.register(
            'q',
            "Quit",
            Box::new(|ctx| {
                ctx.process.stop();
                Ok(())
            }),
            true,
        );

        menu
    }

    /// Rendered entry lines, in registration order
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{:.<width$}{}",
                    format!("{} ", entry.description),
                    entry.key.to_ascii_uppercase(),
                    width = ENTRY_WIDTH
                )
            })
            .collect()
    }

    fn view(&self) -> OverlayView {
        OverlayView::Menu {
            title: MENU_TITLE.to_string(),
            lines: self.lines(),
        }
    }

    fn session(&mut self, keys: &mut dyn KeySource, process: &ProcessState) -> SerconResult<()> {
        while process.is_running() {
            self.overlay.show(self.view());

            let Some(key) = keys.next_key(self.poll_interval)? else {
                continue;
            };
            let selected = match key {
                Key::Esc => return Ok(()),
                Key::Char(c) => c.to_ascii_lowercase(),
                _ => continue,
            };
            let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == selected) else {
                debug!("No menu entry for {:?}", selected);
                continue;
            };

            let mut ctx = MenuContext {
                keys: &mut *keys,
                overlay: &self.overlay,
                process,
                poll_interval: self.poll_interval,
            };
            (entry.action)(&mut ctx)?;
            if entry.exits_menu {
                return Ok(());
            }
        }
        Ok(())
    }
}

impl MenuSession for MenuController {
    fn run(&mut self, keys: &mut dyn KeySource, process: &ProcessState) -> SerconResult<()> {
        let result = self.session(keys, process);
        self.overlay.clear();
        result
    }
}

fn toggle_capture(ctx: &mut MenuContext<'_>, capture: &CaptureSink, default_path: &str) -> SerconResult<()> {
    if capture.is_enabled() {
        if let Err(e) = capture.disable() {
            warn!("Failed to close capture file: {}", e);
        }
        return Ok(());
    }

    let dialog = Dialog::new()
        .label("Capture committed lines to file")
        .input("path", "File", default_path)
        .buttons(["OK", "Cancel"]);

    let Some(outcome) = ctx.prompt(dialog)? else {
        return Ok(());
    };
    let path = outcome.inputs.get("path").map(String::as_str).unwrap_or("");
    if outcome.button != 0 || path.trim().is_empty() {
        return Ok(());
    }

    if let Err(e) = capture.enable(&PathBuf::from(path.trim())) {
        warn!("Capture not enabled: {}", e);
    }
    Ok(())
}
