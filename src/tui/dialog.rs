//! Small modal form: labels, text inputs and a row of buttons.

use std::collections::HashMap;
use std::time::Duration;

use crate::core::input::{Key, KeySource};
use crate::core::process::ProcessState;
use crate::domain::error::SerconResult;

use super::overlay::{Overlay, OverlayView};

const MIN_WIDTH: usize = 30;
const INPUT_WIDTH: usize = 50;
pub const INPUT_MARKER: &str = " > ";

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Label(String),
    Input {
        name: String,
        prompt: String,
        value: String,
    },
    Buttons {
        options: Vec<String>,
        selected: usize,
    },
}

impl Control {
    /// Columns the control needs inside the border
    pub fn width(&self) -> usize {
        match self {
            Control::Label(text) => text.chars().count(),
            Control::Input { .. } => INPUT_WIDTH,
            Control::Buttons { options, .. } => {
                options.iter().map(|o| o.chars().count() + 2).sum()
            }
        }
    }
}

/// Values collected when a dialog is confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOutcome {
    /// Index of the button that was active on Enter (0 without buttons)
    pub button: usize,
    pub inputs: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dialog {
    controls: Vec<Control>,
    focus: Option<usize>,
}

enum Step {
    Next,
    Stay,
    Cancel,
}

impl Dialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, text: impl Into<String>) -> Self {
        self.controls.push(Control::Label(text.into()));
        self
    }

    pub fn input(
        mut self,
        name: impl Into<String>,
        prompt: impl Into<String>,
        initial: impl Into<String>,
    ) -> Self {
        self.controls.push(Control::Input {
            name: name.into(),
            prompt: prompt.into(),
            value: initial.into(),
        });
        self
    }

    pub fn buttons<S: Into<String>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.controls.push(Control::Buttons {
            options: options.into_iter().map(Into::into).collect(),
            selected: 0,
        });
        self
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Control currently taking keys
    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Outer width including the border
    pub fn width(&self) -> usize {
        self.controls
            .iter()
            .map(Control::width)
            .max()
            .unwrap_or(0)
            .max(MIN_WIDTH)
            + 2
    }

    /// Outer height including the border
    pub fn height(&self) -> usize {
        self.controls.len() + 2
    }

    /// Walk the interactive controls in order, showing the dialog on
    /// `overlay`. Returns `None` on Esc or shutdown.
    pub fn run(
        mut self,
        keys: &mut dyn KeySource,
        overlay: &Overlay,
        process: &ProcessState,
        poll_interval: Duration,
    ) -> SerconResult<Option<DialogOutcome>> {
        let interactive: Vec<usize> = self
            .controls
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Control::Label(_)))
            .map(|(i, _)| i)
            .collect();

        for index in interactive {
            self.focus = Some(index);
            loop {
                overlay.show(OverlayView::Dialog(self.clone()));
                if !process.is_running() {
                    return Ok(None);
                }
                let Some(key) = keys.next_key(poll_interval)? else {
                    continue;
                };
                match self.handle_key(index, key) {
                    Step::Next => break,
                    Step::Stay => {}
                    Step::Cancel => return Ok(None),
                }
            }
        }

        self.focus = None;
        Ok(Some(self.outcome()))
    }

    fn handle_key(&mut self, index: usize, key: Key) -> Step {
        if key == Key::Esc {
            return Step::Cancel;
        }
        match &mut self.controls[index] {
            Control::Label(_) => Step::Next,
            Control::Input { value, .. } => match key {
                Key::Enter => Step::Next,
                Key::Backspace => {
                    value.pop();
                    Step::Stay
                }
                Key::Char(c) => {
                    value.push(c);
                    Step::Stay
                }
                _ => Step::Stay,
            },
            Control::Buttons { options, selected } => match key {
                Key::Enter => Step::Next,
                _ => {
                    *selected = (*selected + 1) % options.len().max(1);
                    Step::Stay
                }
            },
        }
    }

    fn outcome(&self) -> DialogOutcome {
        let mut button = 0;
        let mut inputs = HashMap::new();
        for control in &self.controls {
            match control {
                Control::Label(_) => {}
                Control::Input { name, value, .. } => {
                    inputs.insert(name.clone(), value.clone());
                }
                Control::Buttons { selected, .. } => button = *selected,
            }
        }
        DialogOutcome { button, inputs }
    }
}
