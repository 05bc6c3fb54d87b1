use std::sync::{Arc, Mutex, MutexGuard};

use super::dialog::Dialog;

/// What the menu side wants drawn on top of the serial output
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayView {
    Menu { title: String, lines: Vec<String> },
    Dialog(Dialog),
}

/// Slot shared between the menu (writer) and the renderer (reader)
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    current: Arc<Mutex<Option<OverlayView>>>,
}

impl Overlay {
    pub fn show(&self, view: OverlayView) {
        *self.lock() = Some(view);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn current(&self) -> Option<OverlayView> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<OverlayView>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
