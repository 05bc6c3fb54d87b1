//! Keyboard side of the console: reserved keys open the menu or stop the
//! process, everything else goes to the device.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::process::ProcessState;
use crate::domain::config::KeyBindings;
use crate::domain::error::SerconResult;
use crate::infrastructure::serial::SerialLink;

/// A key press as read from the local terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Ctrl held together with a character
    Ctrl(char),
    Enter,
    Backspace,
    Tab,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Delete,
}

/// Blocking source of key presses
pub trait KeySource: Send {
    /// Wait up to `timeout` for a key; `Ok(None)` when none arrived.
    fn next_key(&mut self, timeout: Duration) -> SerconResult<Option<Key>>;
}

/// Interactive menu invoked on the reserved menu key.
///
/// `run` blocks until a selection or cancel is made, reading its keys from
/// the same source the dispatcher uses.
pub trait MenuSession: Send {
    fn run(&mut self, keys: &mut dyn KeySource, process: &ProcessState) -> SerconResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    OpenMenu,
    Exit,
    Forward(Key),
}

/// Classify a key against the reserved bindings
pub fn classify(key: Key, bindings: &KeyBindings) -> KeyAction {
    match key {
        Key::Ctrl(c) if c.eq_ignore_ascii_case(&bindings.menu) => KeyAction::OpenMenu,
        Key::Ctrl(c) if c.eq_ignore_ascii_case(&bindings.exit) => KeyAction::Exit,
        other => KeyAction::Forward(other),
    }
}

pub struct InputDispatcher<K, M> {
    keys: K,
    menu: M,
    link: SerialLink,
    bindings: KeyBindings,
    process: ProcessState,
    poll_interval: Duration,
}

impl<K: KeySource, M: MenuSession> InputDispatcher<K, M> {
    pub fn new(
        keys: K,
        menu: M,
        link: SerialLink,
        bindings: KeyBindings,
        process: ProcessState,
        poll_interval: Duration,
    ) -> Self {
        Self {
            keys,
            menu,
            link,
            bindings,
            process,
            poll_interval,
        }
    }

    /// Read and handle keys one at a time until the process stops
    pub fn run(mut self) -> SerconResult<()> {
        info!("Input dispatcher started");

        while self.process.is_running() {
            let Some(key) = self.keys.next_key(self.poll_interval)? else {
                continue;
            };

            match classify(key, &self.bindings) {
                KeyAction::OpenMenu => {
                    debug!("Opening menu");
                    self.menu.run(&mut self.keys, &self.process)?;
                }
                KeyAction::Exit => {
                    info!("Exit key pressed");
                    self.process.stop();
                }
                KeyAction::Forward(key) => {
                    if let Err(e) = self.link.write_key(key) {
                        warn!("Failed to forward key {:?}: {}", key, e);
                    }
                }
            }
        }

        info!("Input dispatcher stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::serial::testing::{MemoryPort, SharedSink};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedKeys {
        keys: VecDeque<Key>,
        process: ProcessState,
    }

    impl KeySource for ScriptedKeys {
        fn next_key(&mut self, timeout: Duration) -> SerconResult<Option<Key>> {
            match self.keys.pop_front() {
                Some(key) => Ok(Some(key)),
                None => {
                    // Script exhausted: end the test run.
                    self.process.stop();
                    std::thread::sleep(timeout);
                    Ok(None)
                }
            }
        }
    }

    #[derive(Clone, Default)]
    struct CountingMenu {
        opened: Arc<Mutex<Vec<Option<Key>>>>,
    }

    impl MenuSession for CountingMenu {
        fn run(&mut self, keys: &mut dyn KeySource, _: &ProcessState) -> SerconResult<()> {
            // Consumes one key as its selection.
            let selection = keys.next_key(Duration::from_millis(1))?;
            self.opened.lock().unwrap().push(selection);
            Ok(())
        }
    }

    fn dispatcher(
        keys: Vec<Key>,
        process: &ProcessState,
    ) -> (InputDispatcher<ScriptedKeys, CountingMenu>, SharedSink, CountingMenu) {
        let sink = SharedSink::default();
        let (link, _reader) = SerialLink::with_io(
            "test",
            9600,
            MemoryPort::idle(),
            sink.clone(),
            KeyBindings::default(),
        );
        let menu = CountingMenu::default();
        let dispatcher = InputDispatcher::new(
            ScriptedKeys {
                keys: keys.into(),
                process: process.clone(),
            },
            menu.clone(),
            link,
            KeyBindings::default(),
            process.clone(),
            Duration::from_millis(5),
        );
        (dispatcher, sink, menu)
    }

    #[test]
    fn test_classify() {
        let bindings = KeyBindings::default();
        assert_eq!(classify(Key::Ctrl('a'), &bindings), KeyAction::OpenMenu);
        assert_eq!(classify(Key::Ctrl('A'), &bindings), KeyAction::OpenMenu);
        assert_eq!(classify(Key::Ctrl('x'), &bindings), KeyAction::Exit);
        assert_eq!(
            classify(Key::Ctrl('c'), &bindings),
            KeyAction::Forward(Key::Ctrl('c'))
        );
        assert_eq!(
            classify(Key::Char('a'), &bindings),
            KeyAction::Forward(Key::Char('a'))
        );
    }

    #[test]
    fn test_forwards_keys_in_order() {
        let process = ProcessState::new();
        let (dispatcher, sink, menu) = dispatcher(
            vec![Key::Char('l'), Key::Char('s'), Key::Enter],
            &process,
        );

        dispatcher.run().unwrap();
        assert_eq!(sink.contents(), b"ls\r");
        assert!(menu.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_menu_key_runs_menu_before_next_key() {
        let process = ProcessState::new();
        let (dispatcher, sink, menu) = dispatcher(
            vec![Key::Char('a'), Key::Ctrl('a'), Key::Char('t'), Key::Char('b')],
            &process,
        );

        dispatcher.run().unwrap();
        assert_eq!(sink.contents(), b"ab");
        assert_eq!(*menu.opened.lock().unwrap(), vec![Some(Key::Char('t'))]);
    }

    #[test]
    fn test_exit_key_stops_process() {
        let process = ProcessState::new();
        let (dispatcher, sink, _) = dispatcher(
            vec![Key::Char('a'), Key::Ctrl('x'), Key::Char('b')],
            &process,
        );

        dispatcher.run().unwrap();
        assert!(!process.is_running());
        assert_eq!(sink.contents(), b"a");
    }
}
