#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use sercon::core::input::{Key, KeySource};
use sercon::domain::config::{BridgeConfig, ConsoleConfig};
use sercon::SerconResult;

/// Plays back a fixed list of keys, then reports no input
pub struct ScriptedKeys {
    keys: VecDeque<Key>,
}

impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn idle() -> Self {
        Self::new([])
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self, timeout: Duration) -> SerconResult<Option<Key>> {
        match self.keys.pop_front() {
            Some(key) => Ok(Some(key)),
            None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

pub const POLL_MS: u64 = 20;

pub fn test_config(dir: &Path) -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.serial.device = "mem".to_string();
    config.render.poll_interval_ms = POLL_MS;
    config.capture.path = dir.join("capture.txt");
    config.bridge = BridgeConfig {
        enabled: false,
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    config
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
