use std::error::Error;
use std::time::Duration;

use sercon::domain::config::{KeyBindings, SerialSettings};
use sercon::infrastructure::capture::CaptureSink;
use sercon::infrastructure::tcp::BridgeController;
use sercon::infrastructure::serial::testing::{MemoryPort, SharedSink};
use sercon::{Broadcaster, ConsoleConfig, ProcessState, SerconError, SerialLink};
use tempfile::TempDir;

/// Error handling and resilience tests
#[cfg(test)]
mod error_handling_tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            SerconError::config("bad value"),
            SerconError::SubscriberClosed,
            SerconError::Bridge {
                message: "bind failed".to_string(),
            },
            SerconError::Tui("raw mode".to_string()),
            SerconError::InvalidInput("nope".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }

        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SerconError>();
    }

    #[test]
    fn test_error_conversion_keeps_source() {
        let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let error: SerconError = io_error.into();
        assert!(matches!(error, SerconError::Io(_)));
        assert!(error.to_string().contains("gone"));

        let capture = SerconError::Capture {
            path: "/x".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(capture.source().is_some());
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let settings = SerialSettings {
            device: "/dev/sercon-does-not-exist".to_string(),
            ..SerialSettings::default()
        };

        match SerialLink::open(&settings, &KeyBindings::default()) {
            Err(SerconError::DeviceUnavailable { device, .. }) => {
                assert_eq!(device, "/dev/sercon-does-not-exist");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("nonexistent device opened"),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ConsoleConfig::default();
        assert!(matches!(config.validate(), Err(SerconError::Config { .. })));

        config.serial.device = "/dev/ttyUSB0".to_string();
        config.serial.data_bits = 9;
        assert!(config.validate().is_err());

        config.serial.data_bits = 8;
        config.keys.menu = '1';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capture_failure_leaves_sink_usable() {
        let dir = TempDir::new().unwrap();
        let sink = CaptureSink::new();

        assert!(sink.enable(&dir.path().join("no").join("such").join("dir.txt")).is_err());
        assert!(!sink.is_enabled());

        let path = dir.path().join("ok.txt");
        sink.enable(&path).unwrap();
        assert!(sink.append("fine").unwrap());
        sink.disable().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "fine\n");
    }

    #[tokio::test]
    async fn test_bridge_bind_failure_is_contained() {
        let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let mut config = ConsoleConfig::default();
        config.bridge.host = "127.0.0.1".to_string();
        config.bridge.port = port;

        let broadcaster = Broadcaster::new();
        let (link, _reader) = SerialLink::with_io(
            "mem",
            9600,
            MemoryPort::idle(),
            SharedSink::default(),
            KeyBindings::default(),
        );
        let process = ProcessState::new();
        let bridge = BridgeController::new(
            config.bridge.clone(),
            broadcaster.clone(),
            link,
            process.clone(),
            Duration::from_millis(20),
        );

        bridge.enable();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while bridge.is_enabled() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!bridge.is_enabled());
        assert!(process.is_running());
        assert_eq!(broadcaster.subscriber_count(), 0);
        bridge.shutdown().await;
    }
}
