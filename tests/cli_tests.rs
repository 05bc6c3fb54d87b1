use std::process::Command;
use std::str;

use tempfile::TempDir;

/// CLI interface tests
#[cfg(test)]
mod cli_tests {
    use super::*;

    fn sercon() -> Command {
        Command::new(env!("CARGO_BIN_EXE_sercon"))
    }

    #[test]
    fn test_cli_help() {
        let output = sercon().arg("--help").output().expect("Failed to execute sercon");
        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");

        assert!(output.status.success());
        assert!(stdout.contains("Usage:"));
        assert!(stdout.contains("--baud"));
        assert!(stdout.contains("--listen"));
        assert!(stdout.contains("--capture"));
        assert!(stdout.contains("--list-ports"));
    }

    #[test]
    fn test_cli_version() {
        let output = sercon().arg("--version").output().expect("Failed to execute sercon");
        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");

        assert!(output.status.success());
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_unavailable_device_exits_nonzero() {
        let dir = TempDir::new().unwrap();
        let output = sercon()
            .current_dir(dir.path())
            .env("HOME", dir.path())
            .args(["/dev/sercon-does-not-exist", "--log-file"])
            .arg(dir.path().join("sercon.log"))
            .output()
            .expect("Failed to execute sercon");
        let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr.contains("Error:"));
        assert!(stderr.contains("/dev/sercon-does-not-exist"));
    }

    #[test]
    fn test_missing_device_is_config_error() {
        let dir = TempDir::new().unwrap();
        let output = sercon()
            .current_dir(dir.path())
            .env("HOME", dir.path())
            .output()
            .expect("Failed to execute sercon");
        let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr.contains("Configuration error"));
    }

    #[test]
    fn test_init_config_writes_project_file() {
        let dir = TempDir::new().unwrap();
        let output = sercon()
            .current_dir(dir.path())
            .env("HOME", dir.path())
            .arg("--init-config")
            .output()
            .expect("Failed to execute sercon");

        assert!(output.status.success());
        assert!(dir.path().join(".sercon").join("config.toml").exists());
    }
}
