use crate::domain::{config::ConsoleConfig, error::{SerconError, SerconResult}};
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::debug;

/// Configuration manager
///
/// Layers, lowest priority first: built-in defaults, the global file, the
/// project file, then an explicitly given file.
pub struct ConfigManager {
    global_config_path: Option<PathBuf>,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> Self {
        Self {
            global_config_path: Self::get_global_config_path(),
            project_config_path: Self::find_project_config_path(),
        }
    }

    /// Manager that only looks at the given locations
    pub fn with_paths(global: Option<PathBuf>, project: Option<PathBuf>) -> Self {
        Self {
            global_config_path: global,
            project_config_path: project,
        }
    }

    /// Load and merge every configuration layer
    pub fn load_config(&self, explicit: Option<&Path>) -> SerconResult<ConsoleConfig> {
        let mut merged = Table::new();

        let discovered = [&self.global_config_path, &self.project_config_path];
        for path in discovered.into_iter().flatten() {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                merge_tables(&mut merged, self.load_table_from_path(path)?);
            }
        }

        if let Some(path) = explicit {
            // An explicitly requested file must exist.
            merge_tables(&mut merged, self.load_table_from_path(path)?);
        }

        Value::Table(merged)
            .try_into()
            .map_err(|e| SerconError::config(format!("Invalid configuration: {}", e)))
    }

    /// Get global configuration path
    fn get_global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("sercon").join("config.toml"))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(".sercon").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    fn load_table_from_path(&self, path: &Path) -> SerconResult<Table> {
        let content = fs::read_to_string(path).map_err(|e| SerconError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| SerconError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Write a default project configuration under `dir`
    pub fn init_project_config(&self, dir: &Path) -> SerconResult<PathBuf> {
        let config_dir = dir.join(".sercon");
        let config_file = config_dir.join("config.toml");

        if config_file.exists() {
            return Err(SerconError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        fs::create_dir_all(&config_dir).map_err(|e| SerconError::Config {
            message: format!("Failed to create .sercon directory: {}", e),
        })?;

        let mut config = ConsoleConfig::default();
        config.serial.device = "/dev/ttyUSB0".to_string();
        let content = toml::to_string_pretty(&config).map_err(|e| SerconError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&config_file, content).map_err(|e| SerconError::Config {
            message: format!("Failed to write config file {}: {}", config_file.display(), e),
        })?;

        Ok(config_file)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively overlay `upper` onto `base`; tables merge, values replace
fn merge_tables(base: &mut Table, upper: Table) {
    for (key, value) in upper {
        match value {
            Value::Table(incoming) => {
                if let Some(Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                    continue;
                }
                base.insert(key, Value::Table(incoming));
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let manager = ConfigManager::with_paths(None, None);
        let config = manager.load_config(None).unwrap();
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn test_layers_merge_per_key() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        let explicit = dir.path().join("explicit.toml");

        fs::write(
            &global,
            "[serial]\ndevice = \"/dev/ttyS0\"\nbaud_rate = 9600\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();
        fs::write(&project, "[serial]\nbaud_rate = 57600\n").unwrap();
        fs::write(&explicit, "[bridge]\nport = 7000\n").unwrap();

        let manager = ConfigManager::with_paths(Some(global), Some(project));
        let config = manager.load_config(Some(&explicit)).unwrap();

        assert_eq!(config.serial.device, "/dev/ttyS0");
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.bridge.port, 7000);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_paths(None, None);
        let result = manager.load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(SerconError::Config { .. })));
    }

    #[test]
    fn test_invalid_value_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[serial]\nbaud_rate = \"fast\"\n").unwrap();

        let manager = ConfigManager::with_paths(None, None);
        assert!(manager.load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_init_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_paths(None, None);

        let path = manager.init_project_config(temp_dir.path()).unwrap();
        assert_eq!(path, temp_dir.path().join(".sercon").join("config.toml"));

        let config = manager.load_config(Some(&path)).unwrap();
        assert_eq!(config.serial.device, "/dev/ttyUSB0");
        assert!(manager.init_project_config(temp_dir.path()).is_err());
    }
}
