//! Application configuration
//!
//! Loaded through confy from the platform config directory. A missing file
//! is created with the defaults below.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the task file and its backup
    pub data_directory: String,
    /// Name of the JSON task file inside `data_directory`
    pub task_filename: String,
    /// Default log filter, used when `RUST_LOG` is not set
    pub log_level: String,
    /// HTTP server settings
    pub server: ServerSettings,
}

impl Default for Config {
    fn default() -> Self {
        let data_directory = ProjectDirs::from("", "", "taskdeck")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            data_directory: data_directory.to_string_lossy().into_owned(),
            task_filename: "tasks.json".to_string(),
            log_level: "taskdeck=info,tower_http=info".to_string(),
            server: ServerSettings::default(),
        }
    }
}

impl Config {
    /// Full path of the task file
    pub fn tasks_path(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join(&self.task_filename)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.task_filename, "tasks.json");
        assert_eq!(config.server.port, 8000);
        assert!(config.tasks_path().ends_with("tasks.json"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.server.host, parsed.server.host);
        assert_eq!(config.data_directory, parsed.data_directory);
    }
}
