//! Settings file support
//!
//! Defaults for every flag live in an optional TOML file so frequently
//! used sizes and the simulated cluster layout do not have to be repeated
//! on the command line.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{PerfError, Result, APP_NAME, CONFIG_FILE};

/// Persisted defaults, all values in their human-readable flag form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Emit JSON instead of starting the dashboard
    pub json: bool,
    pub drive: DriveSettings,
    pub object: ObjectSettings,
    pub disk: DiskSettings,
    pub cluster: ClusterSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    pub serial: bool,
    pub blocksize: String,
    pub filesize: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectSettings {
    pub size: String,
    pub duration: String,
    pub concurrent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskSettings {
    pub count: usize,
    pub interval: String,
    /// Samples taken when writing JSON; the dashboard streams until quit
    pub json_samples: u32,
}

/// Layout of the built-in simulated cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    pub servers: usize,
    pub drives_per_server: usize,
    /// RNG seed; identical seeds produce identical result streams
    pub seed: u64,
    /// Pacing between simulated progress messages
    pub tick: String,
    /// Make every dispatch fail with this message
    pub fail_dispatch: Option<String>,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            serial: false,
            blocksize: "4MiB".to_string(),
            filesize: "1GiB".to_string(),
        }
    }
}

impl Default for ObjectSettings {
    fn default() -> Self {
        Self {
            size: "64MiB".to_string(),
            duration: "10s".to_string(),
            concurrent: 32,
        }
    }
}

impl Default for DiskSettings {
    fn default() -> Self {
        Self {
            count: 10,
            interval: "1s".to_string(),
            json_samples: 1,
        }
    }
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            servers: 4,
            drives_per_server: 4,
            seed: 42,
            tick: "250ms".to_string(),
            fail_dispatch: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the standard location when `None`.
    /// Returns defaults if the file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            PerfError::ConfigError(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| {
            PerfError::ConfigError(format!(
                "Failed to parse settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Get the standard settings file path
    /// Uses $CONFIG_HOME/clusterperf/clusterperf.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            PerfError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Check that every stored value parses
    pub fn validate(&self) -> Result<()> {
        super::parse_size("blocksize", &self.drive.blocksize)?;
        super::parse_size("filesize", &self.drive.filesize)?;
        super::parse_size("size", &self.object.size)?;
        super::parse_duration("duration", &self.object.duration)?;
        super::parse_duration("interval", &self.disk.interval)?;
        super::parse_duration("tick", &self.cluster.tick)?;

        if self.object.concurrent == 0 {
            return Err(PerfError::ConfigError(
                "concurrency cannot be '0' or negative".to_string(),
            ));
        }
        if self.disk.count == 0 || self.disk.json_samples == 0 {
            return Err(PerfError::ConfigError(
                "disk count and json_samples must be greater than 0".to_string(),
            ));
        }
        if self.cluster.servers == 0 || self.cluster.drives_per_server == 0 {
            return Err(PerfError::ConfigError(
                "cluster must have at least one server and one drive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_written_settings_load_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut settings = Settings::default();
        settings.json = true;
        settings.object.concurrent = 8;
        settings.cluster.fail_dispatch = Some("connection refused".to_string());
        fs::write(&path, toml::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = Settings::load(Some(&path)).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[drive]\nblocksize = \"1MiB\"\n").unwrap();

        let loaded = Settings::load(Some(&path)).unwrap();
        assert_eq!(loaded.drive.blocksize, "1MiB");
        assert_eq!(loaded.drive.filesize, "1GiB");
        assert_eq!(loaded.disk.count, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[object]\nduration = \"forever\"\n").unwrap();
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(PerfError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_file_path() {
        if let Ok(path) = Settings::config_file_path() {
            assert!(path.to_string_lossy().contains("clusterperf.toml"));
        }
    }
}
