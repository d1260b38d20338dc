use super::OverlayConfig;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "stickwatch";
const CONFIG_FILE: &str = "config.toml";

/// TOML-backed storage for [`OverlayConfig`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/stickwatch/config.toml`, falling back to the
    /// home directory when the platform has no config directory.
    pub fn default_location() -> Self {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and sanitizes the configuration. A missing file yields defaults.
    pub async fn load(&self) -> Result<OverlayConfig> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            info!(
                "No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(OverlayConfig::default());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| eyre!("Failed to read config file: {}", e))?;

        let config: OverlayConfig =
            toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))?;

        debug!("Loaded config from {}: {:?}", self.path.display(), config);
        Ok(config.sanitized())
    }

    /// Like [`ConfigStore::load`], but any failure degrades to defaults.
    pub async fn load_or_default(&self) -> OverlayConfig {
        match self.load().await {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Could not load config from {}, using defaults: {}",
                    self.path.display(),
                    e
                );
                OverlayConfig::default()
            }
        }
    }

    pub async fn save(&self, config: &OverlayConfig) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !tokio::fs::try_exists(dir)
                .await
                .map_err(|e| eyre!("Failed to check if config directory exists: {}", e))?
            {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
            }
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;

        info!("Config saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::device_reader::AxisName;

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        assert_eq!(store.load().await.unwrap(), OverlayConfig::default());
    }

    #[tokio::test]
    async fn save_creates_directory_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.toml"));

        let mut config = OverlayConfig::default();
        config.deadzone = 0.12;
        config.hold_threshold_secs = 3.5;
        config.pedal_device = 4;
        config.axes.reverse = AxisName::R;

        store.save(&config).await.unwrap();
        assert_eq!(store.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn unparsable_file_is_an_error_but_load_or_default_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "deadzone = [not toml").await.unwrap();

        let store = ConfigStore::new(&path);
        assert!(store.load().await.is_err());
        assert_eq!(store.load_or_default().await, OverlayConfig::default());
    }

    #[tokio::test]
    async fn out_of_range_values_are_sanitized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "deadzone = 2.0\nstick_device = 3\n")
            .await
            .unwrap();

        let config = ConfigStore::new(&path).load().await.unwrap();
        assert_eq!(config.deadzone, 0.3);
        assert_eq!(config.stick_device, 3);
    }
}
