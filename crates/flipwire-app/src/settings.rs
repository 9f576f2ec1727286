use anyhow::{Context, Result};
use flipwire_core::{LinkConfig, DEFAULT_BAUD_RATE, DEFAULT_PAYLOAD_LEN, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "FLIPWIRE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub device: String,
    pub baud_rate: u32,
    /// Unset means block until the transport takes the bytes.
    pub write_timeout_ms: Option<u64>,
    pub payload_len: usize,
    pub addresses: Vec<u8>,
    /// Record frames in memory and print them instead of opening the device.
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout_ms: None,
            payload_len: DEFAULT_PAYLOAD_LEN,
            addresses: vec![0, 1],
            dry_run: false,
        }
    }
}

impl Settings {
    /// `$FLIPWIRE_CONFIG`, then the per-user settings file, then defaults.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(explicit.as_deref(), default_path().as_deref())
    }

    /// An explicit path must exist; the fallback is optional.
    fn load_from(explicit: Option<&Path>, fallback: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match fallback {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn link_config(&self) -> LinkConfig {
        let cfg = LinkConfig::new(self.device.clone(), self.baud_rate);
        match self.write_timeout_ms {
            Some(ms) => cfg.with_write_timeout(Duration::from_millis(ms)),
            None => cfg,
        }
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flipwire").join("settings.json"))
}
