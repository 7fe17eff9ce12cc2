//! Engine settings loaded from a YAML file. Every field has a default so a
//! partial (or absent) file still yields a usable configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::runtime::history::DEFAULT_MAX_HISTORY;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Hard bound on history length. Memory cost per entry is a full
    /// resolution RGBA frame, so size this deliberately.
    pub max_history_size: usize,
    /// Record a history entry every Nth tick.
    pub capture_interval: u32,
    pub reverse_speed: usize,
    pub reverse_loop: bool,
    pub audio_device: Option<String>,
    pub midi_port: Option<String>,
    pub fps: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_history_size: DEFAULT_MAX_HISTORY,
            capture_interval: 1,
            reverse_speed: 1,
            reverse_loop: false,
            audio_device: None,
            midi_port: None,
            fps: 60.0,
        }
    }
}

impl EngineSettings {
    pub fn load(path: &Path) -> Result<Self, String> {
        let source = fs::read_to_string(path).map_err(|err| {
            format!(
                "failed to read settings file '{}': {}",
                path.display(),
                err
            )
        })?;

        serde_yml::from_str(&source).map_err(|err| {
            format!(
                "failed to parse settings file '{}': {}",
                path.display(),
                err
            )
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let yaml = serde_yml::to_string(self).map_err(|err| {
            format!("failed to serialize settings: {}", err)
        })?;

        fs::write(path, yaml).map_err(|err| {
            format!(
                "failed to write settings file '{}': {}",
                path.display(),
                err
            )
        })
    }
}
