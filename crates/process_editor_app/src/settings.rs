// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings.
//!
//! Settings live in a RON file next to the working directory. A missing file
//! means defaults; a file written by a newer editor is refused.

use process_editor_graph::{ConnectionPolicy, PortCounts, PortLayout, ProcessGraph};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "process_editor.ron";

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed settings file
    #[error("Invalid settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization error
    #[error("Failed to write settings: {0}")]
    Serialize(#[from] ron::Error),

    /// File written by a newer editor
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
}

/// Result type for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSettings {
    /// Initial logical width
    pub width: u32,
    /// Initial logical height
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 860,
        }
    }
}

/// Canvas and graph settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSettings {
    /// Name given to a fresh process
    pub process_name: String,
    /// Input ports on a new node
    pub default_inputs: usize,
    /// Output ports on a new node
    pub default_outputs: usize,
    /// Offset of the first port from the top of a node
    pub port_base: f32,
    /// Distance between ports
    pub port_spacing: f32,
    /// Allow a node to feed itself
    #[serde(default)]
    pub allow_self_loops: bool,
    /// Snap dragged nodes to the grid
    #[serde(default)]
    pub snap_to_grid: bool,
}

impl Default for GraphSettings {
    fn default() -> Self {
        let layout = PortLayout::default();
        Self {
            process_name: "New Process".to_string(),
            default_inputs: 0,
            default_outputs: 0,
            port_base: layout.base,
            port_spacing: layout.spacing,
            allow_self_loops: false,
            snap_to_grid: false,
        }
    }
}

impl GraphSettings {
    /// Port layout for node views
    pub fn layout(&self) -> PortLayout {
        PortLayout::new(self.port_base, self.port_spacing)
    }

    /// An empty graph configured from these settings
    pub fn new_graph(&self) -> ProcessGraph {
        ProcessGraph::new(self.process_name.clone())
            .with_policy(ConnectionPolicy {
                allow_self_loops: self.allow_self_loops,
            })
            .with_default_ports(PortCounts::new(self.default_inputs, self.default_outputs))
    }
}

/// All editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Format version
    pub version: u32,
    /// Window settings
    #[serde(default)]
    pub window: WindowSettings,
    /// Graph settings
    #[serde(default)]
    pub graph: GraphSettings,
    /// Where Export/Import read and write the process document
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,
}

fn default_document_path() -> PathBuf {
    PathBuf::from("process.json")
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            window: WindowSettings::default(),
            graph: GraphSettings::default(),
            document_path: default_document_path(),
        }
    }
}

impl EditorSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: EditorSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings at {:?}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings file path inside a directory
    pub fn file_path(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_FILE_NAME)
    }
}
