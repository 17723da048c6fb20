//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/swipegrd/config.json` (override with `--config <path>`).
//! Every section is optional; a minimal `{}` file is valid.
//!
//! # Example
//!
//! ```json
//! {
//!   "touchpad": { "speed_scale": 1.5, "natural_scroll": true },
//!   "source": { "kind": "relay", "socket": "/run/user/1000/swipegrd-relay.sock" },
//!   "control": { "socket": "/run/user/1000/swipegrd.sock" },
//!   "gestures": [
//!     { "name": "alt-tab", "fingers": [3], "orientation": "horizontal",
//!       "follow_natural_scroll": false },
//!     { "name": "overview", "fingers": [3, 4], "orientation": "vertical" }
//!   ]
//! }
//! ```

use crate::event::Orientation;
use crate::recognizer::GestureConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// System touchpad preferences.
    #[serde(default)]
    pub touchpad: TouchpadConfig,

    /// Where raw swipe events come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Socket for live settings commands.
    #[serde(default)]
    pub control: ControlConfig,

    /// Named recognizers.  Empty means [`default_bindings`].
    #[serde(default)]
    pub gestures: Vec<GestureBinding>,
}

/// System touchpad preferences shared by every recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchpadConfig {
    /// User speed setting.  Each binding's `swipe_multiplier` is scaled by
    /// this.  Default: `1.0`.
    pub speed_scale: f64,
    /// The desktop's natural scrolling preference.  Default: `true`.
    pub natural_scroll: bool,
}

impl Default for TouchpadConfig {
    fn default() -> Self {
        Self {
            speed_scale: 1.0,
            natural_scroll: true,
        }
    }
}

/// Which [`EventSource`](crate::traits::EventSource) feeds the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Hyprland's `socket2` event stream.
    #[default]
    Hyprland,
    /// JSON events relayed over a Unix socket.
    Relay,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Relay socket path.  Default: `$XDG_RUNTIME_DIR/swipegrd-relay.sock`.
    pub socket: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Default: `$XDG_RUNTIME_DIR/swipegrd.sock`.
    pub socket: Option<PathBuf>,
}

/// One named recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureBinding {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub gesture: GestureConfig,
}

fn default_true() -> bool {
    true
}

impl GestureBinding {
    pub fn new(name: impl Into<String>, gesture: GestureConfig) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            gesture,
        }
    }
}

/// Bindings used when the file lists none: three-finger window switching,
/// four-finger workspace switching, and a vertical overview gesture that
/// accepts either.
pub fn default_bindings() -> Vec<GestureBinding> {
    vec![
        GestureBinding::new(
            "alt-tab",
            GestureConfig {
                follow_natural_scroll: false,
                ..GestureConfig::new([3], Orientation::Horizontal)
            },
        ),
        GestureBinding::new("workspace", GestureConfig::new([4], Orientation::Horizontal)),
        GestureBinding::new("overview", GestureConfig::new([3, 4], Orientation::Vertical)),
    ]
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// The configured bindings, or the defaults if none are listed.
    pub fn bindings(&self) -> Vec<GestureBinding> {
        if self.gestures.is_empty() {
            default_bindings()
        } else {
            self.gestures.clone()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let scale = self.touchpad.speed_scale;
        if scale.is_nan() || scale <= 0.0 {
            return Err(ConfigError(format!(
                "touchpad.speed_scale must be positive, got {}",
                scale
            )));
        }
        for b in &self.gestures {
            if b.gesture.finger_counts.is_empty() {
                return Err(ConfigError(format!("gesture {:?} lists no fingers", b.name)));
            }
        }
        Ok(())
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
