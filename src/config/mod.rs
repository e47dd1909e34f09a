//! Compositor configuration.
//!
//! The project store owns these settings and hands the compositor an
//! immutable snapshot every frame. There is no global configuration.
//!
//! ## Architecture
//!
//! - `EffectConfig`: click effect style, colours, timing and style knobs
//! - `CursorAppearance`: cursor sprite, glow, trail and motion blur
//! - `PathBufferConfig`: bounded trail history thresholds
//! - `ReplayConfig`: all of the above plus compositor-level settings

pub mod cursor;
pub mod effect;
pub mod path;

pub use cursor::{CursorAppearance, CursorStyle, CursorTheme, CustomCursorImage};
pub use effect::{ClickEffectStyle, EasingKind, EffectConfig};
pub use path::PathBufferConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;
use ts_rs::TS;

use crate::error::{ReplayResult, ResultExt};
use effect::{clamp_or, clamp_or_f64};

/// How the surface is prepared before layers are painted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "mode", rename_all = "camelCase")]
#[ts(export)]
pub enum BackgroundMode {
    /// Clear to fully transparent.
    #[default]
    Clear,
    /// Multiply existing alpha by `retain`, leaving a smear of earlier frames.
    Fade { retain: f32 },
    /// Paint over whatever the host left on the surface.
    Preserve,
}

/// Paint order of the cursor and click effect layers.
///
/// The trail is always painted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum LayerOrder {
    /// Trail, click effects, cursor.
    #[default]
    CursorOnTop,
    /// Trail, cursor, click effects.
    EffectsOnTop,
}

/// Complete compositor configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ReplayConfig {
    pub effects: EffectConfig,
    pub cursor: CursorAppearance,
    pub path: PathBufferConfig,
    pub background: BackgroundMode,
    pub layer_order: LayerOrder,
    /// Seconds after a click during which the cursor shows as pressed.
    pub press_window_secs: f64,
    /// Move count above which the full-path trail engages automatically.
    pub full_path_threshold: u32,
    /// Seconds of history drawn in full-path mode.
    pub full_path_window_secs: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            effects: EffectConfig::default(),
            cursor: CursorAppearance::default(),
            path: PathBufferConfig::default(),
            background: BackgroundMode::default(),
            layer_order: LayerOrder::default(),
            press_window_secs: 0.1,
            full_path_threshold: 1000,
            full_path_window_secs: 2.0,
        }
    }
}

impl ReplayConfig {
    /// Validate and clamp settings to acceptable ranges.
    pub fn validate(&mut self) {
        self.effects.validate();
        self.cursor.validate();
        self.path.validate();
        if let BackgroundMode::Fade { retain } = &mut self.background {
            *retain = clamp_or(*retain, 0.0, 1.0, 0.5);
        }
        self.press_window_secs = clamp_or_f64(self.press_window_secs, 0.0, 2.0, 0.1);
        self.full_path_window_secs = clamp_or_f64(self.full_path_window_secs, 0.1, 30.0, 2.0);
    }

    /// Reset all settings to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parse and validate a configuration snapshot from JSON.
    pub fn from_json(json: &str) -> ReplayResult<Self> {
        let mut config: ReplayConfig = serde_json::from_str(json)?;
        config.validate();
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> ReplayResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config = Self::from_json(&json)?;
        log::debug!("[CONFIG] Loaded replay config from {:?}", path);
        Ok(config)
    }
}
