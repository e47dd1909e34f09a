//! Cursor appearance configuration.
//!
//! One configuration covers both the minimal cursor (plain sprite, no
//! trail, no glow) and the decorated one. The defaults are the minimal
//! cursor; glow, trail, motion blur and idle hiding are opt-in.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::effect::{clamp_or, clamp_or_f64};

/// Cursor sprite style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CursorStyle {
    /// Classic arrow pointer.
    #[default]
    Arrow,
    /// Pointing hand.
    Hand,
    /// Filled dot in the cursor colour.
    Dot,
}

/// Sprite colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CursorTheme {
    /// White fill, dark outline.
    #[default]
    Light,
    /// Dark fill, white outline.
    Dark,
}

/// User supplied cursor image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomCursorImage {
    /// Base64 encoded PNG.
    pub data_base64: String,
    /// Hotspot X in image pixels.
    pub hotspot_x: i32,
    /// Hotspot Y in image pixels.
    pub hotspot_y: i32,
}

/// Cursor appearance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CursorAppearance {
    /// Draw the cursor at all.
    pub visible: bool,
    /// Sprite style.
    pub style: CursorStyle,
    /// Sprite theme.
    pub theme: CursorTheme,
    /// Accent colour for the dot style, glow and trail (CSS colour string).
    pub color: String,
    /// Cursor scale (1.0 = 24px tall sprite).
    pub size: f32,
    /// Optional custom sprite replacing the built-in styles.
    pub custom_image: Option<CustomCursorImage>,
    /// Soft glow under the cursor.
    pub glow: bool,
    /// Draw a trail behind the cursor.
    pub trail: bool,
    /// Force the full-path trail mode regardless of recording length.
    pub full_path: bool,
    /// Points kept by the short trail.
    pub trail_length: u32,
    /// Short trail point lifetime in seconds.
    pub trail_lifetime_secs: f64,
    /// Trail stroke width in pixels.
    pub trail_width: f32,
    /// Ghost copies behind a fast moving cursor.
    pub motion_blur: bool,
    /// Speed in pixels per second above which motion blur kicks in.
    pub motion_blur_threshold: f32,
    /// Idle breathing animation in the hover state.
    pub breathing: bool,
    /// Fade the cursor out when it has not moved for a while.
    pub hide_when_idle: bool,
    /// Seconds without movement before the cursor hides.
    pub idle_timeout_secs: f64,
}

impl Default for CursorAppearance {
    fn default() -> Self {
        Self {
            visible: true,
            style: CursorStyle::default(),
            theme: CursorTheme::default(),
            color: "#3B82F6".to_string(),
            size: 1.0,
            custom_image: None,
            glow: false,
            trail: false,
            full_path: false,
            trail_length: 20,
            trail_lifetime_secs: 0.5,
            trail_width: 4.0,
            motion_blur: false,
            motion_blur_threshold: 1200.0,
            breathing: true,
            hide_when_idle: false,
            idle_timeout_secs: 3.0,
        }
    }
}

impl CursorAppearance {
    /// Validate and clamp settings to acceptable ranges.
    pub fn validate(&mut self) {
        self.size = clamp_or(self.size, 0.25, 4.0, 1.0);
        self.trail_length = self.trail_length.clamp(1, 256);
        self.trail_lifetime_secs = clamp_or_f64(self.trail_lifetime_secs, 0.05, 5.0, 0.5);
        self.trail_width = clamp_or(self.trail_width, 0.5, 32.0, 4.0);
        self.motion_blur_threshold = clamp_or(self.motion_blur_threshold, 0.0, 100_000.0, 1200.0);
        self.idle_timeout_secs = clamp_or_f64(self.idle_timeout_secs, 0.1, 60.0, 3.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_minimal_cursor() {
        let config = CursorAppearance::default();
        assert!(config.visible);
        assert_eq!(config.style, CursorStyle::Arrow);
        assert!(!config.glow);
        assert!(!config.trail);
        assert!(!config.motion_blur);
        assert!(!config.hide_when_idle);
        assert_eq!(config.trail_lifetime_secs, 0.5);
    }

    #[test]
    fn test_validate() {
        let mut config = CursorAppearance {
            size: 0.0,
            trail_length: 0,
            trail_lifetime_secs: f64::NAN,
            ..Default::default()
        };
        config.validate();
        assert_eq!(config.size, 0.25);
        assert_eq!(config.trail_length, 1);
        assert_eq!(config.trail_lifetime_secs, 0.5);
    }

    #[test]
    fn test_custom_image_json() {
        let config: CursorAppearance = serde_json::from_str(
            r#"{"customImage":{"dataBase64":"AAAA","hotspotX":3,"hotspotY":4},"theme":"dark"}"#,
        )
        .unwrap();
        let custom = config.custom_image.unwrap();
        assert_eq!(custom.hotspot_x, 3);
        assert_eq!(custom.hotspot_y, 4);
        assert_eq!(config.theme, CursorTheme::Dark);
    }
}
