//! Click effect configuration.
//!
//! Snapshot of the effect settings chosen in the editor. The compositor
//! reads it once per frame and never mutates it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Visual style of the click effect animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ClickEffectStyle {
    /// Expanding soft-edged disc.
    #[default]
    Ripple,
    /// Glowing orb that swells slightly and fades.
    Orb,
    /// Ring that throbs while growing.
    Pulse,
    /// Hollow expanding ring.
    Ring,
    /// Droplets thrown outward.
    Splash,
    /// Static radial glow.
    Spotlight,
    /// Scattered particles with seeded directions.
    Particles,
    /// Layered soft glow.
    Glow,
    /// Double ring with a lagging echo.
    Shockwave,
    /// Comet tail orbiting the click point.
    Trail,
    /// Rays radiating from the click point.
    Burst,
    /// Horizontal slices jittering around the click point.
    Glitch,
}

impl ClickEffectStyle {
    pub const ALL: [ClickEffectStyle; 12] = [
        ClickEffectStyle::Ripple,
        ClickEffectStyle::Orb,
        ClickEffectStyle::Pulse,
        ClickEffectStyle::Ring,
        ClickEffectStyle::Splash,
        ClickEffectStyle::Spotlight,
        ClickEffectStyle::Particles,
        ClickEffectStyle::Glow,
        ClickEffectStyle::Shockwave,
        ClickEffectStyle::Trail,
        ClickEffectStyle::Burst,
        ClickEffectStyle::Glitch,
    ];
}

/// Named easing curve applied to effect progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum EasingKind {
    Linear,
    #[default]
    CubicOut,
    EaseInOut,
    Bounce,
    Elastic,
}

/// Click effect settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct EffectConfig {
    /// Draw click effects at all.
    pub enabled: bool,
    /// Effect style.
    pub style: ClickEffectStyle,
    /// Colour override for every click (CSS colour string).
    pub color: Option<String>,
    /// Default colour for primary clicks.
    pub primary_color: String,
    /// Default colour for secondary clicks.
    pub secondary_color: String,
    /// Peak effect opacity (0.0-1.0).
    pub opacity: f32,
    /// Base effect radius in pixels before the size multiplier.
    pub base_radius: f32,
    /// Size multiplier.
    pub size: f32,
    /// Force multiplier (how far effects travel outward).
    pub force: f32,
    /// Easing applied to progress.
    pub easing: EasingKind,
    /// Seconds between the click and the start of its effect.
    pub delay_secs: f64,
    /// Effect duration in seconds.
    pub duration_secs: f64,
    /// Particle count for particle-based styles.
    pub particle_count: u32,
    /// Glow intensity (0.0-1.0).
    pub glow_intensity: f32,
    /// Segment count for the trail style.
    pub trail_length: u32,
    /// Slice displacement strength for the glitch and shockwave styles (0.0-1.0).
    pub distortion_strength: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            style: ClickEffectStyle::default(),
            color: None,
            primary_color: "#3B82F6".to_string(),
            secondary_color: "#EF4444".to_string(),
            opacity: 0.5,
            base_radius: 30.0,
            size: 1.0,
            force: 1.0,
            easing: EasingKind::default(),
            delay_secs: 0.08,
            duration_secs: 0.6,
            particle_count: 12,
            glow_intensity: 0.6,
            trail_length: 8,
            distortion_strength: 0.5,
        }
    }
}

impl EffectConfig {
    /// Validate and clamp settings to acceptable ranges.
    pub fn validate(&mut self) {
        self.opacity = clamp_or(self.opacity, 0.0, 1.0, 0.5);
        self.base_radius = clamp_or(self.base_radius, 1.0, 400.0, 30.0);
        self.size = clamp_or(self.size, 0.1, 5.0, 1.0);
        self.force = clamp_or(self.force, 0.1, 5.0, 1.0);
        self.glow_intensity = clamp_or(self.glow_intensity, 0.0, 1.0, 0.6);
        self.distortion_strength = clamp_or(self.distortion_strength, 0.0, 1.0, 0.5);
        self.delay_secs = clamp_or_f64(self.delay_secs, 0.0, 5.0, 0.08);
        self.duration_secs = clamp_or_f64(self.duration_secs, 0.05, 10.0, 0.6);
        self.particle_count = self.particle_count.clamp(1, 64);
        self.trail_length = self.trail_length.clamp(1, 32);
    }
}

/// Clamp a value into range, replacing NaN with a fallback.
pub(crate) fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

pub(crate) fn clamp_or_f64(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
