//! Per-style draw functions.
//!
//! Each style is a pure function from [`EffectParams`] to shapes. Every
//! shape's alpha is the base colour faded by [`envelope`], possibly times
//! further factors in 0.0-1.0, so all styles vanish exactly at
//! `progress = 1`. Radii and widths are clamped non-negative because
//! overshooting easings can push `eased` outside 0.0-1.0.

use std::f32::consts::{PI, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::envelope;
use crate::config::{ClickEffectStyle, EffectConfig};
use crate::rendering::color::Rgba;
use crate::rendering::raster::{Point, Shape};

/// Inputs to a style draw function.
#[derive(Debug, Clone, Copy)]
pub struct EffectParams<'a> {
    /// Effect centre in surface pixels.
    pub center: Point,
    /// Linear progress (0.0-1.0).
    pub progress: f32,
    /// Eased progress.
    pub eased: f32,
    /// Base radius with the size multiplier applied.
    pub radius: f32,
    /// Size multiplier.
    pub size: f32,
    /// Force multiplier.
    pub force: f32,
    /// Base colour with the configured opacity applied.
    pub color: Rgba,
    /// Per-click seed for pseudo-random layouts.
    pub seed: u64,
    pub config: &'a EffectConfig,
}

impl EffectParams<'_> {
    /// Base colour faded by the envelope and `factor`.
    fn alpha(&self, factor: f32) -> Rgba {
        self.color.fade(envelope(self.progress) * factor.clamp(0.0, 1.0))
    }

    fn grow(&self, max: f32) -> f32 {
        (max * self.eased).max(0.0)
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

pub type DrawFn = fn(&EffectParams<'_>) -> Vec<Shape>;

const STRATEGIES: [(ClickEffectStyle, DrawFn); 12] = [
    (ClickEffectStyle::Ripple, ripple),
    (ClickEffectStyle::Orb, orb),
    (ClickEffectStyle::Pulse, pulse),
    (ClickEffectStyle::Ring, ring),
    (ClickEffectStyle::Splash, splash),
    (ClickEffectStyle::Spotlight, spotlight),
    (ClickEffectStyle::Particles, particles),
    (ClickEffectStyle::Glow, glow),
    (ClickEffectStyle::Shockwave, shockwave),
    (ClickEffectStyle::Trail, trail),
    (ClickEffectStyle::Burst, burst),
    (ClickEffectStyle::Glitch, glitch),
];

/// Draw function for a style.
pub fn draw_fn(style: ClickEffectStyle) -> DrawFn {
    STRATEGIES
        .iter()
        .find(|(s, _)| *s == style)
        .map(|(_, f)| *f)
        .unwrap_or(ripple)
}

/// Expanding soft-edged disc.
fn ripple(p: &EffectParams<'_>) -> Vec<Shape> {
    vec![Shape::Disc {
        center: p.center,
        radius: p.grow(p.radius),
        hardness: 0.7,
        color: p.alpha(1.0),
    }]
}

/// Soft orb that swells slightly, with a halo.
fn orb(p: &EffectParams<'_>) -> Vec<Shape> {
    let core = (p.radius * 0.6 * (1.0 + 0.25 * p.eased)).max(0.0);
    vec![
        Shape::Glow {
            center: p.center,
            radius: core * 2.0,
            color: p.alpha(p.config.glow_intensity * 0.5),
        },
        Shape::Disc {
            center: p.center,
            radius: core,
            hardness: 0.3,
            color: p.alpha(1.0).lighten(0.15),
        },
    ]
}

/// Growing ring that throbs twice over its life.
fn pulse(p: &EffectParams<'_>) -> Vec<Shape> {
    let throb = 1.0 + 0.1 * (p.progress * 2.0 * TAU).sin();
    let radius = p.grow(p.radius) * throb;
    vec![
        Shape::Disc {
            center: p.center,
            radius: radius * 0.5,
            hardness: 0.2,
            color: p.alpha(0.3),
        },
        Shape::Ring {
            center: p.center,
            radius,
            thickness: (p.radius * 0.12).max(2.0),
            color: p.alpha(1.0),
        },
    ]
}

/// Hollow expanding ring.
fn ring(p: &EffectParams<'_>) -> Vec<Shape> {
    let radius = p.grow(p.radius);
    vec![Shape::Ring {
        center: p.center,
        radius,
        thickness: (radius * 0.15).max(2.0),
        color: p.alpha(1.0),
    }]
}

/// Droplets thrown outward on evenly spaced, slightly jittered angles.
fn splash(p: &EffectParams<'_>) -> Vec<Shape> {
    let mut rng = p.rng();
    let count = p.config.particle_count.max(1);
    let droplet = (p.radius * 0.12 * (1.0 - p.progress * 0.5)).max(1.0);
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32 + rng.gen_range(-0.2..0.2);
            let reach = rng.gen_range(0.7..1.0);
            Shape::Disc {
                center: p.center.offset(angle, p.grow(p.radius * p.force * reach)),
                radius: droplet,
                hardness: 0.5,
                color: p.alpha(1.0),
            }
        })
        .collect()
}

/// Static radial glow that fades out.
fn spotlight(p: &EffectParams<'_>) -> Vec<Shape> {
    vec![Shape::Glow {
        center: p.center,
        radius: p.radius,
        color: p.alpha(1.0),
    }]
}

/// Scattered particles with seeded directions and speeds.
fn particles(p: &EffectParams<'_>) -> Vec<Shape> {
    let mut rng = p.rng();
    (0..p.config.particle_count.max(1))
        .map(|_| {
            let angle = rng.gen_range(0.0..TAU);
            let speed = rng.gen_range(0.5..1.0);
            let dot = rng.gen_range(1.5..4.0) * p.size;
            Shape::Disc {
                center: p.center.offset(angle, p.grow(p.radius * p.force * 1.5 * speed)),
                radius: (dot * (1.0 - p.progress * 0.6)).max(0.5),
                hardness: 0.6,
                color: p.alpha(speed),
            }
        })
        .collect()
}

/// Three stacked glows.
fn glow(p: &EffectParams<'_>) -> Vec<Shape> {
    let swell = 0.8 + 0.2 * p.eased;
    [(1.5, 0.3), (1.0, 0.6), (0.6, 1.0)]
        .into_iter()
        .map(|(scale, strength)| Shape::Glow {
            center: p.center,
            radius: (p.radius * scale * swell).max(0.0),
            color: p.alpha(p.config.glow_intensity * strength),
        })
        .collect()
}

/// Leading ring with a thinner lagging echo.
fn shockwave(p: &EffectParams<'_>) -> Vec<Shape> {
    let radius = p.grow(p.radius * p.force);
    let thickness = (p.radius * 0.1 * (1.0 + p.config.distortion_strength)).max(1.5);
    vec![
        Shape::Ring {
            center: p.center,
            radius: radius * 0.7,
            thickness: thickness * 0.5,
            color: p.alpha(0.5),
        },
        Shape::Ring {
            center: p.center,
            radius,
            thickness,
            color: p.alpha(1.0),
        },
    ]
}

/// Comet tail orbiting the click point.
fn trail(p: &EffectParams<'_>) -> Vec<Shape> {
    let segments = p.config.trail_length.max(1);
    let orbit = p.radius * 0.8;
    let head = p.eased * TAU * p.force;
    let point_at = |k: u32| p.center.offset(head - k as f32 * 0.25, orbit);

    (0..segments)
        .map(|k| {
            let fade = 1.0 - k as f32 / segments as f32;
            Shape::Line {
                from: point_at(k),
                to: point_at(k + 1),
                width: (4.0 * p.size * fade).max(1.0),
                color: p.alpha(fade),
            }
        })
        .collect()
}

/// Rays shooting outward from the click point.
fn burst(p: &EffectParams<'_>) -> Vec<Shape> {
    let rays = p.config.particle_count.clamp(4, 24);
    let inner = p.grow(p.radius * 0.3);
    let outer = (p.radius * p.force * (0.4 + 0.8 * p.eased)).max(inner);
    (0..rays)
        .map(|i| {
            let angle = TAU * i as f32 / rays as f32 + PI / rays as f32;
            Shape::Line {
                from: p.center.offset(angle, inner),
                to: p.center.offset(angle, outer),
                width: (2.0 * p.size).max(1.0),
                color: p.alpha(1.0),
            }
        })
        .collect()
}

/// Horizontal slices jittering around the click point.
///
/// The layout is reseeded twelve times over the effect's life so the slices
/// jump rather than drift; each step is still a pure function of progress.
fn glitch(p: &EffectParams<'_>) -> Vec<Shape> {
    let step = (p.progress * 12.0).floor() as u64;
    let mut rng = StdRng::seed_from_u64(p.seed ^ step.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    let jitter = p.radius * p.config.distortion_strength;
    let slice_height = (p.radius * 0.15).max(1.0);
    let alt = p.color.lighten(0.5);

    (0..6)
        .map(|i| {
            let width = p.radius * 2.0 * rng.gen_range(0.5..1.0);
            let dx = rng.gen_range(-1.0..1.0) * jitter;
            let dy = rng.gen_range(-1.0..1.0) * p.radius;
            let base = if i % 2 == 0 { p.color } else { alt };
            Shape::Rect {
                origin: Point::new(p.center.x - width / 2.0 + dx, p.center.y + dy),
                width,
                height: slice_height,
                color: base.fade(envelope(p.progress)),
            }
        })
        .collect()
}
