//! Click effect engine.
//!
//! For every click whose effect window contains the query time, derives a
//! progress value and hands it to the style's draw function. Nothing is
//! carried between frames: an effect at time `t` depends only on `t`, the
//! click and the config, so scrubbing can never desynchronise it.
//!
//! ## Window
//!
//! A click at `ts` is active while `t - ts` lies in `[delay, delay + duration)`.
//! Progress runs linearly from 0 at the window start to 1 at its end; the
//! configured easing is applied on top.

mod styles;

pub use styles::{draw_fn, DrawFn, EffectParams};

use crate::config::EffectConfig;
use crate::events::ClickEvent;

use super::color::click_color;
use super::coord::{Coord, FrameSpace, Size, UvSpace};
use super::raster::{Point, Shape};

/// One click effect evaluated at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInstance {
    /// Timestamp of the click that spawned the effect.
    pub click_time: f64,
    /// Effect centre in surface pixels.
    pub center: Point,
    /// Linear progress (0.0-1.0).
    pub progress: f32,
    /// Progress after easing. May leave 0.0-1.0 for overshooting curves.
    pub eased: f32,
    /// Overall opacity; reaches 0 at `progress = 1`.
    pub opacity: f32,
    /// Shapes to paint, bottom to top.
    pub shapes: Vec<Shape>,
}

/// Clicks whose effect window contains `time`.
///
/// `clicks` must be sorted by timestamp; the active clicks then form one
/// contiguous run found with two binary searches. Negative or non-finite
/// times, and a non-finite delay or duration, have no active effects.
pub fn active_effects_at(
    time: f64,
    clicks: &[ClickEvent],
    delay: f64,
    duration: f64,
) -> &[ClickEvent] {
    let window_valid = delay.is_finite() && duration.is_finite() && duration > 0.0;
    if !time.is_finite() || time < 0.0 || !window_valid {
        return &[];
    }
    // Both predicates are true for a prefix of the sorted clicks.
    let start = clicks.partition_point(|c| time - c.timestamp >= delay + duration);
    let end = clicks.partition_point(|c| time - c.timestamp >= delay);
    if start >= end {
        return &[];
    }
    &clicks[start..end]
}

/// Linear effect progress for a click at `click_time`, clamped to 0.0-1.0.
pub fn progress_at(time: f64, click_time: f64, delay: f64, duration: f64) -> f32 {
    if duration.is_nan() || duration <= 0.0 {
        return 1.0;
    }
    let progress = (time - click_time - delay) / duration;
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0) as f32
}

/// Opacity envelope shared by every style: linear decay to zero.
pub fn envelope(progress: f32) -> f32 {
    (1.0 - progress).clamp(0.0, 1.0)
}

/// Evaluate every active click effect at `time` on a surface of `size`.
pub fn evaluate(
    time: f64,
    clicks: &[ClickEvent],
    config: &EffectConfig,
    size: Size<FrameSpace>,
) -> Vec<EffectInstance> {
    if !config.enabled || size.is_empty() {
        return Vec::new();
    }

    let draw = draw_fn(config.style);
    active_effects_at(time, clicks, config.delay_secs, config.duration_secs)
        .iter()
        .filter_map(|click| {
            let center = Coord::<UvSpace>::new(click.x, click.y).to_frame(size);
            if !center.is_finite() {
                return None;
            }
            let (cx, cy) = center.as_f32();
            let progress =
                progress_at(time, click.timestamp, config.delay_secs, config.duration_secs);
            let eased = config.easing.apply(progress);
            let color = click_color(click, config);
            let opacity = color.a * config.opacity * envelope(progress);

            let params = EffectParams {
                center: Point::new(cx, cy),
                progress,
                eased,
                radius: config.base_radius * config.size,
                size: config.size,
                force: config.force,
                color: color.fade(config.opacity),
                seed: click_seed(click),
                config,
            };
            let shapes: Vec<Shape> = draw(&params)
                .into_iter()
                .filter(|shape| shape.alpha() > 0.0)
                .collect();

            Some(EffectInstance {
                click_time: click.timestamp,
                center: params.center,
                progress,
                eased,
                opacity,
                shapes,
            })
        })
        .collect()
}

/// Stable per-click seed for styles with pseudo-random layout.
fn click_seed(click: &ClickEvent) -> u64 {
    click.timestamp.to_bits() ^ click.x.to_bits().rotate_left(21) ^ click.y.to_bits().rotate_left(42)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClickEffectStyle;
    use crate::events::ClickKind;

    fn click(ts: f64) -> ClickEvent {
        ClickEvent::new(ts, 0.5, 0.5, ClickKind::Primary)
    }

    fn size() -> Size<FrameSpace> {
        Size::from_u32(800, 600)
    }

    #[test]
    fn test_window_scenario() {
        let clicks = vec![click(2.0)];
        assert_eq!(active_effects_at(2.5, &clicks, 0.08, 0.6).len(), 1);
        assert!(active_effects_at(1.9, &clicks, 0.08, 0.6).is_empty());
        assert!(active_effects_at(2.7, &clicks, 0.08, 0.6).is_empty());

        let progress = progress_at(2.5, 2.0, 0.08, 0.6);
        assert!((progress - 0.7).abs() < 1e-4);
    }

    #[test]
    fn test_window_bounds_half_open() {
        let clicks = vec![click(1.0)];
        // Just before the delay elapses
        assert!(active_effects_at(1.0 + 0.08 - 1e-9, &clicks, 0.08, 0.6).is_empty());
        assert_eq!(active_effects_at(1.5, &clicks, 0.5, 0.5).len(), 1);
        assert!(active_effects_at(2.0, &clicks, 0.5, 0.5).is_empty());
    }

    #[test]
    fn test_overlapping_clicks_contiguous() {
        let clicks: Vec<ClickEvent> = [0.0, 1.0, 1.2, 1.3, 5.0].into_iter().map(click).collect();
        let active = active_effects_at(1.5, &clicks, 0.08, 0.6);
        let times: Vec<f64> = active.iter().map(|c| c.timestamp).collect();
        assert_eq!(times, vec![1.0, 1.2, 1.3]);
    }

    #[test]
    fn test_invalid_times_have_no_effects() {
        let clicks = vec![click(0.0)];
        assert!(active_effects_at(f64::NAN, &clicks, 0.0, 0.6).is_empty());
        assert!(active_effects_at(-0.1, &clicks, 0.0, 0.6).is_empty());
        assert!(active_effects_at(f64::INFINITY, &clicks, 0.0, 0.6).is_empty());
        assert!(active_effects_at(0.1, &[], 0.0, 0.6).is_empty());
    }

    #[test]
    fn test_invalid_window_has_no_effects() {
        let clicks = vec![click(1.0)];
        assert!(active_effects_at(500.0, &clicks, 0.08, f64::NAN).is_empty());
        assert!(active_effects_at(1.2, &clicks, 0.08, f64::NAN).is_empty());
        assert!(active_effects_at(500.0, &clicks, 0.08, f64::INFINITY).is_empty());
        assert!(active_effects_at(1.2, &clicks, f64::NAN, 0.6).is_empty());
        assert!(active_effects_at(1.2, &clicks, 0.08, 0.0).is_empty());
        assert_eq!(progress_at(1.2, 1.0, 0.08, f64::NAN), 1.0);

        // Unvalidated config straight into the evaluator
        let config = EffectConfig {
            duration_secs: f64::NAN,
            ..Default::default()
        };
        assert!(evaluate(500.0, &clicks, &config, size()).is_empty());
    }

    #[test]
    fn test_evaluate_centers_and_colors() {
        let mut secondary = click(1.0);
        secondary.kind = ClickKind::Secondary;
        let config = EffectConfig::default();
        let effects = evaluate(1.3, &[secondary], &config, size());
        assert_eq!(effects.len(), 1);
        let effect = &effects[0];
        assert_eq!(effect.center, Point::new(400.0, 300.0));
        assert!(effect.opacity > 0.0 && effect.opacity < config.opacity);
        let first = effect.shapes.first().map(|s| s.color()).unwrap();
        assert_eq!((first.r, first.g, first.b), (0xEF, 0x44, 0x44));
    }

    #[test]
    fn test_evaluate_disabled_or_empty_surface() {
        let clicks = vec![click(1.0)];
        let config = EffectConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(evaluate(1.3, &clicks, &config, size()).is_empty());
        assert!(evaluate(1.3, &clicks, &EffectConfig::default(), Size::from_u32(0, 0)).is_empty());
    }

    #[test]
    fn test_every_style_terminates_with_window() {
        for style in ClickEffectStyle::ALL {
            let config = EffectConfig {
                style,
                ..Default::default()
            };
            let clicks = vec![click(1.0)];
            let start = 1.0 + config.delay_secs;
            let end = start + config.duration_secs;

            assert!(evaluate(start - 1e-6, &clicks, &config, size()).is_empty(), "{:?}", style);
            assert!(evaluate(end, &clicks, &config, size()).is_empty(), "{:?}", style);

            // Opacity decays monotonically across the window
            let mut last = f32::MAX;
            for step in 0..20 {
                let t = start + config.duration_secs * step as f64 / 20.0;
                let effects = evaluate(t, &clicks, &config, size());
                assert_eq!(effects.len(), 1, "{:?} at {}", style, t);
                let opacity = effects[0].opacity;
                assert!(opacity >= 0.0 && opacity <= last, "{:?} at {}", style, t);
                last = opacity;
            }
        }
    }

    #[test]
    fn test_evaluate_is_stateless() {
        for style in ClickEffectStyle::ALL {
            let config = EffectConfig {
                style,
                ..Default::default()
            };
            let clicks = vec![click(3.0), click(3.1)];
            let a = evaluate(3.4, &clicks, &config, size());
            // Scrub elsewhere and back
            let _ = evaluate(0.5, &clicks, &config, size());
            let b = evaluate(3.4, &clicks, &config, size());
            assert_eq!(a, b, "{:?}", style);
        }
    }
}
