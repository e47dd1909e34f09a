//! Easing curves for effect progress.

use crate::config::EasingKind;

impl EasingKind {
    /// Map linear progress `t` (0.0-1.0) through the curve.
    ///
    /// Input is clamped. `Elastic` and `Bounce` may overshoot 1.0 briefly;
    /// callers that need a bounded value clamp the result.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            EasingKind::Linear => t,
            EasingKind::CubicOut => 1.0 - (1.0 - t).powi(3),
            EasingKind::EaseInOut => bezier_easing::bezier_easing(0.42, 0.0, 0.58, 1.0)
                .map(|ease| ease(t))
                .unwrap_or(t),
            EasingKind::Bounce => bounce_out(t),
            EasingKind::Elastic => elastic_out(t),
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

fn elastic_out(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let c4 = (2.0 * std::f32::consts::PI) / 3.0;
    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EasingKind; 5] = [
        EasingKind::Linear,
        EasingKind::CubicOut,
        EasingKind::EaseInOut,
        EasingKind::Bounce,
        EasingKind::Elastic,
    ];

    #[test]
    fn test_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-3, "{:?} at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-3, "{:?} at 1", easing);
        }
    }

    #[test]
    fn test_cubic_out_front_loaded() {
        assert!(EasingKind::CubicOut.apply(0.5) > 0.5);
        assert_eq!(EasingKind::CubicOut.apply(0.5), 0.875);
    }

    #[test]
    fn test_ease_in_out_symmetric() {
        let mid = EasingKind::EaseInOut.apply(0.5);
        assert!((mid - 0.5).abs() < 0.01);
        assert!(EasingKind::EaseInOut.apply(0.1) < 0.1);
    }

    #[test]
    fn test_elastic_overshoots() {
        let peak = (1..100)
            .map(|i| EasingKind::Elastic.apply(i as f32 / 100.0))
            .fold(0.0f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_out_of_range_input_clamped() {
        for easing in ALL {
            assert_eq!(easing.apply(-2.0), easing.apply(0.0));
            assert_eq!(easing.apply(7.0), easing.apply(1.0));
            assert!(easing.apply(f32::NAN).is_finite());
        }
    }
}
