//! Trail history for the cursor.
//!
//! Two mutually exclusive modes:
//! - `PathBuffer`: bounded, adaptively sampled history of every resolved
//!   position. Used for long recordings or when the full path is requested.
//! - `ShortTrail`: a small ring of recent points whose opacity decays
//!   linearly over a fixed lifetime.
//!
//! Both store pixel-space points and are owned by the compositor.

use std::collections::VecDeque;

use crate::config::PathBufferConfig;

/// Points at or below this opacity are dropped from the short trail.
const MIN_TRAIL_OPACITY: f32 = 0.01;

/// One stored cursor position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    /// Surface X in pixels.
    pub x: f32,
    /// Surface Y in pixels.
    pub y: f32,
    /// Playback time in seconds.
    pub timestamp: f64,
    /// Opacity (0.0-1.0).
    pub opacity: f32,
}

impl TrailPoint {
    pub fn new(x: f32, y: f32, timestamp: f64) -> Self {
        Self {
            x,
            y,
            timestamp,
            opacity: 1.0,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.timestamp.is_finite()
    }
}

/// Which trail representation is active for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailMode {
    Short,
    FullPath,
}

impl TrailMode {
    /// Full-path mode engages when forced or when the recording has more
    /// than `threshold` move samples.
    pub fn select(move_count: usize, threshold: u32, forced: bool) -> Self {
        if forced || move_count > threshold as usize {
            TrailMode::FullPath
        } else {
            TrailMode::Short
        }
    }
}

// ============================================================================
// Path Buffer
// ============================================================================

/// Bounded history with adaptive sampling.
///
/// Only every Nth `add_point` call is stored, with N growing as the buffer
/// fills. When the length exceeds `max_size` the oldest points are dropped
/// so that `trim_fraction * max_size` of the newest remain. The resulting
/// jump in trail density is expected.
#[derive(Debug, Clone)]
pub struct PathBuffer {
    config: PathBufferConfig,
    points: Vec<TrailPoint>,
    /// Number of `add_point` calls since the last clear.
    insert_count: u64,
}

impl PathBuffer {
    pub fn new(config: PathBufferConfig) -> Self {
        let mut config = config;
        config.validate();
        Self {
            config,
            points: Vec::new(),
            insert_count: 0,
        }
    }

    /// Replace thresholds without discarding history.
    pub fn set_config(&mut self, config: &PathBufferConfig) {
        if &self.config == config {
            return;
        }
        self.config = config.clone();
        self.config.validate();
        self.trim_if_needed();
    }

    /// Current sampling rate derived from the buffer length.
    pub fn sample_rate(&self) -> u64 {
        let len = self.points.len();
        if len >= self.config.high_threshold as usize {
            3
        } else if len >= self.config.medium_threshold as usize {
            2
        } else {
            1
        }
    }

    /// Offer a point to the buffer. Returns true when it was stored.
    pub fn add_point(&mut self, point: TrailPoint) -> bool {
        if !point.is_finite() {
            log::trace!("[PATH_BUFFER] Ignoring non-finite point {:?}", point);
            return false;
        }

        let rate = self.sample_rate();
        let call = self.insert_count;
        self.insert_count += 1;
        if call % rate != 0 {
            return false;
        }

        self.points.push(point);
        self.trim_if_needed();
        true
    }

    fn trim_if_needed(&mut self) {
        if self.points.len() <= self.config.max_size as usize {
            return;
        }
        let keep = self.config.retained_len().min(self.points.len());
        let dropped = self.points.len() - keep;
        self.points.drain(..dropped);
        log::debug!(
            "[PATH_BUFFER] Trimmed {} oldest points, {} remain",
            dropped,
            self.points.len()
        );
    }

    /// Points with `start <= timestamp <= end`, oldest first.
    ///
    /// Linear scan; reads cover short windows so this stays cheap even when
    /// the buffer itself is large.
    pub fn points_in_range(&self, start: f64, end: f64) -> impl Iterator<Item = &TrailPoint> {
        self.points
            .iter()
            .filter(move |p| p.timestamp >= start && p.timestamp <= end)
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.insert_count = 0;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn config(&self) -> &PathBufferConfig {
        &self.config
    }
}

// ============================================================================
// Short Trail
// ============================================================================

/// Ring of the most recent points with linear opacity decay.
#[derive(Debug, Clone)]
pub struct ShortTrail {
    capacity: usize,
    lifetime: f64,
    points: VecDeque<TrailPoint>,
}

impl ShortTrail {
    pub fn new(capacity: usize, lifetime: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lifetime: lifetime.max(f64::EPSILON),
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Update limits, dropping the oldest points if the ring shrank.
    pub fn set_limits(&mut self, capacity: usize, lifetime: f64) {
        self.capacity = capacity.max(1);
        self.lifetime = lifetime.max(f64::EPSILON);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn push(&mut self, point: TrailPoint) {
        if !point.is_finite() {
            return;
        }
        // Time moved backwards (seek): the ring no longer describes the past.
        if self
            .points
            .back()
            .is_some_and(|last| point.timestamp < last.timestamp)
        {
            self.points.clear();
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Recompute opacities for `now` and drop expired points.
    ///
    /// Opacity is `1 - age / lifetime`; points at or below 0.01 are removed.
    pub fn update(&mut self, now: f64) {
        if !now.is_finite() {
            return;
        }
        if self.points.back().is_some_and(|last| last.timestamp > now) {
            self.points.clear();
            return;
        }
        let lifetime = self.lifetime;
        for point in self.points.iter_mut() {
            let age = now - point.timestamp;
            point.opacity = (1.0 - age / lifetime).clamp(0.0, 1.0) as f32;
        }
        self.points.retain(|p| p.opacity > MIN_TRAIL_OPACITY);
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(i: usize) -> TrailPoint {
        TrailPoint::new(i as f32, i as f32, i as f64 * 0.016)
    }

    #[test]
    fn test_six_thousand_points_stay_bounded() {
        let mut buffer = PathBuffer::new(PathBufferConfig::default());
        for i in 0..6000 {
            buffer.add_point(point(i));
        }
        assert!(buffer.len() <= 5000);
        assert!(buffer.len() >= 4000);
    }

    #[test]
    fn test_sample_rate_thresholds() {
        let mut buffer = PathBuffer::new(PathBufferConfig::default());
        assert_eq!(buffer.sample_rate(), 1);
        for i in 0..3000 {
            assert!(buffer.add_point(point(i)));
        }
        assert_eq!(buffer.len(), 3000);
        assert_eq!(buffer.sample_rate(), 2);

        // Every other call is stored at rate 2
        let stored = (3000..3010).filter(|&i| buffer.add_point(point(i))).count();
        assert_eq!(stored, 5);
    }

    #[test]
    fn test_trim_keeps_newest_fraction() {
        let config = PathBufferConfig {
            max_size: 100,
            medium_threshold: 100,
            high_threshold: 100,
            trim_fraction: 0.8,
        };
        let mut buffer = PathBuffer::new(config);
        for i in 0..100 {
            assert!(buffer.add_point(point(i)));
        }
        // Full buffer samples every 3rd call: 100 and 101 are skipped,
        // 102 overflows and triggers the trim.
        assert!(!buffer.add_point(point(100)));
        assert!(!buffer.add_point(point(101)));
        assert!(buffer.add_point(point(102)));
        assert_eq!(buffer.len(), 80);
        let kept: Vec<f32> = buffer.points_in_range(f64::MIN, f64::MAX).map(|p| p.x).collect();
        assert_eq!(kept.first().copied(), Some(21.0));
        assert_eq!(kept.last().copied(), Some(102.0));

        // Points added after the trim accumulate on top of the retained slice
        let before = buffer.len();
        let stored = (103..113).filter(|&i| buffer.add_point(point(i))).count();
        assert_eq!(buffer.len(), before + stored);
        assert!(buffer.len() <= 100);
    }

    #[test]
    fn test_never_exceeds_max_size() {
        let config = PathBufferConfig {
            max_size: 50,
            medium_threshold: 20,
            high_threshold: 40,
            trim_fraction: 0.8,
        };
        let mut buffer = PathBuffer::new(config);
        for i in 0..10_000 {
            buffer.add_point(point(i));
            assert!(buffer.len() <= 50);
        }
    }

    #[test]
    fn test_points_in_range() {
        let mut buffer = PathBuffer::new(PathBufferConfig::default());
        for i in 0..100 {
            buffer.add_point(TrailPoint::new(0.0, 0.0, i as f64 * 0.1));
        }
        let count = buffer.points_in_range(2.0, 3.0).count();
        assert_eq!(count, 11);
        assert_eq!(buffer.points_in_range(50.0, 60.0).count(), 0);
    }

    #[test]
    fn test_clear_resets_sampling() {
        let mut buffer = PathBuffer::new(PathBufferConfig::default());
        for i in 0..3500 {
            buffer.add_point(point(i));
        }
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.sample_rate(), 1);
        assert!(buffer.add_point(point(0)));
    }

    #[test]
    fn test_non_finite_points_rejected() {
        let mut buffer = PathBuffer::new(PathBufferConfig::default());
        assert!(!buffer.add_point(TrailPoint::new(f32::NAN, 0.0, 0.0)));
        assert!(!buffer.add_point(TrailPoint::new(0.0, 0.0, f64::INFINITY)));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_short_trail_decay() {
        let mut trail = ShortTrail::new(20, 0.5);
        trail.push(TrailPoint::new(0.0, 0.0, 1.0));
        trail.push(TrailPoint::new(1.0, 1.0, 1.25));

        trail.update(1.25);
        let opacities: Vec<f32> = trail.points().map(|p| p.opacity).collect();
        assert_eq!(opacities, vec![0.5, 1.0]);

        // First point reaches zero opacity and is removed
        trail.update(1.5);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.points().next().map(|p| p.opacity), Some(0.5));

        trail.update(2.0);
        assert!(trail.is_empty());
    }

    #[test]
    fn test_short_trail_capacity() {
        let mut trail = ShortTrail::new(3, 10.0);
        for i in 0..10 {
            trail.push(TrailPoint::new(i as f32, 0.0, i as f64 * 0.01));
        }
        let xs: Vec<f32> = trail.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![7.0, 8.0, 9.0]);

        trail.set_limits(2, 10.0);
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn test_short_trail_clears_on_backward_seek() {
        let mut trail = ShortTrail::new(10, 0.5);
        trail.push(TrailPoint::new(0.0, 0.0, 5.0));
        trail.push(TrailPoint::new(0.0, 0.0, 5.1));
        trail.update(1.0);
        assert!(trail.is_empty());

        trail.push(TrailPoint::new(0.0, 0.0, 5.0));
        trail.push(TrailPoint::new(0.0, 0.0, 2.0));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_trail_mode_select() {
        assert_eq!(TrailMode::select(10, 1000, false), TrailMode::Short);
        assert_eq!(TrailMode::select(1000, 1000, false), TrailMode::Short);
        assert_eq!(TrailMode::select(1001, 1000, false), TrailMode::FullPath);
        assert_eq!(TrailMode::select(0, 1000, true), TrailMode::FullPath);
    }
}
