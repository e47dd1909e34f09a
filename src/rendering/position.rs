//! Pointer position resolution.
//!
//! Maps a playback time onto the sparse move log with piecewise-linear
//! interpolation. Pure and O(log n): the bracketing pair is found with a
//! binary search over the sorted timestamps.

use super::coord::{Coord, UvSpace};
use crate::events::{EventLog, MoveSample};

/// Resolve the pointer position at `time` seconds.
///
/// Returns `None` for an empty log. Times before the first sample hold the
/// first position, times after the last hold the last. A non-finite time
/// also holds the first position.
pub fn resolve(samples: &[MoveSample], time: f64) -> Option<Coord<UvSpace>> {
    let first = samples.first()?;
    if !time.is_finite() {
        return Some(Coord::new(first.x, first.y));
    }

    // Number of samples at or before `time`.
    let idx = samples.partition_point(|s| s.timestamp <= time);
    if idx == 0 {
        return Some(Coord::new(first.x, first.y));
    }
    if idx == samples.len() {
        let last = &samples[samples.len() - 1];
        return Some(Coord::new(last.x, last.y));
    }

    let a = &samples[idx - 1];
    let b = &samples[idx];
    let span = b.timestamp - a.timestamp;
    if span <= 0.0 {
        return Some(Coord::new(a.x, a.y));
    }

    let t = (time - a.timestamp) / span;
    Some(Coord::new(a.x, a.y).lerp(Coord::new(b.x, b.y), t))
}

/// Timestamp of the most recent sample at which the pointer actually moved,
/// at or before `time`.
///
/// Used for idle detection. The start of every stationary run is
/// precomputed by [`EventLog`], so this is one binary search.
pub fn last_movement_time(log: &EventLog, time: f64) -> Option<f64> {
    if !time.is_finite() {
        return None;
    }
    let samples = log.moves();
    let idx = samples.partition_point(|s| s.timestamp <= time);
    if idx == 0 {
        return None;
    }
    if idx < samples.len() {
        // Still travelling between two samples.
        let (a, b) = (&samples[idx - 1], &samples[idx]);
        if a.x != b.x || a.y != b.y {
            return Some(time);
        }
    }
    log.arrivals().get(idx - 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<MoveSample> {
        vec![
            MoveSample::new(0.0, 0.0, 0.0),
            MoveSample::new(1.0, 1.0, 1.0),
            MoveSample::new(2.0, 0.5, 0.25),
        ]
    }

    #[test]
    fn test_empty_log() {
        assert!(resolve(&[], 1.0).is_none());
    }

    #[test]
    fn test_midpoint_interpolation() {
        let log = vec![MoveSample::new(0.0, 0.0, 0.0), MoveSample::new(1.0, 1.0, 1.0)];
        let pos = resolve(&log, 0.5).unwrap();
        assert_eq!(pos.x, 0.5);
        assert_eq!(pos.y, 0.5);
    }

    #[test]
    fn test_hold_before_first_and_after_last() {
        let log = samples();
        let before = resolve(&log, -3.0).unwrap();
        assert_eq!((before.x, before.y), (0.0, 0.0));
        let after = resolve(&log, 99.0).unwrap();
        assert_eq!((after.x, after.y), (0.5, 0.25));
    }

    #[test]
    fn test_exact_sample_times() {
        let log = samples();
        for sample in &log {
            let pos = resolve(&log, sample.timestamp).unwrap();
            assert_eq!((pos.x, pos.y), (sample.x, sample.y));
        }
    }

    #[test]
    fn test_duplicate_timestamps_do_not_crash() {
        let log = vec![
            MoveSample::new(1.0, 0.1, 0.1),
            MoveSample::new(1.0, 0.9, 0.9),
            MoveSample::new(1.0, 0.4, 0.4),
            MoveSample::new(2.0, 0.6, 0.6),
        ];
        let at = resolve(&log, 1.0).unwrap();
        assert_eq!((at.x, at.y), (0.4, 0.4));
        let mid = resolve(&log, 1.5).unwrap();
        assert!((mid.x - 0.5).abs() < 1e-12);
        assert!(mid.is_finite());
    }

    #[test]
    fn test_non_finite_time_holds_first() {
        let log = samples();
        let pos = resolve(&log, f64::NAN).unwrap();
        assert_eq!((pos.x, pos.y), (0.0, 0.0));
    }

    #[test]
    fn test_single_sample() {
        let log = vec![MoveSample::new(5.0, 0.3, 0.7)];
        for t in [0.0, 5.0, 10.0] {
            let pos = resolve(&log, t).unwrap();
            assert_eq!((pos.x, pos.y), (0.3, 0.7));
        }
    }

    #[test]
    fn test_large_log_resolves() {
        let log: Vec<MoveSample> = (0..100_000)
            .map(|i| MoveSample::new(i as f64 * 0.01, (i % 100) as f64 / 100.0, 0.5))
            .collect();
        let pos = resolve(&log, 500.005).unwrap();
        assert!(pos.is_finite());
        assert_eq!(pos.y, 0.5);
    }

    #[test]
    fn test_last_movement_time() {
        let log = EventLog::new(
            vec![
                MoveSample::new(0.0, 0.1, 0.1),
                MoveSample::new(1.0, 0.2, 0.2),
                MoveSample::new(2.0, 0.2, 0.2),
                MoveSample::new(3.0, 0.2, 0.2),
                MoveSample::new(4.0, 0.5, 0.5),
            ],
            Vec::new(),
        );
        // Travelling between samples
        assert_eq!(last_movement_time(&log, 0.5), Some(0.5));
        // Parked since t=1.0
        assert_eq!(last_movement_time(&log, 2.5), Some(1.0));
        // After the last sample the last movement is the arrival
        assert_eq!(last_movement_time(&log, 10.0), Some(4.0));
        assert_eq!(last_movement_time(&log, -1.0), None);
        assert_eq!(last_movement_time(&EventLog::default(), 1.0), None);
    }

    #[test]
    fn test_last_movement_time_long_parked_run() {
        let mut moves = vec![MoveSample::new(0.0, 0.0, 0.0)];
        moves.extend((1..200_000).map(|i| MoveSample::new(i as f64 * 0.01, 0.6, 0.4)));
        let log = EventLog::new(moves, Vec::new());

        assert_eq!(last_movement_time(&log, 0.005), Some(0.005));
        assert_eq!(last_movement_time(&log, 1500.0), Some(0.01));
        assert_eq!(last_movement_time(&log, 1e9), Some(0.01));
    }
}
