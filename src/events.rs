//! Recorded pointer event log.
//!
//! The capture pipeline produces move samples and click events with
//! normalized (0.0-1.0) coordinates and timestamps in seconds from the
//! start of the recording. The compositor only ever reads them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use ts_rs::TS;

use crate::error::{ReplayResult, ResultExt};

// ============================================================================
// Types (exported to TypeScript via ts-rs)
// ============================================================================

/// A single recorded pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MoveSample {
    /// Seconds from recording start.
    pub timestamp: f64,
    /// Normalized X position (0.0-1.0).
    pub x: f64,
    /// Normalized Y position (0.0-1.0).
    pub y: f64,
}

impl MoveSample {
    pub fn new(timestamp: f64, x: f64, y: f64) -> Self {
        Self { timestamp, x, y }
    }

    fn is_finite(&self) -> bool {
        self.timestamp.is_finite() && self.x.is_finite() && self.y.is_finite()
    }
}

/// Mouse button that produced a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ClickKind {
    #[default]
    Primary,
    Secondary,
}

/// A discrete click (button press) event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClickEvent {
    /// Seconds from recording start.
    pub timestamp: f64,
    /// Normalized X position (0.0-1.0).
    pub x: f64,
    /// Normalized Y position (0.0-1.0).
    pub y: f64,
    /// Button that was pressed.
    #[serde(default)]
    pub kind: ClickKind,
    /// Per-click effect colour override (CSS colour string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ClickEvent {
    pub fn new(timestamp: f64, x: f64, y: f64, kind: ClickKind) -> Self {
        Self {
            timestamp,
            x,
            y,
            kind,
            color: None,
        }
    }

    fn is_finite(&self) -> bool {
        self.timestamp.is_finite() && self.x.is_finite() && self.y.is_finite()
    }
}

/// Event log as stored by the project and produced by the capture pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecordedEvents {
    /// Pointer positions, expected sorted by timestamp.
    #[serde(default)]
    pub moves: Vec<MoveSample>,
    /// Click events, expected sorted by timestamp.
    #[serde(default)]
    pub clicks: Vec<ClickEvent>,
}

// ============================================================================
// Event Log
// ============================================================================

/// Sanitized, timestamp-sorted event log.
///
/// Samples with non-finite fields are dropped and both sequences are
/// stably sorted, so the resolver and effect windows can binary search.
/// Duplicate timestamps are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    moves: Vec<MoveSample>,
    clicks: Vec<ClickEvent>,
    /// Per move sample: timestamp at which the pointer arrived at that
    /// sample's position (start of its stationary run).
    arrivals: Vec<f64>,
}

impl EventLog {
    pub fn new(moves: Vec<MoveSample>, clicks: Vec<ClickEvent>) -> Self {
        let mut moves: Vec<MoveSample> = moves.into_iter().filter(MoveSample::is_finite).collect();
        let mut clicks: Vec<ClickEvent> = clicks.into_iter().filter(ClickEvent::is_finite).collect();

        if !is_sorted_by_time(&moves, |m| m.timestamp) {
            log::warn!("[EVENT_LOG] Move samples out of order, sorting {} samples", moves.len());
            moves.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        }
        if !is_sorted_by_time(&clicks, |c| c.timestamp) {
            log::warn!("[EVENT_LOG] Clicks out of order, sorting {} clicks", clicks.len());
            clicks.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        }

        let arrivals = arrival_times(&moves);
        Self {
            moves,
            clicks,
            arrivals,
        }
    }

    /// Parse an event log from the project store's JSON representation.
    pub fn from_json(json: &str) -> ReplayResult<Self> {
        let recorded: RecordedEvents = serde_json::from_str(json)?;
        Ok(Self::from(recorded))
    }

    pub fn moves(&self) -> &[MoveSample] {
        &self.moves
    }

    pub fn clicks(&self) -> &[ClickEvent] {
        &self.clicks
    }

    /// Arrival time of each move sample, parallel to [`EventLog::moves`].
    pub fn arrivals(&self) -> &[f64] {
        &self.arrivals
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.clicks.is_empty()
    }

    /// Timestamp of the last recorded event, 0.0 for an empty log.
    pub fn duration(&self) -> f64 {
        let last_move = self.moves.last().map(|m| m.timestamp).unwrap_or(0.0);
        let last_click = self.clicks.last().map(|c| c.timestamp).unwrap_or(0.0);
        last_move.max(last_click)
    }
}

impl From<RecordedEvents> for EventLog {
    fn from(recorded: RecordedEvents) -> Self {
        let raw_moves = recorded.moves.len();
        let raw_clicks = recorded.clicks.len();
        let log = EventLog::new(recorded.moves, recorded.clicks);

        let dropped = (raw_moves - log.moves.len()) + (raw_clicks - log.clicks.len());
        if dropped > 0 {
            log::warn!("[EVENT_LOG] Dropped {} events with non-finite fields", dropped);
        }

        log
    }
}

fn arrival_times(moves: &[MoveSample]) -> Vec<f64> {
    let mut arrivals: Vec<f64> = Vec::with_capacity(moves.len());
    for (i, sample) in moves.iter().enumerate() {
        let arrived = match arrivals.last() {
            Some(&since) if moves[i - 1].x == sample.x && moves[i - 1].y == sample.y => since,
            _ => sample.timestamp,
        };
        arrivals.push(arrived);
    }
    arrivals
}

fn is_sorted_by_time<T>(items: &[T], timestamp: impl Fn(&T) -> f64) -> bool {
    items
        .windows(2)
        .all(|w| timestamp(&w[0]) <= timestamp(&w[1]))
}

/// Save an event log to a JSON file.
pub fn save_event_log(events: &RecordedEvents, path: &Path) -> ReplayResult<()> {
    let json = serde_json::to_string_pretty(events)?;

    std::fs::write(path, json).context("Failed to write event log file")?;

    log::info!(
        "[EVENT_LOG] Saved {} moves and {} clicks to {:?}",
        events.moves.len(),
        events.clicks.len(),
        path
    );

    Ok(())
}

/// Load an event log from a JSON file.
pub fn load_event_log(path: &Path) -> ReplayResult<EventLog> {
    let json = std::fs::read_to_string(path).context("Failed to read event log file")?;

    let log = EventLog::from_json(&json)?;

    log::info!(
        "[EVENT_LOG] Loaded {} moves and {} clicks from {:?}",
        log.moves.len(),
        log.clicks.len(),
        path
    );

    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_serialization() {
        let click = ClickEvent::new(1.5, 0.25, 0.75, ClickKind::Secondary);
        let json = serde_json::to_string(&click).unwrap();
        assert!(json.contains("\"kind\":\"secondary\""));
        assert!(!json.contains("color"));

        let parsed: ClickEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, click);
    }

    #[test]
    fn test_click_kind_defaults_to_primary() {
        let click: ClickEvent = serde_json::from_str(r#"{"timestamp":1,"x":0.5,"y":0.5}"#).unwrap();
        assert_eq!(click.kind, ClickKind::Primary);
        assert!(click.color.is_none());
    }

    #[test]
    fn test_arrival_times_mark_stationary_runs() {
        let log = EventLog::new(
            vec![
                MoveSample::new(0.0, 0.1, 0.1),
                MoveSample::new(1.0, 0.1, 0.1),
                MoveSample::new(2.0, 0.3, 0.3),
                MoveSample::new(3.0, 0.3, 0.3),
                MoveSample::new(4.0, 0.3, 0.3),
                MoveSample::new(5.0, 0.1, 0.1),
            ],
            Vec::new(),
        );
        assert_eq!(log.arrivals(), &[0.0, 0.0, 2.0, 2.0, 2.0, 5.0]);
        assert!(EventLog::default().arrivals().is_empty());
    }

    #[test]
    fn test_from_json_missing_sections() {
        let log = EventLog::from_json(r#"{"moves":[{"timestamp":0,"x":0,"y":0}]}"#).unwrap();
        assert_eq!(log.moves().len(), 1);
        assert!(log.clicks().is_empty());
    }

    #[test]
    fn test_unsorted_log_is_sorted() {
        let log = EventLog::new(
            vec![
                MoveSample::new(2.0, 0.2, 0.2),
                MoveSample::new(1.0, 0.1, 0.1),
                MoveSample::new(1.0, 0.15, 0.15),
            ],
            vec![],
        );
        let times: Vec<f64> = log.moves().iter().map(|m| m.timestamp).collect();
        assert_eq!(times, vec![1.0, 1.0, 2.0]);
        // Stable sort keeps duplicate order
        assert_eq!(log.moves()[0].x, 0.1);
    }

    #[test]
    fn test_non_finite_samples_dropped() {
        let log = EventLog::new(
            vec![
                MoveSample::new(f64::NAN, 0.1, 0.1),
                MoveSample::new(0.5, f64::INFINITY, 0.1),
                MoveSample::new(1.0, 0.3, 0.3),
            ],
            vec![ClickEvent::new(f64::NAN, 0.5, 0.5, ClickKind::Primary)],
        );
        assert_eq!(log.moves().len(), 1);
        assert!(log.clicks().is_empty());
    }

    #[test]
    fn test_duration() {
        let log = EventLog::new(
            vec![MoveSample::new(3.0, 0.0, 0.0)],
            vec![ClickEvent::new(4.5, 0.0, 0.0, ClickKind::Primary)],
        );
        assert_eq!(log.duration(), 4.5);
        assert_eq!(EventLog::default().duration(), 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("replay-events-{}.json", uuid::Uuid::new_v4()));
        let events = RecordedEvents {
            moves: vec![MoveSample::new(0.0, 0.1, 0.2), MoveSample::new(1.0, 0.3, 0.4)],
            clicks: vec![ClickEvent::new(0.5, 0.2, 0.3, ClickKind::Primary)],
        };

        save_event_log(&events, &path).unwrap();
        let log = load_event_log(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(log.moves(), events.moves.as_slice());
        assert_eq!(log.clicks(), events.clicks.as_slice());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_event_log(Path::new("/definitely/not/here.json"));
        assert!(result.is_err());
    }
}
