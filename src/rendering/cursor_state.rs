//! Cursor state machine and per-frame visual state.
//!
//! `Pressed` is derived from the click log alone: the cursor is pressed while
//! a click happened less than the press window before the query time.
//! `Hover` and `Busy` are asserted by the host and only replace `Normal`.
//! The machine keeps nothing but the previous frame's state (for transition
//! logging), so seeking is always safe.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::coord::{Coord, FrameSpace};
use crate::events::ClickEvent;

/// Discrete cursor visual state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CursorState {
    #[default]
    Normal,
    Hover,
    Pressed,
    Busy,
}

/// State signalled by the host, outside the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum HostCursorState {
    Hover,
    Busy,
}

impl From<HostCursorState> for CursorState {
    fn from(state: HostCursorState) -> Self {
        match state {
            HostCursorState::Hover => CursorState::Hover,
            HostCursorState::Busy => CursorState::Busy,
        }
    }
}

/// True when a click landed in `[time - press_window, time]`, exclusive of
/// the window's far end.
pub fn is_pressed(time: f64, clicks: &[ClickEvent], press_window: f64) -> bool {
    if !time.is_finite() || press_window <= 0.0 {
        return false;
    }
    let idx = clicks.partition_point(|c| c.timestamp <= time);
    idx > 0 && time - clicks[idx - 1].timestamp < press_window
}

/// Derive the cursor state at `time`.
pub fn derive_state(
    time: f64,
    clicks: &[ClickEvent],
    press_window: f64,
    host: Option<HostCursorState>,
) -> CursorState {
    if is_pressed(time, clicks, press_window) {
        return CursorState::Pressed;
    }
    host.map(CursorState::from).unwrap_or(CursorState::Normal)
}

/// Once-per-frame state check remembering only the previous frame.
#[derive(Debug, Clone, Default)]
pub struct CursorStateMachine {
    previous: CursorState,
}

impl CursorStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        time: f64,
        clicks: &[ClickEvent],
        press_window: f64,
        host: Option<HostCursorState>,
    ) -> CursorState {
        let state = derive_state(time, clicks, press_window, host);
        if state != self.previous {
            log::debug!(
                "[COMPOSITOR] Cursor state {:?} -> {:?} at {:.3}s",
                self.previous,
                state,
                time
            );
            self.previous = state;
        }
        state
    }

    pub fn previous(&self) -> CursorState {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = CursorState::Normal;
    }
}

/// Cursor velocity in surface pixels per second of timeline time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub dx: f64,
    pub dy: f64,
}

impl Velocity {
    pub fn speed(&self) -> f64 {
        Coord::<FrameSpace>::new(self.dx, self.dy).length()
    }
}

/// How the query time moved relative to the previous update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    /// First update, or the previous position was unknown.
    Initial,
    /// Time advanced.
    Forward,
    /// Same time as the previous update.
    Repeat,
    /// Time moved backwards (seek).
    Backward,
}

/// Cursor state carried between frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorVisualState {
    /// Resolved position, `None` when the log is empty.
    pub position: Option<Coord<FrameSpace>>,
    pub velocity: Velocity,
    pub state: CursorState,
    /// Query time of the last update.
    pub last_update_time: Option<f64>,
}

impl CursorVisualState {
    /// Move to `position` at `time`.
    ///
    /// Velocity is the positional delta over the query-time delta, so it
    /// follows timeline speed rather than the frame rate. A repeated time
    /// keeps the previous velocity; a backward step resets it to zero.
    pub fn advance(&mut self, position: Option<Coord<FrameSpace>>, time: f64) -> TimeStep {
        let step = match (self.position, self.last_update_time, position) {
            (Some(prev), Some(last), Some(next)) if time.is_finite() => {
                let dt = time - last;
                if dt > 0.0 {
                    let delta = next - prev;
                    self.velocity = Velocity {
                        dx: delta.x / dt,
                        dy: delta.y / dt,
                    };
                    TimeStep::Forward
                } else if dt == 0.0 {
                    TimeStep::Repeat
                } else {
                    self.velocity = Velocity::default();
                    TimeStep::Backward
                }
            }
            _ => {
                self.velocity = Velocity::default();
                TimeStep::Initial
            }
        };

        self.position = position;
        self.last_update_time = time.is_finite().then_some(time);
        step
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ClickKind;

    fn clicks() -> Vec<ClickEvent> {
        vec![
            ClickEvent::new(1.0, 0.5, 0.5, ClickKind::Primary),
            ClickEvent::new(3.0, 0.5, 0.5, ClickKind::Secondary),
        ]
    }

    #[test]
    fn test_pressed_window() {
        let log = clicks();
        assert_eq!(derive_state(0.99, &log, 0.1, None), CursorState::Normal);
        assert_eq!(derive_state(1.0, &log, 0.1, None), CursorState::Pressed);
        assert_eq!(derive_state(1.05, &log, 0.1, None), CursorState::Pressed);
        assert_eq!(derive_state(1.2, &log, 0.1, None), CursorState::Normal);
        assert_eq!(derive_state(3.01, &log, 0.1, None), CursorState::Pressed);
    }

    #[test]
    fn test_host_state_overrides_normal_only() {
        let log = clicks();
        let hover = Some(HostCursorState::Hover);
        assert_eq!(derive_state(2.0, &log, 0.1, hover), CursorState::Hover);
        assert_eq!(derive_state(1.05, &log, 0.1, hover), CursorState::Pressed);
        assert_eq!(
            derive_state(2.0, &log, 0.1, Some(HostCursorState::Busy)),
            CursorState::Busy
        );
    }

    #[test]
    fn test_invalid_time_is_normal() {
        let log = clicks();
        assert_eq!(derive_state(f64::NAN, &log, 0.1, None), CursorState::Normal);
        assert_eq!(derive_state(1.0, &[], 0.1, None), CursorState::Normal);
    }

    #[test]
    fn test_machine_safe_under_seek() {
        let log = clicks();
        let mut machine = CursorStateMachine::new();
        assert_eq!(machine.update(1.05, &log, 0.1, None), CursorState::Pressed);
        // Jump forward then back: each answer depends only on the time
        assert_eq!(machine.update(2.0, &log, 0.1, None), CursorState::Normal);
        assert_eq!(machine.update(1.05, &log, 0.1, None), CursorState::Pressed);
        assert_eq!(machine.previous(), CursorState::Pressed);
        machine.reset();
        assert_eq!(machine.previous(), CursorState::Normal);
    }

    #[test]
    fn test_velocity_uses_query_time() {
        let mut visual = CursorVisualState::default();
        assert_eq!(
            visual.advance(Some(Coord::new(0.0, 0.0)), 1.0),
            TimeStep::Initial
        );
        assert_eq!(
            visual.advance(Some(Coord::new(100.0, 50.0)), 1.5),
            TimeStep::Forward
        );
        assert_eq!(visual.velocity, Velocity { dx: 200.0, dy: 100.0 });
        assert_eq!(Velocity { dx: 30.0, dy: 40.0 }.speed(), 50.0);

        // Same time again: velocity unchanged
        assert_eq!(
            visual.advance(Some(Coord::new(100.0, 50.0)), 1.5),
            TimeStep::Repeat
        );
        assert_eq!(visual.velocity.dx, 200.0);

        assert_eq!(
            visual.advance(Some(Coord::new(10.0, 10.0)), 0.2),
            TimeStep::Backward
        );
        assert_eq!(visual.velocity, Velocity::default());
    }

    #[test]
    fn test_advance_without_position() {
        let mut visual = CursorVisualState::default();
        assert_eq!(visual.advance(None, 1.0), TimeStep::Initial);
        assert!(visual.position.is_none());
        assert_eq!(visual.advance(None, f64::NAN), TimeStep::Initial);
        assert!(visual.last_update_time.is_none());
    }
}
