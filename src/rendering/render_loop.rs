//! Render loop and playback state.
//!
//! The loop is handed its collaborators at construction: a
//! [`SnapshotProvider`] for the external playback state and a [`Surface`]
//! to paint on. Nothing is read from globals.
//!
//! ```text
//! RenderLoop::new ──start──► Running ──tick──► snapshot → Compositor::render_frame
//!        ▲                      │
//!        └────────stop──────────┘  (compositor and its buffers dropped)
//! ```
//!
//! [`spawn_render_loop`] drives `tick` from a tokio interval;
//! [`RenderLoopHandle::detach`] cancels the pending tick and hands the idle
//! loop back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::compositor::{Compositor, FrameSnapshot};
use super::cursor_state::HostCursorState;
use super::raster::Surface;
use crate::config::ReplayConfig;
use crate::error::ReplayResult;
use crate::events::EventLog;

/// Minimum playback speed multiplier.
pub const MIN_SPEED: f64 = 0.1;
/// Maximum playback speed multiplier.
pub const MAX_SPEED: f64 = 4.0;

/// Read-only access to the external project state.
///
/// Called once at the start of every tick. `None` means there is nothing to
/// render yet (no recording loaded).
pub trait SnapshotProvider {
    fn snapshot(&self) -> Option<FrameSnapshot>;
}

impl<P: SnapshotProvider + ?Sized> SnapshotProvider for Arc<P> {
    fn snapshot(&self) -> Option<FrameSnapshot> {
        (**self).snapshot()
    }
}

/// Render loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Loop not running.
    Idle,
    /// Provider had nothing to render.
    NoSnapshot,
    /// Surface detached or zero-size.
    SurfaceUnavailable,
    Painted,
}

/// Drives the compositor from a snapshot provider onto a surface.
pub struct RenderLoop<P, S> {
    id: String,
    provider: P,
    surface: S,
    state: LoopState,
    compositor: Option<Compositor>,
    frames_painted: u64,
}

impl<P: SnapshotProvider, S: Surface> RenderLoop<P, S> {
    pub fn new(provider: P, surface: S) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider,
            surface,
            state: LoopState::Idle,
            compositor: None,
            frames_painted: 0,
        }
    }

    /// Mount: subsequent ticks render.
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        log::info!("[RENDER_LOOP] {} started", self.id);
    }

    /// Unmount: drop the compositor and everything it owns.
    pub fn stop(&mut self) {
        if self.state == LoopState::Idle {
            return;
        }
        self.state = LoopState::Idle;
        if let Some(mut compositor) = self.compositor.take() {
            compositor.release();
        }
        log::info!(
            "[RENDER_LOOP] {} stopped after {} frames",
            self.id,
            self.frames_painted
        );
    }

    /// Run one frame. Never fails; unavailable inputs make it a no-op.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state == LoopState::Idle {
            return TickOutcome::Idle;
        }
        let Some(snapshot) = self.provider.snapshot() else {
            return TickOutcome::NoSnapshot;
        };

        let compositor = self
            .compositor
            .get_or_insert_with(|| Compositor::new(&snapshot.config));
        if compositor.render_frame(&snapshot, &mut self.surface) {
            self.frames_painted += 1;
            TickOutcome::Painted
        } else {
            TickOutcome::SurfaceUnavailable
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_painted(&self) -> u64 {
        self.frames_painted
    }

    pub fn compositor(&self) -> Option<&Compositor> {
        self.compositor.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Take back the provider and surface.
    pub fn into_parts(self) -> (P, S) {
        (self.provider, self.surface)
    }
}

/// Handle to a spawned render loop.
///
/// Dropping the handle cancels the loop.
pub struct RenderLoopHandle<P, S> {
    token: CancellationToken,
    task: JoinHandle<RenderLoop<P, S>>,
}

impl<P, S> RenderLoopHandle<P, S> {
    /// Cancel the pending tick, wait for the task and return the stopped loop.
    pub async fn detach(mut self) -> ReplayResult<RenderLoop<P, S>> {
        self.token.cancel();
        let render_loop = (&mut self.task).await?;
        Ok(render_loop)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<P, S> Drop for RenderLoopHandle<P, S> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Start `render_loop` and tick it `fps` times per second on the tokio runtime.
pub fn spawn_render_loop<P, S>(mut render_loop: RenderLoop<P, S>, fps: u32) -> RenderLoopHandle<P, S>
where
    P: SnapshotProvider + Send + 'static,
    S: Surface + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.child_token();
    let period = Duration::from_secs_f64(1.0 / fps.clamp(1, 240) as f64);

    render_loop.start();
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancelled.cancelled() => break,
                _ = interval.tick() => {
                    let outcome = render_loop.tick();
                    log::trace!("[RENDER_LOOP] {} tick: {:?}", render_loop.id(), outcome);
                }
            }
        }

        render_loop.stop();
        render_loop
    });

    RenderLoopHandle { token, task }
}

// ============================================================================
// Playback clock
// ============================================================================

struct ClockInner {
    playing: bool,
    /// Playback time at `anchor`.
    anchor_time: f64,
    anchor: Instant,
    speed: f64,
    /// Time is clamped to this when set.
    duration: Option<f64>,
}

/// Wall-clock driven playback position with play/pause/seek/speed.
pub struct PlaybackClock {
    inner: Mutex<ClockInner>,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock {
    /// Paused at time zero, normal speed.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ClockInner {
                playing: false,
                anchor_time: 0.0,
                anchor: Instant::now(),
                speed: 1.0,
                duration: None,
            }),
        }
    }

    fn current(inner: &ClockInner) -> f64 {
        let time = if inner.playing {
            inner.anchor_time + inner.anchor.elapsed().as_secs_f64() * inner.speed
        } else {
            inner.anchor_time
        };
        match inner.duration {
            Some(duration) => time.min(duration),
            None => time,
        }
    }

    /// Current playback time in seconds.
    pub fn now(&self) -> f64 {
        Self::current(&self.inner.lock())
    }

    pub fn play(&self) {
        let mut inner = self.inner.lock();
        if inner.playing {
            return;
        }
        inner.anchor = Instant::now();
        inner.playing = true;
        log::debug!("[CLOCK] Play from {:.3}s", inner.anchor_time);
    }

    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        if !inner.playing {
            return;
        }
        inner.anchor_time = Self::current(&inner);
        inner.playing = false;
        log::debug!("[CLOCK] Paused at {:.3}s", inner.anchor_time);
    }

    /// Jump to `time` seconds. Negative and non-finite times seek to zero.
    pub fn seek(&self, time: f64) {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        let mut inner = self.inner.lock();
        inner.anchor_time = match inner.duration {
            Some(duration) => time.min(duration),
            None => time,
        };
        inner.anchor = Instant::now();
        log::debug!("[CLOCK] Seek to {:.3}s", inner.anchor_time);
    }

    /// Set the speed multiplier, clamped to 0.1-4.0.
    pub fn set_speed(&self, speed: f64) {
        let speed = if speed.is_nan() { 1.0 } else { speed.clamp(MIN_SPEED, MAX_SPEED) };
        let mut inner = self.inner.lock();
        // Re-anchor so the change applies from now on
        inner.anchor_time = Self::current(&inner);
        inner.anchor = Instant::now();
        inner.speed = speed;
    }

    pub fn set_duration(&self, duration: Option<f64>) {
        self.inner.lock().duration = duration.filter(|d| d.is_finite() && *d >= 0.0);
    }

    pub fn speed(&self) -> f64 {
        self.inner.lock().speed
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }
}

// ============================================================================
// Shared project state
// ============================================================================

struct ProjectInner {
    log: Option<Arc<EventLog>>,
    config: Arc<ReplayConfig>,
    host_state: Option<HostCursorState>,
}

/// Project store view: the active recording, its configuration, the host
/// cursor signal and the playback clock.
///
/// Mutated by the host, read by the render loop once per tick. A snapshot
/// takes one lock so the log and config it returns always belong together.
pub struct SharedProjectState {
    clock: PlaybackClock,
    inner: Mutex<ProjectInner>,
}

impl Default for SharedProjectState {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}

impl SharedProjectState {
    pub fn new(config: ReplayConfig) -> Self {
        let mut config = config;
        config.validate();
        Self {
            clock: PlaybackClock::new(),
            inner: Mutex::new(ProjectInner {
                log: None,
                config: Arc::new(config),
                host_state: None,
            }),
        }
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Make `log` the active recording; the clock is limited to its duration.
    pub fn load_recording(&self, log: EventLog) {
        self.clock.set_duration(Some(log.duration()));
        log::info!(
            "[RENDER_LOOP] Recording loaded: {} moves, {} clicks, {:.2}s",
            log.moves().len(),
            log.clicks().len(),
            log.duration()
        );
        self.inner.lock().log = Some(Arc::new(log));
    }

    pub fn unload_recording(&self) {
        self.clock.set_duration(None);
        self.inner.lock().log = None;
    }

    /// Replace the configuration. The new snapshot is validated first.
    pub fn set_config(&self, config: ReplayConfig) {
        let mut config = config;
        config.validate();
        self.inner.lock().config = Arc::new(config);
    }

    pub fn config(&self) -> Arc<ReplayConfig> {
        Arc::clone(&self.inner.lock().config)
    }

    pub fn set_host_state(&self, state: Option<HostCursorState>) {
        self.inner.lock().host_state = state;
    }
}

impl SnapshotProvider for SharedProjectState {
    fn snapshot(&self) -> Option<FrameSnapshot> {
        let time = self.clock.now();
        let inner = self.inner.lock();
        let log = inner.log.as_ref()?;
        Some(FrameSnapshot {
            time,
            log: Arc::clone(log),
            config: Arc::clone(&inner.config),
            host_state: inner.host_state,
        })
    }
}
