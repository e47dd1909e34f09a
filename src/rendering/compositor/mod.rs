//! Per-frame compositor.
//!
//! One call to [`Compositor::render_frame`] runs the whole pipeline for a
//! single snapshot:
//!
//! ```text
//! snapshot → resolve position → path buffer + velocity → cursor state
//!          → active click effects → FramePlan → paint layers
//! ```
//!
//! Planning and painting happen inside the same surface borrow, so a frame
//! always reflects exactly one snapshot. The compositor owns all mutable
//! render state (trail history, visual state, sprite cache); nothing outside
//! the render loop touches it.

use std::f64::consts::TAU;
use std::sync::Arc;

use super::color::{parse_color_or, Rgba};
use super::coord::{Coord, FrameSpace, Size};
use super::cursor_state::{
    CursorState, CursorStateMachine, CursorVisualState, HostCursorState, TimeStep,
};
use super::effects::{self, EffectInstance};
use super::path_buffer::{PathBuffer, ShortTrail, TrailMode, TrailPoint};
use super::position;
use super::raster::{Canvas, Point, Shape, Surface};
use super::sprite::{Sprite, SpriteCache, SpriteKey, SpriteKind, BASE_CURSOR_HEIGHT};
use crate::config::{BackgroundMode, CursorAppearance, CursorTheme, LayerOrder, ReplayConfig};
use crate::events::EventLog;

/// Sprite scale while pressed.
const PRESSED_SCALE: f32 = 0.85;
/// Breathing period in the hover state (seconds).
const BREATHING_PERIOD: f64 = 1.6;
/// Breathing scale amplitude.
const BREATHING_AMPLITUDE: f64 = 0.04;
/// Seconds over which an idle cursor fades out.
const IDLE_FADE_SECS: f64 = 0.3;
/// Maximum motion blur ghost copies.
const MAX_BLUR_GHOSTS: usize = 5;
/// Ghost spread per unit of speed (seconds of travel), capped in pixels.
const BLUR_SPREAD_SECS: f64 = 1.0 / 30.0;
const MAX_BLUR_SPREAD_PX: f64 = 80.0;
/// Dot cursor radius at size 1.0.
const DOT_RADIUS: f32 = 6.0;

const DEFAULT_ACCENT: Rgba = Rgba::rgb(0x3B, 0x82, 0xF6);

/// Consistent read of the external state for one frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// Playback time in seconds.
    pub time: f64,
    pub log: Arc<EventLog>,
    /// Validated configuration.
    pub config: Arc<ReplayConfig>,
    /// Hover/busy asserted by the host, if any.
    pub host_state: Option<HostCursorState>,
}

impl FrameSnapshot {
    pub fn new(time: f64, log: Arc<EventLog>, config: Arc<ReplayConfig>) -> Self {
        Self {
            time,
            log,
            config,
            host_state: None,
        }
    }
}

/// Which image represents the cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorImage {
    Builtin(SpriteKey),
    Custom,
    Dot { radius: f32, fill: Rgba, outline: Rgba },
}

/// Faded copy of the cursor behind a fast movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurGhost {
    pub position: Point,
    pub alpha: f32,
}

/// Everything needed to paint the cursor layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorDraw {
    /// Hotspot position in surface pixels.
    pub position: Point,
    pub state: CursorState,
    /// State-driven scale (pressed shrink, hover breathing).
    pub scale: f32,
    pub alpha: f32,
    pub image: CursorImage,
    pub glow: Option<Shape>,
    /// Oldest ghost first.
    pub ghosts: Vec<BlurGhost>,
}

/// Geometry for one frame. Two plans built from identical inputs and call
/// history compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub time: f64,
    pub width: u32,
    pub height: u32,
    pub background: BackgroundMode,
    pub layer_order: LayerOrder,
    pub trail_mode: TrailMode,
    pub trail: Vec<Shape>,
    pub effects: Vec<EffectInstance>,
    pub cursor: Option<CursorDraw>,
}

/// Owner of all per-frame render state.
pub struct Compositor {
    path: PathBuffer,
    short_trail: ShortTrail,
    states: CursorStateMachine,
    visual: CursorVisualState,
    sprites: SpriteCache,
    /// Surface size of the previous frame.
    surface_size: Option<(u32, u32)>,
    /// Event log the history was built from. Held so its identity stays
    /// unique while compared.
    log: Option<Arc<EventLog>>,
    last_plan: Option<FramePlan>,
    frames: u64,
}

impl Compositor {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            path: PathBuffer::new(config.path.clone()),
            short_trail: ShortTrail::new(
                config.cursor.trail_length as usize,
                config.cursor.trail_lifetime_secs,
            ),
            states: CursorStateMachine::new(),
            visual: CursorVisualState::default(),
            sprites: SpriteCache::default(),
            surface_size: None,
            log: None,
            last_plan: None,
            frames: 0,
        }
    }

    /// Plan and paint one frame. Returns false when the surface was
    /// unavailable; nothing is updated in that case.
    pub fn render_frame(&mut self, snapshot: &FrameSnapshot, surface: &mut dyn Surface) -> bool {
        let painted = surface.paint(&mut |canvas| {
            let plan = self.plan(snapshot, canvas.width(), canvas.height());
            self.paint(canvas, &plan, &snapshot.config.cursor);
            self.last_plan = Some(plan);
        });

        if painted {
            self.frames += 1;
        } else {
            log::trace!("[COMPOSITOR] Surface unavailable, skipping frame");
        }
        painted
    }

    /// Update render state for `snapshot` and build the frame geometry.
    pub fn plan(&mut self, snapshot: &FrameSnapshot, width: u32, height: u32) -> FramePlan {
        let config = snapshot.config.as_ref();
        let log = snapshot.log.as_ref();
        let time = snapshot.time;
        let size = Size::<FrameSpace>::from_u32(width, height);

        self.sync_surface(width, height);
        self.sync_log(&snapshot.log);
        self.path.set_config(&config.path);
        self.short_trail.set_limits(
            config.cursor.trail_length as usize,
            config.cursor.trail_lifetime_secs,
        );

        // Position and velocity
        let position = position::resolve(log.moves(), time).map(|uv| uv.to_frame(size));
        let step = self.visual.advance(position, time);
        if let Some(pos) = position.filter(|_| time.is_finite()) {
            self.record_position(pos, time, step);
        }
        self.short_trail.update(time);

        let trail_mode = TrailMode::select(
            log.moves().len(),
            config.full_path_threshold,
            config.cursor.full_path,
        );
        let trail = if config.cursor.trail || config.cursor.full_path {
            self.trail_shapes(trail_mode, time, config)
        } else {
            Vec::new()
        };

        // Cursor state
        let state = self.states.update(
            time,
            log.clicks(),
            config.press_window_secs,
            snapshot.host_state,
        );
        self.visual.state = state;

        let effects = effects::evaluate(time, log.clicks(), &config.effects, size);
        let cursor = self.cursor_draw(time, log, &config.cursor);

        log::trace!(
            "[COMPOSITOR] t={:.3} cursor={} effects={} trail={}",
            time,
            cursor.is_some(),
            effects.len(),
            trail.len()
        );

        FramePlan {
            time,
            width,
            height,
            background: config.background,
            layer_order: config.layer_order,
            trail_mode,
            trail,
            effects,
            cursor,
        }
    }

    /// Pixel-space history is meaningless on a differently sized surface.
    fn sync_surface(&mut self, width: u32, height: u32) {
        if self.surface_size == Some((width, height)) {
            return;
        }
        if let Some((old_w, old_h)) = self.surface_size {
            log::info!(
                "[COMPOSITOR] Surface resized {}x{} -> {}x{}, clearing trail history",
                old_w,
                old_h,
                width,
                height
            );
            self.clear_history();
        } else {
            log::info!("[COMPOSITOR] Attached to {}x{} surface", width, height);
        }
        self.surface_size = Some((width, height));
    }

    fn sync_log(&mut self, log: &Arc<EventLog>) {
        if self.log.as_ref().is_some_and(|current| Arc::ptr_eq(current, log)) {
            return;
        }
        if self.log.is_some() {
            log::debug!("[COMPOSITOR] Event log replaced, clearing trail history");
            self.clear_history();
        }
        self.log = Some(Arc::clone(log));
    }

    fn record_position(&mut self, pos: Coord<FrameSpace>, time: f64, step: TimeStep) {
        let (x, y) = pos.as_f32();
        let point = TrailPoint::new(x, y, time);
        match step {
            // Re-rendering the same instant adds nothing
            TimeStep::Repeat => {}
            TimeStep::Backward => {
                self.short_trail.clear();
                self.short_trail.push(point);
                self.path.add_point(point);
            }
            TimeStep::Initial | TimeStep::Forward => {
                self.short_trail.push(point);
                self.path.add_point(point);
            }
        }
    }

    fn trail_shapes(&self, mode: TrailMode, time: f64, config: &ReplayConfig) -> Vec<Shape> {
        let accent = parse_color_or(&config.cursor.color, DEFAULT_ACCENT);
        let width = config.cursor.trail_width;

        match mode {
            TrailMode::Short => {
                let points: Vec<&TrailPoint> = self.short_trail.points().collect();
                points
                    .windows(2)
                    .map(|pair| {
                        let (a, b) = (pair[0], pair[1]);
                        let opacity = a.opacity.min(b.opacity);
                        Shape::Line {
                            from: Point::new(a.x, a.y),
                            to: Point::new(b.x, b.y),
                            width: (width * (0.4 + 0.6 * opacity)).max(0.5),
                            color: accent.fade(opacity * 0.6),
                        }
                    })
                    .collect()
            }
            TrailMode::FullPath => {
                let window = config.full_path_window_secs;
                let points: Vec<&TrailPoint> =
                    self.path.points_in_range(time - window, time).collect();
                points
                    .windows(2)
                    .map(|pair| {
                        let (a, b) = (pair[0], pair[1]);
                        let age = ((time - b.timestamp) / window).clamp(0.0, 1.0) as f32;
                        Shape::Line {
                            from: Point::new(a.x, a.y),
                            to: Point::new(b.x, b.y),
                            width,
                            color: accent.fade((1.0 - age) * 0.6),
                        }
                    })
                    .collect()
            }
        }
    }

    fn cursor_draw(
        &mut self,
        time: f64,
        log: &EventLog,
        appearance: &CursorAppearance,
    ) -> Option<CursorDraw> {
        if !appearance.visible {
            return None;
        }
        let position = self.visual.position?;
        let state = self.visual.state;

        let alpha = if appearance.hide_when_idle {
            idle_alpha(log, time, appearance.idle_timeout_secs)
        } else {
            1.0
        };
        if alpha <= 0.0 {
            return None;
        }

        let scale = match state {
            CursorState::Pressed => PRESSED_SCALE,
            CursorState::Hover if appearance.breathing && time.is_finite() => {
                let phase = (time / BREATHING_PERIOD) * TAU;
                (1.0 + BREATHING_AMPLITUDE * phase.sin()) as f32
            }
            _ => 1.0,
        };

        let accent = parse_color_or(&appearance.color, DEFAULT_ACCENT);
        let (x, y) = position.as_f32();
        let center = Point::new(x, y);

        // A custom image that fails to decode falls back to the built-ins
        let custom_ok = state != CursorState::Busy
            && appearance
                .custom_image
                .as_ref()
                .is_some_and(|custom| self.sprites.custom(custom).is_some());

        let image = if custom_ok {
            CursorImage::Custom
        } else {
            match SpriteKind::for_style(appearance.style, state) {
                Some(kind) => CursorImage::Builtin(SpriteKey::new(kind, appearance)),
                None => CursorImage::Dot {
                    radius: DOT_RADIUS * appearance.size,
                    fill: accent,
                    outline: match appearance.theme {
                        CursorTheme::Light => Rgba::WHITE,
                        CursorTheme::Dark => Rgba::BLACK,
                    },
                },
            }
        };

        let glow = appearance.glow.then(|| Shape::Glow {
            center,
            radius: BASE_CURSOR_HEIGHT * appearance.size * 1.2 * scale,
            color: accent.fade(0.35 * alpha),
        });

        let ghosts = if appearance.motion_blur {
            self.blur_ghosts(position, appearance.motion_blur_threshold as f64, alpha)
        } else {
            Vec::new()
        };

        Some(CursorDraw {
            position: center,
            state,
            scale,
            alpha,
            image,
            glow,
            ghosts,
        })
    }

    /// Ghost copies trailing against the velocity, more and further apart
    /// the faster the cursor moves.
    fn blur_ghosts(&self, position: Coord<FrameSpace>, threshold: f64, alpha: f32) -> Vec<BlurGhost> {
        let velocity = self.visual.velocity;
        let speed = velocity.speed();
        if !speed.is_finite() || speed <= threshold || speed <= 0.0 {
            return Vec::new();
        }

        let excess = if threshold > 0.0 { speed / threshold } else { MAX_BLUR_GHOSTS as f64 };
        let count = (excess.ceil() as usize).clamp(1, MAX_BLUR_GHOSTS);
        let spread = (speed * BLUR_SPREAD_SECS).min(MAX_BLUR_SPREAD_PX);
        let dir = Coord::<FrameSpace>::new(velocity.dx / speed, velocity.dy / speed);

        (1..=count)
            .rev()
            .map(|i| {
                let frac = i as f64 / count as f64;
                let at = position - dir * (spread * frac);
                let (x, y) = at.as_f32();
                BlurGhost {
                    position: Point::new(x, y),
                    alpha: alpha * 0.5 * (1.0 - frac as f32 * 0.8),
                }
            })
            .collect()
    }

    fn paint(&mut self, canvas: &mut Canvas<'_>, plan: &FramePlan, appearance: &CursorAppearance) {
        match plan.background {
            BackgroundMode::Clear => canvas.clear(),
            BackgroundMode::Fade { retain } => canvas.fade(retain),
            BackgroundMode::Preserve => {}
        }

        for shape in &plan.trail {
            canvas.draw(shape);
        }

        match plan.layer_order {
            LayerOrder::CursorOnTop => {
                paint_effects(canvas, &plan.effects);
                self.paint_cursor(canvas, plan, appearance);
            }
            LayerOrder::EffectsOnTop => {
                self.paint_cursor(canvas, plan, appearance);
                paint_effects(canvas, &plan.effects);
            }
        }
    }

    fn paint_cursor(
        &mut self,
        canvas: &mut Canvas<'_>,
        plan: &FramePlan,
        appearance: &CursorAppearance,
    ) {
        let Some(cursor) = &plan.cursor else {
            return;
        };

        if let Some(glow) = &cursor.glow {
            canvas.draw(glow);
        }

        let (sprite, base_scale) = match &cursor.image {
            CursorImage::Dot {
                radius,
                fill,
                outline,
            } => {
                let radius = radius * cursor.scale;
                for ghost in &cursor.ghosts {
                    canvas.fill_disc(ghost.position, radius, 1.0, fill.fade(ghost.alpha));
                }
                canvas.fill_disc(cursor.position, radius + 1.5, 1.0, outline.fade(cursor.alpha));
                canvas.fill_disc(cursor.position, radius, 1.0, fill.fade(cursor.alpha));
                return;
            }
            // Built-ins are rasterised at their final size
            CursorImage::Builtin(key) => (self.sprites.get(*key), 1.0),
            CursorImage::Custom => {
                let sprite = appearance
                    .custom_image
                    .as_ref()
                    .and_then(|custom| self.sprites.custom(custom));
                let base = sprite
                    .as_deref()
                    .map(|s| custom_scale(s, appearance.size))
                    .unwrap_or(1.0);
                (sprite, base)
            }
        };
        let Some(sprite) = sprite else {
            return;
        };

        let scale = base_scale * cursor.scale;
        for ghost in &cursor.ghosts {
            blit_sprite(canvas, &sprite, ghost.position, scale, ghost.alpha);
        }
        blit_sprite(canvas, &sprite, cursor.position, scale, cursor.alpha);
    }

    /// Drop all accumulated render state and cached sprites.
    pub fn release(&mut self) {
        self.clear_history();
        self.sprites.clear();
        self.states.reset();
        self.surface_size = None;
        self.log = None;
        self.last_plan = None;
        log::debug!("[COMPOSITOR] Released after {} frames", self.frames);
        self.frames = 0;
    }

    fn clear_history(&mut self) {
        self.path.clear();
        self.short_trail.clear();
        self.visual.reset();
    }

    pub fn last_plan(&self) -> Option<&FramePlan> {
        self.last_plan.as_ref()
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn visual_state(&self) -> &CursorVisualState {
        &self.visual
    }
}

fn paint_effects(canvas: &mut Canvas<'_>, effects: &[EffectInstance]) {
    for effect in effects {
        for shape in &effect.shapes {
            canvas.draw(shape);
        }
    }
}

fn blit_sprite(canvas: &mut Canvas<'_>, sprite: &Sprite, at: Point, scale: f32, alpha: f32) {
    let origin = Point::new(at.x - sprite.hotspot_x * scale, at.y - sprite.hotspot_y * scale);
    canvas.blit_rgba(&sprite.data, sprite.width, sprite.height, origin, scale, alpha);
}

/// Custom images are scaled to `BASE_CURSOR_HEIGHT * size` pixels tall.
fn custom_scale(sprite: &Sprite, size: f32) -> f32 {
    if sprite.height == 0 {
        return size;
    }
    BASE_CURSOR_HEIGHT * size / sprite.height as f32
}

/// Cursor opacity after `timeout` seconds without movement.
fn idle_alpha(log: &EventLog, time: f64, timeout: f64) -> f32 {
    let Some(last_move) = position::last_movement_time(log, time) else {
        return 1.0;
    };
    let idle = time - last_move;
    if idle <= timeout {
        return 1.0;
    }
    (1.0 - (idle - timeout) / IDLE_FADE_SECS).clamp(0.0, 1.0) as f32
}
