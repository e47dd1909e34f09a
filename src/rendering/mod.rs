//! Replay rendering.
//!
//! Everything between a recorded event log and painted pixels.
//!
//! ## Components
//! - `position`: cursor position at an arbitrary time (interpolated)
//! - `path_buffer`: bounded trail history with adaptive sampling
//! - `effects`: stateless click effect evaluation, one strategy per style
//! - `cursor_state`: pressed/hover/busy derivation and per-frame visual state
//! - `sprite`: cursor sprite rasterisation and caching
//! - `raster`: shapes, canvas and paintable surfaces
//! - `compositor`: per-frame planning and layer painting
//! - `render_loop`: lifecycle, snapshot provider and tick scheduling

pub mod color;
pub mod compositor;
pub mod coord;
pub mod cursor_state;
pub mod easing;
pub mod effects;
pub mod path_buffer;
pub mod position;
pub mod raster;
pub mod render_loop;
pub mod sprite;

pub use color::{parse_color, Rgba};
pub use compositor::{Compositor, CursorDraw, CursorImage, FramePlan, FrameSnapshot};
pub use coord::{Coord, FrameSpace, Size, UvSpace};
pub use cursor_state::{CursorState, CursorStateMachine, CursorVisualState, HostCursorState};
pub use effects::EffectInstance;
pub use path_buffer::{PathBuffer, ShortTrail, TrailMode, TrailPoint};
pub use raster::{Canvas, FrameBuffer, Point, Shape, SharedSurface, Surface};
pub use render_loop::{
    spawn_render_loop, LoopState, PlaybackClock, RenderLoop, RenderLoopHandle,
    SharedProjectState, SnapshotProvider, TickOutcome,
};
pub use sprite::{Sprite, SpriteCache, SpriteKey, SpriteKind};
