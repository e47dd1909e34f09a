//! Cursor sprites.
//!
//! Built-in sprites are embedded SVGs rasterised with resvg at the cursor's
//! pixel size and theme. A custom base64 PNG can replace them. Rasterised
//! sprites are kept in an LRU so size or theme changes don't thrash.

use std::num::NonZeroUsize;
use std::sync::Arc;

use base64::Engine;
use lru::LruCache;

use super::color::{parse_color, Rgba};
use super::cursor_state::CursorState;
use crate::config::{CursorAppearance, CursorStyle, CursorTheme, CustomCursorImage};
use crate::error::{ReplayError, ReplayResult, ResultExt};

const ARROW_SVG: &str = include_str!("../../assets/cursors/arrow.svg");
const HAND_SVG: &str = include_str!("../../assets/cursors/hand.svg");
const BUSY_SVG: &str = include_str!("../../assets/cursors/busy.svg");

/// Sprite height in pixels at size 1.0.
pub const BASE_CURSOR_HEIGHT: f32 = 24.0;

/// Sprites kept rasterised.
const SPRITE_CACHE_CAPACITY: usize = 16;

/// Built-in sprite shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Arrow,
    Hand,
    Busy,
}

impl SpriteKind {
    /// Sprite for a cursor style in a given state. `Dot` has no sprite.
    pub fn for_style(style: CursorStyle, state: CursorState) -> Option<Self> {
        if state == CursorState::Busy {
            return Some(SpriteKind::Busy);
        }
        match style {
            CursorStyle::Arrow => Some(SpriteKind::Arrow),
            CursorStyle::Hand => Some(SpriteKind::Hand),
            CursorStyle::Dot => None,
        }
    }

    /// SVG source and hotspot as a fraction of width/height.
    fn source(self) -> (&'static str, f32, f32) {
        match self {
            SpriteKind::Arrow => (ARROW_SVG, 0.094, 0.063),
            SpriteKind::Hand => (HAND_SVG, 0.35, 0.063),
            SpriteKind::Busy => (BUSY_SVG, 0.5, 0.5),
        }
    }
}

/// Cache key for a rasterised sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    pub kind: SpriteKind,
    pub theme: CursorTheme,
    /// Target height in pixels.
    pub height: u32,
    /// Accent RGB (busy spinner arc).
    pub accent: [u8; 3],
}

impl SpriteKey {
    pub fn new(kind: SpriteKind, appearance: &CursorAppearance) -> Self {
        let accent = parse_color(&appearance.color).unwrap_or(Rgba::rgb(0x3B, 0x82, 0xF6));
        Self {
            kind,
            theme: appearance.theme,
            height: (BASE_CURSOR_HEIGHT * appearance.size).round().max(1.0) as u32,
            accent: [accent.r, accent.g, accent.b],
        }
    }
}

/// Rasterised cursor image (straight-alpha RGBA).
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    /// Hotspot in sprite pixels.
    pub hotspot_x: f32,
    pub hotspot_y: f32,
    pub data: Vec<u8>,
}

/// Rasterise a built-in sprite.
pub fn render_sprite(key: &SpriteKey) -> ReplayResult<Sprite> {
    let (template, hotspot_x, hotspot_y) = key.kind.source();
    let (fill, stroke) = match key.theme {
        CursorTheme::Light => ("#FFFFFF", "#000000"),
        CursorTheme::Dark => ("#111111", "#FFFFFF"),
    };
    let [r, g, b] = key.accent;
    let svg = template
        .replace("{{fill}}", fill)
        .replace("{{stroke}}", stroke)
        .replace("{{accent}}", &format!("#{:02X}{:02X}{:02X}", r, g, b));

    let opts = resvg::usvg::Options::default();
    let tree = resvg::usvg::Tree::from_str(&svg, &opts)
        .map_err(|e| ReplayError::Sprite(format!("{:?}: {}", key.kind, e)))?;

    let size = tree.size();
    let scale = key.height as f32 / size.height();
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = key.height.max(1);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ReplayError::Sprite(format!("Invalid sprite size {}x{}", width, height)))?;
    let transform = resvg::tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    // The canvas blends straight alpha
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    Ok(Sprite {
        width,
        height,
        hotspot_x: hotspot_x * width as f32,
        hotspot_y: hotspot_y * height as f32,
        data,
    })
}

/// Decode a custom base64 PNG sprite. A `data:` URL prefix is accepted.
pub fn decode_custom_sprite(custom: &CustomCursorImage) -> ReplayResult<Sprite> {
    let payload = custom
        .data_base64
        .split_once(',')
        .map(|(_, data)| data)
        .unwrap_or(&custom.data_base64);
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;
    let image = image::load_from_memory(&bytes)
        .context("Failed to decode custom cursor image")?
        .to_rgba8();
    let (width, height) = image.dimensions();

    Ok(Sprite {
        width,
        height,
        hotspot_x: custom.hotspot_x.clamp(0, width as i32) as f32,
        hotspot_y: custom.hotspot_y.clamp(0, height as i32) as f32,
        data: image.into_raw(),
    })
}

/// LRU of rasterised sprites plus the decoded custom sprite.
pub struct SpriteCache {
    sprites: LruCache<SpriteKey, Arc<Sprite>>,
    /// Last custom image seen and its decode result.
    custom: Option<(CustomCursorImage, Option<Arc<Sprite>>)>,
}

impl Default for SpriteCache {
    fn default() -> Self {
        Self::new(SPRITE_CACHE_CAPACITY)
    }
}

impl SpriteCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sprites: LruCache::new(capacity),
            custom: None,
        }
    }

    /// Get or rasterise a built-in sprite. Failures are logged and yield `None`.
    pub fn get(&mut self, key: SpriteKey) -> Option<Arc<Sprite>> {
        if let Some(sprite) = self.sprites.get(&key) {
            return Some(Arc::clone(sprite));
        }
        match render_sprite(&key) {
            Ok(sprite) => {
                log::debug!(
                    "[SPRITE] Rasterised {:?} {:?} at {}px",
                    key.kind,
                    key.theme,
                    key.height
                );
                let sprite = Arc::new(sprite);
                self.sprites.put(key, Arc::clone(&sprite));
                Some(sprite)
            }
            Err(e) => {
                log::warn!("[SPRITE] {}", e);
                None
            }
        }
    }

    /// Decoded custom sprite, decoding at most once per distinct image.
    pub fn custom(&mut self, custom: &CustomCursorImage) -> Option<Arc<Sprite>> {
        if let Some((cached, sprite)) = &self.custom {
            if cached == custom {
                return sprite.clone();
            }
        }
        let sprite = match decode_custom_sprite(custom) {
            Ok(sprite) => {
                log::debug!("[SPRITE] Decoded custom cursor {}x{}", sprite.width, sprite.height);
                Some(Arc::new(sprite))
            }
            Err(e) => {
                log::warn!("[SPRITE] Custom cursor unusable, using built-in: {}", e);
                None
            }
        };
        self.custom = Some((custom.clone(), sprite.clone()));
        sprite
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
        self.custom = None;
    }
}
