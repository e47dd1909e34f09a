//! Software rasteriser for the overlay layers.
//!
//! Everything the compositor draws is reduced to a handful of [`Shape`]s
//! painted onto a [`Canvas`], a borrowed view over straight-alpha RGBA bytes.
//! All drawing is bounds-checked; shapes partly or fully off-surface are
//! clipped, never panics.

use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;

use super::color::Rgba;

/// Coverage below this is not blended.
const MIN_COVERAGE: f32 = 0.004;

/// A point in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point offset by polar `(angle, distance)`.
    pub fn offset(self, angle: f32, distance: f32) -> Self {
        Self::new(
            self.x + angle.cos() * distance,
            self.y + angle.sin() * distance,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Geometry primitive produced by the effect engine and the compositor.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled disc. Full alpha inside `hardness * radius`, linear falloff to
    /// the edge beyond it. `hardness = 1.0` is a crisp anti-aliased disc.
    Disc {
        center: Point,
        radius: f32,
        hardness: f32,
        color: Rgba,
    },
    /// Radial glow with quadratic falloff from the centre.
    Glow {
        center: Point,
        radius: f32,
        color: Rgba,
    },
    /// Ring whose outer edge sits at `radius`.
    Ring {
        center: Point,
        radius: f32,
        thickness: f32,
        color: Rgba,
    },
    /// Thick line segment with round caps.
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Rgba,
    },
    /// Axis-aligned rectangle.
    Rect {
        origin: Point,
        width: f32,
        height: f32,
        color: Rgba,
    },
}

impl Shape {
    pub fn color(&self) -> Rgba {
        match self {
            Shape::Disc { color, .. }
            | Shape::Glow { color, .. }
            | Shape::Ring { color, .. }
            | Shape::Line { color, .. }
            | Shape::Rect { color, .. } => *color,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.color().a
    }

    /// Largest radius, width or extent of the shape.
    pub fn extent(&self) -> f32 {
        match self {
            Shape::Disc { radius, .. } | Shape::Glow { radius, .. } | Shape::Ring { radius, .. } => {
                *radius
            }
            Shape::Line { width, .. } => *width,
            Shape::Rect { width, height, .. } => width.max(*height),
        }
    }
}

/// Mutable view over an RGBA8 pixel buffer.
pub struct Canvas<'a> {
    pixels: &'a mut [[u8; 4]],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    /// Wrap `data` as a `width x height` canvas.
    ///
    /// Returns `None` for a zero-size surface or a buffer of the wrong length.
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if data.len() != expected {
            return None;
        }
        let pixels = bytemuck::try_cast_slice_mut::<u8, [u8; 4]>(data).ok()?;
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Fill with fully transparent pixels.
    pub fn clear(&mut self) {
        self.pixels.fill([0, 0, 0, 0]);
    }

    /// Multiply every pixel's alpha by `retain`.
    pub fn fade(&mut self, retain: f32) {
        let retain = retain.clamp(0.0, 1.0);
        for px in self.pixels.iter_mut() {
            px[3] = (px[3] as f32 * retain) as u8;
        }
    }

    /// Straight-alpha "over" blend of `color` at `coverage` into one pixel.
    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f32) {
        let src_a = (color.a * coverage).clamp(0.0, 1.0);
        if src_a < MIN_COVERAGE {
            return;
        }
        let Some(px) = self.pixels.get_mut((y * self.width + x) as usize) else {
            return;
        };

        let dst_a = px[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        let mix = |src: u8, dst: u8| {
            let c = (src as f32 * src_a + dst as f32 * dst_a * (1.0 - src_a)) / out_a;
            c.round().clamp(0.0, 255.0) as u8
        };
        px[0] = mix(color.r, px[0]);
        px[1] = mix(color.g, px[1]);
        px[2] = mix(color.b, px[2]);
        px[3] = (out_a * 255.0).round() as u8;
    }

    /// Inclusive pixel bounds `(min_x, min_y, max_x, max_y)` of the box
    /// `min..max`, clipped to the canvas.
    fn bounds(&self, min: Point, max: Point) -> Option<(u32, u32, u32, u32)> {
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        let min_x = min.x.floor().max(0.0);
        let min_y = min.y.floor().max(0.0);
        let max_x = max.x.ceil().min(self.width as f32 - 1.0);
        let max_y = max.y.ceil().min(self.height as f32 - 1.0);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        Some((min_x as u32, min_y as u32, max_x as u32, max_y as u32))
    }

    fn radial_bounds(&self, center: Point, reach: f32) -> Option<(u32, u32, u32, u32)> {
        self.bounds(
            Point::new(center.x - reach, center.y - reach),
            Point::new(center.x + reach, center.y + reach),
        )
    }

    /// Run `coverage` for every pixel centre in the clipped bounds.
    fn shade(
        &mut self,
        bounds: Option<(u32, u32, u32, u32)>,
        color: Rgba,
        coverage: impl Fn(f32, f32) -> f32,
    ) {
        let Some((min_x, min_y, max_x, max_y)) = bounds else {
            return;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let cov = coverage(x as f32 + 0.5, y as f32 + 0.5);
                if cov > 0.0 {
                    self.blend(x, y, color, cov.min(1.0));
                }
            }
        }
    }

    pub fn draw(&mut self, shape: &Shape) {
        if shape.alpha() <= 0.0 || !shape.extent().is_finite() {
            return;
        }
        match *shape {
            Shape::Disc {
                center,
                radius,
                hardness,
                color,
            } => self.fill_disc(center, radius, hardness, color),
            Shape::Glow {
                center,
                radius,
                color,
            } => self.fill_glow(center, radius, color),
            Shape::Ring {
                center,
                radius,
                thickness,
                color,
            } => self.stroke_ring(center, radius, thickness, color),
            Shape::Line {
                from,
                to,
                width,
                color,
            } => self.draw_line(from, to, width, color),
            Shape::Rect {
                origin,
                width,
                height,
                color,
            } => self.fill_rect(origin, width, height, color),
        }
    }

    pub fn fill_disc(&mut self, center: Point, radius: f32, hardness: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let inner = radius * hardness.clamp(0.0, 1.0);
        let band = (radius - inner).max(f32::EPSILON);
        let bounds = self.radial_bounds(center, radius + 1.0);
        self.shade(bounds, color, |x, y| {
            let d = ((x - center.x).powi(2) + (y - center.y).powi(2)).sqrt();
            let edge = (radius - d + 0.5).clamp(0.0, 1.0);
            if d <= inner {
                edge
            } else {
                edge.min(1.0 - (d - inner) / band)
            }
        });
    }

    pub fn fill_glow(&mut self, center: Point, radius: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let bounds = self.radial_bounds(center, radius);
        self.shade(bounds, color, |x, y| {
            let dist_sq = (x - center.x).powi(2) + (y - center.y).powi(2);
            if dist_sq >= radius_sq {
                return 0.0;
            }
            let falloff = 1.0 - dist_sq / radius_sq;
            falloff * falloff
        });
    }

    pub fn stroke_ring(&mut self, center: Point, radius: f32, thickness: f32, color: Rgba) {
        if radius <= 0.0 || thickness <= 0.0 {
            return;
        }
        let inner = (radius - thickness).max(0.0);
        let bounds = self.radial_bounds(center, radius + 1.0);
        self.shade(bounds, color, |x, y| {
            let d = ((x - center.x).powi(2) + (y - center.y).powi(2)).sqrt();
            let outer_edge = (radius - d + 0.5).clamp(0.0, 1.0);
            let inner_edge = if inner > 0.0 {
                (d - inner + 0.5).clamp(0.0, 1.0)
            } else {
                1.0
            };
            outer_edge.min(inner_edge)
        });
    }

    pub fn draw_line(&mut self, from: Point, to: Point, width: f32, color: Rgba) {
        if width <= 0.0 {
            return;
        }
        let half = width / 2.0;
        let bounds = self.bounds(
            Point::new(from.x.min(to.x) - half - 1.0, from.y.min(to.y) - half - 1.0),
            Point::new(from.x.max(to.x) + half + 1.0, from.y.max(to.y) + half + 1.0),
        );
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let len_sq = dx * dx + dy * dy;
        self.shade(bounds, color, |x, y| {
            let t = if len_sq > 0.0 {
                (((x - from.x) * dx + (y - from.y) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (px, py) = (from.x + dx * t, from.y + dy * t);
            let dist = ((x - px).powi(2) + (y - py).powi(2)).sqrt();
            (half - dist + 0.5).clamp(0.0, 1.0)
        });
    }

    pub fn fill_rect(&mut self, origin: Point, width: f32, height: f32, color: Rgba) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let end = Point::new(origin.x + width, origin.y + height);
        let bounds = self.bounds(origin, end);
        self.shade(bounds, color, |x, y| {
            if x >= origin.x && x < end.x && y >= origin.y && y < end.y {
                1.0
            } else {
                0.0
            }
        });
    }

    /// Blit an RGBA sprite with its top-left at `origin`, nearest-neighbour
    /// scaled by `scale` and faded by `alpha`.
    pub fn blit_rgba(
        &mut self,
        src: &[u8],
        src_width: u32,
        src_height: u32,
        origin: Point,
        scale: f32,
        alpha: f32,
    ) {
        if src_width == 0
            || src_height == 0
            || src.len() < (src_width * src_height * 4) as usize
            || scale <= 0.0
            || alpha <= 0.0
        {
            return;
        }
        let scaled_w = src_width as f32 * scale;
        let scaled_h = src_height as f32 * scale;
        let bounds = self.bounds(origin, Point::new(origin.x + scaled_w, origin.y + scaled_h));
        let Some((min_x, min_y, max_x, max_y)) = bounds else {
            return;
        };

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let sx = (x as f32 + 0.5 - origin.x) / scale;
                let sy = (y as f32 + 0.5 - origin.y) / scale;
                if sx < 0.0 || sy < 0.0 || sx >= src_width as f32 || sy >= src_height as f32 {
                    continue;
                }
                let idx = ((sy as u32 * src_width + sx as u32) * 4) as usize;
                let Some(&[r, g, b, a]) = src.get(idx..idx + 4).and_then(|s| s.first_chunk::<4>())
                else {
                    continue;
                };
                if a == 0 {
                    continue;
                }
                let color = Rgba {
                    r,
                    g,
                    b,
                    a: a as f32 / 255.0,
                };
                self.blend(x, y, color, alpha.min(1.0));
            }
        }
    }
}

/// A drawing target the compositor can paint onto.
///
/// `paint` returns false without calling the closure when the surface is
/// unavailable (detached or zero-size).
pub trait Surface {
    fn paint(&mut self, paint: &mut dyn FnMut(&mut Canvas<'_>)) -> bool;
}

/// Owned RGBA frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Fully transparent frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        self.data.get(idx..idx + 4)?.first_chunk::<4>().copied()
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixels(&self) -> usize {
        self.data.chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    pub fn into_image(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data)
    }
}

impl Surface for FrameBuffer {
    fn paint(&mut self, paint: &mut dyn FnMut(&mut Canvas<'_>)) -> bool {
        match Canvas::new(&mut self.data, self.width, self.height) {
            Some(mut canvas) => {
                paint(&mut canvas);
                true
            }
            None => false,
        }
    }
}

impl Surface for RgbaImage {
    fn paint(&mut self, paint: &mut dyn FnMut(&mut Canvas<'_>)) -> bool {
        let (width, height) = self.dimensions();
        match Canvas::new(&mut **self, width, height) {
            Some(mut canvas) => {
                paint(&mut canvas);
                true
            }
            None => false,
        }
    }
}

/// Frame buffer shared between the render loop and the host.
///
/// `release` detaches it: later paints become no-ops.
#[derive(Debug, Clone, Default)]
pub struct SharedSurface {
    inner: Arc<Mutex<Option<FrameBuffer>>>,
}

impl SharedSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(FrameBuffer::new(width, height)))),
        }
    }

    /// Replace the backing frame with a fresh one of the given size.
    pub fn resize(&self, width: u32, height: u32) {
        *self.inner.lock() = Some(FrameBuffer::new(width, height));
    }

    pub fn release(&self) {
        self.inner.lock().take();
    }

    pub fn is_attached(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Copy of the current frame, if attached.
    pub fn snapshot(&self) -> Option<FrameBuffer> {
        self.inner.lock().clone()
    }
}

impl Surface for SharedSurface {
    fn paint(&mut self, paint: &mut dyn FnMut(&mut Canvas<'_>)) -> bool {
        match self.inner.lock().as_mut() {
            Some(frame) => frame.paint(paint),
            None => false,
        }
    }
}
