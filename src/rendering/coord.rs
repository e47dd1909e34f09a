//! Type-safe coordinates for the replay pipeline.
//!
//! ```text
//! UvSpace (recorded, 0.0-1.0) → FrameSpace (surface pixels)
//! ```
//!
//! Each space is a phantom type so normalized and pixel positions cannot be
//! mixed without an explicit conversion.

use std::ops::{Mul, Sub};

/// Normalized recording coordinates (0.0-1.0 UV space).
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct UvSpace;

/// Pixel coordinates on the render surface.
/// `(0, 0)` is the top-left of the surface.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct FrameSpace;

/// A 2D coordinate with an associated coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: std::marker::PhantomData<TSpace>,
}

impl<TSpace: Default> Coord<TSpace> {
    /// Create a new coordinate in the specified space.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: std::marker::PhantomData,
        }
    }

    /// Convert to f32 tuple.
    pub fn as_f32(&self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }

    /// Linear interpolation between two coordinates.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Get the length/magnitude of the coordinate as a vector.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Coord<UvSpace> {
    /// Scale a normalized position onto a surface.
    pub fn to_frame(self, size: Size<FrameSpace>) -> Coord<FrameSpace> {
        Coord::new(self.x * size.width, self.y * size.height)
    }
}

// Arithmetic operations that preserve the coordinate space

impl<T: Default> Sub for Coord<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Default> Mul<f64> for Coord<T> {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// Size in a specific coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size<TSpace> {
    pub width: f64,
    pub height: f64,
    _space: std::marker::PhantomData<TSpace>,
}

impl<TSpace: Default> Size<TSpace> {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            _space: std::marker::PhantomData,
        }
    }

    pub fn from_u32(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_to_frame() {
        let uv = Coord::<UvSpace>::new(0.25, 0.5);
        let frame = uv.to_frame(Size::from_u32(1920, 1080));
        assert_eq!(frame.x, 480.0);
        assert_eq!(frame.y, 540.0);
    }

    #[test]
    fn test_lerp_endpoints_exact() {
        let a = Coord::<FrameSpace>::new(10.0, 20.0);
        let b = Coord::<FrameSpace>::new(30.0, 60.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 0.5), Coord::new(20.0, 40.0));
    }

    #[test]
    fn test_arithmetic() {
        let a = Coord::<FrameSpace>::new(3.0, 4.0);
        let b = Coord::<FrameSpace>::new(1.0, 1.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!((a - b).as_f32(), (2.0, 3.0));
        assert_eq!((a - b) * 2.0, Coord::new(4.0, 6.0));
    }

    #[test]
    fn test_empty_size() {
        assert!(Size::<FrameSpace>::from_u32(0, 10).is_empty());
        assert!(!Size::<FrameSpace>::from_u32(1, 1).is_empty());
    }
}
