use crate::foundation::error::{TrafficError, TrafficResult};

pub use kurbo::{BezPath, Point};

/// Zero-based index of a host frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Geographic coordinate, serialized as `[lng, lat]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LngLat {
    /// Coordinate from longitude and latitude.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Both components are finite.
    pub fn is_finite(self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// Position along an arc, serialized as `[lng, lat, height]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct ArcPosition {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Bump height above the ground plane.
    pub height: f64,
}

impl ArcPosition {
    /// Position from its three components.
    pub const fn new(lng: f64, lat: f64, height: f64) -> Self {
        Self { lng, lat, height }
    }

    /// Ground projection, dropping the height.
    pub fn planar(self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }
}

impl From<[f64; 3]> for ArcPosition {
    fn from([lng, lat, height]: [f64; 3]) -> Self {
        Self { lng, lat, height }
    }
}

impl From<ArcPosition> for [f64; 3] {
    fn from(p: ArcPosition) -> Self {
        [p.lng, p.lat, p.height]
    }
}

/// Straight (not premultiplied) RGBA8.
///
/// Deserializes from `[r, g, b]` (opaque) or `[r, g, b, a]`; always serializes four channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<u8>", into = "[u8; 4]")]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8 {
    /// Color from four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Replace the alpha channel with `255 * alpha`, alpha clamped to `[0, 1]`.
    pub fn with_alpha(self, alpha: f64) -> Self {
        let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        Self {
            a: (alpha * 255.0).round() as u8,
            ..self
        }
    }
}

impl TryFrom<Vec<u8>> for Rgba8 {
    type Error = String;

    fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
        match v.as_slice() {
            &[r, g, b] => Ok(Self::opaque(r, g, b)),
            &[r, g, b, a] => Ok(Self::new(r, g, b, a)),
            other => Err(format!(
                "color must have 3 or 4 channels, got {}",
                other.len()
            )),
        }
    }
}

impl From<Rgba8> for [u8; 4] {
    fn from(c: Rgba8) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Preview raster size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Both sides must be non-zero and fit in `u16`.
    pub fn new(width: u32, height: u32) -> TrafficResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrafficError::validation("canvas width and height must be > 0"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(TrafficError::validation("canvas dimensions must fit in u16"));
        }
        Ok(Self { width, height })
    }
}
