//! Planar floor coordinates and compass-quantized edge angles.

use std::fmt;

/// A position on the warehouse floor, in metres.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance(self, other: Point2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Direction of travel from `self` to `other`, quantized to the compass.
    pub fn angle_to(self, other: Point2) -> Angle {
        Angle::from_radians((other.y - self.y).atan2(other.x - self.x))
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ── Angle ─────────────────────────────────────────────────────────────────────

/// An edge direction quantized to the 8-point compass.
///
/// Stored as whole degrees in `[0, 360)`, always a multiple of
/// [`Angle::RESOLUTION_DEG`].  0° points along +x, angles grow
/// counter-clockwise.  Two edges continue the same hop iff their angles are
/// equal, so quantization is what makes hop detection robust to float noise
/// in node positions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle(u16);

impl Angle {
    pub const RESOLUTION_DEG: u16 = 45;

    pub const EAST: Angle = Angle(0);
    pub const NORTH: Angle = Angle(90);
    pub const WEST: Angle = Angle(180);
    pub const SOUTH: Angle = Angle(270);

    /// Quantize an arbitrary number of degrees (any sign, any magnitude).
    pub fn from_degrees(deg: f64) -> Self {
        let step = Self::RESOLUTION_DEG as f64;
        let snapped = (deg / step).round() * step;
        let normalized = snapped.rem_euclid(360.0);
        Angle((normalized as u16) % 360)
    }

    #[inline]
    pub fn from_radians(rad: f64) -> Self {
        Self::from_degrees(rad.to_degrees())
    }

    #[inline]
    pub fn degrees(self) -> u16 {
        self.0
    }

    /// Smallest rotation in degrees (`0..=180`) that turns `self` into `other`.
    #[inline]
    pub fn delta_degrees(self, other: Angle) -> u16 {
        let d = (self.0 as i32 - other.0 as i32).rem_euclid(360) as u16;
        d.min(360 - d)
    }

    /// Smallest rotation in radians that turns `self` into `other`.
    #[inline]
    pub fn delta_radians(self, other: Angle) -> f64 {
        (self.delta_degrees(other) as f64).to_radians()
    }

    /// The direction pointing the other way.
    #[inline]
    pub fn reversed(self) -> Angle {
        Angle((self.0 + 180) % 360)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}
