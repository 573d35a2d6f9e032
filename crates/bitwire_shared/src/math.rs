//! Mathematical value types carried on the wire.
//!
//! These are the canonical representations used by the codecs. Field order
//! is the serialization order: x,y,z,w for vectors and rotations, r,g,b,a for
//! colors, origin then direction for rays.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 2D Vector - screen positions, planar directions
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vector2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vector2 {
    /// Creates a new Vector2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 3D Vector - position, velocity, direction
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vector3 {
    /// Creates a new Vector3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit Y vector
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
}

/// 4D Vector - homogeneous coordinates, packed shader parameters
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vector4 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Vector4 {
    /// Creates a new Vector4
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

/// Linear RGBA color with float channels
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}

impl Color {
    /// Creates a new color
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// 32-bit RGBA color, one byte per channel
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color32 {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Color32 {
    /// Creates a new color
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Quaternion for rotations
///
/// The packed codec only transmits x, y and z, so packed rotations must be
/// normalized before they are written.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `angle` radians around a unit `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// Four-component dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Returns the equivalent rotation with a non-negative w.
    ///
    /// `q` and `-q` describe the same rotation.
    #[must_use]
    pub fn canonical(self) -> Self {
        if self.w < 0.0 {
            Self::new(-self.x, -self.y, -self.z, -self.w)
        } else {
            self
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Ray in 3D space
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Ray {
    /// Start point
    pub origin: Vector3,
    /// Direction
    pub direction: Vector3,
}

impl Ray {
    /// Creates a new ray
    #[must_use]
    pub const fn new(origin: Vector3, direction: Vector3) -> Self {
        Self { origin, direction }
    }
}

/// Ray in 2D space
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Ray2D {
    /// Start point
    pub origin: Vector2,
    /// Direction
    pub direction: Vector2,
}

impl Ray2D {
    /// Creates a new 2D ray
    #[must_use]
    pub const fn new(origin: Vector2, direction: Vector2) -> Self {
        Self { origin, direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quaternion_canonical() {
        let q = Quaternion::new(0.5, -0.5, 0.5, -0.5);
        let c = q.canonical();
        assert_eq!(c, Quaternion::new(-0.5, 0.5, -0.5, 0.5));
        assert_eq!(c.canonical(), c);
    }

    #[test]
    fn test_axis_angle_is_normalized() {
        let q = Quaternion::from_axis_angle(Vector3::UP, 1.2);
        assert!((q.dot(q) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pod_layouts() {
        assert_eq!(bytemuck::bytes_of(&Vector3::ZERO).len(), 12);
        assert_eq!(bytemuck::bytes_of(&Color32::default()).len(), 4);
        assert_eq!(bytemuck::bytes_of(&Ray::default()).len(), 24);
        assert_eq!(bytemuck::bytes_of(&Ray2D::default()).len(), 16);
    }
}
