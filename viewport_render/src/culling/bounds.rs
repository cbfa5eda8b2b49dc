/// Axis-aligned bounding boxes used by the instance manager.
///
/// Requests carry their bounds in local space; the resolver transforms them
/// per instance for frustum tests and bbox batching.

use glam::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
///
/// An "empty" box has `min > max` on every axis and is the identity for
/// `union`. Empty boxes are never culled (the owner had no bounds to give).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl BoundingBox {
    /// The empty box
    pub const EMPTY: BoundingBox = BoundingBox {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centered at `center` with half-extents `half`
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self { min: center - half, max: center + half }
    }

    /// Smallest box enclosing all points (empty for no points)
    pub fn from_points(points: &[Vec3]) -> Self {
        points.iter().fold(Self::EMPTY, |acc, p| acc.expanded_to(*p))
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() { Vec3::ZERO } else { self.max - self.min }
    }

    /// Length of the diagonal (0 for empty boxes)
    pub fn diagonal(&self) -> f32 {
        self.size().length()
    }

    /// Grow to include a point
    pub fn expanded_to(&self, p: Vec3) -> Self {
        Self { min: self.min.min(p), max: self.max.max(p) }
    }

    /// Smallest box enclosing both
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Transform this box by a matrix, returning the enclosing axis-aligned box.
    ///
    /// Arvo's method: projects each matrix axis onto the extents instead of
    /// transforming all 8 corners. Empty boxes stay empty.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }

        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        BoundingBox { min: new_min, max: new_max }
    }

    /// Matrix mapping the unit cube [-1, 1]^3 onto this box.
    ///
    /// Bbox batches draw one shared cube mesh with this matrix per entry.
    pub fn unit_cube_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.size() * 0.5,
            glam::Quat::IDENTITY,
            self.center(),
        )
    }

    /// Test if this box fully contains another
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if the two boxes overlap or touch
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
