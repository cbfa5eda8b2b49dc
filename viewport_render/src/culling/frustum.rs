/// View frustums recorded per viewport for instance culling.
///
/// Each plane is a Vec4 (A, B, C, D) with an inward-pointing unit normal:
/// a point P is inside when `dot(plane.xyz, P) + D >= 0` for all six planes.

use glam::{Mat4, Vec3, Vec4};
use super::bounds::BoundingBox;

/// 3-way frustum/box classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// Box entirely outside
    Outside,
    /// Box entirely inside
    Inside,
    /// Box straddles at least one plane
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six clipping planes of one viewport camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes from a view-projection matrix (Gribb & Hartmann).
    ///
    /// Works for perspective and orthographic projections. With a [0, 1]
    /// depth range the near plane is looser than the real one, which keeps
    /// the test conservative.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let r0 = vp.row(0);
        let r1 = vp.row(1);
        let r2 = vp.row(2);
        let r3 = vp.row(3);

        let mut planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2];
        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Conservative visibility test: false only when the box is certainly
    /// outside. Empty boxes are always reported visible.
    pub fn intersects_box(&self, bounds: &BoundingBox) -> bool {
        self.classify_box(bounds) != FrustumTest::Outside
    }

    /// Classify a box against the frustum.
    ///
    /// The positive vertex (corner furthest along the normal) decides
    /// `Outside`; the negative vertex decides `Inside` vs `Partial`.
    pub fn classify_box(&self, bounds: &BoundingBox) -> FrustumTest {
        if bounds.is_empty() {
            return FrustumTest::Partial;
        }

        let mut all_inside = true;
        for plane in &self.planes {
            let normal = plane.truncate();
            let p_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), bounds.max, bounds.min);
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            let n_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), bounds.min, bounds.max);
            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
