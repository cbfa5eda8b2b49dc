//! Culling primitives: bounding boxes and view frustums.
//!
//! The instance manager tests every queued instance against the frustums of
//! the viewports recorded for the pass.

mod bounds;
mod frustum;

pub use bounds::BoundingBox;
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
