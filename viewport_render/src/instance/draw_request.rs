/// Draw request types exchanged with the instance manager.

use std::sync::Arc;
use glam::Mat4;
use crate::culling::BoundingBox;
use crate::primitive::InstanceAttributes;
use crate::render::{RenderMode, RenderFlags, DrawParams};

/// Opaque id of a queued request, valid for one pass only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawRequestId {
    pub(crate) pass: u64,
    pub(crate) index: u32,
}

/// Resolution decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawOutcome {
    /// Nothing visible
    NoDraw,
    /// Only `visible_indices` are drawn, at full detail
    PartialDraw,
    /// Degraded by budget pressure: one point per visible instance
    PointsOnlyDraw,
    FullDraw,
}

impl DrawOutcome {
    pub fn draws_anything(self) -> bool {
        self != DrawOutcome::NoDraw
    }

    /// Full-detail outcomes (the ones charged against the budget)
    pub fn is_full_detail(self) -> bool {
        matches!(self, DrawOutcome::FullDraw | DrawOutcome::PartialDraw)
    }
}

/// What a primitive asks the manager to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRequest {
    /// Object-space bounds of one copy
    pub bounds: BoundingBox,
    /// Object-to-world transform, applied after each instance transform
    pub transform: Mat4,
    /// GL primitives of one copy
    pub gl_primitives: u64,
    pub mode: RenderMode,
    pub flags: RenderFlags,
    pub params: DrawParams,
}

impl DrawRequest {
    pub fn new(bounds: BoundingBox, transform: Mat4, gl_primitives: u64) -> Self {
        Self {
            bounds,
            transform,
            gl_primitives,
            mode: RenderMode::Shaded,
            flags: RenderFlags::empty(),
            params: DrawParams::default(),
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_flags(mut self, flags: RenderFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_params(mut self, params: DrawParams) -> Self {
        self.params = params;
        self
    }
}

/// Appearance of a queued bounding box; one batch is built per category.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BboxStyle {
    pub wireframe: bool,
    pub selected: bool,
    /// Per-box color; uncolored boxes use the batch default
    pub color: Option<glam::Vec4>,
}

/// Resolution result of one request, readable any number of times in the pass.
#[derive(Debug, Clone)]
pub struct ResolvedDraw {
    pub outcome: DrawOutcome,
    /// `RenderMode::Points` when degraded, the requested mode otherwise
    pub mode: RenderMode,
    pub flags: RenderFlags,
    pub params: DrawParams,
    pub transform: Mat4,
    /// `None` for single-transform requests
    pub instances: Option<InstanceAttributes>,
    /// Instances that survived culling, ascending
    pub visible_indices: Arc<[u32]>,
    /// GL primitives the draw rasterizes
    pub gl_primitives: u64,
}

impl ResolvedDraw {
    pub fn visible_count(&self) -> usize {
        self.visible_indices.len()
    }
}
