/// Draw-level render types shared by primitives, GeoRender and the
/// instance manager.

use bitflags::bitflags;
use glam::Vec4;

/// How a draw call rasterizes its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    #[default]
    Shaded,
    Wireframe,
    /// One point per instance or vertex (the degraded budget mode)
    Points,
    /// Unit-cube outline fitted to the bounds
    BoundingBox,
}

bitflags! {
    /// Per-draw state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u32 {
        const SELECTED        = 1 << 0;
        const GHOSTED         = 1 << 1;
        const LIT             = 1 << 2;
        const TEXTURED        = 1 << 3;
        const TRANSPARENT     = 1 << 4;
        /// Per-instance colors override the material color
        const INSTANCE_COLORS = 1 << 5;
        /// Draw writes pick ids instead of colors
        const PICK            = 1 << 6;
    }
}

/// Draw parameters forwarded verbatim from the request to the draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    pub color: Vec4,
    pub point_size: f32,
    pub line_width: f32,
    pub depth_bias: f32,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            point_size: 1.0,
            line_width: 1.0,
            depth_bias: 0.0,
        }
    }
}

/// Which alpha pass the walker is currently drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaPass {
    #[default]
    Opaque,
    Transparent,
    /// Single pass drawing everything (no alpha sorting)
    All,
}
