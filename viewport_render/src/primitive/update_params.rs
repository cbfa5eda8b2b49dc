/// Parameters and contexts passed to primitives by the walker.

use bitflags::bitflags;
use crate::instance::InstanceManager;
use crate::render::{DisplayOptions, DrawParams, RenderFlags, RenderInfo};
use crate::renderer::Renderer;

bitflags! {
    /// Why a primitive is being updated this frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UpdateReason: u32 {
        const FIRST_UPDATE     = 1 << 0;
        const GEOMETRY_CHANGED = 1 << 1;
        /// Display options changed with a version bump
        const DISPLAY_OPTIONS  = 1 << 2;
        /// A one-off rebuild requested by the primitive itself
        const NON_CACHED       = 1 << 3;
        const SELECTION        = 1 << 4;

        /// Reasons that invalidate uploaded buffers
        const REBUILD = Self::FIRST_UPDATE.bits() | Self::GEOMETRY_CHANGED.bits()
            | Self::DISPLAY_OPTIONS.bits() | Self::NON_CACHED.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateParams {
    pub reason: UpdateReason,
    pub options: DisplayOptions,
    /// Object-level flags (selection, ghosting) applied to queued draws
    pub flags: RenderFlags,
    pub draw_params: DrawParams,
}

impl Default for UpdateParams {
    fn default() -> Self {
        Self {
            reason: UpdateReason::empty(),
            options: DisplayOptions::default(),
            flags: RenderFlags::empty(),
            draw_params: DrawParams::default(),
        }
    }
}

impl UpdateParams {
    pub fn new(reason: UpdateReason, options: DisplayOptions) -> Self {
        Self { reason, options, ..Self::default() }
    }

    pub fn with_flags(mut self, flags: RenderFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_draw_params(mut self, draw_params: DrawParams) -> Self {
        self.draw_params = draw_params;
        self
    }
}

/// Everything a primitive may touch during update.
pub struct UpdateContext<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub instances: &'a mut InstanceManager,
    pub info: &'a mut RenderInfo,
}

/// Everything a primitive may touch during render, pick and post passes.
///
/// The instance manager is read-only here: decisions were made before the
/// first draw.
pub struct RenderContext<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub instances: &'a InstanceManager,
    pub info: &'a mut RenderInfo,
    pub options: &'a DisplayOptions,
}
