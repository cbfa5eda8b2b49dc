/// Primitive protocol: one object per displayable geometry unit.
///
/// The walker drives every primitive through
/// `Uninitialized -> Updated -> (Rendered)* -> Retired`, with display
/// options checked as an independent flag. Implementations supply the
/// hooks (`update`, `render`, ...) and embed a `PrimitiveCore`; the
/// provided `update_prim` / `draw*` methods enforce the lifecycle around
/// them.

use crate::error::Result;
use crate::pick::PickRecord;
use crate::render::{
    AlphaPass, Decorations, DisplayOptionChange, DisplayOptions, DrawParams, RenderFlags, RenderMode,
};
use crate::renderer::Renderer;
use crate::{render_debug, render_err};
use super::refined_geometry::{GeometryHandle, RefinedGeometry};
use super::update_params::{RenderContext, UpdateContext, UpdateParams};

const SOURCE: &str = "viewport::Primitive";

/// Lifecycle position of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveState {
    Uninitialized,
    Updated,
    Retired,
}

/// State shared by every primitive implementation.
#[derive(Debug, Clone)]
pub struct PrimitiveCore {
    name: String,
    state: PrimitiveState,
    /// Identity of the last geometry seen; never the geometry itself
    geometry: Option<GeometryHandle>,
    has_point_normals: bool,
    display_options_initialized: bool,
    display_option_version: u64,
    decorations: Decorations,
    used_this_frame: bool,
    user_decorations_processed: bool,
    reserved_post_pass: Option<u32>,
    non_cached_draw: bool,
}

impl PrimitiveCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: PrimitiveState::Uninitialized,
            geometry: None,
            has_point_normals: false,
            display_options_initialized: false,
            display_option_version: 0,
            decorations: Decorations::empty(),
            used_this_frame: false,
            user_decorations_processed: false,
            reserved_post_pass: None,
            non_cached_draw: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PrimitiveState {
        self.state
    }

    pub fn is_updated(&self) -> bool {
        self.state == PrimitiveState::Updated
    }

    pub fn cached_geometry(&self) -> Option<GeometryHandle> {
        self.geometry
    }

    /// True when `handle` differs from the cached identity (or none is cached)
    pub fn is_stale(&self, handle: &GeometryHandle) -> bool {
        self.geometry != Some(*handle)
    }

    pub fn has_point_normals(&self) -> bool {
        self.has_point_normals
    }

    pub fn display_options_initialized(&self) -> bool {
        self.display_options_initialized
    }

    pub fn display_option_version(&self) -> u64 {
        self.display_option_version
    }

    pub fn decorations(&self) -> Decorations {
        self.decorations
    }

    pub fn user_decorations_processed(&self) -> bool {
        self.user_decorations_processed
    }

    // ===== FRAME USAGE =====

    pub fn mark_used(&mut self) {
        self.used_this_frame = true;
    }

    pub fn clear_used(&mut self) {
        self.used_this_frame = false;
    }

    pub fn used_this_frame(&self) -> bool {
        self.used_this_frame
    }

    // ===== POST PASS =====

    pub fn reserve_post_pass(&mut self, id: u32) {
        self.reserved_post_pass = Some(id);
    }

    pub fn reserved_post_pass(&self) -> Option<u32> {
        self.reserved_post_pass
    }

    // ===== NON-CACHED DRAW =====

    /// Ask the walker for one more update that bypasses cached buffers
    pub fn request_non_cached_draw(&mut self) {
        self.non_cached_draw = true;
    }

    pub fn needs_non_cached_draw(&self) -> bool {
        self.non_cached_draw
    }

    /// Called by the walker once the non-cached update went through
    pub fn mark_non_cached_draw_consumed(&mut self) {
        self.non_cached_draw = false;
    }

    fn ensure_updated(&self, call: &str) -> Result<()> {
        match self.state {
            PrimitiveState::Updated => Ok(()),
            PrimitiveState::Uninitialized => {
                Err(render_err!(SOURCE, "{} on '{}' before its first update", call, self.name))
            }
            PrimitiveState::Retired => {
                Err(render_err!(SOURCE, "{} on retired '{}'", call, self.name))
            }
        }
    }
}

pub trait Primitive: Send {
    fn core(&self) -> &PrimitiveCore;

    fn core_mut(&mut self) -> &mut PrimitiveCore;

    // ===== HOOKS =====

    /// Compare `options` with the last ones seen. `first_init` is set on the
    /// very first check, whose result is ignored.
    fn display_option_change(&mut self, options: &DisplayOptions, first_init: bool) -> DisplayOptionChange;

    /// Primitive-specific update: upload buffers, queue instanced draws
    fn update(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        geometry: &RefinedGeometry,
        params: &UpdateParams,
    ) -> Result<()>;

    fn render(
        &mut self,
        ctx: &mut RenderContext<'_>,
        mode: RenderMode,
        flags: RenderFlags,
        params: &DrawParams,
    ) -> Result<()>;

    /// Draw into the pick buffer and append the matching records.
    /// `base` carries the object identity (look id, detail index).
    fn render_pick(&mut self, ctx: &mut RenderContext<'_>, base: &PickRecord) -> Result<()>;

    fn render_decoration(&mut self, _ctx: &mut RenderContext<'_>, _decorations: Decorations) -> Result<()> {
        Ok(())
    }

    fn render_post_pass(&mut self, _ctx: &mut RenderContext<'_>) -> Result<()> {
        Ok(())
    }

    fn render_in_alpha_pass(&self, pass: AlphaPass) -> bool;

    fn update_user_decorations(
        &mut self,
        _ctx: &mut UpdateContext<'_>,
        _geometry: &RefinedGeometry,
    ) -> Result<()> {
        Ok(())
    }

    /// Release GPU resources
    fn retire(&mut self, renderer: &mut dyn Renderer);

    // ===== LIFECYCLE =====

    /// Check display options, bumping the display-option version on
    /// `VersionChanged`. The first call only initializes and reports
    /// `Unchanged`.
    fn check_display_option_change(&mut self, options: &DisplayOptions) -> DisplayOptionChange {
        let first_init = !self.core().display_options_initialized;
        let change = self.display_option_change(options, first_init);

        let core = self.core_mut();
        core.decorations = options.decorations;
        if first_init {
            core.display_options_initialized = true;
            return DisplayOptionChange::Unchanged;
        }
        if change == DisplayOptionChange::VersionChanged {
            core.display_option_version += 1;
        }
        change
    }

    /// Cache the geometry identity and run the update hooks.
    ///
    /// Safe to call repeatedly with the same geometry.
    fn update_prim(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        geometry: &RefinedGeometry,
        params: &UpdateParams,
    ) -> Result<()> {
        {
            let core = self.core_mut();
            if core.state == PrimitiveState::Retired {
                return Err(render_err!(SOURCE, "update of retired '{}'", core.name));
            }
            core.geometry = Some(geometry.handle);
            core.has_point_normals = geometry.has_point_normals;
            core.user_decorations_processed = false;
        }

        if !self.core().display_options_initialized {
            self.check_display_option_change(&params.options);
        }

        self.update(ctx, geometry, params)?;
        self.update_user_decorations(ctx, geometry)?;

        let core = self.core_mut();
        core.user_decorations_processed = true;
        core.state = PrimitiveState::Updated;
        core.used_this_frame = true;
        Ok(())
    }

    fn draw(
        &mut self,
        ctx: &mut RenderContext<'_>,
        mode: RenderMode,
        flags: RenderFlags,
        params: &DrawParams,
    ) -> Result<()> {
        self.core().ensure_updated("draw")?;
        self.render(ctx, mode, flags, params)
    }

    fn draw_pick(&mut self, ctx: &mut RenderContext<'_>, base: &PickRecord) -> Result<()> {
        self.core().ensure_updated("draw_pick")?;
        self.render_pick(ctx, base)
    }

    fn draw_decoration(&mut self, ctx: &mut RenderContext<'_>, decorations: Decorations) -> Result<()> {
        self.core().ensure_updated("draw_decoration")?;
        let enabled = decorations & self.core().decorations;
        if enabled.is_empty() {
            return Ok(());
        }
        self.render_decoration(ctx, enabled)
    }

    /// Run the post-pass hook if the executing pass is the one this
    /// primitive reserved. Returns whether the hook ran.
    fn draw_post_pass(&mut self, ctx: &mut RenderContext<'_>) -> Result<bool> {
        self.core().ensure_updated("draw_post_pass")?;
        let reserved = self.core().reserved_post_pass;
        match (reserved, ctx.info.active_post_pass()) {
            (Some(mine), Some(active)) if mine == active => {
                self.core_mut().reserved_post_pass = None;
                self.render_post_pass(ctx)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn draw_in_alpha_pass(&self, pass: AlphaPass) -> bool {
        pass == AlphaPass::All || self.render_in_alpha_pass(pass)
    }

    /// Release GPU resources and leave the lifecycle for good
    fn retire_prim(&mut self, renderer: &mut dyn Renderer) {
        if self.core().state == PrimitiveState::Retired {
            return;
        }
        self.retire(renderer);
        let core = self.core_mut();
        core.state = PrimitiveState::Retired;
        core.geometry = None;
        core.reserved_post_pass = None;
        render_debug!(SOURCE, "retired '{}'", core.name);
    }
}

#[cfg(test)]
#[path = "primitive_tests.rs"]
mod tests;
