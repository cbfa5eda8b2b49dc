/// Non-instanced primitive: draws its GeoRender directly.
///
/// Transparent meshes skip the main pass and reserve a post pass, drawn
/// once the opaque geometry of the object is done.

use glam::{Mat4, Vec4};
use crate::error::Result;
use crate::pick::PickRecord;
use crate::render::{
    AlphaPass, Decorations, DisplayOptionChange, DisplayOptions, DrawParams, RenderFlags, RenderMode,
};
use crate::renderer::{BufferGeoRender, GeoRender, Renderer};
use super::primitive::{Primitive, PrimitiveCore};
use super::refined_geometry::RefinedGeometry;
use super::update_params::{RenderContext, UpdateContext, UpdateParams};

/// Marker and normal decorations are drawn in these colors
const MARKER_COLOR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);
const NORMAL_COLOR: Vec4 = Vec4::new(0.0, 0.6, 1.0, 1.0);

pub struct MeshPrimitive {
    core: PrimitiveCore,
    geo: BufferGeoRender,
    transform: Mat4,
    options: DisplayOptions,
    /// Mode and flags of the last main draw, replayed by the post pass
    deferred: Option<(RenderMode, RenderFlags, DrawParams)>,
}

impl MeshPrimitive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: PrimitiveCore::new(name),
            geo: BufferGeoRender::new(),
            transform: Mat4::IDENTITY,
            options: DisplayOptions::default(),
            deferred: None,
        }
    }

    pub fn geo_render(&self) -> &BufferGeoRender {
        &self.geo
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Draw with an explicit transform (used by primitives that place this
    /// mesh themselves)
    pub fn draw_with_transform(
        &self,
        renderer: &mut dyn Renderer,
        transform: &Mat4,
        mode: RenderMode,
        flags: RenderFlags,
        params: &DrawParams,
    ) -> Result<()> {
        self.geo.draw(renderer, &(*transform * self.transform), mode, flags, params)
    }

    fn cache_name(&self) -> String {
        format!("{}:mesh", self.core.name())
    }
}

impl Primitive for MeshPrimitive {
    fn core(&self) -> &PrimitiveCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PrimitiveCore {
        &mut self.core
    }

    fn display_option_change(&mut self, options: &DisplayOptions, first_init: bool) -> DisplayOptionChange {
        let change = if first_init {
            DisplayOptionChange::Unchanged
        } else {
            options.compare(&self.options)
        };
        self.options = *options;
        change
    }

    fn update(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        geometry: &RefinedGeometry,
        params: &UpdateParams,
    ) -> Result<()> {
        let cache_name = self.cache_name();
        self.geo.update(ctx.renderer, geometry, params, &cache_name)?;
        self.transform = geometry.transform;
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &mut RenderContext<'_>,
        mode: RenderMode,
        flags: RenderFlags,
        params: &DrawParams,
    ) -> Result<()> {
        if self.geo.has_transparency() && mode != RenderMode::Points {
            let id = ctx.info.request_render_post_pass();
            self.core.reserve_post_pass(id);
            self.deferred = Some((mode, flags, *params));
            return Ok(());
        }
        self.geo.draw(ctx.renderer, &self.transform, mode, flags, params)
    }

    fn render_pick(&mut self, ctx: &mut RenderContext<'_>, base: &PickRecord) -> Result<()> {
        self.geo.draw(
            ctx.renderer,
            &self.transform,
            RenderMode::Shaded,
            RenderFlags::PICK,
            &DrawParams::default(),
        )?;
        ctx.info.add_pick_record(*base);
        Ok(())
    }

    fn render_decoration(&mut self, ctx: &mut RenderContext<'_>, decorations: Decorations) -> Result<()> {
        if decorations.contains(Decorations::POINT_MARKER) {
            let params = DrawParams { color: MARKER_COLOR, point_size: ctx.options.point_size, ..Default::default() };
            self.geo.draw(ctx.renderer, &self.transform, RenderMode::Points, RenderFlags::empty(), &params)?;
        }
        if decorations.contains(Decorations::POINT_NORMAL) && self.core.has_point_normals() {
            let params = DrawParams { color: NORMAL_COLOR, ..Default::default() };
            self.geo.draw(ctx.renderer, &self.transform, RenderMode::Wireframe, RenderFlags::empty(), &params)?;
        }
        Ok(())
    }

    fn render_post_pass(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if let Some((mode, flags, params)) = self.deferred.take() {
            self.geo.draw(ctx.renderer, &self.transform, mode, flags | RenderFlags::TRANSPARENT, &params)?;
        }
        Ok(())
    }

    fn render_in_alpha_pass(&self, pass: AlphaPass) -> bool {
        match pass {
            AlphaPass::Transparent => self.geo.has_transparency(),
            AlphaPass::Opaque => !self.geo.has_transparency(),
            AlphaPass::All => true,
        }
    }

    fn retire(&mut self, renderer: &mut dyn Renderer) {
        self.geo.retire_geometry(renderer);
        self.deferred = None;
    }
}
