/// Packed primitive: places a shared mesh with its own transform.
///
/// Wraps a `MeshPrimitive` for the packed contents and routes the draw
/// through the instance manager as a single request, so large numbers of
/// packed copies share the GL-primitive budget with instanced geometry.
/// Transparent contents are drawn in a reserved post pass.

use glam::Mat4;
use crate::error::Result;
use crate::instance::{DrawOutcome, DrawRequest, DrawRequestId};
use crate::pick::PickRecord;
use crate::render::{
    AlphaPass, Decorations, DisplayOptionChange, DisplayOptions, DrawParams, RenderFlags, RenderMode,
};
use crate::renderer::{GeoRender, Renderer};
use crate::{render_debug, render_err};
use super::mesh_primitive::MeshPrimitive;
use super::primitive::{Primitive, PrimitiveCore};
use super::refined_geometry::RefinedGeometry;
use super::update_params::{RenderContext, UpdateContext, UpdateParams};

const SOURCE: &str = "viewport::PackedPrimitive";

pub struct PackedPrimitive {
    core: PrimitiveCore,
    inner: MeshPrimitive,
    /// Transform of the packed reference, applied on top of the contents
    placement: Mat4,
    request: Option<DrawRequestId>,
    /// Mode, flags and params of a main draw postponed to the post pass
    deferred: Option<(RenderMode, RenderFlags, DrawParams)>,
}

impl PackedPrimitive {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            inner: MeshPrimitive::new(format!("{}/packed", name)),
            core: PrimitiveCore::new(name),
            placement: Mat4::IDENTITY,
            request: None,
            deferred: None,
        }
    }

    pub fn inner(&self) -> &MeshPrimitive {
        &self.inner
    }

    pub fn request(&self) -> Option<DrawRequestId> {
        self.request
    }
}

impl Primitive for PackedPrimitive {
    fn core(&self) -> &PrimitiveCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PrimitiveCore {
        &mut self.core
    }

    fn display_option_change(&mut self, options: &DisplayOptions, _first_init: bool) -> DisplayOptionChange {
        self.inner.check_display_option_change(options)
    }

    fn update(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        geometry: &RefinedGeometry,
        params: &UpdateParams,
    ) -> Result<()> {
        self.request = None;
        self.deferred = None;

        let Some(contents) = geometry.packed.as_deref() else {
            return Err(render_err!(
                SOURCE,
                "'{}': packed geometry {} has no contents",
                self.core.name(), geometry.handle.id
            ));
        };
        self.inner.update_prim(ctx, contents, params)?;
        self.placement = geometry.transform;

        let request = DrawRequest::new(
            contents.bounds,
            geometry.transform * contents.transform,
            contents.gl_primitives,
        )
        .with_mode(params.options.shading.render_mode())
        .with_flags(params.flags)
        .with_params(params.draw_params);
        self.request = Some(ctx.instances.queue_draw_request(request)?);
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &mut RenderContext<'_>,
        mode: RenderMode,
        flags: RenderFlags,
        params: &DrawParams,
    ) -> Result<()> {
        let Some(id) = self.request else {
            return Ok(());
        };
        let manager = ctx.instances;
        let resolved = match manager.draw_request_result(id) {
            Ok(resolved) => resolved,
            Err(code) => {
                render_debug!(SOURCE, "'{}' not drawn: {}", self.core.name(), code);
                return Ok(());
            }
        };

        let mode = match resolved.outcome {
            DrawOutcome::NoDraw => return Ok(()),
            DrawOutcome::PointsOnlyDraw => RenderMode::Points,
            DrawOutcome::FullDraw | DrawOutcome::PartialDraw => mode,
        };
        if self.inner.geo_render().has_transparency() && mode != RenderMode::Points {
            let pass = ctx.info.request_render_post_pass();
            self.core.reserve_post_pass(pass);
            self.deferred = Some((mode, flags, *params));
            return Ok(());
        }
        self.inner.draw_with_transform(ctx.renderer, &self.placement, mode, flags, params)
    }

    fn render_post_pass(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if let Some((mode, flags, params)) = self.deferred.take() {
            self.inner.draw_with_transform(
                ctx.renderer,
                &self.placement,
                mode,
                flags | RenderFlags::TRANSPARENT,
                &params,
            )?;
        }
        Ok(())
    }

    fn render_pick(&mut self, ctx: &mut RenderContext<'_>, base: &PickRecord) -> Result<()> {
        let Some(id) = self.request else {
            return Ok(());
        };
        let manager = ctx.instances;
        match manager.draw_request_result(id) {
            Ok(resolved) if resolved.outcome.draws_anything() => {
                self.inner.draw_with_transform(
                    ctx.renderer,
                    &self.placement,
                    RenderMode::Shaded,
                    RenderFlags::PICK,
                    &DrawParams::default(),
                )?;
                ctx.info.add_pick_record(*base);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn render_decoration(&mut self, ctx: &mut RenderContext<'_>, decorations: Decorations) -> Result<()> {
        self.inner.draw_decoration(ctx, decorations)
    }

    fn render_in_alpha_pass(&self, pass: AlphaPass) -> bool {
        self.inner.draw_in_alpha_pass(pass)
    }

    fn retire(&mut self, renderer: &mut dyn Renderer) {
        self.inner.retire_prim(renderer);
        self.request = None;
        self.deferred = None;
    }
}
