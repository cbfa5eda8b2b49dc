/// Point-instanced primitive: one mesh copied onto many transforms.
///
/// Draws go through the instance manager. Update queues a request (or a
/// set of bounding boxes in bbox display mode); render reads the decision
/// back and hands it to the GeoRender. Transparent instances wait for a
/// post pass, like transparent meshes.

use std::sync::Arc;
use crate::culling::BoundingBox;
use crate::error::Result;
use crate::instance::{BboxStyle, DrawRequest, DrawRequestId};
use crate::pick::{PickRecord, PickType, UNSET_COMPONENT};
use crate::render::{
    AlphaPass, DisplayOptionChange, DisplayOptions, DrawParams, InstanceDisplay, RenderFlags, RenderMode,
};
use crate::renderer::{BufferGeoRender, GeoRender, Renderer};
use crate::render_debug;
use super::primitive::{Primitive, PrimitiveCore};
use super::refined_geometry::{InstanceAttributes, RefinedGeometry};
use super::update_params::{RenderContext, UpdateContext, UpdateParams};

const SOURCE: &str = "viewport::InstancedPrimitive";

pub struct InstancedPrimitive {
    core: PrimitiveCore,
    geo: BufferGeoRender,
    options: DisplayOptions,
    request: Option<DrawRequestId>,
    /// Main draw postponed to the reserved post pass
    deferred: bool,
}

/// Evenly spread `count` indices over `0..total`
fn strided_indices(total: usize, count: usize) -> Arc<[u32]> {
    (0..count).map(|i| (i * total / count) as u32).collect()
}

impl InstancedPrimitive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: PrimitiveCore::new(name),
            geo: BufferGeoRender::new(),
            options: DisplayOptions::default(),
            request: None,
            deferred: false,
        }
    }

    pub fn geo_render(&self) -> &BufferGeoRender {
        &self.geo
    }

    /// Request queued by the last update, if any
    pub fn request(&self) -> Option<DrawRequestId> {
        self.request
    }

    fn cache_name(&self) -> String {
        format!("{}:instance", self.core.name())
    }

    fn queue(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        geometry: &RefinedGeometry,
        instances: &InstanceAttributes,
        params: &UpdateParams,
    ) -> Result<()> {
        let bounds: BoundingBox = geometry.bounds;

        if params.options.instance_display == InstanceDisplay::BoundingBox {
            let style = BboxStyle {
                wireframe: true,
                selected: params.flags.contains(RenderFlags::SELECTED),
                color: None,
            };
            ctx.instances.queue_bbox_instance_draw(&bounds, &geometry.transform, &instances.transforms, style)?;
            return Ok(());
        }

        let (mode, gl_primitives) = match params.options.instance_display {
            InstanceDisplay::Points => (RenderMode::Points, 1),
            _ => (params.options.shading.render_mode(), geometry.gl_primitives),
        };
        let request = DrawRequest::new(bounds, geometry.transform, gl_primitives)
            .with_mode(mode)
            .with_flags(params.flags)
            .with_params(params.draw_params);

        let total = instances.len();
        let count = params.options.instance_count(total);
        let id = if count == total {
            ctx.instances.queue_instance_draw_request(request, instances.clone())?
        } else {
            ctx.instances.queue_partial_instance_draw_request(
                request,
                instances.clone(),
                strided_indices(total, count),
            )?
        };
        self.request = Some(id);
        Ok(())
    }
}

impl Primitive for InstancedPrimitive {
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
        self.request = None;
        self.deferred = false;

        let cache_name = self.cache_name();
        self.geo.update(ctx.renderer, geometry, params, &cache_name)?;

        match &geometry.instances {
            Some(instances) if !instances.is_empty() => self.queue(ctx, geometry, instances, params),
            _ => {
                render_debug!(SOURCE, "'{}' has no instances", self.core.name());
                Ok(())
            }
        }
    }

    fn render(
        &mut self,
        ctx: &mut RenderContext<'_>,
        _mode: RenderMode,
        _flags: RenderFlags,
        _params: &DrawParams,
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

        let transparent = self.geo.has_transparency() && resolved.mode != RenderMode::Points;
        if transparent && resolved.outcome.draws_anything() {
            let pass = ctx.info.request_render_post_pass();
            self.core.reserve_post_pass(pass);
            self.deferred = true;
            return Ok(());
        }
        self.geo.draw_instanced(ctx.renderer, resolved)
    }

    fn render_post_pass(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if !std::mem::take(&mut self.deferred) {
            return Ok(());
        }
        let Some(id) = self.request else {
            return Ok(());
        };
        let manager = ctx.instances;
        if let Ok(resolved) = manager.draw_request_result(id) {
            let mut transparent = resolved.clone();
            transparent.flags |= RenderFlags::TRANSPARENT;
            self.geo.draw_instanced(ctx.renderer, &transparent)?;
        }
        Ok(())
    }

    fn render_pick(&mut self, ctx: &mut RenderContext<'_>, base: &PickRecord) -> Result<()> {
        let Some(id) = self.request else {
            return Ok(());
        };
        let manager = ctx.instances;
        let Ok(resolved) = manager.draw_request_result(id) else {
            return Ok(());
        };

        let mut pick = resolved.clone();
        pick.flags |= RenderFlags::PICK;
        self.geo.draw_instanced(ctx.renderer, &pick)?;

        let pick_ids = resolved.instances.as_ref().and_then(|i| i.pick_ids.clone());
        for &index in resolved.visible_indices.iter() {
            let component = pick_ids
                .as_ref()
                .and_then(|ids| ids.get(index as usize))
                .map_or(index as i32, |&id| id as i32);
            ctx.info.add_pick_record(PickRecord::extended(
                base,
                PickType::POINT,
                component,
                UNSET_COMPONENT,
                UNSET_COMPONENT,
            ));
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
        self.request = None;
        self.deferred = false;
    }
}
