/// GeoRender: GPU buffers of one geometry and the draw calls that use them.
///
/// Primitives own one GeoRender per drawable piece. Non-instanced primitives
/// call `draw` directly; instanced ones forward the decision they read back
/// from the instance manager to `draw_instanced`.

use glam::Mat4;
use crate::error::Result;
use crate::instance::{DrawOutcome, ResolvedDraw};
use crate::primitive::{GeometryHandle, RefinedGeometry, UpdateParams, UpdateReason};
use crate::render::{RenderMode, RenderFlags, DrawParams};
use crate::config::BBOX_GL_PRIMITIVES;
use crate::{render_bail, render_debug};
use super::renderer::{Renderer, BufferHandle, DrawCall};

const SOURCE: &str = "viewport::GeoRender";

pub trait GeoRender: Send {
    /// (Re)build GPU buffers for `geometry` when they are stale
    fn update(
        &mut self,
        renderer: &mut dyn Renderer,
        geometry: &RefinedGeometry,
        params: &UpdateParams,
        cache_name: &str,
    ) -> Result<()>;

    /// Issue one non-instanced draw
    fn draw(
        &self,
        renderer: &mut dyn Renderer,
        transform: &Mat4,
        mode: RenderMode,
        flags: RenderFlags,
        params: &DrawParams,
    ) -> Result<()>;

    /// Issue the draw an instance-manager decision calls for
    fn draw_instanced(&self, renderer: &mut dyn Renderer, resolved: &ResolvedDraw) -> Result<()>;

    fn num_gl_primitives(&self) -> u64;

    fn has_transparency(&self) -> bool;

    /// Release GPU resources; the next `update` uploads again
    fn retire_geometry(&mut self, renderer: &mut dyn Renderer);
}

/// Standard GeoRender: one renderer buffer per geometry snapshot.
#[derive(Debug, Default)]
pub struct BufferGeoRender {
    cache_name: String,
    buffer: Option<BufferHandle>,
    geometry: Option<GeometryHandle>,
    gl_primitives: u64,
    point_count: u32,
    transparent: bool,
}

impl BufferGeoRender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn cached_geometry(&self) -> Option<GeometryHandle> {
        self.geometry
    }

    fn needs_upload(&self, geometry: &RefinedGeometry, params: &UpdateParams, cache_name: &str) -> bool {
        self.buffer.is_none()
            || self.geometry != Some(geometry.handle)
            || self.cache_name != cache_name
            || params.reason.intersects(UpdateReason::REBUILD)
    }

    fn live_buffer(&self) -> Result<BufferHandle> {
        match self.buffer {
            Some(buffer) => Ok(buffer),
            None => render_bail!(SOURCE, "draw of '{}' without uploaded buffers", self.cache_name),
        }
    }

    fn mode_cost(&self, mode: RenderMode) -> u64 {
        match mode {
            RenderMode::Points => self.point_count.max(1) as u64,
            RenderMode::BoundingBox => BBOX_GL_PRIMITIVES,
            RenderMode::Shaded | RenderMode::Wireframe => self.gl_primitives,
        }
    }
}

impl GeoRender for BufferGeoRender {
    fn update(
        &mut self,
        renderer: &mut dyn Renderer,
        geometry: &RefinedGeometry,
        params: &UpdateParams,
        cache_name: &str,
    ) -> Result<()> {
        if !self.needs_upload(geometry, params, cache_name) {
            return Ok(());
        }

        if let Some(old) = self.buffer.take() {
            renderer.release(old);
        }
        let buffer = renderer.upload(cache_name, geometry)?;

        render_debug!(
            SOURCE,
            "uploaded '{}' (geometry {} v{}, {} GL primitives)",
            cache_name, geometry.handle.id, geometry.handle.version, geometry.gl_primitives
        );

        self.cache_name = cache_name.to_string();
        self.buffer = Some(buffer);
        self.geometry = Some(geometry.handle);
        self.gl_primitives = geometry.gl_primitives;
        self.point_count = geometry.point_count;
        self.transparent = geometry.has_transparency;
        Ok(())
    }

    fn draw(
        &self,
        renderer: &mut dyn Renderer,
        transform: &Mat4,
        mode: RenderMode,
        flags: RenderFlags,
        params: &DrawParams,
    ) -> Result<()> {
        let buffer = self.live_buffer()?;
        let call = DrawCall::single(buffer, *transform, mode, flags, *params, self.mode_cost(mode));
        renderer.submit(&call)
    }

    fn draw_instanced(&self, renderer: &mut dyn Renderer, resolved: &ResolvedDraw) -> Result<()> {
        if resolved.outcome == DrawOutcome::NoDraw {
            return Ok(());
        }
        let buffer = self.live_buffer()?;

        let mut call = DrawCall::single(
            buffer,
            resolved.transform,
            resolved.mode,
            resolved.flags,
            resolved.params,
            resolved.gl_primitives,
        );

        if let Some(instances) = &resolved.instances {
            call.instances = &instances.transforms[..];
            if resolved.outcome != DrawOutcome::FullDraw {
                call.instance_indices = Some(&resolved.visible_indices[..]);
            }
            call.colors = instances.colors.as_deref();
            if resolved.flags.contains(RenderFlags::PICK) {
                call.pick_ids = instances.pick_ids.as_deref();
            }
        }

        renderer.submit(&call)
    }

    fn num_gl_primitives(&self) -> u64 {
        self.gl_primitives
    }

    fn has_transparency(&self) -> bool {
        self.transparent
    }

    fn retire_geometry(&mut self, renderer: &mut dyn Renderer) {
        if let Some(buffer) = self.buffer.take() {
            renderer.release(buffer);
        }
        self.geometry = None;
    }
}

#[cfg(test)]
#[path = "geo_render_tests.rs"]
mod tests;
