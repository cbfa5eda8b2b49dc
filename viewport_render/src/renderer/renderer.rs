/// Renderer backend trait and draw call description.
///
/// The backend owns GPU buffers and executes draw calls. Everything above it
/// (GeoRender, primitives, the instance manager) only deals in opaque
/// `BufferHandle`s and `DrawCall`s.

use glam::{Mat4, Vec4};
use crate::error::Result;
use crate::primitive::RefinedGeometry;
use crate::render::{RenderMode, RenderFlags, DrawParams};

/// Opaque handle to a GPU buffer set owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

impl BufferHandle {
    /// Built-in unit cube (-1..1) used for bounding-box draws.
    /// Every renderer accepts it without an upload.
    pub const UNIT_CUBE: BufferHandle = BufferHandle(0);
}

/// One draw submitted to the renderer.
///
/// `instances` is empty for a non-instanced draw. When non-empty,
/// `instance_indices` selects the instances to draw (`None` = all) and the
/// optional per-instance arrays are indexed like `instances`.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub buffer: BufferHandle,
    pub mode: RenderMode,
    pub flags: RenderFlags,
    pub params: DrawParams,
    /// GL primitives this call rasterizes
    pub gl_primitives: u64,
    pub transform: Mat4,
    pub instances: &'a [Mat4],
    pub instance_indices: Option<&'a [u32]>,
    pub colors: Option<&'a [Vec4]>,
    pub pick_ids: Option<&'a [u32]>,
}

impl<'a> DrawCall<'a> {
    /// Non-instanced draw of `buffer` placed by `transform`
    pub fn single(
        buffer: BufferHandle,
        transform: Mat4,
        mode: RenderMode,
        flags: RenderFlags,
        params: DrawParams,
        gl_primitives: u64,
    ) -> Self {
        Self {
            buffer,
            mode,
            flags,
            params,
            gl_primitives,
            transform,
            instances: &[],
            instance_indices: None,
            colors: None,
            pick_ids: None,
        }
    }

    /// Number of copies drawn
    pub fn instance_count(&self) -> usize {
        if self.instances.is_empty() {
            1
        } else {
            self.instance_indices.map_or(self.instances.len(), |i| i.len())
        }
    }
}

/// Renderer backend.
///
/// Implemented by the host on top of its graphics API; `MockRenderer`
/// records calls for tests.
pub trait Renderer: Send {
    /// Build GPU buffers for a geometry snapshot under `cache_name`
    fn upload(&mut self, cache_name: &str, geometry: &RefinedGeometry) -> Result<BufferHandle>;

    /// Release buffers created by `upload`. Unknown handles are ignored.
    fn release(&mut self, buffer: BufferHandle);

    /// Execute one draw call
    fn submit(&mut self, call: &DrawCall<'_>) -> Result<()>;
}
