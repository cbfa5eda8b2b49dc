/// Refined geometry snapshots handed to primitives by the walker.
///
/// Primitives keep only the `GeometryHandle` (id + version) between frames,
/// never the snapshot itself.

use std::sync::Arc;
use glam::{Mat4, Vec4};
use crate::culling::BoundingBox;

/// Identity of one refined geometry snapshot.
///
/// The id is stable for a displayed geometry; the version changes whenever
/// its content does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle {
    pub id: u64,
    pub version: u64,
}

impl GeometryHandle {
    pub fn new(id: u64, version: u64) -> Self {
        Self { id, version }
    }
}

/// Which primitive type displays a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Plain polygon/curve mesh, drawn directly
    Mesh,
    /// One mesh copied onto many points
    PointInstanced,
    /// A single packed reference to another geometry
    Packed,
}

/// Per-instance data for point-instanced geometry.
#[derive(Debug, Clone)]
pub struct InstanceAttributes {
    pub transforms: Arc<[Mat4]>,
    pub selection: Option<Arc<[bool]>>,
    pub colors: Option<Arc<[Vec4]>>,
    pub pick_ids: Option<Arc<[u32]>>,
}

impl InstanceAttributes {
    pub fn new(transforms: Arc<[Mat4]>) -> Self {
        Self { transforms, selection: None, colors: None, pick_ids: None }
    }

    pub fn with_selection(mut self, selection: Arc<[bool]>) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_colors(mut self, colors: Arc<[Vec4]>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_pick_ids(mut self, pick_ids: Arc<[u32]>) -> Self {
        self.pick_ids = Some(pick_ids);
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// True when every optional array matches the transform count
    pub fn is_consistent(&self) -> bool {
        let n = self.transforms.len();
        self.selection.as_ref().map_or(true, |s| s.len() == n)
            && self.colors.as_ref().map_or(true, |c| c.len() == n)
            && self.pick_ids.as_ref().map_or(true, |p| p.len() == n)
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection
            .as_ref()
            .and_then(|s| s.get(index).copied())
            .unwrap_or(false)
    }
}

/// One refined geometry snapshot for the current frame.
#[derive(Debug, Clone)]
pub struct RefinedGeometry {
    pub handle: GeometryHandle,
    pub kind: GeometryKind,
    pub point_count: u32,
    pub primitive_count: u32,
    /// Triangles, lines or points after tessellation
    pub gl_primitives: u64,
    pub has_point_normals: bool,
    pub has_transparency: bool,
    /// Object-space bounds of one copy of the geometry
    pub bounds: BoundingBox,
    pub transform: Mat4,
    pub instances: Option<InstanceAttributes>,
    /// Geometry referenced by a packed primitive
    pub packed: Option<Arc<RefinedGeometry>>,
}

impl RefinedGeometry {
    /// Plain mesh snapshot
    pub fn mesh(handle: GeometryHandle, gl_primitives: u64, bounds: BoundingBox) -> Self {
        Self {
            handle,
            kind: GeometryKind::Mesh,
            point_count: 0,
            primitive_count: 0,
            gl_primitives,
            has_point_normals: false,
            has_transparency: false,
            bounds,
            transform: Mat4::IDENTITY,
            instances: None,
            packed: None,
        }
    }

    /// Mesh copied onto every transform of `instances`
    pub fn point_instanced(
        handle: GeometryHandle,
        gl_primitives: u64,
        bounds: BoundingBox,
        instances: InstanceAttributes,
    ) -> Self {
        Self {
            kind: GeometryKind::PointInstanced,
            instances: Some(instances),
            ..Self::mesh(handle, gl_primitives, bounds)
        }
    }

    /// Packed reference to `inner`, placed by `transform`
    pub fn packed(handle: GeometryHandle, inner: Arc<RefinedGeometry>, transform: Mat4) -> Self {
        Self {
            kind: GeometryKind::Packed,
            transform,
            has_transparency: inner.has_transparency,
            ..Self::mesh(handle, inner.gl_primitives, inner.bounds)
        }
        .with_packed(inner)
    }

    fn with_packed(mut self, inner: Arc<RefinedGeometry>) -> Self {
        self.packed = Some(inner);
        self
    }

    pub fn with_counts(mut self, point_count: u32, primitive_count: u32) -> Self {
        self.point_count = point_count;
        self.primitive_count = primitive_count;
        self
    }

    pub fn with_point_normals(mut self, has_point_normals: bool) -> Self {
        self.has_point_normals = has_point_normals;
        self
    }

    pub fn with_transparency(mut self, has_transparency: bool) -> Self {
        self.has_transparency = has_transparency;
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn instance_count(&self) -> usize {
        self.instances.as_ref().map_or(0, |i| i.len())
    }
}
