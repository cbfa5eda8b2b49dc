//! Primitives: per-geometry display objects driven by the scene walker.

mod refined_geometry;
mod update_params;
mod primitive;
mod mesh_primitive;
mod instanced_primitive;
mod packed_primitive;

pub use refined_geometry::{GeometryHandle, GeometryKind, InstanceAttributes, RefinedGeometry};
pub use update_params::{UpdateReason, UpdateParams, UpdateContext, RenderContext};
pub use primitive::{Primitive, PrimitiveCore, PrimitiveState};
pub use mesh_primitive::MeshPrimitive;
pub use instanced_primitive::InstancedPrimitive;
pub use packed_primitive::PackedPrimitive;

/// Create the primitive type that displays `kind`
pub fn create_primitive(kind: GeometryKind, name: impl Into<String>) -> Box<dyn Primitive> {
    match kind {
        GeometryKind::Mesh => Box::new(MeshPrimitive::new(name)),
        GeometryKind::PointInstanced => Box::new(InstancedPrimitive::new(name)),
        GeometryKind::Packed => Box::new(PackedPrimitive::new(name)),
    }
}
