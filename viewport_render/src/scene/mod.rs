//! Frame driver: owns the primitives and walks them through each frame.

mod scene_walker;

pub use scene_walker::{render_mode, PrimitiveId, PrimitiveKey, SceneObject, SceneWalker};
