//! Per-frame render context and display types.

mod render_types;
mod render_info;
mod display_options;

pub use render_types::{RenderMode, RenderFlags, DrawParams, AlphaPass};
pub use render_info::{RenderInfo, RenderInfoDesc, ObjectSelection};
pub use display_options::{
    DisplayOptions, DisplayOptionChange, ShadingMode, InstanceDisplay, Decorations,
};
