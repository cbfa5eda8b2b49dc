//! Renderer backend seam.
//!
//! `Renderer` is the trait a GPU backend implements; `GeoRender` is the
//! per-geometry buffer owner primitives draw through. `MockRenderer`
//! records everything and backs the tests and headless hosts.

mod renderer;
mod mock_renderer;
mod geo_render;

pub use renderer::{Renderer, BufferHandle, DrawCall};
pub use mock_renderer::{MockRenderer, RecordedDraw, RecordedUpload};
pub use geo_render::{GeoRender, BufferGeoRender};
