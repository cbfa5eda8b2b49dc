/*!
# Viewport Render

Frame-scoped draw arbitration for a 3D viewport.

Primitives (one per displayed geometry unit) are driven through an
update / render / pick protocol. Instance-like primitives do not draw during
update: they queue draw requests with an `InstanceManager`, which resolves
every request of the frame at once against a global GL-primitive budget and
hands each caller back its decision (full, partial, points only or nothing).

## Architecture

- **PickRecord**: fixed six-int pick buffer record
- **RenderInfo**: per-object, per-frame context (post passes, picks, errors)
- **Primitive**: lifecycle trait with mesh, instanced and packed flavors
- **GeoRender**: GPU buffers of one geometry, on top of the `Renderer` trait
- **InstanceManager**: culling, budget degradation and bbox batching
- **SceneWalker**: reference frame driver owning the primitives

The GPU backend is reached only through the `Renderer` trait;
`MockRenderer` records calls for tests and headless hosts.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod culling;
pub mod pick;
pub mod render;
pub mod renderer;
pub mod instance;
pub mod primitive;
pub mod scene;

// Main viewport namespace module
pub mod viewport {
    // Error types
    pub use crate::error::{Error, Result, DrawRequestError};

    // Engine singleton
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{InstancingConfig, DegradePolicy, DegradeOrder};

    // Frame driver and arbiter
    pub use crate::scene::{SceneWalker, SceneObject};
    pub use crate::instance::{InstanceManager, FrameStats, DrawOutcome};

    // Logging sub-module (types only, the render_* macros stay at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, CaptureLogger};
    }
}

// Re-export math library at crate root
pub use glam;
