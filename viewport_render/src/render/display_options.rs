/// Viewport display options consumed by primitives.
///
/// Storage and persistence belong to the host; primitives only compare the
/// options they last saw against the current ones.

use bitflags::bitflags;
use super::render_types::{AlphaPass, RenderMode};

/// Surface shading of displayed geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadingMode {
    #[default]
    Shaded,
    Wireframe,
    ShadedWireframe,
    Points,
}

impl ShadingMode {
    /// Render mode the main pass uses for this shading
    pub fn render_mode(self) -> RenderMode {
        match self {
            ShadingMode::Wireframe => RenderMode::Wireframe,
            ShadingMode::Points => RenderMode::Points,
            ShadingMode::Shaded | ShadingMode::ShadedWireframe => RenderMode::Shaded,
        }
    }
}

/// How point-instanced geometry is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstanceDisplay {
    #[default]
    Full,
    Points,
    BoundingBox,
}

bitflags! {
    /// Decorations drawn on top of geometry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Decorations: u32 {
        const POINT_MARKER  = 1 << 0;
        const POINT_NUMBER  = 1 << 1;
        const POINT_NORMAL  = 1 << 2;
        const PRIM_NUMBER   = 1 << 3;
        const PRIM_NORMAL   = 1 << 4;
        const VERTEX_NUMBER = 1 << 5;
        const UV_OVERLAP    = 1 << 6;
        /// Decorations attached by the user to individual details
        const USER          = 1 << 7;
    }
}

/// Result of comparing display options against the last-seen snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayOptionChange {
    Unchanged,
    /// Cached derived values must be refreshed, buffers stay valid
    Changed,
    /// Buffers are stale; the display-option version is bumped and the
    /// primitive is updated again
    VersionChanged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayOptions {
    pub shading: ShadingMode,
    pub decorations: Decorations,
    /// Fraction of point instances drawn (0.0 - 1.0)
    pub instance_fraction: f32,
    pub instance_display: InstanceDisplay,
    pub alpha_pass: AlphaPass,
    pub point_size: f32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            shading: ShadingMode::Shaded,
            decorations: Decorations::empty(),
            instance_fraction: 1.0,
            instance_display: InstanceDisplay::Full,
            alpha_pass: AlphaPass::Opaque,
            point_size: 3.0,
        }
    }
}

impl DisplayOptions {
    pub fn with_shading(mut self, shading: ShadingMode) -> Self {
        self.shading = shading;
        self
    }

    pub fn with_decorations(mut self, decorations: Decorations) -> Self {
        self.decorations = decorations;
        self
    }

    /// Clamped to [0, 1]
    pub fn with_instance_fraction(mut self, fraction: f32) -> Self {
        self.instance_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_instance_display(mut self, display: InstanceDisplay) -> Self {
        self.instance_display = display;
        self
    }

    pub fn with_alpha_pass(mut self, pass: AlphaPass) -> Self {
        self.alpha_pass = pass;
        self
    }

    /// Classify the difference from `previous`.
    ///
    /// Shading, instance display and instance fraction change what is
    /// uploaded; decorations, point size and the alpha pass only change how
    /// cached buffers are drawn.
    pub fn compare(&self, previous: &DisplayOptions) -> DisplayOptionChange {
        if self.shading != previous.shading
            || self.instance_display != previous.instance_display
            || self.instance_fraction != previous.instance_fraction
        {
            DisplayOptionChange::VersionChanged
        } else if self != previous {
            DisplayOptionChange::Changed
        } else {
            DisplayOptionChange::Unchanged
        }
    }

    /// Number of instances drawn out of `total` for the current fraction.
    ///
    /// Never zero when `total` is non-zero and the fraction is positive.
    pub fn instance_count(&self, total: usize) -> usize {
        if total == 0 || self.instance_fraction <= 0.0 {
            return 0;
        }
        let count = (total as f64 * self.instance_fraction as f64).ceil() as usize;
        count.clamp(1, total)
    }
}

#[cfg(test)]
#[path = "display_options_tests.rs"]
mod tests;
