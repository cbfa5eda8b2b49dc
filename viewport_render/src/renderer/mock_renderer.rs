/// Mock Renderer for tests and headless hosts (no GPU required)
///
/// Records every upload, release and draw call so tests can assert what a
/// frame actually submitted.

use glam::Mat4;
use rustc_hash::FxHashSet;
use crate::error::{Error, Result};
use crate::primitive::{GeometryHandle, RefinedGeometry};
use crate::render::{RenderMode, RenderFlags};
use super::renderer::{Renderer, BufferHandle, DrawCall};

// ============================================================================
// Recorded calls
// ============================================================================

/// One recorded `upload`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub cache_name: String,
    pub geometry: GeometryHandle,
    pub buffer: BufferHandle,
}

/// One recorded `submit`, with the borrowed arrays summarized
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub buffer: BufferHandle,
    pub mode: RenderMode,
    pub flags: RenderFlags,
    pub gl_primitives: u64,
    pub transform: Mat4,
    pub instance_count: usize,
    pub instance_indices: Option<Vec<u32>>,
    pub has_colors: bool,
    pub has_pick_ids: bool,
}

// ============================================================================
// Mock Renderer
// ============================================================================

#[derive(Debug)]
pub struct MockRenderer {
    next_buffer: u64,
    live: FxHashSet<BufferHandle>,
    uploads: Vec<RecordedUpload>,
    releases: Vec<BufferHandle>,
    draws: Vec<RecordedDraw>,
    fail_uploads: bool,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            next_buffer: 1,
            live: FxHashSet::default(),
            uploads: Vec::new(),
            releases: Vec::new(),
            draws: Vec::new(),
            fail_uploads: false,
        }
    }

    /// Make every following `upload` fail with `Error::BackendError`
    pub fn set_fail_uploads(&mut self, fail: bool) {
        self.fail_uploads = fail;
    }

    pub fn uploads(&self) -> &[RecordedUpload] {
        &self.uploads
    }

    pub fn releases(&self) -> &[BufferHandle] {
        &self.releases
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Buffers uploaded and not yet released
    pub fn live_buffer_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, buffer: BufferHandle) -> bool {
        self.live.contains(&buffer)
    }

    /// Total GL primitives submitted since the last `clear_draws`
    pub fn submitted_gl_primitives(&self) -> u64 {
        self.draws.iter().map(|d| d.gl_primitives).sum()
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }
}

impl Renderer for MockRenderer {
    fn upload(&mut self, cache_name: &str, geometry: &RefinedGeometry) -> Result<BufferHandle> {
        if self.fail_uploads {
            return Err(Error::BackendError(format!("upload of '{}' refused", cache_name)));
        }

        let buffer = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.live.insert(buffer);
        self.uploads.push(RecordedUpload {
            cache_name: cache_name.to_string(),
            geometry: geometry.handle,
            buffer,
        });
        Ok(buffer)
    }

    fn release(&mut self, buffer: BufferHandle) {
        if self.live.remove(&buffer) {
            self.releases.push(buffer);
        }
    }

    fn submit(&mut self, call: &DrawCall<'_>) -> Result<()> {
        if call.buffer != BufferHandle::UNIT_CUBE && !self.live.contains(&call.buffer) {
            return Err(Error::InvalidResource(format!(
                "draw of unknown buffer {}", call.buffer.0
            )));
        }

        self.draws.push(RecordedDraw {
            buffer: call.buffer,
            mode: call.mode,
            flags: call.flags,
            gl_primitives: call.gl_primitives,
            transform: call.transform,
            instance_count: call.instance_count(),
            instance_indices: call.instance_indices.map(|i| i.to_vec()),
            has_colors: call.colors.is_some(),
            has_pick_ids: call.pick_ids.is_some(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_renderer_tests.rs"]
mod tests;
