/// Bounding-box batches: every queued box lands in one of eight categories
/// and each non-empty category becomes a single instanced draw of the unit
/// cube.

use glam::{Mat4, Vec4};
use crate::culling::BoundingBox;
use super::draw_request::BboxStyle;

pub const BBOX_CATEGORY_COUNT: usize = 8;

/// Wireframe/shaded x selected/unselected x colored/uncolored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BboxCategory(u8);

impl BboxCategory {
    const WIREFRAME: u8 = 1 << 0;
    const SELECTED: u8 = 1 << 1;
    const COLORED: u8 = 1 << 2;

    pub fn from_style(style: &BboxStyle) -> Self {
        let mut bits = 0;
        if style.wireframe {
            bits |= Self::WIREFRAME;
        }
        if style.selected {
            bits |= Self::SELECTED;
        }
        if style.color.is_some() {
            bits |= Self::COLORED;
        }
        Self(bits)
    }

    pub fn from_index(index: usize) -> Self {
        debug_assert!(index < BBOX_CATEGORY_COUNT);
        Self(index as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_wireframe(self) -> bool {
        self.0 & Self::WIREFRAME != 0
    }

    pub fn is_selected(self) -> bool {
        self.0 & Self::SELECTED != 0
    }

    pub fn is_colored(self) -> bool {
        self.0 & Self::COLORED != 0
    }
}

/// One box as queued, already in world space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueuedBbox {
    pub world: BoundingBox,
    pub style: BboxStyle,
}

/// Boxes of one category, ready to draw.
#[derive(Debug, Clone)]
pub struct BboxBatch {
    category: BboxCategory,
    /// Unit cube to world box, one per box
    matrices: Vec<Mat4>,
    /// Filled only for colored categories
    colors: Vec<Vec4>,
}

impl BboxBatch {
    pub fn new(category: BboxCategory) -> Self {
        Self { category, matrices: Vec::new(), colors: Vec::new() }
    }

    pub(crate) fn push(&mut self, bbox: &QueuedBbox) {
        self.matrices.push(bbox.world.unit_cube_matrix());
        if let Some(color) = bbox.style.color {
            self.colors.push(color);
        }
    }

    pub fn category(&self) -> BboxCategory {
        self.category
    }

    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    pub fn colors(&self) -> Option<&[Vec4]> {
        if self.category.is_colored() { Some(&self.colors) } else { None }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.matrices.clear();
        self.colors.clear();
    }
}
