/// Per-object, per-frame render context built by the walker.
///
/// Primitives borrow a `RenderInfo` for the duration of one call and never
/// keep it. Everything is read-only except the pick array, the post-pass
/// counter and the error sink.

use crate::pick::PickRecord;
use crate::render_warn;

/// Selection state of the object being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectSelection {
    #[default]
    Unselected,
    Selected,
    /// Selected and the current (most recent) selection
    Current,
}

impl ObjectSelection {
    pub fn is_selected(self) -> bool {
        !matches!(self, ObjectSelection::Unselected)
    }
}

/// Construction parameters for `RenderInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderInfoDesc {
    pub api_version: u32,
    pub show_selections: bool,
    pub can_do_instancing: bool,
    pub object_selection: ObjectSelection,
    pub ghosted: bool,
    pub viewport_id: u32,
    /// Last post-pass id issued earlier in the frame (0 = none yet)
    pub post_pass_base: u32,
}

impl Default for RenderInfoDesc {
    fn default() -> Self {
        Self {
            api_version: 1,
            show_selections: true,
            can_do_instancing: true,
            object_selection: ObjectSelection::Unselected,
            ghosted: false,
            viewport_id: 0,
            post_pass_base: 0,
        }
    }
}

pub struct RenderInfo {
    api_version: u32,
    show_selections: bool,
    can_do_instancing: bool,
    object_selection: ObjectSelection,
    ghosted: bool,
    viewport_id: u32,
    pick_records: Vec<PickRecord>,
    post_pass_base: u32,
    post_pass_id: u32,
    active_post_pass: Option<u32>,
    errors: Vec<String>,
}

impl RenderInfo {
    pub fn new(desc: RenderInfoDesc) -> Self {
        Self {
            api_version: desc.api_version,
            show_selections: desc.show_selections,
            can_do_instancing: desc.can_do_instancing,
            object_selection: desc.object_selection,
            ghosted: desc.ghosted,
            viewport_id: desc.viewport_id,
            pick_records: Vec::new(),
            post_pass_base: desc.post_pass_base,
            post_pass_id: desc.post_pass_base,
            active_post_pass: None,
            errors: Vec::new(),
        }
    }

    // ===== READ-ONLY ACCESSORS =====

    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    pub fn show_selections(&self) -> bool {
        self.show_selections
    }

    pub fn can_do_instancing(&self) -> bool {
        self.can_do_instancing
    }

    pub fn object_selection(&self) -> ObjectSelection {
        self.object_selection
    }

    pub fn is_ghosted(&self) -> bool {
        self.ghosted
    }

    pub fn viewport_id(&self) -> u32 {
        self.viewport_id
    }

    // ===== POST PASSES =====

    /// Reserve an extra render pass after the main one.
    ///
    /// Returns a new id on every call, strictly greater than any id issued
    /// before in the frame.
    pub fn request_render_post_pass(&mut self) -> u32 {
        self.post_pass_id += 1;
        self.post_pass_id
    }

    /// Continue numbering after `base` (ids issued by earlier objects of the
    /// frame). Drops any reservation made through this info.
    pub fn set_post_pass_base(&mut self, base: u32) {
        self.post_pass_base = base;
        self.post_pass_id = base;
        self.active_post_pass = None;
    }

    /// Last issued post-pass id (the frame base when none was requested)
    pub fn post_pass_id(&self) -> u32 {
        self.post_pass_id
    }

    /// Ids reserved through this info, in issue order
    pub fn requested_post_passes(&self) -> std::ops::RangeInclusive<u32> {
        (self.post_pass_base + 1)..=self.post_pass_id
    }

    /// Mark `id` as the post pass currently executing
    pub fn begin_post_pass(&mut self, id: u32) {
        self.active_post_pass = Some(id);
    }

    pub fn end_post_pass(&mut self) {
        self.active_post_pass = None;
    }

    pub fn active_post_pass(&self) -> Option<u32> {
        self.active_post_pass
    }

    // ===== PICK RECORDS =====

    pub fn add_pick_record(&mut self, record: PickRecord) {
        self.pick_records.push(record);
    }

    pub fn pick_records(&self) -> &[PickRecord] {
        &self.pick_records
    }

    pub fn clear_pick_records(&mut self) {
        self.pick_records.clear();
    }

    pub fn take_pick_records(&mut self) -> Vec<PickRecord> {
        std::mem::take(&mut self.pick_records)
    }

    // ===== ERROR SINK =====

    /// Record a user-visible error for this object and log it
    pub fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        render_warn!("viewport::RenderInfo", "viewport {}: {}", self.viewport_id, message);
        self.errors.push(message);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

#[cfg(test)]
#[path = "render_info_tests.rs"]
mod tests;
