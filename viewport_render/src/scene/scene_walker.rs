/// SceneWalker: drives primitives and the instance manager through a frame.
///
/// Primitives are created on first sight of a geometry (through the
/// `GeometryKind` factory), stored in a SlotMap and looked up by
/// (look id, geometry id). A frame runs:
///
/// ```text
/// begin_pass -> frustums -> per object: options check + update_prim
///            -> retire unused -> process_draw_requests
///            -> per object: draw, post passes, decorations
///            -> bbox batches -> end_pass
/// ```
///
/// A failing primitive does not abort the frame: the error goes to the
/// object's RenderInfo error sink and the primitive is skipped.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::config::InstancingConfig;
use crate::culling::Frustum;
use crate::engine::Engine;
use crate::error::Result;
use crate::instance::{FrameStats, InstanceManager};
use crate::pick::PickRecord;
use crate::primitive::{
    create_primitive, GeometryKind, Primitive, RefinedGeometry, RenderContext, UpdateContext,
    UpdateParams, UpdateReason,
};
use crate::render::{
    DisplayOptionChange, DisplayOptions, DrawParams, ObjectSelection, RenderFlags, RenderInfo,
    RenderInfoDesc, RenderMode, ShadingMode,
};
use crate::renderer::Renderer;
use crate::{render_debug, render_err, render_trace};

const SOURCE: &str = "viewport::SceneWalker";

new_key_type! {
    /// Stable key of a primitive owned by a `SceneWalker`
    pub struct PrimitiveKey;
}

/// Identity of a primitive: the object showing it and its geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveId {
    pub look_id: i32,
    pub geometry_id: u64,
}

/// One displayed object for one frame.
///
/// The position of a geometry in `geometries` is its detail index in pick
/// records.
#[derive(Debug, Clone, Copy)]
pub struct SceneObject<'a> {
    pub look_id: i32,
    pub selection: ObjectSelection,
    pub ghosted: bool,
    pub options: DisplayOptions,
    pub geometries: &'a [RefinedGeometry],
}

impl<'a> SceneObject<'a> {
    pub fn new(look_id: i32, geometries: &'a [RefinedGeometry]) -> Self {
        Self {
            look_id,
            selection: ObjectSelection::Unselected,
            ghosted: false,
            options: DisplayOptions::default(),
            geometries,
        }
    }

    pub fn with_selection(mut self, selection: ObjectSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_ghosted(mut self, ghosted: bool) -> Self {
        self.ghosted = ghosted;
        self
    }

    pub fn with_options(mut self, options: DisplayOptions) -> Self {
        self.options = options;
        self
    }
}

struct PrimitiveSlot {
    id: PrimitiveId,
    kind: GeometryKind,
    primitive: Box<dyn Primitive>,
}

/// Per-object state of the frame being walked
struct Walk {
    infos: Vec<RenderInfo>,
    /// (detail index, key) of every primitive updated without error
    drawable: Vec<Vec<(usize, PrimitiveKey)>>,
}

pub struct SceneWalker {
    primitives: SlotMap<PrimitiveKey, PrimitiveSlot>,
    index: FxHashMap<PrimitiveId, PrimitiveKey>,
    instances: InstanceManager,
    viewport_id: u32,
    show_selections: bool,
    frame: u64,
    errors: Vec<String>,
}

impl Default for SceneWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Render mode the main pass uses for `shading`
pub fn render_mode(shading: ShadingMode) -> RenderMode {
    shading.render_mode()
}

impl SceneWalker {
    /// Walker using the process-wide instancing config
    pub fn new() -> Self {
        Self::with_config(Engine::instancing_config())
    }

    pub fn with_config(config: InstancingConfig) -> Self {
        Self {
            primitives: SlotMap::with_key(),
            index: FxHashMap::default(),
            instances: InstanceManager::new(config),
            viewport_id: 0,
            show_selections: true,
            frame: 0,
            errors: Vec::new(),
        }
    }

    // ===== SETTINGS =====

    pub fn config(&self) -> &InstancingConfig {
        self.instances.config()
    }

    pub fn set_config(&mut self, config: InstancingConfig) {
        self.instances.set_config(config);
    }

    pub fn viewport_id(&self) -> u32 {
        self.viewport_id
    }

    pub fn set_viewport_id(&mut self, viewport_id: u32) {
        self.viewport_id = viewport_id;
    }

    pub fn set_show_selections(&mut self, show: bool) {
        self.show_selections = show;
    }

    // ===== ACCESSORS =====

    pub fn instances(&self) -> &InstanceManager {
        &self.instances
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn primitive(&self, look_id: i32, geometry_id: u64) -> Option<&dyn Primitive> {
        let id = PrimitiveId { look_id, geometry_id };
        let key = *self.index.get(&id)?;
        self.primitives.get(key).map(|slot| slot.primitive.as_ref())
    }

    /// Frames walked so far (render and pick)
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Errors reported by primitives during the last frame
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Ask for a non-cached update of one primitive on the next frame.
    /// Returns false when no such primitive exists.
    pub fn request_non_cached_draw(&mut self, look_id: i32, geometry_id: u64) -> bool {
        let id = PrimitiveId { look_id, geometry_id };
        let Some(&key) = self.index.get(&id) else {
            return false;
        };
        match self.primitives.get_mut(key) {
            Some(slot) => {
                slot.primitive.core_mut().request_non_cached_draw();
                true
            }
            None => false,
        }
    }

    /// Retire every primitive and release its buffers
    pub fn clear(&mut self, renderer: &mut dyn Renderer) {
        for (_, mut slot) in self.primitives.drain() {
            slot.primitive.retire_prim(renderer);
        }
        self.index.clear();
    }

    // ===== FRAMES =====

    /// Walk one frame and draw it.
    ///
    /// `frustums` are the visible viewports; an empty slice disables culling.
    pub fn render_frame(
        &mut self,
        renderer: &mut dyn Renderer,
        objects: &[SceneObject<'_>],
        frustums: &[Frustum],
    ) -> Result<FrameStats> {
        let mut walk = self.update_objects(renderer, objects, frustums)?;
        let stats = match self.instances.process_draw_requests() {
            Ok(stats) => stats,
            Err(code) => {
                self.instances.end_pass();
                return Err(code.into());
            }
        };

        let mut post_pass_base = 0;
        for (index, object) in objects.iter().enumerate() {
            let info = &mut walk.infos[index];
            info.set_post_pass_base(post_pass_base);
            self.render_object(renderer, object, info, &walk.drawable[index]);
            post_pass_base = info.post_pass_id();
        }

        let batches = self.instances.draw_bbox_batches(renderer);
        self.finish(walk);
        batches?;
        Ok(stats)
    }

    /// Walk one frame in pick mode and return the sorted, deduplicated pick
    /// records of every object.
    pub fn pick(
        &mut self,
        renderer: &mut dyn Renderer,
        objects: &[SceneObject<'_>],
        frustums: &[Frustum],
    ) -> Result<Vec<PickRecord>> {
        let mut walk = self.update_objects(renderer, objects, frustums)?;
        if let Err(code) = self.instances.process_draw_requests() {
            self.instances.end_pass();
            return Err(code.into());
        }

        let mut records = Vec::new();
        for (index, object) in objects.iter().enumerate() {
            let info = &mut walk.infos[index];
            info.clear_pick_records();
            let mut ctx = RenderContext {
                renderer: &mut *renderer,
                instances: &self.instances,
                info,
                options: &object.options,
            };
            for &(detail, key) in &walk.drawable[index] {
                let Some(slot) = self.primitives.get_mut(key) else {
                    continue;
                };
                let base = PickRecord::object(object.look_id, detail as i32);
                if let Err(err) = slot.primitive.draw_pick(&mut ctx, &base) {
                    ctx.info.report_error(format!("pick of '{}' failed: {}", slot.primitive.core().name(), err));
                }
            }
            records.append(&mut ctx.info.take_pick_records());
        }

        PickRecord::sort_and_dedup(&mut records);
        render_debug!(SOURCE, "pick frame {}: {} records", self.frame, records.len());
        self.finish(walk);
        Ok(records)
    }

    // ===== INTERNALS =====

    fn object_flags(&self, object: &SceneObject<'_>) -> RenderFlags {
        let mut flags = RenderFlags::empty();
        if self.show_selections && object.selection.is_selected() {
            flags |= RenderFlags::SELECTED;
        }
        if object.ghosted {
            flags |= RenderFlags::GHOSTED;
        }
        flags
    }

    fn update_objects(
        &mut self,
        renderer: &mut dyn Renderer,
        objects: &[SceneObject<'_>],
        frustums: &[Frustum],
    ) -> Result<Walk> {
        self.frame += 1;
        self.errors.clear();
        render_trace!(SOURCE, "frame {}: {} objects, {} frustums", self.frame, objects.len(), frustums.len());

        self.instances.begin_pass();
        for frustum in frustums {
            self.instances.add_view_frustum(*frustum)?;
        }
        for slot in self.primitives.values_mut() {
            slot.primitive.core_mut().clear_used();
        }

        let mut walk = Walk {
            infos: Vec::with_capacity(objects.len()),
            drawable: Vec::with_capacity(objects.len()),
        };
        for object in objects {
            let mut info = RenderInfo::new(RenderInfoDesc {
                show_selections: self.show_selections,
                object_selection: object.selection,
                ghosted: object.ghosted,
                viewport_id: self.viewport_id,
                ..Default::default()
            });
            let mut drawable = Vec::with_capacity(object.geometries.len());
            for (detail, geometry) in object.geometries.iter().enumerate() {
                match self.update_geometry(renderer, &mut info, object, geometry) {
                    Ok(key) => drawable.push((detail, key)),
                    Err(err) => info.report_error(format!(
                        "update of geometry {} failed: {}", geometry.handle.id, err
                    )),
                }
            }
            walk.infos.push(info);
            walk.drawable.push(drawable);
        }

        self.retire_unused(renderer);
        Ok(walk)
    }

    /// Key of the primitive showing `id`, created when missing or when the
    /// geometry changed kind
    fn primitive_key(&mut self, renderer: &mut dyn Renderer, id: PrimitiveId, kind: GeometryKind) -> PrimitiveKey {
        if let Some(&key) = self.index.get(&id) {
            match self.primitives.get(key) {
                Some(slot) if slot.kind == kind => return key,
                Some(_) => {
                    if let Some(mut slot) = self.primitives.remove(key) {
                        slot.primitive.retire_prim(renderer);
                    }
                }
                None => {}
            }
        }

        let name = format!("{}/{}", id.look_id, id.geometry_id);
        render_debug!(SOURCE, "new {:?} primitive '{}'", kind, name);
        let key = self.primitives.insert(PrimitiveSlot {
            id,
            kind,
            primitive: create_primitive(kind, name),
        });
        self.index.insert(id, key);
        key
    }

    fn update_geometry(
        &mut self,
        renderer: &mut dyn Renderer,
        info: &mut RenderInfo,
        object: &SceneObject<'_>,
        geometry: &RefinedGeometry,
    ) -> Result<PrimitiveKey> {
        let id = PrimitiveId { look_id: object.look_id, geometry_id: geometry.handle.id };
        let key = self.primitive_key(renderer, id, geometry.kind);
        let flags = self.object_flags(object);
        let Some(slot) = self.primitives.get_mut(key) else {
            return Err(render_err!(SOURCE, "primitive for geometry {} vanished", id.geometry_id));
        };
        let primitive = &mut slot.primitive;

        let mut reason = match primitive.core().cached_geometry() {
            None => UpdateReason::FIRST_UPDATE,
            Some(cached) if cached != geometry.handle => UpdateReason::GEOMETRY_CHANGED,
            Some(_) => UpdateReason::empty(),
        };
        if primitive.core().display_options_initialized()
            && primitive.check_display_option_change(&object.options) == DisplayOptionChange::VersionChanged
        {
            reason |= UpdateReason::DISPLAY_OPTIONS;
        }
        let non_cached = primitive.core().needs_non_cached_draw();
        if non_cached {
            reason |= UpdateReason::NON_CACHED;
        }

        let params = UpdateParams::new(reason, object.options)
            .with_flags(flags)
            .with_draw_params(DrawParams { point_size: object.options.point_size, ..Default::default() });
        let mut ctx = UpdateContext {
            renderer,
            instances: &mut self.instances,
            info,
        };
        primitive.update_prim(&mut ctx, geometry, &params)?;

        if non_cached {
            primitive.core_mut().mark_non_cached_draw_consumed();
        }
        Ok(key)
    }

    fn retire_unused(&mut self, renderer: &mut dyn Renderer) {
        let unused: Vec<PrimitiveKey> = self.primitives
            .iter()
            .filter(|(_, slot)| !slot.primitive.core().used_this_frame())
            .map(|(key, _)| key)
            .collect();

        for key in unused {
            if let Some(mut slot) = self.primitives.remove(key) {
                slot.primitive.retire_prim(renderer);
                self.index.remove(&slot.id);
            }
        }
    }

    fn render_object(
        &mut self,
        renderer: &mut dyn Renderer,
        object: &SceneObject<'_>,
        info: &mut RenderInfo,
        drawable: &[(usize, PrimitiveKey)],
    ) {
        let mode = render_mode(object.options.shading);
        let flags = self.object_flags(object);
        let params = DrawParams { point_size: object.options.point_size, ..Default::default() };
        let mut ctx = RenderContext {
            renderer,
            instances: &self.instances,
            info,
            options: &object.options,
        };

        for &(_, key) in drawable {
            let Some(slot) = self.primitives.get_mut(key) else {
                continue;
            };
            if !slot.primitive.draw_in_alpha_pass(object.options.alpha_pass) {
                continue;
            }
            if let Err(err) = slot.primitive.draw(&mut ctx, mode, flags, &params) {
                ctx.info.report_error(format!("draw of '{}' failed: {}", slot.primitive.core().name(), err));
            }
        }

        for id in ctx.info.requested_post_passes() {
            ctx.info.begin_post_pass(id);
            for &(_, key) in drawable {
                let Some(slot) = self.primitives.get_mut(key) else {
                    continue;
                };
                if let Err(err) = slot.primitive.draw_post_pass(&mut ctx) {
                    ctx.info.report_error(format!("post pass of '{}' failed: {}", slot.primitive.core().name(), err));
                }
            }
            ctx.info.end_post_pass();
        }

        if object.options.decorations.is_empty() {
            return;
        }
        for &(_, key) in drawable {
            let Some(slot) = self.primitives.get_mut(key) else {
                continue;
            };
            if let Err(err) = slot.primitive.draw_decoration(&mut ctx, object.options.decorations) {
                ctx.info.report_error(format!("decoration of '{}' failed: {}", slot.primitive.core().name(), err));
            }
        }
    }

    fn finish(&mut self, walk: Walk) {
        for info in &walk.infos {
            self.errors.extend(info.errors().iter().cloned());
        }
        self.instances.end_pass();
    }
}

#[cfg(test)]
#[path = "scene_walker_tests.rs"]
mod tests;
