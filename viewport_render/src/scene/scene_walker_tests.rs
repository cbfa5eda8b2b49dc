use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::config::InstancingConfig;
use crate::culling::{BoundingBox, Frustum};
use crate::pick::{PickRecord, PickType};
use crate::primitive::{GeometryHandle, GeometryKind, InstanceAttributes, PrimitiveState, RefinedGeometry};
use crate::render::{
    AlphaPass, Decorations, DisplayOptions, InstanceDisplay, ObjectSelection, RenderFlags, RenderMode,
    ShadingMode,
};
use crate::renderer::{BufferHandle, MockRenderer};
use super::*;

fn walker(budget: u64) -> SceneWalker {
    SceneWalker::with_config(InstancingConfig::default().with_budget(budget))
}

fn unit_bounds() -> BoundingBox {
    BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
}

fn mesh(id: u64, version: u64) -> RefinedGeometry {
    RefinedGeometry::mesh(GeometryHandle::new(id, version), 12, unit_bounds()).with_counts(8, 6)
}

fn instanced(id: u64, transforms: Vec<Mat4>, gl_primitives: u64) -> RefinedGeometry {
    RefinedGeometry::point_instanced(
        GeometryHandle::new(id, 1),
        gl_primitives,
        unit_bounds(),
        InstanceAttributes::new(transforms.into()),
    )
}

fn camera_at_z5() -> Frustum {
    let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    Frustum::from_view_projection(&(projection * view))
}

// ============================================================================
// Primitive lifetime
// ============================================================================

#[test]
fn test_first_frame_creates_and_uploads() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1), mesh(2, 1)];
    let objects = [SceneObject::new(7, &geometries)];

    walker.render_frame(&mut renderer, &objects, &[]).unwrap();

    assert_eq!(walker.primitive_count(), 2);
    assert_eq!(renderer.uploads().len(), 2);
    assert_eq!(renderer.draws().len(), 2);
    assert_eq!(walker.frame(), 1);
    let primitive = walker.primitive(7, 2).unwrap();
    assert_eq!(primitive.core().state(), PrimitiveState::Updated);
    assert!(walker.primitive(8, 2).is_none());
}

#[test]
fn test_unchanged_geometry_is_not_reuploaded() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1)];
    let objects = [SceneObject::new(7, &geometries)];

    walker.render_frame(&mut renderer, &objects, &[]).unwrap();
    walker.render_frame(&mut renderer, &objects, &[]).unwrap();

    assert_eq!(renderer.uploads().len(), 1);
    assert_eq!(renderer.draws().len(), 2);
}

#[test]
fn test_new_version_is_reuploaded() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);

    let first = [mesh(1, 1)];
    walker.render_frame(&mut renderer, &[SceneObject::new(7, &first)], &[]).unwrap();
    let second = [mesh(1, 2)];
    walker.render_frame(&mut renderer, &[SceneObject::new(7, &second)], &[]).unwrap();

    assert_eq!(renderer.uploads().len(), 2);
    assert_eq!(renderer.live_buffer_count(), 1);
    assert_eq!(
        walker.primitive(7, 1).unwrap().core().cached_geometry(),
        Some(GeometryHandle::new(1, 2))
    );
}

#[test]
fn test_missing_geometry_is_retired() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let both = [mesh(1, 1), mesh(2, 1)];
    walker.render_frame(&mut renderer, &[SceneObject::new(7, &both)], &[]).unwrap();

    let one = [mesh(1, 1)];
    walker.render_frame(&mut renderer, &[SceneObject::new(7, &one)], &[]).unwrap();

    assert_eq!(walker.primitive_count(), 1);
    assert!(walker.primitive(7, 2).is_none());
    assert_eq!(renderer.releases().len(), 1);
    assert_eq!(renderer.live_buffer_count(), 1);
}

#[test]
fn test_kind_change_replaces_primitive() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let as_mesh = [mesh(1, 1)];
    walker.render_frame(&mut renderer, &[SceneObject::new(7, &as_mesh)], &[]).unwrap();

    let as_instanced = [instanced(1, vec![Mat4::IDENTITY; 2], 12)];
    walker.render_frame(&mut renderer, &[SceneObject::new(7, &as_instanced)], &[]).unwrap();

    assert_eq!(walker.primitive_count(), 1);
    assert_eq!(renderer.live_buffer_count(), 1);
    assert_eq!(renderer.draws().last().unwrap().instance_count, 2);
}

#[test]
fn test_clear_retires_everything() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1), mesh(2, 1)];
    walker.render_frame(&mut renderer, &[SceneObject::new(7, &geometries)], &[]).unwrap();

    walker.clear(&mut renderer);

    assert_eq!(walker.primitive_count(), 0);
    assert_eq!(renderer.live_buffer_count(), 0);
}

// ============================================================================
// Update reasons
// ============================================================================

#[test]
fn test_version_change_of_options_rebuilds() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1)];

    walker.render_frame(&mut renderer, &[SceneObject::new(7, &geometries)], &[]).unwrap();

    // decorations only: Changed, buffers kept
    let decorated = DisplayOptions::default().with_decorations(Decorations::PRIM_NUMBER);
    walker
        .render_frame(&mut renderer, &[SceneObject::new(7, &geometries).with_options(decorated)], &[])
        .unwrap();
    assert_eq!(renderer.uploads().len(), 1);

    let wire = decorated.with_shading(ShadingMode::Wireframe);
    walker
        .render_frame(&mut renderer, &[SceneObject::new(7, &geometries).with_options(wire)], &[])
        .unwrap();
    assert_eq!(renderer.uploads().len(), 2);
    assert_eq!(walker.primitive(7, 1).unwrap().core().display_option_version(), 1);
    assert_eq!(renderer.draws().last().unwrap().mode, RenderMode::Wireframe);
}

#[test]
fn test_non_cached_draw_is_consumed() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1)];
    let objects = [SceneObject::new(7, &geometries)];
    walker.render_frame(&mut renderer, &objects, &[]).unwrap();

    assert!(walker.request_non_cached_draw(7, 1));
    assert!(!walker.request_non_cached_draw(7, 99));

    walker.render_frame(&mut renderer, &objects, &[]).unwrap();
    assert_eq!(renderer.uploads().len(), 2);
    assert!(!walker.primitive(7, 1).unwrap().core().needs_non_cached_draw());

    walker.render_frame(&mut renderer, &objects, &[]).unwrap();
    assert_eq!(renderer.uploads().len(), 2);
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_selection_flag_follows_settings() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1)];
    let objects = [SceneObject::new(7, &geometries).with_selection(ObjectSelection::Current)];

    walker.render_frame(&mut renderer, &objects, &[]).unwrap();
    assert!(renderer.draws()[0].flags.contains(RenderFlags::SELECTED));

    walker.set_show_selections(false);
    walker.render_frame(&mut renderer, &objects, &[]).unwrap();
    assert!(!renderer.draws()[1].flags.contains(RenderFlags::SELECTED));
}

#[test]
fn test_render_mode_mapping() {
    assert_eq!(render_mode(ShadingMode::Shaded), RenderMode::Shaded);
    assert_eq!(render_mode(ShadingMode::ShadedWireframe), RenderMode::Shaded);
    assert_eq!(render_mode(ShadingMode::Wireframe), RenderMode::Wireframe);
    assert_eq!(render_mode(ShadingMode::Points), RenderMode::Points);
}

#[test]
fn test_instanced_geometry_follows_object_shading() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1), instanced(2, vec![Mat4::IDENTITY; 3], 4)];
    let wireframe = DisplayOptions::default().with_shading(ShadingMode::Wireframe);
    let objects = [SceneObject::new(7, &geometries).with_options(wireframe)];

    walker.render_frame(&mut renderer, &objects, &[]).unwrap();

    assert_eq!(renderer.draws().len(), 2);
    assert!(renderer.draws().iter().all(|d| d.mode == RenderMode::Wireframe));
    assert_eq!(renderer.draws()[1].instance_count, 3);

    renderer.clear_draws();
    let points = DisplayOptions::default().with_shading(ShadingMode::Points);
    let objects = [SceneObject::new(7, &geometries).with_options(points)];
    walker.render_frame(&mut renderer, &objects, &[]).unwrap();

    assert!(renderer.draws().iter().all(|d| d.mode == RenderMode::Points));
}

#[test]
fn test_transparent_meshes_draw_in_post_passes() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let glass = [mesh(1, 1).with_transparency(true)];
    let more_glass = [mesh(2, 1).with_transparency(true), mesh(3, 1)];
    let options = DisplayOptions::default().with_alpha_pass(AlphaPass::All);
    let objects = [
        SceneObject::new(1, &glass).with_options(options),
        SceneObject::new(2, &more_glass).with_options(options),
    ];

    walker.render_frame(&mut renderer, &objects, &[]).unwrap();

    let transparent = renderer.draws().iter()
        .filter(|d| d.flags.contains(RenderFlags::TRANSPARENT))
        .count();
    assert_eq!(transparent, 2);
    assert_eq!(renderer.draws().len(), 3);
    // opaque draw of object 2 comes before its post pass
    assert!(!renderer.draws()[1].flags.contains(RenderFlags::TRANSPARENT));
    assert!(walker.errors().is_empty());
}

#[test]
fn test_alpha_pass_filters_primitives() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1).with_transparency(true), mesh(2, 1)];
    let options = DisplayOptions::default().with_alpha_pass(AlphaPass::Opaque);

    walker
        .render_frame(&mut renderer, &[SceneObject::new(1, &geometries).with_options(options)], &[])
        .unwrap();

    assert_eq!(renderer.draws().len(), 1);
    assert_eq!(walker.primitive_count(), 2);
}

#[test]
fn test_decorations_are_drawn() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1)];
    let options = DisplayOptions::default().with_decorations(Decorations::POINT_MARKER);

    walker
        .render_frame(&mut renderer, &[SceneObject::new(1, &geometries).with_options(options)], &[])
        .unwrap();

    let modes: Vec<RenderMode> = renderer.draws().iter().map(|d| d.mode).collect();
    assert_eq!(modes, vec![RenderMode::Shaded, RenderMode::Points]);
}

#[test]
fn test_failed_update_is_reported_not_fatal() {
    let mut renderer = MockRenderer::new();
    renderer.set_fail_uploads(true);
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1)];

    let stats = walker.render_frame(&mut renderer, &[SceneObject::new(1, &geometries)], &[]).unwrap();

    assert_eq!(stats.requests, 0);
    assert!(renderer.draws().is_empty());
    assert_eq!(walker.errors().len(), 1);
    assert!(walker.errors()[0].contains("geometry 1"));
    assert_eq!(walker.primitive_count(), 0);

    renderer.set_fail_uploads(false);
    walker.render_frame(&mut renderer, &[SceneObject::new(1, &geometries)], &[]).unwrap();
    assert!(walker.errors().is_empty());
    assert_eq!(renderer.draws().len(), 1);
}

// ============================================================================
// Instancing through the walker
// ============================================================================

#[test]
fn test_budget_degrades_later_objects() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries: Vec<[RefinedGeometry; 1]> = (0..20)
        .map(|i| [instanced(i, vec![Mat4::IDENTITY; 1000], 1)])
        .collect();
    let objects: Vec<SceneObject<'_>> = geometries.iter()
        .enumerate()
        .map(|(i, g)| SceneObject::new(i as i32, g))
        .collect();

    let stats = walker.render_frame(&mut renderer, &objects, &[]).unwrap();

    assert_eq!(stats.requests, 20);
    assert!(stats.full_draws <= 10);
    assert_eq!(stats.full_draws + stats.points_only_draws, 20);
    assert!(stats.over_budget);
    let points = renderer.draws().iter().filter(|d| d.mode == RenderMode::Points).count();
    assert_eq!(points as u64, stats.points_only_draws as u64);
}

#[test]
fn test_frustum_culls_instances() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let transforms = vec![
        Mat4::IDENTITY,
        Mat4::from_translation(Vec3::new(0.0, 0.0, 20.0)),
        Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
    ];
    let geometries = [instanced(1, transforms, 4)];

    let stats = walker
        .render_frame(&mut renderer, &[SceneObject::new(1, &geometries)], &[camera_at_z5()])
        .unwrap();

    assert_eq!(stats.partial_draws, 1);
    assert_eq!(stats.culled_instances, 1);
    assert_eq!(renderer.draws()[0].instance_indices, Some(vec![0, 2]));
}

#[test]
fn test_bbox_display_draws_batches() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [instanced(1, vec![Mat4::IDENTITY; 5], 12)];
    let options = DisplayOptions::default().with_instance_display(InstanceDisplay::BoundingBox);

    let stats = walker
        .render_frame(&mut renderer, &[SceneObject::new(1, &geometries).with_options(options)], &[])
        .unwrap();

    assert_eq!(stats.bbox_count, 5);
    let boxes: Vec<_> = renderer.draws().iter().filter(|d| d.buffer == BufferHandle::UNIT_CUBE).collect();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].instance_count, 5);
}

#[test]
fn test_manager_is_idle_between_frames() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [instanced(1, vec![Mat4::IDENTITY; 3], 1)];

    walker.render_frame(&mut renderer, &[SceneObject::new(1, &geometries)], &[]).unwrap();
    walker.render_frame(&mut renderer, &[SceneObject::new(1, &geometries)], &[]).unwrap();

    assert_eq!(walker.instances().pass_serial(), 2);
    assert_eq!(walker.instances().queued_count(), 0);
    assert_eq!(renderer.draws().len(), 2);
}

// ============================================================================
// Pick
// ============================================================================

#[test]
fn test_pick_collects_sorted_records() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let pick_ids: Arc<[u32]> = vec![100, 101, 102].into();
    let trees = RefinedGeometry::point_instanced(
        GeometryHandle::new(2, 1),
        4,
        unit_bounds(),
        InstanceAttributes::new(vec![Mat4::IDENTITY; 3].into()).with_pick_ids(pick_ids),
    );
    let boxes = [mesh(1, 1)];
    let forest = [trees];
    let objects = [SceneObject::new(1, &boxes), SceneObject::new(2, &forest)];

    let records = walker.pick(&mut renderer, &objects, &[]).unwrap();

    assert_eq!(records.len(), 4);
    assert!(records.contains(&PickRecord::object(1, 0)));
    let points: Vec<&PickRecord> = records.iter().filter(|r| r.pick_type() == PickType::POINT).collect();
    assert_eq!(points.len(), 3);
    assert!(points.iter().all(|r| r.look_id() == 2));
    let mut components: Vec<i32> = points.iter().map(|r| r.component_id1()).collect();
    components.sort_unstable();
    assert_eq!(components, vec![100, 101, 102]);

    let mut sorted = records.clone();
    PickRecord::sort_and_dedup(&mut sorted);
    assert_eq!(sorted, records);
    assert!(renderer.draws().iter().all(|d| d.flags.contains(RenderFlags::PICK)));
}

#[test]
fn test_pick_dedups_identical_records() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let geometries = [mesh(1, 1)];
    // same look shown twice
    let objects = [SceneObject::new(1, &geometries), SceneObject::new(1, &geometries)];

    let records = walker.pick(&mut renderer, &objects, &[]).unwrap();
    assert_eq!(records, vec![PickRecord::object(1, 0)]);
}

#[test]
fn test_packed_geometry_through_walker() {
    let mut renderer = MockRenderer::new();
    let mut walker = walker(10_000);
    let placement = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let geometries = [RefinedGeometry::packed(GeometryHandle::new(9, 1), Arc::new(mesh(4, 1)), placement)];

    let stats = walker.render_frame(&mut renderer, &[SceneObject::new(3, &geometries)], &[]).unwrap();

    assert_eq!(stats.requests, 1);
    assert_eq!(stats.full_draws, 1);
    assert_eq!(renderer.draws()[0].transform, placement);
    assert!(matches!(geometries[0].kind, GeometryKind::Packed));
}
