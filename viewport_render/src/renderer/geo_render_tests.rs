/// Unit tests for BufferGeoRender.

use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use crate::culling::BoundingBox;
use crate::error::Error;
use crate::instance::{DrawOutcome, ResolvedDraw};
use crate::primitive::{GeometryHandle, InstanceAttributes, RefinedGeometry, UpdateParams, UpdateReason};
use crate::render::{DisplayOptions, DrawParams, RenderFlags, RenderMode};
use crate::renderer::MockRenderer;
use super::*;

fn cube(version: u64) -> RefinedGeometry {
    RefinedGeometry::mesh(
        GeometryHandle::new(3, version),
        12,
        BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
    )
    .with_counts(8, 6)
}

fn steady() -> UpdateParams {
    UpdateParams::default()
}

fn uploaded(renderer: &mut MockRenderer) -> BufferGeoRender {
    let mut geo = BufferGeoRender::new();
    geo.update(renderer, &cube(1), &steady(), "cube").unwrap();
    geo
}

fn resolved(outcome: DrawOutcome, count: usize, visible: Vec<u32>) -> ResolvedDraw {
    let colors: Arc<[Vec4]> = vec![Vec4::ONE; count].into();
    let pick_ids: Arc<[u32]> = (0..count as u32).collect();
    ResolvedDraw {
        outcome,
        mode: if outcome == DrawOutcome::PointsOnlyDraw { RenderMode::Points } else { RenderMode::Shaded },
        flags: RenderFlags::empty(),
        params: DrawParams::default(),
        transform: Mat4::IDENTITY,
        instances: Some(
            InstanceAttributes::new(vec![Mat4::IDENTITY; count].into())
                .with_colors(colors)
                .with_pick_ids(pick_ids),
        ),
        gl_primitives: visible.len() as u64 * 12,
        visible_indices: visible.into(),
    }
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_first_update_uploads() {
    let mut renderer = MockRenderer::new();
    let geo = uploaded(&mut renderer);

    assert_eq!(renderer.uploads().len(), 1);
    assert_eq!(renderer.uploads()[0].cache_name, "cube");
    assert_eq!(geo.buffer(), Some(renderer.uploads()[0].buffer));
    assert_eq!(geo.cached_geometry(), Some(GeometryHandle::new(3, 1)));
    assert_eq!(geo.num_gl_primitives(), 12);
    assert!(!geo.has_transparency());
}

#[test]
fn test_same_geometry_skips_upload() {
    let mut renderer = MockRenderer::new();
    let mut geo = uploaded(&mut renderer);

    geo.update(&mut renderer, &cube(1), &steady(), "cube").unwrap();
    geo.update(&mut renderer, &cube(1), &UpdateParams::new(UpdateReason::SELECTION, DisplayOptions::default()), "cube").unwrap();

    assert_eq!(renderer.uploads().len(), 1);
    assert!(renderer.releases().is_empty());
}

#[test]
fn test_new_version_replaces_buffer() {
    let mut renderer = MockRenderer::new();
    let mut geo = uploaded(&mut renderer);
    let old = geo.buffer().unwrap();

    geo.update(&mut renderer, &cube(2), &steady(), "cube").unwrap();

    assert_eq!(renderer.uploads().len(), 2);
    assert_eq!(renderer.releases(), &[old]);
    assert_ne!(geo.buffer(), Some(old));
    assert_eq!(renderer.live_buffer_count(), 1);
}

#[test]
fn test_rebuild_reason_forces_upload() {
    let mut renderer = MockRenderer::new();
    let mut geo = uploaded(&mut renderer);

    let params = UpdateParams::new(UpdateReason::DISPLAY_OPTIONS, DisplayOptions::default());
    geo.update(&mut renderer, &cube(1), &params, "cube").unwrap();
    assert_eq!(renderer.uploads().len(), 2);

    geo.update(&mut renderer, &cube(1), &steady(), "cube:other").unwrap();
    assert_eq!(renderer.uploads().len(), 3);
    assert_eq!(renderer.live_buffer_count(), 1);
}

#[test]
fn test_failed_upload_leaves_no_buffer() {
    let mut renderer = MockRenderer::new();
    renderer.set_fail_uploads(true);
    let mut geo = BufferGeoRender::new();

    let result = geo.update(&mut renderer, &cube(1), &steady(), "cube");
    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(geo.buffer().is_none());
}

// ============================================================================
// Direct draws
// ============================================================================

#[test]
fn test_draw_without_upload_fails() {
    let mut renderer = MockRenderer::new();
    let geo = BufferGeoRender::new();

    let result = geo.draw(&mut renderer, &Mat4::IDENTITY, RenderMode::Shaded, RenderFlags::empty(), &DrawParams::default());
    assert!(matches!(result, Err(Error::InvalidState(_))));
    assert!(renderer.draws().is_empty());
}

#[test]
fn test_draw_cost_follows_mode() {
    let mut renderer = MockRenderer::new();
    let geo = uploaded(&mut renderer);
    let params = DrawParams::default();

    for mode in [RenderMode::Shaded, RenderMode::Wireframe, RenderMode::Points, RenderMode::BoundingBox] {
        geo.draw(&mut renderer, &Mat4::IDENTITY, mode, RenderFlags::empty(), &params).unwrap();
    }

    let costs: Vec<u64> = renderer.draws().iter().map(|d| d.gl_primitives).collect();
    assert_eq!(costs, vec![12, 12, 8, 12]);
    assert!(renderer.draws().iter().all(|d| d.instance_count == 1));
}

// ============================================================================
// Instanced draws
// ============================================================================

#[test]
fn test_full_draw_has_no_index_list() {
    let mut renderer = MockRenderer::new();
    let geo = uploaded(&mut renderer);

    geo.draw_instanced(&mut renderer, &resolved(DrawOutcome::FullDraw, 4, vec![0, 1, 2, 3])).unwrap();

    let draw = &renderer.draws()[0];
    assert_eq!(draw.instance_count, 4);
    assert!(draw.instance_indices.is_none());
    assert!(draw.has_colors);
    assert!(!draw.has_pick_ids);
    assert_eq!(draw.gl_primitives, 48);
}

#[test]
fn test_partial_draw_passes_visible_indices() {
    let mut renderer = MockRenderer::new();
    let geo = uploaded(&mut renderer);

    geo.draw_instanced(&mut renderer, &resolved(DrawOutcome::PartialDraw, 4, vec![1, 3])).unwrap();

    let draw = &renderer.draws()[0];
    assert_eq!(draw.instance_indices, Some(vec![1, 3]));
    assert_eq!(draw.mode, RenderMode::Shaded);
}

#[test]
fn test_points_only_draw() {
    let mut renderer = MockRenderer::new();
    let geo = uploaded(&mut renderer);

    geo.draw_instanced(&mut renderer, &resolved(DrawOutcome::PointsOnlyDraw, 4, vec![0, 2])).unwrap();

    let draw = &renderer.draws()[0];
    assert_eq!(draw.mode, RenderMode::Points);
    assert_eq!(draw.instance_indices, Some(vec![0, 2]));
}

#[test]
fn test_no_draw_submits_nothing() {
    let mut renderer = MockRenderer::new();
    let geo = BufferGeoRender::new();

    // no buffer either: NoDraw must not even look for one
    geo.draw_instanced(&mut renderer, &resolved(DrawOutcome::NoDraw, 4, vec![])).unwrap();
    assert!(renderer.draws().is_empty());
}

#[test]
fn test_pick_flag_forwards_pick_ids() {
    let mut renderer = MockRenderer::new();
    let geo = uploaded(&mut renderer);
    let mut draw = resolved(DrawOutcome::FullDraw, 2, vec![0, 1]);
    draw.flags |= RenderFlags::PICK;

    geo.draw_instanced(&mut renderer, &draw).unwrap();
    assert!(renderer.draws()[0].has_pick_ids);
}

// ============================================================================
// Retire
// ============================================================================

#[test]
fn test_retire_releases_buffer() {
    let mut renderer = MockRenderer::new();
    let mut geo = uploaded(&mut renderer);
    let buffer = geo.buffer().unwrap();

    geo.retire_geometry(&mut renderer);

    assert!(!renderer.is_live(buffer));
    assert!(geo.buffer().is_none());
    assert!(geo.cached_geometry().is_none());

    // next update uploads again
    geo.update(&mut renderer, &cube(1), &steady(), "cube").unwrap();
    assert_eq!(renderer.uploads().len(), 2);
}
