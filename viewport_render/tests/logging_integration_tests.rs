//! Integration tests for the logging emitted by the draw pipeline
//!
//! These tests install a CaptureLogger and check which events reach it.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use viewport_render::glam::{Mat4, Vec3};
use viewport_render::culling::BoundingBox;
use viewport_render::instance::DrawRequest;
use viewport_render::primitive::{GeometryHandle, MeshPrimitive, Primitive, RefinedGeometry, RenderContext};
use viewport_render::render::{DisplayOptions, DrawParams, RenderFlags, RenderInfo, RenderInfoDesc, RenderMode};
use viewport_render::renderer::MockRenderer;
use viewport_render::viewport::log::{CaptureLogger, LogSeverity};
use viewport_render::viewport::{Engine, InstanceManager, InstancingConfig, SceneObject, SceneWalker};
use serial_test::serial;

// ============================================================================
// HELPERS
// ============================================================================

fn install_capture() -> CaptureLogger {
    let capture = CaptureLogger::new();
    Engine::set_logger(capture.clone());
    capture
}

fn unit_bounds() -> BoundingBox {
    BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_budget_overflow_warns_once_per_pass() {
    let capture = install_capture();
    let mut mgr = InstanceManager::new(InstancingConfig::default().with_budget(10));

    for _ in 0..2 {
        mgr.begin_pass();
        for _ in 0..5 {
            mgr.queue_draw_request(DrawRequest::new(unit_bounds(), Mat4::IDENTITY, 6)).unwrap();
        }
        mgr.process_draw_requests().unwrap();
        mgr.end_pass();
    }

    let warnings: Vec<_> = capture
        .entries_from("viewport::InstanceManager")
        .into_iter()
        .filter(|e| e.severity == LogSeverity::Warn && e.message.contains("budget exceeded"))
        .collect();
    assert_eq!(warnings.len(), 2);
    assert!(capture.contains("viewport::InstanceManager", "pass 1 resolved"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_queue_outside_pass_warns() {
    let capture = install_capture();
    let mut mgr = InstanceManager::new(InstancingConfig::default());

    assert!(mgr.queue_draw_request(DrawRequest::new(unit_bounds(), Mat4::IDENTITY, 1)).is_err());

    let entries = capture.entries_from("viewport::InstanceManager");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Warn);
    assert!(entries[0].message.contains("queue_draw_request rejected"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_draw_before_update_logs_error() {
    let capture = install_capture();
    let mut renderer = MockRenderer::new();
    let manager = InstanceManager::new(InstancingConfig::default());
    let mut info = RenderInfo::new(RenderInfoDesc::default());
    let options = DisplayOptions::default();
    let mut ctx = RenderContext {
        renderer: &mut renderer,
        instances: &manager,
        info: &mut info,
        options: &options,
    };

    let mut prim = MeshPrimitive::new("early");
    assert!(prim.draw(&mut ctx, RenderMode::Shaded, RenderFlags::empty(), &DrawParams::default()).is_err());

    let errors = capture.entries_at_least(LogSeverity::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].source, "viewport::Primitive");
    assert!(errors[0].message.contains("'early'"));
    assert!(errors[0].file.is_some());
    assert!(errors[0].line.is_some());

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_failed_update_reaches_logger() {
    let capture = install_capture();
    let mut renderer = MockRenderer::new();
    renderer.set_fail_uploads(true);
    let mut walker = SceneWalker::with_config(InstancingConfig::default());
    let geometries = [RefinedGeometry::mesh(GeometryHandle::new(4, 1), 12, unit_bounds())];

    walker.render_frame(&mut renderer, &[SceneObject::new(1, &geometries)], &[]).unwrap();

    assert_eq!(walker.errors().len(), 1);
    assert!(capture.contains("viewport::RenderInfo", "update of geometry 4 failed"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_retirement_logged_at_debug() {
    let capture = install_capture();
    let mut renderer = MockRenderer::new();
    let mut walker = SceneWalker::with_config(InstancingConfig::default());
    let geometries = [RefinedGeometry::mesh(GeometryHandle::new(4, 1), 12, unit_bounds())];

    walker.render_frame(&mut renderer, &[SceneObject::new(1, &geometries)], &[]).unwrap();
    walker.render_frame(&mut renderer, &[], &[]).unwrap();

    let retired: Vec<_> = capture
        .entries_from("viewport::Primitive")
        .into_iter()
        .filter(|e| e.message.contains("retired '1/4'"))
        .collect();
    assert_eq!(retired.len(), 1);
    assert_eq!(retired[0].severity, LogSeverity::Debug);

    Engine::reset_logger();
}
