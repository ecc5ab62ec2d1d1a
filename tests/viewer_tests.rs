//! Viewer Tests
//!
//! Tests for:
//! - The end-to-end loading → reveal scenario on the CPU backend
//! - Failed assets not blocking the reveal
//! - Queued resizes applied before the next frame
//! - Keyboard debug bindings

use std::time::Duration;

use glam::Vec4;

use lumen::app::{ButtonState, Input, Key, apply_debug_bindings};
use lumen::assets::{LoadTracker, ResourceKind};
use lumen::renderer::backend::{CpuBackend, RenderBackend};
use lumen::renderer::capability::SurfacePlan;
use lumen::renderer::effects::names;
use lumen::renderer::pass::ClearScene;
use lumen::renderer::surface::Viewport;
use lumen::renderer::uniforms::UniformValue;
use lumen::reveal::TransitionState;
use lumen::settings::ViewerSettings;
use lumen::utils::FrameClock;
use lumen::viewer::Viewer;

const SCENE: ClearScene = ClearScene {
    color: Vec4::new(0.5, 0.5, 0.5, 1.0),
};

fn viewer(tracker: &LoadTracker) -> Viewer<CpuBackend> {
    Viewer::new(
        CpuBackend::new(16, 16),
        &ViewerSettings::default(),
        SurfacePlan::default(),
        Viewport::new(16, 16, 1.0),
        tracker.clone(),
    )
    .unwrap()
}

fn overlay_alpha(viewer: &Viewer<CpuBackend>) -> f32 {
    match viewer.chain().uniform(names::SCENE, names::OVERLAY_ALPHA) {
        Some(UniformValue::Float(a)) => *a,
        other => panic!("unexpected overlay uniform {other:?}"),
    }
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn three_resources_reveal_scenario() {
    let settings = ViewerSettings::default();
    let tracker = LoadTracker::from_settings(&settings.loading);
    let mut viewer = viewer(&tracker);
    let input = Input::new();
    let mut clock = FrameClock::new();

    let normal_map = tracker.register(ResourceKind::Texture, "normal map").unwrap();
    let env = tracker.register(ResourceKind::CubeTexture, "environment").unwrap();
    let helmet = tracker.register(ResourceKind::Mesh, "helmet").unwrap();

    normal_map.resolve();
    env.resolve();
    viewer.tick(&clock.step(Duration::from_millis(16)), &input, &SCENE);

    assert!((viewer.progress().ratio() - 2.0 / 3.0).abs() < 1e-3);
    assert!((viewer.indicator().bar_scale - 2.0 / 3.0).abs() < 1e-3);
    assert_eq!(viewer.transition_state(), TransitionState::Loading);
    assert_eq!(viewer.chain().is_enabled(names::DISPLACEMENT), Some(false));
    assert!((overlay_alpha(&viewer) - 1.0).abs() < f32::EPSILON);

    // Fully covered by the overlay while loading.
    let covered = viewer.backend.screen().pixel(8, 8);
    assert!((covered.x - 0.15).abs() < 1e-5);

    helmet.resolve();
    viewer.tick(&clock.step(Duration::from_millis(16)), &input, &SCENE);
    assert_eq!(viewer.transition_state(), TransitionState::Loading);

    viewer.tick(&clock.step(Duration::from_millis(250)), &input, &SCENE);
    assert_eq!(viewer.transition_state(), TransitionState::Loading);

    viewer.tick(&clock.step(Duration::from_millis(250)), &input, &SCENE);
    assert_eq!(viewer.transition_state(), TransitionState::Revealing);
    assert_eq!(viewer.chain().is_enabled(names::DISPLACEMENT), Some(true));
    assert!(viewer.indicator().bar_ended);
    assert!((overlay_alpha(&viewer) - 1.0).abs() < 1e-5);

    viewer.tick(&clock.step(Duration::from_millis(1500)), &input, &SCENE);
    let mid = overlay_alpha(&viewer);
    assert!(mid > 0.0 && mid < 1.0);

    viewer.tick(&clock.step(Duration::from_millis(1500)), &input, &SCENE);
    assert_eq!(viewer.transition_state(), TransitionState::Idle);
    assert!(overlay_alpha(&viewer).abs() < f32::EPSILON);
    assert!(!viewer.indicator().visible);

    // Overlay gone, displacement without a map is a plain copy.
    let revealed = viewer.backend.screen().pixel(8, 8);
    assert!((revealed.x - 0.5).abs() < 1e-4);
}

#[test]
fn failed_asset_still_reveals() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let mut viewer = viewer(&tracker);
    let mut clock = FrameClock::new();

    let ok = tracker.register(ResourceKind::Texture, "ok").unwrap();
    let broken = tracker.register(ResourceKind::Mesh, "broken").unwrap();
    ok.resolve();
    broken.fail("bad header");

    viewer.tick(&clock.step(Duration::from_millis(16)), &Input::new(), &SCENE);
    assert_eq!(viewer.progress().failed, 1);
    assert_eq!(viewer.transition_state(), TransitionState::Revealing);
}

#[test]
fn reveal_now_skips_empty_session() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let mut viewer = viewer(&tracker);
    let mut clock = FrameClock::new();
    viewer.reveal_now(clock.start_time());
    viewer.tick(&clock.step(Duration::from_secs(4)), &Input::new(), &SCENE);
    assert_eq!(viewer.transition_state(), TransitionState::Idle);
}

#[test]
fn every_tick_presents_one_frame() {
    let tracker = LoadTracker::default();
    let mut viewer = viewer(&tracker);
    let mut clock = FrameClock::new();
    for _ in 0..3 {
        viewer.tick(&clock.step(Duration::from_millis(16)), &Input::new(), &SCENE);
    }
    assert_eq!(viewer.backend.frames_presented(), 3);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn queued_resize_applies_before_next_frame() {
    let tracker = LoadTracker::default();
    let mut viewer = viewer(&tracker);
    let mut clock = FrameClock::new();

    viewer.request_resize(40, 10, 3.0);
    viewer.request_resize(30, 10, 3.0);
    assert_eq!(viewer.chain().surface_descriptor().size(), (16, 16));

    viewer.tick(&clock.step(Duration::from_millis(16)), &Input::new(), &SCENE);
    assert_eq!(viewer.chain().surface_descriptor().size(), (60, 20));
    assert_eq!(viewer.backend.output_size(), (60, 20));
    assert!((viewer.camera.aspect - 3.0).abs() < f32::EPSILON);
    assert!((viewer.chain().viewport().pixel_ratio - 2.0).abs() < f32::EPSILON);
}

#[test]
fn zero_sized_viewport_is_clamped() {
    let tracker = LoadTracker::default();
    let mut viewer = viewer(&tracker);
    let mut clock = FrameClock::new();

    viewer.request_resize(0, 0, 1.0);
    viewer.tick(&clock.step(Duration::from_millis(16)), &Input::new(), &SCENE);
    assert_eq!(viewer.chain().surface_descriptor().size(), (1, 1));
    assert_eq!(viewer.backend.output_size(), (1, 1));
    assert!((viewer.camera.aspect - 1.0).abs() < f32::EPSILON);
}

// ============================================================================
// Debug bindings
// ============================================================================

#[test]
fn digit_keys_toggle_passes_after_scene() {
    let tracker = LoadTracker::default();
    let mut viewer = viewer(&tracker);
    let mut input = Input::new();

    input.inject_key(Key::Digit(1), ButtonState::Pressed);
    apply_debug_bindings(viewer.chain_mut(), &input);
    assert_eq!(viewer.chain().is_enabled(names::DOT_SCREEN), Some(true));
    assert_eq!(viewer.chain().is_enabled(names::SCENE), Some(true));

    input.end_frame();
    input.inject_key(Key::Digit(1), ButtonState::Released);
    input.inject_key(Key::Digit(1), ButtonState::Pressed);
    apply_debug_bindings(viewer.chain_mut(), &input);
    assert_eq!(viewer.chain().is_enabled(names::DOT_SCREEN), Some(false));

    input.end_frame();
    input.inject_key(Key::Digit(9), ButtonState::Pressed);
    apply_debug_bindings(viewer.chain_mut(), &input);
}

#[test]
fn g_toggles_go_wild() {
    let tracker = LoadTracker::default();
    let mut viewer = viewer(&tracker);
    let mut input = Input::new();
    input.inject_key(Key::G, ButtonState::Pressed);
    apply_debug_bindings(viewer.chain_mut(), &input);
    assert_eq!(
        viewer.chain().uniform(names::GLITCH, "go_wild"),
        Some(&UniformValue::Bool(true))
    );
}
