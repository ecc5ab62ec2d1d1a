//! Pass Chain Tests
//!
//! Tests for:
//! - Execution order, disabled passes and terminal selection
//! - Construction validation (scene pass, names, terminal)
//! - add_pass positions
//! - Setters: toggle, set_enabled, set_uniform type checks
//! - The scene pass staying enabled
//! - Resize recreating surfaces and clamping
//! - Readiness-gated passes

use std::sync::Arc;

use glam::{Vec3, Vec4};
use parking_lot::Mutex;

use lumen::errors::ChainError;
use lumen::renderer::backend::{CpuBackend, PassTarget, RenderBackend};
use lumen::renderer::capability::{SurfaceKind, SurfacePlan};
use lumen::renderer::effects::{EffectKind, EffectParams, EffectPass, ScenePass, names, standard_passes};
use lumen::renderer::pass::{Activation, ClearScene, PassContext, PassSlot, PostPass, SceneFrame};
use lumen::renderer::surface::Viewport;
use lumen::renderer::uniforms::{UniformValue, Uniforms};
use lumen::renderer::{ChainConfig, PassChain};
use lumen::reveal::ReadinessObserver;
use lumen::scene::PerspectiveCamera;

type Log = Arc<Mutex<Vec<String>>>;

/// Copies its input and records that it ran.
struct Spy {
    name: String,
    log: Log,
}

impl PostPass<CpuBackend> for Spy {
    fn render(
        &mut self,
        ctx: &mut PassContext<'_, CpuBackend>,
        _uniforms: &Uniforms,
        input: &<CpuBackend as RenderBackend>::Surface,
        target: PassTarget<'_, <CpuBackend as RenderBackend>::Surface>,
    ) {
        self.log.lock().push(self.name.clone());
        ctx.backend.apply_effect(&EffectParams::Copy, input, target);
    }
}

fn spy(name: &str, log: &Log) -> PassSlot<CpuBackend> {
    PassSlot::new(
        name,
        Spy {
            name: name.to_string(),
            log: log.clone(),
        },
    )
}

fn scene() -> PassSlot<CpuBackend> {
    PassSlot::new(names::SCENE, ScenePass)
}

fn tint(name: &str, amount: f32) -> PassSlot<CpuBackend> {
    PassSlot::new(name, EffectPass::new(EffectKind::Tint))
        .uniforms(Uniforms::new().with("tint", Vec3::splat(amount)))
}

fn viewport() -> Viewport {
    Viewport::new(8, 6, 1.0)
}

fn build(backend: &mut CpuBackend, passes: Vec<PassSlot<CpuBackend>>) -> PassChain<CpuBackend> {
    PassChain::new(backend, ChainConfig::default(), viewport(), passes).unwrap()
}

fn run(chain: &mut PassChain<CpuBackend>, backend: &mut CpuBackend) {
    let source = ClearScene {
        color: Vec4::new(0.2, 0.3, 0.4, 1.0),
    };
    let camera = PerspectiveCamera::default();
    let frame = SceneFrame {
        source: &source,
        camera: &camera,
        time: 0.0,
    };
    assert!(backend.begin_frame());
    chain.execute(backend, &frame);
    backend.end_frame();
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn enabled_passes_run_in_list_order() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(
        &mut backend,
        vec![scene(), spy("a", &log), spy("b", &log), spy("c", &log)],
    );
    run(&mut chain, &mut backend);
    assert_eq!(*log.lock(), ["a", "b", "c"]);
    assert_eq!(chain.terminal_pass(), Some("c"));
}

#[test]
fn disabled_spy_is_never_invoked_and_output_matches() {
    let log = Log::default();

    let mut with_spy = CpuBackend::new(8, 6);
    let mut chain_a = build(
        &mut with_spy,
        vec![scene(), tint("t1", 0.1), spy("spy", &log).enabled(false), tint("t2", 0.2)],
    );
    run(&mut chain_a, &mut with_spy);

    let mut without_spy = CpuBackend::new(8, 6);
    let mut chain_b = build(&mut without_spy, vec![scene(), tint("t1", 0.1), tint("t2", 0.2)]);
    run(&mut chain_b, &mut without_spy);

    assert!(log.lock().is_empty());
    assert_eq!(with_spy.screen().pixels(), without_spy.screen().pixels());
    let p = with_spy.screen().pixel(3, 3);
    assert!((p.x - 0.5).abs() < 1e-5 && (p.z - 0.7).abs() < 1e-5);
}

#[test]
fn toggle_takes_effect_on_next_execute() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene(), spy("a", &log).enabled(false)]);

    run(&mut chain, &mut backend);
    assert!(log.lock().is_empty());
    assert_eq!(chain.terminal_pass(), Some(names::SCENE));

    assert_eq!(chain.toggle("a"), Ok(true));
    run(&mut chain, &mut backend);
    assert_eq!(*log.lock(), ["a"]);
}

#[test]
fn explicit_terminal_stops_the_chain() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(
        &mut backend,
        vec![scene(), spy("a", &log), spy("end", &log).terminal(), spy("after", &log)],
    );
    run(&mut chain, &mut backend);
    assert_eq!(*log.lock(), ["a", "end"]);
    assert_eq!(chain.terminal_pass(), Some("end"));

    chain.set_enabled("end", false).unwrap();
    assert_eq!(chain.terminal_pass(), Some("after"));
}

#[test]
fn all_disabled_leaves_screen_untouched() {
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene().enabled(false), tint("t", 1.0).enabled(false)]);
    run(&mut chain, &mut backend);
    assert_eq!(chain.terminal_pass(), None);
    assert!(backend.screen().pixels().iter().all(|p| *p == Vec4::ZERO));
}

#[test]
fn scene_pass_cannot_be_switched_off() {
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene(), tint("t", 0.0)]);
    run(&mut chain, &mut backend);
    assert!(backend.screen().pixel(1, 1).abs_diff_eq(Vec4::new(0.2, 0.3, 0.4, 1.0), 1e-5));

    let rejected = ChainError::SceneAlwaysEnabled(names::SCENE.into());
    assert_eq!(chain.set_enabled(names::SCENE, false), Err(rejected.clone()));
    assert_eq!(chain.toggle(names::SCENE), Err(rejected));
    assert_eq!(chain.is_enabled(names::SCENE), Some(true));
    assert_eq!(chain.set_enabled(names::SCENE, true), Ok(()));

    // The next frame still comes from the live scene.
    let green = ClearScene {
        color: Vec4::new(0.0, 1.0, 0.0, 1.0),
    };
    let camera = PerspectiveCamera::default();
    let frame = SceneFrame {
        source: &green,
        camera: &camera,
        time: 0.0,
    };
    assert!(backend.begin_frame());
    chain.execute(&mut backend, &frame);
    backend.end_frame();
    assert!(backend.screen().pixel(1, 1).abs_diff_eq(Vec4::new(0.0, 1.0, 0.0, 1.0), 1e-5));
}

#[test]
fn chain_built_with_scene_disabled_draws_nothing() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene().enabled(false), spy("a", &log)]);
    run(&mut chain, &mut backend);
    assert!(log.lock().is_empty());
    assert_eq!(chain.terminal_pass(), None);
    assert!(backend.screen().pixels().iter().all(|p| *p == Vec4::ZERO));
}

#[test]
fn scene_alone_writes_to_screen() {
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene()]);
    run(&mut chain, &mut backend);
    assert_eq!(backend.screen().pixel(0, 0), Vec4::new(0.2, 0.3, 0.4, 1.0));
}

#[test]
fn overlay_alpha_blends_over_scene() {
    let mut backend = CpuBackend::new(8, 6);
    let scene = PassSlot::new(names::SCENE, ScenePass)
        .uniforms(ScenePass::default_uniforms(Vec3::splat(1.0)));
    let mut chain = build(&mut backend, vec![scene]);

    run(&mut chain, &mut backend);
    assert!(backend.screen().pixel(1, 1).truncate().abs_diff_eq(Vec3::ONE, 1e-6));

    chain.set_uniform(names::SCENE, names::OVERLAY_ALPHA, 0.0f32).unwrap();
    run(&mut chain, &mut backend);
    assert_eq!(backend.screen().pixel(1, 1).truncate(), Vec3::new(0.2, 0.3, 0.4));
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn duplicate_terminal_is_rejected() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let result = PassChain::new(
        &mut backend,
        ChainConfig::default(),
        viewport(),
        vec![scene(), spy("a", &log).terminal(), spy("b", &log).terminal()],
    );
    assert_eq!(
        result.err(),
        Some(ChainError::DuplicateTerminalPass {
            first: "a".into(),
            second: "b".into()
        })
    );
}

#[test]
fn chain_requires_scene_first() {
    let mut backend = CpuBackend::new(8, 6);
    let result = PassChain::new(
        &mut backend,
        ChainConfig::default(),
        viewport(),
        vec![tint("t", 0.1), scene()],
    );
    assert_eq!(result.err(), Some(ChainError::MissingScenePass));

    let empty = PassChain::<CpuBackend>::new(&mut backend, ChainConfig::default(), viewport(), vec![]);
    assert_eq!(empty.err(), Some(ChainError::MissingScenePass));
}

#[test]
fn duplicate_names_are_rejected() {
    let mut backend = CpuBackend::new(8, 6);
    let result = PassChain::new(
        &mut backend,
        ChainConfig::default(),
        viewport(),
        vec![scene(), tint("t", 0.1), tint("t", 0.2)],
    );
    assert_eq!(result.err(), Some(ChainError::DuplicatePassName("t".into())));
}

#[test]
fn standard_chain_layout() {
    let mut backend = CpuBackend::new(8, 6);
    let chain = build(&mut backend, standard_passes(&SurfacePlan::default(), Vec3::splat(0.15)));
    let names: Vec<_> = chain.pass_names().collect();
    assert_eq!(
        names,
        [
            "scene",
            "dot_screen",
            "glitch",
            "rgb_shift",
            "unreal_bloom",
            "tint",
            "displacement",
            "bloom",
            "film"
        ]
    );
    assert_eq!(chain.is_enabled("scene"), Some(true));
    assert_eq!(chain.is_enabled("film"), Some(false));
    assert_eq!(
        chain.get("displacement").map(PassSlot::activation_gate),
        Some(Activation::OnReady)
    );

    let aa_plan = SurfacePlan {
        kind: SurfaceKind::Standard,
        append_aa_pass: true,
    };
    let chain = build(&mut backend, standard_passes(&aa_plan, Vec3::splat(0.15)));
    assert_eq!(chain.pass_names().last(), Some("fxaa"));
    assert_eq!(chain.terminal_pass(), Some("fxaa"));
}

// ============================================================================
// add_pass
// ============================================================================

#[test]
fn add_pass_appends_and_inserts() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene(), spy("b", &log)]);

    assert_eq!(chain.add_pass(spy("c", &log), None), Ok(2));
    assert_eq!(chain.add_pass(spy("a", &log), Some(1)), Ok(1));
    run(&mut chain, &mut backend);
    assert_eq!(*log.lock(), ["a", "b", "c"]);
}

#[test]
fn add_pass_cannot_precede_scene() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene()]);

    assert_eq!(
        chain.add_pass(spy("x", &log), Some(0)),
        Err(ChainError::PositionOutOfRange { position: 0, len: 1 })
    );
    assert_eq!(
        chain.add_pass(spy("x", &log), Some(5)),
        Err(ChainError::PositionOutOfRange { position: 5, len: 1 })
    );
    assert_eq!(chain.len(), 1);
}

#[test]
fn add_pass_rejects_second_terminal() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene(), spy("end", &log).terminal()]);
    assert!(matches!(
        chain.add_pass(spy("other", &log).terminal(), None),
        Err(ChainError::DuplicateTerminalPass { .. })
    ));
}

// ============================================================================
// Setters
// ============================================================================

#[test]
fn set_uniform_preserves_type() {
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, standard_passes(&SurfacePlan::default(), Vec3::ZERO));

    chain.set_uniform(names::RGB_SHIFT, "amount", 0.02f32).unwrap();
    assert_eq!(chain.uniform(names::RGB_SHIFT, "amount"), Some(&UniformValue::Float(0.02)));

    assert_eq!(
        chain.set_uniform(names::RGB_SHIFT, "amount", true),
        Err(ChainError::UniformTypeMismatch {
            pass: "rgb_shift".into(),
            uniform: "amount".into(),
            expected: "float",
            actual: "bool",
        })
    );
    assert_eq!(chain.uniform(names::RGB_SHIFT, "amount"), Some(&UniformValue::Float(0.02)));

    assert!(matches!(
        chain.set_uniform(names::RGB_SHIFT, "missing", 1.0f32),
        Err(ChainError::UnknownUniform { .. })
    ));
    assert_eq!(
        chain.set_uniform("nope", "amount", 1.0f32),
        Err(ChainError::UnknownPass("nope".into()))
    );
    assert_eq!(chain.toggle("nope"), Err(ChainError::UnknownPass("nope".into())));
}

#[test]
fn uniform_edit_is_visible_on_next_execute() {
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene(), tint("t", 0.0)]);
    run(&mut chain, &mut backend);
    let before = backend.screen().pixel(2, 2);

    chain.set_uniform("t", "tint", Vec3::new(0.5, 0.0, 0.0)).unwrap();
    run(&mut chain, &mut backend);
    let after = backend.screen().pixel(2, 2);
    assert!((after.x - before.x - 0.5).abs() < 1e-5);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_round_trip_matches_fresh_chain() {
    let plan = SurfacePlan {
        kind: SurfaceKind::Multisampled,
        append_aa_pass: false,
    };
    let config = ChainConfig {
        plan,
        ..ChainConfig::default()
    };

    let mut backend = CpuBackend::new(800, 600);
    let mut chain = PassChain::new(
        &mut backend,
        config,
        Viewport::new(800, 600, 1.0),
        vec![scene()],
    )
    .unwrap();
    let original = *chain.surface_descriptor();

    chain.resize(&mut backend, 1024, 768, 3.0);
    let fresh_big = PassChain::new(
        &mut backend,
        config,
        Viewport::new(1024, 768, 2.0),
        vec![scene()],
    )
    .unwrap();
    assert_eq!(chain.surface_descriptor(), fresh_big.surface_descriptor());
    assert_eq!(chain.surface_descriptor().size(), (2048, 1536));

    chain.resize(&mut backend, 800, 600, 1.0);
    assert_eq!(*chain.surface_descriptor(), original);
    assert_eq!(original.sample_count, 4);
}

#[test]
fn resize_recreates_surfaces() {
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene()]);
    let created = backend.surfaces_created();
    chain.resize(&mut backend, 8, 6, 1.0);
    assert_eq!(backend.surfaces_created(), created + 2);
}

#[test]
fn zero_size_is_clamped() {
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene()]);
    chain.resize(&mut backend, 0, 0, 1.0);
    assert_eq!(chain.surface_descriptor().size(), (1, 1));
}

// ============================================================================
// Readiness
// ============================================================================

#[test]
fn on_ready_enables_gated_passes_once() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(
        &mut backend,
        vec![
            scene(),
            spy("gated", &log).enabled(false).activation(Activation::OnReady),
            spy("manual", &log).enabled(false),
        ],
    );

    chain.on_ready();
    assert!(chain.is_ready());
    assert_eq!(chain.is_enabled("gated"), Some(true));
    assert_eq!(chain.is_enabled("manual"), Some(false));

    chain.set_enabled("gated", false).unwrap();
    chain.on_ready();
    assert_eq!(chain.is_enabled("gated"), Some(false));
}

#[test]
fn gated_pass_added_after_ready_starts_enabled() {
    let log = Log::default();
    let mut backend = CpuBackend::new(8, 6);
    let mut chain = build(&mut backend, vec![scene()]);
    chain.on_ready();
    chain
        .add_pass(
            spy("late", &log).enabled(false).activation(Activation::OnReady),
            None,
        )
        .unwrap();
    assert_eq!(chain.is_enabled("late"), Some(true));
}
