//! Capability Probe Tests
//!
//! Tests for:
//! - The surface / AA truth table over pixel ratio and tier
//! - Inconclusive inputs falling back to the standard surface
//! - Sample counts derived from the plan
//! - Configured sample counts fitted to the adapter

use lumen::renderer::capability::{
    CapabilityReport, FeatureTier, SurfaceKind, SurfacePlan, fit_sample_count, probe,
};
use lumen::renderer::surface::{SurfaceDescriptor, Viewport};
use lumen::settings::ViewerSettings;

// ============================================================================
// Truth table
// ============================================================================

#[test]
fn unit_ratio_with_advanced_tier_uses_multisampling() {
    let plan = probe(&CapabilityReport::new(1.0, FeatureTier::Advanced));
    assert_eq!(plan.kind, SurfaceKind::Multisampled);
    assert!(!plan.append_aa_pass);
}

#[test]
fn unit_ratio_with_basic_tier_appends_aa_pass() {
    let plan = probe(&CapabilityReport::new(1.0, FeatureTier::Basic));
    assert_eq!(plan.kind, SurfaceKind::Standard);
    assert!(plan.append_aa_pass);
}

#[test]
fn high_density_display_needs_neither() {
    for tier in [FeatureTier::Advanced, FeatureTier::Basic, FeatureTier::Unknown] {
        for ratio in [1.5, 2.0, 3.0] {
            let plan = probe(&CapabilityReport::new(ratio, tier));
            assert_eq!(plan, SurfacePlan::default(), "ratio {ratio}, tier {tier:?}");
        }
    }
}

#[test]
fn multisampling_and_aa_pass_are_never_both_selected() {
    for tier in [FeatureTier::Advanced, FeatureTier::Basic, FeatureTier::Unknown] {
        for ratio in [0.5, 1.0, 1.25, 2.0] {
            let plan = probe(&CapabilityReport::new(ratio, tier));
            assert!(!(plan.kind == SurfaceKind::Multisampled && plan.append_aa_pass));
        }
    }
}

// ============================================================================
// Inconclusive detection
// ============================================================================

#[test]
fn unknown_tier_defaults_to_standard() {
    let plan = probe(&CapabilityReport::new(1.0, FeatureTier::Unknown));
    assert_eq!(plan, SurfacePlan::default());
}

#[test]
fn missing_or_invalid_ratio_defaults_to_standard() {
    let missing = CapabilityReport {
        pixel_ratio: None,
        tier: FeatureTier::Advanced,
    };
    assert_eq!(probe(&missing), SurfacePlan::default());

    for ratio in [f32::NAN, f32::INFINITY, 0.0, -1.0] {
        let plan = probe(&CapabilityReport::new(ratio, FeatureTier::Basic));
        assert_eq!(plan, SurfacePlan::default(), "ratio {ratio}");
    }
}

// ============================================================================
// Sample count
// ============================================================================

#[test]
fn sample_count_follows_plan() {
    let msaa = probe(&CapabilityReport::new(1.0, FeatureTier::Advanced));
    assert_eq!(msaa.sample_count(4), 4);
    assert_eq!(SurfacePlan::default().sample_count(4), 1);
}

// ============================================================================
// Sample count fitting
// ============================================================================

fn multisampled() -> SurfacePlan {
    probe(&CapabilityReport::new(1.0, FeatureTier::Advanced))
}

#[test]
fn supported_request_is_kept() {
    assert_eq!(fit_sample_count(multisampled(), 8, &[2, 4, 8]), (multisampled(), 8));
}

#[test]
fn unsupported_request_from_settings_falls_back_to_four() {
    let settings = ViewerSettings::from_json_str(r#"{ "renderer": { "msaa_samples": 8 } }"#).unwrap();
    assert_eq!(settings.renderer.msaa_samples, 8);

    let (plan, samples) = fit_sample_count(multisampled(), settings.renderer.msaa_samples, &[2, 4]);
    assert_eq!(plan.kind, SurfaceKind::Multisampled);
    assert_eq!(samples, 4);

    let desc = SurfaceDescriptor::for_viewport(&Viewport::new(64, 32, 1.0), &plan, samples);
    assert_eq!(desc.sample_count, 4);
}

#[test]
fn odd_request_uses_largest_count_without_four() {
    let (_, samples) = fit_sample_count(multisampled(), 3, &[2]);
    assert_eq!(samples, 2);
}

#[test]
fn no_multisample_support_degrades_to_standard_with_aa_pass() {
    let (plan, samples) = fit_sample_count(multisampled(), 4, &[]);
    assert_eq!(plan.kind, SurfaceKind::Standard);
    assert!(plan.append_aa_pass);
    assert_eq!(samples, 1);
    assert_eq!(plan.sample_count(samples), 1);
}

#[test]
fn standard_plan_is_untouched() {
    let (plan, _) = fit_sample_count(SurfacePlan::default(), 8, &[]);
    assert_eq!(plan, SurfacePlan::default());
    assert_eq!(plan.sample_count(8), 1);
}
