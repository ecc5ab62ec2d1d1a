//! Capability Probe
//!
//! Decides which intermediate surface the pass chain renders into, and whether
//! a dedicated anti-aliasing pass has to be appended to compensate for the lack
//! of hardware multisampling.
//!
//! | Pixel ratio | Advanced tier | Surface        | AA pass |
//! |-------------|---------------|----------------|---------|
//! | 1           | available     | Multisampled   | no      |
//! | 1           | unavailable   | Standard       | yes     |
//! | > 1         | any           | Standard       | no      |
//! | unknown     | any           | Standard       | no      |
//!
//! High-density displays already supersample by virtue of their pixel ratio,
//! so neither form of anti-aliasing is paid for there.
//!
//! [`probe`] is a pure function. Gathering the inputs from a live adapter is
//! done separately by [`FeatureTier::from_adapter`] and
//! [`supported_sample_counts`]; [`fit_sample_count`] then reconciles the
//! configured sample count with the adapter.

use smallvec::SmallVec;

/// GPU capability classification used to pick the rendering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureTier {
    /// Multisampled render targets with resolve are supported.
    Advanced,
    /// Only single-sampled offscreen targets are available.
    Basic,
    /// Detection was inconclusive.
    #[default]
    Unknown,
}

impl FeatureTier {
    /// Classifies an adapter by the multisampling support it reports for the
    /// intermediate surface format.
    #[must_use]
    pub fn from_adapter(adapter: &wgpu::Adapter, format: wgpu::TextureFormat) -> Self {
        let flags = adapter.get_texture_format_features(format).flags;
        let tier = if flags.contains(
            wgpu::TextureFormatFeatureFlags::MULTISAMPLE_X4
                | wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE,
        ) {
            Self::Advanced
        } else {
            Self::Basic
        };
        log::debug!("Adapter tier for {format:?}: {tier:?}");
        tier
    }
}

/// Inputs of the probe, as reported by the active GPU context.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CapabilityReport {
    /// The renderer's (already clamped) pixel ratio. `None` when unknown.
    pub pixel_ratio: Option<f32>,
    pub tier: FeatureTier,
}

impl CapabilityReport {
    #[must_use]
    pub fn new(pixel_ratio: f32, tier: FeatureTier) -> Self {
        Self {
            pixel_ratio: Some(pixel_ratio),
            tier,
        }
    }
}

/// Intermediate surface backing selected by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceKind {
    /// Hardware multisampled target, resolved before sampling.
    Multisampled,
    /// Plain single-sampled offscreen target.
    #[default]
    Standard,
}

/// Result of the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfacePlan {
    pub kind: SurfaceKind,
    /// Whether a post-process anti-aliasing pass must be appended.
    pub append_aa_pass: bool,
}

impl SurfacePlan {
    /// Sample count of the intermediate surfaces for this plan.
    #[inline]
    #[must_use]
    pub fn sample_count(&self, msaa_samples: u32) -> u32 {
        match self.kind {
            SurfaceKind::Multisampled => msaa_samples.max(1),
            SurfaceKind::Standard => 1,
        }
    }
}

/// Multisample counts above 1 the adapter can render and resolve for `format`.
#[must_use]
pub fn supported_sample_counts(
    adapter: &wgpu::Adapter,
    format: wgpu::TextureFormat,
) -> SmallVec<[u32; 4]> {
    let flags = adapter.get_texture_format_features(format).flags;
    if !flags.contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE) {
        return SmallVec::new();
    }
    [2, 4, 8, 16]
        .into_iter()
        .filter(|&n| flags.sample_count_supported(n))
        .collect()
}

/// Reconciles the configured sample count with the adapter.
///
/// A supported request is kept. Otherwise 4 is used when available, then the
/// largest supported count. With no usable count the plan degrades to the
/// standard surface with an AA pass. Standard plans pass through unchanged.
#[must_use]
pub fn fit_sample_count(plan: SurfacePlan, requested: u32, supported: &[u32]) -> (SurfacePlan, u32) {
    if plan.kind == SurfaceKind::Standard {
        return (plan, requested);
    }

    let fitted = if supported.contains(&requested) {
        Some(requested)
    } else if supported.contains(&4) {
        Some(4)
    } else {
        supported.iter().copied().max()
    };

    match fitted {
        Some(count) => {
            if count != requested {
                log::warn!("{requested}x multisampling unsupported, using {count}x");
            }
            (plan, count)
        }
        None => {
            log::warn!("No multisample count supported, using standard surface with AA pass");
            let fallback = SurfacePlan {
                kind: SurfaceKind::Standard,
                append_aa_pass: true,
            };
            (fallback, 1)
        }
    }
}

/// Selects the surface backing and anti-aliasing strategy.
///
/// Inconclusive inputs (unknown tier, missing or non-finite pixel ratio) yield
/// the safe default: standard surface, no extra pass.
#[must_use]
pub fn probe(report: &CapabilityReport) -> SurfacePlan {
    let Some(ratio) = report.pixel_ratio.filter(|r| r.is_finite() && *r > 0.0) else {
        log::debug!("Pixel ratio unavailable, using standard surface");
        return SurfacePlan::default();
    };

    let unit_ratio = (ratio - 1.0).abs() <= f32::EPSILON;

    let plan = match (unit_ratio, report.tier) {
        (true, FeatureTier::Advanced) => SurfacePlan {
            kind: SurfaceKind::Multisampled,
            append_aa_pass: false,
        },
        (true, FeatureTier::Basic) => SurfacePlan {
            kind: SurfaceKind::Standard,
            append_aa_pass: true,
        },
        _ => SurfacePlan::default(),
    };

    log::info!(
        "Using {:?} surface{}",
        plan.kind,
        if plan.append_aa_pass { " with AA pass" } else { "" }
    );
    plan
}
