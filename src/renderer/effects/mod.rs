//! Effect Catalogue
//!
//! Concrete passes of the viewer and the typed parameters the backends consume.
//!
//! | Pass            | Kind           | Uniforms                                                   |
//! |-----------------|----------------|------------------------------------------------------------|
//! | `scene`         | [`ScenePass`]  | `overlay_alpha`, `overlay_color`                           |
//! | `dot_screen`    | `DotScreen`    | `center`, `angle`, `scale`                                 |
//! | `glitch`        | `Glitch`       | `go_wild`                                                  |
//! | `rgb_shift`     | `RgbShift`     | `amount`, `angle`                                          |
//! | `unreal_bloom`  | `UnrealBloom`  | `strength`, `radius`, `threshold`                          |
//! | `tint`          | `Tint`         | `tint`                                                     |
//! | `displacement`  | `Displacement` | `normal_map`, `strength`                                   |
//! | `bloom`         | `Bloom`        | `strength`, `kernel_size`, `sigma`, `resolution`           |
//! | `film`          | `Film`         | `noise_intensity`, `scanline_intensity`, `scanline_count`, `grayscale` |
//! | `fxaa`          | `Fxaa`         | —                                                          |
//!
//! Each [`EffectPass`] resolves its uniform map into an [`EffectParams`] value
//! right before drawing, so uniform edits are visible on the very next frame.

pub mod glitch;

use glam::{Vec2, Vec3, Vec4};

use crate::renderer::backend::{PassTarget, RenderBackend};
use crate::renderer::capability::SurfacePlan;
use crate::renderer::pass::{Activation, PassContext, PassSlot, PostPass};
use crate::renderer::uniforms::{TextureRef, UniformValue, Uniforms};

pub use glitch::{GlitchFrame, GlitchState};

/// Pass names of the standard chain.
pub mod names {
    pub const SCENE: &str = "scene";
    pub const DOT_SCREEN: &str = "dot_screen";
    pub const GLITCH: &str = "glitch";
    pub const RGB_SHIFT: &str = "rgb_shift";
    pub const UNREAL_BLOOM: &str = "unreal_bloom";
    pub const TINT: &str = "tint";
    pub const DISPLACEMENT: &str = "displacement";
    pub const BLOOM: &str = "bloom";
    pub const FILM: &str = "film";
    pub const FXAA: &str = "fxaa";

    /// Overlay alpha uniform of the scene pass.
    pub const OVERLAY_ALPHA: &str = "overlay_alpha";
    pub const OVERLAY_COLOR: &str = "overlay_color";
    /// Normal map uniform of the displacement pass.
    pub const NORMAL_MAP: &str = "normal_map";
}

// ============================================================================
// EffectKind / EffectParams
// ============================================================================

/// Identifies the shading program of an [`EffectPass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Copy,
    DotScreen,
    Glitch,
    RgbShift,
    UnrealBloom,
    Tint,
    Displacement,
    Bloom,
    Film,
    Fxaa,
}

impl EffectKind {
    /// Uniforms the effect starts with.
    #[must_use]
    pub fn default_uniforms(self) -> Uniforms {
        match self {
            Self::Copy | Self::Fxaa => Uniforms::new(),
            Self::DotScreen => Uniforms::new()
                .with("center", Vec2::splat(0.5))
                .with("angle", 1.57f32)
                .with("scale", 1.0f32),
            Self::Glitch => Uniforms::new().with("go_wild", false),
            Self::RgbShift => Uniforms::new()
                .with("amount", 0.005f32)
                .with("angle", 0.0f32),
            Self::UnrealBloom => Uniforms::new()
                .with("strength", 0.2f32)
                .with("radius", 1.0f32)
                .with("threshold", 0.6f32),
            Self::Tint => Uniforms::new().with("tint", Vec3::ZERO),
            Self::Displacement => {
                let mut u = Uniforms::new().with("strength", 0.1f32);
                u.insert(names::NORMAL_MAP, UniformValue::Texture(None));
                u
            }
            Self::Bloom => Uniforms::new()
                .with("strength", 1.0f32)
                .with("kernel_size", 25i32)
                .with("sigma", 1.0f32)
                .with("resolution", 256i32),
            Self::Film => Uniforms::new()
                .with("noise_intensity", 0.35f32)
                .with("scanline_intensity", 0.025f32)
                .with("scanline_count", 648.0f32)
                .with("grayscale", false),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Copy => "Copy",
            Self::DotScreen => "Dot Screen",
            Self::Glitch => "Glitch",
            Self::RgbShift => "RGB Shift",
            Self::UnrealBloom => "Unreal Bloom",
            Self::Tint => "Tint",
            Self::Displacement => "Displacement",
            Self::Bloom => "Bloom",
            Self::Film => "Film",
            Self::Fxaa => "FXAA",
        }
    }
}

/// Fully resolved parameters of one effect invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectParams {
    Copy,
    DotScreen {
        center: Vec2,
        angle: f32,
        scale: f32,
    },
    Glitch(GlitchFrame),
    RgbShift {
        amount: f32,
        angle: f32,
    },
    UnrealBloom {
        strength: f32,
        radius: f32,
        threshold: f32,
    },
    Tint {
        tint: Vec3,
    },
    Displacement {
        normal_map: Option<TextureRef>,
        strength: f32,
    },
    Bloom {
        strength: f32,
        kernel_size: u32,
        sigma: f32,
        resolution: u32,
    },
    Film {
        time: f32,
        noise_intensity: f32,
        scanline_intensity: f32,
        scanline_count: f32,
        grayscale: bool,
    },
    Fxaa,
}

impl EffectParams {
    /// Which program runs these parameters.
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Copy => EffectKind::Copy,
            Self::DotScreen { .. } => EffectKind::DotScreen,
            Self::Glitch(_) => EffectKind::Glitch,
            Self::RgbShift { .. } => EffectKind::RgbShift,
            Self::UnrealBloom { .. } => EffectKind::UnrealBloom,
            Self::Tint { .. } => EffectKind::Tint,
            Self::Displacement { .. } => EffectKind::Displacement,
            Self::Bloom { .. } => EffectKind::Bloom,
            Self::Film { .. } => EffectKind::Film,
            Self::Fxaa => EffectKind::Fxaa,
        }
    }

    /// Packs scalar parameters into four vec4 slots for GPU uniform upload.
    ///
    /// Layout is per kind and mirrored by the WGSL programs.
    #[must_use]
    pub fn pack(&self) -> [[f32; 4]; 4] {
        let mut p = [[0.0f32; 4]; 4];
        match self {
            Self::Copy | Self::Fxaa => {}
            Self::DotScreen {
                center,
                angle,
                scale,
            } => {
                p[0] = [center.x, center.y, *angle, *scale];
            }
            Self::Glitch(g) => {
                p[0] = [
                    if g.bypass { 1.0 } else { 0.0 },
                    g.amount,
                    g.angle,
                    g.seed,
                ];
                p[1] = [g.seed_x, g.seed_y, g.distortion_x, g.distortion_y];
                p[2] = [g.col_s, 0.0, 0.0, 0.0];
            }
            Self::RgbShift { amount, angle } => {
                p[0] = [*amount, *angle, 0.0, 0.0];
            }
            Self::UnrealBloom {
                strength,
                radius,
                threshold,
            } => {
                p[0] = [*strength, *radius, *threshold, 0.0];
            }
            Self::Tint { tint } => {
                p[0] = [tint.x, tint.y, tint.z, 0.0];
            }
            Self::Displacement {
                normal_map,
                strength,
            } => {
                p[0] = [
                    *strength,
                    if normal_map.is_some() { 1.0 } else { 0.0 },
                    0.0,
                    0.0,
                ];
            }
            Self::Bloom {
                strength,
                kernel_size,
                sigma,
                resolution,
            } => {
                p[0] = [*strength, *kernel_size as f32, *sigma, *resolution as f32];
            }
            Self::Film {
                time,
                noise_intensity,
                scanline_intensity,
                scanline_count,
                grayscale,
            } => {
                p[0] = [
                    *time,
                    *noise_intensity,
                    *scanline_intensity,
                    *scanline_count,
                ];
                p[1] = [if *grayscale { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0];
            }
        }
        p
    }

    /// Auxiliary texture sampled by the effect, if any.
    #[must_use]
    pub fn aux_texture(&self) -> Option<&TextureRef> {
        match self {
            Self::Displacement { normal_map, .. } => normal_map.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// EffectPass
// ============================================================================

/// Full-screen pass running one [`EffectKind`].
#[derive(Debug)]
pub struct EffectPass {
    kind: EffectKind,
    glitch: Option<GlitchState>,
}

impl EffectPass {
    #[must_use]
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            glitch: (kind == EffectKind::Glitch).then(|| GlitchState::new(0x5EED)),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Turns the uniform map into this frame's parameters.
    pub fn resolve(&mut self, uniforms: &Uniforms, time: f32) -> EffectParams {
        match self.kind {
            EffectKind::Copy => EffectParams::Copy,
            EffectKind::DotScreen => EffectParams::DotScreen {
                center: uniforms.vec2("center", Vec2::splat(0.5)),
                angle: uniforms.float("angle", 1.57),
                scale: uniforms.float("scale", 1.0),
            },
            EffectKind::Glitch => {
                let go_wild = uniforms.flag("go_wild", false);
                let frame = self
                    .glitch
                    .get_or_insert_with(|| GlitchState::new(0x5EED))
                    .advance(go_wild);
                EffectParams::Glitch(frame)
            }
            EffectKind::RgbShift => EffectParams::RgbShift {
                amount: uniforms.float("amount", 0.005),
                angle: uniforms.float("angle", 0.0),
            },
            EffectKind::UnrealBloom => EffectParams::UnrealBloom {
                strength: uniforms.float("strength", 0.2),
                radius: uniforms.float("radius", 1.0),
                threshold: uniforms.float("threshold", 0.6),
            },
            EffectKind::Tint => EffectParams::Tint {
                tint: uniforms.vec3("tint", Vec3::ZERO),
            },
            EffectKind::Displacement => EffectParams::Displacement {
                normal_map: uniforms.texture(names::NORMAL_MAP).cloned(),
                strength: uniforms.float("strength", 0.1),
            },
            EffectKind::Bloom => EffectParams::Bloom {
                strength: uniforms.float("strength", 1.0),
                kernel_size: uniforms.int("kernel_size", 25).max(1) as u32,
                sigma: uniforms.float("sigma", 1.0),
                resolution: uniforms.int("resolution", 256).max(1) as u32,
            },
            EffectKind::Film => EffectParams::Film {
                time,
                noise_intensity: uniforms.float("noise_intensity", 0.35),
                scanline_intensity: uniforms.float("scanline_intensity", 0.025),
                scanline_count: uniforms.float("scanline_count", 648.0),
                grayscale: uniforms.flag("grayscale", false),
            },
            EffectKind::Fxaa => EffectParams::Fxaa,
        }
    }
}

impl<B: RenderBackend> PostPass<B> for EffectPass {
    fn render(
        &mut self,
        ctx: &mut PassContext<'_, B>,
        uniforms: &Uniforms,
        input: &B::Surface,
        target: PassTarget<'_, B::Surface>,
    ) {
        let params = self.resolve(uniforms, ctx.frame.time);
        ctx.backend.apply_effect(&params, input, target);
    }
}

// ============================================================================
// ScenePass
// ============================================================================

/// Element 0 of every chain: draws the scene, then the loading overlay.
#[derive(Debug, Default)]
pub struct ScenePass;

impl ScenePass {
    /// Uniforms of the scene pass: the overlay starts fully opaque.
    #[must_use]
    pub fn default_uniforms(overlay_color: Vec3) -> Uniforms {
        Uniforms::new()
            .with(names::OVERLAY_ALPHA, 1.0f32)
            .with(names::OVERLAY_COLOR, overlay_color)
    }
}

impl<B: RenderBackend> PostPass<B> for ScenePass {
    fn render(
        &mut self,
        ctx: &mut PassContext<'_, B>,
        uniforms: &Uniforms,
        _input: &B::Surface,
        mut target: PassTarget<'_, B::Surface>,
    ) {
        ctx.frame
            .source
            .draw(ctx.backend, ctx.frame.camera, reborrow(&mut target));

        let alpha = uniforms.float(names::OVERLAY_ALPHA, 0.0).clamp(0.0, 1.0);
        if alpha > 0.0 {
            let color = uniforms.vec3(names::OVERLAY_COLOR, Vec3::splat(0.15));
            ctx.backend
                .composite_overlay(Vec4::new(color.x, color.y, color.z, alpha), target);
        }
    }

    fn is_scene(&self) -> bool {
        true
    }
}

/// Shortens a target borrow so it can be used twice.
pub(crate) fn reborrow<'a, S>(target: &'a mut PassTarget<'_, S>) -> PassTarget<'a, S> {
    match target {
        PassTarget::Surface(s) => PassTarget::Surface(s),
        PassTarget::Screen => PassTarget::Screen,
    }
}

// ============================================================================
// Standard chain
// ============================================================================

/// Builds the viewer's pass list, in execution order.
///
/// Every effect starts disabled except the scene pass; `displacement` is
/// enabled by the reveal once all assets are loaded. An `fxaa` pass is
/// appended, enabled, only when the capability probe asks for one.
#[must_use]
pub fn standard_passes<B: RenderBackend>(plan: &SurfacePlan, overlay_color: Vec3) -> Vec<PassSlot<B>> {
    let effect = |name: &str, kind: EffectKind| {
        PassSlot::new(name, EffectPass::new(kind))
            .enabled(false)
            .uniforms(kind.default_uniforms())
    };

    let mut passes = vec![
        PassSlot::new(names::SCENE, ScenePass).uniforms(ScenePass::default_uniforms(overlay_color)),
        effect(names::DOT_SCREEN, EffectKind::DotScreen),
        effect(names::GLITCH, EffectKind::Glitch),
        effect(names::RGB_SHIFT, EffectKind::RgbShift),
        effect(names::UNREAL_BLOOM, EffectKind::UnrealBloom),
        effect(names::TINT, EffectKind::Tint),
        effect(names::DISPLACEMENT, EffectKind::Displacement).activation(Activation::OnReady),
        effect(names::BLOOM, EffectKind::Bloom),
        effect(names::FILM, EffectKind::Film),
    ];

    if plan.append_aa_pass {
        passes.push(
            PassSlot::new(names::FXAA, EffectPass::new(EffectKind::Fxaa))
                .uniforms(EffectKind::Fxaa.default_uniforms()),
        );
    }

    passes
}
