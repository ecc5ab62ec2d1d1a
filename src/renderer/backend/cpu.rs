//! Software backend.
//!
//! Surfaces are linear float RGBA images and every effect is evaluated per
//! pixel on the CPU, mirroring the WGSL programs of the wgpu backend closely
//! enough for behavioural tests. Multisampling is recorded in the descriptor
//! but has no effect on the stored image.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

use super::{PassTarget, RenderBackend, mesh_shade};
use crate::assets::{MeshData, TextureData};
use crate::renderer::effects::{EffectParams, GlitchFrame};
use crate::renderer::surface::{MIN_SURFACE_SIZE, SurfaceDescriptor};

const DOT_SCREEN_TEXTURE_SIZE: f32 = 256.0;
const LUMA: Vec3 = Vec3::new(0.299, 0.587, 0.114);

// ============================================================================
// CpuImage
// ============================================================================

/// Row-major RGBA float image.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuImage {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl CpuImage {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Vec4::ZERO)
    }

    #[must_use]
    pub fn filled(width: u32, height: u32, color: Vec4) -> Self {
        let width = width.max(MIN_SURFACE_SIZE);
        let height = height.max(MIN_SURFACE_SIZE);
        Self {
            width,
            height,
            pixels: vec![color; (width as usize) * (height as usize)],
        }
    }

    /// Builds an image from a per-pixel function of the texel-center UV.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(Vec2) -> Vec4) -> Self {
        let mut image = Self::new(width, height);
        let (w, h) = (image.width as f32, image.height as f32);
        for y in 0..image.height {
            for x in 0..image.width {
                let uv = Vec2::new((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
                image.pixels[(y * image.width + x) as usize] = f(uv);
            }
        }
        image
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    /// Pixel at integer coordinates, clamped to the edge.
    #[must_use]
    pub fn pixel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, i64::from(self.width) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.pixels[(y * self.width + x) as usize]
    }

    /// Bilinear, clamp-to-edge sample.
    #[must_use]
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.pixel(x0, y0).lerp(self.pixel(x0 + 1, y0), fx);
        let bottom = self.pixel(x0, y0 + 1).lerp(self.pixel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    /// Quantised RGBA8 copy, for snapshots and image export.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| {
                let c = (p.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
                [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
            })
            .collect()
    }

    fn map(&self, mut f: impl FnMut(Vec4) -> Vec4) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().map(|p| f(*p)).collect(),
        }
    }

    /// Separable gaussian blur. `radius` is in texels.
    fn blur(&self, taps: u32, sigma: f32, radius: f32) -> Self {
        let weights = gaussian_weights(taps, sigma);
        let half = (weights.len() / 2) as i64;
        let pass = |src: &Self, horizontal: bool| {
            let mut out = src.clone();
            for y in 0..src.height {
                for x in 0..src.width {
                    let mut acc = Vec4::ZERO;
                    for (i, w) in weights.iter().enumerate() {
                        let d = ((i as i64 - half) as f32 * radius).round() as i64;
                        let (sx, sy) = if horizontal {
                            (i64::from(x) + d, i64::from(y))
                        } else {
                            (i64::from(x), i64::from(y) + d)
                        };
                        acc += src.pixel(sx, sy) * *w;
                    }
                    out.pixels[(y * src.width + x) as usize] = acc;
                }
            }
            out
        };
        pass(&pass(self, true), false)
    }
}

/// Normalised 1D gaussian kernel with an odd number of taps.
fn gaussian_weights(taps: u32, sigma: f32) -> Vec<f32> {
    let taps = taps.max(1) | 1;
    let sigma = sigma.max(1e-3);
    let half = (taps / 2) as i32;
    let raw: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

fn luma(c: Vec4) -> f32 {
    c.xyz().dot(LUMA)
}

/// Shader-style hash noise in `[0, 1)`.
fn rand(co: Vec2) -> f32 {
    ((co.dot(Vec2::new(12.9898, 78.233))).sin() * 43_758.547).rem_euclid(1.0)
}

// ============================================================================
// CpuSurface / CpuBackend
// ============================================================================

/// Intermediate surface of the software backend.
#[derive(Debug, Clone)]
pub struct CpuSurface {
    desc: SurfaceDescriptor,
    image: CpuImage,
}

impl CpuSurface {
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &SurfaceDescriptor {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn image(&self) -> &CpuImage {
        &self.image
    }
}

/// Headless backend rendering into an in-memory screen image.
#[derive(Debug)]
pub struct CpuBackend {
    screen: CpuImage,
    in_frame: bool,
    frames_presented: u64,
    surfaces_created: u64,
}

impl CpuBackend {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: CpuImage::new(width, height),
            in_frame: false,
            frames_presented: 0,
            surfaces_created: 0,
        }
    }

    /// Last presented (or in-progress) screen contents.
    #[inline]
    #[must_use]
    pub fn screen(&self) -> &CpuImage {
        &self.screen
    }

    #[inline]
    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Total number of surfaces allocated so far.
    #[inline]
    #[must_use]
    pub fn surfaces_created(&self) -> u64 {
        self.surfaces_created
    }

    fn target_size(&self, target: &PassTarget<'_, CpuSurface>) -> (u32, u32) {
        match target {
            PassTarget::Surface(s) => s.desc.size(),
            PassTarget::Screen => self.screen.size(),
        }
    }

    fn write(&mut self, target: PassTarget<'_, CpuSurface>, image: CpuImage) {
        match target {
            PassTarget::Surface(s) => s.image = image,
            PassTarget::Screen => self.screen = image,
        }
    }

    fn image_mut<'a>(&'a mut self, target: PassTarget<'a, CpuSurface>) -> &'a mut CpuImage {
        match target {
            PassTarget::Surface(s) => &mut s.image,
            PassTarget::Screen => &mut self.screen,
        }
    }
}

impl RenderBackend for CpuBackend {
    type Surface = CpuSurface;
    type CubeMap = Arc<[TextureData; 6]>;
    type Mesh = Arc<MeshData>;

    fn create_surface(&mut self, desc: &SurfaceDescriptor) -> CpuSurface {
        self.surfaces_created += 1;
        CpuSurface {
            desc: *desc,
            image: CpuImage::new(desc.width, desc.height),
        }
    }

    fn resize_output(&mut self, width: u32, height: u32) {
        if self.screen.size() != (width, height) {
            self.screen = CpuImage::new(width, height);
        }
    }

    fn output_size(&self) -> (u32, u32) {
        self.screen.size()
    }

    fn begin_frame(&mut self) -> bool {
        self.in_frame = true;
        true
    }

    fn end_frame(&mut self) {
        if self.in_frame {
            self.in_frame = false;
            self.frames_presented += 1;
        }
    }

    fn clear(&mut self, color: Vec4, target: PassTarget<'_, CpuSurface>) {
        let (w, h) = self.target_size(&target);
        self.write(target, CpuImage::filled(w, h, color));
    }

    fn apply_effect(
        &mut self,
        effect: &EffectParams,
        input: &CpuSurface,
        target: PassTarget<'_, CpuSurface>,
    ) {
        let (w, h) = self.target_size(&target);
        let output = shade(effect, &input.image, w, h);
        self.write(target, output);
    }

    fn composite_overlay(&mut self, color: Vec4, target: PassTarget<'_, CpuSurface>) {
        let alpha = color.w.clamp(0.0, 1.0);
        let tint = color.xyz();
        let blend = |p: Vec4| {
            let rgb = p.xyz().lerp(tint, alpha);
            Vec4::new(rgb.x, rgb.y, rgb.z, alpha + p.w * (1.0 - alpha))
        };
        match target {
            PassTarget::Surface(s) => s.image = s.image.map(blend),
            PassTarget::Screen => self.screen = self.screen.map(blend),
        }
    }

    fn upload_cube_map(&mut self, faces: &[TextureData; 6]) -> Self::CubeMap {
        Arc::new(faces.clone())
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> Self::Mesh {
        Arc::new(mesh.clone())
    }

    fn draw_background(
        &mut self,
        cube: &Self::CubeMap,
        inverse_view_projection: Mat4,
        target: PassTarget<'_, CpuSurface>,
    ) {
        let (w, h) = self.target_size(&target);
        let image = CpuImage::from_fn(w, h, |uv| {
            let far = inverse_view_projection * Vec4::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 1.0, 1.0);
            let color = sample_cube(cube, far.xyz() / far.w);
            color.xyz().extend(1.0)
        });
        self.write(target, image);
    }

    fn draw_mesh(
        &mut self,
        mesh: &Self::Mesh,
        view_projection: Mat4,
        color: Vec4,
        target: PassTarget<'_, CpuSurface>,
    ) {
        rasterize(self.image_mut(target), mesh, view_projection, color);
    }
}

// ============================================================================
// Scene content
// ============================================================================

/// Samples a cube map along `dir` using the usual face selection
/// (`+X, -X, +Y, -Y, +Z, -Z`, texture origin top-left).
#[must_use]
pub fn sample_cube(faces: &[TextureData; 6], dir: Vec3) -> Vec4 {
    let a = dir.abs();
    let (face, sc, tc, ma) = if a.x >= a.y && a.x >= a.z {
        if dir.x >= 0.0 {
            (0, -dir.z, -dir.y, a.x)
        } else {
            (1, dir.z, -dir.y, a.x)
        }
    } else if a.y >= a.z {
        if dir.y >= 0.0 {
            (2, dir.x, dir.z, a.y)
        } else {
            (3, dir.x, -dir.z, a.y)
        }
    } else if dir.z >= 0.0 {
        (4, dir.x, -dir.y, a.z)
    } else {
        (5, -dir.x, -dir.y, a.z)
    };

    if ma <= f32::EPSILON {
        return Vec4::ZERO;
    }
    let uv = Vec2::new(sc / ma, tc / ma) * 0.5 + Vec2::splat(0.5);
    faces[face].sample(uv)
}

/// Signed doubled area of `(a, b, p)` in screen space.
fn edge(a: Vec3, b: Vec3, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Depth-tested, flat-shaded triangle rasterizer. Triangles crossing the
/// camera plane are dropped instead of clipped.
fn rasterize(image: &mut CpuImage, mesh: &MeshData, view_projection: Mat4, color: Vec4) {
    let (w, h) = (image.width as f32, image.height as f32);
    let mut depth = vec![f32::INFINITY; image.pixels.len()];

    for tri in mesh.triangles() {
        let clip = tri.map(|p| view_projection * p.extend(1.0));
        if clip.iter().any(|c| c.w <= f32::EPSILON) {
            continue;
        }
        let screen = clip.map(|c| {
            let ndc = c.xyz() / c.w;
            Vec3::new((ndc.x * 0.5 + 0.5) * w, (0.5 - ndc.y * 0.5) * h, ndc.z)
        });
        let area = edge(screen[0], screen[1], screen[2].truncate());
        if area.abs() <= f32::EPSILON {
            continue;
        }

        let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
        let shaded = mesh_shade(color, normal);

        let min = screen[0].min(screen[1]).min(screen[2]);
        let max = screen[0].max(screen[1]).max(screen[2]);
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().min(w) as u32).min(image.width);
        let y1 = (max.y.ceil().min(h) as u32).min(image.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let b0 = edge(screen[1], screen[2], p) / area;
                let b1 = edge(screen[2], screen[0], p) / area;
                let b2 = edge(screen[0], screen[1], p) / area;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }
                let z = b0 * screen[0].z + b1 * screen[1].z + b2 * screen[2].z;
                let i = (y * image.width + x) as usize;
                if !(0.0..=1.0).contains(&z) || z >= depth[i] {
                    continue;
                }
                depth[i] = z;
                image.pixels[i] = shaded;
            }
        }
    }
}

// ============================================================================
// Effect evaluation
// ============================================================================

/// Evaluates one effect over `input`, producing a `width`×`height` image.
#[must_use]
pub fn shade(effect: &EffectParams, input: &CpuImage, width: u32, height: u32) -> CpuImage {
    match effect {
        EffectParams::Copy => CpuImage::from_fn(width, height, |uv| input.sample(uv)),

        EffectParams::DotScreen {
            center,
            angle,
            scale,
        } => {
            let (s, c) = angle.sin_cos();
            CpuImage::from_fn(width, height, |uv| {
                let color = input.sample(uv);
                let tex = uv * DOT_SCREEN_TEXTURE_SIZE - *center;
                let point = Vec2::new(c * tex.x - s * tex.y, s * tex.x + c * tex.y) * *scale;
                let pattern = point.x.sin() * point.y.sin() * 4.0;
                let average = (color.x + color.y + color.z) / 3.0;
                let v = average * 10.0 - 5.0 + pattern;
                Vec4::new(v, v, v, color.w)
            })
        }

        EffectParams::Glitch(frame) => glitch(frame, input, width, height),

        EffectParams::RgbShift { amount, angle } => {
            let offset = Vec2::new(angle.cos(), angle.sin()) * *amount;
            CpuImage::from_fn(width, height, |uv| {
                let ga = input.sample(uv);
                Vec4::new(
                    input.sample(uv + offset).x,
                    ga.y,
                    input.sample(uv - offset).z,
                    ga.w,
                )
            })
        }

        EffectParams::UnrealBloom {
            strength,
            radius,
            threshold,
        } => {
            let base = CpuImage::from_fn(width, height, |uv| input.sample(uv));
            let bright = base.map(|p| {
                let keep = smoothstep(*threshold, *threshold + 0.01, luma(p));
                (p.xyz() * keep).extend(1.0)
            });
            let glow = bright.blur(9, 3.0, radius.max(0.0) + 1.0);
            additive(&base, &glow, *strength)
        }

        EffectParams::Tint { tint } => CpuImage::from_fn(width, height, |uv| {
            let p = input.sample(uv);
            (p.xyz() + *tint).extend(p.w)
        }),

        EffectParams::Displacement {
            normal_map,
            strength,
        } => match normal_map {
            Some(map) => {
                let light = Vec3::new(-1.0, 1.0, 0.0).normalize();
                CpuImage::from_fn(width, height, |uv| {
                    let normal = map.sample(uv).xyz() * 2.0 - Vec3::ONE;
                    let mut color = input.sample(uv + normal.truncate() * *strength);
                    let lightness = normal.dot(light).clamp(0.0, 1.0);
                    color += Vec4::new(lightness, lightness, lightness, 0.0) * 2.0;
                    color
                })
            }
            None => CpuImage::from_fn(width, height, |uv| input.sample(uv)),
        },

        EffectParams::Bloom {
            strength,
            kernel_size,
            sigma,
            resolution,
        } => {
            let base = CpuImage::from_fn(width, height, |uv| input.sample(uv));
            let res = (*resolution).max(1);
            let glow = CpuImage::from_fn(res.min(width), res.min(height), |uv| input.sample(uv))
                .blur(*kernel_size, *sigma, 1.0);
            let glow = CpuImage::from_fn(width, height, |uv| glow.sample(uv));
            additive(&base, &glow, *strength)
        }

        EffectParams::Film {
            time,
            noise_intensity,
            scanline_intensity,
            scanline_count,
            grayscale,
        } => CpuImage::from_fn(width, height, |uv| {
            let src = input.sample(uv);
            let base = src.xyz();
            let dx = rand(uv + Vec2::splat(*time));
            let mut result = base + base * (0.1 + dx).clamp(0.0, 1.0);
            let sc = Vec2::new((uv.y * scanline_count).sin(), (uv.y * scanline_count).cos());
            result += base * Vec3::new(sc.x, sc.y, sc.x) * *scanline_intensity;
            result = base + noise_intensity.clamp(0.0, 1.0) * (result - base);
            if *grayscale {
                result = Vec3::splat(result.x * 0.3 + result.y * 0.59 + result.z * 0.11);
            }
            result.extend(src.w)
        }),

        EffectParams::Fxaa => fxaa(input, width, height),
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn additive(base: &CpuImage, glow: &CpuImage, strength: f32) -> CpuImage {
    let mut out = base.clone();
    for (p, g) in out.pixels.iter_mut().zip(&glow.pixels) {
        *p = (p.xyz() + g.xyz() * strength).extend(p.w);
    }
    out
}

fn glitch(frame: &GlitchFrame, input: &CpuImage, width: u32, height: u32) -> CpuImage {
    if frame.bypass {
        return CpuImage::from_fn(width, height, |uv| input.sample(uv));
    }

    let offset = Vec2::new(frame.angle.cos(), frame.angle.sin()) * frame.amount;
    let (w, h) = (width as f32, height as f32);

    CpuImage::from_fn(width, height, |uv| {
        let mut p = uv;
        let seed = frame.seed;
        let disp = Vec2::new(rand(p * seed * seed), rand(p * seed * seed + Vec2::splat(0.5)));

        if p.y < frame.distortion_x + frame.col_s && p.y > frame.distortion_x - frame.col_s * seed
        {
            p.y = if frame.seed_x > 0.0 {
                1.0 - (p.y + frame.distortion_y)
            } else {
                frame.distortion_y
            };
        }
        if p.x < frame.distortion_y + frame.col_s && p.x > frame.distortion_y - frame.col_s * seed
        {
            p.x = if frame.seed_y > 0.0 {
                frame.distortion_x
            } else {
                1.0 - (p.x + frame.distortion_x)
            };
        }
        p.x += disp.x * frame.seed_x * (seed / 5.0);
        p.y += disp.y * frame.seed_y * (seed / 5.0);

        let ga = input.sample(p);
        let color = Vec4::new(
            input.sample(p + offset).x,
            ga.y,
            input.sample(p - offset).z,
            ga.w,
        );

        let xs = (uv.x * w / 0.5).floor();
        let ys = (uv.y * h / 0.5).floor();
        let snow = 200.0 * frame.amount * rand(Vec2::new(xs * seed, ys * seed * 50.0)) * 0.2;
        color + Vec4::splat(snow)
    })
}

fn fxaa(input: &CpuImage, width: u32, height: u32) -> CpuImage {
    const EDGE_THRESHOLD: f32 = 0.125;
    const EDGE_THRESHOLD_MIN: f32 = 0.0312;

    let texel = Vec2::new(1.0 / width as f32, 1.0 / height as f32);
    CpuImage::from_fn(width, height, |uv| {
        let m = input.sample(uv);
        let n = input.sample(uv - Vec2::new(0.0, texel.y));
        let s = input.sample(uv + Vec2::new(0.0, texel.y));
        let e = input.sample(uv + Vec2::new(texel.x, 0.0));
        let w = input.sample(uv - Vec2::new(texel.x, 0.0));

        let lumas = [luma(m), luma(n), luma(s), luma(e), luma(w)];
        let max = lumas.iter().copied().fold(f32::MIN, f32::max);
        let min = lumas.iter().copied().fold(f32::MAX, f32::min);
        let range = max - min;

        if range < EDGE_THRESHOLD_MIN.max(max * EDGE_THRESHOLD) {
            return m;
        }

        let neighbours = (n + s + e + w) * 0.25;
        let blend = (range / max.max(1e-4)).clamp(0.0, 1.0) * 0.5;
        m.lerp(neighbours, blend).xyz().extend(m.w)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_weights_are_normalised() {
        let w = gaussian_weights(25, 1.0);
        assert_eq!(w.len(), 25);
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(w[12] > w[11]);
    }

    #[test]
    fn copy_preserves_uniform_image() {
        let src = CpuImage::filled(4, 4, Vec4::new(0.2, 0.4, 0.6, 1.0));
        let out = shade(&EffectParams::Copy, &src, 4, 4);
        assert_eq!(out, src);
    }

    #[test]
    fn tint_adds_color() {
        let src = CpuImage::filled(2, 2, Vec4::new(0.1, 0.1, 0.1, 1.0));
        let out = shade(
            &EffectParams::Tint {
                tint: Vec3::new(0.5, 0.0, 0.0),
            },
            &src,
            2,
            2,
        );
        assert!((out.pixel(0, 0).x - 0.6).abs() < 1e-5);
        assert!((out.pixel(0, 0).y - 0.1).abs() < 1e-5);
    }

    fn cube_faces() -> [TextureData; 6] {
        [
            TextureData::solid("px", [255, 0, 0, 255]),
            TextureData::solid("nx", [0, 255, 0, 255]),
            TextureData::solid("py", [0, 0, 255, 255]),
            TextureData::solid("ny", [255, 255, 0, 255]),
            TextureData::solid("pz", [0, 255, 255, 255]),
            TextureData::solid("nz", [255, 0, 255, 255]),
        ]
    }

    #[test]
    fn cube_sampling_picks_the_dominant_axis_face() {
        let faces = cube_faces();
        assert_eq!(sample_cube(&faces, Vec3::new(2.0, 0.5, -0.3)), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(sample_cube(&faces, Vec3::new(-2.0, 0.5, 0.3)), Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(sample_cube(&faces, Vec3::new(0.1, 3.0, 0.3)), Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(sample_cube(&faces, Vec3::new(0.1, -3.0, 0.3)), Vec4::new(1.0, 1.0, 0.0, 1.0));
        assert_eq!(sample_cube(&faces, Vec3::new(0.1, 0.2, 1.0)), Vec4::new(0.0, 1.0, 1.0, 1.0));
        assert_eq!(sample_cube(&faces, Vec3::NEG_Z), Vec4::new(1.0, 0.0, 1.0, 1.0));
        assert_eq!(sample_cube(&faces, Vec3::ZERO), Vec4::ZERO);
    }

    fn layered_mesh(near_first: bool) -> MeshData {
        let positions = vec![
            // far, tilted
            Vec3::new(-1.0, -1.0, 0.6),
            Vec3::new(3.0, -1.0, 0.6),
            Vec3::new(-1.0, 3.0, 0.9),
            // near, facing +Z
            Vec3::new(-1.0, -1.0, 0.2),
            Vec3::new(3.0, -1.0, 0.2),
            Vec3::new(-1.0, 3.0, 0.2),
        ];
        let indices = if near_first {
            vec![3, 4, 5, 0, 1, 2]
        } else {
            vec![0, 1, 2, 3, 4, 5]
        };
        MeshData::from_triangles(positions, indices)
    }

    #[test]
    fn nearer_triangle_wins_regardless_of_order() {
        let color = Vec4::new(1.0, 0.5, 0.25, 1.0);
        let expected = mesh_shade(color, Vec3::Z);
        for near_first in [false, true] {
            let mut image = CpuImage::new(8, 8);
            rasterize(&mut image, &layered_mesh(near_first), Mat4::IDENTITY, color);
            assert!(image.pixel(4, 4).abs_diff_eq(expected, 1e-5), "near_first = {near_first}");
        }
    }

    #[test]
    fn mesh_leaves_uncovered_pixels_alone() {
        let mut image = CpuImage::filled(8, 8, Vec4::ONE);
        let mesh = MeshData::from_triangles(
            vec![Vec3::new(-1.0, -1.0, 0.5), Vec3::new(0.0, -1.0, 0.5), Vec3::new(-1.0, 0.0, 0.5)],
            vec![0, 1, 2],
        );
        rasterize(&mut image, &mesh, Mat4::IDENTITY, Vec4::new(0.2, 0.2, 0.2, 1.0));
        assert_eq!(image.pixel(7, 0), Vec4::ONE);
        assert_ne!(image.pixel(0, 7), Vec4::ONE);
    }

    #[test]
    fn triangles_behind_the_camera_are_dropped() {
        let mut image = CpuImage::filled(8, 8, Vec4::ONE);
        let mesh = MeshData::from_triangles(
            vec![Vec3::new(-1.0, -1.0, 0.5), Vec3::new(3.0, -1.0, 0.5), Vec3::new(-1.0, 3.0, 0.5)],
            vec![0, 1, 2],
        );
        let flip_w = Mat4::from_diagonal(Vec4::new(1.0, 1.0, 1.0, -1.0));
        rasterize(&mut image, &mesh, flip_w, Vec4::ZERO);
        assert!(image.pixels().iter().all(|p| *p == Vec4::ONE));
    }
}
