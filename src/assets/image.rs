//! CPU-side texture contents.
//!
//! Decoded images are kept as tightly packed RGBA8 so they can be sampled by
//! the software backend and uploaded verbatim by the wgpu backend.

use glam::{Vec2, Vec4};

use crate::renderer::surface::ColorSpace;

/// Decoded 2D image (or one cube face).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    /// Row-major RGBA8, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl TextureData {
    /// Wraps raw RGBA8 bytes. Returns `None` if the byte count does not match.
    #[must_use]
    pub fn from_rgba8(
        label: impl Into<String>,
        width: u32,
        height: u32,
        color_space: ColorSpace,
        data: Vec<u8>,
    ) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 || width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            label: label.into(),
            width,
            height,
            color_space,
            data,
        })
    }

    /// Single-color texture, handy as a neutral binding.
    #[must_use]
    pub fn solid(label: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            label: label.into(),
            width: 1,
            height: 1,
            color_space: ColorSpace::Linear,
            data: rgba.to_vec(),
        }
    }

    /// Texel at integer coordinates, clamped to the edge, in `[0, 1]`.
    #[must_use]
    pub fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        Vec4::new(
            f32::from(self.data[i]),
            f32::from(self.data[i + 1]),
            f32::from(self.data[i + 2]),
            f32::from(self.data[i + 3]),
        ) / 255.0
    }

    /// Bilinear sample with clamp-to-edge addressing. `uv` origin is top-left.
    #[must_use]
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    /// Mean color over all texels.
    #[must_use]
    pub fn average(&self) -> Vec4 {
        let count = (self.width * self.height) as f32;
        let sum = self
            .data
            .chunks_exact(4)
            .fold(Vec4::ZERO, |acc, px| {
                acc + Vec4::new(
                    f32::from(px[0]),
                    f32::from(px[1]),
                    f32::from(px[2]),
                    f32::from(px[3]),
                )
            });
        sum / (255.0 * count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_length() {
        assert!(TextureData::from_rgba8("t", 2, 2, ColorSpace::Srgb, vec![0; 15]).is_none());
    }

    #[test]
    fn bilinear_midpoint() {
        let tex = TextureData::from_rgba8(
            "t",
            2,
            1,
            ColorSpace::Linear,
            vec![0, 0, 0, 255, 255, 255, 255, 255],
        )
        .unwrap();
        let mid = tex.sample(Vec2::new(0.5, 0.5));
        assert!((mid.x - 0.5).abs() < 1e-3);
    }
}
