//! Named pass parameters.
//!
//! Each pass carries a small map of named values. The debug-panel collaborator
//! edits them through [`PassChain::set_uniform`](crate::renderer::PassChain::set_uniform);
//! effects read them back through the typed accessors when they resolve their
//! per-frame parameters.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::assets::TextureData;

/// Shared, immutable texture contents bound to a pass.
pub type TextureRef = Arc<TextureData>;

/// A single uniform value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    /// `None` until the texture has been loaded.
    Texture(Option<TextureRef>),
}

impl UniformValue {
    /// Variant name, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Texture(_) => "texture",
        }
    }

    #[inline]
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<TextureRef> for UniformValue {
    fn from(v: TextureRef) -> Self {
        Self::Texture(Some(v))
    }
}

/// Name → value map owned by one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms {
    values: FxHashMap<String, UniformValue>,
}

impl Uniforms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion used when declaring defaults.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Inserts or replaces a value without type checking.
    pub fn insert(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut UniformValue> {
        self.values.get_mut(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ── Typed reads with fallbacks ─────────────────────────────────────────

    #[must_use]
    pub fn float(&self, name: &str, fallback: f32) -> f32 {
        match self.values.get(name) {
            Some(UniformValue::Float(v)) => *v,
            Some(UniformValue::Int(v)) => *v as f32,
            _ => fallback,
        }
    }

    #[must_use]
    pub fn int(&self, name: &str, fallback: i32) -> i32 {
        match self.values.get(name) {
            Some(UniformValue::Int(v)) => *v,
            _ => fallback,
        }
    }

    #[must_use]
    pub fn flag(&self, name: &str, fallback: bool) -> bool {
        match self.values.get(name) {
            Some(UniformValue::Bool(v)) => *v,
            _ => fallback,
        }
    }

    #[must_use]
    pub fn vec2(&self, name: &str, fallback: Vec2) -> Vec2 {
        match self.values.get(name) {
            Some(UniformValue::Vec2(v)) => *v,
            _ => fallback,
        }
    }

    #[must_use]
    pub fn vec3(&self, name: &str, fallback: Vec3) -> Vec3 {
        match self.values.get(name) {
            Some(UniformValue::Vec3(v)) => *v,
            _ => fallback,
        }
    }

    #[must_use]
    pub fn texture(&self, name: &str) -> Option<&TextureRef> {
        match self.values.get(name) {
            Some(UniformValue::Texture(Some(t))) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads_fall_back_on_mismatch() {
        let u = Uniforms::new().with("strength", 0.5f32).with("wild", true);
        assert!((u.float("strength", 0.0) - 0.5).abs() < f32::EPSILON);
        assert!((u.float("wild", 2.0) - 2.0).abs() < f32::EPSILON);
        assert!(u.flag("wild", false));
        assert!(u.texture("missing").is_none());
        assert_eq!(u.len(), 2);
        assert!(Uniforms::new().is_empty());
    }
}
