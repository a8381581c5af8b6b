//! Shared text effects
//!
//! Every font variant draws through a text shader effect, and all fonts of
//! the same format can share one. The registry creates an effect the first
//! time it is acquired and hands out shared references after that. Once the
//! last holder drops its reference the effect is released and the next
//! acquire creates a fresh one.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

/// Glyph image encoding, which decides the shader used to draw it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFormat {
    /// Plain coverage bitmaps
    #[default]
    Bitmap,
    /// Signed distance fields, sharp at any scale
    DistanceField,
}

/// Shader effect used by a sprite batch to draw glyph quads
#[derive(Debug, PartialEq, Eq)]
pub struct TextEffect {
    /// Unique id of this effect instance
    pub id: u64,
    /// Format the effect samples
    pub format: FontFormat,
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
    /// Preprocessor defines the shaders are compiled with
    pub defines: Vec<String>,
}

/// Registry handing out one shared effect per font format
#[derive(Debug, Default)]
pub struct EffectRegistry {
    effects: HashMap<FontFormat, Weak<TextEffect>>,
    next_id: u64,
}

impl EffectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the effect for `format`, creating it if no live one exists
    pub fn acquire(&mut self, format: FontFormat) -> Rc<TextEffect> {
        if let Some(effect) = self.effects.get(&format).and_then(Weak::upgrade) {
            return effect;
        }

        self.next_id += 1;
        let defines = match format {
            FontFormat::Bitmap => Vec::new(),
            FontFormat::DistanceField => vec!["DISTANCE_FIELD".to_string()],
        };
        let effect = Rc::new(TextEffect {
            id: self.next_id,
            format,
            vertex_shader_path: "shaders/text.vert.spv".to_string(),
            fragment_shader_path: "shaders/text.frag.spv".to_string(),
            defines,
        });

        log::debug!("Created text effect {} for {:?}", effect.id, format);
        self.effects.insert(format, Rc::downgrade(&effect));
        effect
    }

    /// Whether an effect for `format` is currently held by someone
    pub fn is_live(&self, format: FontFormat) -> bool {
        self.effects
            .get(&format)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Number of references held to the effect for `format`
    pub fn holders(&self, format: FontFormat) -> usize {
        self.effects.get(&format).map_or(0, Weak::strong_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_shares_one_instance() {
        let mut registry = EffectRegistry::new();
        let a = registry.acquire(FontFormat::Bitmap);
        let b = registry.acquire(FontFormat::Bitmap);

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(registry.holders(FontFormat::Bitmap), 2);
        assert!(!registry.is_live(FontFormat::DistanceField));
    }

    #[test]
    fn test_release_then_reacquire_creates_new_effect() {
        let mut registry = EffectRegistry::new();
        let first = registry.acquire(FontFormat::DistanceField);
        let first_id = first.id;
        assert_eq!(first.defines, vec!["DISTANCE_FIELD".to_string()]);
        drop(first);

        assert!(!registry.is_live(FontFormat::DistanceField));
        let second = registry.acquire(FontFormat::DistanceField);
        assert_ne!(second.id, first_id);
    }
}
