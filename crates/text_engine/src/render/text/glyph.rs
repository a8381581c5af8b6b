//! Glyphs and the sources that supply them
//!
//! A [`GlyphSource`] maps characters to [`Glyph`]s at its native pixel size.
//! Layout code scales metrics itself, so one source serves every requested
//! size that resolves to its font variant.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::render::texture::{SharedTexture, TextureError};

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Failed to load font from file or data
    #[error("Failed to load font: {0}")]
    LoadError(String),

    /// Failed to rasterize a specific glyph character
    #[error("Failed to rasterize glyph '{0}': {1}")]
    RasterizeError(char, String),

    /// Failed to create or upload the atlas texture
    #[error("Failed to create atlas texture: {0}")]
    AtlasCreationError(String),

    /// The atlas cannot grow to hold another glyph row
    #[error("Atlas full: {requested}px tall atlas exceeds the {max}px limit")]
    AtlasFull {
        /// Height the atlas would need
        requested: u32,
        /// Configured ceiling
        max: u32,
    },

    /// Requested character has no glyph in this source
    #[error("Character '{0}' not found in font")]
    GlyphNotFound(char),

    /// The glyph failed to pack earlier and is not retried
    #[error("Glyph '{0}' does not fit the atlas")]
    GlyphRejected(char),

    /// A family already holds a variant of this size
    #[error("Font family '{family}' already has a {size}px variant")]
    DuplicateSize {
        /// Family name
        family: String,
        /// Offending size
        size: u32,
    },

    /// A variant's family name or style does not match its family
    #[error("Variant '{variant}' does not belong to family '{family}'")]
    FamilyMismatch {
        /// Family being extended
        family: String,
        /// Family named by the variant
        variant: String,
    },

    /// Glyph table description is inconsistent
    #[error("Invalid glyph table: {0}")]
    InvalidDescriptor(String),

    /// Descriptor or settings file could not be read
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Texture primitive failed
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Metrics and atlas placement of one character
///
/// Metrics are in pixels at the source's base size. The UV rectangle covers a
/// full line-height cell, so a glyph quad is always one line tall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Character this glyph renders
    pub code: char,
    /// Horizontal advance for cursor positioning
    pub advance: f32,
    /// Offset from the pen to the left edge of the bitmap
    pub bearing_x: f32,
    /// Bitmap width
    pub width: f32,
    /// Atlas coordinates `[u0, v0, u1, v1]`
    pub uvs: [f32; 4],
}

impl Glyph {
    /// Pen advance at `scale`, floored to whole pixels
    ///
    /// Every pass (draw, measure, hit-test) accumulates exactly this value.
    pub fn scaled_advance(&self, scale: f32, spacing: i32) -> i32 {
        (self.advance * scale + spacing as f32).floor() as i32
    }

    /// Rescale the vertical UVs after the atlas height changed
    pub(crate) fn rescale_v(&mut self, factor: f32) {
        self.uvs[1] *= factor;
        self.uvs[3] *= factor;
    }
}

/// Supplies glyph metrics and atlas coordinates for characters
///
/// Sources hold mutable packing state, so a source (and the font owning it)
/// must only be used from the render thread, one call at a time.
pub trait GlyphSource {
    /// Pixel size the glyph metrics are expressed in
    fn base_size(&self) -> u32;

    /// Glyph for `ch`, rendering it on first use if the source can
    ///
    /// `None` means the character is unsupported; callers skip it.
    fn glyph(&mut self, ch: char) -> Option<Glyph>;

    /// Whether `glyph` would answer without touching the atlas
    fn contains(&self, ch: char) -> bool;

    /// Atlas the glyph UVs point into
    fn atlas(&self) -> Option<SharedTexture>;

    /// Counter bumped every time the atlas storage is reallocated
    fn atlas_generation(&self) -> u64 {
        0
    }

    /// Make every character of `text` resident, returning how many were added
    ///
    /// Tabs and line breaks never have glyphs and are skipped.
    fn preload(&mut self, text: &str) -> usize {
        let mut added = 0;
        for ch in text.chars().filter(|ch| !matches!(ch, '\t' | '\r' | '\n')) {
            if !self.contains(ch) && self.glyph(ch).is_some() {
                added += 1;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_advance_floors() {
        let glyph = Glyph {
            code: 'a',
            advance: 7.0,
            bearing_x: 0.0,
            width: 6.0,
            uvs: [0.0, 0.0, 0.1, 0.1],
        };

        assert_eq!(glyph.scaled_advance(1.0, 0), 7);
        assert_eq!(glyph.scaled_advance(0.5, 0), 3);
        assert_eq!(glyph.scaled_advance(1.5, 1), 11);
    }

    #[test]
    fn test_rescale_v_only_touches_v() {
        let mut glyph = Glyph {
            code: 'b',
            advance: 8.0,
            bearing_x: 1.0,
            width: 6.0,
            uvs: [0.25, 0.5, 0.5, 1.0],
        };
        glyph.rescale_v(0.5);
        assert_eq!(glyph.uvs, [0.25, 0.25, 0.5, 0.5]);
    }
}
