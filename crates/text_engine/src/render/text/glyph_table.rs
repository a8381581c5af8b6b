//! Precomputed glyph tables
//!
//! A fixed table covers a contiguous ASCII window starting at the space
//! character. Anything outside the window has no glyph and is skipped by
//! layout. Tables come from an explicit glyph list, from a RON/TOML
//! descriptor, or are baked once from font bytes into a grid atlas.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::font_atlas::GlyphRasterizer;
use super::glyph::{FontError, FontResult, Glyph, GlyphSource};
use crate::config::ConfigFormat;
use crate::render::texture::{share_texture, SharedTexture, TextureFactory, TextureFormat};

/// First codepoint of a baked table (space)
pub const ASCII_START: u32 = 32;

/// Last codepoint of a baked table (tilde)
pub const ASCII_END: u32 = 126;

/// Serialized form of a glyph table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphTableDescriptor {
    /// Pixel size the metrics were produced at
    pub base_size: u32,
    /// Codepoint of the first glyph
    #[serde(default = "default_first_codepoint")]
    pub first_codepoint: u32,
    /// Consecutive glyphs starting at `first_codepoint`
    pub glyphs: Vec<Glyph>,
}

const fn default_first_codepoint() -> u32 {
    ASCII_START
}

/// Glyph source backed by a static table and atlas
pub struct FixedGlyphTable {
    base_size: u32,
    first_codepoint: u32,
    glyphs: Vec<Glyph>,
    atlas: Option<SharedTexture>,
}

impl FixedGlyphTable {
    /// Build a table from consecutive glyphs starting at `first_codepoint`
    pub fn new(
        base_size: u32,
        first_codepoint: u32,
        glyphs: Vec<Glyph>,
        atlas: Option<SharedTexture>,
    ) -> FontResult<Self> {
        if base_size == 0 {
            return Err(FontError::InvalidDescriptor("base size must be non-zero".to_string()));
        }
        if glyphs.is_empty() {
            return Err(FontError::InvalidDescriptor("glyph table is empty".to_string()));
        }

        for (offset, glyph) in glyphs.iter().enumerate() {
            let expected = char::from_u32(first_codepoint + offset as u32);
            if expected != Some(glyph.code) {
                return Err(FontError::InvalidDescriptor(format!(
                    "glyph {} is {:?}, expected {:?}",
                    offset, glyph.code, expected
                )));
            }
        }

        Ok(Self {
            base_size,
            first_codepoint,
            glyphs,
            atlas,
        })
    }

    /// Build a table from a parsed descriptor
    pub fn from_descriptor(descriptor: GlyphTableDescriptor, atlas: Option<SharedTexture>) -> FontResult<Self> {
        Self::new(descriptor.base_size, descriptor.first_codepoint, descriptor.glyphs, atlas)
    }

    /// Load a `.ron` or `.toml` descriptor from disk
    pub fn load_descriptor(path: impl AsRef<Path>, atlas: Option<SharedTexture>) -> FontResult<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(crate::config::ConfigError::Io)?;
        let descriptor: GlyphTableDescriptor = format.parse(&contents)?;
        log::info!("Loaded {} glyphs from {}", descriptor.glyphs.len(), path.display());
        Self::from_descriptor(descriptor, atlas)
    }

    /// Descriptor reproducing this table
    pub fn descriptor(&self) -> GlyphTableDescriptor {
        GlyphTableDescriptor {
            base_size: self.base_size,
            first_codepoint: self.first_codepoint,
            glyphs: self.glyphs.clone(),
        }
    }

    /// Rasterize printable ASCII into a grid atlas
    ///
    /// Glyphs are laid out sixteen to a row in equal cells; the atlas is
    /// sized to the next power of two that holds the grid.
    pub fn bake(rasterizer: &mut dyn GlyphRasterizer, textures: &mut dyn TextureFactory) -> FontResult<Self> {
        const GLYPHS_PER_ROW: u32 = 16;
        const GLYPH_COUNT: usize = (ASCII_END - ASCII_START + 1) as usize;

        let base_size = rasterizer.pixel_size();
        log::info!("Baking {} glyphs at {}px", GLYPH_COUNT, base_size);

        let mut rasterized = Vec::with_capacity(GLYPH_COUNT);
        let mut max_width = 1;
        for code_point in ASCII_START..=ASCII_END {
            let Some(ch) = char::from_u32(code_point) else {
                continue;
            };
            let raster = rasterizer
                .rasterize(ch)
                .ok_or_else(|| FontError::RasterizeError(ch, "face has no glyph".to_string()))?;
            max_width = max_width.max(raster.width);
            rasterized.push((ch, raster));
        }

        let cell_width = max_width + 1;
        let cell_height = base_size + 1;
        let rows = (rasterized.len() as u32).div_ceil(GLYPHS_PER_ROW);
        let atlas_width = (cell_width * GLYPHS_PER_ROW).next_power_of_two();
        let atlas_height = (cell_height * rows).next_power_of_two();

        let mut texture = textures.create(TextureFormat::R8, atlas_width, atlas_height)?;
        let mut glyphs = Vec::with_capacity(rasterized.len());

        for (index, (ch, raster)) in rasterized.into_iter().enumerate() {
            let index = index as u32;
            let x = (index % GLYPHS_PER_ROW) * cell_width;
            let y = (index / GLYPHS_PER_ROW) * cell_height;

            if raster.width > 0 {
                let rows = raster.height.min(base_size);
                let len = (raster.width * rows) as usize;
                texture.set_data(x, y, raster.width, rows, &raster.bitmap[..len])?;
            }

            glyphs.push(Glyph {
                code: ch,
                advance: raster.advance,
                bearing_x: raster.bearing_x,
                width: raster.width as f32,
                uvs: [
                    x as f32 / atlas_width as f32,
                    y as f32 / atlas_height as f32,
                    (x + raster.width) as f32 / atlas_width as f32,
                    (y + base_size) as f32 / atlas_height as f32,
                ],
            });
        }

        log::info!("Atlas packed: {}x{}, {} glyphs", atlas_width, atlas_height, glyphs.len());
        Self::new(base_size, ASCII_START, glyphs, Some(share_texture(texture)))
    }

    /// Number of glyphs in the table
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    fn index_of(&self, ch: char) -> Option<usize> {
        let offset = (ch as u32).checked_sub(self.first_codepoint)? as usize;
        (offset < self.glyphs.len()).then_some(offset)
    }
}

impl GlyphSource for FixedGlyphTable {
    fn base_size(&self) -> u32 {
        self.base_size
    }

    fn glyph(&mut self, ch: char) -> Option<Glyph> {
        self.index_of(ch).map(|index| self.glyphs[index])
    }

    fn contains(&self, _ch: char) -> bool {
        // Lookups never touch the atlas
        true
    }

    fn atlas(&self) -> Option<SharedTexture> {
        self.atlas.clone()
    }
}
