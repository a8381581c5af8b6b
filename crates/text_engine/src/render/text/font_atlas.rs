//! Font atlas system for text rendering
//!
//! Glyphs are rasterized on demand and packed into a growable texture atlas.
//! Rasterization goes through [`GlyphRasterizer`]; [`FontdueRasterizer`] is the
//! pure Rust implementation backed by `fontdue`.
//!
//! Packing works in rows one line tall: glyphs go left to right, a glyph that
//! does not fit starts a new row, and a row that does not fit doubles the
//! atlas height. The width never changes. Space is never reclaimed.

use std::collections::{HashMap, HashSet};

use fontdue::{Font, FontSettings};

use super::glyph::{FontError, FontResult, Glyph, GlyphSource};
use crate::core::config::AtlasConfig;
use crate::render::texture::{share_texture, SharedTexture, TextureFactory, TextureFormat};

/// A glyph bitmap placed in a line-height cell
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    /// Horizontal advance in pixels
    pub advance: f32,
    /// Offset from the pen to the bitmap's left edge
    pub bearing_x: f32,
    /// Bitmap width
    pub width: u32,
    /// Bitmap height (one cell, the rasterizer's pixel size)
    pub height: u32,
    /// Coverage values, `width * height`, baseline-aligned inside the cell
    pub bitmap: Vec<u8>,
}

/// Renders glyph outlines into coverage bitmaps
pub trait GlyphRasterizer {
    /// Size cells are rendered at
    fn pixel_size(&self) -> u32;

    /// Change the size future glyphs are rendered at
    fn set_pixel_size(&mut self, size: u32);

    /// Render `ch`, or `None` when the face has no glyph for it
    fn rasterize(&mut self, ch: char) -> Option<RasterizedGlyph>;
}

/// Rasterizer backed by a `fontdue` face
pub struct FontdueRasterizer {
    /// Underlying fontdue font
    font: Font,

    /// Cell height in pixels
    pixel_size: u32,

    /// Baseline distance from the top of a cell
    baseline: i32,
}

impl FontdueRasterizer {
    /// Parse TrueType/OpenType bytes into a face rendering at `pixel_size`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use text_engine::render::text::FontdueRasterizer;
    ///
    /// let font_bytes = std::fs::read("resources/fonts/default.ttf")?;
    /// let rasterizer = FontdueRasterizer::create_face(&font_bytes, 24)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn create_face(font_data: &[u8], pixel_size: u32) -> FontResult<Self> {
        if font_data.is_empty() {
            return Err(FontError::LoadError("empty font data".to_string()));
        }

        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| FontError::LoadError(format!("fontdue error: {}", e)))?;

        let mut rasterizer = Self {
            font,
            pixel_size: 0,
            baseline: 0,
        };
        rasterizer.set_pixel_size(pixel_size);

        log::info!("Loaded font face at {}px", pixel_size);
        Ok(rasterizer)
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    fn set_pixel_size(&mut self, size: u32) {
        let size = size.max(1);
        self.pixel_size = size;

        // Scale ascent/descent so the whole line fits in one cell
        let px = size as f32;
        self.baseline = match self.font.horizontal_line_metrics(px) {
            Some(metrics) if metrics.ascent - metrics.descent > 0.0 => {
                (px * metrics.ascent / (metrics.ascent - metrics.descent)).round() as i32
            }
            _ => (px * 0.8).round() as i32,
        };
    }

    fn rasterize(&mut self, ch: char) -> Option<RasterizedGlyph> {
        if self.font.lookup_glyph_index(ch) == 0 {
            return None;
        }

        let (metrics, bitmap) = self.font.rasterize(ch, self.pixel_size as f32);
        let width = metrics.width;
        let cell_height = self.pixel_size as usize;
        let mut cell = vec![0u8; width * cell_height];

        // fontdue measures ymin from the baseline up to the bitmap bottom
        let top = self.baseline - (metrics.ymin + metrics.height as i32);
        for row in 0..metrics.height {
            let cell_row = top + row as i32;
            if cell_row < 0 || cell_row >= cell_height as i32 {
                continue;
            }
            let src = &bitmap[row * width..(row + 1) * width];
            let dst_start = cell_row as usize * width;
            cell[dst_start..dst_start + width].copy_from_slice(src);
        }

        Some(RasterizedGlyph {
            advance: metrics.advance_width,
            bearing_x: metrics.xmin as f32,
            width: width as u32,
            height: self.pixel_size,
            bitmap: cell,
        })
    }
}

/// Glyph source that renders glyphs into a growable atlas on first use
///
/// Cached glyphs are never evicted. UVs are relative to the current atlas
/// height, so every cached glyph is rescaled when the atlas grows.
pub struct DynamicGlyphSource {
    rasterizer: Box<dyn GlyphRasterizer>,
    textures: Box<dyn TextureFactory>,

    /// Handle to the atlas texture
    atlas: SharedTexture,

    /// Glyph information lookup
    glyph_cache: HashMap<char, Glyph>,

    /// Characters the face has no glyph for
    missing: HashSet<char>,

    /// Characters that can never be packed; the atlas only grows to its ceiling
    rejected: HashSet<char>,

    config: AtlasConfig,

    /// Packing pen
    pen_x: u32,
    pen_y: u32,

    /// Height of every packed row
    row_height: u32,

    generation: u64,
}

impl DynamicGlyphSource {
    /// Create an empty atlas for `rasterizer`
    pub fn new(
        rasterizer: Box<dyn GlyphRasterizer>,
        mut textures: Box<dyn TextureFactory>,
        config: AtlasConfig,
    ) -> FontResult<Self> {
        config.validate().map_err(FontError::AtlasCreationError)?;

        let row_height = rasterizer.pixel_size();
        if row_height + config.padding > config.max_size {
            return Err(FontError::AtlasCreationError(format!(
                "{}px rows cannot fit a {}px atlas",
                row_height, config.max_size
            )));
        }

        let texture = textures.create(TextureFormat::R8, config.initial_width, config.initial_height)?;
        log::info!(
            "Created {}x{} glyph atlas for {}px glyphs",
            config.initial_width,
            config.initial_height,
            row_height
        );

        Ok(Self {
            rasterizer,
            textures,
            atlas: share_texture(texture),
            glyph_cache: HashMap::new(),
            missing: HashSet::new(),
            rejected: HashSet::new(),
            config,
            pen_x: 0,
            pen_y: 0,
            row_height,
            generation: 0,
        })
    }

    /// Get atlas dimensions
    pub fn atlas_dimensions(&self) -> (u32, u32) {
        let atlas = self.atlas.borrow();
        (atlas.width(), atlas.height())
    }

    /// Current packing pen position
    pub fn pen(&self) -> (u32, u32) {
        (self.pen_x, self.pen_y)
    }

    /// Number of glyphs in the atlas
    pub fn glyph_count(&self) -> usize {
        self.glyph_cache.len()
    }

    /// Cached glyph without rasterizing
    pub fn cached_glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyph_cache.get(&ch)
    }

    /// Rasterize `ch` into the atlas, or return the cached glyph
    pub fn insert_glyph(&mut self, ch: char) -> FontResult<Glyph> {
        if let Some(glyph) = self.glyph_cache.get(&ch) {
            return Ok(*glyph);
        }
        if self.missing.contains(&ch) {
            return Err(FontError::GlyphNotFound(ch));
        }
        if self.rejected.contains(&ch) {
            return Err(FontError::GlyphRejected(ch));
        }

        let Some(raster) = self.rasterizer.rasterize(ch) else {
            self.missing.insert(ch);
            return Err(FontError::GlyphNotFound(ch));
        };

        match self.pack(ch, &raster) {
            Err(e @ (FontError::AtlasFull { .. } | FontError::RasterizeError(..))) => {
                self.rejected.insert(ch);
                Err(e)
            }
            result => result,
        }
    }

    fn pack(&mut self, ch: char, raster: &RasterizedGlyph) -> FontResult<Glyph> {
        let atlas_width = self.atlas.borrow().width();
        if raster.width > atlas_width {
            return Err(FontError::RasterizeError(
                ch,
                format!("{}px wide glyph exceeds {}px atlas", raster.width, atlas_width),
            ));
        }

        // Wrap to the next row
        let mut pen_y = self.pen_y;
        let mut pen_x = self.pen_x;
        if pen_x + raster.width > atlas_width {
            pen_x = 0;
            pen_y += self.row_height + self.config.padding;
        }

        if pen_y + self.row_height > self.atlas.borrow().height() {
            self.grow(pen_y + self.row_height)?;
        }

        self.upload(raster, pen_x, pen_y)?;

        let (width, height) = self.atlas_dimensions();
        let glyph = Glyph {
            code: ch,
            advance: raster.advance,
            bearing_x: raster.bearing_x,
            width: raster.width as f32,
            uvs: [
                pen_x as f32 / width as f32,
                pen_y as f32 / height as f32,
                (pen_x + raster.width) as f32 / width as f32,
                (pen_y + self.row_height) as f32 / height as f32,
            ],
        };

        self.pen_x = pen_x + raster.width + self.config.padding;
        self.pen_y = pen_y;
        self.glyph_cache.insert(ch, glyph);
        log::trace!("Packed glyph {:?} at ({}, {})", ch, pen_x, pen_y);

        Ok(glyph)
    }

    /// Double the atlas height until `required` rows fit
    fn grow(&mut self, required: u32) -> FontResult<()> {
        let (width, old_height) = self.atlas_dimensions();
        let mut new_height = old_height;
        while new_height < required {
            new_height = new_height.saturating_mul(2);
        }

        if new_height > self.config.max_size {
            log::warn!(
                "Glyph atlas cannot grow to {}px (limit {}px)",
                new_height,
                self.config.max_size
            );
            return Err(FontError::AtlasFull {
                requested: new_height,
                max: self.config.max_size,
            });
        }

        let format = self.atlas.borrow().format();
        let mut texture = self.textures.create(format, width, new_height)?;
        texture.copy_region(&**self.atlas.borrow(), 0, 0, width, old_height)?;
        *self.atlas.borrow_mut() = texture;

        // Pixels stay put, so v shrinks with the taller texture
        let factor = old_height as f32 / new_height as f32;
        for glyph in self.glyph_cache.values_mut() {
            glyph.rescale_v(factor);
        }

        self.generation += 1;
        log::info!("Glyph atlas grew from {}x{} to {}x{}", width, old_height, width, new_height);
        Ok(())
    }

    fn upload(&mut self, raster: &RasterizedGlyph, x: u32, y: u32) -> FontResult<()> {
        if raster.width == 0 {
            return Ok(());
        }

        let rows = raster.height.min(self.row_height) as usize;
        let width = raster.width as usize;
        let mut cell = vec![0u8; width * self.row_height as usize];
        let copy = (rows * width).min(raster.bitmap.len());
        cell[..copy].copy_from_slice(&raster.bitmap[..copy]);

        self.atlas
            .borrow_mut()
            .set_data(x, y, raster.width, self.row_height, &cell)?;
        Ok(())
    }
}

impl GlyphSource for DynamicGlyphSource {
    fn base_size(&self) -> u32 {
        self.row_height
    }

    fn glyph(&mut self, ch: char) -> Option<Glyph> {
        match self.insert_glyph(ch) {
            Ok(glyph) => Some(glyph),
            Err(FontError::GlyphNotFound(_) | FontError::GlyphRejected(_)) => None,
            Err(e) => {
                log::warn!("Glyph {:?} unavailable: {}", ch, e);
                None
            }
        }
    }

    fn contains(&self, ch: char) -> bool {
        self.glyph_cache.contains_key(&ch) || self.missing.contains(&ch) || self.rejected.contains(&ch)
    }

    fn atlas(&self) -> Option<SharedTexture> {
        Some(SharedTexture::clone(&self.atlas))
    }

    fn atlas_generation(&self) -> u64 {
        self.generation
    }
}
