//! Font size variants
//!
//! A [`Font`] is one concrete size of a font family: a glyph source, the
//! sprite batch its quads go to and the text effect that draws them. Every
//! text operation lives here; [`FontFamily`](super::font_family::FontFamily)
//! only decides which variant runs it.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::caret::CaretIndexMapper;
use super::emitter::GlyphEmitter;
use super::font_atlas::{DynamicGlyphSource, FontdueRasterizer};
use super::glyph::{FontResult, GlyphSource};
use super::justify::Justify;
use super::text_layout::{is_line_break, GlyphMetrics, LineBreaker, PixelArea};
use super::walker::{LayoutWalker, WalkParams};
use crate::core::config::TextConfig;
use crate::foundation::math::{Rect, Vec2, Vec4};
use crate::render::batch::SpriteBatch;
use crate::render::effect::{EffectRegistry, FontFormat, TextEffect};
use crate::render::texture::{SharedTexture, TextureFactory};

/// Weight and slant of a font family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontStyle {
    /// Regular weight, upright
    #[default]
    Plain,
    /// Bold weight
    Bold,
    /// Slanted
    Italic,
    /// Bold and slanted
    BoldItalic,
}

/// One size of a font family
pub struct Font {
    family: String,
    style: FontStyle,
    source: Box<dyn GlyphSource>,
    batch: Box<dyn SpriteBatch>,
    effect: Rc<TextEffect>,
    config: TextConfig,
    character_spacing: f32,
}

impl Font {
    /// Create a variant drawing `source` glyphs through `batch`
    ///
    /// The text effect for `format` is acquired from `effects` and shared with
    /// every other live variant of the same format.
    pub fn new(
        family: impl Into<String>,
        style: FontStyle,
        format: FontFormat,
        source: Box<dyn GlyphSource>,
        batch: Box<dyn SpriteBatch>,
        effects: &mut EffectRegistry,
        config: TextConfig,
    ) -> Self {
        let family = family.into();
        log::info!(
            "Created {}px {:?} {:?} font '{}'",
            source.base_size(),
            style,
            format,
            family
        );

        Self {
            family,
            style,
            source,
            batch,
            effect: effects.acquire(format),
            character_spacing: config.character_spacing,
            config,
        }
    }

    /// Create a variant that rasterizes `font_data` at `size` on demand
    pub fn from_font_data(
        family: impl Into<String>,
        style: FontStyle,
        font_data: &[u8],
        size: u32,
        textures: Box<dyn TextureFactory>,
        batch: Box<dyn SpriteBatch>,
        effects: &mut EffectRegistry,
        config: TextConfig,
    ) -> FontResult<Self> {
        let rasterizer = FontdueRasterizer::create_face(font_data, size)?;
        let source = DynamicGlyphSource::new(Box::new(rasterizer), textures, config.atlas)?;
        Ok(Self::new(family, style, FontFormat::Bitmap, Box::new(source), batch, effects, config))
    }

    /// Family name
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Weight and slant
    pub fn style(&self) -> FontStyle {
        self.style
    }

    /// Glyph image format
    pub fn format(&self) -> FontFormat {
        self.effect.format
    }

    /// Shared effect this variant draws with
    pub fn effect(&self) -> &Rc<TextEffect> {
        &self.effect
    }

    /// Pixel size the glyph source was built for
    pub fn base_size(&self) -> u32 {
        self.source.base_size()
    }

    /// Extra spacing after each glyph, as a fraction of the drawn size
    pub fn character_spacing(&self) -> f32 {
        self.character_spacing
    }

    /// Set the extra spacing after each glyph
    pub fn set_character_spacing(&mut self, spacing: f32) {
        self.character_spacing = spacing;
    }

    /// Whether `ch` can be drawn, rasterizing it if needed
    pub fn is_character_supported(&mut self, ch: char) -> bool {
        self.ensure_resident(&ch.to_string());
        self.source.glyph(ch).is_some()
    }

    /// Atlas the glyph quads sample
    pub fn atlas(&self) -> Option<SharedTexture> {
        self.source.atlas()
    }

    /// Batch the glyph quads are drawn into
    pub fn batch(&self) -> &dyn SpriteBatch {
        self.batch.as_ref()
    }

    /// Mutable access to the batch, e.g. to set its projection
    pub fn batch_mut(&mut self) -> &mut dyn SpriteBatch {
        self.batch.as_mut()
    }

    /// Begin a batch explicitly
    ///
    /// Drawing starts the batch on its own; starting it up front lets
    /// several draw calls share one flush.
    pub fn start(&mut self) {
        if !self.batch.is_started() {
            self.batch.start();
        }
    }

    /// Flush the batch if it was started
    pub fn finish(&mut self) {
        if self.batch.is_started() {
            self.batch.finish();
        }
    }

    /// Size a request draws at; 0 means the base size
    pub fn resolve_size(&self, size: u32) -> u32 {
        if size == 0 {
            self.base_size()
        } else {
            size
        }
    }

    /// Draw unwrapped text with its top-left corner at `position`
    pub fn draw_text(&mut self, text: &str, position: Vec2, color: Vec4, size: u32, right_to_left: bool) {
        let mut params = WalkParams::at_point(position.x as i32, position.y as i32);
        params.right_to_left = right_to_left;
        self.emit(text, color, size, params, None);
    }

    /// Draw text laid out inside `area`
    ///
    /// Glyphs crossing the right edge end their line, lines below the bottom
    /// edge are dropped, and quads are cropped to `clip` when given.
    pub fn draw_text_in_area(
        &mut self,
        text: &str,
        area: &Rect,
        color: Vec4,
        size: u32,
        justify: Justify,
        wrap: bool,
        right_to_left: bool,
        clip: Option<Rect>,
    ) {
        let params = area_params(area, justify, wrap, right_to_left, true);
        self.emit(text, color, size, params, clip);
    }

    fn emit(&mut self, text: &str, color: Vec4, size: u32, params: WalkParams, clip: Option<Rect>) {
        if text.is_empty() {
            return;
        }
        self.ensure_resident(text);

        let chars: Vec<char> = text.chars().collect();
        let size = self.resolve_size(size);
        let mut metrics = GlyphMetrics::new(self.source.as_mut(), size, self.character_spacing, &self.config);
        GlyphEmitter::new(self.batch.as_mut(), color, clip).emit(&chars, &mut metrics, params);
    }

    /// Width and height of unwrapped text
    ///
    /// Width is the widest line; height is one line per line break plus one.
    pub fn measure_text(&mut self, text: &str, size: u32) -> (i32, i32) {
        if text.is_empty() {
            return (0, 0);
        }
        self.ensure_resident(text);

        let chars: Vec<char> = text.chars().collect();
        let size = self.resolve_size(size);
        let mut metrics = GlyphMetrics::new(self.source.as_mut(), size, self.character_spacing, &self.config);

        let (width, lines) = LineBreaker::new(&chars, i32::MAX, false)
            .lines(&mut metrics)
            .fold((0, 0), |(width, lines), line| (width.max(line.width), lines + 1));
        (width, lines * size as i32)
    }

    /// Bounding rectangle of text laid out inside `area`
    ///
    /// Unless `ignore_clip` is set the layout is truncated like drawing and
    /// the result is clamped to the area. Empty text measures as an empty
    /// rectangle at the area's origin.
    pub fn measure_text_in_area(
        &mut self,
        text: &str,
        area: &Rect,
        size: u32,
        justify: Justify,
        wrap: bool,
        ignore_clip: bool,
    ) -> Rect {
        let empty = Rect::new(area.x, area.y, 0.0, 0.0);
        if text.is_empty() {
            return empty;
        }
        self.ensure_resident(text);

        let chars: Vec<char> = text.chars().collect();
        let size = self.resolve_size(size);
        let mut metrics = GlyphMetrics::new(self.source.as_mut(), size, self.character_spacing, &self.config);
        let params = area_params(area, justify, wrap, false, !ignore_clip);

        let Some(bounds) = LayoutWalker::new(&chars, &mut metrics, params).bounds() else {
            return empty;
        };
        if ignore_clip {
            bounds
        } else {
            bounds.intersection(area).unwrap_or(empty)
        }
    }

    /// Character index under `point`, or `None` if nothing is near it
    pub fn index_at_location(
        &mut self,
        text: &str,
        area: &Rect,
        size: u32,
        point: Vec2,
        justify: Justify,
        wrap: bool,
        right_to_left: bool,
    ) -> Option<usize> {
        self.ensure_resident(text);

        let chars: Vec<char> = text.chars().collect();
        let size = self.resolve_size(size);
        let mut metrics = GlyphMetrics::new(self.source.as_mut(), size, self.character_spacing, &self.config);
        let params = area_params(area, justify, wrap, right_to_left, true);
        CaretIndexMapper::new(&chars, &mut metrics, params).index_at_location(point)
    }

    /// Top-left corner of the caret cell for `index`
    ///
    /// `index` may equal the text length, which places the caret after the
    /// last character.
    pub fn location_at_index(
        &mut self,
        text: &str,
        area: &Rect,
        size: u32,
        index: usize,
        justify: Justify,
        wrap: bool,
        right_to_left: bool,
    ) -> Option<Vec2> {
        self.ensure_resident(text);

        let chars: Vec<char> = text.chars().collect();
        let size = self.resolve_size(size);
        let mut metrics = GlyphMetrics::new(self.source.as_mut(), size, self.character_spacing, &self.config);
        let params = area_params(area, justify, wrap, right_to_left, true);
        CaretIndexMapper::new(&chars, &mut metrics, params).location_at_index(index)
    }

    /// Make every glyph of `text` resident before a pass uses it
    ///
    /// Rasterizing can grow the atlas and move every glyph's UVs, so a
    /// started batch is flushed first; its quads would sample stale
    /// coordinates otherwise.
    fn ensure_resident(&mut self, text: &str) {
        let missing = text
            .chars()
            .chain(std::iter::once(' '))
            .any(|ch| ch != '\t' && !is_line_break(ch) && !self.source.contains(ch));
        if !missing {
            return;
        }

        if self.batch.is_started() {
            log::debug!("Flushing '{}' batch before adding glyphs", self.family);
            self.batch.finish();
        }

        let generation = self.source.atlas_generation();
        let added = self.source.preload(text) + self.source.preload(" ");
        if self.source.atlas_generation() != generation {
            log::debug!("'{}' atlas reallocated while adding {} glyphs", self.family, added);
        }
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("family", &self.family)
            .field("style", &self.style)
            .field("format", &self.format())
            .field("base_size", &self.base_size())
            .field("character_spacing", &self.character_spacing)
            .finish_non_exhaustive()
    }
}

fn area_params(area: &Rect, justify: Justify, wrap: bool, right_to_left: bool, clip_to_area: bool) -> WalkParams {
    WalkParams {
        area: PixelArea::from_rect(area),
        justify,
        wrap,
        right_to_left,
        clip_to_area,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::batch::QuadBatch;
    use crate::render::text::font_atlas::tests::BoxRasterizer;
    use crate::render::text::glyph_table::tests::monospace_glyphs;
    use crate::render::text::glyph_table::{FixedGlyphTable, ASCII_START};
    use crate::render::texture::CpuTextureFactory;

    fn white() -> Vec4 {
        Vec4::new(1.0, 1.0, 1.0, 1.0)
    }

    fn table_font(effects: &mut EffectRegistry) -> Font {
        let table = FixedGlyphTable::new(10, ASCII_START, monospace_glyphs(10.0), None).unwrap();
        Font::new(
            "Mono",
            FontStyle::Plain,
            FontFormat::Bitmap,
            Box::new(table),
            Box::new(QuadBatch::new()),
            effects,
            TextConfig::default(),
        )
    }

    #[test]
    fn test_variants_share_effect() {
        let mut effects = EffectRegistry::new();
        let a = table_font(&mut effects);
        let b = table_font(&mut effects);
        assert!(Rc::ptr_eq(a.effect(), b.effect()));
        assert_eq!(effects.holders(FontFormat::Bitmap), 2);

        drop(a);
        drop(b);
        assert!(!effects.is_live(FontFormat::Bitmap));
    }

    #[test]
    fn test_measure_text() {
        let mut effects = EffectRegistry::new();
        let mut font = table_font(&mut effects);
        assert_eq!(font.measure_text("", 10), (0, 0));
        assert_eq!(font.measure_text("AB\nCDE", 10), (30, 20));
        assert_eq!(font.measure_text("AB\nCDE", 0), (30, 20));
        assert_eq!(font.measure_text("AB", 20), (40, 20));
    }

    #[test]
    fn test_character_spacing_widens_text() {
        let mut effects = EffectRegistry::new();
        let mut font = table_font(&mut effects);
        font.set_character_spacing(0.1);
        // 10px advance plus 1px spacing per glyph
        assert_eq!(font.measure_text("AB", 10), (22, 10));
    }

    #[test]
    fn test_measure_text_in_area_clamps_unless_ignored() {
        let mut effects = EffectRegistry::new();
        let mut font = table_font(&mut effects);
        let area = Rect::new(0.0, 0.0, 25.0, 15.0);

        let clipped = font.measure_text_in_area("AAAA\nBB", &area, 10, Justify::ALIGN_TOP_LEFT, false, false);
        assert_eq!(clipped, Rect::new(0.0, 0.0, 20.0, 10.0));

        let full = font.measure_text_in_area("AAAA\nBB", &area, 10, Justify::ALIGN_TOP_LEFT, false, true);
        assert_eq!(full, Rect::new(0.0, 0.0, 40.0, 20.0));
    }

    #[test]
    fn test_explicit_start_and_finish() {
        let mut effects = EffectRegistry::new();
        let mut font = table_font(&mut effects);

        font.start();
        font.draw_text("AB", Vec2::new(0.0, 0.0), white(), 10, false);
        font.draw_text("CD", Vec2::new(0.0, 10.0), white(), 10, false);
        assert!(font.batch().is_started());
        font.finish();
        assert!(!font.batch().is_started());
    }

    #[test]
    fn test_draw_flushes_before_new_glyphs() {
        let mut effects = EffectRegistry::new();
        let rasterizer = BoxRasterizer::new(16, 8.0);
        let source = DynamicGlyphSource::new(
            Box::new(rasterizer),
            Box::new(CpuTextureFactory),
            TextConfig::default().atlas,
        )
        .unwrap();
        let mut font = Font::new(
            "Boxes",
            FontStyle::Bold,
            FontFormat::Bitmap,
            Box::new(source),
            Box::new(QuadBatch::new()),
            &mut effects,
            TextConfig::default(),
        );

        font.start();
        font.draw_text("ab", Vec2::new(0.0, 0.0), white(), 0, false);
        font.draw_text("ab", Vec2::new(0.0, 16.0), white(), 0, false);
        assert!(font.batch().is_started());

        font.draw_text("cd", Vec2::new(0.0, 32.0), white(), 0, false);
        assert!(font.batch().is_started());
        font.finish();
        assert!(font.is_character_supported('z'));
        assert_eq!(font.style(), FontStyle::Bold);
    }

    #[test]
    fn test_malformed_font_data_fails() {
        let mut effects = EffectRegistry::new();
        let result = Font::from_font_data(
            "Broken",
            FontStyle::Plain,
            &[0, 1, 2, 3],
            16,
            Box::new(CpuTextureFactory),
            Box::new(QuadBatch::new()),
            &mut effects,
            TextConfig::default(),
        );
        assert!(result.is_err());
    }
}
