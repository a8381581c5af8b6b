//! Font families and the font library
//!
//! A family holds one [`Font`] per discrete size. Text operations take any
//! size and run on the nearest variant, scaling its glyphs the rest of the
//! way. When two variants are equally near the larger one wins, since
//! shrinking glyphs looks better than stretching them.

use std::collections::HashMap;

use super::font::{Font, FontStyle};
use super::glyph::{FontError, FontResult};
use super::justify::Justify;
use crate::foundation::math::{Rect, Vec2, Vec4};
use crate::render::effect::EffectRegistry;

/// All sizes of one font family and style
#[derive(Debug)]
pub struct FontFamily {
    /// Root variant first, then siblings in insertion order
    variants: Vec<Font>,
}

impl FontFamily {
    /// Family whose root variant is `root`
    pub fn new(root: Font) -> Self {
        Self { variants: vec![root] }
    }

    /// Family name
    pub fn name(&self) -> &str {
        self.root().family()
    }

    /// Weight and slant shared by every variant
    pub fn style(&self) -> FontStyle {
        self.root().style()
    }

    /// The variant the family was created with
    pub fn root(&self) -> &Font {
        &self.variants[0]
    }

    /// Add a sibling variant
    ///
    /// Fails if the variant belongs to another family or style, or if a
    /// variant of the same size already exists.
    pub fn add_variant(&mut self, font: Font) -> FontResult<()> {
        if font.family() != self.name() || font.style() != self.style() {
            return Err(FontError::FamilyMismatch {
                family: format!("{} {:?}", self.name(), self.style()),
                variant: format!("{} {:?}", font.family(), font.style()),
            });
        }

        let size = font.base_size();
        if self.variants.iter().any(|variant| variant.base_size() == size) {
            return Err(FontError::DuplicateSize {
                family: self.name().to_string(),
                size,
            });
        }

        log::debug!("Added {}px variant to '{}'", size, self.name());
        self.variants.push(font);
        Ok(())
    }

    /// Number of sizes, root included
    pub fn size_count(&self) -> usize {
        self.variants.len()
    }

    /// Base size of the variant at `index`
    pub fn size(&self, index: usize) -> Option<u32> {
        self.variants.get(index).map(Font::base_size)
    }

    /// Variants in insertion order, root first
    pub fn variants(&self) -> impl Iterator<Item = &Font> {
        self.variants.iter()
    }

    fn closest_index(&self, target: u32) -> usize {
        if target == 0 {
            return 0;
        }

        let mut best = 0;
        for (index, variant) in self.variants.iter().enumerate().skip(1) {
            let size = variant.base_size();
            let best_size = self.variants[best].base_size();
            let distance = size.abs_diff(target);
            let best_distance = best_size.abs_diff(target);
            if distance < best_distance || (distance == best_distance && size > best_size) {
                best = index;
            }
        }
        best
    }

    /// Variant nearest to `target` pixels; 0 selects the root
    pub fn find_closest_size(&self, target: u32) -> &Font {
        &self.variants[self.closest_index(target)]
    }

    /// Mutable variant nearest to `target` pixels
    pub fn find_closest_size_mut(&mut self, target: u32) -> &mut Font {
        let index = self.closest_index(target);
        let font = &mut self.variants[index];
        if target != 0 && font.base_size() != target {
            log::trace!("'{}' {}px request uses the {}px variant", font.family(), target, font.base_size());
        }
        font
    }

    /// Begin every variant's batch
    pub fn start(&mut self) {
        self.variants.iter_mut().for_each(Font::start);
    }

    /// Flush every variant's started batch
    pub fn finish(&mut self) {
        self.variants.iter_mut().for_each(Font::finish);
    }

    /// See [`Font::draw_text`]
    pub fn draw_text(&mut self, text: &str, position: Vec2, color: Vec4, size: u32, right_to_left: bool) {
        self.find_closest_size_mut(size)
            .draw_text(text, position, color, size, right_to_left);
    }

    /// See [`Font::draw_text_in_area`]
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
        self.find_closest_size_mut(size)
            .draw_text_in_area(text, area, color, size, justify, wrap, right_to_left, clip);
    }

    /// See [`Font::measure_text`]
    pub fn measure_text(&mut self, text: &str, size: u32) -> (i32, i32) {
        self.find_closest_size_mut(size).measure_text(text, size)
    }

    /// See [`Font::measure_text_in_area`]
    pub fn measure_text_in_area(
        &mut self,
        text: &str,
        area: &Rect,
        size: u32,
        justify: Justify,
        wrap: bool,
        ignore_clip: bool,
    ) -> Rect {
        self.find_closest_size_mut(size)
            .measure_text_in_area(text, area, size, justify, wrap, ignore_clip)
    }

    /// See [`Font::index_at_location`]
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
        self.find_closest_size_mut(size)
            .index_at_location(text, area, size, point, justify, wrap, right_to_left)
    }

    /// See [`Font::location_at_index`]
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
        self.find_closest_size_mut(size)
            .location_at_index(text, area, size, index, justify, wrap, right_to_left)
    }
}

/// Every loaded font family, keyed by name and style
#[derive(Debug, Default)]
pub struct FontLibrary {
    families: HashMap<(String, FontStyle), FontFamily>,
    effects: EffectRegistry,
}

impl FontLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Effect registry fonts for this library should be created with
    pub fn effects_mut(&mut self) -> &mut EffectRegistry {
        &mut self.effects
    }

    /// Add a variant, creating its family on first use
    pub fn add(&mut self, font: Font) -> FontResult<()> {
        let key = (font.family().to_string(), font.style());
        match self.families.get_mut(&key) {
            Some(family) => family.add_variant(font),
            None => {
                log::info!("Registered font family '{}' ({:?})", key.0, key.1);
                self.families.insert(key, FontFamily::new(font));
                Ok(())
            }
        }
    }

    /// Insert a whole family, returning the one it replaces
    pub fn insert(&mut self, family: FontFamily) -> Option<FontFamily> {
        let key = (family.name().to_string(), family.style());
        self.families.insert(key, family)
    }

    /// Family by name and style
    pub fn get(&self, name: &str, style: FontStyle) -> Option<&FontFamily> {
        self.families.get(&(name.to_string(), style))
    }

    /// Mutable family by name and style
    pub fn get_mut(&mut self, name: &str, style: FontStyle) -> Option<&mut FontFamily> {
        self.families.get_mut(&(name.to_string(), style))
    }

    /// Remove a family, releasing its glyph sources and effects
    pub fn remove(&mut self, name: &str, style: FontStyle) -> Option<FontFamily> {
        self.families.remove(&(name.to_string(), style))
    }

    /// Number of families
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Whether no family is loaded
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Flush every started batch of every family
    pub fn finish_all(&mut self) {
        self.families.values_mut().for_each(FontFamily::finish);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TextConfig;
    use crate::render::batch::QuadBatch;
    use crate::render::effect::FontFormat;
    use crate::render::text::glyph_table::tests::monospace_glyphs;
    use crate::render::text::glyph_table::{FixedGlyphTable, ASCII_START};

    fn variant(effects: &mut EffectRegistry, family: &str, style: FontStyle, size: u32) -> Font {
        let table = FixedGlyphTable::new(size, ASCII_START, monospace_glyphs(size as f32), None).unwrap();
        Font::new(
            family,
            style,
            FontFormat::Bitmap,
            Box::new(table),
            Box::new(QuadBatch::new()),
            effects,
            TextConfig::default(),
        )
    }

    fn family(sizes: &[u32]) -> FontFamily {
        let mut effects = EffectRegistry::new();
        let mut family = FontFamily::new(variant(&mut effects, "Sans", FontStyle::Plain, sizes[0]));
        for &size in &sizes[1..] {
            family.add_variant(variant(&mut effects, "Sans", FontStyle::Plain, size)).unwrap();
        }
        family
    }

    #[test]
    fn test_closest_size_prefers_larger_on_tie() {
        let family = family(&[24, 12, 16]);
        assert_eq!(family.find_closest_size(24).base_size(), 24);
        assert_eq!(family.find_closest_size(13).base_size(), 12);
        assert_eq!(family.find_closest_size(14).base_size(), 16);
        assert_eq!(family.find_closest_size(20).base_size(), 24);
        assert_eq!(family.find_closest_size(100).base_size(), 24);
        assert_eq!(family.find_closest_size(0).base_size(), 24);
    }

    #[test]
    fn test_closest_size_can_beat_root() {
        let family = family(&[24, 12]);
        assert_eq!(family.find_closest_size(11).base_size(), 12);
    }

    #[test]
    fn test_add_variant_rejects_duplicates_and_strangers() {
        let mut effects = EffectRegistry::new();
        let mut family = family(&[24, 12]);

        let duplicate = family.add_variant(variant(&mut effects, "Sans", FontStyle::Plain, 12));
        assert!(matches!(duplicate, Err(FontError::DuplicateSize { size: 12, .. })));

        let bold = family.add_variant(variant(&mut effects, "Sans", FontStyle::Bold, 18));
        assert!(matches!(bold, Err(FontError::FamilyMismatch { .. })));

        assert_eq!(family.size_count(), 2);
        assert_eq!(family.size(1), Some(12));
        assert_eq!(family.size(2), None);
    }

    #[test]
    fn test_operations_use_closest_variant() {
        let mut family = family(&[24, 12]);
        // 13px draws the 12px variant scaled: 12 * 13/12 = 13 per glyph
        assert_eq!(family.measure_text("AB", 13), (26, 13));
        assert_eq!(family.measure_text("AB", 0), (48, 24));
    }

    #[test]
    fn test_library_groups_variants() {
        let mut library = FontLibrary::new();
        let plain = variant(library.effects_mut(), "Sans", FontStyle::Plain, 16);
        let plain_small = variant(library.effects_mut(), "Sans", FontStyle::Plain, 8);
        let bold = variant(library.effects_mut(), "Sans", FontStyle::Bold, 16);
        let duplicate = variant(library.effects_mut(), "Sans", FontStyle::Plain, 8);

        library.add(plain).unwrap();
        library.add(plain_small).unwrap();
        library.add(bold).unwrap();
        assert!(library.add(duplicate).is_err());

        assert_eq!(library.len(), 2);
        assert_eq!(library.get("Sans", FontStyle::Plain).unwrap().size_count(), 2);
        assert!(library.get("Serif", FontStyle::Plain).is_none());

        library.get_mut("Sans", FontStyle::Bold).unwrap().start();
        library.finish_all();
        assert!(!library.get("Sans", FontStyle::Bold).unwrap().root().batch().is_started());

        assert!(library.remove("Sans", FontStyle::Bold).is_some());
        assert_eq!(library.len(), 1);
    }
}
