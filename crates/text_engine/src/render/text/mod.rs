//! Text rendering system
//!
//! Glyph sources, text layout, glyph emission and caret mapping.

pub mod caret;
pub mod emitter;
pub mod font;
pub mod font_atlas;
pub mod font_family;
pub mod glyph;
pub mod glyph_table;
pub mod justify;
pub mod text_layout;
pub mod walker;


pub use caret::{CaretIndexMapper, CaretMatch, CaretQuery};
pub use emitter::GlyphEmitter;
pub use font::{Font, FontStyle};
pub use font_atlas::{DynamicGlyphSource, FontdueRasterizer, GlyphRasterizer, RasterizedGlyph};
pub use font_family::{FontFamily, FontLibrary};
pub use glyph::{FontError, FontResult, Glyph, GlyphSource};
pub use glyph_table::{FixedGlyphTable, GlyphTableDescriptor};
pub use justify::Justify;
pub use text_layout::{GlyphMetrics, LayoutEngine, LineBreaker, LineMetrics, PixelArea, TextLayout};
pub use walker::{LayoutCursor, LayoutStep, LayoutWalker, WalkParams};
