//! # Text Engine
//!
//! Text layout and glyph rendering for a real-time game engine.
//!
//! ## Features
//!
//! - **Glyph Sources**: Fixed ASCII glyph tables and on-demand `fontdue` atlases
//! - **Layout**: Word wrapping, nine-way justification and right-to-left lines
//! - **Batched Drawing**: One UV-mapped quad per glyph, truncated and clipped
//! - **Caret Mapping**: Character index to screen point and back
//! - **Size Variants**: Font families pick the nearest prebuilt size
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use text_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     text_engine::foundation::logging::init();
//!
//!     let font_data = std::fs::read("resources/fonts/default.ttf")?;
//!     let mut library = FontLibrary::new();
//!
//!     let font = Font::from_font_data(
//!         "Default",
//!         FontStyle::Plain,
//!         &font_data,
//!         24,
//!         Box::new(CpuTextureFactory),
//!         Box::new(QuadBatch::new()),
//!         library.effects_mut(),
//!         TextConfig::default(),
//!     )?;
//!     library.add(font)?;
//!
//!     if let Some(family) = library.get_mut("Default", FontStyle::Plain) {
//!         let area = Rect::new(10.0, 10.0, 300.0, 200.0);
//!         let white = Vec4::new(1.0, 1.0, 1.0, 1.0);
//!         family.draw_text_in_area("Hello, world", &area, white, 24, Justify::ALIGN_VCENTER_HCENTER, true, false, None);
//!         family.finish();
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{AtlasConfig, TextConfig},
        foundation::math::{Rect, Vec2, Vec4, Mat4},
        render::{CpuTextureFactory, EffectRegistry, FontFormat, QuadBatch, SpriteBatch},
        render::text::{
            FixedGlyphTable, Font, FontError, FontFamily, FontLibrary, FontResult, FontStyle, GlyphSource, Justify,
        },
    };
}
