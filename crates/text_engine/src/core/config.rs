//! # Text Configuration
//!
//! Settings shared by every font the engine creates: delimiter widths,
//! character spacing and the growth policy of dynamic glyph atlases.
//!
//! Both structures load from TOML or RON through [`Config`].

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// Hard ceiling on any atlas dimension
pub const MAX_ATLAS_SIZE: u32 = 2048;

/// # Atlas Configuration
///
/// Growth policy for atlases filled at runtime. Atlases start at
/// `initial_width` x `initial_height`, keep their width, and double their
/// height until `max_size` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Width of a new atlas in pixels (never changes afterwards)
    pub initial_width: u32,
    /// Height of a new atlas in pixels
    pub initial_height: u32,
    /// Largest height an atlas may grow to
    pub max_size: u32,
    /// Empty pixels left between packed glyphs
    pub padding: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            initial_width: 512,
            initial_height: 256,
            max_size: MAX_ATLAS_SIZE,
            padding: 1,
        }
    }
}

impl AtlasConfig {
    /// Set the starting atlas dimensions
    pub fn with_initial_size(mut self, width: u32, height: u32) -> Self {
        self.initial_width = width;
        self.initial_height = height;
        self
    }

    /// Set the growth ceiling, clamped to [`MAX_ATLAS_SIZE`]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.min(MAX_ATLAS_SIZE);
        self
    }

    /// Set the padding between glyphs
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Check that the dimensions are usable
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_width == 0 || self.initial_height == 0 {
            return Err("Atlas dimensions must be non-zero".to_string());
        }
        if self.initial_width > self.max_size || self.initial_height > self.max_size {
            return Err(format!(
                "Initial atlas {}x{} exceeds maximum size {}",
                self.initial_width, self.initial_height, self.max_size
            ));
        }
        if self.max_size > MAX_ATLAS_SIZE {
            return Err(format!("Maximum atlas size {} exceeds {}", self.max_size, MAX_ATLAS_SIZE));
        }
        Ok(())
    }
}

/// # Text Configuration
///
/// Layout constants applied by every font variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Number of space advances a tab occupies
    pub tab_width: u32,
    /// Extra spacing after each glyph, as a fraction of the requested size
    pub character_spacing: f32,
    /// Space advance (fraction of base size) for sources without a space glyph
    pub fallback_space_advance: f32,
    /// Growth policy for dynamic atlases
    pub atlas: AtlasConfig,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            character_spacing: 0.0,
            fallback_space_advance: 0.5,
            atlas: AtlasConfig::default(),
        }
    }
}

impl TextConfig {
    /// Set the tab width in spaces
    pub fn with_tab_width(mut self, tab_width: u32) -> Self {
        self.tab_width = tab_width;
        self
    }

    /// Set the default character spacing
    pub fn with_character_spacing(mut self, spacing: f32) -> Self {
        self.character_spacing = spacing;
        self
    }

    /// Set the atlas growth policy
    pub fn with_atlas(mut self, atlas: AtlasConfig) -> Self {
        self.atlas = atlas;
        self
    }
}

impl Config for TextConfig {}
impl Config for AtlasConfig {}
