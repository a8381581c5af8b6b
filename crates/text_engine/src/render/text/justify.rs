//! Text justification flags
//!
//! Low nibble selects horizontal alignment, high nibble vertical alignment.
//! An unset nibble falls back to left or top.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

const HORIZONTAL_MASK: u32 = 0x0F;
const VERTICAL_MASK: u32 = 0xF0;

bitflags! {
    /// Alignment of text inside its area
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Justify: u32 {
        /// Lines start at the area's left edge
        const ALIGN_LEFT = 0x01;
        /// Lines are centered horizontally
        const ALIGN_HCENTER = 0x02;
        /// Lines end at the area's right edge
        const ALIGN_RIGHT = 0x04;
        /// Text starts at the area's top edge
        const ALIGN_TOP = 0x10;
        /// Text block is centered vertically
        const ALIGN_VCENTER = 0x20;
        /// Text block ends at the area's bottom edge
        const ALIGN_BOTTOM = 0x40;

        /// Top, left
        const ALIGN_TOP_LEFT = Self::ALIGN_TOP.bits() | Self::ALIGN_LEFT.bits();
        /// Top, centered
        const ALIGN_TOP_HCENTER = Self::ALIGN_TOP.bits() | Self::ALIGN_HCENTER.bits();
        /// Top, right
        const ALIGN_TOP_RIGHT = Self::ALIGN_TOP.bits() | Self::ALIGN_RIGHT.bits();
        /// Middle, left
        const ALIGN_VCENTER_LEFT = Self::ALIGN_VCENTER.bits() | Self::ALIGN_LEFT.bits();
        /// Middle, centered
        const ALIGN_VCENTER_HCENTER = Self::ALIGN_VCENTER.bits() | Self::ALIGN_HCENTER.bits();
        /// Middle, right
        const ALIGN_VCENTER_RIGHT = Self::ALIGN_VCENTER.bits() | Self::ALIGN_RIGHT.bits();
        /// Bottom, left
        const ALIGN_BOTTOM_LEFT = Self::ALIGN_BOTTOM.bits() | Self::ALIGN_LEFT.bits();
        /// Bottom, centered
        const ALIGN_BOTTOM_HCENTER = Self::ALIGN_BOTTOM.bits() | Self::ALIGN_HCENTER.bits();
        /// Bottom, right
        const ALIGN_BOTTOM_RIGHT = Self::ALIGN_BOTTOM.bits() | Self::ALIGN_RIGHT.bits();
    }
}

impl Default for Justify {
    fn default() -> Self {
        Self::ALIGN_TOP_LEFT
    }
}

impl Justify {
    /// Parse `"ALIGN_TOP_HCENTER"` or `"ALIGN_LEFT | ALIGN_BOTTOM"`
    pub fn parse(name: &str) -> Option<Self> {
        bitflags::parser::from_str::<Self>(name.trim()).ok()
    }

    /// Horizontal component, defaulting to left
    pub fn horizontal(self) -> Self {
        let bits = self.bits() & HORIZONTAL_MASK;
        if bits == 0 {
            Self::ALIGN_LEFT
        } else {
            Self::from_bits_truncate(bits)
        }
    }

    /// Vertical component, defaulting to top
    pub fn vertical(self) -> Self {
        let bits = self.bits() & VERTICAL_MASK;
        if bits == 0 {
            Self::ALIGN_TOP
        } else {
            Self::from_bits_truncate(bits)
        }
    }

    /// True for plain top-left alignment, which needs no precomputed offsets
    pub fn is_top_left(self) -> bool {
        self.horizontal() == Self::ALIGN_LEFT && self.vertical() == Self::ALIGN_TOP
    }

    /// Start x of a line `line_width` pixels wide
    ///
    /// A line wider than the area is not pinned to the left edge. Centered
    /// lines overhang both edges and right-aligned lines start left of the
    /// area, so clipped drawing shows the middle or the end of the line.
    pub fn line_offset(self, area_x: i32, area_width: i32, line_width: i32) -> i32 {
        let whitespace = area_width.saturating_sub(line_width);
        match self.horizontal() {
            h if h == Self::ALIGN_HCENTER => area_x.saturating_add(whitespace / 2),
            h if h == Self::ALIGN_RIGHT => area_x.saturating_add(whitespace),
            _ => area_x,
        }
    }

    /// Start y of a text block `content_height` pixels tall
    pub fn block_offset(self, area_y: i32, area_height: i32, content_height: i32) -> i32 {
        let leftover = area_height.saturating_sub(content_height);
        match self.vertical() {
            v if v == Self::ALIGN_VCENTER => area_y.saturating_add(leftover / 2),
            v if v == Self::ALIGN_BOTTOM => area_y.saturating_add(leftover),
            _ => area_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_default() {
        assert_eq!(Justify::empty().horizontal(), Justify::ALIGN_LEFT);
        assert_eq!(Justify::empty().vertical(), Justify::ALIGN_TOP);
        assert!(Justify::empty().is_top_left());
        assert!(Justify::ALIGN_TOP_LEFT.is_top_left());
        assert!(!Justify::ALIGN_HCENTER.is_top_left());

        let j = Justify::ALIGN_BOTTOM_RIGHT;
        assert_eq!(j.horizontal(), Justify::ALIGN_RIGHT);
        assert_eq!(j.vertical(), Justify::ALIGN_BOTTOM);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Justify::parse("ALIGN_TOP_HCENTER"), Some(Justify::ALIGN_TOP_HCENTER));
        assert_eq!(
            Justify::parse("ALIGN_LEFT | ALIGN_BOTTOM"),
            Some(Justify::ALIGN_BOTTOM_LEFT)
        );
        assert_eq!(Justify::parse("ALIGN_SIDEWAYS"), None);

        // bitflags' own single-name lookup stays available
        assert_eq!(Justify::from_name("ALIGN_RIGHT"), Some(Justify::ALIGN_RIGHT));
        assert_eq!(Justify::from_name("ALIGN_LEFT | ALIGN_BOTTOM"), None);
    }

    #[test]
    fn test_line_offset() {
        assert_eq!(Justify::ALIGN_LEFT.line_offset(10, 100, 40), 10);
        assert_eq!(Justify::ALIGN_HCENTER.line_offset(10, 100, 40), 40);
        assert_eq!(Justify::ALIGN_RIGHT.line_offset(10, 100, 40), 70);
    }

    #[test]
    fn test_overwide_line_overhangs_area() {
        assert_eq!(Justify::ALIGN_LEFT.line_offset(0, 30, 70), 0);
        assert_eq!(Justify::ALIGN_HCENTER.line_offset(0, 30, 70), -20);
        assert_eq!(Justify::ALIGN_RIGHT.line_offset(0, 30, 70), -40);
    }

    #[test]
    fn test_block_offset() {
        // 100px area, two 20px lines
        assert_eq!(Justify::ALIGN_TOP.block_offset(0, 100, 40), 0);
        assert_eq!(Justify::ALIGN_VCENTER.block_offset(0, 100, 40), 30);
        assert_eq!(Justify::ALIGN_BOTTOM.block_offset(5, 100, 40), 65);
    }
}
