//! Caret placement and hit-testing
//!
//! Maps between character indices and screen points by walking the layout
//! exactly like drawing does. A point hits a character when it lies inside
//! the character's advance cell; points beside a line resolve to the line's
//! start or end, and points outside the text are clamped into its bounds.

use std::ops::ControlFlow;

use super::text_layout::GlyphMetrics;
use super::walker::{LayoutStep, LayoutWalker, WalkOutcome, WalkParams};
use crate::foundation::math::Vec2;

/// What a caret walk is searching for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaretQuery {
    /// Character under a screen point
    Location(Vec2),
    /// Screen point of a character index
    Index(usize),
}

/// Answer to a [`CaretQuery`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaretMatch {
    /// Matching character index
    Index(usize),
    /// Top-left corner of the matching character cell
    Location(Vec2),
}

/// Maps character indices to screen locations and back
pub struct CaretIndexMapper<'a, 's> {
    chars: &'a [char],
    metrics: &'a mut GlyphMetrics<'s>,
    params: WalkParams,
}

impl<'a, 's> CaretIndexMapper<'a, 's> {
    /// Mapper over `chars` laid out with `params`
    pub fn new(chars: &'a [char], metrics: &'a mut GlyphMetrics<'s>, params: WalkParams) -> Self {
        Self { chars, metrics, params }
    }

    /// Run one caret walk, returning the first match
    pub fn index_or_location(&mut self, query: CaretQuery) -> Option<CaretMatch> {
        if self.chars.is_empty() {
            return self.empty_text_match(query);
        }

        let size = self.metrics.size();
        let right_to_left = self.params.right_to_left;
        let mut walker = LayoutWalker::new(self.chars, self.metrics, self.params);

        let outcome = walker.walk(|step| match (query, step) {
            (CaretQuery::Location(point), LayoutStep::Glyph { index, cursor, advance, .. })
            | (CaretQuery::Location(point), LayoutStep::Delimiter { index, cursor, width: advance }) => {
                if in_row(point, cursor.y, size) && in_span(point.x, cursor.x, cursor.x + advance) {
                    ControlFlow::Break(CaretMatch::Index(index))
                } else {
                    ControlFlow::Continue(())
                }
            }
            (CaretQuery::Index(target), LayoutStep::Glyph { index, cursor, .. })
            | (CaretQuery::Index(target), LayoutStep::Delimiter { index, cursor, .. }) => {
                if index == target {
                    ControlFlow::Break(CaretMatch::Location(Vec2::new(cursor.x as f32, cursor.y as f32)))
                } else {
                    ControlFlow::Continue(())
                }
            }
            (CaretQuery::Location(point), LayoutStep::LineBounds { line, left, right, y }) => {
                if !in_row(point, y, size) {
                    return ControlFlow::Continue(());
                }
                let (before, after) = if right_to_left {
                    (line.content_end(), line.start)
                } else {
                    (line.start, line.content_end())
                };
                if point.x < left as f32 {
                    ControlFlow::Break(CaretMatch::Index(before))
                } else if point.x >= right as f32 {
                    ControlFlow::Break(CaretMatch::Index(after))
                } else {
                    ControlFlow::Continue(())
                }
            }
            (CaretQuery::Index(target), LayoutStep::LineBounds { line, left, right, y }) => {
                if line.owns_tail_index(target) {
                    let x = if right_to_left { left } else { right };
                    ControlFlow::Break(CaretMatch::Location(Vec2::new(x as f32, y as f32)))
                } else {
                    ControlFlow::Continue(())
                }
            }
        });

        match outcome {
            WalkOutcome::Found(found) => Some(found),
            WalkOutcome::Finished(_) => None,
        }
    }

    /// Character index under `point`
    ///
    /// A point beyond the text is clamped into the text's bounding box and
    /// tested once more.
    pub fn index_at_location(&mut self, point: Vec2) -> Option<usize> {
        if let Some(CaretMatch::Index(index)) = self.index_or_location(CaretQuery::Location(point)) {
            return Some(index);
        }

        let bounds = LayoutWalker::new(self.chars, self.metrics, self.params).bounds()?;
        let clamped = Vec2::new(
            point.x.clamp(bounds.x, (bounds.right() - 1.0).max(bounds.x)),
            point.y.clamp(bounds.y, (bounds.bottom() - 1.0).max(bounds.y)),
        );
        if clamped == point {
            return None;
        }

        log::trace!("Caret point {:?} outside text, retrying at {:?}", point, clamped);
        match self.index_or_location(CaretQuery::Location(clamped)) {
            Some(CaretMatch::Index(index)) => Some(index),
            _ => None,
        }
    }

    /// Top-left corner of the caret cell for `index`
    pub fn location_at_index(&mut self, index: usize) -> Option<Vec2> {
        match self.index_or_location(CaretQuery::Index(index)) {
            Some(CaretMatch::Location(location)) => Some(location),
            _ => None,
        }
    }

    fn empty_text_match(&self, query: CaretQuery) -> Option<CaretMatch> {
        let area = self.params.area;
        match query {
            CaretQuery::Location(_) => Some(CaretMatch::Index(0)),
            CaretQuery::Index(0) => {
                let justify = self.params.justify;
                let x = justify.line_offset(area.x, area.width, 0);
                let y = justify.block_offset(area.y, area.height, self.metrics.size());
                Some(CaretMatch::Location(Vec2::new(x as f32, y as f32)))
            }
            CaretQuery::Index(_) => None,
        }
    }
}

fn in_row(point: Vec2, y: i32, size: i32) -> bool {
    point.y >= y as f32 && point.y < (y + size) as f32
}

fn in_span(x: f32, left: i32, right: i32) -> bool {
    x >= left as f32 && x < right as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TextConfig;
    use crate::render::text::glyph_table::tests::monospace_glyphs;
    use crate::render::text::glyph_table::{FixedGlyphTable, ASCII_START};
    use crate::render::text::justify::Justify;
    use crate::render::text::text_layout::PixelArea;

    fn table() -> FixedGlyphTable {
        FixedGlyphTable::new(10, ASCII_START, monospace_glyphs(10.0), None).unwrap()
    }

    fn params(justify: Justify, right_to_left: bool) -> WalkParams {
        WalkParams {
            area: PixelArea { x: 0, y: 0, width: 100, height: 100 },
            justify,
            wrap: true,
            right_to_left,
            clip_to_area: true,
        }
    }

    fn index_at(text: &str, params: WalkParams, x: f32, y: f32) -> Option<usize> {
        let mut table = table();
        let mut metrics = GlyphMetrics::new(&mut table, 10, 0.0, &TextConfig::default());
        let chars: Vec<char> = text.chars().collect();
        CaretIndexMapper::new(&chars, &mut metrics, params).index_at_location(Vec2::new(x, y))
    }

    fn location_of(text: &str, params: WalkParams, index: usize) -> Option<Vec2> {
        let mut table = table();
        let mut metrics = GlyphMetrics::new(&mut table, 10, 0.0, &TextConfig::default());
        let chars: Vec<char> = text.chars().collect();
        CaretIndexMapper::new(&chars, &mut metrics, params).location_at_index(index)
    }

    #[test]
    fn test_point_inside_glyph_cell() {
        let p = params(Justify::ALIGN_TOP_LEFT, false);
        assert_eq!(index_at("AB CD", p, 0.0, 0.0), Some(0));
        assert_eq!(index_at("AB CD", p, 19.9, 9.9), Some(1));
        assert_eq!(index_at("AB CD", p, 25.0, 5.0), Some(2));
        assert_eq!(index_at("AB CD", p, 41.0, 5.0), Some(4));
    }

    #[test]
    fn test_point_past_line_end_hits_break() {
        let p = params(Justify::ALIGN_TOP_LEFT, false);
        assert_eq!(index_at("AB\nCD", p, 80.0, 5.0), Some(2));
        assert_eq!(index_at("AB\nCD", p, 80.0, 15.0), Some(5));
    }

    #[test]
    fn test_point_below_text_is_clamped() {
        let p = params(Justify::ALIGN_TOP_LEFT, false);
        assert_eq!(index_at("AB\nCD", p, 5.0, 90.0), Some(3));
    }

    #[test]
    fn test_location_at_index() {
        let p = params(Justify::ALIGN_TOP_LEFT, false);
        assert_eq!(location_of("AB\nCD", p, 4), Some(Vec2::new(10.0, 10.0)));
        assert_eq!(location_of("AB\nCD", p, 2), Some(Vec2::new(20.0, 0.0)));
        assert_eq!(location_of("AB\nCD", p, 5), Some(Vec2::new(20.0, 10.0)));
        assert_eq!(location_of("AB\nCD", p, 6), None);
    }

    #[test]
    fn test_round_trip_with_justification() {
        // trailing space before the break, a tab at a wrap, trailing spaces at the end
        let text = "one two \nthree\tfour five six  ";
        let len = text.chars().count();
        for justify in [Justify::ALIGN_TOP_LEFT, Justify::ALIGN_VCENTER_HCENTER, Justify::ALIGN_BOTTOM_RIGHT] {
            for rtl in [false, true] {
                let p = params(justify, rtl);
                for index in 0..=len {
                    let location = location_of(text, p, index).unwrap();
                    let found = index_at(text, p, location.x, location.y).unwrap();
                    if found == index {
                        continue;
                    }
                    // a right-to-left line end shares the cell of the line's last character
                    assert!(
                        rtl && found + 1 == index && location_of(text, p, found) == Some(location),
                        "{:?} rtl={} index {} came back as {}",
                        justify,
                        rtl,
                        index,
                        found
                    );
                }
            }
        }
    }

    #[test]
    fn test_trailing_spaces_have_own_cells() {
        let p = params(Justify::ALIGN_TOP_LEFT, false);
        for (index, x) in [(2, 20.0), (3, 30.0), (4, 40.0)] {
            assert_eq!(location_of("ab  ", p, index), Some(Vec2::new(x, 0.0)));
            assert_eq!(index_at("ab  ", p, x, 0.0), Some(index));
        }
        assert_eq!(location_of("ab  \ncd", p, 4), Some(Vec2::new(40.0, 0.0)));
        assert_eq!(index_at("ab  \ncd", p, 35.0, 5.0), Some(3));
    }

    #[test]
    fn test_right_to_left_line_ends() {
        let p = params(Justify::ALIGN_TOP_LEFT, true);
        // "ABC" draws C,B,A from x=0
        assert_eq!(index_at("ABC", p, 25.0, 5.0), Some(0));
        assert_eq!(index_at("ABC", p, 95.0, 5.0), Some(0));
        assert_eq!(location_of("ABC", p, 3), Some(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_empty_text() {
        let p = params(Justify::ALIGN_VCENTER_HCENTER, false);
        assert_eq!(index_at("", p, 10.0, 10.0), Some(0));
        assert_eq!(location_of("", p, 0), Some(Vec2::new(50.0, 45.0)));
        assert_eq!(location_of("", p, 1), None);
    }
}
