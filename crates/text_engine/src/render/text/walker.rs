//! Layout traversal shared by drawing, measuring and caret mapping
//!
//! [`LayoutWalker`] places every character of a text exactly once and hands
//! each placement to a visitor. Drawing, measuring and hit-testing only
//! differ in what the visitor does, so they can never disagree about where a
//! character ends up.
//!
//! Left-to-right text aligned top-left streams lines straight from a
//! [`LineBreaker`]. Anything else is laid out up front so lines can be
//! justified and reversed.

use std::ops::ControlFlow;

use super::glyph::Glyph;
use super::justify::Justify;
use super::text_layout::{GlyphMetrics, LayoutEngine, LineBreaker, LineMetrics, PixelArea};
use crate::foundation::math::Rect;

/// Pen state while walking a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutCursor {
    /// Pixel x of the pen
    pub x: i32,
    /// Pixel y of the current line's top edge
    pub y: i32,
    /// Content characters on the current line
    pub line_length: usize,
    /// Index of the current line
    pub line: usize,
}

/// How a walk is laid out and clipped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkParams {
    /// Layout area
    pub area: PixelArea,
    /// Line and block alignment
    pub justify: Justify,
    /// Wrap lines at the area width
    pub wrap: bool,
    /// Walk each line from its last character to its first
    pub right_to_left: bool,
    /// Truncate at the right edge and stop below the bottom edge
    pub clip_to_area: bool,
}

impl WalkParams {
    /// Unwrapped left-to-right text anchored at a point
    pub fn at_point(x: i32, y: i32) -> Self {
        Self {
            area: PixelArea::unbounded(x, y),
            justify: Justify::ALIGN_TOP_LEFT,
            wrap: false,
            right_to_left: false,
            clip_to_area: false,
        }
    }
}

/// One placement reported to a walk visitor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutStep {
    /// A character with a glyph
    Glyph {
        /// Character index in the text
        index: usize,
        /// Glyph to draw
        glyph: Glyph,
        /// Pen before the glyph
        cursor: LayoutCursor,
        /// Floored advance at the walk's size
        advance: i32,
        /// Whether the glyph lies inside the drawable part of the area
        visible: bool,
    },
    /// A space or tab
    Delimiter {
        /// Character index in the text
        index: usize,
        /// Pen before the delimiter
        cursor: LayoutCursor,
        /// Width in pixels
        width: i32,
    },
    /// Extent of a completed line; truncated lines report none
    LineBounds {
        /// The line
        line: LineMetrics,
        /// Leftmost pixel x
        left: i32,
        /// Rightmost pixel x (exclusive)
        right: i32,
        /// Top edge
        y: i32,
    },
}

/// Outcome of consuming a run of delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterRun<B> {
    /// The line ran out before another token
    EndOfLine,
    /// A token starts at the current position
    Token,
    /// The visitor finished the walk early
    Found(B),
}

/// Outcome of a whole walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome<B> {
    /// The visitor finished the walk early
    Found(B),
    /// Every line was walked; carries the final pen
    Finished(LayoutCursor),
}

enum LineFeed<'t> {
    Streaming(LineBreaker<'t>),
    Precomputed(std::vec::IntoIter<LineMetrics>),
}

impl LineFeed<'_> {
    fn next_line(&mut self, metrics: &mut GlyphMetrics<'_>) -> Option<LineMetrics> {
        match self {
            LineFeed::Streaming(breaker) => breaker.next_line(metrics),
            LineFeed::Precomputed(lines) => lines.next(),
        }
    }
}

/// Walks the characters of a text in visual order
pub struct LayoutWalker<'a, 's> {
    chars: &'a [char],
    metrics: &'a mut GlyphMetrics<'s>,
    params: WalkParams,
}

impl<'a, 's> LayoutWalker<'a, 's> {
    /// Walker over `chars` using `metrics` for glyphs and widths
    pub fn new(chars: &'a [char], metrics: &'a mut GlyphMetrics<'s>, params: WalkParams) -> Self {
        Self { chars, metrics, params }
    }

    /// Line height of the walk
    pub fn size(&self) -> i32 {
        self.metrics.size()
    }

    /// Visit every placement until the visitor breaks
    pub fn walk<B, F>(&mut self, mut visitor: F) -> WalkOutcome<B>
    where
        F: FnMut(LayoutStep) -> ControlFlow<B>,
    {
        let params = self.params;
        let area = params.area;
        let size = self.metrics.size();

        let (mut feed, top) = if LayoutEngine::needs_layout(params.justify, params.right_to_left) {
            let layout = LayoutEngine::compute_layout(self.chars, &area, params.justify, params.wrap, self.metrics);
            (LineFeed::Precomputed(layout.lines.into_iter()), layout.vertical_start)
        } else {
            let breaker = LineBreaker::new(self.chars, area.width, params.wrap).with_offset(area.x);
            (LineFeed::Streaming(breaker), area.y)
        };

        let cull_top = area.y.saturating_sub(size);
        let cull_bottom = area.y.saturating_add(area.height.saturating_sub(size));

        let mut cursor = LayoutCursor {
            x: area.x,
            y: top,
            line_length: 0,
            line: 0,
        };

        while let Some(line) = feed.next_line(self.metrics) {
            if params.clip_to_area && cursor.y > cull_bottom {
                break;
            }

            cursor.x = line.offset_x;
            cursor.line_length = line.char_count;
            let row_visible = !params.clip_to_area || cursor.y >= cull_top;

            if let ControlFlow::Break(found) = self.walk_line(&line, &mut cursor, row_visible, &mut visitor) {
                return WalkOutcome::Found(found);
            }

            cursor.y = cursor.y.saturating_add(size);
            cursor.line += 1;
        }

        WalkOutcome::Finished(cursor)
    }

    fn walk_line<B, F>(
        &mut self,
        line: &LineMetrics,
        cursor: &mut LayoutCursor,
        row_visible: bool,
        visitor: &mut F,
    ) -> ControlFlow<B>
    where
        F: FnMut(LayoutStep) -> ControlFlow<B>,
    {
        let content = line.start..line.content_end();
        let order: Vec<usize> = if self.params.right_to_left {
            content.rev().collect()
        } else {
            content.collect()
        };

        let right = self.params.area.right() as f32;
        let mut pos = 0;

        loop {
            match self.handle_delimiters(&order, &mut pos, cursor, visitor) {
                DelimiterRun::EndOfLine => break,
                DelimiterRun::Found(found) => return ControlFlow::Break(found),
                DelimiterRun::Token => {}
            }

            while let Some(&index) = order.get(pos) {
                let ch = self.chars[index];
                if self.metrics.delimiter_width(ch).is_some() {
                    break;
                }
                pos += 1;

                let Some(glyph) = self.metrics.glyph(ch) else {
                    continue;
                };

                if self.params.clip_to_area && cursor.x as f32 + glyph.advance * self.metrics.scale() > right {
                    // rest of the line is cut off
                    return ControlFlow::Continue(());
                }

                let advance = self.metrics.advance(&glyph);
                visitor(LayoutStep::Glyph {
                    index,
                    glyph,
                    cursor: *cursor,
                    advance,
                    visible: row_visible && cursor.x >= self.params.area.x,
                })?;
                cursor.x += advance;
            }
        }

        visitor(LayoutStep::LineBounds {
            line: *line,
            left: line.offset_x,
            right: cursor.x,
            y: cursor.y,
        })
    }

    /// Consume the delimiters at `pos`, reporting each to the visitor
    fn handle_delimiters<B, F>(
        &mut self,
        order: &[usize],
        pos: &mut usize,
        cursor: &mut LayoutCursor,
        visitor: &mut F,
    ) -> DelimiterRun<B>
    where
        F: FnMut(LayoutStep) -> ControlFlow<B>,
    {
        while let Some(&index) = order.get(*pos) {
            let Some(width) = self.metrics.delimiter_width(self.chars[index]) else {
                return DelimiterRun::Token;
            };
            *pos += 1;

            if let ControlFlow::Break(found) = visitor(LayoutStep::Delimiter {
                index,
                cursor: *cursor,
                width,
            }) {
                return DelimiterRun::Found(found);
            }
            cursor.x += width;
        }
        DelimiterRun::EndOfLine
    }

    /// Bounding box of everything the walk places, or `None` for no lines
    pub fn bounds(&mut self) -> Option<Rect> {
        let size = self.metrics.size() as f32;
        let mut bounds: Option<Rect> = None;

        let outcome = self.walk::<(), _>(|step| {
            let rect = match step {
                LayoutStep::Glyph { cursor, advance, .. } => {
                    Rect::new(cursor.x as f32, cursor.y as f32, advance as f32, size)
                }
                LayoutStep::Delimiter { cursor, width, .. } => {
                    Rect::new(cursor.x as f32, cursor.y as f32, width as f32, size)
                }
                LayoutStep::LineBounds { left, right, y, .. } => {
                    Rect::new(left as f32, y as f32, (right - left) as f32, size)
                }
            };
            bounds = Some(bounds.map_or(rect, |b| b.union(&rect)));
            ControlFlow::Continue(())
        });
        debug_assert!(matches!(outcome, WalkOutcome::Finished(_)));

        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TextConfig;
    use crate::render::text::glyph_table::tests::monospace_glyphs;
    use crate::render::text::glyph_table::{FixedGlyphTable, ASCII_START};

    fn table() -> FixedGlyphTable {
        FixedGlyphTable::new(10, ASCII_START, monospace_glyphs(10.0), None).unwrap()
    }

    fn placements(text: &str, params: WalkParams) -> Vec<(usize, i32, i32)> {
        let mut table = table();
        let mut metrics = GlyphMetrics::new(&mut table, 10, 0.0, &TextConfig::default());
        let chars: Vec<char> = text.chars().collect();
        let mut walker = LayoutWalker::new(&chars, &mut metrics, params);

        let mut out = Vec::new();
        walker.walk::<(), _>(|step| {
            if let LayoutStep::Glyph { index, cursor, .. } = step {
                out.push((index, cursor.x, cursor.y));
            }
            ControlFlow::Continue(())
        });
        out
    }

    fn area(x: i32, y: i32, width: i32, height: i32) -> PixelArea {
        PixelArea { x, y, width, height }
    }

    fn in_area(area: PixelArea) -> WalkParams {
        WalkParams {
            area,
            justify: Justify::ALIGN_TOP_LEFT,
            wrap: true,
            right_to_left: false,
            clip_to_area: true,
        }
    }

    #[test]
    fn test_streaming_places_wrapped_lines() {
        let steps = placements("AB CD", in_area(area(0, 0, 25, 100)));
        assert_eq!(steps, vec![(0, 0, 0), (1, 10, 0), (3, 0, 10), (4, 10, 10)]);
    }

    #[test]
    fn test_right_to_left_reverses_each_line() {
        let mut params = in_area(area(0, 0, 100, 100));
        params.right_to_left = true;
        let steps = placements("AB\nCD", params);
        assert_eq!(steps, vec![(1, 0, 0), (0, 10, 0), (4, 0, 10), (3, 10, 10)]);
    }

    #[test]
    fn test_truncation_skips_rest_of_line_only() {
        let mut params = in_area(area(0, 0, 25, 100));
        params.wrap = false;
        let steps = placements("ABCD\nE", params);
        assert_eq!(steps, vec![(0, 0, 0), (1, 10, 0), (5, 0, 10)]);
    }

    #[test]
    fn test_stops_below_area() {
        let steps = placements("A\nB\nC", in_area(area(0, 0, 100, 25)));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_rows_above_area_are_invisible() {
        let mut table = table();
        let mut metrics = GlyphMetrics::new(&mut table, 10, 0.0, &TextConfig::default());
        let chars: Vec<char> = "A\nB\nC\nD".chars().collect();
        let mut params = in_area(area(0, 30, 100, 100));
        params.justify = Justify::ALIGN_BOTTOM_LEFT;
        params.area = area(0, 30, 100, 10);
        let mut walker = LayoutWalker::new(&chars, &mut metrics, params);

        let mut visible = Vec::new();
        walker.walk::<(), _>(|step| {
            if let LayoutStep::Glyph { index, visible: true, .. } = step {
                visible.push(index);
            }
            ControlFlow::Continue(())
        });
        // block starts at y=0; rows at 0 and 10 are culled, 20 and 30 are not
        assert_eq!(visible, vec![4, 6]);
    }

    #[test]
    fn test_visitor_can_stop_early() {
        let mut table = table();
        let mut metrics = GlyphMetrics::new(&mut table, 10, 0.0, &TextConfig::default());
        let chars: Vec<char> = "A B".chars().collect();
        let mut walker = LayoutWalker::new(&chars, &mut metrics, WalkParams::at_point(0, 0));

        let outcome = walker.walk(|step| match step {
            LayoutStep::Delimiter { index, cursor, .. } => ControlFlow::Break((index, cursor.x)),
            _ => ControlFlow::Continue(()),
        });
        assert_eq!(outcome, WalkOutcome::Found((1, 10)));
    }

    #[test]
    fn test_finished_cursor_counts_lines() {
        let mut table = table();
        let mut metrics = GlyphMetrics::new(&mut table, 10, 0.0, &TextConfig::default());
        let chars: Vec<char> = "AB\nC".chars().collect();
        let mut walker = LayoutWalker::new(&chars, &mut metrics, WalkParams::at_point(5, 5));

        match walker.walk::<(), _>(|_| ControlFlow::Continue(())) {
            WalkOutcome::Finished(cursor) => {
                assert_eq!(cursor.line, 2);
                assert_eq!(cursor.y, 25);
                assert_eq!(cursor.x, 15);
            }
            WalkOutcome::Found(()) => panic!("walk should not stop early"),
        }
    }

    #[test]
    fn test_bounds_cover_empty_lines() {
        let mut table = table();
        let mut metrics = GlyphMetrics::new(&mut table, 10, 0.0, &TextConfig::default());
        let chars: Vec<char> = "AB\n\n".chars().collect();
        let mut walker = LayoutWalker::new(&chars, &mut metrics, WalkParams::at_point(0, 0));

        let bounds = walker.bounds().unwrap();
        assert_eq!((bounds.width, bounds.height), (20.0, 30.0));
    }
}
