//! Text layout engine
//!
//! Splits text into lines and works out where each line starts. Only ASCII
//! whitespace breaks text: spaces and tabs separate tokens, `\n`, `\r` and
//! `"\r\n"` end lines. A token is never split; one wider than the area gets
//! a line of its own and overflows it.
//!
//! Widths are accumulated glyph by glyph, each advance floored to whole
//! pixels, so every pass that walks the same text at the same size measures
//! exactly the same lines.

use super::glyph::{Glyph, GlyphSource};
use super::justify::Justify;
use crate::core::config::TextConfig;
use crate::foundation::math::Rect;

/// Whether `ch` separates tokens or lines
pub fn is_delimiter(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

/// Whether `ch` ends a line
pub fn is_line_break(ch: char) -> bool {
    matches!(ch, '\r' | '\n')
}

/// Glyph lookup and pixel metrics for one requested size
pub struct GlyphMetrics<'s> {
    source: &'s mut dyn GlyphSource,
    size: i32,
    scale: f32,
    spacing: i32,
    space_advance: i32,
    tab_width: i32,
}

impl<'s> GlyphMetrics<'s> {
    /// Metrics for drawing `source` at `size` pixels (0 means the base size)
    pub fn new(source: &'s mut dyn GlyphSource, size: u32, character_spacing: f32, config: &TextConfig) -> Self {
        let base_size = source.base_size().max(1);
        let size = if size == 0 { base_size } else { size };
        let scale = size as f32 / base_size as f32;
        let spacing = (size as f32 * character_spacing) as i32;

        let space_advance = match source.glyph(' ') {
            Some(space) => space.scaled_advance(scale, spacing),
            None => (base_size as f32 * config.fallback_space_advance * scale).floor() as i32,
        };

        Self {
            source,
            size: size as i32,
            scale,
            spacing,
            space_advance,
            tab_width: config.tab_width as i32,
        }
    }

    /// Line height in pixels (the requested size)
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Ratio of the requested size to the source's base size
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Glyph for `ch`, if the source supports it
    pub fn glyph(&mut self, ch: char) -> Option<Glyph> {
        self.source.glyph(ch)
    }

    /// Floored pen advance of a glyph at this size
    pub fn advance(&self, glyph: &Glyph) -> i32 {
        glyph.scaled_advance(self.scale, self.spacing)
    }

    /// Width of a space or tab; `None` for anything else
    pub fn delimiter_width(&self, ch: char) -> Option<i32> {
        match ch {
            ' ' => Some(self.space_advance),
            '\t' => Some(self.space_advance * self.tab_width),
            _ => None,
        }
    }

    /// Width a character adds to a line; unsupported characters add nothing
    pub fn char_width(&mut self, ch: char) -> i32 {
        if let Some(width) = self.delimiter_width(ch) {
            return width;
        }
        if is_line_break(ch) {
            return 0;
        }
        self.glyph(ch).map_or(0, |glyph| self.advance(&glyph))
    }

    /// Width of a run of characters
    pub fn run_width(&mut self, chars: &[char]) -> i32 {
        chars.iter().map(|&ch| self.char_width(ch)).sum()
    }
}

/// Integer pixel bounds of a layout area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelArea {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl PixelArea {
    /// Truncate a rectangle to whole pixels; infinite extents saturate
    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            x: rect.x as i32,
            y: rect.y as i32,
            width: rect.width as i32,
            height: rect.height as i32,
        }
    }

    /// Area that never truncates or culls, anchored at a point
    pub fn unbounded(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            width: i32::MAX,
            height: i32::MAX,
        }
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }
}

/// One laid-out line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMetrics {
    /// Pixel x where the line starts
    pub offset_x: i32,
    /// Pixel width of the line's content
    pub width: i32,
    /// Index of the line's first character
    pub start: usize,
    /// Characters of content
    ///
    /// The line break is excluded, and so is whitespace a wrap fell on.
    /// Trailing whitespace before a break or the end of text is content.
    pub char_count: usize,
    /// Index where the following line starts
    pub next_start: usize,
    /// Whether this is the final line of the text
    pub is_last: bool,
}

impl LineMetrics {
    /// Index one past the line's content
    pub fn content_end(&self) -> usize {
        self.start + self.char_count
    }

    /// Whether a caret at `index` belongs after this line's content
    pub fn owns_tail_index(&self, index: usize) -> bool {
        index >= self.content_end() && (index < self.next_start || (self.is_last && index == self.next_start))
    }
}

/// Restartable lazy iterator over the lines of a text
///
/// Lines are produced on demand so top-left text can stream without a
/// precomputed layout. The glyph metrics are passed per call so the caller
/// can keep using them between lines.
#[derive(Debug, Clone)]
pub struct LineBreaker<'t> {
    chars: &'t [char],
    pos: usize,
    finished: bool,
    wrap: bool,
    area_width: i32,
    offset_x: i32,
}

impl<'t> LineBreaker<'t> {
    /// Break `chars` into lines no wider than `area_width` when `wrap` is set
    pub fn new(chars: &'t [char], area_width: i32, wrap: bool) -> Self {
        Self {
            chars,
            pos: 0,
            finished: chars.is_empty(),
            wrap,
            area_width,
            offset_x: 0,
        }
    }

    /// Start x assigned to every produced line
    pub fn with_offset(mut self, offset_x: i32) -> Self {
        self.offset_x = offset_x;
        self
    }

    /// Rewind to the first line
    pub fn restart(&mut self) {
        self.pos = 0;
        self.finished = self.chars.is_empty();
    }

    /// Produce the next line
    pub fn next_line(&mut self, metrics: &mut GlyphMetrics<'_>) -> Option<LineMetrics> {
        if self.finished {
            return None;
        }

        let chars = self.chars;
        let start = self.pos;
        let mut i = start;
        let mut width = 0;
        let mut pending = 0;
        let mut content_end = start;
        let mut has_token = false;

        loop {
            let Some(&ch) = chars.get(i) else {
                self.pos = chars.len();
                self.finished = true;
                return Some(self.line(start, i, width + pending, chars.len(), true));
            };

            if is_line_break(ch) {
                let break_len = if ch == '\r' && chars.get(i + 1) == Some(&'\n') { 2 } else { 1 };
                self.pos = i + break_len;
                return Some(self.line(start, i, width + pending, self.pos, false));
            }

            if let Some(delimiter) = metrics.delimiter_width(ch) {
                pending += delimiter;
                i += 1;
                continue;
            }

            let token_end = chars[i..]
                .iter()
                .position(|&c| is_delimiter(c))
                .map_or(chars.len(), |offset| i + offset);
            let token_width = metrics.run_width(&chars[i..token_end]);

            if self.wrap && has_token && width + pending + token_width > self.area_width {
                // whitespace at a wrap belongs to neither line
                self.pos = i;
                return Some(self.line(start, content_end, width, i, false));
            }

            width += pending + token_width;
            pending = 0;
            has_token = true;
            content_end = token_end;
            i = token_end;
        }
    }

    fn line(&self, start: usize, content_end: usize, width: i32, next_start: usize, is_last: bool) -> LineMetrics {
        LineMetrics {
            offset_x: self.offset_x,
            width,
            start,
            char_count: content_end - start,
            next_start,
            is_last,
        }
    }

    /// Iterate the remaining lines with `metrics`
    pub fn lines<'a, 's>(self, metrics: &'a mut GlyphMetrics<'s>) -> Lines<'a, 't, 's> {
        Lines { breaker: self, metrics }
    }
}

/// [`LineBreaker`] bundled with its metrics as a standard iterator
pub struct Lines<'a, 't, 's> {
    breaker: LineBreaker<'t>,
    metrics: &'a mut GlyphMetrics<'s>,
}

impl Iterator for Lines<'_, '_, '_> {
    type Item = LineMetrics;

    fn next(&mut self) -> Option<Self::Item> {
        self.breaker.next_line(self.metrics)
    }
}

/// Precomputed line placement for one layout call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayout {
    /// Pixel y of the first line's top edge
    pub vertical_start: i32,
    /// Lines in reading order, with justified start offsets
    pub lines: Vec<LineMetrics>,
}

impl TextLayout {
    /// Total height of the laid-out lines
    pub fn content_height(&self, size: i32) -> i32 {
        self.lines.len() as i32 * size
    }

    /// Character counts per line, as right-to-left walking needs them
    pub fn line_char_counts(&self) -> Vec<usize> {
        self.lines.iter().map(|line| line.char_count).collect()
    }
}

/// Computes line breaks and justification offsets
pub struct LayoutEngine;

impl LayoutEngine {
    /// Whether drawing needs a precomputed layout
    ///
    /// Top-left, left-to-right text streams line by line instead.
    pub fn needs_layout(justify: Justify, right_to_left: bool) -> bool {
        !justify.is_top_left() || right_to_left
    }

    /// Lay out `chars` inside `area`
    pub fn compute_layout(
        chars: &[char],
        area: &PixelArea,
        justify: Justify,
        wrap: bool,
        metrics: &mut GlyphMetrics<'_>,
    ) -> TextLayout {
        let lines: Vec<LineMetrics> = LineBreaker::new(chars, area.width, wrap)
            .lines(metrics)
            .map(|line| LineMetrics {
                offset_x: justify.line_offset(area.x, area.width, line.width),
                ..line
            })
            .collect();

        let content_height = lines.len() as i32 * metrics.size();
        let vertical_start = justify.block_offset(area.y, area.height, content_height);

        log::trace!(
            "Laid out {} chars into {} lines starting at y={}",
            chars.len(),
            lines.len(),
            vertical_start
        );

        TextLayout { vertical_start, lines }
    }
}
