//! Glyph quad emission
//!
//! Turns a walked layout into sprite batch quads. The batch is only started
//! once the first visible glyph is found, so text that draws nothing leaves
//! the batch untouched.

use std::ops::ControlFlow;

use super::text_layout::GlyphMetrics;
use super::walker::{LayoutStep, LayoutWalker, WalkOutcome, WalkParams};
use crate::foundation::math::{Rect, Vec4};
use crate::render::batch::SpriteBatch;

/// Emits one quad per visible glyph of a text
pub struct GlyphEmitter<'b> {
    batch: &'b mut dyn SpriteBatch,
    color: Vec4,
    clip: Option<Rect>,
}

impl<'b> GlyphEmitter<'b> {
    /// Emitter drawing into `batch` with `color`, cropped to `clip`
    pub fn new(batch: &'b mut dyn SpriteBatch, color: Vec4, clip: Option<Rect>) -> Self {
        Self { batch, color, clip }
    }

    /// Draw `chars`, returning the number of quads submitted
    pub fn emit(&mut self, chars: &[char], metrics: &mut GlyphMetrics<'_>, params: WalkParams) -> usize {
        let size = metrics.size() as f32;
        let scale = metrics.scale();
        let mut drawn = 0;

        let mut walker = LayoutWalker::new(chars, metrics, params);
        let outcome = walker.walk::<(), _>(|step| {
            if let LayoutStep::Glyph {
                glyph,
                cursor,
                visible: true,
                ..
            } = step
            {
                if !self.batch.is_started() {
                    self.batch.start();
                }

                let dst = Rect::new(
                    (cursor.x + (glyph.bearing_x * scale) as i32) as f32,
                    cursor.y as f32,
                    glyph.width * scale,
                    size,
                );
                self.batch.draw(dst, glyph.uvs, self.color, self.clip);
                drawn += 1;
            }
            ControlFlow::Continue(())
        });

        if let WalkOutcome::Finished(cursor) = outcome {
            log::trace!("Emitted {} glyphs over {} lines", drawn, cursor.line);
        }
        drawn
    }
}
