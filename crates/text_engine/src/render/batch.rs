//! # Sprite Batch
//!
//! Text is submitted as one textured quad per glyph. The renderer side is a
//! [`SpriteBatch`]: quads are accumulated between `start` and `finish` and
//! drawn together with the atlas bound once.
//!
//! [`QuadBatch`] is the CPU implementation: it expands quads into
//! [`TextVertex`] triangles ready for upload and keeps the submitted quads
//! around for inspection.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Rect, Vec4};

/// Vertex data for text rendering (two triangles per glyph)
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TextVertex {
    /// Position in screen pixels
    pub position: [f32; 2],
    /// UV texture coordinates
    pub uv: [f32; 2],
    /// RGBA color
    pub color: [f32; 4],
}

/// One glyph quad as handed to the batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Destination rectangle in screen pixels
    pub dst: Rect,
    /// Atlas coordinates `[u0, v0, u1, v1]`
    pub uvs: [f32; 4],
    /// Tint color
    pub color: Vec4,
}

impl Quad {
    /// Crop the quad to `clip`, moving the UVs with the edges
    ///
    /// Returns `None` when nothing of the quad remains visible.
    pub fn clipped(&self, clip: &Rect) -> Option<Self> {
        let visible = self.dst.intersection(clip)?;
        let [u0, v0, u1, v1] = self.uvs;
        let du = (u1 - u0) / self.dst.width;
        let dv = (v1 - v0) / self.dst.height;

        Some(Self {
            dst: visible,
            uvs: [
                u0 + (visible.x - self.dst.x) * du,
                v0 + (visible.y - self.dst.y) * dv,
                u1 - (self.dst.right() - visible.right()) * du,
                v1 - (self.dst.bottom() - visible.bottom()) * dv,
            ],
            color: self.color,
        })
    }

    /// Expand into two counter-clockwise triangles
    pub fn vertices(&self) -> [TextVertex; 6] {
        let [u0, v0, u1, v1] = self.uvs;
        let color = [self.color.x, self.color.y, self.color.z, self.color.w];
        let (x0, y0, x1, y1) = (self.dst.x, self.dst.y, self.dst.right(), self.dst.bottom());
        let vertex = |x: f32, y: f32, u: f32, v: f32| TextVertex {
            position: [x, y],
            uv: [u, v],
            color,
        };

        [
            vertex(x0, y0, u0, v0),
            vertex(x0, y1, u0, v1),
            vertex(x1, y1, u1, v1),
            vertex(x0, y0, u0, v0),
            vertex(x1, y1, u1, v1),
            vertex(x1, y0, u1, v0),
        ]
    }
}

/// Batched quad renderer consumed by the text engine
pub trait SpriteBatch {
    /// Begin collecting quads
    fn start(&mut self);

    /// Whether `start` was called without a matching `finish`
    fn is_started(&self) -> bool;

    /// Queue a quad; `clip` crops it when present
    fn draw(&mut self, dst: Rect, uvs: [f32; 4], color: Vec4, clip: Option<Rect>);

    /// Flush queued quads to the GPU
    fn finish(&mut self);

    /// Projection applied when the batch is drawn
    fn set_projection_matrix(&mut self, projection: Mat4);
}

/// CPU sprite batch producing upload-ready vertices
#[derive(Debug, Clone)]
pub struct QuadBatch {
    started: bool,
    pending: Vec<Quad>,
    submitted: Vec<Quad>,
    vertices: Vec<TextVertex>,
    projection: Mat4,
    flush_count: usize,
}

impl Default for QuadBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadBatch {
    /// Create an empty batch with an identity projection
    pub fn new() -> Self {
        Self {
            started: false,
            pending: Vec::new(),
            submitted: Vec::new(),
            vertices: Vec::new(),
            projection: Mat4::identity(),
            flush_count: 0,
        }
    }

    /// Quads queued since the last `start`
    pub fn pending(&self) -> &[Quad] {
        &self.pending
    }

    /// Quads flushed by `finish`, in submission order
    pub fn submitted(&self) -> &[Quad] {
        &self.submitted
    }

    /// Flushed and pending quads together
    pub fn quads(&self) -> Vec<Quad> {
        self.submitted.iter().chain(self.pending.iter()).copied().collect()
    }

    /// Vertex data produced by every flush so far
    pub fn vertices(&self) -> &[TextVertex] {
        &self.vertices
    }

    /// Vertex data as raw bytes for a GPU upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of `finish` calls that flushed the batch
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Current projection
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Drop everything recorded so far
    pub fn clear(&mut self) {
        self.pending.clear();
        self.submitted.clear();
        self.vertices.clear();
        self.flush_count = 0;
    }
}

impl SpriteBatch for QuadBatch {
    fn start(&mut self) {
        if self.started {
            log::warn!("QuadBatch::start called on a started batch");
            return;
        }
        self.started = true;
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn draw(&mut self, dst: Rect, uvs: [f32; 4], color: Vec4, clip: Option<Rect>) {
        if !self.started {
            log::warn!("QuadBatch::draw called before start; quad dropped");
            return;
        }

        let quad = Quad { dst, uvs, color };
        let quad = match clip {
            Some(clip) if !clip.is_empty() => match quad.clipped(&clip) {
                Some(visible) => visible,
                None => return,
            },
            _ => quad,
        };
        self.pending.push(quad);
    }

    fn finish(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;

        for quad in &self.pending {
            self.vertices.extend_from_slice(&quad.vertices());
        }
        log::trace!("QuadBatch flushed {} quads", self.pending.len());
        self.submitted.append(&mut self.pending);
        self.flush_count += 1;
    }

    fn set_projection_matrix(&mut self, projection: Mat4) {
        self.projection = projection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn white() -> Vec4 {
        Vec4::new(1.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn test_text_vertex_size() {
        assert_eq!(
            std::mem::size_of::<TextVertex>(),
            std::mem::size_of::<f32>() * 8 // 2 position + 2 uv + 4 color
        );
    }

    #[test]
    fn test_draw_requires_start() {
        let mut batch = QuadBatch::new();
        batch.draw(Rect::new(0.0, 0.0, 10.0, 10.0), [0.0, 0.0, 1.0, 1.0], white(), None);
        assert!(batch.pending().is_empty());

        batch.start();
        batch.draw(Rect::new(0.0, 0.0, 10.0, 10.0), [0.0, 0.0, 1.0, 1.0], white(), None);
        batch.finish();

        assert_eq!(batch.submitted().len(), 1);
        assert_eq!(batch.vertices().len(), 6);
        assert_eq!(batch.vertex_bytes().len(), 6 * std::mem::size_of::<TextVertex>());
        assert_eq!(batch.flush_count(), 1);
    }

    #[test]
    fn test_clip_crops_quad_and_uvs() {
        let mut batch = QuadBatch::new();
        batch.start();
        batch.draw(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            [0.0, 0.0, 1.0, 1.0],
            white(),
            Some(Rect::new(5.0, 0.0, 100.0, 100.0)),
        );

        let quad = batch.pending()[0];
        assert_eq!(quad.dst, Rect::new(5.0, 0.0, 5.0, 10.0));
        assert_relative_eq!(quad.uvs[0], 0.5);
        assert_relative_eq!(quad.uvs[2], 1.0);
    }

    #[test]
    fn test_fully_clipped_quad_is_dropped() {
        let mut batch = QuadBatch::new();
        batch.start();
        batch.draw(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            [0.0, 0.0, 1.0, 1.0],
            white(),
            Some(Rect::new(50.0, 50.0, 10.0, 10.0)),
        );
        assert!(batch.pending().is_empty());
    }
}
